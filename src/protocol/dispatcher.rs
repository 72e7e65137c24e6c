use crate::core::transaction::{Transaction, TransactionType};
use crate::error::{constants, ProtocolError, Result};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

type HandlerFn = dyn Fn(&Transaction) -> Result<Option<Transaction>> + Send + Sync + 'static;

/// Routes decoded transactions to handlers by transaction type.
///
/// A handler may return a transaction to send back (usually a reply built
/// with [`Transaction::reply`]) or `None` for notifications.
pub struct Dispatcher {
    handlers: Arc<RwLock<HashMap<TransactionType, Box<HandlerFn>>>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register `handler` for `kind`, replacing any previous handler
    pub fn register<F>(&self, kind: impl Into<TransactionType>, handler: F) -> Result<()>
    where
        F: Fn(&Transaction) -> Result<Option<Transaction>> + Send + Sync + 'static,
    {
        let mut handlers = self
            .handlers
            .write()
            .map_err(|_| ProtocolError::Custom(constants::ERR_DISPATCHER_WRITE_LOCK.to_string()))?;

        handlers.insert(kind.into(), Box::new(handler));
        Ok(())
    }

    pub fn dispatch(&self, tx: &Transaction) -> Result<Option<Transaction>> {
        let handlers = self
            .handlers
            .read()
            .map_err(|_| ProtocolError::Custom(constants::ERR_DISPATCHER_READ_LOCK.to_string()))?;

        debug!(kind = %tx.kind, id = tx.id, reply = tx.is_reply, "Dispatching transaction");
        handlers
            .get(&tx.kind)
            .ok_or(ProtocolError::UnexpectedTransaction(tx.kind.0))
            .and_then(|handler| handler(tx))
    }

    pub fn is_registered(&self, kind: TransactionType) -> bool {
        self.handlers
            .read()
            .map(|handlers| handlers.contains_key(&kind))
            .unwrap_or(false)
    }
}
