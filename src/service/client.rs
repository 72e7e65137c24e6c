use futures::{SinkExt, StreamExt};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::codec::Framed;
use tracing::{debug, info, instrument, warn};

use crate::account::{obfuscate, AccountRecord, GUEST_LOGIN};
use crate::config::ProtocolConfig;
use crate::core::codec::TransactionCodec;
use crate::core::field::{Field, FieldId};
use crate::core::field_block::FieldBlock;
use crate::core::transaction::{Transaction, TransactionType};
use crate::error::{ProtocolError, Result};
use crate::protocol::dispatcher::Dispatcher;
use crate::protocol::handshake::client_handshake;
use crate::utils::timeout::with_timeout;

/// Client version advertised at login
const CLIENT_VERSION: u16 = 190;

/// Session with a Hotline server.
///
/// Owns the connection, assigns transaction ids and matches replies to
/// requests. Transactions pushed by the server while a request is waiting
/// for its reply are queued and returned by later [`Client::receive`] calls.
pub struct Client<S = TcpStream> {
    framed: Framed<S, TransactionCodec>,
    next_id: u32,
    pending: VecDeque<Transaction>,
    response_timeout: Duration,
    keepalive_interval: Duration,
    user_name: String,
    icon_id: u16,
}

impl Client<TcpStream> {
    /// Connect to `config.client.address` and complete the handshake
    #[instrument(skip(config), fields(address = %config.client.address))]
    pub async fn connect(config: &ProtocolConfig) -> Result<Self> {
        let address = config.client.address.as_str();
        let stream = with_timeout(config.client.connection_timeout, async {
            let mut stream = TcpStream::connect(address).await?;
            stream.set_nodelay(true)?;
            client_handshake(&mut stream).await?;
            Ok(stream)
        })
        .await?;

        info!("Connected to server");
        Ok(Self::from_stream(stream, config))
    }
}

impl<S> Client<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap a stream on which the handshake has already completed
    pub fn from_stream(stream: S, config: &ProtocolConfig) -> Self {
        let codec = TransactionCodec::new(config.codec.max_transaction_size, config.codec.decode_mode);
        Self {
            framed: Framed::new(stream, codec),
            next_id: 1,
            pending: VecDeque::new(),
            response_timeout: config.client.response_timeout,
            keepalive_interval: config.client.keepalive_interval,
            user_name: config.client.user_name.clone(),
            icon_id: config.client.icon_id,
        }
    }

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        // Zero is never used as a request id
        self.next_id = self.next_id.checked_add(1).unwrap_or(1);
        id
    }

    /// Send a transaction. Requests get the next id; replies keep theirs.
    pub async fn send(&mut self, mut tx: Transaction) -> Result<u32> {
        if !tx.is_reply {
            tx.id = self.allocate_id();
        }
        let id = tx.id;
        self.framed.send(tx).await?;
        Ok(id)
    }

    /// Next transaction from the server
    pub async fn receive(&mut self) -> Result<Transaction> {
        if let Some(tx) = self.pending.pop_front() {
            return Ok(tx);
        }
        match self.framed.next().await {
            Some(result) => result,
            None => Err(ProtocolError::ConnectionClosed),
        }
    }

    /// Send a request and wait for its reply.
    ///
    /// A reply with a non-zero error code becomes [`ProtocolError::ServerError`].
    pub async fn request(&mut self, tx: Transaction) -> Result<Transaction> {
        let id = self.send(tx).await?;
        let reply = with_timeout(self.response_timeout, self.await_reply(id)).await?;

        if reply.error_code != 0 {
            let message = reply
                .field(FieldId::ERROR)
                .map(|f| f.as_str_lossy().into_owned())
                .unwrap_or_default();
            warn!(id, code = reply.error_code, %message, "Server returned an error");
            return Err(ProtocolError::ServerError {
                code: reply.error_code,
                message,
            });
        }
        Ok(reply)
    }

    async fn await_reply(&mut self, id: u32) -> Result<Transaction> {
        loop {
            let tx = match self.framed.next().await {
                Some(result) => result?,
                None => return Err(ProtocolError::ConnectionClosed),
            };
            if tx.is_reply && tx.id == id {
                return Ok(tx);
            }
            debug!(kind = %tx.kind, id = tx.id, "Queueing transaction received while awaiting reply");
            self.pending.push_back(tx);
        }
    }

    /// Log in; login and password travel obfuscated. An empty login logs in
    /// as [`GUEST_LOGIN`].
    #[instrument(skip(self, password))]
    pub async fn login(&mut self, login: &str, password: &str) -> Result<Transaction> {
        let login = if login.is_empty() { GUEST_LOGIN } else { login };
        let tx = Transaction::with_fields(
            TransactionType::LOGIN,
            vec![
                Field::new(FieldId::USER_LOGIN, obfuscate(login.as_bytes()))?,
                Field::new(FieldId::USER_PASSWORD, obfuscate(password.as_bytes()))?,
                Field::from_u16(FieldId::USER_ICON_ID, self.icon_id),
                Field::text(FieldId::USER_NAME, &self.user_name)?,
                Field::from_u16(FieldId::VERSION, CLIENT_VERSION),
            ],
        )?;
        let reply = self.request(tx).await?;
        info!("Logged in");
        Ok(reply)
    }

    /// Send a public chat line
    pub async fn chat(&mut self, text: &str) -> Result<u32> {
        let tx = Transaction::with_fields(TransactionType::CHAT_SEND, vec![Field::text(FieldId::DATA, text)?])?;
        self.send(tx).await
    }

    pub async fn keep_alive(&mut self) -> Result<u32> {
        self.send(Transaction::new(TransactionType::KEEP_ALIVE, FieldBlock::new()))
            .await
    }

    /// Fetch an account record by login
    pub async fn get_user(&mut self, login: &str) -> Result<AccountRecord> {
        let tx = Transaction::with_fields(TransactionType::GET_USER, vec![Field::text(FieldId::USER_LOGIN, login)?])?;
        let reply = self.request(tx).await?;
        AccountRecord::from_block(&reply.fields)
    }

    /// Feed incoming transactions to `dispatcher` until the server disconnects.
    ///
    /// Replies returned by handlers are sent back; transactions without a
    /// handler are skipped. A keep-alive goes out every `keepalive_interval`.
    pub async fn serve(&mut self, dispatcher: &Dispatcher) -> Result<()> {
        // interval_at rejects a zero period
        let period = self.keepalive_interval.max(Duration::from_millis(1));
        let mut keepalive = interval_at(Instant::now() + period, period);
        keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let received = tokio::select! {
                _ = keepalive.tick() => {
                    self.keep_alive().await?;
                    continue;
                }
                received = self.receive() => received,
            };

            let tx = match received {
                Ok(tx) => tx,
                Err(ProtocolError::ConnectionClosed) => {
                    info!("Server closed the connection");
                    return Ok(());
                }
                Err(e) => return Err(e),
            };

            match dispatcher.dispatch(&tx) {
                Ok(Some(reply)) => {
                    self.send(reply).await?;
                }
                Ok(None) => {}
                Err(ProtocolError::UnexpectedTransaction(kind)) => {
                    debug!(kind, "No handler registered, skipping");
                }
                Err(e) => return Err(e),
            }
        }
    }
}
