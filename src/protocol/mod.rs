//! # Session Protocol
//!
//! Pieces of the session boundary that sit above transaction framing.
//!
//! ## Components
//! - **Handshake**: the `TRTP`/`HOTL` exchange opening every connection
//! - **Dispatcher**: routes decoded transactions to handlers by type

pub mod dispatcher;
pub mod handshake;
