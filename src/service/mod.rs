//! # Services
//!
//! Session-level client built on the transaction codec.

pub mod client;

pub use client::Client;
