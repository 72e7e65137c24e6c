//! # Utility Modules
//!
//! Supporting utilities for logging and timing.
//!
//! ## Components
//! - **Logging**: Opt-in structured logging configuration
//! - **Timeout**: Default durations and an async timeout wrapper

pub mod logging;
pub mod timeout;
