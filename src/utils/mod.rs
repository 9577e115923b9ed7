//! Shared utilities.
//!
//! - [`errors`]: application error type and its HTTP mapping

pub mod errors;
