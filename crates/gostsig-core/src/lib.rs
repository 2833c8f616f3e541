#![forbid(unsafe_code)]

//! Shared error types and constants for the gostsig XML Security library.

pub mod algorithm;
pub mod error;
pub mod ns;

pub use error::{Error, Result, SignatureError};
