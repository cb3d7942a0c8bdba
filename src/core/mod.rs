//! Core types and error handling.
//!
//! The error enum in [`error`] is the single failure vocabulary for the whole
//! crate: every fallible core operation returns [`Result`] with a
//! [`CartelError`] inside, and the CLI maps kinds to stable numeric codes.

pub mod error;

pub use error::{CartelError, Result};
