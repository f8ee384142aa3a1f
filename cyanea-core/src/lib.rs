//! Shared primitives, traits, and utilities for the Cyanea ontology tooling.
//!
//! `cyanea-core` provides the foundation that the other Cyanea crates build on:
//!
//! - **Error types**: [`CyaneaError`] and [`Result`] for structured error handling
//! - **Traits**: Core abstractions like [`Annotated`], [`Scored`], [`ContentAddressable`]
//! - **Hashing**: SHA-256 content addressing and short record uids

pub mod error;
pub mod traits;
pub mod hash;

pub use error::{CyaneaError, Result};
pub use hash::{sha256, short_uid};
pub use traits::*;
