//! Core types and trait definitions for the kinroll family registry.
//!
//! Nothing here touches HTTP or a database; the store and server crates
//! build on these types.

pub mod census;
pub mod error;
pub mod media;
pub mod member;
pub mod store;
pub mod toggle;
pub mod validation;

pub use error::{Error, Result};
