//! # sn1ff-core
//!
//! Core types for reporting monitoring check results through the sn1ff
//! collector.
//!
//! ## Lifecycle
//!
//! - A check opens a record and receives an opaque [`RecordHandle`]
//! - Observations are appended locally to the storage the handle addresses
//! - The record is submitted with a [`Status`] and a [`Ttl`], consuming the handle

pub mod config;
mod error;
pub mod fail_open;
mod types;

pub use config::CheckConfig;
pub use error::{Result, Sn1ffError};
pub use types::*;
