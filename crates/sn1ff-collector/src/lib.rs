//! # sn1ff-collector
//!
//! The collector is the external tool that allocates check-result records
//! and accepts their final submission.
//!
//! This crate provides:
//! - The [`CollectorClient`] capability consumed by check sessions
//! - A subprocess adapter around `sn1ff_client`
//! - An in-memory mock for tests

mod command;
mod mock;

pub use command::{CollectorClient, CollectorOutput, CommandCollector};
pub use mock::{CollectorCall, MockCollector, MockFailure};
