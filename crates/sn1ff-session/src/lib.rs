//! # sn1ff-session
//!
//! Lifecycle of a single check's result record.
//!
//! This crate provides:
//! - [`CheckSession`], the `NEW -> OPEN -> CLOSED` state machine
//! - Durable local appends of observation lines
//! - A sweep for records that were opened but never submitted

mod record;
mod session;
pub mod sweep;

pub use record::RecordWriter;
pub use session::{CheckSession, SessionState};
pub use sweep::{sweep_orphans, SweepReport, RECORD_EXTENSION};
