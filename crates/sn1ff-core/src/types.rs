//! Record lifecycle types

use std::fmt;
use std::path::Path;

use crate::{Result, Sn1ffError};

/// Step of the check-result lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Opening a record with the collector
    Begin,
    /// Writing observations into local storage
    Append,
    /// Submitting the record with a status and TTL
    End,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Begin => write!(f, "begin"),
            Phase::Append => write!(f, "append"),
            Phase::End => write!(f, "end"),
        }
    }
}

/// Collector-assigned identifier of an open record
///
/// Opaque to the session: it is stored, displayed, used as the local
/// storage address and handed back on submit, but never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordHandle(String);

impl RecordHandle {
    /// Accept a handle reported by the collector
    ///
    /// Must be a single non-empty line with no NUL bytes.
    pub fn parse(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(Sn1ffError::InvalidArgument(
                "record handle cannot be empty".to_string(),
            ));
        }
        if raw.contains(&['\n', '\r', '\0'][..]) {
            return Err(Sn1ffError::InvalidArgument(format!(
                "record handle must be a single line: {:?}",
                raw
            )));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Local storage the handle addresses
    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }
}

impl fmt::Display for RecordHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome token of a check
///
/// The collector owns the vocabulary; only non-emptiness is enforced here.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Status(String);

impl Status {
    /// Tokens the sn1ff collector currently understands
    pub const KNOWN: [&'static str; 4] = ["ALRT", "WARN", "OKAY", "NONE"];

    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(Sn1ffError::InvalidArgument(
                "status cannot be empty".to_string(),
            ));
        }
        Ok(Self(token))
    }

    /// Whether the token belongs to the collector's known vocabulary
    pub fn is_known(&self) -> bool {
        Self::KNOWN.contains(&self.0.as_str())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How long a submitted status stays fresh, in minutes
///
/// Bounded by `i32::MAX`, the largest value the collector parses intact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ttl(u32);

impl Ttl {
    pub fn new(minutes: i64) -> Result<Self> {
        if minutes < 0 {
            return Err(Sn1ffError::InvalidArgument(format!(
                "ttl must be >= 0, got {}",
                minutes
            )));
        }
        if minutes > i64::from(i32::MAX) {
            return Err(Sn1ffError::InvalidArgument(format!(
                "ttl must be <= {}, got {}",
                i32::MAX,
                minutes
            )));
        }
        Ok(Self(minutes as u32))
    }

    pub fn minutes(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_validation() {
        assert!(RecordHandle::parse("/tmp/sn1ff/chk-001").is_ok());
        assert!(RecordHandle::parse("").is_err());
        assert!(RecordHandle::parse("   ").is_err());
        assert!(RecordHandle::parse("/tmp/a\n/tmp/b").is_err());
        assert!(RecordHandle::parse("/tmp/a\0").is_err());
    }

    #[test]
    fn test_handle_is_opaque() {
        let handle = RecordHandle::parse("not a path at all").unwrap();
        assert_eq!(handle.as_str(), "not a path at all");
        assert_eq!(handle.to_string(), "not a path at all");
    }

    #[test]
    fn test_status_rejects_empty() {
        assert!(matches!(
            Status::new(""),
            Err(Sn1ffError::InvalidArgument(_))
        ));
        assert!(Status::new(" \t").is_err());
    }

    #[test]
    fn test_status_vocabulary() {
        assert!(Status::new("OKAY").unwrap().is_known());
        assert!(Status::new("ALRT").unwrap().is_known());
        let custom = Status::new("DEGRADED").unwrap();
        assert!(!custom.is_known());
        assert_eq!(custom.as_str(), "DEGRADED");
    }

    #[test]
    fn test_ttl_bounds() {
        assert!(matches!(Ttl::new(-1), Err(Sn1ffError::InvalidArgument(_))));
        assert_eq!(Ttl::new(0).unwrap().minutes(), 0);
        assert_eq!(Ttl::new(300).unwrap().to_string(), "300");
        assert!(Ttl::new(i64::MAX).is_err());
    }

    #[test]
    fn test_ttl_fits_collector_int() {
        let max = i64::from(i32::MAX);
        assert_eq!(Ttl::new(max).unwrap().minutes(), i32::MAX as u32);
        assert!(matches!(
            Ttl::new(max + 1),
            Err(Sn1ffError::InvalidArgument(_))
        ));
        assert!(Ttl::new(i64::from(u32::MAX)).is_err());
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Begin.to_string(), "begin");
        assert_eq!(Phase::End.to_string(), "end");
    }
}
