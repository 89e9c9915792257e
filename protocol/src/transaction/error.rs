//! Error types for the transaction model.
//!
//! Construction failures ([`TxError`]) abort object creation: callers never
//! see a half-built [`Transaction`](super::Transaction). Signature and local
//! checks instead return a [`CheckResult`] so batch validation can carry on
//! past one bad transaction.

use std::fmt;

use thiserror::Error;

// ---------------------------------------------------------------------------
// ErrorKind
// ---------------------------------------------------------------------------

/// Closed discriminant attached to every failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Truncated, unknown or out-of-template fields during decode.
    MalformedEncoding,
    /// `TransactionType` absent or unrecognized.
    UnknownType,
    /// Single- or multi-signature did not verify.
    SignatureInvalid,
    /// Empty, oversized, duplicate or under-quorum signer set.
    SignerSetInvalid,
    /// Structural or semantic rule violation.
    LocalCheckFailed,
    /// Surfaced from the storage collaborator.
    PersistenceConflict,
    /// The caller used the API out of order or passed an illegal value.
    Usage,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MalformedEncoding => "MalformedEncoding",
            Self::UnknownType => "UnknownType",
            Self::SignatureInvalid => "SignatureInvalid",
            Self::SignerSetInvalid => "SignerSetInvalid",
            Self::LocalCheckFailed => "LocalCheckFailed",
            Self::PersistenceConflict => "PersistenceConflict",
            Self::Usage => "Usage",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// TxError
// ---------------------------------------------------------------------------

/// Errors raised while constructing, mutating or persisting a transaction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TxError {
    /// The byte stream could not be decoded into a transaction.
    #[error("malformed encoding: {0}")]
    MalformedEncoding(String),

    /// The `TransactionType` field is missing.
    #[error("transaction type field is missing")]
    MissingType,

    /// The `TransactionType` value is not a known type.
    #[error("unknown transaction type: {0}")]
    UnknownType(String),

    /// A field the template requires is absent.
    #[error("missing required field {0}")]
    MissingField(&'static str),

    /// A field holds a value of a different wire type than requested.
    #[error("field {field} is not of type {expected}")]
    FieldType {
        field: &'static str,
        expected: &'static str,
    },

    /// A rule the builder enforces (sub-transaction limits, signer bounds).
    #[error("local check failed: {0}")]
    LocalCheckFailed(String),

    /// The signer set cannot accept the requested change.
    #[error("invalid signer set: {0}")]
    SignerSetInvalid(String),

    /// The operation needs the identity digest, which only sterilization sets.
    #[error("transaction has not been sterilized")]
    Unsterilized,

    /// The transaction is sterilized and can no longer be mutated.
    #[error("transaction is sterilized and immutable")]
    Sterilized,

    /// A character outside the persistence status vocabulary.
    #[error("invalid transaction status code {0:?}")]
    InvalidStatus(char),

    /// The JSON representation could not be turned into fields.
    #[error("invalid JSON transaction: {0}")]
    InvalidJson(String),

    /// The storage collaborator refused or aborted the write.
    #[error("persistence conflict: {0}")]
    PersistenceConflict(String),
}

impl TxError {
    /// The closed-set discriminant for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedEncoding(_) | Self::MissingField(_) | Self::FieldType { .. } => {
                ErrorKind::MalformedEncoding
            }
            Self::MissingType | Self::UnknownType(_) => ErrorKind::UnknownType,
            Self::LocalCheckFailed(_) => ErrorKind::LocalCheckFailed,
            Self::SignerSetInvalid(_) => ErrorKind::SignerSetInvalid,
            Self::PersistenceConflict(_) => ErrorKind::PersistenceConflict,
            Self::Unsterilized
            | Self::Sterilized
            | Self::InvalidStatus(_)
            | Self::InvalidJson(_) => ErrorKind::Usage,
        }
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedEncoding(reason.into())
    }
}

// ---------------------------------------------------------------------------
// CheckResult
// ---------------------------------------------------------------------------

/// Outcome of a signature or local-validity check.
///
/// `reason` is empty on success and human-readable on failure; `kind` is
/// `None` exactly when `ok` is true.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub ok: bool,
    pub reason: String,
    pub kind: Option<ErrorKind>,
}

impl CheckResult {
    pub fn pass() -> Self {
        Self {
            ok: true,
            reason: String::new(),
            kind: None,
        }
    }

    pub fn fail(kind: ErrorKind, reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            reason: reason.into(),
            kind: Some(kind),
        }
    }

    /// Convert into a `Result`, for callers that prefer `?`.
    pub fn into_result(self) -> Result<(), (ErrorKind, String)> {
        match self.kind {
            None => Ok(()),
            Some(kind) => Err((kind, self.reason)),
        }
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            None => f.write_str("ok"),
            Some(kind) => write!(f, "{}: {}", kind, self.reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_closed_set() {
        assert_eq!(TxError::malformed("x").kind(), ErrorKind::MalformedEncoding);
        assert_eq!(TxError::MissingType.kind(), ErrorKind::UnknownType);
        assert_eq!(TxError::UnknownType("9".into()).kind(), ErrorKind::UnknownType);
        assert_eq!(
            TxError::PersistenceConflict("busy".into()).kind(),
            ErrorKind::PersistenceConflict
        );
        assert_eq!(TxError::Unsterilized.kind(), ErrorKind::Usage);
    }

    #[test]
    fn check_result_shapes() {
        let ok = CheckResult::pass();
        assert!(ok.ok && ok.reason.is_empty() && ok.kind.is_none());
        assert!(ok.clone().into_result().is_ok());

        let bad = CheckResult::fail(ErrorKind::SignatureInvalid, "invalid signature");
        assert!(!bad.ok);
        assert_eq!(bad.to_string(), "SignatureInvalid: invalid signature");
        assert_eq!(
            bad.into_result(),
            Err((ErrorKind::SignatureInvalid, "invalid signature".to_string()))
        );
    }
}
