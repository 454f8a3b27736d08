//! Error Types
//!
//! This module defines the error type used throughout bonemix.
//!
//! # Overview
//!
//! [`BonemixError`] only covers *data* failures: malformed serialized
//! animation sets and keyframe arrays that break the curve invariants.
//! Caller-contract violations (an out-of-range track index, an output sink
//! that is too small) are programming errors and panic instead.
//!
//! # Usage
//!
//! ```rust,ignore
//! use bonemix_core::errors::Result;
//!
//! fn load(bytes: &[u8]) -> Result<AnimationSet> {
//!     AnimationSet::load(&mut &bytes[..])
//! }
//! ```

use thiserror::Error;

/// The main error type for bonemix.
#[derive(Error, Debug)]
pub enum BonemixError {
    // ========================================================================
    // I/O Errors
    // ========================================================================
    /// Underlying reader/writer failure.
    #[error("IO error: {0}")]
    Io(#[source] std::io::Error),

    /// The stream ended in the middle of a record.
    #[error("Unexpected end of data")]
    Truncated,

    // ========================================================================
    // Format Errors
    // ========================================================================
    /// A length-prefixed string was not valid UTF-8.
    #[error("Invalid UTF-8 in {0}")]
    InvalidUtf8(&'static str),

    /// A length prefix exceeded the sanity limit for its field.
    #[error("Length {len} for {context} exceeds limit {limit}")]
    LengthOverflow {
        /// Field being read
        context: &'static str,
        /// Length found in the stream
        len: usize,
        /// Maximum accepted length
        limit: usize,
    },

    // ========================================================================
    // Keyframe Data Errors
    // ========================================================================
    /// Key time and key value arrays of one curve differ in length.
    #[error("Curve '{curve}' has {times} key times but {values} values")]
    CurveLengthMismatch {
        /// Curve name (scale / rotation / translation)
        curve: &'static str,
        /// Number of key times
        times: usize,
        /// Number of key values
        values: usize,
    },

    /// Key times are not strictly increasing (or are NaN).
    #[error("Curve '{curve}' key times are not strictly increasing at index {index}")]
    UnsortedKeyTimes {
        /// Curve name (scale / rotation / translation)
        curve: &'static str,
        /// First offending key index
        index: usize,
    },

    /// A bone output was given an empty root-to-bone hierarchy path.
    #[error("Bone output has an empty hierarchy path")]
    EmptyHierarchy,
}

impl From<std::io::Error> for BonemixError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            Self::Truncated
        } else {
            Self::Io(err)
        }
    }
}

/// Alias for `std::result::Result<T, BonemixError>`.
pub type Result<T> = std::result::Result<T, BonemixError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eof_maps_to_truncated() {
        let err: BonemixError = std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into();
        assert!(matches!(err, BonemixError::Truncated));

        let err: BonemixError = std::io::Error::other("disk on fire").into();
        assert!(matches!(err, BonemixError::Io(_)));
    }

    #[test]
    fn messages_name_the_curve() {
        let err = BonemixError::CurveLengthMismatch {
            curve: "rotation",
            times: 3,
            values: 2,
        };
        assert_eq!(err.to_string(), "Curve 'rotation' has 3 key times but 2 values");
    }
}
