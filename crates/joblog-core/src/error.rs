//! Error taxonomy shared by the parser, the job source and the registry.

use std::process::ExitStatus;

use thiserror::Error;

/// Listing text did not match the layout the parser expects.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The source printed nothing at all. `dx` does this for an unknown `--user`.
    #[error("job source returned no output")]
    EmptySource,
    #[error("record {index}: {reason}")]
    MalformedRecord { index: usize, reason: String },
    #[error("record {index}: invalid date {value:?}")]
    InvalidDate {
        index: usize,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Invoking the external tool failed.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("could not run {program}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },
}

/// Errors surfaced to the dashboard.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid user.\nPlease enter a valid user name.")]
    EmptySource,
    #[error("could not parse job listing: {0}")]
    Parse(ParseError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("background task failed: {0}")]
    Task(String),
}

impl Error {
    /// Fatal errors end the session; everything else is shown in place.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::EmptySource)
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        match e {
            ParseError::EmptySource => Error::EmptySource,
            other => Error::Parse(other),
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(e: tokio::task::JoinError) -> Self {
        Error::Task(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source_parse_error_maps_to_fatal_error() {
        let err: Error = ParseError::EmptySource.into();
        assert!(matches!(err, Error::EmptySource));
        assert!(err.is_fatal());
        assert_eq!(
            err.to_string(),
            "Invalid user.\nPlease enter a valid user name."
        );
    }

    #[test]
    fn malformed_record_stays_a_parse_error() {
        let err: Error = ParseError::MalformedRecord {
            index: 2,
            reason: "no status".to_string(),
        }
        .into();
        assert!(matches!(err, Error::Parse(_)));
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("record 2: no status"));
    }
}
