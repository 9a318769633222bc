//! Error types for resolving and materializing a job.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can stop a launch. All variants are fatal.
#[derive(Debug, Error)]
pub enum Error {
    /// A command-line token that is not `key=value`.
    #[error("malformed override {token:?}: expected key=value")]
    MalformedOverride { token: String },

    /// The configuration file could not be read.
    #[error("cannot read config file {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not a JSON object.
    #[error("cannot parse config file {}: {message}", .path.display())]
    ConfigParse { path: PathBuf, message: String },

    /// An override names a field the job schema does not have.
    #[error("unknown field {key:?}")]
    UnknownField { key: String },

    /// An override value does not coerce to the field's declared type.
    #[error("field {key:?} expects {expected}, got {value}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        value: String,
    },

    /// A field that must be set before materialization is empty.
    #[error("missing required field {field}")]
    MissingRequiredField { field: &'static str },

    /// A field is set but cannot be used as-is (a path-like job name, a line break).
    #[error("invalid {field}: {reason}")]
    InvalidValue {
        field: &'static str,
        reason: &'static str,
    },

    /// Creating the job directory or writing a job file failed.
    #[error("cannot write {}: {source}", .path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The parameter record could not be encoded.
    #[error("cannot encode job parameters: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The launcher process could not be started.
    #[error("cannot start launcher {command:?}: {source}")]
    LauncherInvocation {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn type_mismatch(key: &str, expected: &'static str, value: impl ToString) -> Self {
        Self::TypeMismatch {
            key: key.to_string(),
            expected,
            value: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn messages_name_the_offending_field() {
        let err = Error::MissingRequiredField {
            field: "output_log_path",
        };
        assert_eq!(err.to_string(), "missing required field output_log_path");

        let err = Error::UnknownField {
            key: "walltim".into(),
        };
        assert_eq!(err.to_string(), "unknown field \"walltim\"");
    }

    #[test]
    fn type_mismatch_reports_expected_type_and_value() {
        let err = Error::type_mismatch("node_count", "integer >= 1", "\"two\"");
        assert_eq!(
            err.to_string(),
            "field \"node_count\" expects integer >= 1, got \"two\""
        );
    }

    #[test]
    fn persistence_keeps_the_io_source() {
        use std::error::Error as _;

        let err = Error::Persistence {
            path: PathBuf::from("/nope/run1.slurm"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().starts_with("cannot write /nope/run1.slurm"));
        assert!(err.source().is_some());
    }
}
