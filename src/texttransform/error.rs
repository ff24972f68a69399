use std::path::PathBuf;
use thiserror::Error;

/// Problems with the command line itself.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum OptionError {
    #[error("Unknown option '{0}'")]
    Unknown(String),

    #[error("Missing value for option '{0}'")]
    MissingValue(String),

    #[error("Option '{option}' does not take a value (got '{value}')")]
    UnexpectedValue { option: String, value: String },

    #[error("Option '{option}' expects {expected} in '{value}'")]
    WrongValueCount {
        option: String,
        expected: String,
        value: String,
    },
}

/// User and I/O errors that stop a run before or after the engine is invoked.
#[derive(Error, Debug)]
pub enum TransformError {
    #[error(transparent)]
    Options(#[from] OptionError),

    #[error("No input file specified.")]
    NoInput,

    #[error("Input file '{}' does not exist.", .0.display())]
    InputNotFound(PathBuf),

    #[error("Could not read input file '{}':\n{source}", .path.display())]
    ReadInput {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Could not read standard input:\n{0}")]
    ReadStdin(std::io::Error),

    #[error("Input is empty")]
    EmptyInput,

    #[error("Invalid class name '{0}'")]
    InvalidClassName(String),

    #[error("Could not write output file '{}':\n{source}", .path.display())]
    WriteOutput {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Could not write to standard output:\n{0}")]
    WriteStdout(std::io::Error),

    #[error("Could not load configuration '{}': {reason}", .path.display())]
    Config { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, TransformError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing_messages() {
        assert_eq!(TransformError::NoInput.to_string(), "No input file specified.");
        assert_eq!(
            TransformError::InputNotFound(PathBuf::from("a.tt")).to_string(),
            "Input file 'a.tt' does not exist."
        );
        assert_eq!(TransformError::EmptyInput.to_string(), "Input is empty");
    }

    #[test]
    fn test_option_errors_convert() {
        let err: TransformError = OptionError::Unknown("-x".into()).into();
        assert_eq!(err.to_string(), "Unknown option '-x'");
    }

    #[test]
    fn test_write_error_names_the_file() {
        let err = TransformError::WriteOutput {
            path: PathBuf::from("out/x.txt"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err
            .to_string()
            .starts_with("Could not write output file 'out/x.txt':\n"));
    }
}
