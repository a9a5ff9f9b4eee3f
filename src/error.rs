use std::path::PathBuf;

use thiserror::Error;

use crate::convert::{ConversionKind, InputFormat};

/// The source document is unreadable or structurally broken.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{} is not valid UTF-8: {source}", path.display())]
    Encoding {
        path: PathBuf,
        source: std::str::Utf8Error,
    },

    /// An ASS `Format:` line without one of the fields needed to build a cue.
    #[error("line {line}: ASS format line is missing the {field} field")]
    MissingFormatField { line: usize, field: &'static str },

    #[error("incorrect spreadsheet header, expected {expected:?}, found {actual:?}")]
    HeaderMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("could not read spreadsheet {}: {source}", path.display())]
    Spreadsheet {
        path: PathBuf,
        source: calamine::XlsxError,
    },

    #[error("spreadsheet {} has no worksheets", path.display())]
    NoWorksheet { path: PathBuf },
}

/// The destination artifact could not be produced.
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("could not write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not write spreadsheet {}: {source}", path.display())]
    Spreadsheet {
        path: PathBuf,
        source: rust_xlsxwriter::XlsxError,
    },
}

/// Umbrella error returned by [`crate::convert`].
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("unsupported conversion type: {0}")]
    UnsupportedType(String),

    #[error("{kind} does not accept {}: expected {}", path.display(), kind.accepted_extensions())]
    ExtensionMismatch { kind: ConversionKind, path: PathBuf },

    #[error("no subtitle data could be extracted from the {format} file {}", path.display())]
    Empty { format: InputFormat, path: PathBuf },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Write(#[from] WriteError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped_errors_are_transparent() {
        let parse = ConversionError::from(ParseError::MissingFormatField {
            line: 3,
            field: "text",
        });
        assert_eq!(parse.to_string(), "line 3: ASS format line is missing the text field");

        let write = ConversionError::from(WriteError::Io {
            path: PathBuf::from("/nowhere/out.srt"),
            source: std::io::Error::other("disk full"),
        });
        assert_eq!(
            write.to_string(),
            "could not write /nowhere/out.srt: disk full"
        );
    }

    #[test]
    fn test_messages() {
        let err = ConversionError::ExtensionMismatch {
            kind: ConversionKind::AssToSrt,
            path: PathBuf::from("movie.srt"),
        };
        assert_eq!(err.to_string(), "ass_to_srt does not accept movie.srt: expected .ass");

        let err = ParseError::MissingFormatField {
            line: 12,
            field: "end",
        };
        assert_eq!(
            err.to_string(),
            "line 12: ASS format line is missing the end field"
        );
    }
}
