use std::path::Path;

pub mod ass;
pub mod cli;
pub mod convert;
pub mod cue;
pub mod error;
pub mod server;
pub mod srt;
pub mod timecode;
pub mod xlsx;

pub use convert::{convert, ConversionKind, InputFormat, Report};
pub use cue::{Cue, Parsed, Warning};
pub use error::{ConversionError, ParseError, WriteError};

/// Loads a file into a string.
///
/// This checks for the UTF-8 BOM and strips it. Windows line endings are
/// normalised to `\n`.
pub(crate) fn load_file(path: &Path) -> Result<String, ParseError> {
    let bytes = std::fs::read(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes.as_slice());
    let buffer = std::str::from_utf8(bytes).map_err(|source| ParseError::Encoding {
        path: path.to_path_buf(),
        source,
    })?;

    if buffer.contains('\r') {
        Ok(buffer.replace("\r\n", "\n"))
    } else {
        Ok(buffer.to_owned())
    }
}
