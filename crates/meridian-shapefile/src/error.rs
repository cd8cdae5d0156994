use std::fmt;
use std::io;
use std::path::PathBuf;

/// A decoding error in `.shp` content.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    /// Byte offset into the file where the error was detected.
    pub offset: usize,
}

impl ParseError {
    pub(crate) fn new(msg: impl Into<String>, offset: usize) -> Self {
        Self { message: msg.into(), offset }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shapefile parse error at byte {}: {}", self.offset, self.message)
    }
}

impl std::error::Error for ParseError {}

/// Failure to read a shapefile from disk.
#[derive(Debug)]
pub enum ReadError {
    Io { path: PathBuf, source: io::Error },
    Parse { path: PathBuf, source: ParseError },
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadError::Io { path, .. } => write!(f, "failed to read {}", path.display()),
            ReadError::Parse { path, .. } => write!(f, "failed to parse {}", path.display()),
        }
    }
}

impl std::error::Error for ReadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReadError::Io { source, .. } => Some(source),
            ReadError::Parse { source, .. } => Some(source),
        }
    }
}
