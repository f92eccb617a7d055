use alloc::string::String;

/// Broad category of an [`Error`], for callers that only need to know which
/// stage of reading rejected the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The header is structurally malformed.
    Format,
    /// A header token could not be read as an integer.
    ValueConversion,
    /// The payload cannot supply the declared image cube.
    Decode,
    /// Anything outside header and payload decoding.
    Other,
}

/// All errors that can occur while reading, decoding or rendering HIPS data.
#[derive(Debug)]
pub enum Error {
    /// No `"\n."` header terminator anywhere in the input.
    MissingTerminator,
    /// The header text holds fewer than the five required tokens.
    TooFewTokens(usize),
    /// A tag that cannot be written as a single Latin-1 header token.
    InvalidTag(String),
    /// Header token at `position` is not an integer.
    InvalidToken { position: usize, token: String },
    /// The float32 stream is shorter than bands x res_x x res_y.
    InsufficientData { expected: usize, available: usize },
    /// The header dimensions do not describe a representable cube.
    InvalidShape { bands: i64, res_x: i64, res_y: i64 },
    /// A requested band index does not exist in the image.
    InvalidBand { index: usize, bands: usize },
    /// A band selection that maps to neither gray nor RGB display.
    InvalidSelection(usize),
    /// Malformed auxiliary waveform table.
    InvalidTable { line: usize, reason: &'static str },
    /// An I/O error from the standard library.
    #[cfg(feature = "std")]
    Io(std::io::Error),
    /// Raster encoding failure from the `image` crate.
    #[cfg(feature = "render")]
    Image(image::ImageError),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    /// Returns the category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingTerminator | Error::TooFewTokens(_) | Error::InvalidTag(_) => {
                ErrorKind::Format
            }
            Error::InvalidToken { .. } => ErrorKind::ValueConversion,
            Error::InsufficientData { .. } | Error::InvalidShape { .. } => ErrorKind::Decode,
            _ => ErrorKind::Other,
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::MissingTerminator => write!(f, "HIPS header terminator not found"),
            Error::TooFewTokens(n) => {
                write!(f, "HIPS header has {n} tokens, at least 5 required")
            }
            Error::InvalidTag(tag) => {
                write!(f, "tag {tag:?} is not a single Latin-1 header token")
            }
            Error::InvalidToken { position, token } => {
                write!(f, "header token {position} is not an integer: {token:?}")
            }
            Error::InsufficientData {
                expected,
                available,
            } => write!(
                f,
                "payload holds {available} float32 samples, header declares {expected}"
            ),
            Error::InvalidShape {
                bands,
                res_x,
                res_y,
            } => write!(f, "invalid image shape: {bands} x {res_x} x {res_y}"),
            Error::InvalidBand { index, bands } => {
                write!(f, "band {index} out of range for {bands}-band image")
            }
            Error::InvalidSelection(n) => {
                write!(f, "cannot display a selection of {n} bands")
            }
            Error::InvalidTable { line, reason } => {
                write!(f, "invalid table at line {line}: {reason}")
            }
            #[cfg(feature = "std")]
            Error::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "render")]
            Error::Image(e) => write!(f, "image error: {e}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            #[cfg(feature = "render")]
            Error::Image(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(feature = "std")]
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

#[cfg(feature = "render")]
impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Error::Image(e)
    }
}
