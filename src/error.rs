use thiserror::Error;

/// Failures raised by the slideshow core and its image sources.
///
/// Everything except [`Error::OutOfRange`] is recoverable and meant to be shown
/// to the user; `OutOfRange` signals a caller that handed the core a stale or
/// bogus index.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Not an absolute `http`/`https` address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The source exists but is not an image format we can read.
    #[error("{0} is not in a supported format")]
    UnsupportedFormat(String),

    /// The source does not exist.
    #[error("{0} was not found")]
    NotFound(String),

    /// Downloading a remote image failed or timed out.
    #[error("error loading image from {address}: {reason}")]
    Network { address: String, reason: String },

    /// Index outside `[0, len)`.
    #[error("index {index} is out of range for a queue of {len}")]
    OutOfRange { index: usize, len: usize },
}

impl Error {
    /// Whether this failure should be surfaced as a notice rather than treated
    /// as a defect.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, Error::OutOfRange { .. })
    }

    /// Short title for a notice dialog.
    pub fn title(&self) -> &'static str {
        match self {
            Error::InvalidAddress(_) => "Invalid Address",
            Error::UnsupportedFormat(_) => "Invalid Format",
            Error::NotFound(_) => "File Not Found",
            Error::Network { .. } => "Error",
            Error::OutOfRange { .. } => "Internal Error",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_out_of_range_is_internal() {
        assert!(Error::NotFound("a.png".into()).is_user_facing());
        assert!(Error::InvalidAddress("ftp://x".into()).is_user_facing());
        assert!(!Error::OutOfRange { index: 3, len: 2 }.is_user_facing());
    }

    #[test]
    fn messages_name_the_source() {
        let err = Error::UnsupportedFormat("notes.txt".into());
        assert_eq!(err.to_string(), "notes.txt is not in a supported format");
        assert_eq!(err.title(), "Invalid Format");
    }
}
