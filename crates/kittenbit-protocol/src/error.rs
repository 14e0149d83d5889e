/// A handler argument that strict mode refuses to coerce.
///
/// Lenient mode never produces these for missing or non-numeric tokens; both
/// become `0` there.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgumentError {
    /// Fewer tokens than the command requires.
    #[error("missing argument #{index} ({required} required)")]
    Missing { index: usize, required: usize },

    /// Token is not a base-10 integer.
    #[error("argument #{index} is not an integer: {token:?}")]
    NotNumeric { index: usize, token: String },

    /// Integer outside the range the command accepts.
    #[error("argument #{index} out of range: {value}")]
    OutOfRange { index: usize, value: i32 },
}

/// Errors that end a [`Session`](crate::Session).
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Line reading or response writing failed.
    #[error("frame error: {0}")]
    Frame(#[from] kittenbit_frame::FrameError),
}

pub type Result<T> = std::result::Result<T, SessionError>;
