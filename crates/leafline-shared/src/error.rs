use thiserror::Error;

/// Rejection reasons for user-supplied comment text.
///
/// Lengths are counted in characters of the trimmed text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Comment cannot be empty")]
    Empty,

    #[error("Comment is too short: {actual} characters (min {min})")]
    TooShort { min: usize, actual: usize },

    #[error("Comment is too long: {actual} characters (max {max})")]
    TooLong { max: usize, actual: usize },
}
