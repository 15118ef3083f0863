use crate::format::PixelFormat;

/// Errors from pixel format conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ConvertError {
    /// The backing store could not be regrown during an in-place
    /// depth-increasing conversion. The buffer is left untouched.
    #[error("buffer reallocation failed during in-place depth growth")]
    AllocationFailure,

    /// No conversion route exists between the two formats.
    #[error("no conversion path from {src:?} to {dest:?}")]
    UnsupportedPair { src: PixelFormat, dest: PixelFormat },
}
