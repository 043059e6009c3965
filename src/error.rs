use std::fmt::Display;
use std::path::PathBuf;

use crate::image::{Dimensions, PpmFormat};
use crate::session::ImageId;

/// Coarse classification of every [`Error`], one entry per failure class a
/// caller has to distinguish.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Open,
    SizeMismatch,
    UninitializedSession,
    TruncatedData,
    Format,
    Write,
}

#[derive(Debug)]
pub enum Error {
    PathNotRegisteredForImage {
        id: ImageId,
        number_of_paths: usize,
    },
    UnableToOpenInputFileForReading(PathBuf, std::io::Error),
    FailedToReadInputFile(PathBuf, std::io::Error),
    FailedToReadImageData(std::io::Error),
    InvalidDimensions(Dimensions),
    HeaderDimensionsTooLarge(Dimensions),
    MismatchOfSizeBetweenHeaderAndDeclaration {
        id: ImageId,
        declared: Dimensions,
        actual: Dimensions,
    },
    MismatchOfRequestedAndDeclaredSize {
        id: ImageId,
        declared: Dimensions,
        requested: Dimensions,
    },
    MismatchOfBufferLength {
        buffer_name: &'static str,
        expected: usize,
        actual: usize,
    },
    UninitializedSession(ImageId),
    TruncatedPixelData {
        expected_samples: usize,
        actual_samples: usize,
    },
    PPMFileDoesNotContainRequiredToken(&'static str),
    ParsingOfTokenFailed(&'static str),
    UnsupportedMagicNumber(String),
    UnsupportedMaxValue(u32),
    SampleValueOutOfRange {
        value: u32,
        max_value: u16,
    },
    UnexpectedImageFormat {
        expected: &'static str,
        actual: PpmFormat,
    },
    UnableToOpenOutputFileForWriting(PathBuf, std::io::Error),
    FailedToWriteImageData(std::io::Error),
    ImageDecodingFailed(ImageId, Box<Error>),
    ImageEncodingFailed(PathBuf, Box<Error>),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PathNotRegisteredForImage { .. } => ErrorKind::NotFound,
            Self::UnableToOpenInputFileForReading(..)
            | Self::FailedToReadInputFile(..)
            | Self::FailedToReadImageData(_) => ErrorKind::Open,
            Self::InvalidDimensions(_)
            | Self::MismatchOfSizeBetweenHeaderAndDeclaration { .. }
            | Self::MismatchOfRequestedAndDeclaredSize { .. }
            | Self::MismatchOfBufferLength { .. } => ErrorKind::SizeMismatch,
            Self::UninitializedSession(_) => ErrorKind::UninitializedSession,
            Self::TruncatedPixelData { .. } => ErrorKind::TruncatedData,
            Self::PPMFileDoesNotContainRequiredToken(_)
            | Self::ParsingOfTokenFailed(_)
            | Self::UnsupportedMagicNumber(_)
            | Self::UnsupportedMaxValue(_)
            | Self::HeaderDimensionsTooLarge(_)
            | Self::SampleValueOutOfRange { .. }
            | Self::UnexpectedImageFormat { .. } => ErrorKind::Format,
            Self::UnableToOpenOutputFileForWriting(..) | Self::FailedToWriteImageData(_) => {
                ErrorKind::Write
            }
            Self::ImageDecodingFailed(_, cause) | Self::ImageEncodingFailed(_, cause) => {
                cause.kind()
            }
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PathNotRegisteredForImage {
                id,
                number_of_paths,
            } => {
                write!(
                    f,
                    "No path registered for image {}. The path table holds {} entries.",
                    id, number_of_paths
                )
            }
            Self::UnableToOpenInputFileForReading(path, error) => {
                write!(
                    f,
                    "Unable to open input file '{}' for reading: {}",
                    path.display(),
                    error
                )
            }
            Self::FailedToReadInputFile(path, error) => {
                write!(f, "Failed to read input file '{}': {}", path.display(), error)
            }
            Self::FailedToReadImageData(error) => {
                write!(f, "Failed to read image data: {}", error)
            }
            Self::InvalidDimensions(dimensions) => {
                write!(
                    f,
                    "Invalid image dimensions {}. Both sides must be positive and addressable.",
                    dimensions
                )
            }
            Self::HeaderDimensionsTooLarge(dimensions) => {
                write!(
                    f,
                    "Header states {}, which holds more samples than can be addressed",
                    dimensions
                )
            }
            Self::MismatchOfSizeBetweenHeaderAndDeclaration {
                id,
                declared,
                actual,
            } => {
                write!(
                    f,
                    "Image {} was declared as {}, but its header states {}",
                    id, declared, actual
                )
            }
            Self::MismatchOfRequestedAndDeclaredSize {
                id,
                declared,
                requested,
            } => {
                write!(
                    f,
                    "Image {} was registered as {}, but was requested as {}",
                    id, declared, requested
                )
            }
            Self::MismatchOfBufferLength {
                buffer_name,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Buffer '{}' must hold {} samples, but holds {}",
                    buffer_name, expected, actual
                )
            }
            Self::UninitializedSession(id) => {
                write!(f, "Image {} was read before it was initialized", id)
            }
            Self::TruncatedPixelData {
                expected_samples,
                actual_samples,
            } => {
                write!(
                    f,
                    "Pixel data is truncated. Expected {} samples, but only {} are present.",
                    expected_samples, actual_samples
                )
            }
            Self::PPMFileDoesNotContainRequiredToken(token_name) => {
                write!(f, "Expected token '{}' not found in PPM file", token_name)
            }
            Self::ParsingOfTokenFailed(token_name) => {
                write!(f, "Parsing of token '{}' failed", token_name)
            }
            Self::UnsupportedMagicNumber(magic) => {
                write!(f, "Unsupported magic number '{}'", magic)
            }
            Self::UnsupportedMaxValue(max_value) => {
                write!(
                    f,
                    "Unsupported max value {}. Only 8 bit samples (1 to 255) are supported.",
                    max_value
                )
            }
            Self::SampleValueOutOfRange { value, max_value } => {
                write!(
                    f,
                    "Sample value {} exceeds the max value {} of the header",
                    value, max_value
                )
            }
            Self::UnexpectedImageFormat { expected, actual } => {
                write!(f, "Expected a {} image, but found {}", expected, actual)
            }
            Self::UnableToOpenOutputFileForWriting(path, error) => {
                write!(
                    f,
                    "Unable to open output file '{}' for writing: {}",
                    path.display(),
                    error
                )
            }
            Self::FailedToWriteImageData(error) => {
                write!(f, "Failed to write image data: {}", error)
            }
            Self::ImageDecodingFailed(id, cause) => {
                write!(f, "Decoding of image {} failed: {}", id, cause)
            }
            Self::ImageEncodingFailed(path, cause) => {
                write!(f, "Encoding of '{}' failed: {}", path.display(), cause)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::UnableToOpenInputFileForReading(_, error)
            | Self::FailedToReadInputFile(_, error)
            | Self::UnableToOpenOutputFileForWriting(_, error) => Some(error),
            Self::FailedToReadImageData(error) | Self::FailedToWriteImageData(error) => {
                Some(error)
            }
            Self::ImageDecodingFailed(_, cause) | Self::ImageEncodingFailed(_, cause) => {
                Some(cause.as_ref())
            }
            _ => None,
        }
    }
}
