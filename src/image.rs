use std::fmt::Display;

use crate::error::Error;

pub mod reader;
pub mod writer;

/// Largest sample value an 8 bit image may declare in its header.
pub const MAX_SAMPLE_VALUE: u16 = 255;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub height: usize,
    pub width: usize,
}

impl Dimensions {
    pub fn new(height: usize, width: usize) -> Self {
        Self { height, width }
    }

    /// Number of samples an image of this size holds with `channels` samples
    /// per pixel, or `None` if that number does not fit into a `usize`.
    pub fn sample_count(&self, channels: usize) -> Option<usize> {
        self.height.checked_mul(self.width)?.checked_mul(channels)
    }

    /// Length a buffer needs to hold `channels` samples per pixel.
    pub fn buffer_length(&self, channels: usize) -> crate::Result<usize> {
        self.sample_count(channels).ok_or(Error::InvalidDimensions(*self))
    }

    pub fn is_empty(&self) -> bool {
        self.height == 0 || self.width == 0
    }

    /// Rejects dimensions with a zero side.
    pub fn validate(self) -> crate::Result<Self> {
        if self.is_empty() {
            return Err(Error::InvalidDimensions(self));
        }
        Ok(self)
    }
}

impl Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{} (height x width)", self.height, self.width)
    }
}

/// The members of the PPM family, named after their magic number.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PpmFormat {
    /// `P2`
    AsciiGray,
    /// `P3`
    AsciiColor,
    /// `P5`
    BinaryGray,
    /// `P6`
    BinaryColor,
}

impl PpmFormat {
    pub fn from_magic(magic: &str) -> Option<Self> {
        match magic {
            "P2" => Some(Self::AsciiGray),
            "P3" => Some(Self::AsciiColor),
            "P5" => Some(Self::BinaryGray),
            "P6" => Some(Self::BinaryColor),
            _ => None,
        }
    }

    pub fn magic(&self) -> &'static str {
        match self {
            Self::AsciiGray => "P2",
            Self::AsciiColor => "P3",
            Self::BinaryGray => "P5",
            Self::BinaryColor => "P6",
        }
    }

    pub fn number_of_channels(&self) -> usize {
        if self.is_color() {
            3
        } else {
            1
        }
    }

    pub fn is_color(&self) -> bool {
        matches!(self, Self::AsciiColor | Self::BinaryColor)
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, Self::BinaryGray | Self::BinaryColor)
    }
}

impl Display for PpmFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let flavour = if self.is_binary() { "binary" } else { "ASCII" };
        let kind = if self.is_color() { "color" } else { "gray" };
        write!(f, "{} ({} {})", self.magic(), flavour, kind)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub format: PpmFormat,
    pub dimensions: Dimensions,
    pub max_value: u16,
}

impl Header {
    pub fn sample_count(&self) -> crate::Result<usize> {
        self.dimensions
            .sample_count(self.format.number_of_channels())
            .ok_or(Error::HeaderDimensionsTooLarge(self.dimensions))
    }
}

/// Decoded samples of one image, interleaved per pixel in file order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    format: PpmFormat,
    dimensions: Dimensions,
    samples: Vec<u8>,
}

impl Image {
    pub fn new(format: PpmFormat, dimensions: Dimensions, samples: Vec<u8>) -> crate::Result<Self> {
        let expected = dimensions.buffer_length(format.number_of_channels())?;
        if samples.len() != expected {
            return Err(Error::MismatchOfBufferLength {
                buffer_name: "samples",
                expected,
                actual: samples.len(),
            });
        }
        Ok(Self {
            format,
            dimensions,
            samples,
        })
    }

    pub fn gray(dimensions: Dimensions, samples: Vec<u8>) -> crate::Result<Self> {
        Self::new(PpmFormat::BinaryGray, dimensions, samples)
    }

    pub fn format(&self) -> PpmFormat {
        self.format
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    /// Copies one channel out of the interleaved samples.
    pub fn channel(&self, index: usize) -> Vec<u8> {
        self.samples
            .iter()
            .skip(index)
            .step_by(self.format.number_of_channels())
            .copied()
            .collect()
    }
}

pub trait ImageReader {
    fn read_header(&mut self) -> crate::Result<Header>;
    fn read_image(&mut self) -> crate::Result<Image>;
}

pub trait ImageWriter {
    fn write_image(&mut self) -> crate::Result<()>;
}

#[cfg(test)]
mod test {
    use super::{Dimensions, Header, Image, PpmFormat};
    use crate::error::ErrorKind;

    #[test]
    fn channel_extraction_of_color_image() {
        let samples = vec![1, 2, 3, 4, 5, 6];
        let image = Image::new(PpmFormat::BinaryColor, Dimensions::new(1, 2), samples).unwrap();
        assert_eq!(image.channel(0), vec![1, 4]);
        assert_eq!(image.channel(1), vec![2, 5]);
        assert_eq!(image.channel(2), vec![3, 6]);
    }

    #[test]
    fn sample_length_must_match_dimensions() {
        let result = Image::new(PpmFormat::AsciiColor, Dimensions::new(2, 2), vec![0; 11]);
        assert_eq!(result.unwrap_err().kind(), ErrorKind::SizeMismatch);
    }

    #[test]
    fn zero_sided_dimensions_are_rejected() {
        let error = Dimensions::new(0, 4).validate().unwrap_err();
        assert_eq!(error.kind(), ErrorKind::SizeMismatch);
        assert!(Dimensions::new(3, 4).validate().is_ok());
    }

    #[test]
    fn sample_count_overflow() {
        let dimensions = Dimensions::new(usize::MAX, 2);
        assert_eq!(dimensions.sample_count(1), None);
        assert_eq!(
            dimensions.buffer_length(1).unwrap_err().kind(),
            ErrorKind::SizeMismatch
        );
        assert_eq!(Dimensions::new(usize::MAX, 1).sample_count(3), None);
        assert_eq!(Dimensions::new(4, 4).sample_count(3), Some(48));
    }

    #[test]
    fn oversized_header_is_a_format_error() {
        let header = Header {
            format: PpmFormat::BinaryColor,
            dimensions: Dimensions::new(usize::MAX / 2, 2),
            max_value: 255,
        };
        assert_eq!(header.sample_count().unwrap_err().kind(), ErrorKind::Format);
    }

    #[test]
    fn magic_numbers() {
        for magic in ["P2", "P3", "P5", "P6"] {
            let format = PpmFormat::from_magic(magic).unwrap();
            assert_eq!(format.magic(), magic);
        }
        assert!(PpmFormat::from_magic("P4").is_none());
        assert_eq!(PpmFormat::BinaryColor.number_of_channels(), 3);
        assert_eq!(PpmFormat::AsciiGray.number_of_channels(), 1);
    }
}
