use std::io::Write;

use crate::{
    image::{Image, ImageWriter, PpmFormat, MAX_SAMPLE_VALUE},
    Error,
};

/// Keeps ASCII lines below the 70 characters recommended for PGM files.
const ASCII_SAMPLES_PER_LINE: usize = 17;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GrayEncoding {
    /// `P5`
    #[default]
    Binary,
    /// `P2`
    Ascii,
}

impl GrayEncoding {
    fn format(&self) -> PpmFormat {
        match self {
            Self::Binary => PpmFormat::BinaryGray,
            Self::Ascii => PpmFormat::AsciiGray,
        }
    }
}

pub struct PGMImageWriter<'a, T: Write> {
    writer: T,
    image: &'a Image,
    encoding: GrayEncoding,
}

impl<'a, T: Write> PGMImageWriter<'a, T> {
    pub fn new(writer: T, image: &'a Image, encoding: GrayEncoding) -> Self {
        Self {
            writer,
            image,
            encoding,
        }
    }

    fn write_header(&mut self) -> std::io::Result<()> {
        let dimensions = self.image.dimensions();
        write!(
            self.writer,
            "{}\n{} {}\n{}\n",
            self.encoding.format().magic(),
            dimensions.width,
            dimensions.height,
            MAX_SAMPLE_VALUE
        )
    }

    fn write_samples(&mut self) -> std::io::Result<()> {
        match self.encoding {
            GrayEncoding::Binary => self.writer.write_all(self.image.samples()),
            GrayEncoding::Ascii => {
                for line in self.image.samples().chunks(ASCII_SAMPLES_PER_LINE) {
                    let line = line
                        .iter()
                        .map(|sample| sample.to_string())
                        .collect::<Vec<String>>()
                        .join(" ");
                    writeln!(self.writer, "{}", line)?;
                }
                Ok(())
            }
        }
    }
}

impl<T: Write> ImageWriter for PGMImageWriter<'_, T> {
    fn write_image(&mut self) -> crate::Result<()> {
        if self.image.format().is_color() {
            return Err(Error::UnexpectedImageFormat {
                expected: "single channel",
                actual: self.image.format(),
            });
        }
        self.write_header().map_err(Error::FailedToWriteImageData)?;
        self.write_samples().map_err(Error::FailedToWriteImageData)?;
        self.writer.flush().map_err(Error::FailedToWriteImageData)
    }
}
