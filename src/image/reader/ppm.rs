use std::io::{self, Read};

use super::super::{Dimensions, Header, Image, ImageReader, PpmFormat, MAX_SAMPLE_VALUE};
use crate::Error;

/// Upper bound for reserving sample storage ahead of reading. A header may
/// claim far more samples than the file actually holds.
const MAX_PREALLOCATED_SAMPLES: usize = 1 << 24;

/// Reads members of the PPM family (`P2`, `P3`, `P5`, `P6`) with 8 bit samples.
///
/// Samples are returned exactly as stored; a max value below 255 only narrows
/// the accepted range and does not rescale anything.
pub struct PPMImageReader<T: Read> {
    reader: T,
}

impl<T: Read> PPMImageReader<T> {
    pub fn new(reader: T) -> Self {
        Self { reader }
    }

    /// Reads the pixel data that follows an already parsed `header`.
    pub fn read_body(&mut self, header: Header) -> crate::Result<Image> {
        let samples = if header.format.is_binary() {
            self.read_binary_samples(&header)?
        } else {
            self.read_ascii_samples(&header)?
        };
        Image::new(header.format, header.dimensions, samples)
    }

    fn read_binary_samples(&mut self, header: &Header) -> crate::Result<Vec<u8>> {
        let expected_samples = header.sample_count()?;
        let mut samples = Vec::with_capacity(expected_samples.min(MAX_PREALLOCATED_SAMPLES));
        self.reader
            .by_ref()
            .take(expected_samples as u64)
            .read_to_end(&mut samples)
            .map_err(Error::FailedToReadImageData)?;
        check_sample_count(expected_samples, samples.len())?;
        if let Some(&value) = samples
            .iter()
            .find(|&&sample| u16::from(sample) > header.max_value)
        {
            return Err(Error::SampleValueOutOfRange {
                value: u32::from(value),
                max_value: header.max_value,
            });
        }
        Ok(samples)
    }

    fn read_ascii_samples(&mut self, header: &Header) -> crate::Result<Vec<u8>> {
        let expected_samples = header.sample_count()?;
        let mut samples = Vec::with_capacity(expected_samples.min(MAX_PREALLOCATED_SAMPLES));
        let tokenizer = PPMTokenizer::new(&mut self.reader);
        for token in tokenizer.take(expected_samples) {
            samples.push(parse_sample_value(&token?, header.max_value)?);
        }
        check_sample_count(expected_samples, samples.len())?;
        Ok(samples)
    }
}

impl<T: Read> ImageReader for PPMImageReader<T> {
    fn read_header(&mut self) -> crate::Result<Header> {
        let mut tokenizer = PPMTokenizer::new(&mut self.reader);
        let mut parser = HeaderParser::new(&mut tokenizer);
        let header = parser.parse_header()?;
        log::debug!(
            "Parsed {} header with {} and max value {}",
            header.format,
            header.dimensions,
            header.max_value
        );
        Ok(header)
    }

    fn read_image(&mut self) -> crate::Result<Image> {
        let header = self.read_header()?;
        self.read_body(header)
    }
}

fn check_sample_count(expected_samples: usize, actual_samples: usize) -> crate::Result<()> {
    if actual_samples != expected_samples {
        return Err(Error::TruncatedPixelData {
            expected_samples,
            actual_samples,
        });
    }
    Ok(())
}

fn parse_sample_value(token: &str, max_value: u16) -> crate::Result<u8> {
    let value: u32 = token
        .parse()
        .map_err(|_| Error::ParsingOfTokenFailed(SAMPLE_VALUE_TOKEN_NAME))?;
    if value > u32::from(max_value) {
        return Err(Error::SampleValueOutOfRange { value, max_value });
    }
    // max_value never exceeds 255, see HeaderParser::parse_max_value
    Ok(value as u8)
}

/// Splits the textual part of a PPM file into whitespace separated tokens.
///
/// Reads byte by byte so the underlying reader is left positioned right after
/// the single whitespace byte that terminates the last returned token. Binary
/// pixel data starts exactly there.
struct PPMTokenizer<'a, R: Read> {
    reader: &'a mut R,
    buffer: Vec<u8>,
}

impl<'a, R: Read> PPMTokenizer<'a, R> {
    fn new(reader: &'a mut R) -> Self {
        PPMTokenizer {
            reader,
            buffer: Vec::new(),
        }
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = [0; 1];
        loop {
            match self.reader.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

impl<R: Read> Iterator for PPMTokenizer<'_, R> {
    type Item = crate::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buffer.clear();
        let mut in_comment = false;

        loop {
            let byte = match self.read_byte() {
                Ok(Some(byte)) => byte,
                Ok(None) => break,
                Err(e) => return Some(Err(Error::FailedToReadImageData(e))),
            };
            if in_comment {
                if byte == b'\n' {
                    in_comment = false;
                    if !self.buffer.is_empty() {
                        break;
                    }
                }
                continue;
            }
            if byte == b'#' {
                in_comment = true;
                continue;
            }
            if byte.is_ascii_whitespace() {
                if !self.buffer.is_empty() {
                    break;
                }
            } else {
                self.buffer.push(byte);
            }
        }

        if self.buffer.is_empty() {
            return None;
        }

        Some(Ok(String::from_utf8_lossy(&self.buffer).into_owned()))
    }
}

const MAGIC_NUMBER_TOKEN_NAME: &str = "Magic Number";
const WIDTH_HEADER_TOKEN_NAME: &str = "Width Header";
const HEIGHT_HEADER_TOKEN_NAME: &str = "Height Header";
const MAX_VALUE_HEADER_TOKEN_NAME: &str = "Max Value Header";
const SAMPLE_VALUE_TOKEN_NAME: &str = "Sample Value";

struct HeaderParser<'a, T> {
    tokenizer: &'a mut T,
}

impl<'a, T> HeaderParser<'a, T>
where
    T: Iterator<Item = crate::Result<String>>,
{
    fn new(tokenizer: &'a mut T) -> Self {
        Self { tokenizer }
    }

    fn parse_header(&mut self) -> crate::Result<Header> {
        let format = self.parse_format()?;
        let width = self.parse_dimension(WIDTH_HEADER_TOKEN_NAME)?;
        let height = self.parse_dimension(HEIGHT_HEADER_TOKEN_NAME)?;
        let max_value = self.parse_max_value()?;
        let header = Header {
            format,
            dimensions: Dimensions::new(height, width),
            max_value,
        };
        header.sample_count()?;
        Ok(header)
    }

    fn next_token(&mut self, token_name: &'static str) -> crate::Result<String> {
        self.tokenizer
            .next()
            .ok_or(Error::PPMFileDoesNotContainRequiredToken(token_name))?
    }

    fn parse_format(&mut self) -> crate::Result<PpmFormat> {
        let magic = self.next_token(MAGIC_NUMBER_TOKEN_NAME)?;
        PpmFormat::from_magic(&magic).ok_or(Error::UnsupportedMagicNumber(magic))
    }

    fn parse_dimension(&mut self, token_name: &'static str) -> crate::Result<usize> {
        let value: usize = self
            .next_token(token_name)?
            .parse()
            .map_err(|_| Error::ParsingOfTokenFailed(token_name))?;
        if value == 0 {
            return Err(Error::ParsingOfTokenFailed(token_name));
        }
        Ok(value)
    }

    fn parse_max_value(&mut self) -> crate::Result<u16> {
        let value: u32 = self
            .next_token(MAX_VALUE_HEADER_TOKEN_NAME)?
            .parse()
            .map_err(|_| Error::ParsingOfTokenFailed(MAX_VALUE_HEADER_TOKEN_NAME))?;
        if value == 0 || value > u32::from(MAX_SAMPLE_VALUE) {
            return Err(Error::UnsupportedMaxValue(value));
        }
        Ok(value as u16)
    }
}
