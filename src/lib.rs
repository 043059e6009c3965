use std::path::PathBuf;

use clap::{builder::PossibleValue, ValueEnum};

use crate::image::{Image, PpmFormat};

pub use cli::CLIParser;
pub use codec::{OutputTarget, PixelCodec, SampleLayout, StereoPair};
pub use error::{Error, ErrorKind};
pub use image::{writer::pgm::GrayEncoding, Dimensions};
pub use session::{ImageId, ImageSession, PathTable, SessionRegistry};

mod cli;
pub mod codec;
pub mod error;
pub mod image;
mod logger;
pub mod session;

pub type Result<T> = std::result::Result<T, error::Error>;

pub struct Arguments {
    left_file: PathBuf,
    right_file: PathBuf,
    output_file: PathBuf,
    height: usize,
    width: usize,
    side: Side,
    channel: Channel,
    encoding: GrayEncoding,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl ValueEnum for Side {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Left, Self::Right]
    }

    fn to_possible_value(&self) -> Option<PossibleValue> {
        match self {
            Self::Left => Some(PossibleValue::new("left")),
            Self::Right => Some(PossibleValue::new("right")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    fn index(&self) -> usize {
        match self {
            Self::Red => 0,
            Self::Green => 1,
            Self::Blue => 2,
        }
    }
}

impl ValueEnum for Channel {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Red, Self::Green, Self::Blue]
    }

    fn to_possible_value(&self) -> Option<PossibleValue> {
        match self {
            Self::Red => Some(PossibleValue::new("red")),
            Self::Green => Some(PossibleValue::new("green")),
            Self::Blue => Some(PossibleValue::new("blue")),
        }
    }
}

/// Registers both images of the stereo pair, reads them and writes the
/// selected channel of the selected side as a gray image.
pub fn extract_channel(arguments: &Arguments) -> Result<()> {
    let paths = PathTable::new(vec![
        arguments.left_file.clone(),
        arguments.right_file.clone(),
    ]);
    let stereo_pair = StereoPair::default();
    let output = OutputTarget::new(&arguments.output_file).with_encoding(arguments.encoding);
    let mut codec = PixelCodec::new(output).with_stereo_pair(stereo_pair);
    codec.initialize(stereo_pair.left, arguments.height, arguments.width, &paths)?;
    codec.initialize(stereo_pair.right, arguments.height, arguments.width, &paths)?;

    let dimensions = Dimensions::new(arguments.height, arguments.width);
    let format = PpmFormat::BinaryColor;
    let sample_count = dimensions.buffer_length(format.number_of_channels())?;
    let mut left = vec![0; sample_count];
    let mut right = vec![0; sample_count];
    codec.read_stereo_pair(arguments.height, arguments.width, &mut left, &mut right)?;

    let selected = match arguments.side {
        Side::Left => left,
        Side::Right => right,
    };
    let gray = Image::new(format, dimensions, selected)?.channel(arguments.channel.index());
    codec.write_gray(arguments.height, arguments.width, &gray)
}
