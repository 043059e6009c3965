use std::fs::{File, OpenOptions};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::image::writer::pgm::{GrayEncoding, PGMImageWriter};
use crate::image::{Dimensions, Image, ImageWriter};
use crate::session::{ImageId, ImageSession, PathTable, SessionRegistry};

const COLOR_CHANNELS: usize = 3;

/// Which registered images act as the two sides of a stereo read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StereoPair {
    pub left: ImageId,
    pub right: ImageId,
}

impl Default for StereoPair {
    fn default() -> Self {
        Self {
            left: ImageId::new(0),
            right: ImageId::new(1),
        }
    }
}

/// Arrangement of the three color channels inside a caller buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SampleLayout {
    /// `RGBRGB...`, the order of the file.
    #[default]
    Interleaved,
    /// All red samples, then all green, then all blue.
    Planar,
}

impl SampleLayout {
    fn arrange(&self, interleaved: &[u8], output: &mut [u8]) {
        match self {
            Self::Interleaved => output.copy_from_slice(interleaved),
            Self::Planar => {
                let plane_length = interleaved.len() / COLOR_CHANNELS;
                for (pixel_index, pixel) in interleaved.chunks_exact(COLOR_CHANNELS).enumerate() {
                    for (channel_index, &sample) in pixel.iter().enumerate() {
                        output[channel_index * plane_length + pixel_index] = sample;
                    }
                }
            }
        }
    }
}

/// Destination of every gray image a codec writes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputTarget {
    path: PathBuf,
    encoding: GrayEncoding,
}

impl OutputTarget {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            encoding: GrayEncoding::default(),
        }
    }

    pub fn with_encoding(mut self, encoding: GrayEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn encoding(&self) -> GrayEncoding {
        self.encoding
    }
}

/// Owns the session registry and moves pixels between registered images and
/// caller buffers.
///
/// Reads never keep a position between calls. Each one decodes its sources
/// again from their first byte, so repeated reads of unchanged files return
/// identical buffers.
#[derive(Debug)]
pub struct PixelCodec {
    registry: SessionRegistry,
    stereo_pair: StereoPair,
    layout: SampleLayout,
    output: OutputTarget,
}

impl PixelCodec {
    pub fn new(output: OutputTarget) -> Self {
        Self {
            registry: SessionRegistry::new(),
            stereo_pair: StereoPair::default(),
            layout: SampleLayout::default(),
            output,
        }
    }

    pub fn with_stereo_pair(mut self, stereo_pair: StereoPair) -> Self {
        self.stereo_pair = stereo_pair;
        self
    }

    pub fn with_layout(mut self, layout: SampleLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn initialize(
        &mut self,
        id: ImageId,
        height: usize,
        width: usize,
        paths: &PathTable,
    ) -> crate::Result<()> {
        self.registry.initialize(id, height, width, paths)?;
        Ok(())
    }

    /// Fills `left` and `right` with `height * width * 3` samples each, laid out
    /// according to the configured [`SampleLayout`].
    ///
    /// Both sides are decoded before either buffer is touched.
    pub fn read_stereo_pair(
        &self,
        height: usize,
        width: usize,
        left: &mut [u8],
        right: &mut [u8],
    ) -> crate::Result<()> {
        let dimensions = Dimensions::new(height, width).validate()?;
        let expected = dimensions.buffer_length(COLOR_CHANNELS)?;
        check_buffer_length("left", expected, left.len())?;
        check_buffer_length("right", expected, right.len())?;

        let left_session = self.registry.session(self.stereo_pair.left)?;
        let right_session = self.registry.session(self.stereo_pair.right)?;
        let left_image = decode_color(left_session, dimensions)?;
        let right_image = decode_color(right_session, dimensions)?;

        self.layout.arrange(left_image.samples(), left);
        self.layout.arrange(right_image.samples(), right);
        Ok(())
    }

    /// Decodes image `id` into three separate `height * width` planes.
    pub fn read_channels(
        &self,
        id: ImageId,
        height: usize,
        width: usize,
        red: &mut [u8],
        green: &mut [u8],
        blue: &mut [u8],
    ) -> crate::Result<()> {
        let dimensions = Dimensions::new(height, width).validate()?;
        let expected = dimensions.buffer_length(1)?;
        check_buffer_length("red", expected, red.len())?;
        check_buffer_length("green", expected, green.len())?;
        check_buffer_length("blue", expected, blue.len())?;

        let image = decode_color(self.registry.session(id)?, dimensions)?;
        for (((pixel, r), g), b) in image
            .samples()
            .chunks_exact(COLOR_CHANNELS)
            .zip(red.iter_mut())
            .zip(green.iter_mut())
            .zip(blue.iter_mut())
        {
            *r = pixel[0];
            *g = pixel[1];
            *b = pixel[2];
        }
        Ok(())
    }

    /// Writes `gray` as a single channel image to the configured output.
    pub fn write_gray(&self, height: usize, width: usize, gray: &[u8]) -> crate::Result<()> {
        let dimensions = Dimensions::new(height, width).validate()?;
        check_buffer_length("gray", dimensions.buffer_length(1)?, gray.len())?;
        let image = Image::gray(dimensions, gray.to_vec())?;

        let path = self.output.path();
        let file = open_output_file(path)?;
        let mut writer = PGMImageWriter::new(BufWriter::new(file), &image, self.output.encoding());
        writer
            .write_image()
            .map_err(|e| Error::ImageEncodingFailed(path.to_path_buf(), Box::new(e)))
            .inspect_err(|e| log::error!("{}", e))?;
        log::info!("Wrote {} gray image to '{}'", dimensions, path.display());
        Ok(())
    }
}

fn decode_color(session: &ImageSession, dimensions: Dimensions) -> crate::Result<Image> {
    session.check_requested_dimensions(dimensions)?;
    let image = session
        .decode()
        .inspect_err(|e| log::error!("Reading image {} failed: {}", session.id(), e))?;
    if !image.format().is_color() {
        return Err(Error::ImageDecodingFailed(
            session.id(),
            Box::new(Error::UnexpectedImageFormat {
                expected: "color",
                actual: image.format(),
            }),
        ));
    }
    Ok(image)
}

fn check_buffer_length(
    buffer_name: &'static str,
    expected: usize,
    actual: usize,
) -> crate::Result<()> {
    if expected != actual {
        return Err(Error::MismatchOfBufferLength {
            buffer_name,
            expected,
            actual,
        });
    }
    Ok(())
}

fn open_output_file(file_path: &Path) -> crate::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(file_path)
        .map_err(|e| Error::UnableToOpenOutputFileForWriting(file_path.to_path_buf(), e))
}

#[cfg(test)]
mod tests {
    use std::fs::{self, OpenOptions};
    use std::path::{Path, PathBuf};

    use tempfile::TempDir;

    use super::{OutputTarget, PixelCodec, SampleLayout, StereoPair};
    use crate::error::ErrorKind;
    use crate::image::reader::ppm::PPMImageReader;
    use crate::image::writer::pgm::GrayEncoding;
    use crate::image::{Dimensions, ImageReader};
    use crate::session::{ImageId, PathTable};

    const LEFT: ImageId = ImageId::new(0);
    const RIGHT: ImageId = ImageId::new(1);

    fn samples(seed: u8, count: usize) -> Vec<u8> {
        (0..count)
            .map(|i| (i as u8).wrapping_mul(7).wrapping_add(seed))
            .collect()
    }

    fn write_p3(path: &Path, height: usize, width: usize, data: &[u8]) {
        let mut text = format!("P3\n# ascii side\n{} {}\n255\n", width, height);
        for pixel in data.chunks(3) {
            let pixel: Vec<String> = pixel.iter().map(|sample| sample.to_string()).collect();
            text.push_str(&pixel.join(" "));
            text.push('\n');
        }
        fs::write(path, text).expect("Failed to write test image");
    }

    fn write_p6(path: &Path, height: usize, width: usize, data: &[u8]) {
        let mut bytes = format!("P6\n{} {}\n255\n", width, height).into_bytes();
        bytes.extend_from_slice(data);
        fs::write(path, bytes).expect("Failed to write test image");
    }

    struct Fixture {
        directory: TempDir,
        paths: PathTable,
        left_samples: Vec<u8>,
        right_samples: Vec<u8>,
    }

    impl Fixture {
        fn new(height: usize, width: usize) -> Self {
            let directory = TempDir::new().unwrap();
            let left_path = directory.path().join("left.ppm");
            let right_path = directory.path().join("right.ppm");
            let left_samples = samples(1, height * width * 3);
            let right_samples = samples(100, height * width * 3);
            write_p6(&left_path, height, width, &left_samples);
            write_p6(&right_path, height, width, &right_samples);
            Self {
                directory,
                paths: PathTable::new(vec![left_path, right_path]),
                left_samples,
                right_samples,
            }
        }

        fn right_path(&self) -> PathBuf {
            self.directory.path().join("right.ppm")
        }

        fn output_path(&self) -> PathBuf {
            self.directory.path().join("result.pgm")
        }

        fn codec(&self, height: usize, width: usize) -> PixelCodec {
            let mut codec = PixelCodec::new(OutputTarget::new(self.output_path()));
            codec.initialize(LEFT, height, width, &self.paths).unwrap();
            codec.initialize(RIGHT, height, width, &self.paths).unwrap();
            codec
        }
    }

    #[test]
    fn read_stereo_pair_fills_both_buffers() {
        let fixture = Fixture::new(4, 4);
        let codec = fixture.codec(4, 4);
        let mut left = vec![0; 48];
        let mut right = vec![0; 48];
        codec.read_stereo_pair(4, 4, &mut left, &mut right).unwrap();
        assert_eq!(left, fixture.left_samples);
        assert_eq!(right, fixture.right_samples);
    }

    #[test]
    fn truncated_right_image() {
        let fixture = Fixture::new(4, 4);
        let codec = fixture.codec(4, 4);
        let mut left = vec![0; 48];
        let mut right = vec![0; 48];
        codec.read_stereo_pair(4, 4, &mut left, &mut right).unwrap();

        OpenOptions::new()
            .write(true)
            .open(fixture.right_path())
            .unwrap()
            .set_len(40)
            .unwrap();
        let error = codec
            .read_stereo_pair(4, 4, &mut left, &mut right)
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::TruncatedData);
    }

    #[test]
    fn repeated_reads_are_identical() {
        let fixture = Fixture::new(3, 5);
        let codec = fixture.codec(3, 5);
        let mut first = (vec![0; 45], vec![0; 45]);
        let mut second = (vec![0; 45], vec![0; 45]);
        codec
            .read_stereo_pair(3, 5, &mut first.0, &mut first.1)
            .unwrap();
        codec
            .read_stereo_pair(3, 5, &mut second.0, &mut second.1)
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn uninitialized_right_image() {
        let fixture = Fixture::new(2, 2);
        let mut codec = PixelCodec::new(OutputTarget::new(fixture.output_path()));
        codec.initialize(LEFT, 2, 2, &fixture.paths).unwrap();
        let mut left = vec![0; 12];
        let mut right = vec![0; 12];
        let error = codec
            .read_stereo_pair(2, 2, &mut left, &mut right)
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::UninitializedSession);
        assert!(left.iter().all(|&sample| sample == 0));
    }

    #[test]
    fn requested_size_differs_from_registration() {
        let fixture = Fixture::new(2, 3);
        let codec = fixture.codec(2, 3);
        let mut left = vec![0; 18];
        let mut right = vec![0; 18];
        let error = codec
            .read_stereo_pair(3, 2, &mut left, &mut right)
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::SizeMismatch);
    }

    #[test]
    fn output_buffer_too_small() {
        let fixture = Fixture::new(2, 2);
        let codec = fixture.codec(2, 2);
        let mut left = vec![0; 12];
        let mut right = vec![0; 11];
        let error = codec
            .read_stereo_pair(2, 2, &mut left, &mut right)
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::SizeMismatch);
    }

    #[test]
    fn header_changed_after_registration() {
        let fixture = Fixture::new(2, 2);
        let codec = fixture.codec(2, 2);
        write_p6(&fixture.right_path(), 1, 4, &samples(0, 12));
        let mut left = vec![0; 12];
        let mut right = vec![0; 12];
        let error = codec
            .read_stereo_pair(2, 2, &mut left, &mut right)
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::SizeMismatch);
    }

    #[test]
    fn ascii_and_binary_sides() {
        let fixture = Fixture::new(3, 2);
        write_p3(&fixture.right_path(), 3, 2, &fixture.right_samples);
        let codec = fixture.codec(3, 2);
        let mut left = vec![0; 18];
        let mut right = vec![0; 18];
        codec.read_stereo_pair(3, 2, &mut left, &mut right).unwrap();
        assert_eq!(left, fixture.left_samples);
        assert_eq!(right, fixture.right_samples);
    }

    #[test]
    fn truncated_ascii_side() {
        let fixture = Fixture::new(2, 2);
        write_p3(&fixture.right_path(), 2, 2, &fixture.right_samples[..10]);
        let codec = fixture.codec(2, 2);
        let mut left = vec![0; 12];
        let mut right = vec![0; 12];
        let error = codec
            .read_stereo_pair(2, 2, &mut left, &mut right)
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::TruncatedData);
        assert!(right.iter().all(|&sample| sample == 0));
    }

    #[test]
    fn overflowing_stereo_read_size() {
        let fixture = Fixture::new(2, 2);
        let codec = fixture.codec(2, 2);
        let error = codec
            .read_stereo_pair(usize::MAX, 2, &mut [], &mut [])
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::SizeMismatch);
    }

    #[test]
    fn planar_layout() {
        let fixture = Fixture::new(1, 2);
        let codec = fixture.codec(1, 2).with_layout(SampleLayout::Planar);
        let mut left = vec![0; 6];
        let mut right = vec![0; 6];
        codec.read_stereo_pair(1, 2, &mut left, &mut right).unwrap();
        let s = &fixture.left_samples;
        assert_eq!(left, vec![s[0], s[3], s[1], s[4], s[2], s[5]]);
    }

    #[test]
    fn swapped_stereo_pair() {
        let fixture = Fixture::new(2, 2);
        let codec = fixture.codec(2, 2).with_stereo_pair(StereoPair {
            left: RIGHT,
            right: LEFT,
        });
        let mut left = vec![0; 12];
        let mut right = vec![0; 12];
        codec.read_stereo_pair(2, 2, &mut left, &mut right).unwrap();
        assert_eq!(left, fixture.right_samples);
        assert_eq!(right, fixture.left_samples);
    }

    #[test]
    fn gray_source_is_not_a_stereo_side() {
        let fixture = Fixture::new(1, 3);
        let gray_path = fixture.directory.path().join("gray.pgm");
        let mut bytes = b"P5 3 1 255\n".to_vec();
        bytes.extend_from_slice(&[1, 2, 3]);
        fs::write(&gray_path, bytes).unwrap();
        let left_path = fixture.paths.resolve(LEFT).unwrap().to_path_buf();
        let paths = PathTable::new(vec![left_path, gray_path]);
        let mut codec = PixelCodec::new(OutputTarget::new(fixture.output_path()));
        codec.initialize(LEFT, 1, 3, &paths).unwrap();
        codec.initialize(RIGHT, 1, 3, &paths).unwrap();
        let mut left = vec![0; 9];
        let mut right = vec![0; 9];
        let error = codec
            .read_stereo_pair(1, 3, &mut left, &mut right)
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Format);
    }

    #[test]
    fn read_channels_splits_planes() {
        let fixture = Fixture::new(2, 2);
        let codec = fixture.codec(2, 2);
        let mut red = vec![0; 4];
        let mut green = vec![0; 4];
        let mut blue = vec![0; 4];
        codec
            .read_channels(RIGHT, 2, 2, &mut red, &mut green, &mut blue)
            .unwrap();
        let s = &fixture.right_samples;
        assert_eq!(red, vec![s[0], s[3], s[6], s[9]]);
        assert_eq!(green, vec![s[1], s[4], s[7], s[10]]);
        assert_eq!(blue, vec![s[2], s[5], s[8], s[11]]);
    }

    #[test]
    fn read_channels_of_unknown_image() {
        let fixture = Fixture::new(2, 2);
        let codec = fixture.codec(2, 2);
        let mut planes = [vec![0; 4], vec![0; 4], vec![0; 4]];
        let [red, green, blue] = &mut planes;
        let error = codec
            .read_channels(ImageId::new(5), 2, 2, red, green, blue)
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::UninitializedSession);
    }

    #[test]
    fn overflowing_channel_read_size() {
        let fixture = Fixture::new(2, 2);
        let codec = fixture.codec(2, 2);
        let error = codec
            .read_channels(LEFT, usize::MAX, 2, &mut [], &mut [], &mut [])
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::SizeMismatch);
    }

    #[test]
    fn write_gray_round_trip() {
        let fixture = Fixture::new(1, 1);
        let gray = samples(3, 6 * 7);
        for encoding in [GrayEncoding::Binary, GrayEncoding::Ascii] {
            let codec = PixelCodec::new(
                OutputTarget::new(fixture.output_path()).with_encoding(encoding),
            );
            codec.write_gray(6, 7, &gray).unwrap();
            let bytes = fs::read(fixture.output_path()).unwrap();
            let image = PPMImageReader::new(bytes.as_slice()).read_image().unwrap();
            assert_eq!(image.dimensions(), Dimensions::new(6, 7));
            assert_eq!(image.samples(), gray.as_slice());
        }
    }

    #[test]
    fn write_gray_with_wrong_length() {
        let fixture = Fixture::new(1, 1);
        let codec = PixelCodec::new(OutputTarget::new(fixture.output_path()));
        let error = codec.write_gray(2, 2, &[0; 5]).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::SizeMismatch);
        assert!(!fixture.output_path().exists());
    }

    #[test]
    fn overflowing_gray_write_size() {
        let fixture = Fixture::new(1, 1);
        let codec = PixelCodec::new(OutputTarget::new(fixture.output_path()));
        let error = codec.write_gray(usize::MAX, 2, &[]).unwrap_err();
        assert!(matches!(error, crate::Error::InvalidDimensions(_)));
        assert!(!fixture.output_path().exists());
    }

    #[test]
    fn write_gray_to_missing_directory() {
        let fixture = Fixture::new(1, 1);
        let target = fixture.directory.path().join("missing").join("result.pgm");
        let codec = PixelCodec::new(OutputTarget::new(target));
        let error = codec.write_gray(1, 2, &[0, 255]).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Write);
    }
}
