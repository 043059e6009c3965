use std::collections::HashMap;
use std::fmt::Display;
use std::fs::File;
use std::io::{BufReader, Seek};
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::image::{reader::ppm::PPMImageReader, Dimensions, Image, ImageReader};

/// Caller chosen key of a registered image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageId(usize);

impl ImageId {
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

impl Display for ImageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Paths of the images a caller may register, indexed by [`ImageId`].
#[derive(Clone, Debug, Default)]
pub struct PathTable {
    paths: Vec<PathBuf>,
}

impl PathTable {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn resolve(&self, id: ImageId) -> crate::Result<&Path> {
        self.paths
            .get(id.index())
            .map(PathBuf::as_path)
            .ok_or(Error::PathNotRegisteredForImage {
                id,
                number_of_paths: self.paths.len(),
            })
    }
}

impl<P: Into<PathBuf>> FromIterator<P> for PathTable {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

/// An opened image whose header agreed with the dimensions it was registered with.
#[derive(Debug)]
pub struct ImageSession {
    id: ImageId,
    path: PathBuf,
    dimensions: Dimensions,
    handle: File,
}

impl ImageSession {
    fn open(id: ImageId, path: &Path, dimensions: Dimensions) -> crate::Result<Self> {
        let handle = File::open(path)
            .map_err(|e| Error::UnableToOpenInputFileForReading(path.to_path_buf(), e))?;
        let session = Self {
            id,
            path: path.to_path_buf(),
            dimensions,
            handle,
        };
        session.check_header()?;
        Ok(session)
    }

    pub fn id(&self) -> ImageId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Decodes the whole source.
    ///
    /// Decoding is stateless: every call starts at the beginning of the file
    /// and reflects its current content, regardless of earlier calls.
    pub fn decode(&self) -> crate::Result<Image> {
        let mut reader = self.reader_from_start()?;
        let header = reader
            .read_header()
            .map_err(|e| Error::ImageDecodingFailed(self.id, Box::new(e)))?;
        self.check_dimensions(header.dimensions)?;
        let image = reader
            .read_body(header)
            .map_err(|e| Error::ImageDecodingFailed(self.id, Box::new(e)))?;
        log::debug!(
            "Decoded image {} from '{}' as {}",
            self.id,
            self.path.display(),
            image.format()
        );
        Ok(image)
    }

    /// Fails unless `requested` equals the dimensions given at registration.
    pub fn check_requested_dimensions(&self, requested: Dimensions) -> crate::Result<()> {
        if requested != self.dimensions {
            return Err(Error::MismatchOfRequestedAndDeclaredSize {
                id: self.id,
                declared: self.dimensions,
                requested,
            });
        }
        Ok(())
    }

    fn check_header(&self) -> crate::Result<()> {
        let header = self
            .reader_from_start()?
            .read_header()
            .map_err(|e| Error::ImageDecodingFailed(self.id, Box::new(e)))?;
        self.check_dimensions(header.dimensions)
    }

    fn check_dimensions(&self, actual: Dimensions) -> crate::Result<()> {
        if actual != self.dimensions {
            return Err(Error::MismatchOfSizeBetweenHeaderAndDeclaration {
                id: self.id,
                declared: self.dimensions,
                actual,
            });
        }
        Ok(())
    }

    fn reader_from_start(&self) -> crate::Result<PPMImageReader<BufReader<&File>>> {
        let mut handle = &self.handle;
        handle
            .rewind()
            .map_err(|e| Error::FailedToReadInputFile(self.path.clone(), e))?;
        Ok(PPMImageReader::new(BufReader::new(handle)))
    }
}

/// Registered sessions keyed by image id.
///
/// Entries are only ever added or replaced, never removed. Handles stay open
/// until the registry itself is dropped.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<ImageId, ImageSession>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens `paths[id]` and checks its header against `height` x `width`.
    ///
    /// A previous session for `id` is replaced only when every check passed.
    pub fn initialize(
        &mut self,
        id: ImageId,
        height: usize,
        width: usize,
        paths: &PathTable,
    ) -> crate::Result<&ImageSession> {
        let dimensions = Dimensions::new(height, width)
            .validate()
            .inspect_err(|e| log::warn!("Rejected registration of image {}: {}", id, e))?;
        let path = paths.resolve(id)?;
        let session = ImageSession::open(id, path, dimensions)
            .inspect_err(|e| log::error!("Registration of image {} failed: {}", id, e))?;
        log::info!(
            "Registered image {} from '{}' with {}",
            id,
            path.display(),
            dimensions
        );
        if self.sessions.insert(id, session).is_some() {
            log::debug!("Replaced previous session of image {}", id);
        }
        self.session(id)
    }

    pub fn session(&self, id: ImageId) -> crate::Result<&ImageSession> {
        self.sessions
            .get(&id)
            .ok_or(Error::UninitializedSession(id))
    }

    pub fn is_registered(&self, id: ImageId) -> bool {
        self.sessions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
