//! Where extracted crops are persisted.
//!
//! Every analysis gets its own namespace: a subdirectory of the output root
//! named by the request id. Opening a namespace only ever clears that
//! subdirectory, so concurrent analyses under the same root never delete each
//! other's artifacts.

use std::fs;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbImage};
use log::debug;
use rand::{rngs::StdRng, Rng, RngExt, SeedableRng};

use crate::error::PlatescanError;

/// Short random identifier of one artifact (8 lowercase hex characters).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ArtifactId(String);

impl ArtifactId {
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(format!("{:08x}", rng.random::<u32>()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name the artifact is stored under.
    pub fn file_name(&self) -> String {
        format!("{}.jpg", self.0)
    }
}

impl std::fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to a persisted artifact, handed to downstream classification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactHandle {
    pub id: ArtifactId,
    pub file_name: String,
    /// Filesystem location, for stores that write to disk.
    pub path: Option<PathBuf>,
}

/// Persists crops under fresh identifiers.
pub trait ArtifactStore {
    fn put(&mut self, crop: &RgbImage) -> Result<ArtifactHandle, PlatescanError>;
}

fn next_id(seeded: &mut Option<StdRng>) -> ArtifactId {
    match seeded {
        Some(rng) => ArtifactId::generate(rng),
        None => ArtifactId::generate(&mut rand::rng()),
    }
}

/// Writes JPEG artifacts into a per-request directory.
#[derive(Debug)]
pub struct DirStore {
    dir: PathBuf,
    request_id: String,
    rng: Option<StdRng>,
}

impl DirStore {
    /// Opens (creating if needed) `root/<request_id>` and removes any files
    /// left in it by an earlier run with the same id.
    ///
    /// Without a request id a random 16-hex-digit one is generated.
    pub fn open_namespace(root: &Path, request_id: Option<&str>) -> Result<Self, PlatescanError> {
        let request_id = match request_id {
            Some(id) => {
                validate_request_id(id)?;
                id.to_string()
            }
            None => format!("{:016x}", rand::rng().random::<u64>()),
        };

        let dir = root.join(&request_id);
        fs::create_dir_all(&dir)?;

        let mut cleared = 0usize;
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                fs::remove_file(entry.path())?;
                cleared += 1;
            }
        }
        if cleared > 0 {
            debug!("cleared {} stale artifact(s) from {}", cleared, dir.display());
        }

        Ok(Self {
            dir,
            request_id,
            rng: None,
        })
    }

    /// Makes artifact ids reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Some(StdRng::seed_from_u64(seed));
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}

impl ArtifactStore for DirStore {
    fn put(&mut self, crop: &RgbImage) -> Result<ArtifactHandle, PlatescanError> {
        let id = next_id(&mut self.rng);
        let file_name = id.file_name();
        let path = self.dir.join(&file_name);

        crop.save_with_format(&path, ImageFormat::Jpeg)
            .map_err(|source| PlatescanError::ImageEncode {
                path: path.clone(),
                source,
            })?;
        debug!("wrote artifact {}", path.display());

        Ok(ArtifactHandle {
            id,
            file_name,
            path: Some(path),
        })
    }
}

fn validate_request_id(id: &str) -> Result<(), PlatescanError> {
    let valid = !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(PlatescanError::InvalidConfig {
            message: format!(
                "request id '{}' must be 1-64 characters of [A-Za-z0-9_-]",
                id
            ),
        })
    }
}

/// Keeps artifacts in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Vec<(ArtifactHandle, RgbImage)>,
    rng: Option<StdRng>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            items: Vec::new(),
            rng: Some(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn items(&self) -> &[(ArtifactHandle, RgbImage)] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl ArtifactStore for MemoryStore {
    fn put(&mut self, crop: &RgbImage) -> Result<ArtifactHandle, PlatescanError> {
        let id = next_id(&mut self.rng);
        let handle = ArtifactHandle {
            file_name: id.file_name(),
            id,
            path: None,
        };
        self.items.push((handle.clone(), crop.clone()));
        Ok(handle)
    }
}
