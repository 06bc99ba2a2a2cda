//! Two-slot session persistence.
//!
//! The advisor flow keeps exactly two values between screens: the symptom
//! description and the compressed tongue photo. They are stored as plain
//! string slots under the configured data directory, overwritten per session,
//! with no schema versioning. Each slot has a capacity ceiling; a write that
//! exceeds it fails with `SlotCapacity`, which is reported to the user
//! separately from image decode errors so they can retry with a smaller photo.

use crate::{AdvisorError, AdvisorResult};
use advisor_imaging::{CompressedImage, ImageCompressor};
use advisor_types::{DataUrl, NonEmptyText};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Slot key for the symptom description.
pub const USER_FEELING_KEY: &str = "userFeeling";
/// Slot key for the tongue photo data URL.
pub const TONGUE_IMAGE_KEY: &str = "tongueImage";

/// Per-slot capacity ceiling, modelled on the storage limit the compressor's
/// byte budget was chosen for.
pub const SLOT_CAPACITY: usize = 1024 * 1024 + 512 * 1024;

/// File-backed store for the two session slots.
#[derive(Debug, Clone)]
pub struct SessionStore {
    data_dir: PathBuf,
    capacity: usize,
}

impl SessionStore {
    /// Creates the store, creating the data directory if needed.
    ///
    /// # Errors
    /// `AdvisorError::StorageDirCreation` if the directory cannot be created.
    pub fn new(data_dir: impl Into<PathBuf>) -> AdvisorResult<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir).map_err(AdvisorError::StorageDirCreation)?;
        Ok(Self {
            data_dir,
            capacity: SLOT_CAPACITY,
        })
    }

    /// Overrides the slot capacity. Used by tests.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Writes a slot, rejecting values over the capacity ceiling.
    pub fn put(&self, key: &str, value: &str) -> AdvisorResult<()> {
        if value.len() > self.capacity {
            return Err(AdvisorError::SlotCapacity {
                size: value.len(),
                capacity: self.capacity,
            });
        }
        fs::write(self.slot_path(key), value).map_err(AdvisorError::SlotWrite)?;
        debug!(key, bytes = value.len(), "session slot written");
        Ok(())
    }

    /// Reads a slot; `None` if it has never been written or was cleared.
    pub fn get(&self, key: &str) -> AdvisorResult<Option<String>> {
        match fs::read_to_string(self.slot_path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AdvisorError::SlotRead(e)),
        }
    }

    pub fn put_user_feeling(&self, feeling: &NonEmptyText) -> AdvisorResult<()> {
        self.put(USER_FEELING_KEY, feeling.as_str())
    }

    pub fn user_feeling(&self) -> AdvisorResult<Option<String>> {
        self.get(USER_FEELING_KEY)
    }

    pub fn put_tongue_image(&self, image: &DataUrl) -> AdvisorResult<()> {
        self.put(TONGUE_IMAGE_KEY, image.as_str())
    }

    pub fn tongue_image(&self) -> AdvisorResult<Option<String>> {
        self.get(TONGUE_IMAGE_KEY)
    }

    /// Compresses a raw photo and stores the resulting data URL.
    ///
    /// Runs the adaptive compressor first, so an image that cannot be decoded
    /// fails with an imaging error before anything is written. A result that
    /// is still over the slot capacity (quality floor reached) fails the write
    /// with `SlotCapacity`.
    pub fn ingest_photo(
        &self,
        raw: &[u8],
        compressor: &ImageCompressor,
    ) -> AdvisorResult<CompressedImage> {
        let compressed = compressor.compress(raw)?;
        debug!(
            quality = compressed.quality,
            width = compressed.width,
            height = compressed.height,
            bytes = compressed.bytes,
            "tongue photo compressed"
        );
        self.put_tongue_image(&compressed.data_url)?;
        Ok(compressed)
    }

    /// Like [`ingest_photo`](Self::ingest_photo), for a photo the client
    /// already wrapped in a data URL.
    pub fn ingest_photo_data_url(
        &self,
        url: &DataUrl,
        compressor: &ImageCompressor,
    ) -> AdvisorResult<CompressedImage> {
        let compressed = compressor.compress_data_url(url)?;
        debug!(
            quality = compressed.quality,
            width = compressed.width,
            height = compressed.height,
            bytes = compressed.bytes,
            "tongue photo re-compressed from data URL"
        );
        self.put_tongue_image(&compressed.data_url)?;
        Ok(compressed)
    }

    /// Clears both slots. The "start over" action.
    pub fn clear(&self) -> AdvisorResult<()> {
        for key in [USER_FEELING_KEY, TONGUE_IMAGE_KEY] {
            match fs::remove_file(self.slot_path(key)) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(AdvisorError::SlotClear(e)),
            }
        }
        Ok(())
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.data_dir.join(key)
    }
}
