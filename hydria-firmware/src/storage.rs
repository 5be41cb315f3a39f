//! Configuration persistence
//!
//! The system configuration lives in the last 64KB of flash as a single
//! wear-leveled sequential-storage record: one version byte followed by
//! the postcard encoding of [`SystemConfig`].

use defmt::*;
use embassy_rp::flash::{Async, Flash};
use embassy_rp::peripherals::{DMA_CH0, FLASH};
use embassy_rp::Peri;
use sequential_storage::cache::NoCache;
use sequential_storage::map::{self, SerializationError};

use hydria_core::config::SystemConfig;
use hydria_core::traits::SourceError;

/// 2MB flash on the Pico
pub const FLASH_SIZE: usize = 2 * 1024 * 1024;
pub const CONFIG_PARTITION_SIZE: usize = 64 * 1024;
pub const CONFIG_PARTITION_START: usize = FLASH_SIZE - CONFIG_PARTITION_SIZE;

pub const CONFIG_RANGE: core::ops::Range<u32> =
    (CONFIG_PARTITION_START as u32)..(FLASH_SIZE as u32);

/// Bumped whenever the layout of `SystemConfig` changes
pub const CONFIG_VERSION: u8 = 1;

/// Largest encoded record
const RECORD_SIZE: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StorageKey {
    SystemConfig = 0,
}

impl map::Key for StorageKey {
    fn serialize_into(&self, buffer: &mut [u8]) -> Result<usize, SerializationError> {
        let slot = buffer.first_mut().ok_or(SerializationError::BufferTooSmall)?;
        *slot = *self as u8;
        Ok(1)
    }

    fn deserialize_from(buffer: &[u8]) -> Result<(Self, usize), SerializationError> {
        match buffer.first() {
            Some(0) => Ok((StorageKey::SystemConfig, 1)),
            Some(_) => Err(SerializationError::InvalidFormat),
            None => Err(SerializationError::BufferTooSmall),
        }
    }
}

/// Flash-backed configuration store
pub struct ConfigStore<'d> {
    flash: Flash<'d, FLASH, Async, FLASH_SIZE>,
}

impl<'d> ConfigStore<'d> {
    pub fn new(flash: Peri<'d, FLASH>, dma: Peri<'d, DMA_CH0>) -> Self {
        Self {
            flash: Flash::new(flash, dma),
        }
    }

    /// Read and decode the stored configuration
    pub async fn load(&mut self) -> Result<SystemConfig, SourceError> {
        let mut buffer = [0u8; RECORD_SIZE + 16];

        let record = map::fetch_item::<StorageKey, &[u8], _>(
            &mut self.flash,
            CONFIG_RANGE,
            &mut NoCache::new(),
            &mut buffer,
            &StorageKey::SystemConfig,
        )
        .await
        .map_err(|_| SourceError::Storage)?
        .ok_or(SourceError::NotFound)?;

        decode_record(record)
    }

    /// Encode and write the configuration
    pub async fn store(&mut self, config: &SystemConfig) -> Result<(), SourceError> {
        let mut record = [0u8; RECORD_SIZE];
        let len = encode_record(config, &mut record)?;
        let data: &[u8] = &record[..len];

        let mut buffer = [0u8; RECORD_SIZE + 16];
        map::store_item(
            &mut self.flash,
            CONFIG_RANGE,
            &mut NoCache::new(),
            &mut buffer,
            &StorageKey::SystemConfig,
            &data,
        )
        .await
        .map_err(|_| SourceError::Storage)
    }
}

fn encode_record(config: &SystemConfig, record: &mut [u8]) -> Result<usize, SourceError> {
    let (version, body) = record.split_first_mut().ok_or(SourceError::Corrupted)?;
    *version = CONFIG_VERSION;
    let encoded = postcard::to_slice(config, body).map_err(|_| SourceError::Corrupted)?;
    Ok(encoded.len() + 1)
}

fn decode_record(record: &[u8]) -> Result<SystemConfig, SourceError> {
    match record.split_first() {
        Some((&CONFIG_VERSION, body)) => {
            postcard::from_bytes(body).map_err(|_| SourceError::Corrupted)
        }
        Some(_) => Err(SourceError::VersionMismatch),
        None => Err(SourceError::Corrupted),
    }
}

/// Load the configuration, seeding flash with defaults when it holds none
///
/// A flash read failure is passed on so the supervisor can refuse to run.
/// A missing, stale or undecodable record is replaced by the defaults.
pub async fn load_config(
    flash: Peri<'static, FLASH>,
    dma: Peri<'static, DMA_CH0>,
) -> Result<SystemConfig, SourceError> {
    let mut store = ConfigStore::new(flash, dma);

    match store.load().await {
        Ok(config) => {
            info!("Loaded configuration from flash ({} zones)", config.zones.len());
            Ok(config)
        }
        Err(SourceError::Storage) => {
            error!("Flash read failed");
            Err(SourceError::Storage)
        }
        Err(e) => {
            info!("No usable configuration in flash ({:?}), using defaults", e);
            let config = SystemConfig::default();
            if let Err(e) = store.store(&config).await {
                warn!("Failed to persist default configuration: {:?}", e);
            }
            Ok(config)
        }
    }
}
