//! SD card implementation of the storage seam.
//!
//! SD operations are blocking; the control cycle accepts the latency bound
//! of the medium as its worst-case stall. Handles are held in raw form so
//! the session file can stay open across calls, and every handle is dropped
//! the moment the card stops answering so the next access re-initializes it
//! from scratch.

use embedded_sdmmc::{
    Mode, RawDirectory, RawFile, RawVolume, SdCard, SdCardError, TimeSource, VolumeIdx,
    VolumeManager,
};

use super::StorageMedium;

// Matches the internal handle storage of the volume manager.
const MAX_DIRS: usize = 4;
const MAX_FILES: usize = 4;
const MAX_VOLUMES: usize = 1;

pub type SdError = embedded_sdmmc::Error<SdCardError>;

/// Removable SD storage driven over SPI.
pub struct SdCardMedium<S, D, T>
where
    S: embedded_hal::spi::SpiDevice<u8>,
    D: embedded_hal::delay::DelayNs,
    T: TimeSource,
{
    volume_mgr: VolumeManager<SdCard<S, D>, T, MAX_DIRS, MAX_FILES, MAX_VOLUMES>,
    mount: Option<(RawVolume, RawDirectory)>,
    file: Option<RawFile>,
}

impl<S, D, T> SdCardMedium<S, D, T>
where
    S: embedded_hal::spi::SpiDevice<u8>,
    D: embedded_hal::delay::DelayNs,
    T: TimeSource,
{
    pub fn new(sd_card: SdCard<S, D>, time_source: T) -> Self {
        Self {
            volume_mgr: VolumeManager::new(sd_card, time_source),
            mount: None,
            file: None,
        }
    }

    /// Root directory of volume 0, mounting it on first use.
    fn root_dir(&mut self) -> Result<RawDirectory, SdError> {
        if let Some((_, root)) = self.mount {
            return Ok(root);
        }
        let volume = self.volume_mgr.open_raw_volume(VolumeIdx(0))?;
        let root = match self.volume_mgr.open_root_dir(volume) {
            Ok(root) => root,
            Err(e) => {
                let _ = self.volume_mgr.close_volume(volume);
                return Err(e);
            }
        };
        self.mount = Some((volume, root));
        Ok(root)
    }

    /// Drop every handle and force card re-initialization on next access.
    fn unmount(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = self.volume_mgr.close_file(file);
        }
        if let Some((volume, root)) = self.mount.take() {
            let _ = self.volume_mgr.close_dir(root);
            let _ = self.volume_mgr.close_volume(volume);
        }
        self.volume_mgr.device(|sd| sd.mark_card_uninit());
    }

    fn open_with_mode(&mut self, name: &str, mode: Mode) -> Result<(), SdError> {
        if let Some(file) = self.file.take() {
            let _ = self.volume_mgr.close_file(file);
        }
        let root = self.root_dir()?;
        let file = self.volume_mgr.open_file_in_dir(root, name, mode)?;
        if let Err(e) = self.volume_mgr.file_seek_from_end(file, 0) {
            let _ = self.volume_mgr.close_file(file);
            return Err(e);
        }
        self.file = Some(file);
        Ok(())
    }
}

impl<S, D, T> StorageMedium for SdCardMedium<S, D, T>
where
    S: embedded_hal::spi::SpiDevice<u8>,
    D: embedded_hal::delay::DelayNs,
    T: TimeSource,
{
    type Error = SdError;

    fn probe(&mut self) -> bool {
        match self.volume_mgr.device(|sd| sd.num_bytes()) {
            Ok(bytes) => bytes > 0,
            Err(_) => {
                self.unmount();
                false
            }
        }
    }

    fn exists(&mut self, name: &str) -> Result<bool, SdError> {
        let root = self.root_dir()?;
        match self.volume_mgr.open_file_in_dir(root, name, Mode::ReadOnly) {
            Ok(file) => {
                let _ = self.volume_mgr.close_file(file);
                Ok(true)
            }
            Err(embedded_sdmmc::Error::NotFound) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn open_append(&mut self, name: &str) -> Result<(), SdError> {
        self.open_with_mode(name, Mode::ReadWriteCreateOrAppend)
    }

    fn open_truncate(&mut self, name: &str) -> Result<(), SdError> {
        self.open_with_mode(name, Mode::ReadWriteCreateOrTruncate)
    }

    fn is_open(&self) -> bool {
        self.file.is_some()
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, SdError> {
        let file = self.file.ok_or(embedded_sdmmc::Error::BadHandle)?;
        // The block layer reports shortfalls as errors, so success always
        // covers the full slice.
        self.volume_mgr.write(file, data)?;
        Ok(data.len())
    }

    fn sync(&mut self) -> Result<(), SdError> {
        let file = self.file.ok_or(embedded_sdmmc::Error::BadHandle)?;
        self.volume_mgr.flush_file(file)
    }

    fn close(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = self.volume_mgr.close_file(file);
        }
    }
}
