//! SD card bus construction and concrete storage types.

use embassy_time::Delay;
use embedded_hal_bus::spi::{ExclusiveDevice, NoDelay};
use embedded_sdmmc::{SdCard, TimeSource, Timestamp};
use esp_hal::gpio::Output;
use esp_hal::spi::master::Spi;
use triplog_core::storage::sd_card::SdCardMedium;

/// Fixed timestamp source for FAT metadata. Record contents carry the real
/// UTC time, so directory-entry freshness is not load-bearing.
#[derive(Default)]
pub struct FixedTime;

impl TimeSource for FixedTime {
    fn get_timestamp(&self) -> Timestamp {
        Timestamp {
            year_since_1970: 56,
            zero_indexed_month: 0,
            zero_indexed_day: 0,
            hours: 0,
            minutes: 0,
            seconds: 0,
        }
    }
}

pub type SdSpiDevice = ExclusiveDevice<Spi<'static, esp_hal::Blocking>, Output<'static>, NoDelay>;

/// The storage medium the control task owns.
pub type SdMedium = SdCardMedium<SdSpiDevice, Delay, FixedTime>;

/// Wrap an SPI device into the SD-backed storage medium.
pub fn init_sd_medium(spi_device: SdSpiDevice) -> SdMedium {
    SdCardMedium::new(SdCard::new(spi_device, Delay), FixedTime)
}
