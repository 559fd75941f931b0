//! Event log persistence on the last internal flash page.

use embassy_stm32::flash::{Blocking, FLASH_SIZE, Flash};
use embedded_storage::nor_flash::RmwNorFlashStorage;
use rig_core::event_log::LogStore;
use static_cell::StaticCell;

/// Erase granule of the G0B1 flash.
pub const FLASH_PAGE_SIZE: usize = 2_048;

/// Offset of the log image from the start of flash.
#[allow(clippy::cast_possible_truncation)]
pub const LOG_FLASH_OFFSET: u32 = (FLASH_SIZE - FLASH_PAGE_SIZE) as u32;

pub type LogFlash = RmwNorFlashStorage<'static, Flash<'static, Blocking>>;

static MERGE_BUFFER: StaticCell<[u8; FLASH_PAGE_SIZE]> = StaticCell::new();

/// Wraps the flash in a byte-addressed read-modify-write store.
///
/// # Panics
/// When called more than once.
pub fn log_flash(flash: Flash<'static, Blocking>) -> (LogFlash, LogStore) {
    let buffer = MERGE_BUFFER.init([0; FLASH_PAGE_SIZE]);
    (
        RmwNorFlashStorage::new(flash, buffer),
        LogStore::new(LOG_FLASH_OFFSET),
    )
}
