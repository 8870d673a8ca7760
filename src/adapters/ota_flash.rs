//! Firmware staging adapter backed by the `esp-ota` crate.
//!
//! Implements [`FirmwarePort`]: the image is written into the inactive OTA
//! partition, validated on finalize and marked as the next boot partition.

use log::{info, warn};

use crate::app::ports::{FirmwarePort, FlashError};

#[derive(Default)]
pub struct EspFirmware {
    update: Option<esp_ota::OtaUpdate>,
}

impl EspFirmware {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FirmwarePort for EspFirmware {
    fn begin(&mut self, size: usize) -> Result<(), FlashError> {
        self.abort();
        let update = esp_ota::OtaUpdate::begin().map_err(|e| {
            warn!("esp-ota begin failed: {:?}", e);
            FlashError::BeginFailed
        })?;
        info!("OTA: staging {} bytes", size);
        self.update = Some(update);
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, FlashError> {
        let update = self.update.as_mut().ok_or(FlashError::WriteFailed)?;
        update.write(data).map_err(|e| {
            warn!("esp-ota write failed: {:?}", e);
            FlashError::WriteFailed
        })?;
        Ok(data.len())
    }

    fn finalize(&mut self) -> Result<(), FlashError> {
        let update = self.update.take().ok_or(FlashError::FinalizeFailed)?;
        let mut completed = update.finalize().map_err(|e| {
            warn!("esp-ota finalize failed: {:?}", e);
            FlashError::FinalizeFailed
        })?;
        completed.set_as_boot_partition().map_err(|e| {
            warn!("esp-ota set_as_boot_partition failed: {:?}", e);
            FlashError::FinalizeFailed
        })
    }

    fn abort(&mut self) {
        // esp-ota aborts automatically when OtaUpdate is dropped
        if self.update.take().is_some() {
            warn!("OTA: staging aborted");
        }
    }

    fn restart(&mut self) {
        info!("OTA: rebooting into new firmware");
        esp_ota::restart();
    }
}

/// Mark the running image valid so the bootloader does not roll back.
pub fn check_rollback() {
    match esp_ota::mark_app_valid() {
        Ok(()) => info!("OTA: firmware marked valid (rollback cancelled)"),
        Err(e) => warn!("OTA: mark_app_valid failed: {:?}", e),
    }
}
