//! GPIO / peripheral pin assignments for the Lokify door board (ESP32).
//!
//! Single source of truth for the wiring.  `main` picks the matching
//! `peripherals.pins.gpioN` fields; keep the two in step.

// ---------------------------------------------------------------------------
// Door strike
// ---------------------------------------------------------------------------

/// Relay coil driver.  Active LOW: LOW = energized (unlocked).
pub const RELAY_GPIO: i32 = 26;

// ---------------------------------------------------------------------------
// MFRC522 reader (VSPI)
// ---------------------------------------------------------------------------

pub const RFID_SCK_GPIO: i32 = 18;
pub const RFID_MISO_GPIO: i32 = 19;
pub const RFID_MOSI_GPIO: i32 = 23;
/// Chip select, driven by the SPI device driver.
pub const RFID_SS_GPIO: i32 = 32;
/// Reader reset.  Held HIGH while running.
pub const RFID_RST_GPIO: i32 = 33;

/// SPI clock for the reader.
pub const RFID_SPI_HZ: u32 = 4_000_000;
