//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements         | Connects to                  |
//! |-------------|--------------------|------------------------------|
//! | `log_sink`  | EventSink          | Serial log output            |
//! | `mfrc522`   | BadgeReaderPort    | MFRC522 reader over SPI      |
//! | `relay`     | RelayPort          | Door strike relay GPIO       |
//! | `time`      | (none)             | ESP32 system timer           |
//! | `wifi`      | LinkPort           | ESP-IDF WiFi STA             |
//! | `mqtt`      | BusPort            | ESP-IDF MQTT client          |
//! | `http`      | HttpPort           | ESP-IDF HTTP client          |
//! | `ota_flash` | FirmwarePort       | Inactive OTA partition       |

pub mod log_sink;
pub mod mfrc522;
pub mod relay;
pub mod time;

#[cfg(target_os = "espidf")]
pub mod http;
#[cfg(target_os = "espidf")]
pub mod mqtt;
#[cfg(target_os = "espidf")]
pub mod ota_flash;
#[cfg(target_os = "espidf")]
pub mod wifi;
