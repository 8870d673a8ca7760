//! Lokify door controller: main entry point.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                     │
//! │                                                               │
//! │  WifiLink    MqttBus    EspHttp    EspFirmware                │
//! │  (Link)      (Bus)      (Http)     (Firmware)                 │
//! │  Mfrc522     GpioRelay  LogEventSink   MonotonicClock         │
//! │  (Reader)    (Relay)    (EventSink)                           │
//! │                                                               │
//! │  ─────────────── Port Trait Boundary ──────────────────       │
//! │                                                               │
//! │  ┌─────────────────────────────────────────────────────────┐  │
//! │  │  Runtime: Access · Actuation · Connectivity · Remote    │  │
//! │  │           OTA · Telemetry                               │  │
//! │  └─────────────────────────────────────────────────────────┘  │
//! │                                                               │
//! │  Cooperative loop: Runtime::tick(now) then yield              │
//! └───────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

mod pins;

use anyhow::{Context, Result};
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::gpio::PinDriver;
use esp_idf_svc::hal::prelude::Peripherals;
use esp_idf_svc::hal::spi::config::Config as SpiConfig;
use esp_idf_svc::hal::spi::{SpiDeviceDriver, SpiDriverConfig};
use esp_idf_svc::hal::units::Hertz;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{info, warn};

use lokify::adapters::http::EspHttp;
use lokify::adapters::log_sink::LogEventSink;
use lokify::adapters::mfrc522::Mfrc522;
use lokify::adapters::mqtt::MqttBus;
use lokify::adapters::ota_flash::{self, EspFirmware};
use lokify::adapters::relay::GpioRelay;
use lokify::adapters::time::MonotonicClock;
use lokify::adapters::wifi::WifiLink;
use lokify::app::ports::Ports;
use lokify::app::service::Runtime;
use lokify::config::DeviceConfig;
use lokify::FIRMWARE_VERSION;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Lokify door v{}                  ║", FIRMWARE_VERSION);
    info!("╚══════════════════════════════════════╝");

    ota_flash::check_rollback();

    // ── 2. Configuration ──────────────────────────────────────
    let config = DeviceConfig::default();
    let mut runtime = Runtime::from_config(&config).context("invalid device configuration")?;

    // ── 3. Peripherals ────────────────────────────────────────
    let peripherals = Peripherals::take().context("peripherals already taken")?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = match EspDefaultNvsPartition::take() {
        Ok(nvs) => Some(nvs),
        Err(e) => {
            warn!("NVS unavailable ({}), WiFi calibration will not persist", e);
            None
        }
    };

    // Relay first so the strike is at its rest level as early as possible.
    let mut relay = GpioRelay::active_low(PinDriver::output(peripherals.pins.gpio26)?);

    let mut rfid_rst = PinDriver::output(peripherals.pins.gpio33)?;
    rfid_rst.set_high()?;
    let spi = SpiDeviceDriver::new_single(
        peripherals.spi3,
        peripherals.pins.gpio18,
        peripherals.pins.gpio23,
        Some(peripherals.pins.gpio19),
        Some(peripherals.pins.gpio32),
        &SpiDriverConfig::default(),
        &SpiConfig::new()
            .baudrate(Hertz(pins::RFID_SPI_HZ))
            .data_mode(embedded_hal::spi::MODE_0),
    )?;
    let mut reader = Mfrc522::new(spi)
        .map_err(|e| anyhow::anyhow!("MFRC522 init failed: {:?}", e))?;
    info!(
        "Reader on SCK={} MOSI={} MISO={} SS={} RST={}, relay on GPIO{}",
        pins::RFID_SCK_GPIO,
        pins::RFID_MOSI_GPIO,
        pins::RFID_MISO_GPIO,
        pins::RFID_SS_GPIO,
        pins::RFID_RST_GPIO,
        pins::RELAY_GPIO
    );

    // ── 4. Network adapters ───────────────────────────────────
    let mut link = WifiLink::new(peripherals.modem, sysloop, nvs, &config.wifi)?;
    let mut bus = MqttBus::new(&config.broker);
    let mut http = EspHttp::new();
    let mut firmware = EspFirmware::new();
    let mut sink = LogEventSink::new();
    let clock = MonotonicClock::new();

    let mut ports = Ports {
        link: &mut link,
        bus: &mut bus,
        http: &mut http,
        firmware: &mut firmware,
        reader: &mut reader,
        relay: &mut relay,
        sink: &mut sink,
    };

    // ── 5. Cooperative loop ───────────────────────────────────
    runtime.start(&mut ports);
    info!("System ready. Entering control loop.");
    loop {
        runtime.tick(clock.now_ms(), &mut ports);
        // Yield so the idle task and the network stack get CPU time.
        FreeRtos::delay_ms(1);
    }
}
