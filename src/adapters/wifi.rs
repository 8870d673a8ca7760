//! Wi-Fi station adapter.
//!
//! Implements [`LinkPort`] on top of `esp_idf_svc::wifi::EspWifi`.  The
//! driver is configured and started once; each [`LinkPort::connect`] call
//! only kicks off an association, and the outcome is observed later through
//! [`LinkPort::is_up`].  Reconnect pacing belongs to the connectivity
//! manager, not to this adapter.

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::modem::Modem;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi};
use log::{info, warn};

use crate::app::ports::{LinkError, LinkPort};
use crate::config::WifiConfig;
use crate::error::Error;

pub struct WifiLink {
    wifi: EspWifi<'static>,
}

impl WifiLink {
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
        config: &WifiConfig,
    ) -> Result<Self, Error> {
        if config.ssid.is_empty() {
            return Err(LinkError::NoCredentials.into());
        }
        let mut wifi =
            EspWifi::new(modem, sysloop, nvs).map_err(|_| Error::Init("wifi driver"))?;

        let auth_method = if config.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let client = ClientConfiguration {
            ssid: config
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| Error::Init("wifi ssid too long"))?,
            password: config
                .password
                .as_str()
                .try_into()
                .map_err(|_| Error::Init("wifi password too long"))?,
            auth_method,
            ..Default::default()
        };
        wifi.set_configuration(&Configuration::Client(client))
            .map_err(|_| Error::Init("wifi configuration"))?;
        wifi.start().map_err(|_| Error::Init("wifi start"))?;
        info!("WiFi: station started for '{}'", config.ssid);
        Ok(Self { wifi })
    }
}

impl LinkPort for WifiLink {
    fn connect(&mut self) -> Result<(), LinkError> {
        self.wifi.connect().map_err(|e| {
            warn!("WiFi: connect request rejected: {}", e);
            LinkError::ConnectFailed
        })
    }

    fn is_up(&self) -> bool {
        self.wifi.is_up().unwrap_or(false)
    }
}
