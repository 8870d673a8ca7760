//! MQTT session adapter.
//!
//! Implements [`BusPort`] on top of `esp_idf_svc::mqtt::client::EspMqttClient`.
//! The ESP-IDF client runs its own task and reports through a callback:
//! connection changes flip an atomic flag and received messages are posted
//! to the [`INBOUND`](crate::net::INBOUND) mailbox, which
//! [`BusPort::pump`] drains on the control loop.
//!
//! The client connects asynchronously, so [`BusPort::connect`] reports
//! success only once the broker has acknowledged the session.  Until then
//! each call fails and the session retry cadence calls again.

use core::sync::atomic::{AtomicBool, Ordering};

use esp_idf_svc::mqtt::client::{EspMqttClient, EventPayload, MqttClientConfiguration, QoS};
use log::{debug, info, warn};

use crate::app::ports::{BusError, BusPort, SessionCredentials};
use crate::config::BrokerConfig;
use crate::net::{drain_inbound, post_inbound};

static CONNECTED: AtomicBool = AtomicBool::new(false);

pub struct MqttBus {
    url: String,
    client: Option<EspMqttClient<'static>>,
}

impl MqttBus {
    pub fn new(broker: &BrokerConfig) -> Self {
        Self {
            url: format!("mqtt://{}:{}", broker.host, broker.port),
            client: None,
        }
    }

    fn start_client(&mut self, credentials: &SessionCredentials<'_>) -> Result<(), BusError> {
        let conf = MqttClientConfiguration {
            client_id: Some(credentials.client_id),
            username: (!credentials.username.is_empty()).then_some(credentials.username),
            password: (!credentials.password.is_empty()).then_some(credentials.password),
            ..Default::default()
        };
        let client = EspMqttClient::new_cb(&self.url, &conf, |event| match event.payload() {
            EventPayload::Connected(_) => CONNECTED.store(true, Ordering::Release),
            EventPayload::Disconnected => CONNECTED.store(false, Ordering::Release),
            EventPayload::Received {
                topic: Some(topic),
                data,
                ..
            } => {
                post_inbound(topic, data);
            }
            _ => {}
        })
        .map_err(|e| {
            warn!("MQTT: client start failed: {}", e);
            BusError::ConnectFailed
        })?;
        info!("MQTT: client started for {}", self.url);
        self.client = Some(client);
        Ok(())
    }
}

impl BusPort for MqttBus {
    fn connect(&mut self, credentials: &SessionCredentials<'_>) -> Result<(), BusError> {
        if self.client.is_none() {
            self.start_client(credentials)?;
        }
        if CONNECTED.load(Ordering::Acquire) {
            Ok(())
        } else {
            debug!("MQTT: waiting for broker");
            Err(BusError::ConnectFailed)
        }
    }

    fn is_connected(&self) -> bool {
        self.client.is_some() && CONNECTED.load(Ordering::Acquire)
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), BusError> {
        let client = self.client.as_mut().ok_or(BusError::NotConnected)?;
        client
            .subscribe(topic, QoS::AtMostOnce)
            .map(|_| ())
            .map_err(|_| BusError::SubscribeFailed)
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), BusError> {
        let client = self.client.as_mut().ok_or(BusError::NotConnected)?;
        client
            .enqueue(topic, QoS::AtMostOnce, false, payload)
            .map(|_| ())
            .map_err(|_| BusError::PublishFailed)
    }

    fn pump(&mut self, on_message: &mut dyn FnMut(&str, &[u8])) {
        drain_inbound(on_message);
    }
}
