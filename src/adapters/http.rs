//! Blocking HTTP client adapter.
//!
//! Implements [`HttpPort`] with `esp_idf_svc::http::client::EspHttpConnection`.
//! A fresh connection is opened per request and dropped on
//! [`HttpPort::close`].

use core::time::Duration;

use esp_idf_svc::http::Method;
use esp_idf_svc::http::client::{Configuration, EspHttpConnection};
use log::{debug, warn};

use crate::app::ports::{HttpError, HttpPort, ResponseHead};

const BUFFER_SIZE: usize = 4096;
const TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Default)]
pub struct EspHttp {
    conn: Option<EspHttpConnection>,
}

impl EspHttp {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HttpPort for EspHttp {
    fn get(&mut self, url: &str) -> Result<ResponseHead, HttpError> {
        self.close();
        let mut conn = EspHttpConnection::new(&Configuration {
            buffer_size: Some(BUFFER_SIZE),
            timeout: Some(TIMEOUT),
            ..Default::default()
        })
        .map_err(|e| {
            warn!("HTTP: connection setup failed: {}", e);
            HttpError::Transport
        })?;

        conn.initiate_request(Method::Get, url, &[]).map_err(|e| {
            warn!("HTTP: GET {} failed: {}", url, e);
            HttpError::Transport
        })?;
        conn.initiate_response().map_err(|e| {
            warn!("HTTP: no response from {}: {}", url, e);
            HttpError::Transport
        })?;

        let status = conn.status();
        let content_length = conn
            .header("Content-Length")
            .and_then(|v| v.trim().parse::<usize>().ok());
        debug!("HTTP: {} -> {} ({:?} bytes)", url, status, content_length);
        self.conn = Some(conn);
        Ok(ResponseHead {
            status,
            content_length,
        })
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, HttpError> {
        let conn = self.conn.as_mut().ok_or(HttpError::Read)?;
        conn.read(buf).map_err(|_| HttpError::Read)
    }

    fn close(&mut self) {
        self.conn = None;
    }
}
