//! Serial transport session.
//!
//! The session owns the single connection to the arm's microcontroller and
//! is either `Connected` or `Disconnected`. Disconnected is a normal
//! operating mode: sends are refused with [`TransportError::Unavailable`]
//! and everything upstream keeps working. A failed write drops the
//! connection; only a successful `open` brings it back.

use crate::types::{LinkState, SerialConfig, TransportError};
use std::io::Write;
use std::thread;
use tracing::{debug, info, warn};

/// Outcome of a send: bytes written, or why nothing reached the hardware.
pub type SendResult = Result<usize, TransportError>;

/// Opens byte channels to the hardware.
pub trait SerialConnector: Send {
    fn connect(&self, settings: &SerialConfig) -> Result<Box<dyn Write + Send>, TransportError>;
}

/// Connector backed by the OS serial port driver.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemSerial;

struct SerialPortLink(Box<dyn serialport::SerialPort>);

impl Write for SerialPortLink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0.flush()
    }
}

impl SerialConnector for SystemSerial {
    fn connect(&self, settings: &SerialConfig) -> Result<Box<dyn Write + Send>, TransportError> {
        let port = serialport::new(settings.port.as_str(), settings.baud_rate)
            .timeout(settings.timeout())
            .open()
            .map_err(|e| TransportError::OpenFailed {
                port: settings.port.clone(),
                reason: e.to_string(),
            })?;

        Ok(Box::new(SerialPortLink(port)))
    }
}

pub struct TransportSession {
    connector: Box<dyn SerialConnector>,
    settings: SerialConfig,
    link: Option<Box<dyn Write + Send>>,
}

impl TransportSession {
    /// New session in the `Disconnected` state. Nothing is opened yet.
    pub fn new(connector: Box<dyn SerialConnector>, settings: SerialConfig) -> Self {
        Self {
            connector,
            settings,
            link: None,
        }
    }

    pub fn state(&self) -> LinkState {
        if self.link.is_some() {
            LinkState::Connected
        } else {
            LinkState::Disconnected
        }
    }

    pub fn settings(&self) -> &SerialConfig {
        &self.settings
    }

    /// Open `port` at `baud_rate`, replacing any live connection.
    ///
    /// On failure the session stays `Disconnected` and the error is returned
    /// for the caller to report.
    pub fn open(&mut self, port: &str, baud_rate: u32) -> Result<(), TransportError> {
        self.settings.port = port.to_string();
        self.settings.baud_rate = baud_rate;
        self.reconnect()
    }

    /// Open the port from the current settings, replacing any live connection.
    pub fn reconnect(&mut self) -> Result<(), TransportError> {
        self.close();

        match self.connector.connect(&self.settings) {
            Ok(link) => {
                if !self.settings.settle_delay().is_zero() {
                    debug!(
                        "Waiting {} ms for controller on {} to settle",
                        self.settings.settle_ms, self.settings.port
                    );
                    thread::sleep(self.settings.settle_delay());
                }

                self.link = Some(link);
                info!(
                    "Serial port {} open at {} baud",
                    self.settings.port, self.settings.baud_rate
                );
                Ok(())
            }
            Err(e) => {
                warn!("{}", e);
                Err(e)
            }
        }
    }

    /// Write one encoded command.
    pub fn send(&mut self, bytes: &[u8]) -> SendResult {
        let Some(link) = self.link.as_mut() else {
            debug!("No serial connection, dropping {} byte command", bytes.len());
            return Err(TransportError::Unavailable);
        };

        match link.write_all(bytes).and_then(|_| link.flush()) {
            Ok(()) => Ok(bytes.len()),
            Err(e) => {
                warn!(
                    "Write to {} failed, marking session disconnected: {}",
                    self.settings.port, e
                );
                self.link = None;
                Err(TransportError::WriteFailed(e))
            }
        }
    }

    /// Release the connection. No-op when already disconnected.
    pub fn close(&mut self) {
        if let Some(mut link) = self.link.take() {
            if let Err(e) = link.flush() {
                warn!("Flush on close of {} failed: {}", self.settings.port, e);
            }
            info!("Serial port {} closed", self.settings.port);
        }
    }
}

impl Drop for TransportSession {
    fn drop(&mut self) {
        self.close();
    }
}
