//! [`Transport`] over a `btleplug` peripheral.
//!
//! The peripheral must already be discovered; scanning is left to the caller.
//! [`BleTransport::connect`] connects and discovers services, after which
//! characteristics are looked up by UUID on every access.

use std::time::Duration;

use btleplug::api::{Characteristic as GattCharacteristic, Peripheral as _, WriteType};
use btleplug::platform::Peripheral;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::transport::Transport;
use crate::uuids::SERVICE_UUID;

#[derive(Error, Debug)]
pub enum BleError {
    #[error("BLE error: {0}")]
    Btleplug(#[from] btleplug::Error),

    #[error("Characteristic {uuid} not found on peripheral")]
    CharacteristicNotFound { uuid: Uuid },

    #[error("Service {uuid} not found on peripheral")]
    ServiceNotFound { uuid: Uuid },

    #[error("Operation on {uuid} timed out after {timeout:?}")]
    Timeout { uuid: Uuid, timeout: Duration },
}

/// Single-connection transport to a Zellenradschleuse.
pub struct BleTransport {
    peripheral: Peripheral,
    config: ClientConfig,
}

impl BleTransport {
    pub fn new(peripheral: Peripheral, config: ClientConfig) -> Self {
        Self { peripheral, config }
    }

    pub fn peripheral(&self) -> &Peripheral {
        &self.peripheral
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Connect and discover services.
    ///
    /// # Errors
    ///
    /// Returns [`BleError::ServiceNotFound`] if the peripheral does not
    /// expose the Metexon service. The connection is dropped in that case.
    pub async fn connect(&self) -> Result<(), BleError> {
        if !self.peripheral.is_connected().await? {
            self.peripheral.connect().await?;
        }
        self.peripheral.discover_services().await?;

        let has_service = self
            .peripheral
            .services()
            .iter()
            .any(|s| s.uuid == SERVICE_UUID);
        if !has_service {
            self.disconnect().await;
            return Err(BleError::ServiceNotFound { uuid: SERVICE_UUID });
        }

        debug!(address = %self.peripheral.address(), "connected");
        Ok(())
    }

    /// Disconnect, logging instead of failing.
    pub async fn disconnect(&self) {
        if let Err(err) = self.peripheral.disconnect().await {
            warn!(%err, "failed to disconnect peripheral");
        }
    }

    pub async fn is_connected(&self) -> Result<bool, BleError> {
        Ok(self.peripheral.is_connected().await?)
    }

    fn find_characteristic(&self, uuid: Uuid) -> Result<GattCharacteristic, BleError> {
        self.peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == uuid)
            .ok_or(BleError::CharacteristicNotFound { uuid })
    }

    fn write_type(&self) -> WriteType {
        if self.config.write_with_response {
            WriteType::WithResponse
        } else {
            WriteType::WithoutResponse
        }
    }
}

impl Transport for BleTransport {
    type Error = BleError;

    async fn read_characteristic(&self, uuid: Uuid) -> Result<Vec<u8>, BleError> {
        let characteristic = self.find_characteristic(uuid)?;
        let timeout = self.config.timeout;

        tokio::time::timeout(timeout, self.peripheral.read(&characteristic))
            .await
            .map_err(|_| BleError::Timeout { uuid, timeout })?
            .map_err(BleError::from)
    }

    async fn write_characteristic(&self, uuid: Uuid, data: &[u8]) -> Result<(), BleError> {
        let characteristic = self.find_characteristic(uuid)?;
        let timeout = self.config.timeout;

        tokio::time::timeout(
            timeout,
            self.peripheral.write(&characteristic, data, self.write_type()),
        )
        .await
        .map_err(|_| BleError::Timeout { uuid, timeout })?
        .map_err(BleError::from)
    }
}
