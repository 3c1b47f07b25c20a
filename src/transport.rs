//! Characteristic transport abstraction.
//!
//! The client only needs to read and write whole characteristic values by
//! UUID. Connection handling stays with the implementation.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};

use thiserror::Error;
use uuid::Uuid;

/// Read/write access to GATT characteristic values.
pub trait Transport {
    type Error: std::error::Error + Send + Sync + 'static;

    fn read_characteristic(
        &self,
        uuid: Uuid,
    ) -> impl Future<Output = Result<Vec<u8>, Self::Error>> + Send;

    fn write_characteristic(
        &self,
        uuid: Uuid,
        data: &[u8],
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryTransportError {
    #[error("Characteristic {0} not found")]
    NotFound(Uuid),

    #[error("Characteristic {0} is read-only")]
    ReadOnly(Uuid),
}

/// In-process transport backed by a map of characteristic values.
///
/// Writes replace the stored value and are recorded in order.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    values: Mutex<HashMap<Uuid, Vec<u8>>>,
    read_only: Mutex<Vec<Uuid>>,
    writes: Mutex<Vec<(Uuid, Vec<u8>)>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // a poisoned map is still consistent; every update is a single insert
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`MemoryTransport::set`].
    pub fn with(self, uuid: impl Into<Uuid>, data: impl Into<Vec<u8>>) -> Self {
        self.set(uuid, data);
        self
    }

    pub fn set(&self, uuid: impl Into<Uuid>, data: impl Into<Vec<u8>>) {
        lock(&self.values).insert(uuid.into(), data.into());
    }

    /// Reject writes to `uuid`.
    pub fn set_read_only(&self, uuid: impl Into<Uuid>) {
        lock(&self.read_only).push(uuid.into());
    }

    pub fn get(&self, uuid: impl Into<Uuid>) -> Option<Vec<u8>> {
        lock(&self.values).get(&uuid.into()).cloned()
    }

    /// Every successful write so far, oldest first.
    pub fn writes(&self) -> Vec<(Uuid, Vec<u8>)> {
        lock(&self.writes).clone()
    }

    pub fn last_write(&self) -> Option<(Uuid, Vec<u8>)> {
        lock(&self.writes).last().cloned()
    }
}

impl Transport for MemoryTransport {
    type Error = MemoryTransportError;

    async fn read_characteristic(&self, uuid: Uuid) -> Result<Vec<u8>, Self::Error> {
        lock(&self.values)
            .get(&uuid)
            .cloned()
            .ok_or(MemoryTransportError::NotFound(uuid))
    }

    async fn write_characteristic(&self, uuid: Uuid, data: &[u8]) -> Result<(), Self::Error> {
        if lock(&self.read_only).contains(&uuid) {
            return Err(MemoryTransportError::ReadOnly(uuid));
        }
        lock(&self.values).insert(uuid, data.to_vec());
        lock(&self.writes).push((uuid, data.to_vec()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uuids::{Characteristic, DEVICE_TYPE_UUID};

    #[tokio::test]
    async fn test_read_write() {
        let transport = MemoryTransport::new().with(Characteristic::DeviceType, b"ZRS".to_vec());

        assert_eq!(
            transport.read_characteristic(DEVICE_TYPE_UUID).await.unwrap(),
            b"ZRS"
        );

        transport
            .write_characteristic(DEVICE_TYPE_UUID, b"ZRS2")
            .await
            .unwrap();
        assert_eq!(transport.get(DEVICE_TYPE_UUID).unwrap(), b"ZRS2");
        assert_eq!(transport.writes().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_and_read_only() {
        let transport = MemoryTransport::new();
        let uuid = Characteristic::SystemState.uuid();

        assert_eq!(
            transport.read_characteristic(uuid).await.unwrap_err(),
            MemoryTransportError::NotFound(uuid)
        );

        transport.set_read_only(uuid);
        assert_eq!(
            transport.write_characteristic(uuid, &[1]).await.unwrap_err(),
            MemoryTransportError::ReadOnly(uuid)
        );
        assert!(transport.last_write().is_none());
    }
}
