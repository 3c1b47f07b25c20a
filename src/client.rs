//! Typed client for Zellenradschleuse devices.

use tracing::debug;
use uuid::Uuid;

use crate::codec::{
    decode, decode_typed, encode_typed, encode_with, BlowerPid, ManualControl, MergePolicy,
    Record, Rgb, StructKind, SystemState, TypedRecord,
};
use crate::error::{ClientError, ClientResult};
use crate::transport::Transport;
use crate::uuids::Characteristic;

/// Reads and writes the device's characteristics over a [`Transport`].
///
/// The `update_*` helpers read a baseline and write the merged result. They
/// take `&mut self` so a single client never interleaves two of them.
pub struct ZellenradschleuseClient<T> {
    transport: T,
}

impl<T: Transport> ZellenradschleuseClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    async fn read_raw(&self, uuid: Uuid) -> ClientResult<Vec<u8>> {
        let data = self
            .transport
            .read_characteristic(uuid)
            .await
            .map_err(ClientError::transport)?;
        debug!(%uuid, len = data.len(), "read characteristic");
        Ok(data)
    }

    async fn write_raw(&self, uuid: Uuid, data: &[u8]) -> ClientResult<()> {
        debug!(%uuid, len = data.len(), "write characteristic");
        self.transport
            .write_characteristic(uuid, data)
            .await
            .map_err(ClientError::transport)
    }

    /// Device type string. Invalid UTF-8 is replaced, not rejected.
    pub async fn device_type(&self) -> ClientResult<String> {
        let data = self.read_raw(Characteristic::DeviceType.uuid()).await?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }

    pub async fn read_record(&self, kind: StructKind) -> ClientResult<Record> {
        let data = self.read_raw(kind.characteristic().uuid()).await?;
        Ok(decode(kind, &data)?)
    }

    /// Encode `record` under `policy` and write it.
    ///
    /// Nothing is sent if encoding fails.
    pub async fn write_record(
        &self,
        kind: StructKind,
        record: &Record,
        policy: MergePolicy<'_>,
    ) -> ClientResult<()> {
        if !kind.is_writable() {
            return Err(ClientError::ReadOnly(kind));
        }
        let data = encode_with(kind, record, policy)?;
        self.write_raw(kind.characteristic().uuid(), &data).await
    }

    async fn read_typed<R: TypedRecord>(&self) -> ClientResult<R> {
        let data = self.read_raw(R::KIND.characteristic().uuid()).await?;
        Ok(decode_typed(&data)?)
    }

    async fn write_typed<R: TypedRecord>(&self, value: &R) -> ClientResult<()> {
        let data = encode_typed(value)?;
        self.write_raw(R::KIND.characteristic().uuid(), &data).await
    }

    pub async fn read_system_state(&self) -> ClientResult<SystemState> {
        self.read_typed().await
    }

    /// Both LED colours. They are part of the system state.
    pub async fn read_rgb_led(&self) -> ClientResult<[Rgb; 2]> {
        Ok(self.read_system_state().await?.rgb)
    }

    pub async fn read_manual_control(&self) -> ClientResult<ManualControl> {
        self.read_typed().await
    }

    /// Write set-points. `None` fields are left unchanged on the device.
    pub async fn write_manual_control(&self, value: &ManualControl) -> ClientResult<()> {
        self.write_typed(value).await
    }

    /// Change only the fields named in `changes`.
    ///
    /// The current value is read first and used as the baseline, so fields
    /// without a sentinel keep their device value.
    ///
    /// `&mut self` keeps two updates on this client from interleaving. It does
    /// not cover writes made through `&self` methods in between, nor other
    /// clients sharing the same device.
    pub async fn update_manual_control(&mut self, changes: &Record) -> ClientResult<()> {
        let kind = StructKind::ManualControl;
        let baseline = self.read_record(kind).await?;
        self.write_record(kind, changes, MergePolicy::BaselineFill(&baseline))
            .await
    }

    pub async fn read_blower_pid(&self) -> ClientResult<BlowerPid> {
        self.read_typed().await
    }

    /// Write PID parameters. `None` fields are sent as sentinels, so
    /// `BlowerPid { kp: Some(1.2), ..BlowerPid::partial() }` changes only `kp`.
    pub async fn write_blower_pid(&self, value: &BlowerPid) -> ClientResult<()> {
        self.write_typed(value).await
    }
}
