//! Per-device proxy.
//!
//! A [`DeviceHandle`] is a reference into the registry entry for a device,
//! never a copy of it. Every operation first checks that the backing device
//! is still present; a handle to a removed device fails with
//! [`Error::DeviceNotPresent`] before anything reaches the transport. A
//! property call already in flight when the device is removed completes with
//! its own result; only calls initiated after removal are rejected.

use std::sync::Arc;

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::properties::PropertyClient;
use crate::protocol::{PropertyId, PropertyValue};
use crate::registry::DeviceRegistry;
use crate::transport::{PropertyTarget, Transport};
use crate::types::{
    BatteryState, DecodeAction, Device, DeviceId, DeviceType, Notifications, OwnershipToken,
    PowerState, StandConfig, Symbology, SymbologyId, SymbologyStatus, TriggerAction, VersionInfo,
    format_bluetooth_address,
};

/// Typed façade over one device's property operations.
pub struct DeviceHandle<T> {
    device: Arc<Device>,
    registry: Arc<DeviceRegistry>,
    props: PropertyClient<T>,
}

impl<T> Clone for DeviceHandle<T> {
    fn clone(&self) -> Self {
        Self {
            device: Arc::clone(&self.device),
            registry: Arc::clone(&self.registry),
            props: self.props.clone(),
        }
    }
}

impl<T: Transport> DeviceHandle<T> {
    pub(crate) fn new(
        device: Arc<Device>,
        registry: Arc<DeviceRegistry>,
        props: PropertyClient<T>,
    ) -> Self {
        Self {
            device,
            registry,
            props,
        }
    }

    /// Stable device identifier.
    #[must_use]
    pub fn id(&self) -> DeviceId {
        self.device.id()
    }

    /// Display name from the arrival descriptor.
    #[must_use]
    pub fn name(&self) -> &str {
        self.device.name()
    }

    /// Device-type classifier.
    #[must_use]
    pub fn kind(&self) -> DeviceType {
        self.device.kind()
    }

    /// True if this client currently owns the device.
    #[must_use]
    pub fn is_owned(&self) -> bool {
        self.device.is_owned()
    }

    /// Current ownership token.
    #[must_use]
    pub fn ownership_token(&self) -> OwnershipToken {
        self.device.ownership_token()
    }

    /// True if the backing device is still present in the registry.
    #[must_use]
    pub fn is_present(&self) -> bool {
        self.registry.contains(self.device.id())
    }

    /// Re-acquires transport-level ownership of the device.
    pub async fn open(&self) -> Result<()> {
        self.ensure_present()?;
        if self.device.is_open() {
            return Ok(());
        }
        self.props.transport().open_device(self.device.id()).await?;
        self.device.set_open(true);
        Ok(())
    }

    /// Releases transport-level ownership of the device.
    ///
    /// Closing an already-closed or already-removed device is a no-op
    /// success, mirroring session close idempotence.
    pub async fn close(&self) -> Result<()> {
        if !self.is_present() || !self.device.is_open() {
            return Ok(());
        }
        self.props
            .transport()
            .close_device(self.device.id())
            .await?;
        self.device.set_open(false);
        Ok(())
    }

    // ==================== Typed Property Operations ====================

    /// Reads the device display name.
    pub async fn friendly_name(&self) -> Result<String> {
        self.get(PropertyId::FriendlyName).await?.into_string()
    }

    /// Writes the device display name.
    pub async fn set_friendly_name(&self, name: impl Into<String>) -> Result<()> {
        self.set(PropertyId::FriendlyName, PropertyValue::String(name.into()))
            .await
    }

    /// Reads the data prefix.
    pub async fn prefix(&self) -> Result<String> {
        self.get(PropertyId::Prefix).await?.into_string()
    }

    /// Writes the data prefix.
    pub async fn set_prefix(&self, prefix: impl Into<String>) -> Result<()> {
        self.set(PropertyId::Prefix, PropertyValue::String(prefix.into()))
            .await
    }

    /// Reads the data suffix.
    pub async fn suffix(&self) -> Result<String> {
        self.get(PropertyId::Suffix).await?.into_string()
    }

    /// Writes the data suffix.
    pub async fn set_suffix(&self, suffix: impl Into<String>) -> Result<()> {
        self.set(PropertyId::Suffix, PropertyValue::String(suffix.into()))
            .await
    }

    /// Reads the notification subscription flags.
    pub async fn notifications(&self) -> Result<Notifications> {
        let bits = self
            .get(PropertyId::Notifications)
            .await?
            .as_unsigned_long()?;
        Ok(Notifications::from_bits(bits))
    }

    /// Writes the notification subscription flags.
    pub async fn set_notifications(&self, notifications: Notifications) -> Result<()> {
        self.set(
            PropertyId::Notifications,
            PropertyValue::UnsignedLong(notifications.to_bits()),
        )
        .await
    }

    /// Reads the battery range decomposition.
    pub async fn battery(&self) -> Result<BatteryState> {
        let raw = self.get(PropertyId::Battery).await?.as_unsigned_long()?;
        Ok(BatteryState::from_raw(i64::from(raw)))
    }

    /// Reads the current power state.
    pub async fn power_state(&self) -> Result<PowerState> {
        let code = self.get(PropertyId::PowerState).await?.as_byte()?;
        PowerState::from_code(code)
            .ok_or_else(|| Error::protocol(format!("unrecognized power state code {code}")))
    }

    /// Reads the Bluetooth address, formatted as colon-joined hex octets.
    pub async fn bluetooth_address(&self) -> Result<String> {
        let octets = self
            .get(PropertyId::BluetoothAddress)
            .await?
            .into_byte_array()?;
        format_bluetooth_address(&octets)
    }

    /// Reads the stand configuration.
    pub async fn stand_config(&self) -> Result<StandConfig> {
        let code = self
            .get(PropertyId::StandConfig)
            .await?
            .as_unsigned_long()?;
        StandConfig::from_code(code)
            .ok_or_else(|| Error::protocol(format!("unrecognized stand configuration {code}")))
    }

    /// Writes the stand configuration.
    pub async fn set_stand_config(&self, config: StandConfig) -> Result<()> {
        self.set(
            PropertyId::StandConfig,
            PropertyValue::UnsignedLong(config.code()),
        )
        .await
    }

    /// Reads the local decode feedback flags.
    pub async fn decode_action(&self) -> Result<DecodeAction> {
        let bits = self.get(PropertyId::DecodeAction).await?.as_byte()?;
        Ok(DecodeAction::from_bits(bits))
    }

    /// Writes the local decode feedback flags.
    pub async fn set_decode_action(&self, action: DecodeAction) -> Result<()> {
        self.set(
            PropertyId::DecodeAction,
            PropertyValue::Byte(action.to_bits()),
        )
        .await
    }

    /// Reads the enablement state of a symbology.
    pub async fn symbology(&self, id: SymbologyId) -> Result<Symbology> {
        self.ensure_present()?;
        let value = self
            .props
            .get_with(
                self.target(),
                PropertyId::Symbology,
                PropertyValue::UnsignedLong(u32::from(id.code())),
            )
            .await?;
        value.into_symbology()
    }

    /// Enables or disables a symbology.
    pub async fn set_symbology(&self, id: SymbologyId, status: SymbologyStatus) -> Result<()> {
        self.set(
            PropertyId::Symbology,
            PropertyValue::Symbology(Symbology { id, status }),
        )
        .await
    }

    /// Issues a trigger control action.
    pub async fn trigger(&self, action: TriggerAction) -> Result<()> {
        self.set(PropertyId::Trigger, PropertyValue::Byte(action.code()))
            .await
    }

    /// Reads the device firmware version.
    pub async fn firmware_version(&self) -> Result<VersionInfo> {
        self.get(PropertyId::FirmwareVersion).await?.into_version()
    }

    /// Sends a vendor-specific command and returns the response payload.
    pub async fn vendor_command(&self, payload: Bytes) -> Result<Bytes> {
        self.ensure_present()?;
        let value = self
            .props
            .get_with(
                self.target(),
                PropertyId::VendorCommand,
                PropertyValue::ByteArray(payload),
            )
            .await?;
        value.into_byte_array()
    }

    async fn get(&self, id: PropertyId) -> Result<PropertyValue> {
        self.ensure_present()?;
        self.props.get(self.target(), id).await
    }

    async fn set(&self, id: PropertyId, value: PropertyValue) -> Result<()> {
        self.ensure_present()?;
        self.props.set(self.target(), id, value).await
    }

    fn target(&self) -> PropertyTarget {
        PropertyTarget::Device(self.device.id())
    }

    fn ensure_present(&self) -> Result<()> {
        if self.is_present() {
            Ok(())
        } else {
            Err(Error::DeviceNotPresent(self.device.id()))
        }
    }
}
