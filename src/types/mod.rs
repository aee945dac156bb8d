//! Data structures for devices, settings and decoded data.

pub mod device;
pub mod settings;

pub use device::{
    BatteryState, ButtonsState, DecodedData, Device, DeviceDescriptor, DeviceId, DeviceType,
    OwnershipToken, PowerState, format_bluetooth_address,
};
pub use settings::{
    ConfirmationBeep, ConfirmationLed, ConfirmationRumble, DataConfirmationAction,
    DataConfirmationMode, DecodeAction, Notifications, StandConfig, Symbology, SymbologyId,
    SymbologyStatus, TriggerAction, VersionInfo,
};
