mod device_type;
pub use device_type::{DeviceType, UnknownDeviceType, ALL_DEVICE_TYPES};

mod error;
pub use error::Error;

pub mod mapper;

mod messages;
pub use messages::incoming::Response;
pub use messages::outgoing::{
    GetDeviceDetailsMessage, GetDeviceMessage, GetDeviceParamsMessage, GetDeviceStateMessage,
    KeepAliveMessage, LoginMessage, LoginTokenMessage, LogoutMessage, OutgoingMessage, RawMessage,
    RebootDeviceMessage, RenewCertMessage, ResetDeviceMessage, SetDeviceParamsMessage,
};

mod link;
pub use link::{ConnectionStatus, DeviceLink, LinkConfig, LinkEvent, Scheme};

pub mod setup;

pub type Result<T> = std::result::Result<T, Error>;
