use super::OutgoingMessage;
use serde::Serialize;

macro_rules! simple_message {
    ($name:ident, $command:literal) => {
        #[derive(Debug, Default, Serialize)]
        pub struct $name {}

        impl OutgoingMessage for $name {
            fn command(&self) -> &str {
                $command
            }
        }
    };
}

simple_message!(LogoutMessage, "logout");
simple_message!(GetDeviceMessage, "getDevice");
simple_message!(GetDeviceStateMessage, "getDeviceState");
simple_message!(GetDeviceParamsMessage, "getDeviceParams");
simple_message!(GetDeviceDetailsMessage, "getDeviceDetails");
simple_message!(ResetDeviceMessage, "resetDevice");
simple_message!(RebootDeviceMessage, "rebootDevice");
simple_message!(RenewCertMessage, "renewCert");
