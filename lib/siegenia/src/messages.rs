pub mod incoming {
    use serde::Deserialize;
    use serde_json::Value;

    #[derive(Clone, Debug, Default, Deserialize, PartialEq)]
    pub struct Response {
        #[serde(default)]
        pub id: Option<u64>,
        #[serde(default)]
        pub status: String,
        #[serde(default)]
        pub data: Value,
        #[serde(default)]
        pub command: Option<String>,
    }

    impl Response {
        pub fn is_ok(&self) -> bool {
            self.status == "ok"
        }
    }
}

pub mod outgoing {
    mod keep_alive;
    pub use keep_alive::KeepAliveMessage;

    mod login;
    pub use login::{LoginMessage, LoginTokenMessage};

    mod set_device_params;
    pub use set_device_params::SetDeviceParamsMessage;

    mod raw;
    pub use raw::RawMessage;

    mod simple;
    pub use simple::{
        GetDeviceDetailsMessage, GetDeviceMessage, GetDeviceParamsMessage, GetDeviceStateMessage,
        LogoutMessage, RebootDeviceMessage, RenewCertMessage, ResetDeviceMessage,
    };

    pub trait OutgoingMessage {
        fn command(&self) -> &str;
    }
}
