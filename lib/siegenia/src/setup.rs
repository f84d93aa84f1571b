use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use log::{debug, error, info, warn};
use serde_json::Value;

use crate::link::{DeviceLink, LinkEvent};
use crate::mapper::{
    map_to_objects, map_to_states, map_value_for_write, special_device_objects, FieldRule,
    PropertyDefinition,
};
use crate::messages::incoming::Response;
use crate::{DeviceType, Error, Result};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeviceApi: Send + Sync {
    async fn connect(&self) -> Result<()>;
    async fn get_device(&self) -> Result<Response>;
    async fn login(&self, user: &str, password: &str) -> Result<Response>;
    async fn get_device_state(&self) -> Result<Response>;
    async fn get_device_params(&self) -> Result<Response>;
    async fn get_device_details(&self) -> Result<Response>;
    async fn set_device_params(&self, params: Value) -> Result<Response>;
    async fn reboot_device(&self) -> Result<Response>;
}

#[async_trait]
impl DeviceApi for DeviceLink {
    async fn connect(&self) -> Result<()> {
        DeviceLink::connect(self).await
    }

    async fn get_device(&self) -> Result<Response> {
        DeviceLink::get_device(self).await
    }

    async fn login(&self, user: &str, password: &str) -> Result<Response> {
        DeviceLink::login(self, user, password).await
    }

    async fn get_device_state(&self) -> Result<Response> {
        DeviceLink::get_device_state(self).await
    }

    async fn get_device_params(&self) -> Result<Response> {
        DeviceLink::get_device_params(self).await
    }

    async fn get_device_details(&self) -> Result<Response> {
        DeviceLink::get_device_details(self).await
    }

    async fn set_device_params(&self, params: Value) -> Result<Response> {
        DeviceLink::set_device_params(self, params).await
    }

    async fn reboot_device(&self) -> Result<Response> {
        DeviceLink::reboot_device(self).await
    }
}

pub trait PropertyHost {
    fn define_property(&mut self, device_id: &str, path: &str, definition: &PropertyDefinition);
    fn set_value(&mut self, device_id: &str, path: &str, value: Value);
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SetupStage {
    Idle,
    Connecting,
    FetchingInfo,
    LoggingIn,
    FetchingState,
    FetchingParams,
    FetchingDetails,
    Ready,
}

impl fmt::Display for SetupStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            SetupStage::Idle => "idle",
            SetupStage::Connecting => "connecting",
            SetupStage::FetchingInfo => "fetching device info",
            SetupStage::LoggingIn => "logging in",
            SetupStage::FetchingState => "fetching device state",
            SetupStage::FetchingParams => "fetching device params",
            SetupStage::FetchingDetails => "fetching device details",
            SetupStage::Ready => "ready",
        };
        f.write_str(stage)
    }
}

#[derive(Debug)]
pub struct SetupError {
    pub stage: SetupStage,
    pub error: Error,
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "setup failed while {}: {}", self.stage, self.error)
    }
}

impl std::error::Error for SetupError {}

pub const ONLINE: &str = "online";
pub const REBOOT: &str = "reboot";

const ONLINE_RULE: FieldRule = FieldRule::boolean()
    .access(true, false)
    .role("indicator.reachable");
const REBOOT_RULE: FieldRule = FieldRule::boolean().access(false, true).role("button");

pub fn device_id(host: &str) -> String {
    host.trim().replace('.', "_")
}

pub struct DeviceSession<A> {
    api: A,
    id: String,
    user: String,
    password: String,
    stage: SetupStage,
    device_type: Option<DeviceType>,
    token: Option<String>,
    definitions: BTreeMap<String, PropertyDefinition>,
}

impl<A: DeviceApi> DeviceSession<A> {
    pub fn new(api: A, id: String, user: String, password: String) -> Self {
        DeviceSession {
            api,
            id,
            user,
            password,
            stage: SetupStage::Idle,
            device_type: None,
            token: None,
            definitions: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn stage(&self) -> SetupStage {
        self.stage
    }

    pub fn device_type(&self) -> Option<DeviceType> {
        self.device_type
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn definition(&self, path: &str) -> Option<&PropertyDefinition> {
        self.definitions.get(path)
    }

    pub async fn run_setup<H: PropertyHost>(&mut self, host: &mut H) -> std::result::Result<(), SetupError> {
        self.stage = SetupStage::Connecting;
        self.api
            .connect()
            .await
            .map_err(|error| self.failed(error))?;

        self.initialize(host).await
    }

    pub async fn initialize<H: PropertyHost>(&mut self, host: &mut H) -> std::result::Result<(), SetupError> {
        self.define(host, ONLINE, &ONLINE_RULE, Some(Value::Bool(true)));

        self.stage = SetupStage::FetchingInfo;
        let info = self.request("getDevice", self.api.get_device()).await?;
        let device_type = device_type_of(&info).map_err(|error| self.failed(error))?;
        self.device_type = Some(device_type);
        info!("{}: device type {device_type}", self.id);
        self.define_all(host, "info", "getDevice", &info);

        self.stage = SetupStage::LoggingIn;
        let login = self
            .request("login", self.api.login(&self.user, &self.password))
            .await?;
        self.token = login["token"].as_str().map(str::to_string);

        self.stage = SetupStage::FetchingState;
        let state = self
            .request("getDeviceState", self.api.get_device_state())
            .await?;
        self.define_all(host, "params", "getDeviceState", &state);

        self.stage = SetupStage::FetchingParams;
        let params = self
            .request("getDeviceParams", self.api.get_device_params())
            .await?;
        self.define_all(host, "params", "getDeviceParams", &params);

        self.stage = SetupStage::FetchingDetails;
        let details = self
            .request("getDeviceDetails", self.api.get_device_details())
            .await?;
        self.define_all(host, "details", "getDeviceDetails", &details);

        if let Some(special) = special_device_objects(device_type) {
            for (name, definition) in special {
                self.store(host, format!("params.{name}"), definition);
            }
        }

        self.define(host, REBOOT, &REBOOT_RULE, None);

        self.stage = SetupStage::Ready;
        info!("{}: ready", self.id);

        Ok(())
    }

    async fn request(
        &self,
        command: &str,
        request: impl std::future::Future<Output = Result<Response>>,
    ) -> std::result::Result<Value, SetupError> {
        let response = request.await.map_err(|error| self.failed(error))?;

        if response.is_ok() {
            debug!("{}: {command} -> {}", self.id, response.data);
            Ok(response.data)
        } else {
            Err(self.failed(Error::Status {
                command: command.to_string(),
                status: response.status,
            }))
        }
    }

    fn failed(&self, error: Error) -> SetupError {
        SetupError {
            stage: self.stage,
            error,
        }
    }

    fn define_all<H: PropertyHost>(&mut self, host: &mut H, channel: &str, command: &str, data: &Value) {
        let Some(device_type) = self.device_type else {
            return;
        };

        for (name, definition) in map_to_objects(command, device_type, data) {
            self.store(host, format!("{channel}.{name}"), definition);
        }
    }

    fn define<H: PropertyHost>(&mut self, host: &mut H, path: &str, rule: &FieldRule, value: Option<Value>) {
        let definition = PropertyDefinition::from_rule(rule, path, value);
        self.store(host, path.to_string(), definition);
    }

    fn store<H: PropertyHost>(&mut self, host: &mut H, path: String, definition: PropertyDefinition) {
        host.define_property(&self.id, &path, &definition);
        if let Some(value) = &definition.value {
            host.set_value(&self.id, &path, value.clone());
        }

        self.definitions.insert(path, definition);
    }

    pub async fn handle_event<H: PropertyHost>(&mut self, event: LinkEvent, host: &mut H) {
        match event {
            LinkEvent::Connected => {
                // a first open that happened after a failed connect attempt
                if self.stage == SetupStage::Connecting {
                    if let Err(err) = self.initialize(host).await {
                        error!("{}: {err}", self.id);
                    }
                }
            }
            LinkEvent::Reconnected => {
                info!("{}: reconnected", self.id);
                host.set_value(&self.id, ONLINE, Value::Bool(true));
            }
            LinkEvent::Closed { code, reason } => {
                info!("{}: closed {code} / {reason}", self.id);
                host.set_value(&self.id, ONLINE, Value::Bool(false));
            }
            LinkEvent::Error(err) => {
                error!("{}: {err}", self.id);
            }
            LinkEvent::Data {
                status,
                data,
                command,
            } => {
                debug!("{}: data {command:?} / {status} / {data}", self.id);

                let Some(device_type) = self.device_type else {
                    return;
                };
                if data.is_null() {
                    return;
                }

                let command = command.as_deref().unwrap_or_default();
                for (name, value) in map_to_states(command, device_type, &data) {
                    host.set_value(&self.id, &format!("params.{name}"), value);
                }
            }
        }
    }

    pub async fn write_property(&self, path: &str, value: Value) -> Result<()> {
        let definition = self
            .definitions
            .get(path)
            .ok_or_else(|| Error::UnknownProperty(path.to_string()))?;

        if !definition.is_writable() {
            return Err(Error::ReadOnlyProperty(path.to_string()));
        }

        if path == REBOOT {
            info!("{}: rebooting", self.id);
            let response = self.api.reboot_device().await?;
            return check_status("rebootDevice", response);
        }

        let name = path.split_once('.').map_or(path, |(_, name)| name);
        let params = map_value_for_write(name, value, &definition.native);

        if params.as_object().is_some_and(|params| params.is_empty()) {
            warn!("{}: nothing to write for {path}", self.id);
            return Ok(());
        }

        debug!("{}: write {path} -> {params}", self.id);
        let response = self.api.set_device_params(params).await?;

        check_status("setDeviceParams", response)
    }
}

fn check_status(command: &str, response: Response) -> Result<()> {
    if response.is_ok() {
        Ok(())
    } else {
        Err(Error::Status {
            command: command.to_string(),
            status: response.status,
        })
    }
}

fn device_type_of(info: &Value) -> Result<DeviceType> {
    let code = info["type"].as_u64().unwrap_or_default();
    Ok(DeviceType::try_from(code)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;
    use serde_json::json;

    #[derive(Default)]
    struct RecordingHost {
        definitions: BTreeMap<String, PropertyDefinition>,
        values: BTreeMap<String, Value>,
    }

    impl PropertyHost for RecordingHost {
        fn define_property(&mut self, device_id: &str, path: &str, definition: &PropertyDefinition) {
            self.definitions
                .insert(format!("{device_id}.{path}"), definition.clone());
        }

        fn set_value(&mut self, device_id: &str, path: &str, value: Value) {
            self.values.insert(format!("{device_id}.{path}"), value);
        }
    }

    fn ok(data: Value) -> Result<Response> {
        Ok(Response {
            id: Some(2),
            status: "ok".to_string(),
            data,
            command: None,
        })
    }

    fn status(status: &str) -> Result<Response> {
        Ok(Response {
            id: Some(2),
            status: status.to_string(),
            ..Response::default()
        })
    }

    fn aerovital() -> MockDeviceApi {
        let mut api = MockDeviceApi::new();
        api.expect_connect().times(1).returning(|| Ok(()));
        api.expect_get_device()
            .returning(|| ok(json!({ "type": 5, "devicename": "Office", "serialnr": "X1" })));
        api.expect_login()
            .with(eq("admin"), eq("secret"))
            .returning(|_, _| ok(json!({ "token": "abc" })));
        api.expect_get_device_state()
            .returning(|| ok(json!({ "devicestate": { "deviceactive": true } })));
        api.expect_get_device_params()
            .returning(|| ok(json!({ "fanmode": "OUT", "fanpower": 40 })));
        api.expect_get_device_details()
            .returning(|| ok(json!({ "hardware": { "version": "1.2" } })));
        api
    }

    fn session(api: MockDeviceApi) -> DeviceSession<MockDeviceApi> {
        DeviceSession::new(
            api,
            device_id("10.0.1.20"),
            "admin".to_string(),
            "secret".to_string(),
        )
    }

    #[test]
    fn test_device_id() {
        assert_eq!(device_id(" 10.0.1.20 "), "10_0_1_20");
    }

    #[tokio::test]
    async fn test_setup_defines_properties() {
        let mut host = RecordingHost::default();
        let mut session = session(aerovital());

        session.run_setup(&mut host).await.unwrap();

        assert_eq!(session.stage(), SetupStage::Ready);
        assert_eq!(session.device_type(), Some(DeviceType::Aerovital));
        assert_eq!(session.token(), Some("abc"));

        assert_eq!(host.values["10_0_1_20.info.devicename"], json!("Office"));
        assert_eq!(host.values["10_0_1_20.params.active"], json!(true));
        assert_eq!(host.values["10_0_1_20.params.fanmode"], json!(2));
        assert_eq!(host.values["10_0_1_20.details.hardware.version"], json!("1.2"));
        assert_eq!(host.values["10_0_1_20.online"], json!(true));

        assert!(host.definitions.contains_key("10_0_1_20.params.timer.fanmode"));
        assert_eq!(host.definitions["10_0_1_20.reboot"].role, "button");
        let online = &host.definitions["10_0_1_20.online"];
        assert_eq!(online.role, "indicator.reachable");
        assert_eq!(online.read, Some(true));
        assert_eq!(online.write, Some(false));
    }

    #[tokio::test]
    async fn test_setup_stops_at_failed_login() {
        let mut api = MockDeviceApi::new();
        api.expect_connect().returning(|| Ok(()));
        api.expect_get_device().returning(|| ok(json!({ "type": 1 })));
        api.expect_login().returning(|_, _| status("not_authorized"));
        api.expect_get_device_state().never();
        api.expect_get_device_params().never();

        let mut host = RecordingHost::default();
        let mut session = session(api);

        let err = session.run_setup(&mut host).await.unwrap_err();

        assert_eq!(err.stage, SetupStage::LoggingIn);
        assert!(matches!(
            err.error,
            Error::Status { ref status, .. } if status == "not_authorized"
        ));
        assert_eq!(session.stage(), SetupStage::LoggingIn);
    }

    #[tokio::test]
    async fn test_setup_rejects_unknown_device_type() {
        let mut api = MockDeviceApi::new();
        api.expect_connect().returning(|| Ok(()));
        api.expect_get_device().returning(|| ok(json!({ "type": 42 })));
        api.expect_login().never();

        let mut session = session(api);
        let err = session
            .run_setup(&mut RecordingHost::default())
            .await
            .unwrap_err();

        assert_eq!(err.stage, SetupStage::FetchingInfo);
        assert!(matches!(err.error, Error::UnknownDeviceType(42)));
    }

    #[tokio::test]
    async fn test_setup_stops_at_failed_connect() {
        let mut api = MockDeviceApi::new();
        api.expect_connect()
            .returning(|| Err(Error::ConnectionAlreadyActive));
        api.expect_get_device().never();

        let mut session = session(api);
        let err = session
            .run_setup(&mut RecordingHost::default())
            .await
            .unwrap_err();

        assert_eq!(err.stage, SetupStage::Connecting);
    }

    #[tokio::test]
    async fn test_events_update_host() {
        let mut host = RecordingHost::default();
        let mut session = session(aerovital());
        session.run_setup(&mut host).await.unwrap();

        let push = LinkEvent::Data {
            status: "ok".to_string(),
            data: json!({ "fanmode": "IN_OUT", "clock": { "hour": 1, "minute": 2 } }),
            command: Some("getDeviceParams".to_string()),
        };
        session.handle_event(push, &mut host).await;
        assert_eq!(host.values["10_0_1_20.params.fanmode"], json!(3));
        assert!(!host.values.contains_key("10_0_1_20.params.clock"));

        let closed = LinkEvent::Closed {
            code: 1006,
            reason: String::new(),
        };
        session.handle_event(closed, &mut host).await;
        assert_eq!(host.values["10_0_1_20.online"], json!(false));

        session.handle_event(LinkEvent::Reconnected, &mut host).await;
        assert_eq!(host.values["10_0_1_20.online"], json!(true));
    }

    #[tokio::test]
    async fn test_write_property() {
        let mut api = aerovital();
        api.expect_set_device_params()
            .with(eq(json!({ "fanmode": "IN" })))
            .times(1)
            .returning(|_| ok(json!({})));
        api.expect_set_device_params()
            .with(eq(json!({ "devicestate": { "deviceactive": false } })))
            .times(1)
            .returning(|_| status("error"));
        api.expect_reboot_device().times(1).returning(|| ok(json!({})));

        let mut session = session(api);
        session.run_setup(&mut RecordingHost::default()).await.unwrap();

        session
            .write_property("params.fanmode", json!(1))
            .await
            .unwrap();

        let result = session.write_property("params.active", json!(false)).await;
        assert!(matches!(result, Err(Error::Status { .. })));

        session.write_property(REBOOT, json!(true)).await.unwrap();

        assert!(matches!(
            session.write_property("info.serialnr", json!("X2")).await,
            Err(Error::ReadOnlyProperty(_))
        ));
        assert!(matches!(
            session.write_property("params.missing", json!(1)).await,
            Err(Error::UnknownProperty(_))
        ));
    }

    #[tokio::test]
    async fn test_malformed_time_write_is_skipped() {
        let mut api = MockDeviceApi::new();
        api.expect_connect().returning(|| Ok(()));
        api.expect_get_device().returning(|| ok(json!({ "type": 12 })));
        api.expect_login().returning(|_, _| ok(json!({})));
        api.expect_get_device_state().returning(|| ok(json!({})));
        api.expect_get_device_params().returning(|| ok(json!({})));
        api.expect_get_device_details().returning(|| ok(json!({})));
        api.expect_set_device_params()
            .with(eq(json!({ "timer": { "duration": { "hour": 1, "minute": 30 } } })))
            .times(1)
            .returning(|_| ok(json!({})));

        let mut session = session(api);
        session.run_setup(&mut RecordingHost::default()).await.unwrap();
        assert_eq!(session.token(), None);

        session
            .write_property("params.timer.duration", json!("0130"))
            .await
            .unwrap();
        session
            .write_property("params.timer.duration", json!("01:30"))
            .await
            .unwrap();
    }
}
