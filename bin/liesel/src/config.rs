use std::time::Duration;

use siegenia::setup::device_id;
use siegenia::LinkConfig;

use crate::Error;

const DEFAULT_USER: &str = "admin";

#[derive(Clone, Debug)]
pub struct DeviceConfig {
    pub id: String,
    pub name: String,
    pub link: LinkConfig,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub devices: Vec<DeviceConfig>,
    pub user: String,
    pub password: String,
}

impl Config {
    pub fn from_env() -> Result<Config, Error> {
        Config::from_vars(|name| std::env::var(name).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Config, Error> {
        let devices = var("SIEGENIA_DEVICES").ok_or(Error::MissingVariable("SIEGENIA_DEVICES"))?;
        let password = var("SIEGENIA_PASSWORD").ok_or(Error::MissingVariable("SIEGENIA_PASSWORD"))?;
        let user = var("SIEGENIA_USER").unwrap_or_else(|| DEFAULT_USER.to_string());

        let response_timeout = match var("SIEGENIA_RESPONSE_TIMEOUT_MS") {
            Some(value) => match value.trim().parse() {
                Ok(millis) => Some(Duration::from_millis(millis)),
                Err(_) => {
                    return Err(Error::InvalidVariable {
                        name: "SIEGENIA_RESPONSE_TIMEOUT_MS",
                        value,
                    })
                }
            },
            None => None,
        };

        let devices = devices
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| parse_device(entry, response_timeout))
            .collect::<Result<Vec<_>, _>>()?;

        if devices.is_empty() {
            return Err(Error::MissingVariable("SIEGENIA_DEVICES"));
        }

        Ok(Config {
            devices,
            user,
            password,
        })
    }
}

fn parse_device(entry: &str, response_timeout: Option<Duration>) -> Result<DeviceConfig, Error> {
    let (url, name) = match entry.split_once('#') {
        Some((url, name)) => (url, Some(name.trim())),
        None => (entry, None),
    };

    let mut link = LinkConfig::from_url(url)?;
    if let Some(timeout) = response_timeout {
        link = link.response_timeout(timeout);
    }

    let id = device_id(&link.host);
    let name = match name {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("Device {id}"),
    };

    Ok(DeviceConfig { id, name, link })
}
