use serde_json::Value;

use crate::Error;

#[derive(Debug, PartialEq)]
pub struct WriteCommand {
    pub device_id: String,
    pub path: String,
    pub value: Value,
}

impl WriteCommand {
    /// Parses `<device-id> <property> <json-value>`. A value that is not JSON
    /// is taken as a plain string.
    pub fn parse(line: &str) -> Result<WriteCommand, Error> {
        let mut parts = line.trim().splitn(3, char::is_whitespace);

        let (Some(device_id), Some(path), Some(value)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(Error::InvalidCommand(line.to_string()));
        };

        let value = value.trim();
        let value = serde_json::from_str(value).unwrap_or_else(|_| Value::from(value));

        Ok(WriteCommand {
            device_id: device_id.to_string(),
            path: path.to_string(),
            value,
        })
    }
}
