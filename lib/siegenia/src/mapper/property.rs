use serde::{Serialize, Serializer};
use serde_json::Value;

use super::rule::{DefaultValue, Encoding, FieldRule, States, StatesMap, ValueType};

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Native {
    #[serde(rename = "realId", skip_serializing_if = "Option::is_none")]
    pub real_id: Option<String>,
    #[serde(skip_serializing_if = "is_plain")]
    pub encoding: Encoding,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_states"
    )]
    pub states: Option<States>,
    #[serde(rename = "maxHour", skip_serializing_if = "Option::is_none")]
    pub max_hour: Option<u8>,
}

impl Native {
    fn from_rule(rule: &FieldRule, wire_key: &str) -> Self {
        let real_id = match (rule.real_id, rule.id) {
            (Some(real_id), _) => Some(real_id.to_string()),
            (None, Some(_)) => Some(wire_key.to_string()),
            (None, None) => None,
        };

        Native {
            real_id,
            encoding: rule.encoding_or_plain(),
            states: rule.states,
            max_hour: rule.max_hour,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PropertyDefinition {
    #[serde(rename = "type")]
    pub value_type: ValueType,
    pub role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_states"
    )]
    pub states: Option<States>,
    #[serde(rename = "def", skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    pub native: Native,
}

impl PropertyDefinition {
    pub(crate) fn from_rule(rule: &FieldRule, wire_key: &str, value: Option<Value>) -> Self {
        let value_type = rule
            .value_type
            .or_else(|| value.as_ref().map(ValueType::of))
            .unwrap_or(ValueType::Mixed);

        let role = rule.role.unwrap_or_else(|| {
            infer_role(
                value_type,
                rule.read.unwrap_or(false),
                rule.write.unwrap_or(false),
            )
        });

        PropertyDefinition {
            value_type,
            role,
            read: rule.read,
            write: rule.write,
            unit: rule.unit,
            min: rule.min,
            max: rule.max,
            states: rule.states,
            default: rule.default,
            value,
            native: Native::from_rule(rule, wire_key),
        }
    }

    pub fn is_writable(&self) -> bool {
        self.write.unwrap_or(false)
    }
}

pub fn infer_role(value_type: ValueType, read: bool, write: bool) -> &'static str {
    match (value_type, read, write) {
        (ValueType::Boolean, true, false) => "sensor",
        (ValueType::Boolean, false, true) => "button",
        (ValueType::Boolean, true, true) => "switch",
        (ValueType::Number, true, false) => "value",
        (ValueType::Number, _, true) => "level",
        (ValueType::String, _, _) => "text",
        _ => "state",
    }
}

fn is_plain(encoding: &Encoding) -> bool {
    *encoding == Encoding::Plain
}

fn serialize_states<S>(states: &Option<States>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match states {
        Some(states) => StatesMap(*states).serialize(serializer),
        None => serializer.serialize_none(),
    }
}
