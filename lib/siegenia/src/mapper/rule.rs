use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

pub type States = &'static [(i64, &'static str)];

#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Boolean,
    Number,
    String,
    Array,
    Object,
    Mixed,
}

impl ValueType {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Bool(_) => Self::Boolean,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) | Value::Null => Self::Object,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean => f.write_str("boolean"),
            Self::Number => f.write_str("number"),
            Self::String => f.write_str("string"),
            Self::Array => f.write_str("array"),
            Self::Object => f.write_str("object"),
            Self::Mixed => f.write_str("mixed"),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    #[default]
    Plain,
    Color,
    Label,
    DateTime,
    TimeOfDay,
    TimeOfDayWithSeconds,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum DefaultValue {
    Bool(bool),
    Number(f64),
    Text(&'static str),
}

impl DefaultValue {
    pub fn to_value(self) -> Value {
        match self {
            Self::Bool(value) => Value::Bool(value),
            Self::Number(value) => Value::from(value),
            Self::Text(value) => Value::from(value),
        }
    }
}

impl Serialize for DefaultValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_value().serialize(serializer)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct FieldRule {
    pub id: Option<&'static str>,
    pub read: Option<bool>,
    pub write: Option<bool>,
    pub value_type: Option<ValueType>,
    pub role: Option<&'static str>,
    pub unit: Option<&'static str>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub states: Option<States>,
    pub default: Option<DefaultValue>,
    pub ignore: Option<bool>,
    pub real_id: Option<&'static str>,
    pub encoding: Option<Encoding>,
    pub max_hour: Option<u8>,
}

macro_rules! override_if_present {
    ($target:ident, $layer:ident, $($field:ident),+) => {
        $(
            if $layer.$field.is_some() {
                $target.$field = $layer.$field;
            }
        )+
    };
}

impl FieldRule {
    pub const EMPTY: FieldRule = FieldRule {
        id: None,
        read: None,
        write: None,
        value_type: None,
        role: None,
        unit: None,
        min: None,
        max: None,
        states: None,
        default: None,
        ignore: None,
        real_id: None,
        encoding: None,
        max_hour: None,
    };

    const fn typed(value_type: ValueType) -> Self {
        let mut rule = Self::EMPTY;
        rule.value_type = Some(value_type);
        rule
    }

    pub const fn boolean() -> Self {
        Self::typed(ValueType::Boolean)
    }

    pub const fn number() -> Self {
        Self::typed(ValueType::Number)
    }

    pub const fn string() -> Self {
        Self::typed(ValueType::String)
    }

    pub const fn array() -> Self {
        Self::typed(ValueType::Array)
    }

    pub const fn object() -> Self {
        Self::typed(ValueType::Object)
    }

    pub const fn mixed() -> Self {
        Self::typed(ValueType::Mixed)
    }

    pub const fn renamed(mut self, id: &'static str) -> Self {
        self.id = Some(id);
        self
    }

    pub const fn access(mut self, read: bool, write: bool) -> Self {
        self.read = Some(read);
        self.write = Some(write);
        self
    }

    pub const fn read_only(mut self) -> Self {
        self.write = Some(false);
        self
    }

    pub const fn role(mut self, role: &'static str) -> Self {
        self.role = Some(role);
        self
    }

    pub const fn unit(mut self, unit: &'static str) -> Self {
        self.unit = Some(unit);
        self
    }

    pub const fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub const fn range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub const fn states(mut self, states: States) -> Self {
        self.states = Some(states);
        self
    }

    pub const fn labels(mut self, states: States) -> Self {
        self.states = Some(states);
        self.encoding = Some(Encoding::Label);
        self
    }

    pub const fn default_value(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    pub const fn ignored(mut self) -> Self {
        self.ignore = Some(true);
        self
    }

    pub const fn real_id(mut self, real_id: &'static str) -> Self {
        self.real_id = Some(real_id);
        self
    }

    pub const fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    pub const fn max_hour(mut self, max_hour: u8) -> Self {
        self.max_hour = Some(max_hour);
        self
    }

    /// Applies `layer` on top of `self`: every attribute present in `layer`
    /// replaces the one in `self`.
    pub fn merged(mut self, layer: &FieldRule) -> FieldRule {
        override_if_present!(
            self, layer, id, read, write, value_type, role, unit, min, max, states, default,
            ignore, real_id, encoding, max_hour
        );
        self
    }

    pub fn is_ignored(&self) -> bool {
        self.ignore.unwrap_or(false)
    }

    pub fn encoding_or_plain(&self) -> Encoding {
        self.encoding.unwrap_or_default()
    }
}

pub(crate) struct StatesMap(pub States);

impl Serialize for StatesMap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (code, label) in self.0 {
            map.serialize_entry(&code.to_string(), label)?;
        }
        map.end()
    }
}
