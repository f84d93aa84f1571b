mod flatten;
mod property;
mod rule;
mod special;
mod table;
mod transcode;

use std::collections::BTreeMap;

use serde_json::Value;

use crate::DeviceType;

pub use flatten::flatten;
pub use property::{infer_role, Native, PropertyDefinition};
pub use rule::{DefaultValue, Encoding, FieldRule, States, ValueType};
pub use special::{special_rules, SPECIAL_OBJECTS};
pub use table::{command_rules, resolve, CommandRules, DEVICE_TYPE_STATES, FIELD_MAP};
pub use transcode::{map_value_for_read, map_value_for_write};

pub fn map_to_objects(
    command: &str,
    device_type: DeviceType,
    raw: &Value,
) -> BTreeMap<String, PropertyDefinition> {
    map_fields(command, device_type, raw)
        .map(|(name, wire_key, rule, value)| {
            let definition = PropertyDefinition::from_rule(&rule, &wire_key, Some(value));
            (name, definition)
        })
        .collect()
}

pub fn map_to_states(command: &str, device_type: DeviceType, raw: &Value) -> BTreeMap<String, Value> {
    map_fields(command, device_type, raw)
        .map(|(name, _, _, value)| (name, value))
        .collect()
}

pub fn special_device_objects(device_type: DeviceType) -> Option<BTreeMap<String, PropertyDefinition>> {
    let rules = special_rules(device_type)?;

    let definitions = rules
        .iter()
        .map(|(name, rule)| {
            let definition = PropertyDefinition::from_rule(rule, name, None);
            (name.to_string(), definition)
        })
        .collect();

    Some(definitions)
}

fn map_fields<'c>(
    command: &'c str,
    device_type: DeviceType,
    raw: &Value,
) -> impl Iterator<Item = (String, String, FieldRule, Value)> + 'c {
    flatten(raw).into_iter().filter_map(move |(wire_key, value)| {
        let rule = resolve(command, device_type, &wire_key);
        if rule.is_ignored() {
            return None;
        }

        let name = rule.id.map(str::to_string).unwrap_or_else(|| wire_key.clone());
        let value = map_value_for_read(value, &rule);

        Some((name, wire_key, rule, value))
    })
}
