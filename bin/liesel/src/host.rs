use std::collections::BTreeMap;

use log::{debug, info};
use serde_json::Value;
use siegenia::mapper::PropertyDefinition;
use siegenia::setup::PropertyHost;

#[derive(Default)]
pub struct MemoryHost {
    definitions: BTreeMap<String, PropertyDefinition>,
    values: BTreeMap<String, Value>,
}

impl MemoryHost {
    pub fn definition(&self, device_id: &str, path: &str) -> Option<&PropertyDefinition> {
        self.definitions.get(&key(device_id, path))
    }

    pub fn value(&self, device_id: &str, path: &str) -> Option<&Value> {
        self.values.get(&key(device_id, path))
    }
}

impl PropertyHost for MemoryHost {
    fn define_property(&mut self, device_id: &str, path: &str, definition: &PropertyDefinition) {
        let key = key(device_id, path);

        match serde_json::to_string(definition) {
            Ok(json) => debug!("define {key}: {json}"),
            Err(err) => debug!("define {key}: {err}"),
        }

        self.definitions.insert(key, definition.clone());
    }

    fn set_value(&mut self, device_id: &str, path: &str, value: Value) {
        let key = key(device_id, path);

        if self.values.get(&key) != Some(&value) {
            info!("{key} = {value}");
        }

        self.values.insert(key, value);
    }
}

fn key(device_id: &str, path: &str) -> String {
    format!("{device_id}.{path}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use siegenia::mapper::map_to_objects;
    use siegenia::DeviceType;

    #[test]
    fn test_stores_definitions_and_values() {
        let objects = map_to_objects(
            "getDeviceParams",
            DeviceType::Aerovital,
            &json!({ "fanpower": 40 }),
        );

        let mut host = MemoryHost::default();
        host.define_property("10_0_1_20", "params.fanpower", &objects["fanpower"]);
        host.set_value("10_0_1_20", "params.fanpower", json!(40));
        host.set_value("10_0_1_20", "params.fanpower", json!(55));

        let definition = host.definition("10_0_1_20", "params.fanpower").unwrap();
        assert_eq!(definition.unit, Some("%"));
        assert_eq!(host.value("10_0_1_20", "params.fanpower"), Some(&json!(55)));
        assert_eq!(host.value("10_0_1_20", "params.fanmode"), None);
    }
}
