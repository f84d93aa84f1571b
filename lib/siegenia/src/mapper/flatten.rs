use std::collections::BTreeMap;

use chrono::{Local, NaiveDate, TimeDelta, TimeZone};
use serde_json::{Map, Value};

const DATE_TIME_FIELDS: [&str; 5] = ["year", "month", "day", "hour", "minute"];

pub fn flatten(data: &Value) -> BTreeMap<String, Value> {
    let mut fields = BTreeMap::new();

    if let Value::Object(object) = data {
        flatten_into(object, "", &mut fields);
    }

    fields
}

fn flatten_into(object: &Map<String, Value>, prefix: &str, fields: &mut BTreeMap<String, Value>) {
    if DATE_TIME_FIELDS
        .iter()
        .all(|field| object.contains_key(*field))
    {
        fields.insert(prefix.to_string(), date_time_millis(object));
        return;
    }

    if object.contains_key("hour") && object.contains_key("minute") {
        fields.insert(prefix.to_string(), time_of_day(object));
        return;
    }

    for (key, value) in object {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };

        match value {
            Value::Object(nested) => flatten_into(nested, &path, fields),
            Value::Null => (),
            leaf => {
                fields.insert(path, leaf.clone());
            }
        }
    }
}

/// The wire month plus one is used as a zero-based month index, which looks
/// off by one. Not yet confirmed against device captures.
fn date_time_millis(object: &Map<String, Value>) -> Value {
    let component = |name: &str| object.get(name).and_then(Value::as_i64);

    match (
        component("year"),
        component("month"),
        component("day"),
        component("hour"),
        component("minute"),
    ) {
        (Some(year), Some(month), Some(day), Some(hour), Some(minute)) => {
            local_millis(year, month + 1, day, hour, minute)
                .map(Value::from)
                .unwrap_or(Value::Null)
        }
        _ => Value::Null,
    }
}

fn local_millis(year: i64, month_index: i64, day: i64, hour: i64, minute: i64) -> Option<i64> {
    let year = i32::try_from(year + month_index.div_euclid(12)).ok()?;
    let month = u32::try_from(month_index.rem_euclid(12) + 1).ok()?;

    let naive = NaiveDate::from_ymd_opt(year, month, 1)?
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(TimeDelta::try_days(day - 1)?)?
        .checked_add_signed(TimeDelta::try_hours(hour)?)?
        .checked_add_signed(TimeDelta::try_minutes(minute)?)?;

    let local = Local
        .from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| Local.from_utc_datetime(&naive));

    Some(local.timestamp_millis())
}

fn time_of_day(object: &Map<String, Value>) -> Value {
    let second = object
        .get("second")
        .map(two_digits)
        .unwrap_or_else(|| "00".to_string());

    let hour = object.get("hour").map(two_digits).unwrap_or_default();
    let minute = object.get("minute").map(two_digits).unwrap_or_default();

    Value::String(format!("{hour}:{minute}:{second}"))
}

fn two_digits(value: &Value) -> String {
    let text = match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    };

    format!("{text:0>2}")
}
