use chrono::{DateTime, Datelike, Local, TimeZone, Timelike};
use serde_json::{Map, Value};

use super::property::Native;
use super::rule::{Encoding, FieldRule, States};

pub fn map_value_for_read(value: Value, rule: &FieldRule) -> Value {
    match (rule.encoding_or_plain(), value) {
        (Encoding::Color, Value::String(color)) if !color.starts_with('#') => {
            Value::String(format!("#{color}"))
        }
        (Encoding::Label, Value::String(label)) => match rule.states.and_then(|states| code_of(states, &label)) {
            Some(code) => Value::from(code),
            None => Value::String(label),
        },
        (_, value) => value,
    }
}

/// A time-of-day string without two or three `:` separated parts and a
/// date-time that is not a valid timestamp produce an empty object.
pub fn map_value_for_write(name: &str, value: Value, native: &Native) -> Value {
    let value = match native.encoding {
        Encoding::Color => match value {
            Value::String(color) => match color.strip_prefix('#') {
                Some(stripped) => Value::from(stripped),
                None => Value::String(color),
            },
            other => other,
        },
        Encoding::Label => match native.states.and_then(|states| label_of(states, &value)) {
            Some(label) => Value::from(label),
            None => value,
        },
        Encoding::DateTime => match date_time_struct(&value) {
            Some(date_time) => date_time,
            None => return Value::Object(Map::new()),
        },
        Encoding::TimeOfDay | Encoding::TimeOfDayWithSeconds => {
            let with_seconds = native.encoding == Encoding::TimeOfDayWithSeconds;
            match time_struct(&value, with_seconds) {
                Some(time) => time,
                None => return Value::Object(Map::new()),
            }
        }
        Encoding::Plain => value,
    };

    let path = native.real_id.as_deref().unwrap_or(name);

    path.rsplit('.').fold(value, |nested, segment| {
        let mut object = Map::new();
        object.insert(segment.to_string(), nested);
        Value::Object(object)
    })
}

fn code_of(states: States, label: &str) -> Option<i64> {
    states
        .iter()
        .find_map(|(code, candidate)| (*candidate == label).then_some(*code))
}

fn label_of(states: States, value: &Value) -> Option<&'static str> {
    let code = match value {
        Value::Number(number) => number.as_i64()?,
        Value::String(text) => text.trim().parse().ok()?,
        _ => return None,
    };

    states
        .iter()
        .find_map(|(candidate, label)| (*candidate == code).then_some(*label))
}

fn date_time_struct(value: &Value) -> Option<Value> {
    let date_time: DateTime<Local> = match value {
        Value::Number(millis) => Local.timestamp_millis_opt(millis.as_i64()?).single()?,
        Value::String(text) => DateTime::parse_from_rfc3339(text)
            .ok()?
            .with_timezone(&Local),
        _ => return None,
    };

    let mut object = Map::new();
    object.insert("year".to_string(), Value::from(date_time.year()));
    object.insert("month".to_string(), Value::from(date_time.month()));
    object.insert("day".to_string(), Value::from(date_time.day()));
    object.insert("hour".to_string(), Value::from(date_time.hour()));
    object.insert("minute".to_string(), Value::from(date_time.minute()));

    Some(Value::Object(object))
}

fn time_struct(value: &Value, with_seconds: bool) -> Option<Value> {
    let parts: Vec<&str> = value.as_str()?.split(':').collect();
    if parts.len() < 2 || parts.len() > 3 {
        return None;
    }

    let mut object = Map::new();
    object.insert("hour".to_string(), Value::from(parse_leading_int(parts[0])));
    object.insert("minute".to_string(), Value::from(parse_leading_int(parts[1])));

    if with_seconds && parts.len() == 3 {
        object.insert("second".to_string(), Value::from(parse_leading_int(parts[2])));
    }

    Some(Value::Object(object))
}

fn parse_leading_int(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, text.strip_prefix('+').unwrap_or(text)),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());

    digits[..end].parse::<i64>().ok().map(|number| sign * number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::flatten;
    use serde_json::json;

    const FAN_MODES: States = &[(1, "IN"), (2, "OUT"), (3, "IN_OUT"), (4, "IN_OUT_WRG")];

    fn native(encoding: Encoding) -> Native {
        Native {
            encoding,
            ..Native::default()
        }
    }

    #[test]
    fn test_color_read() {
        let rule = FieldRule::string().encoding(Encoding::Color);

        assert_eq!(map_value_for_read(json!("29C257"), &rule), json!("#29C257"));
        assert_eq!(map_value_for_read(json!("#29C257"), &rule), json!("#29C257"));
    }

    #[test]
    fn test_color_write() {
        let written = map_value_for_write("lighting.front", json!("#29C257"), &native(Encoding::Color));
        assert_eq!(written, json!({ "lighting": { "front": "29C257" } }));

        let written = map_value_for_write("lighting.back", json!("29C257"), &native(Encoding::Color));
        assert_eq!(written, json!({ "lighting": { "back": "29C257" } }));
    }

    #[test]
    fn test_label_read() {
        let rule = FieldRule::number().labels(FAN_MODES);

        assert_eq!(map_value_for_read(json!("OUT"), &rule), json!(2));
        assert_eq!(map_value_for_read(json!("UNKNOWN"), &rule), json!("UNKNOWN"));
        assert_eq!(map_value_for_read(json!(3), &rule), json!(3));
    }

    #[test]
    fn test_states_without_label_encoding_pass_through() {
        let rule = FieldRule::number().states(FAN_MODES);
        assert_eq!(map_value_for_read(json!("OUT"), &rule), json!("OUT"));
    }

    #[test]
    fn test_label_round_trip() {
        let rule = FieldRule::number().labels(FAN_MODES);
        let native = Native {
            encoding: Encoding::Label,
            states: Some(FAN_MODES),
            ..Native::default()
        };

        for (code, label) in FAN_MODES {
            let written = map_value_for_write("fanmode", json!(code), &native);
            assert_eq!(written, json!({ "fanmode": label }));

            let read = map_value_for_read(written["fanmode"].clone(), &rule);
            assert_eq!(read, json!(code));
        }

        let written = map_value_for_write("fanmode", json!("2"), &native);
        assert_eq!(written, json!({ "fanmode": "OUT" }));
    }

    #[test]
    fn test_time_of_day_write() {
        let written = map_value_for_write("timer.duration", json!("01:30"), &native(Encoding::TimeOfDay));
        assert_eq!(written, json!({ "timer": { "duration": { "hour": 1, "minute": 30 } } }));

        let written = map_value_for_write("timer.duration", json!("01:30:15"), &native(Encoding::TimeOfDay));
        assert_eq!(written, json!({ "timer": { "duration": { "hour": 1, "minute": 30 } } }));

        let written = map_value_for_write(
            "timer.duration",
            json!("01:30:15"),
            &native(Encoding::TimeOfDayWithSeconds),
        );
        assert_eq!(
            written,
            json!({ "timer": { "duration": { "hour": 1, "minute": 30, "second": 15 } } })
        );
    }

    #[test]
    fn test_malformed_time_of_day_write_is_empty() {
        for value in [json!("0130"), json!("1:2:3:4"), json!(90)] {
            let written = map_value_for_write("timer.duration", value, &native(Encoding::TimeOfDay));
            assert_eq!(written, json!({}));
        }
    }

    #[test]
    fn test_time_of_day_round_trip() {
        let fields = flatten(&json!({ "timer": { "duration": { "hour": 7, "minute": 5 } } }));
        let written = map_value_for_write(
            "timer.duration",
            fields["timer.duration"].clone(),
            &native(Encoding::TimeOfDay),
        );

        assert_eq!(flatten(&written), fields);
    }

    #[test]
    fn test_date_time_write() {
        let date_time = Local.with_ymd_and_hms(2024, 4, 15, 10, 30, 0).earliest().unwrap();
        let written = map_value_for_write(
            "clock",
            json!(date_time.timestamp_millis()),
            &native(Encoding::DateTime),
        );

        assert_eq!(
            written,
            json!({ "clock": { "year": 2024, "month": 4, "day": 15, "hour": 10, "minute": 30 } })
        );

        let written = map_value_for_write("clock", json!("noon"), &native(Encoding::DateTime));
        assert_eq!(written, json!({}));
    }

    #[test]
    fn test_write_uses_real_id() {
        let native = Native {
            real_id: Some("devicestate.deviceactive".to_string()),
            ..Native::default()
        };

        let written = map_value_for_write("active", json!(false), &native);
        assert_eq!(written, json!({ "devicestate": { "deviceactive": false } }));
    }

    #[test]
    fn test_parse_leading_int() {
        assert_eq!(parse_leading_int("05"), Some(5));
        assert_eq!(parse_leading_int(" 7"), Some(7));
        assert_eq!(parse_leading_int("12h"), Some(12));
        assert_eq!(parse_leading_int("-3"), Some(-3));
        assert_eq!(parse_leading_int("ab"), None);
        assert_eq!(parse_leading_int(""), None);
    }
}
