use super::rule::{DefaultValue, Encoding, FieldRule, States};
use crate::DeviceType;

type Rules = &'static [(&'static str, FieldRule)];

pub struct CommandRules {
    pub command: &'static str,
    pub all: Option<FieldRule>,
    pub by_name: Rules,
    pub by_type: &'static [(DeviceType, Rules)],
}

impl CommandRules {
    pub fn resolve(&self, device_type: DeviceType, field: &str) -> FieldRule {
        let mut rule = self.all.unwrap_or(FieldRule::EMPTY);

        if let Some(by_name) = find(self.by_name, field) {
            rule = rule.merged(by_name);
        }

        let by_type = self
            .by_type
            .iter()
            .find(|(candidate, _)| *candidate == device_type)
            .and_then(|(_, rules)| find(rules, field));

        if let Some(by_type) = by_type {
            rule = rule.merged(by_type);
        }

        rule
    }
}

fn find<'r>(rules: &'r [(&'static str, FieldRule)], field: &str) -> Option<&'r FieldRule> {
    rules
        .iter()
        .find_map(|(name, rule)| if *name == field { Some(rule) } else { None })
}

pub fn command_rules(command: &str) -> Option<&'static CommandRules> {
    FIELD_MAP.iter().find(|rules| rules.command == command)
}

pub fn resolve(command: &str, device_type: DeviceType, field: &str) -> FieldRule {
    command_rules(command)
        .map(|rules| rules.resolve(device_type, field))
        .unwrap_or(FieldRule::EMPTY)
}

const fn device_type_state(device_type: DeviceType) -> (i64, &'static str) {
    (device_type.code() as i64, device_type.family_name())
}

pub const DEVICE_TYPE_STATES: States = &[
    device_type_state(DeviceType::Aeropac),
    device_type_state(DeviceType::AeromatVt),
    device_type_state(DeviceType::DriveAxxent),
    device_type_state(DeviceType::Sensoair),
    device_type_state(DeviceType::Aerovital),
    device_type_state(DeviceType::Mhs),
    device_type_state(DeviceType::Acs),
    device_type_state(DeviceType::Aerotube),
    device_type_state(DeviceType::GeniusB),
    device_type_state(DeviceType::UniversalModule),
    device_type_state(DeviceType::EnOceanConverter),
    device_type_state(DeviceType::VtUpgrade),
    device_type_state(DeviceType::DriveCl),
    device_type_state(DeviceType::Aeroplus),
];

pub const FAN_MODES_WRG: States = &[(1, "IN"), (2, "OUT"), (3, "IN_OUT"), (4, "IN_OUT_WRG")];
pub const FAN_MODES_WRG_AUTO: States = &[
    (1, "IN"),
    (2, "OUT"),
    (3, "IN_OUT"),
    (4, "IN_OUT_WRG"),
    (5, "AUTO"),
];
pub const FAN_MODES_AUTO: States = &[(1, "IN"), (2, "OUT"), (3, "IN_OUT"), (4, "AUTO")];

pub const DRIVE_CL_POSITIONS: States = &[
    (1, "LOCKED_WING_CLOSED"),
    (2, "TURN_POS_OPENED"),
    (3, "TURN_POS_CLOSED"),
    (4, "GAP_VENT"),
    (5, "TILT_POS"),
    (6, "CLOSED_NOT_LOCKED"),
];

const DRIVE_CL_STATES: States = &[
    (1, "LOCKED_WING_CLOSED"),
    (2, "TURN_POS_OPENED"),
    (3, "TURN_POS_CLOSED"),
    (4, "GAP_VENT"),
    (5, "TILT_POS"),
    (6, "CLOSED_NOT_LOCKED"),
    (7, "UNKNOWN"),
    (8, "POSITIONING"),
    (9, "ERROR_TILT_SENSOR"),
    (10, "ERROR_MOTOR"),
    (11, "ERROR_WINDOW_OPEN"),
    (12, "WINDOW_OPEN_TILT_BLOCKED"),
    (13, "WINDOW_OPEN_TURN_BLOCKED"),
    (14, "ERROR_CALIBRATION"),
];

const PERCENT_VALVE: FieldRule = FieldRule::number()
    .role("level.valve")
    .unit("%")
    .range(0.0, 100.0);

const PERCENT_LEVEL: FieldRule = FieldRule::number()
    .role("level")
    .unit("%")
    .range(0.0, 100.0);

const MAX_AIRFLOW: FieldRule = FieldRule::number()
    .role("value")
    .unit("m3/h")
    .read_only();

const TEMPERATURE: FieldRule = FieldRule::number()
    .role("value.temperature")
    .unit("°C")
    .read_only();

const HUMIDITY: FieldRule = FieldRule::number()
    .role("value.humidity")
    .unit("%")
    .read_only();

const CO2: FieldRule = FieldRule::number()
    .role("value.co2")
    .unit("PPM")
    .read_only();

const PLAIN_VALUE: FieldRule = FieldRule::number().role("value").read_only();

const READ_ONLY: FieldRule = FieldRule::EMPTY.read_only();

const DEVICE_ACTIVE: FieldRule = FieldRule::boolean()
    .renamed("active")
    .access(true, true)
    .default_value(DefaultValue::Bool(false))
    .real_id("devicestate.deviceactive");

const DURATION: FieldRule = FieldRule::mixed().encoding(Encoding::TimeOfDay);

pub static FIELD_MAP: &[CommandRules] = &[
    CommandRules {
        command: "getDevice",
        all: Some(FieldRule::EMPTY.access(true, false)),
        by_name: &[("type", FieldRule::number().states(DEVICE_TYPE_STATES))],
        by_type: &[],
    },
    CommandRules {
        command: "getDeviceState",
        all: None,
        by_name: &[
            ("devicestate.deviceactive", DEVICE_ACTIVE),
        ],
        by_type: &[],
    },
    CommandRules {
        command: "getDeviceParams",
        all: Some(FieldRule::EMPTY.access(true, true)),
        by_name: &[
            ("devicestate.deviceactive", DEVICE_ACTIVE),
            ("warnings", FieldRule::array().read_only()),
            ("airbase.temperature.indoor", TEMPERATURE),
            ("airbase.temperature.outdoor", TEMPERATURE),
            ("airbase.humidity.indoor", HUMIDITY),
            ("airbase.humidity.outdoor", HUMIDITY),
            ("airquality", PLAIN_VALUE),
        ],
        by_type: &[
            (DeviceType::Aeropac, AEROPAC_PARAMS),
            (DeviceType::AeromatVt, AEROMAT_VT_PARAMS),
            (DeviceType::DriveAxxent, DRIVE_AXXENT_PARAMS),
            (DeviceType::Sensoair, SENSOAIR_PARAMS),
            (DeviceType::Aerovital, AEROVITAL_PARAMS),
            (DeviceType::Mhs, MHS_PARAMS),
            (DeviceType::Aerotube, AEROTUBE_PARAMS),
            (DeviceType::UniversalModule, UNIVERSAL_MODULE_PARAMS),
            (DeviceType::EnOceanConverter, ENOCEAN_PARAMS),
            (DeviceType::VtUpgrade, VT_UPGRADE_PARAMS),
            (DeviceType::DriveCl, DRIVE_CL_PARAMS),
            (DeviceType::Aeroplus, AEROPLUS_PARAMS),
        ],
    },
];

const AEROPAC_PARAMS: Rules = &[
    ("fanlevel", FieldRule::number().range(0.0, 7.0)),
    ("timer.duration", DURATION.max_hour(18)),
    ("timer.remainingtime", FieldRule::mixed().read_only()),
    ("timer.poweron_time", DURATION),
    ("clock", FieldRule::EMPTY.ignored()),
];

const AEROMAT_VT_PARAMS: Rules = &[
    ("fanpower", PERCENT_VALVE),
    (
        "maxfanpower",
        FieldRule::number().role("level").unit("m3/h").min(0.0),
    ),
    ("airquality.co2content", CO2),
    ("airquality.voc", PLAIN_VALUE),
];

const DRIVE_AXXENT_PARAMS: Rules = &[
    ("state", READ_ONLY),
    ("timer.duration", DURATION),
    ("timer.remainingtime", FieldRule::mixed().read_only()),
];

const SENSOAIR_PARAMS: Rules = &[("externaldevices", FieldRule::object().read_only())];

const AEROVITAL_PARAMS: Rules = &[
    ("fanpower", PERCENT_VALVE),
    ("fanmode", FieldRule::number().labels(FAN_MODES_WRG)),
    ("maxfanpower", MAX_AIRFLOW),
    ("automode_maxairflow", PERCENT_VALVE),
    ("automode_co2sensity", PERCENT_LEVEL),
    (
        "lighting.front",
        FieldRule::string()
            .role("level.color.rgb")
            .encoding(Encoding::Color),
    ),
    (
        "lighting.back",
        FieldRule::string()
            .role("level.color.rgb")
            .encoding(Encoding::Color),
    ),
    ("lighting.history", FieldRule::array().read_only()),
    ("clock", FieldRule::EMPTY.ignored()),
    ("timer.activetimer", READ_ONLY),
    ("timer.remainingtime", READ_ONLY),
    ("timer.poweron_time", READ_ONLY),
    ("list_timers", FieldRule::object().read_only()),
];

const MHS_PARAMS: Rules = &[
    (
        "states.0",
        FieldRule::string().renamed("sash-0.state").read_only(),
    ),
    (
        "states.1",
        FieldRule::string().renamed("sash-1.state").read_only(),
    ),
    ("max_stopover", FieldRule::EMPTY.unit("dm").read_only()),
    ("stopover", FieldRule::EMPTY.unit("dm")),
    ("timer.duration", DURATION.max_hour(4)),
    ("timer.remainingtime", FieldRule::mixed().read_only()),
];

const AEROTUBE_PARAMS: Rules = &[
    ("fanpower", PERCENT_VALVE),
    ("fanmode", FieldRule::number().labels(FAN_MODES_AUTO)),
    (
        "fanmirror",
        FieldRule::number().states(&[
            (0, "Slave mode"),
            (1, "Slave must mirror"),
            (2, "Slave must copy"),
        ]),
    ),
    ("slave_fanpower", PERCENT_VALVE),
    (
        "slave_fandirection",
        FieldRule::number().states(&[(1, "Slave supply air"), (2, "Slave exhaust air")]),
    ),
    ("maxfanpower", MAX_AIRFLOW),
    ("automode_maxairflow", PERCENT_VALVE),
    ("automode_co2sensity", PERCENT_LEVEL),
    ("bathcontrolfanpower", PERCENT_VALVE),
    (
        "bathcontrolmodeactive",
        FieldRule::number().labels(&[(1, "IN"), (2, "OUT"), (3, "IGNORE")]),
    ),
    (
        "bathcontrolmodepassive",
        FieldRule::number().labels(FAN_MODES_AUTO),
    ),
    ("clock", FieldRule::EMPTY.ignored()),
    ("ecomode_maxairflow", PERCENT_VALVE),
    ("externaldevices", FieldRule::object().read_only()),
    ("timer.activetimer", READ_ONLY),
    ("timer.remainingtime", READ_ONLY),
    ("timer.poweron_time", READ_ONLY),
    ("list_timers", FieldRule::object().read_only()),
];

const UNIVERSAL_MODULE_PARAMS: Rules = &[(
    "fanmode",
    FieldRule::number()
        .states(&[(1, "OPEN"), (2, "CLOSED")])
        .read_only(),
)];

const ENOCEAN_PARAMS: Rules = &[
    (
        "windowsensors",
        FieldRule::array().role("list").read_only(),
    ),
    (
        "alarmtype",
        FieldRule::number().role("value").labels(&[
            (1, "SILENT"),
            (2, "ACOUSTIC"),
            (3, "OPTICAL"),
            (4, "BOTH"),
        ]),
    ),
    (
        "alarmsens",
        FieldRule::number()
            .role("value")
            .labels(&[(1, "LOW"), (2, "MEDIUM"), (3, "HIGH")]),
    ),
    (
        "alarm.active",
        FieldRule::boolean().role("indicator.alarm").read_only(),
    ),
    ("alarm.sensorid", PLAIN_VALUE),
    ("statistics.opencount", PLAIN_VALUE),
    ("statistics.calibration", PLAIN_VALUE),
    ("statistics.teach", PLAIN_VALUE),
    ("statistics.tilt", PLAIN_VALUE),
    ("statistics.turn", PLAIN_VALUE),
];

const VT_UPGRADE_PARAMS: Rules = &[
    ("fanpower", PERCENT_VALVE),
    ("maxfanpower", MAX_AIRFLOW),
    ("automode", FieldRule::boolean().role("switch.mode.auto")),
    ("airbase.temperature.indoor", TEMPERATURE),
    ("airbase.humidity.indoor", HUMIDITY),
    ("airquality.voc", PLAIN_VALUE.unit("VOC")),
    ("clock", FieldRule::EMPTY.ignored()),
    ("timer.activetimer", PLAIN_VALUE),
    (
        "timer.remainingtime",
        FieldRule::string().role("value").read_only(),
    ),
    (
        "timer.poweron_time",
        FieldRule::string().role("value").read_only(),
    ),
    ("list_timers", FieldRule::object().role("list").read_only()),
];

const DRIVE_CL_PARAMS: Rules = &[
    (
        "state",
        FieldRule::string()
            .role("text")
            .states(DRIVE_CL_STATES)
            .read_only(),
    ),
    ("silentmode", FieldRule::boolean().role("switch.mode.silent")),
    ("autolock", FieldRule::boolean().role("switch.lock")),
    ("holidaymode", FieldRule::boolean().role("switch.mode")),
    (
        "tiltfunction",
        FieldRule::number().role("level").range(1.0, 6.0),
    ),
    (
        "timer.duration",
        FieldRule::string()
            .role("value")
            .encoding(Encoding::TimeOfDay)
            .max_hour(4),
    ),
    (
        "timer.remainingtime",
        FieldRule::string().role("value").read_only(),
    ),
];

const AEROPLUS_PARAMS: Rules = &[
    ("fanpower", PERCENT_VALVE),
    ("fanmode", FieldRule::number().labels(FAN_MODES_WRG_AUTO)),
    ("maxfanpower", MAX_AIRFLOW),
    ("automode_maxairflow", PERCENT_VALVE),
    ("automode_co2sensity", PERCENT_LEVEL),
    ("airquality.co2content", CO2),
    ("airquality.voc", PLAIN_VALUE),
    ("clock", FieldRule::EMPTY.ignored()),
    ("timer.activetimer", READ_ONLY),
    ("timer.remainingtime", READ_ONLY),
    ("timer.poweron_time", READ_ONLY),
    ("list_timers", FieldRule::object().read_only()),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::rule::ValueType;

    #[test]
    fn test_resolve_layers_in_order() {
        let rule = resolve("getDeviceParams", DeviceType::Aerovital, "fanmode");

        assert_eq!(rule.read, Some(true));
        assert_eq!(rule.write, Some(true));
        assert_eq!(rule.value_type, Some(ValueType::Number));
        assert_eq!(rule.states, Some(FAN_MODES_WRG));
        assert_eq!(rule.encoding, Some(Encoding::Label));
    }

    #[test]
    fn test_resolve_by_type_overrides_by_name() {
        let common = resolve(
            "getDeviceParams",
            DeviceType::Aerovital,
            "airquality.voc",
        );
        assert_eq!(common.value_type, None);

        let vt_upgrade = resolve(
            "getDeviceParams",
            DeviceType::VtUpgrade,
            "airquality.voc",
        );
        assert_eq!(vt_upgrade.unit, Some("VOC"));
        assert_eq!(vt_upgrade.write, Some(false));
        assert_eq!(vt_upgrade.read, Some(true));
    }

    #[test]
    fn test_resolve_is_deterministic() {
        for device_type in crate::device_type::ALL_DEVICE_TYPES {
            for field in ["fanmode", "timer.duration", "clock", "warnings"] {
                let first = resolve("getDeviceParams", device_type, field);
                let second = resolve("getDeviceParams", device_type, field);
                assert_eq!(first, second);
            }
        }
    }

    #[test]
    fn test_resolve_unknown_command() {
        let rule = resolve("getDeviceDetails", DeviceType::Aeropac, "serialnr");
        assert_eq!(rule, FieldRule::EMPTY);
    }

    #[test]
    fn test_ignored_clock() {
        assert!(resolve("getDeviceParams", DeviceType::Aeropac, "clock").is_ignored());
        assert!(!resolve("getDeviceParams", DeviceType::Mhs, "clock").is_ignored());
    }

    #[test]
    fn test_device_active_rule() {
        for command in ["getDeviceState", "getDeviceParams"] {
            let rule = resolve(command, DeviceType::Aerovital, "devicestate.deviceactive");
            assert_eq!(rule.id, Some("active"));

            let rules = command_rules(command).unwrap();
            assert!(find(rules.by_name, "deviceactive").is_none());
        }
    }

    #[test]
    fn test_device_type_states() {
        assert_eq!(DEVICE_TYPE_STATES.len(), 14);
        assert_eq!(DEVICE_TYPE_STATES[4], (5, "AEROVITAL"));
    }
}
