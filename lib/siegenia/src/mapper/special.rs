use super::rule::{Encoding, FieldRule, States};
use super::table::{DRIVE_CL_POSITIONS, FAN_MODES_WRG_AUTO};
use crate::DeviceType;

// Controls that no reply reports but the device accepts in setDeviceParams.

const SASH_POSITIONS: States = &[
    (1, "OPEN"),
    (2, "GAP_VENT"),
    (3, "STOP_OVER"),
    (4, "CLOSE"),
    (5, "CLOSE_WO_LOCK"),
];

const STOP: FieldRule = FieldRule::boolean()
    .access(false, true)
    .role("button.stop");

const TIMER_FANPOWER: FieldRule = FieldRule::number()
    .access(false, true)
    .role("level")
    .unit("%")
    .range(0.0, 100.0);

const TIMER_FANMODE: FieldRule = FieldRule::number()
    .access(false, true)
    .role("level")
    .labels(FAN_MODES_WRG_AUTO);

const DRIVE_AXXENT: &[(&str, FieldRule)] = &[
    (
        "openclose",
        FieldRule::number()
            .access(false, true)
            .role("level")
            .labels(&[(1, "OPEN"), (2, "CLOSE"), (3, "OPEN_TO_TURN")]),
    ),
    ("stop", STOP),
];

const AEROVITAL: &[(&str, FieldRule)] = &[
    ("timer.fanpower", TIMER_FANPOWER),
    ("timer.fanmode", TIMER_FANMODE),
];

const MHS: &[(&str, FieldRule)] = &[
    (
        "sash-0.openclose",
        FieldRule::number()
            .access(false, true)
            .role("level")
            .labels(SASH_POSITIONS)
            .real_id("openclose.0"),
    ),
    (
        "sash-1.openclose",
        FieldRule::number()
            .access(false, true)
            .role("level")
            .labels(SASH_POSITIONS)
            .real_id("openclose.1"),
    ),
    ("sash-0.stop", STOP.real_id("stop.0")),
    ("sash-1.stop", STOP.real_id("stop.1")),
];

const AEROTUBE: &[(&str, FieldRule)] = &[
    ("timer.fanpower", TIMER_FANPOWER),
    ("timer.fanmode", TIMER_FANMODE),
    (
        "timer.duration",
        FieldRule::mixed()
            .role("state")
            .encoding(Encoding::TimeOfDay)
            .max_hour(18),
    ),
];

const VT_UPGRADE: &[(&str, FieldRule)] = &[
    ("timer.fanpower", TIMER_FANPOWER),
    (
        "timer.duration",
        FieldRule::string()
            .access(false, true)
            .role("value")
            .encoding(Encoding::TimeOfDay)
            .max_hour(24),
    ),
];

const DRIVE_CL: &[(&str, FieldRule)] = &[
    (
        "openclose",
        FieldRule::number()
            .access(false, true)
            .role("level")
            .labels(DRIVE_CL_POSITIONS),
    ),
    ("stop", STOP),
];

pub static SPECIAL_OBJECTS: &[(DeviceType, &[(&str, FieldRule)])] = &[
    (DeviceType::DriveAxxent, DRIVE_AXXENT),
    (DeviceType::Aerovital, AEROVITAL),
    (DeviceType::Mhs, MHS),
    (DeviceType::Aerotube, AEROTUBE),
    (DeviceType::VtUpgrade, VT_UPGRADE),
    (DeviceType::DriveCl, DRIVE_CL),
];

pub fn special_rules(device_type: DeviceType) -> Option<&'static [(&'static str, FieldRule)]> {
    SPECIAL_OBJECTS
        .iter()
        .find_map(|(candidate, rules)| (*candidate == device_type).then_some(*rules))
}
