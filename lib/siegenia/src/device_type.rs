use std::fmt;

use serde_repr::{Deserialize_repr, Serialize_repr};

#[derive(Copy, Clone, Debug, Deserialize_repr, Serialize_repr, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DeviceType {
    Aeropac = 1,
    AeromatVt = 2,
    DriveAxxent = 3,
    Sensoair = 4,
    Aerovital = 5,
    Mhs = 6,
    Acs = 7,
    Aerotube = 8,
    /// Obsolete, GENIUS B is controlled by the Universal Module now.
    GeniusB = 9,
    UniversalModule = 10,
    EnOceanConverter = 11,
    VtUpgrade = 12,
    DriveCl = 13,
    Aeroplus = 14,
}

pub const ALL_DEVICE_TYPES: [DeviceType; 14] = [
    DeviceType::Aeropac,
    DeviceType::AeromatVt,
    DeviceType::DriveAxxent,
    DeviceType::Sensoair,
    DeviceType::Aerovital,
    DeviceType::Mhs,
    DeviceType::Acs,
    DeviceType::Aerotube,
    DeviceType::GeniusB,
    DeviceType::UniversalModule,
    DeviceType::EnOceanConverter,
    DeviceType::VtUpgrade,
    DeviceType::DriveCl,
    DeviceType::Aeroplus,
];

impl DeviceType {
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn family_name(self) -> &'static str {
        match self {
            Self::Aeropac => "AEROPAC",
            Self::AeromatVt => "AEROMAT VT",
            Self::DriveAxxent => "DRIVE axxent Family",
            Self::Sensoair => "SENSOAIR",
            Self::Aerovital => "AEROVITAL",
            Self::Mhs => "MHS Family",
            Self::Acs => "ACS",
            Self::Aerotube => "AEROTUBE",
            Self::GeniusB => "GENIUS B",
            Self::UniversalModule => "Universal Module",
            Self::EnOceanConverter => "enOcean Converter Module",
            Self::VtUpgrade => "VT Upgrade",
            Self::DriveCl => "DRIVE CL",
            Self::Aeroplus => "AEROPLUS",
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct UnknownDeviceType(pub u64);

impl fmt::Display for UnknownDeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown device type {}", self.0)
    }
}

impl std::error::Error for UnknownDeviceType {}

impl TryFrom<u64> for DeviceType {
    type Error = UnknownDeviceType;

    fn try_from(code: u64) -> Result<Self, UnknownDeviceType> {
        ALL_DEVICE_TYPES
            .into_iter()
            .find(|device_type| u64::from(device_type.code()) == code)
            .ok_or(UnknownDeviceType(code))
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.family_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_type_codes() {
        assert_eq!(DeviceType::try_from(1), Ok(DeviceType::Aeropac));
        assert_eq!(DeviceType::try_from(5), Ok(DeviceType::Aerovital));
        assert_eq!(DeviceType::try_from(14), Ok(DeviceType::Aeroplus));
        assert_eq!(DeviceType::try_from(0), Err(UnknownDeviceType(0)));
        assert_eq!(DeviceType::try_from(15), Err(UnknownDeviceType(15)));

        for device_type in ALL_DEVICE_TYPES {
            let code = u64::from(device_type.code());
            assert_eq!(DeviceType::try_from(code), Ok(device_type));
        }
    }

    #[test]
    fn test_device_type_from_json() {
        let device_type: DeviceType = serde_json::from_str("6").unwrap();
        assert_eq!(device_type, DeviceType::Mhs);
        assert_eq!(device_type.to_string(), "MHS Family");

        assert!(serde_json::from_str::<DeviceType>("42").is_err());
    }
}
