//! GATT profile: services, characteristics, UUIDs and access flags.
//!
//! Pure data.  The BLE adapter walks this table to register attributes;
//! the application core only refers to characteristics by [`Characteristic`].
//!
//! | Service / characteristic | UUID                                   | Access       |
//! |--------------------------|----------------------------------------|--------------|
//! | Device Information       | `0x180A`                               |              |
//! |   Manufacturer           | `0x2A29`                               | Read         |
//! |   Model / name           | `0x2A24`                               | Read         |
//! |   Serial                 | `0x2A25`                               | Read         |
//! | Blinker                  | `9a8ca9ef-…-c37a3d7dc12d`              |              |
//! |   Blink                  | `e94f85c8-…-2b56e107ed60`              | Read+Write+Notify |
//! |   Speed                  | `a8985fda-…-71cf52abba1e`              | Read+Write   |
//! | Sniffer                  | `ef66ccad-…-bc2a2c9fdaa6`              |              |
//! |   Status                 | `5b7dd565-…-f4ac85df74ca`              | Read+Write+Notify |
//! |   Speed                  | `c8fb3a51-…-a7598c1bf2ea`              | Read+Write+Notify |
//! |   Voltage                | `d8b2c95b-…-ccfd3d85a666`              | Read+Notify  |
//! |   Timestamp              | `7127a1b2-…-5a9e38f6a040`              | Read+Notify  |

use core::fmt;
use core::ops::BitOr;

// ───────────────────────────────────────────────────────────────
// UUIDs
// ───────────────────────────────────────────────────────────────

pub const SERVICE_DEVINFO: u16 = 0x180a;
pub const DEVINFO_MANUFACTURER: u16 = 0x2a29;
pub const DEVINFO_MODEL: u16 = 0x2a24;
pub const DEVINFO_SERIAL: u16 = 0x2a25;

pub const SERVICE_BLINKER: u128 = 0x9a8ca9ef_e43f_4157_9fee_c37a3d7dc12d;
pub const BLINKER_BLINK: u128 = 0xe94f85c8_7f57_4dbd_b8d3_2b56e107ed60;
pub const BLINKER_SPEED: u128 = 0xa8985fda_51aa_4f19_a777_71cf52abba1e;

pub const SERVICE_SNIFFER: u128 = 0xef66ccad_f4a8_4c51_b025_bc2a2c9fdaa6;
pub const SNIFFER_STATUS: u128 = 0x5b7dd565_6e90_4df8_b806_f4ac85df74ca;
pub const SNIFFER_SPEED: u128 = 0xc8fb3a51_d44c_4d9f_a8ec_a7598c1bf2ea;
pub const SNIFFER_VOLTAGE: u128 = 0xd8b2c95b_b317_47ca_ac02_ccfd3d85a666;
pub const SNIFFER_TIMESTAMP: u128 = 0x7127a1b2_ed4d_433a_9780_5a9e38f6a040;

/// Client Characteristic Configuration descriptor.
pub const DESCRIPTOR_CCCD: u16 = 0x2902;

/// Largest value any characteristic in this profile carries.
pub const MAX_VALUE_LEN: usize = 32;

/// Backing storage for one characteristic value.
pub type CharValue = heapless::Vec<u8, MAX_VALUE_LEN>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Uuid {
    /// SIG-assigned 16-bit UUID.
    Short(u16),
    /// Vendor 128-bit UUID.
    Long(u128),
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Short(u) => write!(f, "{u:#06x}"),
            Self::Long(u) => write!(
                f,
                "{:08x}-{:04x}-{:04x}-{:04x}-{:012x}",
                (u >> 96) as u32,
                (u >> 80) as u16,
                (u >> 64) as u16,
                (u >> 48) as u16,
                u & 0xffff_ffff_ffff
            ),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Access flags
// ───────────────────────────────────────────────────────────────

/// Characteristic property bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access(u8);

impl Access {
    pub const READ: Self = Self(0b001);
    pub const WRITE: Self = Self(0b010);
    pub const NOTIFY: Self = Self(0b100);

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn readable(self) -> bool {
        self.contains(Self::READ)
    }

    pub const fn writable(self) -> bool {
        self.contains(Self::WRITE)
    }

    pub const fn notifies(self) -> bool {
        self.contains(Self::NOTIFY)
    }
}

impl BitOr for Access {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

// ───────────────────────────────────────────────────────────────
// Characteristics
// ───────────────────────────────────────────────────────────────

/// Every characteristic the peripheral exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Characteristic {
    Manufacturer = 0,
    ModelName = 1,
    SerialNumber = 2,
    BlinkerBlink = 3,
    BlinkerSpeed = 4,
    SnifferStatus = 5,
    SnifferSpeed = 6,
    SnifferVoltage = 7,
    SnifferTimestamp = 8,
}

impl Characteristic {
    pub const COUNT: usize = 9;

    pub const ALL: [Self; Self::COUNT] = [
        Self::Manufacturer,
        Self::ModelName,
        Self::SerialNumber,
        Self::BlinkerBlink,
        Self::BlinkerSpeed,
        Self::SnifferStatus,
        Self::SnifferSpeed,
        Self::SnifferVoltage,
        Self::SnifferTimestamp,
    ];

    /// Dense index, usable for per-characteristic tables.
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn uuid(self) -> Uuid {
        match self {
            Self::Manufacturer => Uuid::Short(DEVINFO_MANUFACTURER),
            Self::ModelName => Uuid::Short(DEVINFO_MODEL),
            Self::SerialNumber => Uuid::Short(DEVINFO_SERIAL),
            Self::BlinkerBlink => Uuid::Long(BLINKER_BLINK),
            Self::BlinkerSpeed => Uuid::Long(BLINKER_SPEED),
            Self::SnifferStatus => Uuid::Long(SNIFFER_STATUS),
            Self::SnifferSpeed => Uuid::Long(SNIFFER_SPEED),
            Self::SnifferVoltage => Uuid::Long(SNIFFER_VOLTAGE),
            Self::SnifferTimestamp => Uuid::Long(SNIFFER_TIMESTAMP),
        }
    }

    pub fn access(self) -> Access {
        match self {
            Self::Manufacturer | Self::ModelName | Self::SerialNumber => Access::READ,
            Self::BlinkerBlink | Self::SnifferStatus | Self::SnifferSpeed => {
                Access::READ | Access::WRITE | Access::NOTIFY
            }
            Self::BlinkerSpeed => Access::READ | Access::WRITE,
            Self::SnifferVoltage | Self::SnifferTimestamp => Access::READ | Access::NOTIFY,
        }
    }

    pub const fn service(self) -> Service {
        match self {
            Self::Manufacturer | Self::ModelName | Self::SerialNumber => Service::DeviceInfo,
            Self::BlinkerBlink | Self::BlinkerSpeed => Service::Blinker,
            Self::SnifferStatus
            | Self::SnifferSpeed
            | Self::SnifferVoltage
            | Self::SnifferTimestamp => Service::Sniffer,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Manufacturer => "manufacturer",
            Self::ModelName => "model",
            Self::SerialNumber => "serial",
            Self::BlinkerBlink => "blinker.blink",
            Self::BlinkerSpeed => "blinker.speed",
            Self::SnifferStatus => "sniffer.status",
            Self::SnifferSpeed => "sniffer.speed",
            Self::SnifferVoltage => "sniffer.voltage",
            Self::SnifferTimestamp => "sniffer.timestamp",
        }
    }
}

impl fmt::Display for Characteristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ───────────────────────────────────────────────────────────────
// Services
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    DeviceInfo,
    Blinker,
    Sniffer,
}

impl Service {
    /// Registration order.
    pub const ALL: [Self; 3] = [Self::DeviceInfo, Self::Blinker, Self::Sniffer];

    pub const fn uuid(self) -> Uuid {
        match self {
            Self::DeviceInfo => Uuid::Short(SERVICE_DEVINFO),
            Self::Blinker => Uuid::Long(SERVICE_BLINKER),
            Self::Sniffer => Uuid::Long(SERVICE_SNIFFER),
        }
    }

    pub const fn characteristics(self) -> &'static [Characteristic] {
        match self {
            Self::DeviceInfo => &[
                Characteristic::Manufacturer,
                Characteristic::ModelName,
                Characteristic::SerialNumber,
            ],
            Self::Blinker => &[Characteristic::BlinkerBlink, Characteristic::BlinkerSpeed],
            Self::Sniffer => &[
                Characteristic::SnifferStatus,
                Characteristic::SnifferSpeed,
                Characteristic::SnifferVoltage,
                Characteristic::SnifferTimestamp,
            ],
        }
    }

    /// Attribute handles the service needs: declaration, plus declaration
    /// and value per characteristic, plus one CCCD per notifying one.
    pub fn handle_count(self) -> u16 {
        self.characteristics()
            .iter()
            .map(|c| if c.access().notifies() { 3 } else { 2 })
            .sum::<u16>()
            + 1
    }
}
