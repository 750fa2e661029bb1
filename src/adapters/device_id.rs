//! Device identity derived from the ESP32 factory MAC address.
//!
//! The chip id is the upper half of the eFuse MAC read as a little-endian
//! integer (`efuse_mac >> 24`, truncated to 32 bits), printed as lowercase
//! hex without padding.  It is:
//! - Deterministic across reboots (factory-burned eFuse MAC)
//! - Served as the Device Information serial number
//! - Appended to the device name in the boot log (`XFit_fecaef`)

use core::fmt::Write;

/// Chip id string: at most 8 hex digits.
pub type ChipIdString = heapless::String<8>;

/// Full device name: `<name>_<chipid>`.
pub type FullNameString = heapless::String<48>;

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    // SAFETY: writes exactly six bytes into `mac`.
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE]
}

/// Numeric chip id: bytes 3..6 of the MAC, little-endian.
pub fn chip_id_value(mac: &MacAddress) -> u32 {
    u32::from(mac[3]) | u32::from(mac[4]) << 8 | u32::from(mac[5]) << 16
}

/// Chip id as lowercase unpadded hex (e.g. `fecaef`).
pub fn chip_id(mac: &MacAddress) -> ChipIdString {
    let mut id = ChipIdString::new();
    let _ = write!(id, "{:x}", chip_id_value(mac));
    id
}

/// `<name>_<chipid>`, truncated to capacity.
pub fn full_name(name: &str, mac: &MacAddress) -> FullNameString {
    let mut full = FullNameString::new();
    let _ = write!(full, "{}_{}", name, chip_id(mac));
    full
}
