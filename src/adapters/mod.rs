//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements   | Connects to                 |
//! |-------------|--------------|-----------------------------|
//! | `ble`       | GattPort     | Bluedroid GATT server       |
//! | `hardware`  | OutputPin    | ESP32 GPIO                  |
//! |             | InputPin     | ESP32 GPIO                  |
//! |             | AnalogInput  | ESP32 ADC1                  |
//! | `log_sink`  | EventSink    | Serial log output           |
//! | `time`      |              | ESP32 system timer          |
//! | `device_id` |              | eFuse factory MAC           |

pub mod ble;
pub mod device_id;
pub mod hardware;
pub mod log_sink;
pub mod time;
