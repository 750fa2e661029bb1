//! Application core — pure domain logic, zero I/O.
//!
//! The two timed actuators, the write gateway that turns client writes
//! into controller calls, and the service that ties them to the
//! scheduler.  All interaction with hardware happens through **port
//! traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod actuator;
pub mod events;
pub mod gateway;
pub mod ports;
pub mod service;
