//! Discrete-time simulation of an EV charging station with an optional
//! peak-shaving battery.

#[cfg(feature = "api")]
pub mod api;
pub mod config;
/// Chargers, the flexibility battery, and vehicles.
pub mod devices;
pub mod io;
pub mod logging;
pub mod sampling;
/// Station orchestration, run driver, statistics, and batch runs.
pub mod sim;
