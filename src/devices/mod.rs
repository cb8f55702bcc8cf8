//! Station components: chargers, the flexibility battery, and vehicles.

/// Peak-shaving stationary battery.
pub mod battery;
/// Shared charging point bookkeeping.
pub mod charger;
pub mod types;
/// Vehicle agent and charger matching.
pub mod vehicle;

pub use battery::FlexBattery;
pub use charger::Charger;
pub use types::{BreakType, ChargeOutcome, TickContext, VehicleCategory, VehicleState};
pub use vehicle::{Vehicle, VehicleSpec};
