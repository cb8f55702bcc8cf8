pub mod batch;
/// Tick counter over a fixed horizon.
pub mod clock;
pub mod collector;
pub mod engine;
pub mod kpi;
/// Desired charging power policies.
pub mod policy;
pub mod station;
pub mod types;
