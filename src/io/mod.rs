/// CSV export of run records.
pub mod export;
