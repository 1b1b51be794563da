//! Cross-component scenarios: units calling units, subscribers wiring
//! listeners, bootstrap outcomes.

#[cfg(test)]
pub mod fixtures;
pub mod subscribers;
pub mod units;
