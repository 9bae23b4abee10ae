// src/health/mod.rs
mod checker;
mod result;

pub use checker::HealthProbe;
pub use result::{CheckResult, ProbeError};
