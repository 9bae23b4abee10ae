// src/job/mod.rs
mod runner;
mod scheduler;

pub use runner::{HealthCheckJob, InvocationOutcome, ScheduleStatus};
pub use scheduler::Scheduler;
