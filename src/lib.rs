// src/lib.rs
pub mod config;
pub mod health;
pub mod job;
pub mod notifier;
pub mod secrets;
