//! Configuration models for the scheduler, pipeline and telemetry.

pub mod scheduler;

pub use scheduler::SchedulerConfig;
