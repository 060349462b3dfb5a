//! Process orchestration: descriptor ownership, forking and reaping.

pub mod fd;
pub mod job;
pub mod pipeline;

pub use job::{Job, JobReport, StageStatus};
pub use pipeline::{LaunchError, Launched, launch};
