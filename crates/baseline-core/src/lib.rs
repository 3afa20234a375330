//! Core types, configuration, and errors for Baseline.
//!
//! This crate provides the foundational building blocks shared by the
//! template model, the resource constructs, and the `baseline-synth`
//! binary: the deployment environment (account and region), the stack
//! configuration loaded from the environment, and the common error type.

mod config;
mod error;
mod types;

pub use config::{
    AlarmConfig, AlarmThresholds, BaselineConfig, LogConfig, LogFormat, MAX_STACK_NAME_LEN,
    validate_stack_name,
};
pub use error::{BaselineError, BaselineResult};
pub use types::{AccountId, AwsRegion, Environment};
