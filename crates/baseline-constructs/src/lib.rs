//! Account-baseline constructs for Baseline.
//!
//! Constructs declare resources into a [`Stack`] and hand back lightweight
//! handles (logical IDs) that other constructs reference through `Ref` and
//! `Fn::GetAtt`. Nothing is deployed here: [`Stack::synth`] produces a
//! [`baseline_template::Template`] and CloudFormation does the rest.
//!
//! # Architecture
//!
//! ```text
//! BaselineStack
//!   |-- CloudTrailResources  (access-log bucket, trail bucket, key, log group, trail)
//!   |-- ConfigResources      (role, recorder, bucket, delivery channel)
//!   `-- CloudTrailAlarms     (opt-in metric filters + alarms)
//!          |
//!          v
//!   aws::{s3, kms, logs, iam, cloudtrail, config, cloudwatch}
//!          |
//!          v
//!        Stack --synth--> Template
//! ```

pub mod aws;
pub mod baseline;
pub mod stack;
pub mod validation;

pub use baseline::{
    BaselineStack, CloudTrailAlarms, CloudTrailProps, CloudTrailResources, ConfigProps,
    ConfigResources,
};
pub use stack::Stack;
