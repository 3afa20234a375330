//! Resource constructs, one module per AWS service.

pub mod cloudtrail;
pub mod cloudwatch;
pub mod config;
pub mod iam;
pub mod kms;
pub mod logs;
pub mod s3;
