//! Error types for Baseline.

/// Error raised while configuring or synthesizing a stack.
///
/// Deployment-time failures (name collisions, quota limits, IAM conflicts)
/// belong to CloudFormation and never show up here.
#[derive(Debug, thiserror::Error)]
pub enum BaselineError {
    /// Invalid AWS account ID format.
    #[error("invalid AWS account ID: {0} (must be 12-digit numeric string)")]
    InvalidAccountId(String),

    /// A required configuration value was not supplied.
    #[error("missing required configuration: {variable}")]
    MissingConfig {
        /// The environment variable (or field) that was missing.
        variable: String,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A bucket name violates the S3 naming rules.
    #[error("invalid bucket name {name:?}: {reason}")]
    InvalidBucketName {
        /// The offending bucket name.
        name: String,
        /// Which rule was violated.
        reason: String,
    },

    /// Two resources were declared with the same logical ID.
    #[error("duplicate logical ID in stack: {id}")]
    DuplicateLogicalId {
        /// The logical ID declared twice.
        id: String,
    },

    /// A per-account/region singleton resource was declared twice.
    #[error("only one {resource_type} may be declared per stack (already declared as {existing})")]
    SingletonViolation {
        /// CloudFormation resource type, e.g. `AWS::Config::DeliveryChannel`.
        resource_type: String,
        /// Logical ID of the resource already declared.
        existing: String,
    },

    /// A construct referenced a resource that is not in the stack.
    #[error("unknown resource: {id}")]
    UnknownResource {
        /// The logical ID that could not be found.
        id: String,
    },

    /// Template serialization failed.
    #[error("failed to serialize template: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience result type for Baseline operations.
pub type BaselineResult<T> = Result<T, BaselineError>;
