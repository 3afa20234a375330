//! CloudFormation template model for Baseline.
//!
//! The model is deliberately small: a [`Value`] tree that knows how to
//! render the handful of intrinsic functions constructs need, typed IAM
//! [`PolicyDocument`]s, [`Resource`] declarations, and the [`Template`]
//! that owns them.
//!
//! Every map in the model is a `BTreeMap`, so serializing the same template
//! twice always produces byte-identical JSON.
//!
//! # Architecture
//!
//! ```text
//! constructs (bucket, key, trail, ...)
//!        |
//!        v
//!   Resource { Type, Properties: Value, DependsOn, DeletionPolicy }
//!        |
//!        v
//!   Template { Resources, Outputs } --serde_json--> template.json
//! ```

pub mod policy;
pub mod resource;
pub mod template;
pub mod value;

pub use policy::{Effect, PolicyDocument, PolicyStatement, Principal};
pub use resource::{RemovalPolicy, Resource, resource_types};
pub use template::{Output, Template};
pub use value::{Value, pseudo};
