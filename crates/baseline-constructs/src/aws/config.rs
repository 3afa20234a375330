//! AWS Config constructs: configuration recorder and delivery channel.
//!
//! Both are singletons per account and region; [`Stack::add_resource`]
//! refuses a second declaration of either.

use baseline_core::BaselineResult;
use baseline_template::resource_types::{CONFIG_DELIVERY_CHANNEL, CONFIG_RECORDER};
use baseline_template::{Resource, Value};
use typed_builder::TypedBuilder;

use crate::stack::Stack;

/// AWS Config service principal.
pub const CONFIG_SERVICE: &str = "config.amazonaws.com";

/// Recorder settings.
#[derive(Debug, Clone, TypedBuilder)]
pub struct RecorderProps {
    /// Role the recorder assumes to describe resources.
    #[builder(setter(into))]
    pub role_arn: Value,
    /// Record every supported resource type.
    #[builder(default = true)]
    pub all_supported: bool,
    /// Include global resources such as IAM users and roles.
    #[builder(default = true)]
    pub include_global_resource_types: bool,
    /// Explicit recorder name.
    #[builder(default, setter(strip_option, into))]
    pub name: Option<String>,
}

/// Handle to the declared configuration recorder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationRecorder {
    logical_id: String,
}

impl ConfigurationRecorder {
    /// Declare the configuration recorder.
    pub fn new(stack: &mut Stack, logical_id: &str, props: RecorderProps) -> BaselineResult<Self> {
        let mut resource = Resource::new(CONFIG_RECORDER)
            .with_property("RoleARN", props.role_arn)
            .with_property(
                "RecordingGroup",
                Value::map([
                    ("AllSupported", Value::from(props.all_supported)),
                    (
                        "IncludeGlobalResourceTypes",
                        Value::from(props.include_global_resource_types),
                    ),
                ]),
            );
        if let Some(name) = &props.name {
            resource.set_property("Name", name.as_str());
        }
        stack.add_resource(logical_id, resource)?;

        Ok(Self {
            logical_id: logical_id.to_owned(),
        })
    }

    /// Logical ID of the recorder.
    #[must_use]
    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }
}

/// Delivery channel settings.
#[derive(Debug, Clone, TypedBuilder)]
pub struct DeliveryChannelProps {
    /// Bucket receiving snapshots and history files.
    #[builder(setter(into))]
    pub s3_bucket_name: Value,
    /// Key prefix inside the bucket.
    #[builder(default, setter(strip_option, into))]
    pub s3_key_prefix: Option<String>,
    /// Explicit channel name.
    #[builder(default, setter(strip_option, into))]
    pub name: Option<String>,
}

/// Handle to the declared delivery channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryChannel {
    logical_id: String,
}

impl DeliveryChannel {
    /// Declare the delivery channel.
    pub fn new(
        stack: &mut Stack,
        logical_id: &str,
        props: DeliveryChannelProps,
    ) -> BaselineResult<Self> {
        let mut resource = Resource::new(CONFIG_DELIVERY_CHANNEL)
            .with_property("S3BucketName", props.s3_bucket_name);
        if let Some(prefix) = &props.s3_key_prefix {
            resource.set_property("S3KeyPrefix", prefix.as_str());
        }
        if let Some(name) = &props.name {
            resource.set_property("Name", name.as_str());
        }
        stack.add_resource(logical_id, resource)?;

        Ok(Self {
            logical_id: logical_id.to_owned(),
        })
    }

    /// Logical ID of the channel.
    #[must_use]
    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }
}
