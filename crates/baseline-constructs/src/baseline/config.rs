//! AWS Config recording: role, recorder, bucket and delivery channel.

use baseline_core::BaselineResult;
use baseline_template::{PolicyStatement, Principal, Value};
use tracing::info;
use typed_builder::TypedBuilder;

use crate::aws::config::{
    CONFIG_SERVICE, ConfigurationRecorder, DeliveryChannel, DeliveryChannelProps, RecorderProps,
};
use crate::aws::iam::{ManagedPolicy, Role, RoleProps};
use crate::aws::s3::{Bucket, BucketProps};
use crate::baseline::cloudtrail::DEFAULT_EXPIRATION_DAYS;
use crate::stack::Stack;

/// AWS managed policy granting Config read access to resource configuration.
const CONFIG_MANAGED_POLICY: &str = "service-role/AWS_ConfigRole";

/// Settings for [`ConfigResources`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct ConfigProps {
    /// Name of the bucket receiving configuration snapshots and history.
    #[builder(setter(into))]
    pub bucket_name: String,
    /// Object expiration for the bucket.
    #[builder(default = DEFAULT_EXPIRATION_DAYS)]
    pub expiration_days: u32,
}

/// The AWS Config half of the account baseline.
#[derive(Debug, Clone)]
pub struct ConfigResources {
    /// Role assumed by the recorder.
    pub role: Role,
    /// The configuration recorder.
    pub recorder: ConfigurationRecorder,
    /// Bucket receiving configuration items.
    pub bucket: Bucket,
    /// Channel delivering to the bucket.
    pub delivery_channel: DeliveryChannel,
}

impl ConfigResources {
    /// Declare the Config resources into `stack`.
    ///
    /// # Errors
    /// Fails on an invalid bucket name, a taken logical ID, or when the stack
    /// already holds a configuration recorder or delivery channel.
    pub fn new(stack: &mut Stack, props: &ConfigProps) -> BaselineResult<Self> {
        let role = Role::new(
            stack,
            "ConfigRole",
            RoleProps::builder()
                .assumed_by(Principal::service(CONFIG_SERVICE))
                .managed_policies(vec![ManagedPolicy::from_aws_managed_policy_name(
                    CONFIG_MANAGED_POLICY,
                )])
                .build(),
        )?;

        let recorder = ConfigurationRecorder::new(
            stack,
            "ConfigRecorder",
            RecorderProps::builder().role_arn(role.arn()).build(),
        )?;

        let bucket = Bucket::new(
            stack,
            "ConfigBucket",
            BucketProps::builder()
                .bucket_name(props.bucket_name.as_str())
                .expiration_days(props.expiration_days)
                .build(),
        )?;
        bucket.deny_object_deletion(stack)?;

        bucket.add_to_resource_policy(
            stack,
            PolicyStatement::allow()
                .with_action("s3:GetBucketAcl")
                .with_principal(role.principal())
                .with_resource(bucket.arn()),
        )?;
        bucket.add_to_resource_policy(
            stack,
            PolicyStatement::allow()
                .with_action("s3:PutObject")
                .with_principal(role.principal())
                .with_resource(bucket.arn_for_objects(Value::concat([
                    "AWSLogs/".into(),
                    stack.account(),
                    "/Config/*".into(),
                ])))
                .with_condition("StringEquals", "s3:x-amz-acl", "bucket-owner-full-control"),
        )?;

        let delivery_channel = DeliveryChannel::new(
            stack,
            "ConfigDeliveryChannel",
            DeliveryChannelProps::builder()
                .s3_bucket_name(bucket.bucket_name())
                .build(),
        )?;
        // Config checks bucket access and needs a recorder when the channel is created.
        stack.add_dependency(delivery_channel.logical_id(), &bucket.policy_id())?;
        stack.add_dependency(delivery_channel.logical_id(), recorder.logical_id())?;

        info!(bucket = %props.bucket_name, "declared Config resources");

        Ok(Self {
            role,
            recorder,
            bucket,
            delivery_channel,
        })
    }
}
