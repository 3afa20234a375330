//! CloudTrail trail construct.
//!
//! Declaring a trail also grants CloudTrail write access to the target
//! bucket and, when logs are sent to CloudWatch, creates the role CloudTrail
//! assumes to deliver them.

use baseline_core::{BaselineError, BaselineResult};
use baseline_template::resource_types::CLOUDTRAIL_TRAIL;
use baseline_template::{PolicyStatement, Principal, Resource, Value};
use tracing::debug;
use typed_builder::TypedBuilder;

use crate::aws::iam::{Role, RoleProps};
use crate::aws::kms::Key;
use crate::aws::logs::LogGroup;
use crate::aws::s3::Bucket;
use crate::stack::Stack;

/// CloudTrail service principal.
pub const CLOUDTRAIL_SERVICE: &str = "cloudtrail.amazonaws.com";

/// Trail settings.
#[derive(Debug, Clone, TypedBuilder)]
pub struct TrailProps<'a> {
    /// Bucket receiving log files.
    pub bucket: &'a Bucket,
    /// Write digest files for log integrity validation.
    #[builder(default = true)]
    pub enable_file_validation: bool,
    /// Record events from global services such as IAM.
    #[builder(default = true)]
    pub include_global_service_events: bool,
    /// Record events from every region.
    #[builder(default = true)]
    pub is_multi_region_trail: bool,
    /// Key encrypting the log files.
    #[builder(default, setter(strip_option))]
    pub encryption_key: Option<&'a Key>,
    /// Log group receiving events when `send_to_cloud_watch_logs` is set.
    #[builder(default, setter(strip_option))]
    pub cloud_watch_log_group: Option<&'a LogGroup>,
    /// Also deliver events to CloudWatch Logs.
    #[builder(default = false)]
    pub send_to_cloud_watch_logs: bool,
}

/// Handle to a declared trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trail {
    logical_id: String,
    logs_role: Option<Role>,
}

impl Trail {
    /// Declare a trail.
    ///
    /// # Errors
    /// Fails when `send_to_cloud_watch_logs` is set without a log group.
    pub fn new(
        stack: &mut Stack,
        logical_id: &str,
        props: TrailProps<'_>,
    ) -> BaselineResult<Self> {
        let bucket = props.bucket;
        let log_group = if props.send_to_cloud_watch_logs {
            Some(props.cloud_watch_log_group.ok_or_else(|| {
                BaselineError::Config(format!(
                    "trail {logical_id} sends to CloudWatch Logs but has no log group"
                ))
            })?)
        } else {
            None
        };

        bucket.add_to_resource_policy(
            stack,
            PolicyStatement::allow()
                .with_action("s3:GetBucketAcl")
                .with_principal(Principal::service(CLOUDTRAIL_SERVICE))
                .with_resource(bucket.arn()),
        )?;
        bucket.add_to_resource_policy(
            stack,
            PolicyStatement::allow()
                .with_action("s3:PutObject")
                .with_principal(Principal::service(CLOUDTRAIL_SERVICE))
                .with_resource(bucket.arn_for_objects(Value::concat([
                    "AWSLogs/".into(),
                    stack.account(),
                    "/*".into(),
                ])))
                .with_condition("StringEquals", "s3:x-amz-acl", "bucket-owner-full-control"),
        )?;

        let mut resource = Resource::new(CLOUDTRAIL_TRAIL)
            .with_property("IsLogging", true)
            .with_property("S3BucketName", bucket.bucket_name())
            .with_property("EnableLogFileValidation", props.enable_file_validation)
            .with_property(
                "IncludeGlobalServiceEvents",
                props.include_global_service_events,
            )
            .with_property("IsMultiRegionTrail", props.is_multi_region_trail)
            .with_dependency(bucket.policy_id());

        if let Some(key) = props.encryption_key {
            resource.set_property("KMSKeyId", key.arn());
        }

        let logs_role = if let Some(log_group) = log_group {
            let role = Role::new(
                stack,
                &format!("{logical_id}LogsRole"),
                RoleProps::builder()
                    .assumed_by(Principal::service(CLOUDTRAIL_SERVICE))
                    .build(),
            )?;
            role.add_to_policy(
                stack,
                PolicyStatement::allow()
                    .with_actions(["logs:PutLogEvents", "logs:CreateLogStream"])
                    .with_resource(log_group.arn()),
            )?;

            resource.set_property("CloudWatchLogsLogGroupArn", log_group.arn());
            resource.set_property("CloudWatchLogsRoleArn", role.arn());
            resource.add_dependency(role.logical_id());
            resource.add_dependency(role.default_policy_id());
            Some(role)
        } else {
            None
        };

        stack.add_resource(logical_id, resource)?;
        debug!(
            logical_id,
            cloud_watch_logs = logs_role.is_some(),
            "declared trail"
        );

        Ok(Self {
            logical_id: logical_id.to_owned(),
            logs_role,
        })
    }

    /// Logical ID of the trail.
    #[must_use]
    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    /// The trail ARN.
    #[must_use]
    pub fn arn(&self) -> Value {
        Value::get_att(&self.logical_id, "Arn")
    }

    /// Role used to deliver events to CloudWatch Logs, if any.
    #[must_use]
    pub fn logs_role(&self) -> Option<&Role> {
        self.logs_role.as_ref()
    }
}
