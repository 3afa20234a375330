//! CloudTrail audit logging: buckets, key, log group and the trail itself.

use baseline_core::BaselineResult;
use baseline_template::{Output, PolicyStatement, Principal, Value, pseudo};
use tracing::info;
use typed_builder::TypedBuilder;

use crate::aws::cloudtrail::{CLOUDTRAIL_SERVICE, Trail, TrailProps};
use crate::aws::kms::{Key, KeyProps};
use crate::aws::logs::{LogGroup, LogGroupProps, RetentionDays};
use crate::aws::s3::{AccessLogDestination, Bucket, BucketAccessControl, BucketProps};
use crate::stack::Stack;

/// CloudWatch Logs service principal.
const LOGS_SERVICE: &str = "logs.amazonaws.com";

/// Encryption context key CloudTrail sets on data keys.
const CLOUDTRAIL_CONTEXT_KEY: &str = "kms:EncryptionContext:aws:cloudtrail:arn";

/// Encryption context key CloudWatch Logs sets on data keys.
const LOGS_CONTEXT_KEY: &str = "kms:EncryptionContext:aws:logs:arn";

/// Five years.
pub const DEFAULT_EXPIRATION_DAYS: u32 = 1825;

/// Prefix of the trail bucket's server access logs.
pub const DEFAULT_ACCESS_LOG_PREFIX: &str = "cloudtraillogs";

/// Settings for [`CloudTrailResources`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct CloudTrailProps {
    /// Name of the bucket receiving the trail bucket's access logs.
    #[builder(setter(into))]
    pub server_access_log_bucket_name: String,
    /// Name of the bucket receiving CloudTrail log files.
    #[builder(setter(into))]
    pub cloudtrail_bucket_name: String,
    /// Object expiration for both buckets.
    #[builder(default = DEFAULT_EXPIRATION_DAYS)]
    pub expiration_days: u32,
    /// Key prefix for the trail bucket's access logs.
    #[builder(default = String::from(DEFAULT_ACCESS_LOG_PREFIX), setter(into))]
    pub access_log_prefix: String,
    /// Retention of the trail log group.
    #[builder(default = RetentionDays::ThreeMonths)]
    pub log_retention: RetentionDays,
}

/// The CloudTrail half of the account baseline.
#[derive(Debug, Clone)]
pub struct CloudTrailResources {
    /// Target of the trail bucket's server access logs.
    pub access_log_bucket: Bucket,
    /// Bucket receiving CloudTrail log files.
    pub bucket: Bucket,
    /// Key encrypting log files and the log group.
    pub key: Key,
    /// Log group receiving trail events, used by metric filters.
    pub log_group: LogGroup,
    /// The trail.
    pub trail: Trail,
}

impl CloudTrailResources {
    /// Declare the CloudTrail resources into `stack`.
    ///
    /// # Errors
    /// Fails on an invalid bucket name or a logical ID already taken in the stack.
    pub fn new(stack: &mut Stack, props: &CloudTrailProps) -> BaselineResult<Self> {
        let access_log_bucket = Bucket::new(
            stack,
            "ServerAccessLogBucket",
            BucketProps::builder()
                .bucket_name(props.server_access_log_bucket_name.as_str())
                .access_control(BucketAccessControl::LogDeliveryWrite)
                .expiration_days(props.expiration_days)
                .build(),
        )?;
        access_log_bucket.deny_object_deletion(stack)?;

        let bucket = Bucket::new(
            stack,
            "CloudTrailBucket",
            BucketProps::builder()
                .bucket_name(props.cloudtrail_bucket_name.as_str())
                .expiration_days(props.expiration_days)
                .server_access_logs(AccessLogDestination {
                    bucket: access_log_bucket.clone(),
                    prefix: props.access_log_prefix.clone(),
                })
                .build(),
        )?;
        bucket.deny_object_deletion(stack)?;

        let key = Key::new(
            stack,
            "CloudTrailKey",
            KeyProps::builder()
                .description("for CloudTrail")
                .enable_key_rotation(true)
                .alias("for-cloudtrail")
                .build(),
        )?;
        for statement in key_policy_statements(stack) {
            key.add_to_resource_policy(stack, statement)?;
        }

        let log_group = LogGroup::new(
            stack,
            "CloudTrailLogGroup",
            LogGroupProps::builder()
                .retention(props.log_retention)
                .encryption_key(&key)
                .build(),
        )?;

        let trail = Trail::new(
            stack,
            "CloudTrail",
            TrailProps::builder()
                .bucket(&bucket)
                .encryption_key(&key)
                .cloud_watch_log_group(&log_group)
                .send_to_cloud_watch_logs(true)
                .build(),
        )?;

        stack.add_output(
            "CloudTrailLogGroupName",
            Output::new(log_group.log_group_name())
                .with_description("Log group receiving CloudTrail events")
                .with_export_name(Value::concat([
                    Value::pseudo(pseudo::STACK_NAME),
                    "-CloudTrailLogGroupName".into(),
                ])),
        )?;

        info!(
            bucket = %props.cloudtrail_bucket_name,
            access_log_bucket = %props.server_access_log_bucket_name,
            "declared CloudTrail resources"
        );

        Ok(Self {
            access_log_bucket,
            bucket,
            key,
            log_group,
            trail,
        })
    }
}

/// Grants CloudTrail and CloudWatch Logs use of the trail key, scoped to
/// trails and log groups of the deploying account.
fn key_policy_statements(stack: &Stack) -> Vec<PolicyStatement> {
    let trail_arns = || {
        Value::List(vec![Value::concat([
            "arn:aws:cloudtrail:*:".into(),
            stack.account(),
            ":trail/*".into(),
        ])])
    };

    vec![
        PolicyStatement::allow()
            .with_action("kms:GenerateDataKey*")
            .with_principal(Principal::service(CLOUDTRAIL_SERVICE))
            .with_resource("*")
            .with_condition("StringLike", CLOUDTRAIL_CONTEXT_KEY, trail_arns()),
        PolicyStatement::allow()
            .with_action("kms:DescribeKey")
            .with_principal(Principal::service(CLOUDTRAIL_SERVICE))
            .with_resource("*"),
        PolicyStatement::allow()
            .with_actions(["kms:Decrypt", "kms:ReEncryptFrom"])
            .with_principal(Principal::Any)
            .with_resource("*")
            .with_condition("StringEquals", "kms:CallerAccount", stack.account())
            .with_condition("StringLike", CLOUDTRAIL_CONTEXT_KEY, trail_arns()),
        PolicyStatement::allow()
            .with_actions([
                "kms:Encrypt*",
                "kms:Decrypt*",
                "kms:ReEncrypt*",
                "kms:GenerateDataKey*",
                "kms:Describe*",
            ])
            .with_principal(Principal::service(LOGS_SERVICE))
            .with_resource("*")
            .with_condition(
                "ArnEquals",
                LOGS_CONTEXT_KEY,
                Value::concat([
                    "arn:aws:logs:".into(),
                    stack.region(),
                    ":".into(),
                    stack.account(),
                    ":log-group:*".into(),
                ]),
            ),
    ]
}
