//! Metric-filter alarms over the CloudTrail log group.
//!
//! Each alarm pairs a metric filter in the `CloudTrailMetrics` namespace with
//! a CloudWatch alarm notifying the configured SNS topic.

use baseline_core::{AlarmConfig, AlarmThresholds, BaselineResult};
use baseline_template::Value;
use tracing::info;

use crate::aws::cloudwatch::{Alarm, AlarmProps, ComparisonOperator, Statistic};
use crate::aws::logs::{LogGroup, MetricFilter, MetricFilterProps};
use crate::stack::Stack;

/// Namespace of every metric emitted by the filters.
pub const METRIC_NAMESPACE: &str = "CloudTrailMetrics";

struct AlarmDefinition {
    id: &'static str,
    filter_pattern: &'static str,
    metric_name: &'static str,
    description: &'static str,
    threshold: fn(&AlarmThresholds) -> u32,
}

const DEFINITIONS: &[AlarmDefinition] = &[
    AlarmDefinition {
        id: "IAMPolicyChange",
        filter_pattern: concat!(
            "{($.eventName=DeleteGroupPolicy)||($.eventName=DeleteRolePolicy)",
            "||($.eventName=DeleteUserPolicy)||($.eventName=PutGroupPolicy)",
            "||($.eventName=PutRolePolicy)||($.eventName=PutUserPolicy)",
            "||($.eventName=CreatePolicy)||($.eventName=DeletePolicy)",
            "||($.eventName=CreatePolicyVersion)||($.eventName=DeletePolicyVersion)",
            "||($.eventName=AttachRolePolicy)||($.eventName=DetachRolePolicy)",
            "||($.eventName=AttachUserPolicy)||($.eventName=DetachUserPolicy)",
            "||($.eventName=AttachGroupPolicy)||($.eventName=DetachGroupPolicy)}",
        ),
        metric_name: "IAMPolicyEventCount",
        description: "IAM Configuration changes detected!",
        threshold: |t| t.iam_policy_change,
    },
    // Decrypt errors raised by Config on KMS-encrypted Lambda variables are noise.
    AlarmDefinition {
        id: "UnauthorizedAttempts",
        filter_pattern: concat!(
            r#"{($.errorCode = "*UnauthorizedOperation" || $.errorCode = "AccessDenied*")"#,
            r#" && ($.eventName != "Decrypt""#,
            r#" || $.userIdentity.invokedBy != "config.amazonaws.com" )}"#,
        ),
        metric_name: "UnauthorizedAttemptsEventCount",
        description: "Multiple unauthorized actions or logins attempted!",
        threshold: |t| t.unauthorized_attempts,
    },
    AlarmDefinition {
        id: "NewAccessKeyCreated",
        filter_pattern: "{($.eventName=CreateAccessKey)}",
        metric_name: "NewAccessKeyCreatedEventCount",
        description: concat!(
            "Warning: New IAM access key was created. ",
            "Please be sure this action was necessary.",
        ),
        threshold: |t| t.new_access_key,
    },
    AlarmDefinition {
        id: "RootUserPolicyEventCount",
        filter_pattern: concat!(
            r#"{$.userIdentity.type="Root" && $.userIdentity.invokedBy NOT EXISTS"#,
            r#" && $.eventType !="AwsServiceEvent"}"#,
        ),
        metric_name: "RootUserPolicyEventCount",
        description: "Root user activity detected!",
        threshold: |t| t.root_activity,
    },
];

/// The metric filters and alarms watching the CloudTrail log group.
#[derive(Debug, Clone)]
pub struct CloudTrailAlarms {
    /// Declared metric filters, in definition order.
    pub filters: Vec<MetricFilter>,
    /// Declared alarms, in definition order.
    pub alarms: Vec<Alarm>,
}

impl CloudTrailAlarms {
    /// Declare one filter and one alarm (`<filter>Alarm`) per watched event class.
    pub fn new(
        stack: &mut Stack,
        log_group: &LogGroup,
        config: &AlarmConfig,
    ) -> BaselineResult<Self> {
        let mut filters = Vec::with_capacity(DEFINITIONS.len());
        let mut alarms = Vec::with_capacity(DEFINITIONS.len());

        for definition in DEFINITIONS {
            let filter = MetricFilter::new(
                stack,
                definition.id,
                MetricFilterProps::builder()
                    .log_group(log_group)
                    .filter_pattern(definition.filter_pattern)
                    .metric_namespace(METRIC_NAMESPACE)
                    .metric_name(definition.metric_name)
                    .build(),
            )?;

            let alarm = Alarm::new(
                stack,
                &format!("{}Alarm", definition.id),
                AlarmProps::builder()
                    .metric_namespace(filter.metric_namespace())
                    .metric_name(filter.metric_name())
                    .period_secs(config.period_secs)
                    .statistic(Statistic::Sum)
                    .evaluation_periods(config.evaluation_periods)
                    .datapoints_to_alarm(config.datapoints_to_alarm)
                    .threshold((definition.threshold)(&config.thresholds))
                    .comparison_operator(ComparisonOperator::GreaterThanOrEqualToThreshold)
                    .description(definition.description)
                    .alarm_actions(vec![Value::from(config.topic_arn.as_str())])
                    .build(),
            )?;

            filters.push(filter);
            alarms.push(alarm);
        }

        info!(count = alarms.len(), topic = %config.topic_arn, "declared CloudTrail alarms");

        Ok(Self { filters, alarms })
    }
}
