//! CloudWatch Logs constructs: log groups and metric filters.

use baseline_core::BaselineResult;
use baseline_template::resource_types::{LOGS_LOG_GROUP, LOGS_METRIC_FILTER};
use baseline_template::{RemovalPolicy, Resource, Value};
use typed_builder::TypedBuilder;

use crate::aws::kms::Key;
use crate::stack::Stack;

/// Log retention periods accepted by CloudWatch Logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RetentionDays {
    /// 1 day.
    OneDay,
    /// 1 week.
    OneWeek,
    /// 1 month.
    OneMonth,
    /// 3 months.
    ThreeMonths,
    /// 6 months.
    SixMonths,
    /// 1 year.
    OneYear,
    /// 2 years.
    #[default]
    TwoYears,
    /// 5 years.
    FiveYears,
    /// 10 years.
    TenYears,
    /// Never expire.
    Infinite,
}

impl RetentionDays {
    /// Number of days, `None` for [`RetentionDays::Infinite`].
    #[must_use]
    pub fn days(&self) -> Option<u32> {
        match self {
            Self::OneDay => Some(1),
            Self::OneWeek => Some(7),
            Self::OneMonth => Some(30),
            Self::ThreeMonths => Some(90),
            Self::SixMonths => Some(180),
            Self::OneYear => Some(365),
            Self::TwoYears => Some(731),
            Self::FiveYears => Some(1827),
            Self::TenYears => Some(3653),
            Self::Infinite => None,
        }
    }
}

/// Log group settings.
#[derive(Debug, Clone, TypedBuilder)]
pub struct LogGroupProps<'a> {
    /// How long events are kept.
    #[builder(default)]
    pub retention: RetentionDays,
    /// Key encrypting the log data.
    #[builder(default, setter(strip_option))]
    pub encryption_key: Option<&'a Key>,
    /// Explicit log group name; generated by CloudFormation when unset.
    #[builder(default, setter(strip_option, into))]
    pub log_group_name: Option<String>,
    /// Deletion / update-replace policy.
    #[builder(default)]
    pub removal_policy: RemovalPolicy,
}

/// Handle to a declared log group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogGroup {
    logical_id: String,
}

impl LogGroup {
    /// Declare a log group.
    pub fn new(
        stack: &mut Stack,
        logical_id: &str,
        props: LogGroupProps<'_>,
    ) -> BaselineResult<Self> {
        let mut resource = Resource::new(LOGS_LOG_GROUP).with_removal_policy(props.removal_policy);
        if let Some(days) = props.retention.days() {
            resource.set_property("RetentionInDays", days);
        }
        if let Some(key) = props.encryption_key {
            resource.set_property("KmsKeyId", key.arn());
        }
        if let Some(name) = &props.log_group_name {
            resource.set_property("LogGroupName", name.as_str());
        }
        stack.add_resource(logical_id, resource)?;

        Ok(Self {
            logical_id: logical_id.to_owned(),
        })
    }

    /// Logical ID of the log group.
    #[must_use]
    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    /// The log group name (`Ref`).
    #[must_use]
    pub fn log_group_name(&self) -> Value {
        Value::reference(&self.logical_id)
    }

    /// The log group ARN.
    #[must_use]
    pub fn arn(&self) -> Value {
        Value::get_att(&self.logical_id, "Arn")
    }
}

/// Metric filter settings.
#[derive(Debug, Clone, TypedBuilder)]
pub struct MetricFilterProps<'a> {
    /// Log group the filter watches.
    pub log_group: &'a LogGroup,
    /// CloudWatch Logs filter pattern.
    #[builder(setter(into))]
    pub filter_pattern: String,
    /// Namespace of the emitted metric.
    #[builder(setter(into))]
    pub metric_namespace: String,
    /// Name of the emitted metric.
    #[builder(setter(into))]
    pub metric_name: String,
    /// Value published per matching event.
    #[builder(default = String::from("1"), setter(into))]
    pub metric_value: String,
}

/// Handle to a declared metric filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricFilter {
    logical_id: String,
    metric_namespace: String,
    metric_name: String,
}

impl MetricFilter {
    /// Declare a metric filter.
    pub fn new(
        stack: &mut Stack,
        logical_id: &str,
        props: MetricFilterProps<'_>,
    ) -> BaselineResult<Self> {
        let transformation = Value::map([
            ("MetricName", Value::from(props.metric_name.as_str())),
            ("MetricNamespace", Value::from(props.metric_namespace.as_str())),
            ("MetricValue", Value::from(props.metric_value.as_str())),
        ]);
        stack.add_resource(
            logical_id,
            Resource::new(LOGS_METRIC_FILTER)
                .with_property("LogGroupName", props.log_group.log_group_name())
                .with_property("FilterPattern", props.filter_pattern.as_str())
                .with_property("MetricTransformations", Value::List(vec![transformation])),
        )?;

        Ok(Self {
            logical_id: logical_id.to_owned(),
            metric_namespace: props.metric_namespace,
            metric_name: props.metric_name,
        })
    }

    /// Logical ID of the filter.
    #[must_use]
    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    /// Namespace of the emitted metric.
    #[must_use]
    pub fn metric_namespace(&self) -> &str {
        &self.metric_namespace
    }

    /// Name of the emitted metric.
    #[must_use]
    pub fn metric_name(&self) -> &str {
        &self.metric_name
    }
}
