//! CloudWatch metric alarm construct.

use std::fmt;

use baseline_core::BaselineResult;
use baseline_template::resource_types::CLOUDWATCH_ALARM;
use baseline_template::{Resource, Value};
use typed_builder::TypedBuilder;

use crate::stack::Stack;

/// How the statistic is compared with the threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ComparisonOperator {
    /// `>=`
    #[default]
    GreaterThanOrEqualToThreshold,
    /// `>`
    GreaterThanThreshold,
    /// `<`
    LessThanThreshold,
    /// `<=`
    LessThanOrEqualToThreshold,
}

impl ComparisonOperator {
    /// Returns the `ComparisonOperator` property value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GreaterThanOrEqualToThreshold => "GreaterThanOrEqualToThreshold",
            Self::GreaterThanThreshold => "GreaterThanThreshold",
            Self::LessThanThreshold => "LessThanThreshold",
            Self::LessThanOrEqualToThreshold => "LessThanOrEqualToThreshold",
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statistic applied to the metric over each period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Statistic {
    /// Sum of all datapoints.
    #[default]
    Sum,
    /// Mean of all datapoints.
    Average,
    /// Largest datapoint.
    Maximum,
    /// Smallest datapoint.
    Minimum,
    /// Number of datapoints.
    SampleCount,
}

impl Statistic {
    /// Returns the `Statistic` property value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sum => "Sum",
            Self::Average => "Average",
            Self::Maximum => "Maximum",
            Self::Minimum => "Minimum",
            Self::SampleCount => "SampleCount",
        }
    }
}

/// Alarm settings.
#[derive(Debug, Clone, TypedBuilder)]
pub struct AlarmProps {
    /// Metric namespace.
    #[builder(setter(into))]
    pub metric_namespace: String,
    /// Metric name.
    #[builder(setter(into))]
    pub metric_name: String,
    /// Period in seconds.
    #[builder(default = 300)]
    pub period_secs: u32,
    /// Statistic over each period.
    #[builder(default)]
    pub statistic: Statistic,
    /// Periods evaluated.
    #[builder(default = 1)]
    pub evaluation_periods: u32,
    /// Breaching datapoints needed to alarm.
    #[builder(default = 1)]
    pub datapoints_to_alarm: u32,
    /// Threshold compared against the statistic.
    pub threshold: u32,
    /// Comparison with the threshold.
    #[builder(default)]
    pub comparison_operator: ComparisonOperator,
    /// Human-readable description.
    #[builder(default, setter(strip_option, into))]
    pub description: Option<String>,
    /// ARNs notified when the alarm fires.
    #[builder(default)]
    pub alarm_actions: Vec<Value>,
}

/// Handle to a declared alarm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alarm {
    logical_id: String,
}

impl Alarm {
    /// Declare an alarm.
    pub fn new(stack: &mut Stack, logical_id: &str, props: AlarmProps) -> BaselineResult<Self> {
        let mut resource = Resource::new(CLOUDWATCH_ALARM)
            .with_property("Namespace", props.metric_namespace.as_str())
            .with_property("MetricName", props.metric_name.as_str())
            .with_property("Period", props.period_secs)
            .with_property("Statistic", props.statistic.as_str())
            .with_property("EvaluationPeriods", props.evaluation_periods)
            .with_property("DatapointsToAlarm", props.datapoints_to_alarm)
            .with_property("Threshold", props.threshold)
            .with_property("ComparisonOperator", props.comparison_operator.as_str())
            .with_property("ActionsEnabled", !props.alarm_actions.is_empty());
        if let Some(description) = &props.description {
            resource.set_property("AlarmDescription", description.as_str());
        }
        if !props.alarm_actions.is_empty() {
            resource.set_property("AlarmActions", Value::List(props.alarm_actions));
        }
        stack.add_resource(logical_id, resource)?;

        Ok(Self {
            logical_id: logical_id.to_owned(),
        })
    }

    /// Logical ID of the alarm.
    #[must_use]
    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    /// The alarm ARN.
    #[must_use]
    pub fn arn(&self) -> Value {
        Value::get_att(&self.logical_id, "Arn")
    }
}
