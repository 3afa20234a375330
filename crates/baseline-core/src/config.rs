//! Stack configuration.
//!
//! Provides [`BaselineConfig`] for the account-baseline stack. Values are
//! loaded from environment variables, following the CDK conventions for the
//! deployment environment (`CDK_DEFAULT_ACCOUNT`, `CDK_DEFAULT_REGION`).
//! Globally unique resource names have no defaults and must be supplied.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;
use typed_builder::TypedBuilder;

use crate::types::{AccountId, AwsRegion, Environment};
use crate::{BaselineError, BaselineResult};

/// Default stack name, matching the name the stack has always been deployed under.
pub const DEFAULT_STACK_NAME: &str = "CdkCloudtrailConfigStack";

/// Maximum length of a CloudFormation stack name.
pub const MAX_STACK_NAME_LEN: usize = 128;

/// Periods shorter than a minute accepted by CloudWatch (high-resolution metrics).
const HIGH_RESOLUTION_PERIODS: [u32; 2] = [10, 30];

/// Thresholds for the CloudTrail metric-filter alarms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct AlarmThresholds {
    /// IAM policy changes per period.
    #[builder(default = 1)]
    pub iam_policy_change: u32,
    /// Unauthorized API calls or console logins per period.
    #[builder(default = 5)]
    pub unauthorized_attempts: u32,
    /// New IAM access keys per period.
    #[builder(default = 1)]
    pub new_access_key: u32,
    /// Root user API activity per period.
    #[builder(default = 1)]
    pub root_activity: u32,
}

impl Default for AlarmThresholds {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Opt-in configuration for the CloudTrail alarms.
///
/// Alarms are only synthesized when this is present, which requires an
/// explicit notification topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct AlarmConfig {
    /// SNS topic ARN notified when an alarm fires.
    pub topic_arn: String,
    /// Metric period in seconds.
    #[builder(default = 300)]
    pub period_secs: u32,
    /// Number of periods evaluated.
    #[builder(default = 1)]
    pub evaluation_periods: u32,
    /// Number of breaching datapoints that trigger the alarm.
    #[builder(default = 1)]
    pub datapoints_to_alarm: u32,
    /// Per-alarm thresholds.
    #[builder(default)]
    pub thresholds: AlarmThresholds,
}

/// Account-baseline stack configuration.
///
/// # Examples
///
/// ```
/// use baseline_core::BaselineConfig;
///
/// let config = BaselineConfig::builder()
///     .server_access_log_bucket_name("acme-server-access-logs".into())
///     .cloudtrail_bucket_name("acme-cloudtrail".into())
///     .config_bucket_name("acme-config".into())
///     .build();
/// assert_eq!(config.stack_name, "CdkCloudtrailConfigStack");
/// assert!(config.alarms.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct BaselineConfig {
    /// CloudFormation stack name.
    #[builder(default = String::from(DEFAULT_STACK_NAME))]
    pub stack_name: String,

    /// Deployment account and region.
    #[builder(default)]
    pub env: Environment,

    /// Tags applied to every taggable resource.
    #[builder(default)]
    pub tags: BTreeMap<String, String>,

    /// Name of the bucket receiving server access logs for the CloudTrail bucket.
    pub server_access_log_bucket_name: String,

    /// Name of the bucket receiving CloudTrail log files.
    pub cloudtrail_bucket_name: String,

    /// Name of the bucket receiving AWS Config snapshots and history.
    pub config_bucket_name: String,

    /// CloudTrail alarms, disabled unless configured.
    #[builder(default, setter(strip_option))]
    pub alarms: Option<AlarmConfig>,
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Logging configuration, loaded separately so tracing can be initialized
/// before the stack configuration is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct LogConfig {
    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub level: String,
    /// Output format.
    #[builder(default)]
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl LogConfig {
    /// Load from `LOG_LEVEL` (default `info`) and `LOG_FORMAT` (`text` or `json`).
    pub fn from_env() -> BaselineResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> BaselineResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let format = match get("LOG_FORMAT").map(|v| v.trim().to_ascii_lowercase()) {
            None => LogFormat::Text,
            Some(v) if v == "text" => LogFormat::Text,
            Some(v) if v == "json" => LogFormat::Json,
            Some(v) => {
                return Err(BaselineError::Config(format!(
                    "LOG_FORMAT must be text or json, got {v:?}"
                )));
            }
        };

        Ok(Self {
            level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_owned()),
            format,
        })
    }
}

impl BaselineConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `CDK_DEFAULT_ACCOUNT` (or `AWS_ACCOUNT_ID`) | *(unset: `AWS::AccountId`)* |
    /// | `CDK_DEFAULT_REGION` (or `AWS_REGION`) | *(unset: `AWS::Region`)* |
    /// | `STACK_NAME` | `CdkCloudtrailConfigStack` |
    /// | `STACK_TAGS` | *(empty)*, `key=value` pairs separated by commas |
    /// | `SERVER_ACCESS_LOG_BUCKET_NAME` | *(required)* |
    /// | `CLOUDTRAIL_BUCKET_NAME` | *(required)* |
    /// | `CONFIG_BUCKET_NAME` | *(required)* |
    /// | `ALARM_TOPIC_ARN` | *(unset: alarms disabled)* |
    /// | `ALARM_PERIOD_SECONDS` | `300` |
    /// | `ALARM_THRESHOLD_IAM_POLICY_CHANGE` | `1` |
    /// | `ALARM_THRESHOLD_UNAUTHORIZED_ATTEMPTS` | `5` |
    /// | `ALARM_THRESHOLD_NEW_ACCESS_KEY` | `1` |
    /// | `ALARM_THRESHOLD_ROOT_ACTIVITY` | `1` |
    ///
    /// Logging variables are read by [`LogConfig::from_env`].
    pub fn from_env() -> BaselineResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> BaselineResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let require = |name: &str| {
            get(name).ok_or_else(|| BaselineError::MissingConfig {
                variable: name.to_owned(),
            })
        };

        let account = get("CDK_DEFAULT_ACCOUNT")
            .or_else(|| get("AWS_ACCOUNT_ID"))
            .map(AccountId::new)
            .transpose()?;
        let region = get("CDK_DEFAULT_REGION")
            .or_else(|| get("AWS_REGION"))
            .map(AwsRegion::new);

        let alarms = match get("ALARM_TOPIC_ARN") {
            Some(topic_arn) => {
                let defaults = AlarmThresholds::default();
                let period_secs = parse_u32(&get, "ALARM_PERIOD_SECONDS", 300)?;
                validate_alarm_period(period_secs)?;
                Some(AlarmConfig {
                    topic_arn,
                    period_secs,
                    evaluation_periods: 1,
                    datapoints_to_alarm: 1,
                    thresholds: AlarmThresholds {
                        iam_policy_change: parse_u32(
                            &get,
                            "ALARM_THRESHOLD_IAM_POLICY_CHANGE",
                            defaults.iam_policy_change,
                        )?,
                        unauthorized_attempts: parse_u32(
                            &get,
                            "ALARM_THRESHOLD_UNAUTHORIZED_ATTEMPTS",
                            defaults.unauthorized_attempts,
                        )?,
                        new_access_key: parse_u32(
                            &get,
                            "ALARM_THRESHOLD_NEW_ACCESS_KEY",
                            defaults.new_access_key,
                        )?,
                        root_activity: parse_u32(
                            &get,
                            "ALARM_THRESHOLD_ROOT_ACTIVITY",
                            defaults.root_activity,
                        )?,
                    },
                })
            }
            None => None,
        };

        let stack_name = get("STACK_NAME").unwrap_or_else(|| DEFAULT_STACK_NAME.to_owned());
        validate_stack_name(&stack_name)?;

        let config = Self {
            stack_name,
            env: Environment { account, region },
            tags: get("STACK_TAGS")
                .map(|raw| parse_tags(&raw))
                .transpose()?
                .unwrap_or_default(),
            server_access_log_bucket_name: require("SERVER_ACCESS_LOG_BUCKET_NAME")?,
            cloudtrail_bucket_name: require("CLOUDTRAIL_BUCKET_NAME")?,
            config_bucket_name: require("CONFIG_BUCKET_NAME")?,
            alarms,
        };

        debug!(
            stack_name = %config.stack_name,
            env = %config.env,
            alarms = config.alarms.is_some(),
            "loaded baseline configuration"
        );

        Ok(config)
    }
}

/// Validate a CloudFormation stack name.
///
/// Names start with a letter, contain only ASCII alphanumerics and hyphens,
/// and are at most [`MAX_STACK_NAME_LEN`] characters long. The name also
/// becomes the template file name, so this keeps it a single path component.
pub fn validate_stack_name(name: &str) -> BaselineResult<()> {
    let invalid = |reason: &str| {
        Err(BaselineError::Config(format!(
            "invalid stack name {name:?}: {reason}"
        )))
    };

    if name.len() > MAX_STACK_NAME_LEN {
        return invalid("must be at most 128 characters");
    }
    if !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return invalid("must start with a letter");
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return invalid("may contain only letters, digits and hyphens");
    }
    Ok(())
}

/// CloudWatch accepts 10, 30 or any multiple of 60 seconds.
fn validate_alarm_period(period_secs: u32) -> BaselineResult<()> {
    if HIGH_RESOLUTION_PERIODS.contains(&period_secs) || period_secs % 60 == 0 {
        Ok(())
    } else {
        Err(BaselineError::Config(format!(
            "ALARM_PERIOD_SECONDS must be 10, 30 or a multiple of 60, got {period_secs}"
        )))
    }
}

/// Parse a `key=value,key=value` tag list.
fn parse_tags(raw: &str) -> BaselineResult<BTreeMap<String, String>> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                BaselineError::Config(format!("invalid tag {pair:?}, expected key=value"))
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(BaselineError::Config(format!("empty tag key in {pair:?}")));
            }
            Ok((key.to_owned(), value.trim().to_owned()))
        })
        .collect()
}

fn parse_u32<G>(get: &G, name: &str, default: u32) -> BaselineResult<u32>
where
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(v) => match v.trim().parse::<u32>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(BaselineError::Config(format!(
                "{name} must be a positive integer, got {v:?}"
            ))),
        },
        None => Ok(default),
    }
}
