//! The account-baseline stack and its components.

mod alarms;
mod cloudtrail;
mod config;

use baseline_core::{BaselineConfig, BaselineResult, validate_stack_name};
use baseline_template::Template;
use tracing::info;

pub use self::alarms::{CloudTrailAlarms, METRIC_NAMESPACE};
pub use self::cloudtrail::{
    CloudTrailProps, CloudTrailResources, DEFAULT_ACCESS_LOG_PREFIX, DEFAULT_EXPIRATION_DAYS,
};
pub use self::config::{ConfigProps, ConfigResources};
use crate::stack::Stack;

/// Template description of the synthesized stack.
pub const STACK_DESCRIPTION: &str =
    "Account baseline: CloudTrail audit logging and AWS Config recording";

/// CloudTrail and AWS Config declared into one stack.
///
/// # Examples
///
/// ```
/// use baseline_constructs::BaselineStack;
/// use baseline_core::BaselineConfig;
///
/// let config = BaselineConfig::builder()
///     .server_access_log_bucket_name("acme-server-access-logs".into())
///     .cloudtrail_bucket_name("acme-cloudtrail".into())
///     .config_bucket_name("acme-config".into())
///     .build();
/// let stack = BaselineStack::new(&config).unwrap();
/// assert!(stack.to_json().unwrap().contains("AWS::CloudTrail::Trail"));
/// ```
#[derive(Debug, Clone)]
pub struct BaselineStack {
    stack: Stack,
    /// CloudTrail component.
    pub cloudtrail: CloudTrailResources,
    /// AWS Config component.
    pub config: ConfigResources,
    /// Alarms, present only when configured.
    pub alarms: Option<CloudTrailAlarms>,
}

impl BaselineStack {
    /// Declare the whole baseline.
    pub fn new(config: &BaselineConfig) -> BaselineResult<Self> {
        validate_stack_name(&config.stack_name)?;

        let mut stack = Stack::new(config.stack_name.as_str(), config.env.clone())
            .with_tags(config.tags.clone());
        stack.set_description(STACK_DESCRIPTION);

        let cloudtrail = CloudTrailResources::new(
            &mut stack,
            &CloudTrailProps::builder()
                .server_access_log_bucket_name(config.server_access_log_bucket_name.as_str())
                .cloudtrail_bucket_name(config.cloudtrail_bucket_name.as_str())
                .build(),
        )?;

        let config_resources = ConfigResources::new(
            &mut stack,
            &ConfigProps::builder()
                .bucket_name(config.config_bucket_name.as_str())
                .build(),
        )?;

        let alarms = config
            .alarms
            .as_ref()
            .map(|alarm| CloudTrailAlarms::new(&mut stack, &cloudtrail.log_group, alarm))
            .transpose()?;

        info!(
            stack = %config.stack_name,
            env = %config.env,
            alarms = alarms.is_some(),
            "declared baseline stack"
        );

        Ok(Self {
            stack,
            cloudtrail,
            config: config_resources,
            alarms,
        })
    }

    /// The underlying stack scope.
    #[must_use]
    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    /// Produce the CloudFormation template.
    pub fn synth(&self) -> BaselineResult<Template> {
        self.stack.synth()
    }

    /// Produce the template as pretty-printed JSON.
    pub fn to_json(&self) -> BaselineResult<String> {
        self.synth()?.to_json()
    }
}
