//! Whole-stack synthesis tests for the account baseline.
//!
//! Each test builds a [`BaselineStack`], synthesizes it and asserts on the
//! resulting template JSON. Nothing is deployed.
//!
//! Run them with:
//! ```text
//! cargo test -p baseline-integration
//! ```

use std::sync::Once;

use baseline_constructs::BaselineStack;
use baseline_core::{AccountId, AwsRegion, BaselineConfig, Environment};
use baseline_template::resource_types::S3_BUCKET_POLICY;
use serde_json::Value;

static INIT: Once = Once::new();

/// Account used by resolved-environment tests.
pub const ACCOUNT: &str = "123456789012";

/// Region used by resolved-environment tests.
pub const REGION: &str = "ap-northeast-1";

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Configuration with resolved account and region and the given bucket-name prefix.
///
/// # Panics
/// Panics if the test account ID is rejected.
#[must_use]
pub fn baseline_config(prefix: &str) -> BaselineConfig {
    init_tracing();

    let account = AccountId::new(ACCOUNT).expect("test account should be valid");
    let env = Environment::new(account, AwsRegion::new(REGION));

    BaselineConfig::builder()
        .env(env)
        .server_access_log_bucket_name(format!("{prefix}-server-access-logs"))
        .cloudtrail_bucket_name(format!("{prefix}-cloudtrail"))
        .config_bucket_name(format!("{prefix}-config"))
        .build()
}

/// Synthesize `config` into template JSON.
///
/// # Panics
/// Panics if the stack cannot be declared or synthesized.
#[must_use]
pub fn synth(config: &BaselineConfig) -> Value {
    let stack = BaselineStack::new(config).expect("baseline stack should declare");
    let json = stack.to_json().expect("baseline stack should synthesize");
    serde_json::from_str(&json).expect("template should be valid JSON")
}

/// `(logical_id, resource)` pairs of every resource of `resource_type`.
#[must_use]
pub fn resources_of_type<'a>(
    template: &'a Value,
    resource_type: &str,
) -> Vec<(&'a str, &'a Value)> {
    template["Resources"]
        .as_object()
        .map(|resources| {
            resources
                .iter()
                .filter(|(_, r)| r["Type"] == resource_type)
                .map(|(id, r)| (id.as_str(), r))
                .collect()
        })
        .unwrap_or_default()
}

/// The policy statements stored under `property` of a resource.
#[must_use]
pub fn statements<'a>(resource: &'a Value, property: &str) -> &'a [Value] {
    resource["Properties"][property]["Statement"]
        .as_array()
        .map_or(&[][..], Vec::as_slice)
}

/// Whether a statement's `Action` is, or contains, `action`.
#[must_use]
pub fn has_action(statement: &Value, action: &str) -> bool {
    match &statement["Action"] {
        Value::String(a) => a == action,
        Value::Array(actions) => actions.iter().any(|a| a == action),
        _ => false,
    }
}

/// The bucket policy resource whose `Bucket` refers to `bucket_id`.
#[must_use]
pub fn bucket_policy_for<'a>(template: &'a Value, bucket_id: &str) -> Option<&'a Value> {
    resources_of_type(template, S3_BUCKET_POLICY)
        .into_iter()
        .find(|(_, policy)| policy["Properties"]["Bucket"]["Ref"] == bucket_id)
        .map(|(_, policy)| policy)
}

mod test_buckets;
mod test_config;
mod test_key_policy;
mod test_synthesis;
