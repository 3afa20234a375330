//! Baseline Synth - synthesizes the account-baseline CloudFormation template.
//!
//! Declares the CloudTrail and AWS Config resources described by the
//! environment and writes a cloud assembly directory (template plus
//! `manifest.json`), or prints the template to stdout.
//!
//! # Usage
//!
//! ```text
//! CLOUDTRAIL_BUCKET_NAME=acme-cloudtrail \
//! SERVER_ACCESS_LOG_BUCKET_NAME=acme-server-access-logs \
//! CONFIG_BUCKET_NAME=acme-config \
//! baseline-synth [OUT_DIR | --stdout]
//! ```
//!
//! `OUT_DIR` defaults to `cdk.out`. Logs go to stderr.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CDK_DEFAULT_ACCOUNT` | *(unset)* | Deploy account (`AWS_ACCOUNT_ID` also accepted) |
//! | `CDK_DEFAULT_REGION` | *(unset)* | Deploy region (`AWS_REGION` also accepted) |
//! | `STACK_NAME` | `CdkCloudtrailConfigStack` | Stack name |
//! | `STACK_TAGS` | *(empty)* | `key=value,key=value` |
//! | `SERVER_ACCESS_LOG_BUCKET_NAME` | *(required)* | Access-log bucket |
//! | `CLOUDTRAIL_BUCKET_NAME` | *(required)* | CloudTrail bucket |
//! | `CONFIG_BUCKET_NAME` | *(required)* | AWS Config bucket |
//! | `ALARM_TOPIC_ARN` | *(unset)* | Enables the CloudTrail alarms |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `LOG_FORMAT` | `text` | `text` or `json` |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

mod assembly;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use baseline_constructs::BaselineStack;
use baseline_core::{BaselineConfig, LogConfig, LogFormat};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::assembly::write_assembly;

/// Default output directory, matching the CDK CLI.
const DEFAULT_OUT_DIR: &str = "cdk.out";

/// Flag printing the template instead of writing an assembly.
const STDOUT_FLAG: &str = "--stdout";

/// Initialize the tracing subscriber on stderr.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log: &LogConfig) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(&log.level)
            .with_context(|| format!("invalid log level filter: {}", log.level))?
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    match log.format {
        LogFormat::Text => subscriber.init(),
        LogFormat::Json => subscriber.json().init(),
    }

    Ok(())
}

fn main() -> Result<()> {
    let log = LogConfig::from_env().context("failed to load logging configuration")?;
    init_tracing(&log)?;

    let config = BaselineConfig::from_env().context("failed to load configuration")?;

    let target = std::env::args().nth(1);

    info!(
        stack = %config.stack_name,
        env = %config.env,
        alarms = config.alarms.is_some(),
        "synthesizing baseline stack"
    );

    let stack = BaselineStack::new(&config).context("failed to declare baseline stack")?;
    let template = stack.to_json().context("failed to synthesize template")?;

    if target.as_deref() == Some(STDOUT_FLAG) {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{template}").context("failed to write template to stdout")?;
        return Ok(());
    }

    let out_dir = target.map_or_else(|| PathBuf::from(DEFAULT_OUT_DIR), PathBuf::from);
    let output = write_assembly(
        &out_dir,
        &config.stack_name,
        &config.env.to_string(),
        &template,
    )?;

    info!(
        template = %output.template_path.display(),
        manifest = %output.manifest_path.display(),
        sha256 = %output.template_sha256,
        "wrote cloud assembly"
    );

    Ok(())
}
