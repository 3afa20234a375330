//! Synthesis-time validation of user-supplied names.
//!
//! Bucket names follow the rules in the
//! [Amazon S3 documentation](https://docs.aws.amazon.com/AmazonS3/latest/userguide/bucketnamingrules.html).
//! Global uniqueness can only be checked by S3 at deploy time.

use std::net::Ipv4Addr;

use baseline_core::{BaselineError, BaselineResult};

/// Minimum bucket name length.
const MIN_BUCKET_NAME_LEN: usize = 3;

/// Maximum bucket name length.
const MAX_BUCKET_NAME_LEN: usize = 63;

fn invalid(name: &str, reason: impl Into<String>) -> BaselineError {
    BaselineError::InvalidBucketName {
        name: name.to_owned(),
        reason: reason.into(),
    }
}

/// Validate an S3 bucket name.
///
/// Rules:
/// - 3-63 characters long
/// - Only lowercase letters, numbers, hyphens, and dots
/// - Must start and end with a letter or number
/// - No consecutive dots (`..`)
/// - Not formatted as an IPv4 address (e.g. `192.168.0.1`)
/// - Must not start with `xn--` or `sthree-`
/// - Must not end with `-s3alias` or `--ol-s3`
///
/// # Errors
///
/// Returns [`BaselineError::InvalidBucketName`] if any rule is violated.
///
/// # Examples
///
/// ```
/// use baseline_constructs::validation::validate_bucket_name;
///
/// assert!(validate_bucket_name("acme-cloudtrail-logs").is_ok());
/// assert!(validate_bucket_name("AB").is_err());
/// ```
pub fn validate_bucket_name(name: &str) -> BaselineResult<()> {
    let len = name.len();

    if !(MIN_BUCKET_NAME_LEN..=MAX_BUCKET_NAME_LEN).contains(&len) {
        return Err(invalid(
            name,
            format!(
                "Bucket name must be between {MIN_BUCKET_NAME_LEN} and {MAX_BUCKET_NAME_LEN} \
                 characters long"
            ),
        ));
    }

    if !name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'.')
    {
        return Err(invalid(
            name,
            "Bucket name must only contain lowercase letters, numbers, hyphens, and dots",
        ));
    }

    let bytes = name.as_bytes();
    let edge_ok = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    if !edge_ok(bytes[0]) || !edge_ok(bytes[len - 1]) {
        return Err(invalid(
            name,
            "Bucket name must start and end with a letter or number",
        ));
    }

    if name.contains("..") {
        return Err(invalid(name, "Bucket name must not contain consecutive dots"));
    }

    if name.parse::<Ipv4Addr>().is_ok() {
        return Err(invalid(
            name,
            "Bucket name must not be formatted as an IP address",
        ));
    }

    for prefix in ["xn--", "sthree-"] {
        if name.starts_with(prefix) {
            return Err(invalid(
                name,
                format!("Bucket name must not start with '{prefix}'"),
            ));
        }
    }

    for suffix in ["-s3alias", "--ol-s3"] {
        if name.ends_with(suffix) {
            return Err(invalid(
                name,
                format!("Bucket name must not end with '{suffix}'"),
            ));
        }
    }

    Ok(())
}
