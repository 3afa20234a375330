//! Deployment environment types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{BaselineError, BaselineResult};

/// AWS Account ID (12-digit string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    /// Create a new account ID from a string.
    ///
    /// # Errors
    /// Returns an error if the account ID is not a 12-digit numeric string.
    pub fn new(id: impl Into<String>) -> BaselineResult<Self> {
        let id = id.into();
        if id.len() != 12 || !id.chars().all(|c| c.is_ascii_digit()) {
            return Err(BaselineError::InvalidAccountId(id));
        }
        Ok(Self(id))
    }

    /// Get the account ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AccountId {
    type Error = BaselineError;

    fn try_from(value: String) -> BaselineResult<Self> {
        Self::new(value)
    }
}

impl From<AccountId> for String {
    fn from(value: AccountId) -> Self {
        value.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// AWS Region identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AwsRegion(String);

impl AwsRegion {
    /// Create a new region.
    #[must_use]
    pub fn new(region: impl Into<String>) -> Self {
        Self(region.into())
    }

    /// Get the region as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AwsRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The account and region a stack is deployed into.
///
/// Either half may be left unresolved, in which case the synthesized
/// template falls back to the `AWS::AccountId` / `AWS::Region` pseudo
/// parameters and the stack is environment-agnostic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    /// Target account, if known at synthesis time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<AccountId>,
    /// Target region, if known at synthesis time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<AwsRegion>,
}

impl Environment {
    /// Placeholder used in environment URIs for an unresolved account.
    pub const UNKNOWN_ACCOUNT: &str = "unknown-account";

    /// Placeholder used in environment URIs for an unresolved region.
    pub const UNKNOWN_REGION: &str = "unknown-region";

    /// Create a fully resolved environment.
    #[must_use]
    pub fn new(account: AccountId, region: AwsRegion) -> Self {
        Self {
            account: Some(account),
            region: Some(region),
        }
    }

    /// Whether both account and region are known.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.account.is_some() && self.region.is_some()
    }
}

/// Formats as a cloud-assembly environment URI, e.g. `aws://123456789012/us-east-1`.
impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let account = self
            .account
            .as_ref()
            .map_or(Self::UNKNOWN_ACCOUNT, AccountId::as_str);
        let region = self
            .region
            .as_ref()
            .map_or(Self::UNKNOWN_REGION, AwsRegion::as_str);
        write!(f, "aws://{account}/{region}")
    }
}
