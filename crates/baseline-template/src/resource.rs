//! Resource declarations.

use std::collections::{BTreeMap, BTreeSet};

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::value::Value;

/// CloudFormation resource type names used by Baseline.
pub mod resource_types {
    /// S3 bucket.
    pub const S3_BUCKET: &str = "AWS::S3::Bucket";
    /// S3 bucket policy.
    pub const S3_BUCKET_POLICY: &str = "AWS::S3::BucketPolicy";
    /// KMS key.
    pub const KMS_KEY: &str = "AWS::KMS::Key";
    /// KMS alias.
    pub const KMS_ALIAS: &str = "AWS::KMS::Alias";
    /// CloudWatch Logs log group.
    pub const LOGS_LOG_GROUP: &str = "AWS::Logs::LogGroup";
    /// CloudWatch Logs metric filter.
    pub const LOGS_METRIC_FILTER: &str = "AWS::Logs::MetricFilter";
    /// IAM role.
    pub const IAM_ROLE: &str = "AWS::IAM::Role";
    /// IAM inline policy.
    pub const IAM_POLICY: &str = "AWS::IAM::Policy";
    /// CloudTrail trail.
    pub const CLOUDTRAIL_TRAIL: &str = "AWS::CloudTrail::Trail";
    /// AWS Config configuration recorder.
    pub const CONFIG_RECORDER: &str = "AWS::Config::ConfigurationRecorder";
    /// AWS Config delivery channel.
    pub const CONFIG_DELIVERY_CHANNEL: &str = "AWS::Config::DeliveryChannel";
    /// CloudWatch metric alarm.
    pub const CLOUDWATCH_ALARM: &str = "AWS::CloudWatch::Alarm";
}

/// What happens to a resource when it leaves the stack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RemovalPolicy {
    /// Delete the physical resource.
    Destroy,
    /// Orphan the physical resource.
    #[default]
    Retain,
    /// Snapshot, then delete (only for resources that support it).
    Snapshot,
}

impl RemovalPolicy {
    /// The `DeletionPolicy` / `UpdateReplacePolicy` attribute value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Destroy => "Delete",
            Self::Retain => "Retain",
            Self::Snapshot => "Snapshot",
        }
    }
}

/// A single resource declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    resource_type: String,
    properties: BTreeMap<String, Value>,
    depends_on: BTreeSet<String>,
    removal_policy: Option<RemovalPolicy>,
}

impl Resource {
    /// Declare a resource of the given type with no properties.
    #[must_use]
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            properties: BTreeMap::new(),
            depends_on: BTreeSet::new(),
            removal_policy: None,
        }
    }

    /// Builder-style [`Resource::set_property`].
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_property(key, value);
        self
    }

    /// Set a property, replacing any previous value.
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.properties.insert(key.into(), value.into());
    }

    /// Builder-style [`Resource::add_dependency`].
    #[must_use]
    pub fn with_dependency(mut self, logical_id: impl Into<String>) -> Self {
        self.add_dependency(logical_id);
        self
    }

    /// Make this resource wait for another resource at deploy time.
    pub fn add_dependency(&mut self, logical_id: impl Into<String>) {
        self.depends_on.insert(logical_id.into());
    }

    /// Set both the deletion and update-replace policy.
    #[must_use]
    pub fn with_removal_policy(mut self, policy: RemovalPolicy) -> Self {
        self.removal_policy = Some(policy);
        self
    }

    /// The CloudFormation resource type.
    #[must_use]
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Look up a property.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// All properties, in key order.
    #[must_use]
    pub fn properties(&self) -> &BTreeMap<String, Value> {
        &self.properties
    }

    /// Logical IDs this resource depends on, sorted.
    pub fn depends_on(&self) -> impl Iterator<Item = &str> {
        self.depends_on.iter().map(String::as_str)
    }

    /// The removal policy, if one was set.
    #[must_use]
    pub fn removal_policy(&self) -> Option<RemovalPolicy> {
        self.removal_policy
    }
}

impl Serialize for Resource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut m = serializer.serialize_map(None)?;
        m.serialize_entry("Type", &self.resource_type)?;
        if !self.properties.is_empty() {
            m.serialize_entry("Properties", &self.properties)?;
        }
        if !self.depends_on.is_empty() {
            m.serialize_entry("DependsOn", &self.depends_on)?;
        }
        if let Some(policy) = self.removal_policy {
            m.serialize_entry("UpdateReplacePolicy", policy.as_str())?;
            m.serialize_entry("DeletionPolicy", policy.as_str())?;
        }
        m.end()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_should_serialize_full_resource() {
        let resource = Resource::new(resource_types::LOGS_LOG_GROUP)
            .with_property("RetentionInDays", 90_u32)
            .with_property("KmsKeyId", Value::get_att("Key", "Arn"))
            .with_dependency("Key")
            .with_removal_policy(RemovalPolicy::Retain);
        assert_eq!(
            serde_json::to_value(&resource).unwrap(),
            json!({
                "Type": "AWS::Logs::LogGroup",
                "Properties": {
                    "KmsKeyId": {"Fn::GetAtt": ["Key", "Arn"]},
                    "RetentionInDays": 90,
                },
                "DependsOn": ["Key"],
                "UpdateReplacePolicy": "Retain",
                "DeletionPolicy": "Retain",
            })
        );
    }

    #[test]
    fn test_should_omit_empty_sections() {
        let resource = Resource::new(resource_types::CONFIG_RECORDER);
        assert_eq!(
            serde_json::to_value(&resource).unwrap(),
            json!({"Type": "AWS::Config::ConfigurationRecorder"})
        );
        assert!(resource.removal_policy().is_none());
        assert_eq!(resource.depends_on().count(), 0);
    }

    #[test]
    fn test_should_deduplicate_dependencies() {
        let mut resource = Resource::new(resource_types::CLOUDTRAIL_TRAIL);
        resource.add_dependency("Policy");
        resource.add_dependency("Policy");
        resource.add_dependency("LogsRole");
        assert_eq!(resource.depends_on().collect::<Vec<_>>(), ["LogsRole", "Policy"]);
    }

    #[test]
    fn test_should_map_removal_policies() {
        assert_eq!(RemovalPolicy::Destroy.as_str(), "Delete");
        assert_eq!(RemovalPolicy::default(), RemovalPolicy::Retain);
    }
}
