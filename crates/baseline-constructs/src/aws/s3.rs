//! S3 bucket construct.

use baseline_core::{BaselineError, BaselineResult};
use baseline_template::resource_types::{S3_BUCKET, S3_BUCKET_POLICY};
use baseline_template::{PolicyDocument, PolicyStatement, Principal, RemovalPolicy, Resource, Value};
use typed_builder::TypedBuilder;

use crate::stack::Stack;
use crate::validation::validate_bucket_name;

/// Property holding a bucket policy's document.
const POLICY_DOCUMENT: &str = "PolicyDocument";

/// Canned ACL applied to a bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BucketAccessControl {
    /// Owner gets full control, nobody else has access.
    #[default]
    Private,
    /// The log delivery group may write objects (server access log targets).
    LogDeliveryWrite,
}

impl BucketAccessControl {
    /// Returns the `AccessControl` property value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Private => "Private",
            Self::LogDeliveryWrite => "LogDeliveryWrite",
        }
    }
}

/// Default server-side encryption.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BucketEncryption {
    /// SSE-S3 (`AES256`).
    #[default]
    S3Managed,
    /// SSE-KMS with the AWS managed `aws/s3` key.
    KmsManaged,
}

impl BucketEncryption {
    /// Returns the `SSEAlgorithm` value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::S3Managed => "AES256",
            Self::KmsManaged => "aws:kms",
        }
    }
}

/// Where a bucket ships its server access logs.
#[derive(Debug, Clone)]
pub struct AccessLogDestination {
    /// Target bucket.
    pub bucket: Bucket,
    /// Key prefix in the target bucket.
    pub prefix: String,
}

/// Bucket settings.
///
/// Defaults are the secure ones: versioned, SSE-S3, all public access
/// blocked, TLS enforced, retained on stack deletion.
#[derive(Debug, Clone, TypedBuilder)]
pub struct BucketProps {
    /// Globally unique bucket name.
    #[builder(setter(into))]
    pub bucket_name: String,
    /// Canned ACL.
    #[builder(default)]
    pub access_control: BucketAccessControl,
    /// Default encryption.
    #[builder(default)]
    pub encryption: BucketEncryption,
    /// Keep every object version.
    #[builder(default = true)]
    pub versioned: bool,
    /// Turn on all four public access block settings.
    #[builder(default = true)]
    pub block_public_access: bool,
    /// Deny any request not made over TLS.
    #[builder(default = true)]
    pub enforce_ssl: bool,
    /// Expire objects after this many days.
    #[builder(default, setter(strip_option))]
    pub expiration_days: Option<u32>,
    /// Server access logging destination.
    #[builder(default, setter(strip_option))]
    pub server_access_logs: Option<AccessLogDestination>,
    /// Deletion / update-replace policy.
    #[builder(default)]
    pub removal_policy: RemovalPolicy,
}

/// Handle to a declared bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    logical_id: String,
}

impl Bucket {
    /// Declare a bucket.
    ///
    /// # Errors
    /// Fails when the bucket name violates the S3 naming rules or the
    /// logical ID is taken.
    pub fn new(stack: &mut Stack, logical_id: &str, props: BucketProps) -> BaselineResult<Self> {
        validate_bucket_name(&props.bucket_name)?;

        let mut resource = Resource::new(S3_BUCKET)
            .with_property("BucketName", props.bucket_name.as_str())
            .with_property("AccessControl", props.access_control.as_str())
            .with_property(
                "BucketEncryption",
                Value::map([(
                    "ServerSideEncryptionConfiguration",
                    Value::List(vec![Value::map([(
                        "ServerSideEncryptionByDefault",
                        Value::map([("SSEAlgorithm", Value::from(props.encryption.as_str()))]),
                    )])]),
                )]),
            )
            .with_removal_policy(props.removal_policy);

        if props.access_control == BucketAccessControl::LogDeliveryWrite {
            // ACL-based log delivery needs object-writer ownership.
            resource.set_property(
                "OwnershipControls",
                Value::map([(
                    "Rules",
                    Value::List(vec![Value::map([(
                        "ObjectOwnership",
                        Value::from("ObjectWriter"),
                    )])]),
                )]),
            );
        }

        if props.block_public_access {
            resource.set_property(
                "PublicAccessBlockConfiguration",
                Value::map([
                    ("BlockPublicAcls", Value::from(true)),
                    ("BlockPublicPolicy", Value::from(true)),
                    ("IgnorePublicAcls", Value::from(true)),
                    ("RestrictPublicBuckets", Value::from(true)),
                ]),
            );
        }

        if props.versioned {
            resource.set_property(
                "VersioningConfiguration",
                Value::map([("Status", Value::from("Enabled"))]),
            );
        }

        if let Some(days) = props.expiration_days {
            resource.set_property(
                "LifecycleConfiguration",
                Value::map([(
                    "Rules",
                    Value::List(vec![Value::map([
                        ("ExpirationInDays", Value::from(days)),
                        ("Status", Value::from("Enabled")),
                    ])]),
                )]),
            );
        }

        if let Some(logs) = &props.server_access_logs {
            resource.set_property(
                "LoggingConfiguration",
                Value::map([
                    ("DestinationBucketName", logs.bucket.bucket_name()),
                    ("LogFilePrefix", Value::from(logs.prefix.as_str())),
                ]),
            );
        }

        stack.add_resource(logical_id, resource)?;
        let bucket = Self {
            logical_id: logical_id.to_owned(),
        };

        if props.enforce_ssl {
            bucket.add_to_resource_policy(
                stack,
                PolicyStatement::deny()
                    .with_action("s3:*")
                    .with_principal(Principal::Any)
                    .with_resource(bucket.arn())
                    .with_resource(bucket.arn_for_objects("*"))
                    .with_condition("Bool", "aws:SecureTransport", "false"),
            )?;
        }

        Ok(bucket)
    }

    /// Logical ID of the bucket.
    #[must_use]
    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    /// Logical ID of the bucket policy (present once a statement was added).
    #[must_use]
    pub fn policy_id(&self) -> String {
        format!("{}Policy", self.logical_id)
    }

    /// The bucket name (`Ref`).
    #[must_use]
    pub fn bucket_name(&self) -> Value {
        Value::reference(&self.logical_id)
    }

    /// The bucket ARN.
    #[must_use]
    pub fn arn(&self) -> Value {
        Value::get_att(&self.logical_id, "Arn")
    }

    /// ARN pattern for objects, e.g. `arn_for_objects("*")`.
    #[must_use]
    pub fn arn_for_objects(&self, key_pattern: impl Into<Value>) -> Value {
        Value::concat([self.arn(), "/".into(), key_pattern.into()])
    }

    /// Add a statement to the bucket policy, declaring the policy on first use.
    pub fn add_to_resource_policy(
        &self,
        stack: &mut Stack,
        statement: PolicyStatement,
    ) -> BaselineResult<()> {
        let policy_id = self.policy_id();
        if !stack.contains(&policy_id) {
            stack.add_resource(
                &policy_id,
                Resource::new(S3_BUCKET_POLICY).with_property("Bucket", self.bucket_name()),
            )?;
            stack.attach_document(&policy_id, POLICY_DOCUMENT, PolicyDocument::new())?;
        }
        stack
            .document_mut(&policy_id, POLICY_DOCUMENT)
            .ok_or(BaselineError::UnknownResource { id: policy_id })?
            .add_statement(statement);
        Ok(())
    }

    /// The bucket policy document, if one was declared.
    #[must_use]
    pub fn policy<'a>(&self, stack: &'a Stack) -> Option<&'a PolicyDocument> {
        stack.document(&self.policy_id(), POLICY_DOCUMENT)
    }

    /// Deny `s3:Delete*` on every object to every principal.
    pub fn deny_object_deletion(&self, stack: &mut Stack) -> BaselineResult<()> {
        self.add_to_resource_policy(
            stack,
            PolicyStatement::deny()
                .with_sid("Restrict Delete* Actions")
                .with_action("s3:Delete*")
                .with_principal(Principal::Any)
                .with_resource(self.arn_for_objects("*")),
        )
    }
}

#[cfg(test)]
mod tests {
    use baseline_core::Environment;
    use baseline_template::Effect;
    use serde_json::json;

    use super::*;

    fn stack() -> Stack {
        Stack::new("Test", Environment::default())
    }

    #[test]
    fn test_should_declare_secure_defaults() {
        let mut stack = stack();
        Bucket::new(
            &mut stack,
            "Logs",
            BucketProps::builder().bucket_name("acme-logs").build(),
        )
        .unwrap();

        let template = stack.synth().unwrap().to_json_value().unwrap();
        let bucket = &template["Resources"]["Logs"];
        assert_eq!(bucket["Type"], "AWS::S3::Bucket");
        assert_eq!(bucket["DeletionPolicy"], "Retain");
        assert_eq!(bucket["Properties"]["AccessControl"], "Private");
        assert_eq!(
            bucket["Properties"]["VersioningConfiguration"],
            json!({"Status": "Enabled"})
        );
        assert_eq!(
            bucket["Properties"]["PublicAccessBlockConfiguration"],
            json!({
                "BlockPublicAcls": true,
                "BlockPublicPolicy": true,
                "IgnorePublicAcls": true,
                "RestrictPublicBuckets": true,
            })
        );
        assert_eq!(
            bucket["Properties"]["BucketEncryption"]["ServerSideEncryptionConfiguration"][0]
                ["ServerSideEncryptionByDefault"]["SSEAlgorithm"],
            "AES256"
        );
        assert!(bucket["Properties"].get("OwnershipControls").is_none());
        assert!(bucket["Properties"].get("LifecycleConfiguration").is_none());
    }

    #[test]
    fn test_should_enforce_ssl_in_bucket_policy() {
        let mut stack = stack();
        let bucket = Bucket::new(
            &mut stack,
            "Logs",
            BucketProps::builder().bucket_name("acme-logs").build(),
        )
        .unwrap();

        let policy = bucket.policy(&stack).unwrap();
        let statement = &policy.statements()[0];
        assert_eq!(statement.effect(), Effect::Deny);
        assert!(statement.has_action("s3:*"));
        assert_eq!(
            statement.condition("Bool", "aws:SecureTransport"),
            Some(&Value::from("false"))
        );
        assert_eq!(statement.resources().len(), 2);

        let template = stack.synth().unwrap().to_json_value().unwrap();
        assert_eq!(
            template["Resources"]["LogsPolicy"]["Properties"]["Bucket"],
            json!({"Ref": "Logs"})
        );
    }

    #[test]
    fn test_should_configure_log_delivery_target() {
        let mut stack = stack();
        let target = Bucket::new(
            &mut stack,
            "AccessLogs",
            BucketProps::builder()
                .bucket_name("acme-access-logs")
                .access_control(BucketAccessControl::LogDeliveryWrite)
                .expiration_days(1825)
                .build(),
        )
        .unwrap();
        Bucket::new(
            &mut stack,
            "Trail",
            BucketProps::builder()
                .bucket_name("acme-trail")
                .server_access_logs(AccessLogDestination {
                    bucket: target,
                    prefix: "cloudtraillogs".to_owned(),
                })
                .build(),
        )
        .unwrap();

        let template = stack.synth().unwrap().to_json_value().unwrap();
        let access = &template["Resources"]["AccessLogs"]["Properties"];
        assert_eq!(access["AccessControl"], "LogDeliveryWrite");
        assert_eq!(
            access["OwnershipControls"],
            json!({"Rules": [{"ObjectOwnership": "ObjectWriter"}]})
        );
        assert_eq!(
            access["LifecycleConfiguration"],
            json!({"Rules": [{"ExpirationInDays": 1825, "Status": "Enabled"}]})
        );
        assert_eq!(
            template["Resources"]["Trail"]["Properties"]["LoggingConfiguration"],
            json!({
                "DestinationBucketName": {"Ref": "AccessLogs"},
                "LogFilePrefix": "cloudtraillogs",
            })
        );
    }

    #[test]
    fn test_should_deny_object_deletion() {
        let mut stack = stack();
        let bucket = Bucket::new(
            &mut stack,
            "Logs",
            BucketProps::builder()
                .bucket_name("acme-logs")
                .enforce_ssl(false)
                .build(),
        )
        .unwrap();
        assert!(bucket.policy(&stack).is_none());

        bucket.deny_object_deletion(&mut stack).unwrap();
        let statement = &bucket.policy(&stack).unwrap().statements()[0];
        assert_eq!(statement.sid(), Some("Restrict Delete* Actions"));
        assert_eq!(statement.principals(), [Principal::Any]);
        assert_eq!(
            serde_json::to_value(&statement.resources()[0]).unwrap(),
            json!({"Fn::Join": ["", [{"Fn::GetAtt": ["Logs", "Arn"]}, "/*"]]})
        );
    }

    #[test]
    fn test_should_reject_invalid_bucket_name() {
        let mut stack = stack();
        let result = Bucket::new(
            &mut stack,
            "Logs",
            BucketProps::builder().bucket_name("Not_Valid").build(),
        );
        assert!(matches!(result, Err(BaselineError::InvalidBucketName { .. })));
        assert!(!stack.contains("Logs"));
    }
}
