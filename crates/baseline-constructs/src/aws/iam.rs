//! IAM role construct.

use baseline_core::{BaselineError, BaselineResult};
use baseline_template::resource_types::{IAM_POLICY, IAM_ROLE};
use baseline_template::{PolicyDocument, PolicyStatement, Principal, Resource, Value, pseudo};
use typed_builder::TypedBuilder;

use crate::stack::Stack;

const ASSUME_ROLE_POLICY: &str = "AssumeRolePolicyDocument";
const POLICY_DOCUMENT: &str = "PolicyDocument";

/// A managed policy attached to a role by ARN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedPolicy {
    arn: Value,
}

impl ManagedPolicy {
    /// An AWS managed policy, e.g. `service-role/AWS_ConfigRole`.
    #[must_use]
    pub fn from_aws_managed_policy_name(name: &str) -> Self {
        Self {
            arn: Value::concat([
                "arn:".into(),
                Value::pseudo(pseudo::PARTITION),
                ":iam::aws:policy/".into(),
                name.into(),
            ]),
        }
    }

    /// A policy by explicit ARN.
    #[must_use]
    pub fn from_arn(arn: impl Into<Value>) -> Self {
        Self { arn: arn.into() }
    }

    /// The policy ARN.
    #[must_use]
    pub fn arn(&self) -> &Value {
        &self.arn
    }
}

/// Role settings.
#[derive(Debug, Clone, TypedBuilder)]
pub struct RoleProps {
    /// Principal allowed to assume the role.
    pub assumed_by: Principal,
    /// Managed policies attached to the role.
    #[builder(default)]
    pub managed_policies: Vec<ManagedPolicy>,
    /// Human-readable description.
    #[builder(default, setter(strip_option, into))]
    pub description: Option<String>,
}

/// Handle to a declared role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    logical_id: String,
}

impl Role {
    /// Declare a role trusting `props.assumed_by`.
    pub fn new(stack: &mut Stack, logical_id: &str, props: RoleProps) -> BaselineResult<Self> {
        let mut resource = Resource::new(IAM_ROLE);
        if !props.managed_policies.is_empty() {
            resource.set_property(
                "ManagedPolicyArns",
                Value::List(props.managed_policies.iter().map(|p| p.arn.clone()).collect()),
            );
        }
        if let Some(description) = &props.description {
            resource.set_property("Description", description.as_str());
        }
        stack.add_resource(logical_id, resource)?;

        let trust = PolicyStatement::allow()
            .with_action("sts:AssumeRole")
            .with_principal(props.assumed_by);
        stack.attach_document(
            logical_id,
            ASSUME_ROLE_POLICY,
            PolicyDocument::new().with_statement(trust),
        )?;

        Ok(Self {
            logical_id: logical_id.to_owned(),
        })
    }

    /// Logical ID of the role.
    #[must_use]
    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    /// Logical ID of the inline policy created by [`Role::add_to_policy`].
    #[must_use]
    pub fn default_policy_id(&self) -> String {
        format!("{}DefaultPolicy", self.logical_id)
    }

    /// The role ARN.
    #[must_use]
    pub fn arn(&self) -> Value {
        Value::get_att(&self.logical_id, "Arn")
    }

    /// The role name (`Ref`).
    #[must_use]
    pub fn role_name(&self) -> Value {
        Value::reference(&self.logical_id)
    }

    /// The role as a policy principal.
    #[must_use]
    pub fn principal(&self) -> Principal {
        Principal::aws(self.arn())
    }

    /// Grant the role a permission through its default inline policy,
    /// declaring the policy on first use.
    pub fn add_to_policy(
        &self,
        stack: &mut Stack,
        statement: PolicyStatement,
    ) -> BaselineResult<()> {
        let policy_id = self.default_policy_id();
        if !stack.contains(&policy_id) {
            stack.add_resource(
                &policy_id,
                Resource::new(IAM_POLICY)
                    .with_property("PolicyName", policy_id.as_str())
                    .with_property("Roles", Value::List(vec![self.role_name()])),
            )?;
            stack.attach_document(&policy_id, POLICY_DOCUMENT, PolicyDocument::new())?;
        }
        stack
            .document_mut(&policy_id, POLICY_DOCUMENT)
            .ok_or(BaselineError::UnknownResource { id: policy_id })?
            .add_statement(statement);
        Ok(())
    }
}
