//! Customer-managed KMS key construct.

use baseline_core::{BaselineError, BaselineResult};
use baseline_template::resource_types::{KMS_ALIAS, KMS_KEY};
use baseline_template::{PolicyDocument, PolicyStatement, Principal, RemovalPolicy, Resource, Value};
use typed_builder::TypedBuilder;

use crate::stack::Stack;

/// Property holding the key policy.
const KEY_POLICY: &str = "KeyPolicy";

/// Alias names must live under this prefix.
const ALIAS_PREFIX: &str = "alias/";

/// Key settings.
#[derive(Debug, Clone, TypedBuilder)]
pub struct KeyProps {
    /// Human-readable description.
    #[builder(default, setter(strip_option, into))]
    pub description: Option<String>,
    /// Rotate the key material yearly.
    #[builder(default = false)]
    pub enable_key_rotation: bool,
    /// Alias, with or without the `alias/` prefix.
    #[builder(default, setter(strip_option, into))]
    pub alias: Option<String>,
    /// Deletion / update-replace policy.
    #[builder(default)]
    pub removal_policy: RemovalPolicy,
}

/// Handle to a declared key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    logical_id: String,
    alias_id: Option<String>,
}

impl Key {
    /// Declare a key.
    ///
    /// The key policy starts with a statement giving the account root full
    /// control, so IAM policies in the account can manage the key.
    pub fn new(stack: &mut Stack, logical_id: &str, props: KeyProps) -> BaselineResult<Self> {
        let alias_name = props.alias.as_deref().map(normalize_alias).transpose()?;

        let mut resource = Resource::new(KMS_KEY)
            .with_property("EnableKeyRotation", props.enable_key_rotation)
            .with_removal_policy(props.removal_policy);
        if let Some(description) = &props.description {
            resource.set_property("Description", description.as_str());
        }
        stack.add_resource(logical_id, resource)?;

        let admin = PolicyStatement::allow()
            .with_action("kms:*")
            .with_principal(Principal::aws(stack.account_root_arn()))
            .with_resource("*");
        stack.attach_document(
            logical_id,
            KEY_POLICY,
            PolicyDocument::new().with_statement(admin),
        )?;

        let alias_id = match alias_name {
            Some(alias_name) => {
                let alias_id = format!("{logical_id}Alias");
                stack.add_resource(
                    &alias_id,
                    Resource::new(KMS_ALIAS)
                        .with_property("AliasName", alias_name)
                        .with_property("TargetKeyId", Value::get_att(logical_id, "Arn")),
                )?;
                Some(alias_id)
            }
            None => None,
        };

        Ok(Self {
            logical_id: logical_id.to_owned(),
            alias_id,
        })
    }

    /// Logical ID of the key.
    #[must_use]
    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    /// Logical ID of the alias, if one was declared.
    #[must_use]
    pub fn alias_id(&self) -> Option<&str> {
        self.alias_id.as_deref()
    }

    /// The key ID (`Ref`).
    #[must_use]
    pub fn key_id(&self) -> Value {
        Value::reference(&self.logical_id)
    }

    /// The key ARN.
    #[must_use]
    pub fn arn(&self) -> Value {
        Value::get_att(&self.logical_id, "Arn")
    }

    /// Append a statement to the key policy.
    pub fn add_to_resource_policy(
        &self,
        stack: &mut Stack,
        statement: PolicyStatement,
    ) -> BaselineResult<()> {
        stack
            .document_mut(&self.logical_id, KEY_POLICY)
            .ok_or_else(|| BaselineError::UnknownResource {
                id: self.logical_id.clone(),
            })?
            .add_statement(statement);
        Ok(())
    }

    /// The key policy.
    #[must_use]
    pub fn policy<'a>(&self, stack: &'a Stack) -> Option<&'a PolicyDocument> {
        stack.document(&self.logical_id, KEY_POLICY)
    }
}

fn normalize_alias(alias: &str) -> BaselineResult<String> {
    let name = if alias.starts_with(ALIAS_PREFIX) {
        alias.to_owned()
    } else {
        format!("{ALIAS_PREFIX}{alias}")
    };
    if name.len() == ALIAS_PREFIX.len() {
        return Err(BaselineError::Config("KMS alias must not be empty".to_owned()));
    }
    if name.starts_with("alias/aws/") {
        return Err(BaselineError::Config(format!(
            "KMS alias {name} uses the reserved alias/aws/ prefix"
        )));
    }
    Ok(name)
}
