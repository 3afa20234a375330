//! The stack scope every construct declares into.
//!
//! A [`Stack`] owns the resources declared so far, the IAM policy documents
//! still open for new statements, the deployment [`Environment`] and the
//! stack-level tags. Policy documents stay typed until [`Stack::synth`] so
//! that constructs can keep granting permissions after the owning resource
//! was declared (a trail adding statements to a bucket policy, for example).

use std::collections::BTreeMap;

use baseline_core::{BaselineError, BaselineResult, Environment};
use baseline_template::resource_types::{
    CLOUDTRAIL_TRAIL, CONFIG_DELIVERY_CHANNEL, CONFIG_RECORDER, IAM_ROLE, KMS_KEY, LOGS_LOG_GROUP,
    S3_BUCKET,
};
use baseline_template::{Output, PolicyDocument, Resource, Template, Value, pseudo};
use tracing::info;

/// Resource types that receive the stack tags.
pub const TAGGABLE_TYPES: &[&str] = &[
    CLOUDTRAIL_TRAIL,
    IAM_ROLE,
    KMS_KEY,
    LOGS_LOG_GROUP,
    S3_BUCKET,
];

/// Resource types AWS allows at most once per account and region.
pub const SINGLETON_TYPES: &[&str] = &[CONFIG_RECORDER, CONFIG_DELIVERY_CHANNEL];

/// A deployment scope.
///
/// # Examples
///
/// ```
/// use baseline_constructs::Stack;
/// use baseline_core::Environment;
///
/// let stack = Stack::new("Baseline", Environment::default());
/// let template = stack.synth().unwrap();
/// assert!(template.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct Stack {
    name: String,
    env: Environment,
    tags: BTreeMap<String, String>,
    template: Template,
    documents: BTreeMap<(String, String), PolicyDocument>,
}

impl Stack {
    /// An empty stack.
    #[must_use]
    pub fn new(name: impl Into<String>, env: Environment) -> Self {
        Self {
            name: name.into(),
            env,
            tags: BTreeMap::new(),
            template: Template::new(),
            documents: BTreeMap::new(),
        }
    }

    /// Replace the stack tags.
    #[must_use]
    pub fn with_tags(mut self, tags: BTreeMap<String, String>) -> Self {
        self.tags = tags;
        self
    }

    /// Set the template description.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.template.set_description(description);
    }

    /// The stack name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The deployment environment.
    #[must_use]
    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// The deploying account: a literal when known, else `AWS::AccountId`.
    #[must_use]
    pub fn account(&self) -> Value {
        self.env.account.as_ref().map_or_else(
            || Value::pseudo(pseudo::ACCOUNT_ID),
            |account| Value::from(account.as_str()),
        )
    }

    /// The deploying region: a literal when known, else `AWS::Region`.
    #[must_use]
    pub fn region(&self) -> Value {
        self.env.region.as_ref().map_or_else(
            || Value::pseudo(pseudo::REGION),
            |region| Value::from(region.as_str()),
        )
    }

    /// The partition, always resolved at deploy time.
    #[must_use]
    pub fn partition(&self) -> Value {
        Value::pseudo(pseudo::PARTITION)
    }

    /// ARN of the deploying account's root principal.
    #[must_use]
    pub fn account_root_arn(&self) -> Value {
        Value::concat([
            "arn:".into(),
            self.partition(),
            ":iam::".into(),
            self.account(),
            ":root".into(),
        ])
    }

    /// Declare a resource.
    ///
    /// # Errors
    /// Fails on a duplicate logical ID, or when a second instance of a
    /// per-account/region singleton type (configuration recorder, delivery
    /// channel) is declared.
    pub fn add_resource(&mut self, logical_id: &str, resource: Resource) -> BaselineResult<()> {
        let resource_type = resource.resource_type();
        if SINGLETON_TYPES.iter().any(|t| *t == resource_type) {
            if let Some((existing, _)) = self.template.resources_of_type(resource_type).next() {
                return Err(BaselineError::SingletonViolation {
                    resource_type: resource_type.to_owned(),
                    existing: existing.to_owned(),
                });
            }
        }
        self.template.add_resource(logical_id, resource)
    }

    /// Whether a resource with this logical ID was declared.
    #[must_use]
    pub fn contains(&self, logical_id: &str) -> bool {
        self.template.resource(logical_id).is_some()
    }

    /// Look up a declared resource.
    #[must_use]
    pub fn resource(&self, logical_id: &str) -> Option<&Resource> {
        self.template.resource(logical_id)
    }

    /// Make `logical_id` wait for `depends_on` at deploy time.
    pub fn add_dependency(&mut self, logical_id: &str, depends_on: &str) -> BaselineResult<()> {
        if !self.contains(depends_on) {
            return Err(BaselineError::UnknownResource {
                id: depends_on.to_owned(),
            });
        }
        self.template
            .resource_mut(logical_id)
            .ok_or_else(|| BaselineError::UnknownResource {
                id: logical_id.to_owned(),
            })?
            .add_dependency(depends_on);
        Ok(())
    }

    /// Attach a policy document that renders into `property` of a resource.
    pub fn attach_document(
        &mut self,
        logical_id: &str,
        property: &str,
        document: PolicyDocument,
    ) -> BaselineResult<()> {
        if !self.contains(logical_id) {
            return Err(BaselineError::UnknownResource {
                id: logical_id.to_owned(),
            });
        }
        self.documents
            .insert((logical_id.to_owned(), property.to_owned()), document);
        Ok(())
    }

    /// A previously attached policy document.
    #[must_use]
    pub fn document(&self, logical_id: &str, property: &str) -> Option<&PolicyDocument> {
        self.documents
            .get(&(logical_id.to_owned(), property.to_owned()))
    }

    /// Mutable access to a previously attached policy document.
    pub fn document_mut(
        &mut self,
        logical_id: &str,
        property: &str,
    ) -> Option<&mut PolicyDocument> {
        self.documents
            .get_mut(&(logical_id.to_owned(), property.to_owned()))
    }

    /// Declare a stack output.
    pub fn add_output(&mut self, logical_id: &str, output: Output) -> BaselineResult<()> {
        self.template.add_output(logical_id, output)
    }

    /// Produce the final template.
    ///
    /// Policy documents are rendered into their resources and the stack tags
    /// are applied to every taggable resource. The stack itself is left
    /// untouched, so synthesizing twice yields identical templates.
    pub fn synth(&self) -> BaselineResult<Template> {
        let mut template = self.template.clone();

        for ((logical_id, property), document) in &self.documents {
            template
                .resource_mut(logical_id)
                .ok_or_else(|| BaselineError::UnknownResource {
                    id: logical_id.clone(),
                })?
                .set_property(property.as_str(), document.to_value());
        }

        if !self.tags.is_empty() {
            let tags = Value::List(
                self.tags
                    .iter()
                    .map(|(key, value)| {
                        Value::map([("Key", Value::from(key)), ("Value", Value::from(value))])
                    })
                    .collect(),
            );
            for (_, resource) in template.resources_mut() {
                if TAGGABLE_TYPES.iter().any(|t| *t == resource.resource_type()) {
                    resource.set_property("Tags", tags.clone());
                }
            }
        }

        info!(
            stack = %self.name,
            env = %self.env,
            resources = template.len(),
            "synthesized stack"
        );

        Ok(template)
    }
}
