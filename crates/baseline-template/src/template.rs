//! The synthesized template.

use std::collections::BTreeMap;

use baseline_core::{BaselineError, BaselineResult};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::resource::Resource;
use crate::value::Value;

/// A stack output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    value: Value,
    description: Option<String>,
    export_name: Option<Value>,
}

impl Output {
    /// An output with the given value.
    #[must_use]
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            description: None,
            export_name: None,
        }
    }

    /// Attach a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Export the output for cross-stack references.
    #[must_use]
    pub fn with_export_name(mut self, name: impl Into<Value>) -> Self {
        self.export_name = Some(name.into());
        self
    }

    /// The output value.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The export name, if exported.
    #[must_use]
    pub fn export_name(&self) -> Option<&Value> {
        self.export_name.as_ref()
    }
}

impl Serialize for Output {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut m = serializer.serialize_map(None)?;
        if let Some(description) = &self.description {
            m.serialize_entry("Description", description)?;
        }
        m.serialize_entry("Value", &self.value)?;
        if let Some(name) = &self.export_name {
            m.serialize_entry("Export", &Value::map([("Name", name.clone())]))?;
        }
        m.end()
    }
}

/// A CloudFormation template.
///
/// # Examples
///
/// ```
/// use baseline_template::{Resource, Template, resource_types};
///
/// let mut template = Template::new();
/// template
///     .add_resource("Bucket", Resource::new(resource_types::S3_BUCKET))
///     .unwrap();
/// assert!(template.add_resource("Bucket", Resource::new(resource_types::S3_BUCKET)).is_err());
/// assert_eq!(template.count_of_type(resource_types::S3_BUCKET), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Template {
    description: Option<String>,
    resources: BTreeMap<String, Resource>,
    outputs: BTreeMap<String, Output>,
}

impl Template {
    /// An empty template.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the template description.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }

    /// Declare a resource.
    ///
    /// # Errors
    /// Returns [`BaselineError::DuplicateLogicalId`] if the ID is taken.
    pub fn add_resource(
        &mut self,
        logical_id: impl Into<String>,
        resource: Resource,
    ) -> BaselineResult<()> {
        let logical_id = logical_id.into();
        if self.resources.contains_key(&logical_id) {
            return Err(BaselineError::DuplicateLogicalId { id: logical_id });
        }
        debug!(
            logical_id = %logical_id,
            resource_type = %resource.resource_type(),
            "declared resource"
        );
        self.resources.insert(logical_id, resource);
        Ok(())
    }

    /// Declare an output.
    ///
    /// # Errors
    /// Returns [`BaselineError::DuplicateLogicalId`] if the ID is taken.
    pub fn add_output(
        &mut self,
        logical_id: impl Into<String>,
        output: Output,
    ) -> BaselineResult<()> {
        let logical_id = logical_id.into();
        if self.outputs.contains_key(&logical_id) {
            return Err(BaselineError::DuplicateLogicalId { id: logical_id });
        }
        self.outputs.insert(logical_id, output);
        Ok(())
    }

    /// Look up a resource by logical ID.
    #[must_use]
    pub fn resource(&self, logical_id: &str) -> Option<&Resource> {
        self.resources.get(logical_id)
    }

    /// Mutable lookup of a resource by logical ID.
    pub fn resource_mut(&mut self, logical_id: &str) -> Option<&mut Resource> {
        self.resources.get_mut(logical_id)
    }

    /// All resources, in logical-ID order.
    pub fn resources(&self) -> impl Iterator<Item = (&str, &Resource)> {
        self.resources.iter().map(|(id, r)| (id.as_str(), r))
    }

    /// Mutable iteration over all resources, in logical-ID order.
    pub fn resources_mut(&mut self) -> impl Iterator<Item = (&str, &mut Resource)> {
        self.resources.iter_mut().map(|(id, r)| (id.as_str(), r))
    }

    /// Resources of one type, in logical-ID order.
    pub fn resources_of_type<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a Resource)> + 'a {
        self.resources()
            .filter(move |(_, r)| r.resource_type() == resource_type)
    }

    /// Number of resources of one type.
    #[must_use]
    pub fn count_of_type(&self, resource_type: &str) -> usize {
        self.resources_of_type(resource_type).count()
    }

    /// Number of resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether the template declares no resources.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Look up an output by logical ID.
    #[must_use]
    pub fn output(&self, logical_id: &str) -> Option<&Output> {
        self.outputs.get(logical_id)
    }

    /// Render as pretty-printed JSON.
    pub fn to_json(&self) -> BaselineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Render as a [`serde_json::Value`] for inspection.
    pub fn to_json_value(&self) -> BaselineResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

impl Serialize for Template {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut m = serializer.serialize_map(None)?;
        if let Some(description) = &self.description {
            m.serialize_entry("Description", description)?;
        }
        m.serialize_entry("Resources", &self.resources)?;
        if !self.outputs.is_empty() {
            m.serialize_entry("Outputs", &self.outputs)?;
        }
        m.end()
    }
}
