//! IAM policy documents.
//!
//! Statements are built up front and rendered into the template as plain
//! [`Value`] trees. Single-element action, resource and principal lists
//! render as scalars, the way IAM itself echoes them back.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::value::Value;

/// The policy language version every document is written in.
pub const POLICY_VERSION: &str = "2012-10-17";

/// Whether a statement allows or denies its actions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Effect {
    /// Grant the actions.
    #[default]
    Allow,
    /// Explicitly refuse the actions, overriding any allow.
    Deny,
}

impl Effect {
    /// Returns the policy-language spelling.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "Allow",
            Self::Deny => "Deny",
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The principal a statement applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    /// Anyone: `{"AWS": "*"}`.
    Any,
    /// An AWS service, e.g. `cloudtrail.amazonaws.com`.
    Service(String),
    /// An IAM principal ARN (account root, role, user).
    Aws(Value),
}

impl Principal {
    /// Service principal.
    #[must_use]
    pub fn service(name: impl Into<String>) -> Self {
        Self::Service(name.into())
    }

    /// ARN principal.
    #[must_use]
    pub fn aws(arn: impl Into<Value>) -> Self {
        Self::Aws(arn.into())
    }

    /// Key under which this principal is grouped in the `Principal` block.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Any | Self::Aws(_) => "AWS",
            Self::Service(_) => "Service",
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Self::Any => Value::from("*"),
            Self::Service(name) => Value::from(name.as_str()),
            Self::Aws(arn) => arn.clone(),
        }
    }
}

/// A single policy statement.
///
/// # Examples
///
/// ```
/// use baseline_template::{Effect, PolicyStatement, Principal};
///
/// let statement = PolicyStatement::deny()
///     .with_sid("Restrict Delete* Actions")
///     .with_action("s3:Delete*")
///     .with_principal(Principal::Any)
///     .with_resource("arn:aws:s3:::logs/*");
/// assert_eq!(statement.effect(), Effect::Deny);
/// assert!(statement.has_action("s3:Delete*"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyStatement {
    sid: Option<String>,
    effect: Effect,
    principals: Vec<Principal>,
    actions: Vec<String>,
    resources: Vec<Value>,
    conditions: BTreeMap<String, BTreeMap<String, Value>>,
}

impl PolicyStatement {
    /// An empty `Allow` statement.
    #[must_use]
    pub fn allow() -> Self {
        Self::default()
    }

    /// An empty `Deny` statement.
    #[must_use]
    pub fn deny() -> Self {
        Self {
            effect: Effect::Deny,
            ..Self::default()
        }
    }

    /// Set the statement ID.
    #[must_use]
    pub fn with_sid(mut self, sid: impl Into<String>) -> Self {
        self.sid = Some(sid.into());
        self
    }

    /// Add one action.
    #[must_use]
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.actions.push(action.into());
        self
    }

    /// Add several actions.
    #[must_use]
    pub fn with_actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.actions.extend(actions.into_iter().map(Into::into));
        self
    }

    /// Add a principal.
    #[must_use]
    pub fn with_principal(mut self, principal: Principal) -> Self {
        self.principals.push(principal);
        self
    }

    /// Add one resource.
    #[must_use]
    pub fn with_resource(mut self, resource: impl Into<Value>) -> Self {
        self.resources.push(resource.into());
        self
    }

    /// Add a condition, e.g. `("StringEquals", "kms:CallerAccount", account)`.
    ///
    /// Adding the same operator and key twice replaces the earlier value.
    #[must_use]
    pub fn with_condition(
        mut self,
        operator: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.conditions
            .entry(operator.into())
            .or_default()
            .insert(key.into(), value.into());
        self
    }

    /// Statement ID, if any.
    #[must_use]
    pub fn sid(&self) -> Option<&str> {
        self.sid.as_deref()
    }

    /// The statement effect.
    #[must_use]
    pub fn effect(&self) -> Effect {
        self.effect
    }

    /// The actions, in declaration order.
    #[must_use]
    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    /// Whether the statement lists exactly this action string.
    #[must_use]
    pub fn has_action(&self, action: &str) -> bool {
        self.actions.iter().any(|a| a == action)
    }

    /// The principals, in declaration order.
    #[must_use]
    pub fn principals(&self) -> &[Principal] {
        &self.principals
    }

    /// The resources, in declaration order.
    #[must_use]
    pub fn resources(&self) -> &[Value] {
        &self.resources
    }

    /// Look up a single condition value.
    #[must_use]
    pub fn condition(&self, operator: &str, key: &str) -> Option<&Value> {
        self.conditions.get(operator)?.get(key)
    }

    /// Render as a template value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut out = BTreeMap::new();

        out.insert(
            "Action".to_owned(),
            scalar_or_list(self.actions.iter().map(|a| Value::from(a.as_str())).collect()),
        );
        out.insert("Effect".to_owned(), Value::from(self.effect.as_str()));

        if !self.conditions.is_empty() {
            let conditions = self
                .conditions
                .iter()
                .map(|(op, entries)| (op.clone(), Value::Map(entries.clone())));
            out.insert("Condition".to_owned(), Value::map(conditions));
        }

        if !self.principals.is_empty() {
            let mut grouped: BTreeMap<&str, Vec<Value>> = BTreeMap::new();
            for principal in &self.principals {
                grouped
                    .entry(principal.kind())
                    .or_default()
                    .push(principal.to_value());
            }
            let principals = grouped
                .into_iter()
                .map(|(kind, values)| (kind, scalar_or_list(values)));
            out.insert("Principal".to_owned(), Value::map(principals));
        }

        if !self.resources.is_empty() {
            out.insert("Resource".to_owned(), scalar_or_list(self.resources.clone()));
        }

        if let Some(sid) = &self.sid {
            out.insert("Sid".to_owned(), Value::from(sid.as_str()));
        }

        Value::Map(out)
    }
}

fn scalar_or_list(mut values: Vec<Value>) -> Value {
    if values.len() == 1 {
        values.remove(0)
    } else {
        Value::List(values)
    }
}

impl Serialize for PolicyStatement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// An IAM policy document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyDocument {
    statements: Vec<PolicyStatement>,
}

impl PolicyDocument {
    /// An empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`PolicyDocument::add_statement`].
    #[must_use]
    pub fn with_statement(mut self, statement: PolicyStatement) -> Self {
        self.statements.push(statement);
        self
    }

    /// Append a statement.
    pub fn add_statement(&mut self, statement: PolicyStatement) {
        self.statements.push(statement);
    }

    /// The statements, in declaration order.
    #[must_use]
    pub fn statements(&self) -> &[PolicyStatement] {
        &self.statements
    }

    /// Whether the document has no statements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Render as a template value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::map([
            (
                "Statement",
                Value::List(self.statements.iter().map(PolicyStatement::to_value).collect()),
            ),
            ("Version", Value::from(POLICY_VERSION)),
        ])
    }
}

impl Serialize for PolicyDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}
