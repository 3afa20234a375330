//! Template values and intrinsic functions.
//!
//! A [`Value`] is either a literal (string, number, boolean, list, map) or
//! one of the intrinsic functions resolved by CloudFormation at deploy time
//! (`Ref`, `Fn::GetAtt`, `Fn::Join`).

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// CloudFormation pseudo parameters.
pub mod pseudo {
    /// The deploying account ID.
    pub const ACCOUNT_ID: &str = "AWS::AccountId";
    /// The deploying region.
    pub const REGION: &str = "AWS::Region";
    /// The partition (`aws`, `aws-cn`, `aws-us-gov`).
    pub const PARTITION: &str = "AWS::Partition";
    /// The stack name.
    pub const STACK_NAME: &str = "AWS::StackName";
}

/// A value inside a CloudFormation template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A literal string.
    String(String),
    /// A literal integer.
    Number(i64),
    /// A literal boolean.
    Bool(bool),
    /// A list of values.
    List(Vec<Value>),
    /// A map of values, serialized in key order.
    Map(BTreeMap<String, Value>),
    /// `{"Ref": id}`: a resource's primary identifier or a pseudo parameter.
    Ref(String),
    /// `{"Fn::GetAtt": [id, attribute]}`.
    GetAtt {
        /// Logical ID of the resource.
        logical_id: String,
        /// Attribute name, e.g. `Arn`.
        attribute: String,
    },
    /// `{"Fn::Join": [delimiter, [parts...]]}`.
    Join {
        /// Delimiter placed between parts.
        delimiter: String,
        /// Parts to join.
        parts: Vec<Value>,
    },
}

impl Value {
    /// `Ref` to a resource or parameter.
    #[must_use]
    pub fn reference(logical_id: impl Into<String>) -> Self {
        Self::Ref(logical_id.into())
    }

    /// `Fn::GetAtt` on a resource attribute.
    #[must_use]
    pub fn get_att(logical_id: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::GetAtt {
            logical_id: logical_id.into(),
            attribute: attribute.into(),
        }
    }

    /// `Ref` to a pseudo parameter, see [`pseudo`].
    #[must_use]
    pub fn pseudo(name: &str) -> Self {
        Self::Ref(name.to_owned())
    }

    /// Build a map from `(key, value)` pairs.
    #[must_use]
    pub fn map<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Build a list.
    #[must_use]
    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Concatenate values into a single string value.
    ///
    /// Nested concatenations are flattened and adjacent literals merged, so
    /// a concatenation of literals is itself a literal and
    /// `Fn::Join` is only emitted when something is resolved at deploy time.
    ///
    /// # Examples
    ///
    /// ```
    /// use baseline_template::Value;
    ///
    /// let literal = Value::concat(["AWSLogs/".into(), "123456789012".into(), "/*".into()]);
    /// assert_eq!(literal.as_str(), Some("AWSLogs/123456789012/*"));
    ///
    /// let joined = Value::concat([Value::get_att("Bucket", "Arn"), "/*".into()]);
    /// assert!(joined.as_str().is_none());
    /// ```
    #[must_use]
    pub fn concat<I>(parts: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        let mut out: Vec<Value> = Vec::new();
        for part in parts {
            match part {
                Self::Join { delimiter, parts } if delimiter.is_empty() => {
                    for inner in parts {
                        push_merged(&mut out, inner);
                    }
                }
                other => push_merged(&mut out, other),
            }
        }

        match out.len() {
            0 => Self::String(String::new()),
            1 => out.pop().unwrap_or_default(),
            _ => Self::Join {
                delimiter: String::new(),
                parts: out,
            },
        }
    }

    /// Join values with a delimiter; literals are joined eagerly.
    #[must_use]
    pub fn join<I>(delimiter: &str, parts: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        let parts: Vec<Value> = parts.into_iter().collect();
        if parts.iter().all(|p| matches!(p, Self::String(_))) {
            let literals: Vec<&str> = parts.iter().filter_map(Self::as_str).collect();
            return Self::String(literals.join(delimiter));
        }
        Self::Join {
            delimiter: delimiter.to_owned(),
            parts,
        }
    }

    /// The literal string, if this is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The list items, if this is a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Look up a key, if this is a map.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Map(map) => map.get(key),
            _ => None,
        }
    }

    /// Whether the value is fully known at synthesis time.
    #[must_use]
    pub fn is_literal(&self) -> bool {
        match self {
            Self::String(_) | Self::Number(_) | Self::Bool(_) => true,
            Self::List(items) => items.iter().all(Self::is_literal),
            Self::Map(map) => map.values().all(Self::is_literal),
            Self::Ref(_) | Self::GetAtt { .. } | Self::Join { .. } => false,
        }
    }
}

fn push_merged(out: &mut Vec<Value>, value: Value) {
    if let Value::String(s) = &value {
        if s.is_empty() {
            return;
        }
        if let Some(Value::String(last)) = out.last_mut() {
            last.push_str(s);
            return;
        }
    }
    out.push(value);
}

impl Default for Value {
    fn default() -> Self {
        Self::String(String::new())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Self::String(s.clone())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Number(i64::from(n))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::String(s) => serializer.serialize_str(s),
            Self::Number(n) => serializer.serialize_i64(*n),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::List(items) => items.serialize(serializer),
            Self::Map(map) => map.serialize(serializer),
            Self::Ref(id) => {
                let mut m = serializer.serialize_map(Some(1))?;
                m.serialize_entry("Ref", id)?;
                m.end()
            }
            Self::GetAtt {
                logical_id,
                attribute,
            } => {
                let mut m = serializer.serialize_map(Some(1))?;
                m.serialize_entry("Fn::GetAtt", &[logical_id, attribute])?;
                m.end()
            }
            Self::Join { delimiter, parts } => {
                let mut m = serializer.serialize_map(Some(1))?;
                m.serialize_entry("Fn::Join", &(delimiter, parts))?;
                m.end()
            }
        }
    }
}
