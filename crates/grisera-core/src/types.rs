//! Core domain types for the GRISERA graph.
//!
//! Every GRISERA entity (recording, participant state, measure, ...) is one
//! labeled node carrying scalar properties plus named directed edges to
//! other nodes. These types are shared by the graph drivers and the mapper.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GriseraError, Result};

// ── Identity ──────────────────────────────────────────────────────

/// Identifier assigned to a node by the graph store at creation time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct NodeId(pub i64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for NodeId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

// ── Properties ────────────────────────────────────────────────────

/// A scalar value stored on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl PropertyValue {
    /// Interpret the value as a node id, if it holds an integer
    /// (or a string spelling one).
    pub fn as_node_id(&self) -> Option<NodeId> {
        match self {
            Self::Int(i) => Some(NodeId(*i)),
            Self::String(s) => s.trim().parse::<i64>().ok().map(NodeId),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for PropertyValue {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

/// A single key/value pair as it travels on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub key: String,
    pub value: PropertyValue,
}

/// Ordered property list with unique keys.
///
/// Iteration and serialization keep insertion order. Equality does not:
/// two lists holding the same pairs in a different order are equal.
/// A repeated key on the wire collapses to one entry holding the last value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Property>", into = "Vec<Property>")]
pub struct Properties(Vec<Property>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`. An existing key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|p| p.key == key) {
            Some(existing) => existing.value = value,
            None => self.0.push(Property { key, value }),
        }
    }

    /// Builder form of [`Properties::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.0.iter().find(|p| p.key == key).map(|p| &p.value)
    }

    pub fn remove(&mut self, key: &str) -> Option<PropertyValue> {
        let pos = self.0.iter().position(|p| p.key == key)?;
        Some(self.0.remove(pos).value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.iter().any(|p| p.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|p| p.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Build a property list from a flat JSON object.
    ///
    /// `null` members are dropped (an absent property and a null one are the
    /// same thing on a node). Arrays and nested objects are rejected.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| GriseraError::InvalidProperty {
            key: String::new(),
            reason: "expected a JSON object".to_string(),
        })?;

        let mut props = Self::new();
        for (key, v) in object {
            let value = match v {
                serde_json::Value::Null => continue,
                serde_json::Value::Bool(b) => PropertyValue::Bool(*b),
                serde_json::Value::Number(n) => match n.as_i64() {
                    Some(i) => PropertyValue::Int(i),
                    None => PropertyValue::Float(n.as_f64().unwrap_or_default()),
                },
                serde_json::Value::String(s) => PropertyValue::String(s.clone()),
                _ => {
                    return Err(GriseraError::InvalidProperty {
                        key: key.clone(),
                        reason: "only boolean, number and string values are allowed".to_string(),
                    })
                }
            };
            props.insert(key.clone(), value);
        }
        Ok(props)
    }
}

impl PartialEq for Properties {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|p| other.get(&p.key).is_some_and(|v| *v == p.value))
    }
}

impl FromIterator<Property> for Properties {
    fn from_iter<I: IntoIterator<Item = Property>>(iter: I) -> Self {
        let mut props = Self::new();
        for p in iter {
            props.insert(p.key, p.value);
        }
        props
    }
}

impl From<Vec<Property>> for Properties {
    fn from(list: Vec<Property>) -> Self {
        list.into_iter().collect()
    }
}

impl From<Properties> for Vec<Property> {
    fn from(props: Properties) -> Self {
        props.0
    }
}

impl<'a> IntoIterator for &'a Properties {
    type Item = &'a Property;
    type IntoIter = std::slice::Iter<'a, Property>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ── Entities ──────────────────────────────────────────────────────

/// One edge incident to an entity, seen from that entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationInformation {
    /// The node on the other end of the edge.
    pub second_node_id: NodeId,
    /// Relationship type, e.g. `hasParticipation`.
    pub name: String,
    /// Store id of the edge itself.
    pub relation_id: i64,
}

/// A fully materialized entity: node, properties, and incident edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEntity {
    pub id: NodeId,
    pub label: String,
    #[serde(rename = "additional_properties")]
    pub properties: Properties,
    /// Edges where this entity is the start node.
    pub relations: Vec<RelationInformation>,
    /// Edges where this entity is the end node.
    pub reversed_relations: Vec<RelationInformation>,
}

/// Listing projection: identity and properties, no edge expansion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicEntity {
    pub id: NodeId,
    #[serde(rename = "additional_properties")]
    pub properties: Properties,
}

// ── Raw store records ─────────────────────────────────────────────

/// A node as returned by a graph store driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub labels: Vec<String>,
    pub properties: Properties,
}

impl NodeRecord {
    /// The label used for type checks. Multi-label nodes are judged by
    /// their first label only.
    pub fn primary_label(&self) -> Option<&str> {
        self.labels.first().map(String::as_str)
    }
}

/// A relationship as returned by a graph store driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipRecord {
    pub id: i64,
    pub start_node: NodeId,
    pub end_node: NodeId,
    pub name: String,
}
