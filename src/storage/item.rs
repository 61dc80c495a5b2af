//! Attribute values, items, and primary keys.
//!
//! The table is schemaless apart from its composite primary key. Every
//! record carries a `PartitionKey` and a `SortKey` string attribute; the
//! remaining attributes depend on the entity shape encoded in the keys.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Partition key attribute name.
pub const PARTITION_KEY: &str = "PartitionKey";
/// Sort key attribute name.
pub const SORT_KEY: &str = "SortKey";

/// A single attribute value.
///
/// Mirrors the DynamoDB attribute value shapes the table uses. Serializes in
/// the externally tagged DynamoDB JSON form (`{"S": "..."}`), which is what
/// pagination tokens carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// String.
    #[serde(rename = "S")]
    S(String),
    /// Number, kept in its decimal string form.
    #[serde(rename = "N")]
    N(String),
    /// String set.
    #[serde(rename = "SS")]
    Ss(Vec<String>),
    /// Boolean.
    #[serde(rename = "BOOL")]
    Bool(bool),
    /// Explicit null.
    #[serde(rename = "NULL")]
    Null(bool),
}

impl AttributeValue {
    /// Borrow the string payload, if this is a string.
    pub fn as_s(&self) -> Option<&str> {
        match self {
            AttributeValue::S(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the string-set payload, if this is a string set.
    pub fn as_ss(&self) -> Option<&[String]> {
        match self {
            AttributeValue::Ss(values) => Some(values),
            _ => None,
        }
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::S(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::S(value.to_string())
    }
}

/// A stored record: attribute name to value.
pub type Item = BTreeMap<String, AttributeValue>;

/// Composite primary key of a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key {
    pub partition_key: String,
    pub sort_key: String,
}

impl Key {
    pub fn new(partition_key: impl Into<String>, sort_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            sort_key: sort_key.into(),
        }
    }

    /// Extract the primary key from an item.
    ///
    /// Returns `None` if either key attribute is missing or not a string.
    pub fn of(item: &Item) -> Option<Self> {
        let pk = item.get(PARTITION_KEY)?.as_s()?;
        let sk = item.get(SORT_KEY)?.as_s()?;
        Some(Self::new(pk, sk))
    }

    /// Key attributes as an item, as used for start keys and deletes.
    pub fn to_item(&self) -> Item {
        let mut item = Item::new();
        item.insert(
            PARTITION_KEY.to_string(),
            AttributeValue::S(self.partition_key.clone()),
        );
        item.insert(SORT_KEY.to_string(), AttributeValue::S(self.sort_key.clone()));
        item
    }
}
