//! Conversions between store items and DynamoDB attribute maps.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue as DynamoValue;

use crate::storage::{AttributeValue, Item, Key, Result, StorageError, PARTITION_KEY, SORT_KEY};

/// Attribute map as the SDK expects it.
pub type DynamoItem = HashMap<String, DynamoValue>;

pub fn to_dynamo_value(value: AttributeValue) -> DynamoValue {
    match value {
        AttributeValue::S(s) => DynamoValue::S(s),
        AttributeValue::N(n) => DynamoValue::N(n),
        AttributeValue::Ss(values) => DynamoValue::Ss(values),
        AttributeValue::Bool(b) => DynamoValue::Bool(b),
        AttributeValue::Null(b) => DynamoValue::Null(b),
    }
}

pub fn from_dynamo_value(name: &str, value: DynamoValue) -> Result<AttributeValue> {
    match value {
        DynamoValue::S(s) => Ok(AttributeValue::S(s)),
        DynamoValue::N(n) => Ok(AttributeValue::N(n)),
        DynamoValue::Ss(values) => Ok(AttributeValue::Ss(values)),
        DynamoValue::Bool(b) => Ok(AttributeValue::Bool(b)),
        DynamoValue::Null(b) => Ok(AttributeValue::Null(b)),
        other => Err(StorageError::Dynamo {
            operation: "decode",
            message: format!("unsupported attribute type for {}: {:?}", name, other),
        }),
    }
}

pub fn to_dynamo_item(item: Item) -> DynamoItem {
    item.into_iter()
        .map(|(name, value)| (name, to_dynamo_value(value)))
        .collect()
}

pub fn from_dynamo_item(item: DynamoItem) -> Result<Item> {
    item.into_iter()
        .map(|(name, value)| {
            let value = from_dynamo_value(&name, value)?;
            Ok((name, value))
        })
        .collect()
}

pub fn key_to_dynamo(key: &Key) -> DynamoItem {
    let mut map = HashMap::with_capacity(2);
    map.insert(
        PARTITION_KEY.to_string(),
        DynamoValue::S(key.partition_key.clone()),
    );
    map.insert(SORT_KEY.to_string(), DynamoValue::S(key.sort_key.clone()));
    map
}
