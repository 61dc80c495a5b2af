//! DynamoDB Store implementation.

use async_trait::async_trait;
use aws_sdk_dynamodb::error::{DisplayErrorContext, SdkError};
use aws_sdk_dynamodb::types::{
    AttributeValue as DynamoValue, DeleteRequest, KeysAndAttributes, PutRequest,
    WriteRequest as DynamoWriteRequest,
};
use aws_sdk_dynamodb::Client;
use tracing::{debug, info};

use super::convert::{from_dynamo_item, key_to_dynamo, to_dynamo_item, DynamoItem};
use crate::storage::{
    Item, Key, QueryPage, RangeQuery, Result, SortKeyCondition, StorageError, Store,
    WriteRequest, PARTITION_KEY,
};

/// `BatchWriteItem` accepts at most 25 requests.
const MAX_BATCH_WRITE: usize = 25;
/// `BatchGetItem` accepts at most 100 keys.
const MAX_BATCH_GET: usize = 100;

fn dynamo_error<E>(operation: &'static str, err: E) -> StorageError
where
    E: std::error::Error + Send + Sync + 'static,
{
    StorageError::Dynamo {
        operation,
        message: DisplayErrorContext(err).to_string(),
    }
}

/// DynamoDB implementation of Store.
pub struct DynamoStore {
    client: Client,
    table_name: String,
    subject_index: String,
}

impl DynamoStore {
    /// Create a new DynamoDB store.
    ///
    /// `endpoint_url` overrides the regional endpoint (DynamoDB Local).
    pub async fn new(
        table_name: impl Into<String>,
        subject_index: impl Into<String>,
        endpoint_url: Option<&str>,
    ) -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;

        let client = if let Some(endpoint) = endpoint_url {
            let dynamo_config = aws_sdk_dynamodb::config::Builder::from(&config)
                .endpoint_url(endpoint)
                .build();
            Client::from_conf(dynamo_config)
        } else {
            Client::new(&config)
        };

        Self::with_client(client, table_name, subject_index)
    }

    /// Wrap an already configured client.
    pub fn with_client(
        client: Client,
        table_name: impl Into<String>,
        subject_index: impl Into<String>,
    ) -> Self {
        let table_name = table_name.into();
        let subject_index = subject_index.into();
        info!(table = %table_name, index = %subject_index, "Connected to DynamoDB");
        Self {
            client,
            table_name,
            subject_index,
        }
    }

    async fn write_chunk(&self, requests: Vec<DynamoWriteRequest>) -> Result<()> {
        let output = self
            .client
            .batch_write_item()
            .request_items(&self.table_name, requests)
            .send()
            .await
            .map_err(|e| dynamo_error("batch_write_item", e))?;

        let unprocessed: usize = output
            .unprocessed_items
            .unwrap_or_default()
            .values()
            .map(Vec::len)
            .sum();
        if unprocessed > 0 {
            return Err(StorageError::Unprocessed {
                operation: "batch_write_item",
                count: unprocessed,
            });
        }
        Ok(())
    }

    fn to_write_request(write: WriteRequest) -> Result<DynamoWriteRequest> {
        let request = match write {
            WriteRequest::Put(item) => DynamoWriteRequest::builder()
                .put_request(
                    PutRequest::builder()
                        .set_item(Some(to_dynamo_item(item)))
                        .build()
                        .map_err(|e| dynamo_error("batch_write_item", e))?,
                )
                .build(),
            WriteRequest::Delete(key) => DynamoWriteRequest::builder()
                .delete_request(
                    DeleteRequest::builder()
                        .set_key(Some(key_to_dynamo(&key)))
                        .build()
                        .map_err(|e| dynamo_error("batch_write_item", e))?,
                )
                .build(),
        };
        Ok(request)
    }
}

#[async_trait]
impl Store for DynamoStore {
    async fn get(&self, key: &Key) -> Result<Option<Item>> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(key_to_dynamo(key)))
            .send()
            .await
            .map_err(|e| dynamo_error("get_item", e))?;

        output.item.map(from_dynamo_item).transpose()
    }

    async fn put(&self, item: Item) -> Result<()> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(to_dynamo_item(item)))
            .send()
            .await
            .map_err(|e| dynamo_error("put_item", e))?;
        Ok(())
    }

    async fn put_if_absent(&self, item: Item) -> Result<bool> {
        let result = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(to_dynamo_item(item)))
            .condition_expression("attribute_not_exists(#pk)")
            .expression_attribute_names("#pk", PARTITION_KEY)
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(SdkError::ServiceError(inner))
                if inner.err().is_conditional_check_failed_exception() =>
            {
                debug!("Conditional put rejected, key already exists");
                Ok(false)
            }
            Err(e) => Err(dynamo_error("put_item", e)),
        }
    }

    async fn delete(&self, key: &Key) -> Result<()> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .set_key(Some(key_to_dynamo(key)))
            .send()
            .await
            .map_err(|e| dynamo_error("delete_item", e))?;
        Ok(())
    }

    async fn query(&self, query: &RangeQuery) -> Result<QueryPage> {
        let mut request = self
            .client
            .query()
            .table_name(&self.table_name)
            .expression_attribute_names("#pk", PARTITION_KEY)
            .expression_attribute_values(":pk", DynamoValue::S(query.partition_key.clone()))
            .scan_index_forward(query.scan_forward)
            .set_limit(query.limit.map(|limit| limit.min(i32::MAX as u32) as i32))
            .set_exclusive_start_key(query.exclusive_start_key.clone().map(to_dynamo_item));

        request = match &query.sort_key {
            SortKeyCondition::Any => request.key_condition_expression("#pk = :pk"),
            SortKeyCondition::Between { from, to } => request
                .key_condition_expression("#pk = :pk AND #sk BETWEEN :from AND :to")
                .expression_attribute_names("#sk", crate::storage::SORT_KEY)
                .expression_attribute_values(":from", DynamoValue::S(from.clone()))
                .expression_attribute_values(":to", DynamoValue::S(to.clone())),
            SortKeyCondition::BeginsWith(prefix) => request
                .key_condition_expression("#pk = :pk AND begins_with(#sk, :prefix)")
                .expression_attribute_names("#sk", crate::storage::SORT_KEY)
                .expression_attribute_values(":prefix", DynamoValue::S(prefix.clone())),
        };

        let output = request
            .send()
            .await
            .map_err(|e| dynamo_error("query", e))?;

        let items = output
            .items
            .unwrap_or_default()
            .into_iter()
            .map(from_dynamo_item)
            .collect::<Result<Vec<_>>>()?;
        let last_evaluated_key = output
            .last_evaluated_key
            .filter(|key| !key.is_empty())
            .map(from_dynamo_item)
            .transpose()?;

        debug!(
            partition = %query.partition_key,
            count = items.len(),
            more = last_evaluated_key.is_some(),
            "Queried DynamoDB"
        );

        Ok(QueryPage {
            items,
            last_evaluated_key,
        })
    }

    async fn query_subject_index(
        &self,
        subject: &str,
        partition_prefix: &str,
    ) -> Result<Vec<Item>> {
        let mut items = Vec::new();
        let mut start_key: Option<DynamoItem> = None;

        loop {
            let output = self
                .client
                .query()
                .table_name(&self.table_name)
                .index_name(&self.subject_index)
                .key_condition_expression("Subject = :subject AND begins_with(#pk, :prefix)")
                .expression_attribute_names("#pk", PARTITION_KEY)
                .expression_attribute_values(":subject", DynamoValue::S(subject.to_string()))
                .expression_attribute_values(
                    ":prefix",
                    DynamoValue::S(partition_prefix.to_string()),
                )
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| dynamo_error("query", e))?;

            for item in output.items.unwrap_or_default() {
                items.push(from_dynamo_item(item)?);
            }

            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        Ok(items)
    }

    async fn batch_get(&self, keys: &[Key]) -> Result<Vec<Item>> {
        let mut items = Vec::with_capacity(keys.len());

        for chunk in keys.chunks(MAX_BATCH_GET) {
            let request = KeysAndAttributes::builder()
                .set_keys(Some(chunk.iter().map(key_to_dynamo).collect()))
                .build()
                .map_err(|e| dynamo_error("batch_get_item", e))?;

            let output = self
                .client
                .batch_get_item()
                .request_items(&self.table_name, request)
                .send()
                .await
                .map_err(|e| dynamo_error("batch_get_item", e))?;

            let unprocessed: usize = output
                .unprocessed_keys
                .unwrap_or_default()
                .values()
                .map(|pending| pending.keys().len())
                .sum();
            if unprocessed > 0 {
                return Err(StorageError::Unprocessed {
                    operation: "batch_get_item",
                    count: unprocessed,
                });
            }

            let responses = output
                .responses
                .and_then(|mut tables| tables.remove(&self.table_name))
                .unwrap_or_default();
            for item in responses {
                items.push(from_dynamo_item(item)?);
            }
        }

        Ok(items)
    }

    async fn batch_write(&self, writes: Vec<WriteRequest>) -> Result<()> {
        let mut requests = writes
            .into_iter()
            .map(Self::to_write_request)
            .collect::<Result<Vec<_>>>()?;

        while !requests.is_empty() {
            let chunk: Vec<_> = requests
                .drain(..requests.len().min(MAX_BATCH_WRITE))
                .collect();
            debug!(count = chunk.len(), "Writing DynamoDB batch");
            self.write_chunk(chunk).await?;
        }

        Ok(())
    }
}
