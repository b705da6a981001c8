//! Firestore over its REST API.
//!
//! Writes go to `documents/{collection}`. Collection subscriptions re-run a
//! structured query (`documents:runQuery`) every poll interval and report
//! the difference from the previous result.

use crate::endpoints::{FirebaseEndpoints, join};
use crate::http::{check, clamp_poll_interval, decode};
use crate::value::{RestDocument, encode_document};
use async_trait::async_trait;
use reqwest::Client;
use revnet_core::{
    ChangeKind, ChangeStream, CollectionQuery, DocumentChange, DocumentId, DocumentStore,
    ServiceError, ServiceResult, SortDirection,
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};
use url::Url;

/// Buffered notifications per subscription
const CHANGE_BUFFER: usize = 32;

#[derive(Clone)]
pub struct FirestoreClient {
    http: Client,
    documents_url: Url,
    run_query_url: Url,
    api_key: String,
    poll_interval: Duration,
}

impl std::fmt::Debug for FirestoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirestoreClient")
            .field("documents_url", &self.documents_url.as_str())
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

impl FirestoreClient {
    pub fn new(
        http: Client,
        endpoints: &FirebaseEndpoints,
        project_id: &str,
        api_key: impl Into<String>,
        poll_interval: Duration,
    ) -> ServiceResult<Self> {
        let root = endpoints.firestore_url()?;
        let database = format!("projects/{}/databases/(default)/", project_id);
        Ok(Self {
            http,
            documents_url: join(&root, &format!("{}documents/", database))?,
            run_query_url: join(&root, &format!("{}documents:runQuery", database))?,
            api_key: api_key.into(),
            poll_interval: clamp_poll_interval(poll_interval),
        })
    }

    pub fn documents_url(&self) -> &Url {
        &self.documents_url
    }

    /// Run `query` once and return the matching documents in query order.
    pub async fn run_query(&self, query: &CollectionQuery) -> ServiceResult<Vec<QueryDocument>> {
        let body = structured_query(query);
        let response = self
            .http
            .post(self.run_query_url.clone())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::ConnectionFailed(format!("runQuery: {}", e)))?;
        let response = check(response)
            .await
            .map_err(|failure| ServiceError::Backend(format!("runQuery: {}", failure)))?;

        let rows: Vec<QueryRow> = decode(response).await?;
        rows.into_iter()
            .filter_map(|row| row.document)
            .map(|doc| {
                Ok(QueryDocument {
                    id: doc.id(),
                    data: doc.data()?,
                    update_time: doc.update_time,
                })
            })
            .collect()
    }
}

/// One row of a query result.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDocument {
    pub id: DocumentId,
    pub data: Value,
    /// Server update time, used to detect modifications between polls
    pub update_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryRow {
    #[serde(default)]
    document: Option<RestDocument>,
}

fn structured_query(query: &CollectionQuery) -> Value {
    let direction = match query.direction {
        SortDirection::Ascending => "ASCENDING",
        SortDirection::Descending => "DESCENDING",
    };
    json!({
        "structuredQuery": {
            "from": [{ "collectionId": query.collection }],
            "orderBy": [{ "field": { "fieldPath": query.order_by }, "direction": direction }],
            "limit": query.limit,
        }
    })
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    async fn add_document(&self, collection: &str, data: Value) -> ServiceResult<DocumentId> {
        let url = join(&self.documents_url, collection)?;
        let body = encode_document(&data)?;

        let response = self
            .http
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::write_failed(collection, e.to_string()))?;
        let response = check(response)
            .await
            .map_err(|failure| ServiceError::write_failed(collection, failure.to_string()))?;

        let document: RestDocument = decode(response).await?;
        let id = document.id();
        debug!(collection, document = %id, "Document created");
        Ok(id)
    }

    async fn watch_collection(
        &self,
        query: CollectionQuery,
    ) -> ServiceResult<ChangeStream<DocumentChange>> {
        let initial = self
            .run_query(&query)
            .await
            .map_err(|e| ServiceError::subscribe_failed(&query.collection, e.to_string()))?;

        let (tx, rx) = mpsc::channel(CHANGE_BUFFER);
        let client = self.clone();

        tokio::spawn(async move {
            let mut snapshot = QuerySnapshot::default();
            for change in snapshot.update(initial) {
                if tx.send(Ok(change)).await.is_err() {
                    return;
                }
            }

            let mut ticker = tokio::time::interval(client.poll_interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = tx.closed() => return,
                }

                let changes: Vec<ServiceResult<DocumentChange>> = match client.run_query(&query).await {
                    Ok(rows) => snapshot.update(rows).into_iter().map(Ok).collect(),
                    Err(e) => {
                        warn!(collection = %query.collection, error = %e, "Collection poll failed");
                        vec![Err(ServiceError::subscribe_failed(&query.collection, e.to_string()))]
                    }
                };
                for change in changes {
                    if tx.send(change).await.is_err() {
                        return;
                    }
                }
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}

/// Last query result, keyed by document id with its update time.
#[derive(Debug, Default)]
struct QuerySnapshot {
    known: HashMap<DocumentId, Option<String>>,
}

impl QuerySnapshot {
    /// Replace the snapshot with `rows` and return what changed, in query
    /// order, followed by removals.
    fn update(&mut self, rows: Vec<QueryDocument>) -> Vec<DocumentChange> {
        let mut changes = Vec::new();
        let mut next = HashMap::with_capacity(rows.len());

        for QueryDocument {
            id,
            data,
            update_time,
        } in rows
        {
            let kind = match self.known.get(&id) {
                None => Some(ChangeKind::Added),
                Some(previous) if *previous != update_time => Some(ChangeKind::Modified),
                Some(_) => None,
            };
            if let Some(kind) = kind {
                changes.push(DocumentChange {
                    kind,
                    id: id.clone(),
                    data,
                });
            }
            next.insert(id, update_time);
        }

        let mut removed: Vec<DocumentId> = self
            .known
            .keys()
            .filter(|id| !next.contains_key(*id))
            .cloned()
            .collect();
        removed.sort();
        changes.extend(removed.into_iter().map(|id| DocumentChange {
            kind: ChangeKind::Removed,
            id,
            data: Value::Null,
        }));

        self.known = next;
        changes
    }
}
