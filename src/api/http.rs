//! `EntityApi` over the `/api/{kind}` HTTP surface.

use crate::api::{EntityApi, Page};
use crate::error::EngineError;
use crate::model::Record;
use crate::pagination::PageRequest;
use crate::schema::EntityKind;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;

pub struct HttpEntityApi {
    client: Client,
    endpoint: String,
    kind: EntityKind,
}

impl HttpEntityApi {
    pub fn new(client: Client, base_url: &str, kind: EntityKind) -> Self {
        Self {
            client,
            endpoint: format!("{}/api/{}", base_url.trim_end_matches('/'), kind.path_segment()),
            kind,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn transport(&self, op: &str, e: reqwest::Error) -> EngineError {
        tracing::debug!(kind = %self.kind, op, error = %e, "request failed before a response");
        EngineError::request(None, None)
    }

    async fn ok_json(&self, op: &str, resp: Response) -> Result<Value, EngineError> {
        if !resp.status().is_success() {
            return Err(failure(self.kind, op, resp).await);
        }
        resp.json::<Value>().await.map_err(|e| self.transport(op, e))
    }
}

/// Turn an error response into a request failure, keeping the server's message.
async fn failure(kind: EntityKind, op: &str, resp: Response) -> EngineError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    let message = server_message(&body);
    tracing::debug!(kind = %kind, op, status, body = %body, "request rejected");
    EngineError::request(Some(status), message)
}

/// `message` of a `{status, message}` body, a bare JSON string, or non-empty plain text.
pub(crate) fn server_message(body: &str) -> Option<String> {
    let text = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(obj)) => ["message", "Message"]
            .iter()
            .find_map(|k| obj.get(*k).and_then(Value::as_str))
            .map(str::to_string),
        Ok(Value::String(s)) => Some(s),
        Ok(_) => None,
        Err(_) => Some(body.trim().to_string()),
    };
    text.filter(|t| !t.is_empty())
}

fn as_record(kind: EntityKind, v: Value) -> Result<Record, EngineError> {
    match v {
        Value::Object(map) => Ok(map),
        _ => Err(EngineError::request(
            None,
            Some(format!("Invalid {} returned by server.", kind)),
        )),
    }
}

#[async_trait]
impl EntityApi for HttpEntityApi {
    async fn fetch_page(&self, page: PageRequest) -> Result<Page, EngineError> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&page)
            .send()
            .await
            .map_err(|e| self.transport("fetch", e))?;
        let body = self.ok_json("fetch", resp).await?;
        let invalid = || EngineError::request(None, Some("Invalid response from server.".into()));
        let dtos = body.get("dtos").and_then(Value::as_array).ok_or_else(invalid)?;
        let total_count = body.get("totalCount").and_then(Value::as_u64).ok_or_else(invalid)?;
        // Non-object entries are kept as empty records so the table can flag the response.
        let records = dtos
            .iter()
            .map(|d| d.as_object().cloned().unwrap_or_default())
            .collect();
        Ok(Page { records, total_count })
    }

    async fn create(&self, record: &Record) -> Result<Record, EngineError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(record)
            .send()
            .await
            .map_err(|e| self.transport("create", e))?;
        as_record(self.kind, self.ok_json("create", resp).await?)
    }

    async fn update(&self, id: i64, record: &Record) -> Result<Record, EngineError> {
        let resp = self
            .client
            .put(format!("{}/{}", self.endpoint, id))
            .json(record)
            .send()
            .await
            .map_err(|e| self.transport("update", e))?;
        as_record(self.kind, self.ok_json("update", resp).await?)
    }

    async fn delete(&self, id: i64) -> Result<String, EngineError> {
        let resp = self
            .client
            .delete(format!("{}/{}", self.endpoint, id))
            .send()
            .await
            .map_err(|e| self.transport("delete", e))?;
        if !resp.status().is_success() {
            return Err(failure(self.kind, "delete", resp).await);
        }
        let body = resp.text().await.map_err(|e| self.transport("delete", e))?;
        Ok(server_message(&body).unwrap_or_else(|| format!("{} deleted", self.kind)))
    }
}
