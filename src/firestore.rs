use std::sync::mpsc::Sender;
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::{Duration, Instant};

use reqwest::Url;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde_json::{Map, Value, json};

use crate::config::Config;
use crate::store::{
    CollectionPath, Document, DocumentStore, Fields, StoreError, WatchEvent, WatchHandle,
};

const FIRESTORE_API: &str = "https://firestore.googleapis.com/v1/projects";
const PAGE_SIZE: &str = "300";
const WATCH_SLICE: Duration = Duration::from_millis(200);

struct Inner {
    client: Client,
    documents_url: String,
    api_key: Option<String>,
    id_token: RwLock<Option<String>>,
}

/// Firestore over its REST surface. Cheap to clone; clones share the session
/// token.
#[derive(Clone)]
pub struct FirestoreStore {
    inner: Arc<Inner>,
    poll_interval: Duration,
}

impl FirestoreStore {
    pub fn new(config: &Config, client: Client) -> Result<Self, StoreError> {
        let project_id = config
            .project_id
            .as_deref()
            .ok_or_else(|| StoreError::NotFound("KSFA_PROJECT_ID is not set".to_string()))?;
        Ok(Self {
            inner: Arc::new(Inner {
                client,
                documents_url: format!("{FIRESTORE_API}/{project_id}/databases/(default)/documents"),
                api_key: config.api_key.clone(),
                id_token: RwLock::new(None),
            }),
            poll_interval: config.poll_interval,
        })
    }

    pub fn set_id_token(&self, token: Option<String>) {
        let mut guard = self.inner.id_token.write().expect("id token lock poisoned");
        *guard = token;
    }

    fn url(&self, segments: &[String]) -> Result<Url, StoreError> {
        let mut url = Url::parse(&self.inner.documents_url)
            .map_err(|err| StoreError::Decode(format!("bad base url: {err}")))?;
        url.path_segments_mut()
            .map_err(|_| StoreError::Decode("base url cannot have segments".to_string()))?
            .extend(segments);
        if let Some(key) = &self.inner.api_key {
            url.query_pairs_mut().append_pair("key", key);
        }
        Ok(url)
    }

    fn doc_url(&self, path: &CollectionPath, id: &str) -> Result<Url, StoreError> {
        let mut segments = path.segments().to_vec();
        segments.push(id.to_string());
        self.url(&segments)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        let guard = self.inner.id_token.read().expect("id token lock poisoned");
        match guard.as_deref() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    fn send(&self, req: RequestBuilder) -> Result<Response, StoreError> {
        let resp = self
            .authorize(req)
            .send()
            .map_err(|err| StoreError::Network(err.to_string()))?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().unwrap_or_default();
        Err(status_error(status, body))
    }

    fn json(&self, req: RequestBuilder) -> Result<Value, StoreError> {
        let body = self
            .send(req)?
            .text()
            .map_err(|err| StoreError::Network(err.to_string()))?;
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return Ok(Value::Object(Map::new()));
        }
        serde_json::from_str(trimmed).map_err(|err| StoreError::Decode(err.to_string()))
    }
}

fn status_error(status: StatusCode, body: String) -> StoreError {
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(|m| m.to_string())
        })
        .unwrap_or(body);
    match status {
        StatusCode::UNAUTHORIZED => StoreError::Unauthenticated,
        StatusCode::FORBIDDEN => StoreError::PermissionDenied(message),
        StatusCode::NOT_FOUND => StoreError::NotFound(message),
        _ => StoreError::Http {
            status: status.as_u16(),
            message,
        },
    }
}

impl DocumentStore for FirestoreStore {
    fn list(&self, path: &CollectionPath) -> Result<Vec<Document>, StoreError> {
        let mut out = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut url = self.url(path.segments())?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("pageSize", PAGE_SIZE);
                if let Some(token) = page_token.as_deref() {
                    query.append_pair("pageToken", token);
                }
            }
            let page = self.json(self.inner.client.get(url))?;
            let (docs, next) = parse_list_page(&page)?;
            out.extend(docs);
            match next {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        Ok(out)
    }

    fn get(&self, path: &CollectionPath, id: &str) -> Result<Option<Document>, StoreError> {
        let url = self.doc_url(path, id)?;
        match self.json(self.inner.client.get(url)) {
            Ok(v) => parse_document(&v).map(Some),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn create(
        &self,
        path: &CollectionPath,
        id: Option<&str>,
        fields: Fields,
    ) -> Result<String, StoreError> {
        let mut url = self.url(path.segments())?;
        if let Some(id) = id {
            url.query_pairs_mut().append_pair("documentId", id);
        }
        let body = json!({ "fields": encode_fields(&fields) });
        let created = self.json(self.inner.client.post(url).json(&body))?;
        Ok(parse_document(&created)?.id)
    }

    fn merge(&self, path: &CollectionPath, id: &str, fields: Fields) -> Result<(), StoreError> {
        let mut url = self.doc_url(path, id)?;
        {
            let mut query = url.query_pairs_mut();
            for key in fields.keys() {
                query.append_pair("updateMask.fieldPaths", &field_path(key));
            }
        }
        let body = json!({ "fields": encode_fields(&fields) });
        self.send(self.inner.client.patch(url).json(&body))?;
        Ok(())
    }

    fn delete(&self, path: &CollectionPath, id: &str) -> Result<(), StoreError> {
        let url = self.doc_url(path, id)?;
        self.send(self.inner.client.delete(url))?;
        Ok(())
    }

    /// REST has no listen stream, so this polls and only emits when the
    /// document set changes.
    fn watch(
        &self,
        path: &CollectionPath,
        tx: Sender<WatchEvent>,
    ) -> Result<WatchHandle, StoreError> {
        let handle = WatchHandle::new();
        let token = handle.clone();
        let store = self.clone();
        let path = path.clone();
        thread::spawn(move || {
            let mut last: Option<Vec<Document>> = None;
            while !token.is_cancelled() {
                match store.list(&path) {
                    Ok(docs) => {
                        if last.as_ref() != Some(&docs) {
                            tracing::debug!(path = %path, docs = docs.len(), "firestore snapshot");
                            if tx.send(WatchEvent::Snapshot(docs.clone())).is_err() {
                                break;
                            }
                            last = Some(docs);
                        }
                    }
                    Err(err) => {
                        tracing::warn!(path = %path, error = %err, "firestore poll failed");
                        let _ = tx.send(WatchEvent::Failed(err));
                        break;
                    }
                }
                let started = Instant::now();
                while started.elapsed() < store.poll_interval && !token.is_cancelled() {
                    thread::sleep(WATCH_SLICE);
                }
            }
        });
        Ok(handle)
    }

    fn set_session_token(&self, token: Option<String>) {
        self.set_id_token(token);
    }
}

/// Field names that are not plain identifiers must be backquoted in masks.
fn field_path(key: &str) -> String {
    let simple = key
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if simple {
        key.to_string()
    } else {
        format!("`{}`", key.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

pub fn parse_list_page(page: &Value) -> Result<(Vec<Document>, Option<String>), StoreError> {
    let mut docs = Vec::new();
    if let Some(arr) = page.get("documents").and_then(|d| d.as_array()) {
        for item in arr {
            docs.push(parse_document(item)?);
        }
    }
    let next = page
        .get("nextPageToken")
        .and_then(|t| t.as_str())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string());
    Ok((docs, next))
}

pub fn parse_document(v: &Value) -> Result<Document, StoreError> {
    let name = v
        .get("name")
        .and_then(|n| n.as_str())
        .ok_or_else(|| StoreError::Decode("document without name".to_string()))?;
    let id = name.rsplit('/').next().unwrap_or(name).to_string();
    let fields = v
        .get("fields")
        .and_then(|f| f.as_object())
        .map(decode_fields)
        .unwrap_or_default();
    Ok(Document { id, fields })
}

pub fn decode_fields(fields: &Map<String, Value>) -> Fields {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), decode_value(v)))
        .collect()
}

/// Firestore typed value -> plain JSON. Integers arrive as strings.
pub fn decode_value(v: &Value) -> Value {
    let Some(obj) = v.as_object() else {
        return Value::Null;
    };
    if let Some(s) = obj.get("stringValue").and_then(|s| s.as_str()) {
        return Value::from(s);
    }
    if let Some(raw) = obj.get("integerValue") {
        return match raw {
            Value::String(s) => s
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| Value::from(s.clone())),
            Value::Number(n) => Value::Number(n.clone()),
            _ => Value::Null,
        };
    }
    if let Some(d) = obj.get("doubleValue") {
        return match d {
            Value::Number(n) => Value::Number(n.clone()),
            // NaN / Infinity come through as strings.
            Value::String(s) => Value::from(s.clone()),
            _ => Value::Null,
        };
    }
    if let Some(b) = obj.get("booleanValue").and_then(|b| b.as_bool()) {
        return Value::Bool(b);
    }
    if obj.contains_key("nullValue") {
        return Value::Null;
    }
    for key in ["timestampValue", "referenceValue", "bytesValue"] {
        if let Some(s) = obj.get(key).and_then(|s| s.as_str()) {
            return Value::from(s);
        }
    }
    if let Some(geo) = obj.get("geoPointValue") {
        return geo.clone();
    }
    if let Some(map) = obj.get("mapValue") {
        let inner = map
            .get("fields")
            .and_then(|f| f.as_object())
            .map(decode_fields)
            .unwrap_or_default();
        return Value::Object(inner);
    }
    if let Some(arr) = obj.get("arrayValue") {
        let values = arr
            .get("values")
            .and_then(|v| v.as_array())
            .map(|vals| vals.iter().map(decode_value).collect())
            .unwrap_or_default();
        return Value::Array(values);
    }
    Value::Null
}

pub fn encode_fields(fields: &Fields) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(k, v)| (k.clone(), encode_value(v)))
            .collect(),
    )
}

pub fn encode_value(v: &Value) -> Value {
    match v {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64().unwrap_or(0.0) }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            json!({ "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_paths_with_spaces_are_quoted() {
        assert_eq!(field_path("Points"), "Points");
        assert_eq!(field_path("Matches Played"), "`Matches Played`");
        assert_eq!(field_path("9lives"), "`9lives`");
    }

    #[test]
    fn decodes_typed_values() {
        let raw = json!({
            "Team": { "stringValue": "Golden Lions" },
            "Wins": { "integerValue": "10" },
            "Ratio": { "doubleValue": 0.5 },
            "Active": { "booleanValue": true },
            "Gone": { "nullValue": null },
            "players": { "arrayValue": { "values": [
                { "mapValue": { "fields": { "Name": { "stringValue": "A" } } } }
            ] } },
            "empty": { "arrayValue": {} }
        });
        let fields = decode_fields(raw.as_object().unwrap());
        assert_eq!(fields["Team"], json!("Golden Lions"));
        assert_eq!(fields["Wins"], json!(10));
        assert_eq!(fields["Ratio"], json!(0.5));
        assert_eq!(fields["Active"], json!(true));
        assert!(fields["Gone"].is_null());
        assert_eq!(fields["players"], json!([{ "Name": "A" }]));
        assert_eq!(fields["empty"], json!([]));
    }

    #[test]
    fn encode_then_decode_keeps_plain_json() {
        let plain = json!({ "Points": 12, "Team": "X", "tags": ["a", 1], "meta": { "ok": false } });
        let encoded = encode_fields(plain.as_object().unwrap());
        assert_eq!(encoded["Points"], json!({ "integerValue": "12" }));
        let decoded = decode_fields(encoded.as_object().unwrap());
        assert_eq!(Value::Object(decoded), plain);
    }

    #[test]
    fn parses_paged_list_response() {
        let page = json!({
            "documents": [{
                "name": "projects/p/databases/(default)/documents/Rankings/karnataka/A_Division/Golden Lions",
                "fields": { "Points": { "integerValue": "32" } }
            }],
            "nextPageToken": "abc"
        });
        let (docs, next) = parse_list_page(&page).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "Golden Lions");
        assert_eq!(docs[0].fields["Points"], json!(32));
        assert_eq!(next.as_deref(), Some("abc"));

        let (docs, next) = parse_list_page(&json!({})).unwrap();
        assert!(docs.is_empty());
        assert!(next.is_none());
    }
}
