//! Google Cloud Storage source over the JSON API.
//!
//! Credentials are not acquired here: public buckets need none, private
//! ones take a pre-issued OAuth bearer token.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::Deserialize;
use tracing::{info, warn};

use crate::source::{SnapshotObject, SnapshotSource, is_snapshot_name};
use crate::StoreError;

pub const DEFAULT_API_BASE: &str = "https://storage.googleapis.com/storage/v1";

/// Snapshot files stored directly under `gs://{bucket}/{prefix}`.
pub struct GcsSource {
    client: reqwest::Client,
    api_base: String,
    bucket: String,
    prefix: String,
    token: Option<String>,
}

#[derive(Deserialize)]
struct ObjectList {
    #[serde(default)]
    items: Vec<ObjectResource>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct ObjectResource {
    name: String,
    updated: Option<String>,
    #[serde(rename = "timeCreated")]
    time_created: Option<String>,
}

impl GcsSource {
    /// `prefix` may be empty; surrounding slashes are ignored.
    pub fn new(bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            bucket: bucket.into(),
            prefix: prefix.into().trim_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    /// Point at a different endpoint (emulators, proxies).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Listing prefix: empty, or the configured prefix with one trailing slash.
    fn list_prefix(&self) -> String {
        if self.prefix.is_empty() {
            String::new()
        } else {
            format!("{}/", self.prefix)
        }
    }

    fn objects_url(&self) -> Result<Url, StoreError> {
        self.api_url(&["b", self.bucket.as_str(), "o"])
    }

    fn media_url(&self, key: &str) -> Result<Url, StoreError> {
        let mut url = self.api_url(&["b", self.bucket.as_str(), "o", key])?;
        url.query_pairs_mut().append_pair("alt", "media");
        Ok(url)
    }

    /// Append path segments to the API base; each segment is percent-encoded,
    /// including any `/` inside an object name.
    fn api_url(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| StoreError::Other(format!("invalid API base {}: {e}", self.api_base)))?;
        url.path_segments_mut()
            .map_err(|_| StoreError::Other(format!("API base cannot take a path: {}", self.api_base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, StoreError> {
        let resp = self.authorize(request).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Server {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp)
    }
}

#[async_trait]
impl SnapshotSource for GcsSource {
    fn location(&self) -> String {
        format!("gs://{}/{}", self.bucket, self.list_prefix())
    }

    async fn list(&self) -> Result<Vec<SnapshotObject>, StoreError> {
        let url = self.objects_url()?;
        let prefix = self.list_prefix();
        let mut objects = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query: Vec<(&str, &str)> = vec![("prefix", prefix.as_str()), ("delimiter", "/")];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }
            info!(url = %url, prefix = %prefix, "listing snapshot objects");
            let resp = self.send(self.client.get(url.clone()).query(&query)).await?;
            let page: ObjectList = serde_json::from_str(&resp.text().await?)?;
            objects.extend(page.items.into_iter().filter_map(snapshot_object));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        info!(count = objects.len(), "listed snapshot objects");
        Ok(objects)
    }

    async fn fetch(&self, object: &SnapshotObject) -> Result<Bytes, StoreError> {
        let url = self.media_url(&object.key)?;
        info!(object = %object.key, "downloading snapshot");
        let resp = self.send(self.client.get(url)).await?;
        Ok(resp.bytes().await?)
    }
}

/// Keep `.parquet` objects with a usable timestamp.
fn snapshot_object(resource: ObjectResource) -> Option<SnapshotObject> {
    if !is_snapshot_name(&resource.name) {
        return None;
    }
    let stamp = resource.updated.or(resource.time_created);
    let updated = stamp
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc));
    match updated {
        Some(updated) => Some(SnapshotObject {
            key: resource.name,
            updated,
        }),
        None => {
            warn!(object = %resource.name, "skipping snapshot without update time");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_includes_prefix() {
        assert_eq!(GcsSource::new("paperswithcode", "").location(), "gs://paperswithcode/");
        assert_eq!(
            GcsSource::new("paperswithcode", "/daily/").location(),
            "gs://paperswithcode/daily/"
        );
    }

    #[test]
    fn media_url_encodes_object_name() {
        let source = GcsSource::new("bucket", "daily");
        let url = source.media_url("daily/2024061507.parquet").unwrap();
        assert_eq!(
            url.as_str(),
            "https://storage.googleapis.com/storage/v1/b/bucket/o/daily%2F2024061507.parquet?alt=media"
        );
    }

    #[test]
    fn api_base_trailing_slash_is_trimmed() {
        let source = GcsSource::new("bucket", "").with_api_base("http://localhost:4443/storage/v1/");
        assert_eq!(
            source.objects_url().unwrap().as_str(),
            "http://localhost:4443/storage/v1/b/bucket/o"
        );
    }

    #[test]
    fn empty_token_is_ignored() {
        let source = GcsSource::new("bucket", "").with_token(Some(String::new()));
        assert!(source.token.is_none());
    }

    #[test]
    fn listing_keeps_dated_parquet_objects() {
        let json = r#"{
            "kind": "storage#objects",
            "items": [
                {"name": "2024061507.parquet", "updated": "2024-06-15T07:05:00.123Z"},
                {"name": "2024061406.parquet", "timeCreated": "2024-06-14T06:01:00Z"},
                {"name": "README.md", "updated": "2024-06-15T07:05:00Z"},
                {"name": "2024061305.parquet"}
            ],
            "nextPageToken": "abc"
        }"#;
        let page: ObjectList = serde_json::from_str(json).unwrap();
        assert_eq!(page.next_page_token.as_deref(), Some("abc"));
        let objects: Vec<SnapshotObject> =
            page.items.into_iter().filter_map(snapshot_object).collect();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].key, "2024061507.parquet");
        assert_eq!(objects[1].updated.to_rfc3339(), "2024-06-14T06:01:00+00:00");
    }

    #[test]
    fn empty_listing_has_no_items() {
        let page: ObjectList = serde_json::from_str(r#"{"kind": "storage#objects"}"#).unwrap();
        assert!(page.items.is_empty());
        assert!(page.next_page_token.is_none());
    }
}
