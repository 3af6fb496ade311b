//! Supabase-style object storage over its REST API.

use super::{BoxFuture, DocumentStore, StorageResult, UploadedFile};
use crate::config::DEFAULT_REQUEST_TIMEOUT;
use crate::services::{check_response, endpoint};
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use reqwest::{RequestBuilder, Url};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// How many objects `list` asks for.
const LIST_LIMIT: u32 = 100;

/// A public bucket reached through `{base}/storage/v1`.
pub struct HttpBucketStore {
    client: reqwest::Client,
    base: String,
    bucket: String,
    api_key: Option<String>,
    timeout: Duration,
}

#[derive(Deserialize)]
struct ListedObject {
    name: String,
}

impl HttpBucketStore {
    pub fn new(
        client: reqwest::Client,
        base: impl Into<String>,
        bucket: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            base: base.into(),
            bucket: bucket.into(),
            api_key,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn url(&self, segments: &[&str]) -> StorageResult<Url> {
        let mut all = vec!["storage", "v1", "object"];
        all.extend_from_slice(segments);
        Ok(endpoint(&self.base, &all)?)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.timeout(self.timeout);
        match &self.api_key {
            Some(key) => request.header("apikey", key).bearer_auth(key),
            None => request,
        }
    }

    async fn put(&self, name: &str, bytes: Vec<u8>, mime: &str) -> StorageResult<UploadedFile> {
        let url = self.url(&[self.bucket.as_str(), name])?;
        log::info!("Uploading {} ({} bytes) to bucket {}", name, bytes.len(), self.bucket);
        let request = self
            .client
            .post(url)
            .header("x-upsert", "true")
            .header(CONTENT_TYPE, mime)
            .header(CACHE_CONTROL, "max-age=3600")
            .body(bytes);
        check_response(self.authorize(request).send().await?).await?;
        Ok(UploadedFile {
            name: name.to_string(),
            url: self.public_url(name)?,
        })
    }

    async fn fetch_list(&self) -> StorageResult<Vec<UploadedFile>> {
        let url = self.url(&["list", self.bucket.as_str()])?;
        let body = json!({
            "prefix": "",
            "limit": LIST_LIMIT,
            "offset": 0,
            "sortBy": { "column": "name", "order": "asc" },
        });
        let resp = check_response(self.authorize(self.client.post(url).json(&body)).send().await?).await?;
        let objects: Vec<ListedObject> = resp.json().await?;
        objects
            .into_iter()
            .map(|o| {
                let url = self.public_url(&o.name)?;
                Ok(UploadedFile { name: o.name, url })
            })
            .collect()
    }

    async fn delete(&self, name: &str) -> StorageResult<()> {
        let url = self.url(&[self.bucket.as_str()])?;
        let body = json!({ "prefixes": [name] });
        check_response(self.authorize(self.client.delete(url).json(&body)).send().await?).await?;
        log::info!("Removed {} from bucket {}", name, self.bucket);
        Ok(())
    }
}

impl DocumentStore for HttpBucketStore {
    fn upload<'a>(
        &'a self,
        name: &'a str,
        bytes: Vec<u8>,
        mime: &'a str,
    ) -> BoxFuture<'a, StorageResult<UploadedFile>> {
        Box::pin(self.put(name, bytes, mime))
    }

    fn public_url(&self, name: &str) -> StorageResult<String> {
        Ok(self.url(&["public", self.bucket.as_str(), name])?.to_string())
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<UploadedFile>>> {
        Box::pin(self.fetch_list())
    }

    fn remove<'a>(&'a self, name: &'a str) -> BoxFuture<'a, StorageResult<()>> {
        Box::pin(self.delete(name))
    }
}
