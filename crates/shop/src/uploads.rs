//! Signed upload URLs for catalog images.
//!
//! Clients upload straight to the object store; the backend only asks the
//! store for a short-lived upload URL and reports where the object will be
//! publicly served from.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ShopError};

const DEFAULT_FILE_NAME: &str = "upload.bin";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUploadInput {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
}

/// Everything a client needs to upload one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedUpload {
    pub signed_url: String,
    pub token: String,
    pub object_path: String,
    pub public_url: String,
    pub content_type: String,
}

/// A signed upload URL and the token embedded in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTicket {
    pub signed_url: String,
    pub token: String,
}

/// An object store able to hand out signed upload URLs.
#[async_trait]
pub trait UploadSigner: Send + Sync {
    async fn sign(&self, object_path: &str) -> Result<UploadTicket>;

    /// Where the object at `object_path` is publicly readable.
    fn public_url(&self, object_path: &str) -> String;
}

/// Connection settings for Supabase Storage.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `"https://xyz.supabase.co"`.
    pub url: String,
    pub service_role_key: String,
    /// Base for public object URLs; falls back to `url`.
    pub public_url: Option<String>,
    pub bucket: String,
}

/// Signs uploads through the Supabase Storage REST API.
#[derive(Debug, Clone)]
pub struct SupabaseUploadSigner {
    config: SupabaseConfig,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct SignResponse {
    url: String,
}

impl SupabaseUploadSigner {
    pub fn new(mut config: SupabaseConfig) -> Self {
        config.url = config.url.trim_end_matches('/').to_string();
        config.public_url = config
            .public_url
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());
        Self {
            config,
            http: Client::new(),
        }
    }

    fn storage_url(&self) -> String {
        format!("{}/storage/v1", self.config.url)
    }
}

#[async_trait]
impl UploadSigner for SupabaseUploadSigner {
    async fn sign(&self, object_path: &str) -> Result<UploadTicket> {
        let url = format!(
            "{}/object/upload/sign/{}/{}",
            self.storage_url(),
            self.config.bucket,
            object_path
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.service_role_key)
            .header("apikey", &self.config.service_role_key)
            .send()
            .await
            .map_err(|e| ShopError::Upload(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(ShopError::Upload(format!(
                "sign request failed with status {status}: {text}"
            )));
        }

        let parsed: SignResponse = response
            .json()
            .await
            .map_err(|e| ShopError::Upload(e.to_string()))?;

        let signed_url = format!("{}{}", self.storage_url(), parsed.url);
        let token = token_from_url(&signed_url)
            .ok_or_else(|| ShopError::Upload("signed URL carries no token".to_string()))?;

        Ok(UploadTicket { signed_url, token })
    }

    fn public_url(&self, object_path: &str) -> String {
        let base = self.config.public_url.as_deref().unwrap_or(&self.config.url);
        format!(
            "{base}/storage/v1/object/public/{}/{object_path}",
            self.config.bucket
        )
    }
}

fn token_from_url(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .query_pairs()
        .find(|(key, _)| key == "token")
        .map(|(_, value)| value.into_owned())
}

/// Upload signer that records requested paths instead of calling out.
///
/// Useful for testing and for running without object storage credentials.
#[derive(Debug, Default)]
pub struct InMemoryUploadSigner {
    signed: RwLock<HashSet<String>>,
    fail: RwLock<bool>,
}

impl InMemoryUploadSigner {
    pub const BASE_URL: &'static str = "http://storage.local";

    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later `sign` call fail.
    pub fn set_fail(&self, fail: bool) {
        if let Ok(mut flag) = self.fail.write() {
            *flag = fail;
        }
    }

    pub fn was_signed(&self, object_path: &str) -> bool {
        self.signed
            .read()
            .map(|signed| signed.contains(object_path))
            .unwrap_or(false)
    }
}

#[async_trait]
impl UploadSigner for InMemoryUploadSigner {
    async fn sign(&self, object_path: &str) -> Result<UploadTicket> {
        if self.fail.read().map(|f| *f).unwrap_or(false) {
            return Err(ShopError::Upload("object store unavailable".to_string()));
        }
        if let Ok(mut signed) = self.signed.write() {
            signed.insert(object_path.to_string());
        }
        let token = format!("token-{object_path}");
        Ok(UploadTicket {
            signed_url: format!(
                "{}/object/upload/sign/uploads/{object_path}?token={token}",
                Self::BASE_URL
            ),
            token,
        })
    }

    fn public_url(&self, object_path: &str) -> String {
        format!("{}/object/public/uploads/{object_path}", Self::BASE_URL)
    }
}

/// Builds the stored object name: `<millis>-<sanitized file name>`.
///
/// Every character outside `[A-Za-z0-9_.-]` becomes `_`.
pub fn object_path(file_name: &str, millis: i64) -> String {
    let normalized: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{millis}-{normalized}")
}

/// Service for signed uploads.
#[derive(Clone)]
pub struct UploadService {
    signer: Option<Arc<dyn UploadSigner>>,
}

impl UploadService {
    pub fn new(signer: Arc<dyn UploadSigner>) -> Self {
        Self {
            signer: Some(signer),
        }
    }

    /// A service whose every request fails because no object store is set up.
    pub fn unconfigured() -> Self {
        Self { signer: None }
    }

    pub fn is_configured(&self) -> bool {
        self.signer.is_some()
    }

    #[tracing::instrument(skip(self))]
    pub async fn sign(&self, input: SignUploadInput) -> Result<SignedUpload> {
        let Some(signer) = self.signer.as_ref() else {
            return Err(ShopError::Upload("object storage is not configured".to_string()));
        };

        let file_name = input
            .file_name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string());
        let content_type = input
            .content_type
            .filter(|ct| !ct.is_empty())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        let object_path = object_path(&file_name, Utc::now().timestamp_millis());
        let ticket = signer.sign(&object_path).await?;

        metrics::counter!("uploads_signed_total").increment(1);
        tracing::info!(%object_path, %content_type, "upload signed");
        Ok(SignedUpload {
            signed_url: ticket.signed_url,
            token: ticket.token,
            public_url: signer.public_url(&object_path),
            object_path,
            content_type,
        })
    }
}
