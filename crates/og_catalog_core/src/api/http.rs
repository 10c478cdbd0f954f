//! Blocking HTTP implementation of [`CatalogApi`].
//!
//! # Responsibility
//! - Map each backend operation onto its REST path and JSON body.
//! - Turn HTTP status codes into [`ApiError`] variants.
//!
//! # Invariants
//! - Path parameters are percent-encoded as single path segments.
//! - Error bodies are flattened to one line and capped before they reach
//!   error messages or logs.

use super::{ApiError, ApiResult, CatalogApi, Versioned};
use crate::config::ClientConfig;
use crate::logging::sanitize_message;
use crate::model::control::{
    PrivacyControlDetail, PrivacyControlSaveResponse, PrivacyControlSummary, ResilienceControl,
    SdmControlDetail, SdmControlSummary,
};
use crate::model::file::{FileContent, FileDiffRequest, FileDiffResult, FileKey};
use crate::model::group::{
    GroupCreateRequest, GroupDeleteRequest, GroupResponse, GroupUpdateRequest, PrivacyGroup,
};
use crate::model::mapping::Mapping;
use log::{debug, warn};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{ETAG, IF_MATCH};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

const MAX_ERROR_BODY_CHARS: usize = 300;

#[derive(Deserialize)]
struct ItemsEnvelope<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

/// `reqwest`-backed catalog client for a fixed backend origin.
pub struct HttpCatalogApi {
    client: Client,
    base_url: Url,
}

impl HttpCatalogApi {
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("og-catalog/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds `<base>/<segments...>` with each segment percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(format!("`{}` cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn send(&self, method: &'static str, url: &Url, request: RequestBuilder) -> ApiResult<Response> {
        debug!(
            "event=api_request module=api method={} path={}",
            method,
            url.path()
        );
        let response = request.send().map_err(|err| {
            warn!(
                "event=api_request module=api status=error method={} path={} reason=transport",
                method,
                url.path()
            );
            ApiError::from(err)
        })?;
        Ok(response)
    }

    fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> ApiResult<T> {
        let url = self.endpoint(segments)?;
        let response = self.send("GET", &url, self.client.get(url.clone()))?;
        let response = ensure_success(&url, response)?;
        decode(response)
    }

    /// GET that maps 404 to `None` and captures the `ETag` header.
    fn lookup_json<T: DeserializeOwned>(&self, segments: &[&str]) -> ApiResult<Option<Versioned<T>>> {
        let url = self.endpoint(segments)?;
        let response = self.send("GET", &url, self.client.get(url.clone()))?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!(
                "event=api_lookup module=api status=not_found path={}",
                url.path()
            );
            return Ok(None);
        }
        let response = ensure_success(&url, response)?;
        let version = etag(&response);
        Ok(Some(Versioned::new(decode(response)?, version)))
    }

    fn list<T: DeserializeOwned>(&self, segments: &[&str]) -> ApiResult<Vec<T>> {
        let envelope: ItemsEnvelope<T> = self.get_json(segments)?;
        Ok(envelope.items)
    }

    fn put_versioned<B, T>(
        &self,
        segments: &[&str],
        body: &B,
        expected_version: Option<&str>,
    ) -> ApiResult<(T, Option<String>)>
    where
        B: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments)?;
        let mut request = self.client.put(url.clone()).json(body);
        if let Some(version) = expected_version {
            request = request.header(IF_MATCH, version);
        }
        let response = self.send("PUT", &url, request)?;
        let response = ensure_success(&url, response)?;
        let version = etag(&response);
        Ok((decode(response)?, version))
    }
}

impl CatalogApi for HttpCatalogApi {
    fn list_privacy_groups(&self) -> ApiResult<Vec<PrivacyGroup>> {
        self.list(&["api", "privacy", "groups"])
    }

    fn create_privacy_group(&self, request: &GroupCreateRequest) -> ApiResult<GroupResponse> {
        let url = self.endpoint(&["api", "privacy", "groups"])?;
        let response = self.send("POST", &url, self.client.post(url.clone()).json(request))?;
        decode(ensure_success(&url, response)?)
    }

    fn update_privacy_group(
        &self,
        id: &str,
        request: &GroupUpdateRequest,
    ) -> ApiResult<GroupResponse> {
        let url = self.endpoint(&["api", "privacy", "groups", id])?;
        let response = self.send("PATCH", &url, self.client.patch(url.clone()).json(request))?;
        decode(ensure_success(&url, response)?)
    }

    fn delete_privacy_group(&self, id: &str, request: &GroupDeleteRequest) -> ApiResult<()> {
        let url = self.endpoint(&["api", "privacy", "groups", id])?;
        let response = self.send("DELETE", &url, self.client.delete(url.clone()).json(request))?;
        ensure_success(&url, response)?;
        Ok(())
    }

    fn list_privacy_controls(&self) -> ApiResult<Vec<PrivacyControlSummary>> {
        self.list(&["api", "privacy", "controls"])
    }

    fn get_privacy_control(
        &self,
        id: &str,
    ) -> ApiResult<Option<Versioned<PrivacyControlDetail>>> {
        self.lookup_json(&["api", "privacy", "controls", id])
    }

    fn save_privacy_control(
        &self,
        control: &PrivacyControlDetail,
        expected_version: Option<&str>,
    ) -> ApiResult<Versioned<PrivacyControlDetail>> {
        let (saved, version): (PrivacyControlSaveResponse, _) = self.put_versioned(
            &["api", "privacy", "controls", control.id.as_str()],
            control,
            expected_version,
        )?;
        Ok(Versioned::new(saved.updated, version))
    }

    fn list_resilience_controls(&self) -> ApiResult<Vec<ResilienceControl>> {
        self.list(&["api", "resilience", "controls"])
    }

    fn get_resilience_control(&self, id: &str) -> ApiResult<Option<Versioned<ResilienceControl>>> {
        self.lookup_json(&["api", "resilience", "controls", id])
    }

    fn save_resilience_control(
        &self,
        control: &ResilienceControl,
        expected_version: Option<&str>,
    ) -> ApiResult<Versioned<ResilienceControl>> {
        let (saved, version) = self.put_versioned(
            &["api", "resilience", "controls", control.id.as_str()],
            control,
            expected_version,
        )?;
        Ok(Versioned::new(saved, version))
    }

    fn list_sdm_controls(&self) -> ApiResult<Vec<SdmControlSummary>> {
        self.list(&["api", "sdm", "controls"])
    }

    fn get_sdm_control(&self, id: &str) -> ApiResult<Option<SdmControlDetail>> {
        let found: Option<Versioned<SdmControlDetail>> =
            self.lookup_json(&["api", "sdm", "controls", id])?;
        Ok(found.map(|versioned| versioned.record))
    }

    fn list_mappings(&self) -> ApiResult<Vec<Mapping>> {
        self.list(&["api", "mapping"])
    }

    fn get_mapping(&self, sdm_control_id: &str) -> ApiResult<Option<Versioned<Mapping>>> {
        self.lookup_json(&["api", "mapping", sdm_control_id])
    }

    fn save_mapping(
        &self,
        mapping: &Mapping,
        expected_version: Option<&str>,
    ) -> ApiResult<Versioned<Mapping>> {
        let (saved, version) = self.put_versioned(
            &["api", "mapping", mapping.sdm_control_id.as_str()],
            &mapping.to_update_request(),
            expected_version,
        )?;
        Ok(Versioned::new(saved, version))
    }

    fn get_file(&self, key: FileKey) -> ApiResult<FileContent> {
        self.get_json(&["api", "files", key.as_str()])
    }

    fn diff_file(&self, key: FileKey, updated: &str) -> ApiResult<FileDiffResult> {
        let url = self.endpoint(&["api", "files", key.as_str(), "diff"])?;
        let body = FileDiffRequest {
            updated: updated.to_string(),
        };
        let response = self.send("POST", &url, self.client.post(url.clone()).json(&body))?;
        decode(ensure_success(&url, response)?)
    }
}

fn ensure_success(url: &Url, response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    warn!(
        "event=api_request module=api status=error http_status={} path={}",
        status.as_u16(),
        url.path()
    );
    Err(classify_failure(status.as_u16(), url.path(), &body))
}

/// Maps a non-success status and its body text to an [`ApiError`].
pub(crate) fn classify_failure(status: u16, path: &str, body: &str) -> ApiError {
    let body = sanitize_message(body.trim(), MAX_ERROR_BODY_CHARS);
    match status {
        404 => ApiError::NotFound {
            path: path.to_string(),
        },
        409 | 412 => ApiError::Conflict { status, body },
        _ => ApiError::Status { status, body },
    }
}

fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let text = response.text()?;
    Ok(serde_json::from_str(&text)?)
}

fn etag(response: &Response) -> Option<String> {
    response
        .headers()
        .get(ETAG)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}
