//! HTTP client for the hub's code pages

use std::time::Duration;

use async_trait::async_trait;
use hub_core::{CodeType, RemoteGateway, RemoteSource, Resource, ResourceId, SaveTarget, SavedResource};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::html::{self, Device, InstalledApp, SavePage};
use crate::{Error, Result};

/// JSON returned by `/{type}/ajax/code` and `/{type}/ajax/update`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CodeResponse {
    #[serde(default)]
    version: Option<u64>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
}

impl CodeResponse {
    fn is_error(&self) -> bool {
        self.status.as_deref() == Some("error")
    }

    fn error_message(&self) -> String {
        self.error_message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or("unknown error")
            .to_string()
    }
}

/// Gateway to a hub's web UI.
///
/// One client is shared by every concurrent reconciliation task; the
/// underlying connection pool is reused across requests.
#[derive(Debug, Clone)]
pub struct HubClient {
    base_url: String,
    client: reqwest::Client,
}

impl HubClient {
    /// Create a client for `host` (`address` or `address:port`).
    ///
    /// Every request is bounded by `timeout`.
    pub fn new(host: &str, timeout: Duration) -> Result<Self> {
        let host = host.trim().trim_end_matches('/');
        if host.is_empty() || host.contains(char::is_whitespace) {
            return Err(Error::InvalidHost {
                host: host.to_string(),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| Error::Http {
                url: host.to_string(),
                source,
            })?;

        Ok(Self {
            base_url: format!("http://{host}"),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response> {
        let url = self.url(path);
        tracing::debug!(url = %url, "GET");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| Error::Http { url, source })?;
        Ok(response)
    }

    async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Result<reqwest::Response> {
        let url = self.url(path);
        tracing::debug!(url = %url, "POST");
        self.client
            .post(&url)
            .form(form)
            .send()
            .await
            .map_err(|source| Error::Http { url, source })
    }

    /// Read a successful response body as text.
    async fn body_text(response: reqwest::Response) -> Result<String> {
        let url = response.url().to_string();
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status { url, status });
        }
        response.text().await.map_err(|source| Error::Http { url, source })
    }

    async fn body_json(response: reqwest::Response) -> Result<CodeResponse> {
        let url = response.url().to_string();
        let text = Self::body_text(response).await?;
        serde_json::from_str(&text).map_err(|e| Error::markup(url, e.to_string()))
    }

    async fn list_page(&self, path: &str) -> Result<String> {
        let response = self.get(path).await?;
        Self::body_text(response).await
    }

    /// List the apps or drivers on the hub.
    pub async fn list_code(&self, kind: CodeType) -> Result<Vec<Resource>> {
        let path = format!("/{kind}/list");
        let page = self.list_page(&path).await?;
        html::parse_code_list(&page, kind)
            .ok_or_else(|| Error::markup(self.url(&path), format!("no {kind} table in page")))
    }

    /// List the devices on the hub.
    pub async fn list_devices(&self) -> Result<Vec<Device>> {
        let path = "/device/list";
        let page = self.list_page(path).await?;
        html::parse_device_list(&page).ok_or_else(|| Error::markup(self.url(path), "no device table in page"))
    }

    /// List the installed app instances on the hub.
    pub async fn list_installed_apps(&self) -> Result<Vec<InstalledApp>> {
        let path = "/installedapp/list";
        let page = self.list_page(path).await?;
        html::parse_installed_list(&page)
            .ok_or_else(|| Error::markup(self.url(path), "no installed app table in page"))
    }

    async fn fetch(&self, kind: CodeType, id: ResourceId) -> std::result::Result<RemoteSource, hub_core::Error> {
        let path = format!("/{kind}/ajax/code?id={id}");
        let response = self.get(&path).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(hub_core::Error::NotFound { kind, id });
        }

        let code = Self::body_json(response).await?;
        if code.is_error() {
            tracing::debug!(kind = %kind, id, message = %code.error_message(), "hub reported fetch error");
            return Err(hub_core::Error::NotFound { kind, id });
        }

        match (code.source, code.version) {
            (Some(source), Some(version)) => Ok(RemoteSource { source, version }),
            _ => Err(Error::markup(self.url(&path), "response is missing source or version").into()),
        }
    }

    async fn update(&self, kind: CodeType, target: SaveTarget, source: &str) -> Result<SavedResource> {
        let path = format!("/{kind}/ajax/update");
        let id = target.id.to_string();
        let version = target.version.to_string();
        let response = self
            .post_form(&path, &[("id", id.as_str()), ("version", version.as_str()), ("source", source)])
            .await?;

        let code = Self::body_json(response).await?;
        if code.is_error() {
            return Err(Error::Rejected {
                kind,
                message: code.error_message(),
            });
        }

        let version = code
            .version
            .ok_or_else(|| Error::markup(self.url(&path), "response is missing version"))?;
        Ok(SavedResource {
            id: target.id,
            version,
        })
    }

    async fn create(&self, kind: CodeType, source: &str) -> Result<SavedResource> {
        let path = format!("/{kind}/save");
        let response = self
            .post_form(&path, &[("id", ""), ("version", ""), ("source", source)])
            .await?;
        let page = Self::body_text(response).await?;

        match html::parse_save_page(&page) {
            Some(SavePage::Saved { id, version }) => Ok(SavedResource { id, version }),
            Some(SavePage::Rejected { message }) => Err(Error::Rejected { kind, message }),
            None => Err(Error::markup(self.url(&path), "no edit form in page")),
        }
    }
}

#[async_trait]
impl RemoteGateway for HubClient {
    async fn list_resources(&self, kind: CodeType) -> hub_core::Result<Vec<Resource>> {
        Ok(self.list_code(kind).await?)
    }

    async fn fetch_resource(&self, kind: CodeType, id: ResourceId) -> hub_core::Result<RemoteSource> {
        self.fetch(kind, id).await
    }

    async fn save_resource(
        &self,
        kind: CodeType,
        target: Option<SaveTarget>,
        source: &str,
    ) -> hub_core::Result<SavedResource> {
        let saved = match target {
            Some(target) => self.update(kind, target, source).await?,
            None => self.create(kind, source).await?,
        };
        tracing::debug!(kind = %kind, id = saved.id, version = saved.version, "saved on hub");
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn base_url_uses_plain_http() {
        let client = HubClient::new("192.168.1.10:8080/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://192.168.1.10:8080");
        assert_eq!(client.url("/app/list"), "http://192.168.1.10:8080/app/list");
    }

    #[test]
    fn rejects_blank_host() {
        assert!(matches!(
            HubClient::new("  ", Duration::from_secs(5)),
            Err(Error::InvalidHost { .. })
        ));
    }

    #[test]
    fn update_error_message_is_trimmed() {
        let code: CodeResponse = serde_json::from_str(
            r#"{"id": 7, "version": 3, "status": "error", "errorMessage": "  unexpected token: } @ line 12\n"}"#,
        )
        .unwrap();
        assert!(code.is_error());
        assert_eq!(code.error_message(), "unexpected token: } @ line 12");
    }

    #[test]
    fn rejection_maps_to_remote_validation() {
        let error: hub_core::Error = Error::Rejected {
            kind: CodeType::Driver,
            message: "bad".into(),
        }
        .into();
        assert!(matches!(error, hub_core::Error::RemoteValidation { .. }));

        let error: hub_core::Error = Error::markup("http://hub/app/list", "no table").into();
        assert_eq!(error.failure_reason(), hub_core::FailureReason::Transport);
    }

    #[tokio::test]
    async fn unreachable_hub_is_a_transport_error() {
        // Port 9 on localhost is the discard service; nothing answers HTTP there
        let client = HubClient::new("127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = client.list_resources(CodeType::App).await.unwrap_err();
        assert_eq!(err.failure_reason(), hub_core::FailureReason::Transport);
    }
}
