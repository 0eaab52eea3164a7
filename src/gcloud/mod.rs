/// Local environment discovery via the gcloud CLI and the instance metadata
/// service
///
/// The rest of the crate treats this as an opaque lookup: defaults for
/// project/zone/region, the host's active account and service account, the
/// host network, and an access token for the control plane.
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

const METADATA_BASE: &str = "http://metadata.google.internal/computeMetadata/v1";

/// Environment defaults discovered from the host.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentInfo {
    pub account: Option<String>,
    pub project: Option<String>,
    pub region: Option<String>,
    pub zone: Option<String>,
    pub sdk_root: Option<PathBuf>,
    pub network: Option<String>,
    pub subnetwork: Option<String>,
    pub service_account: Option<String>,
}

/// Source of host-environment defaults and credentials.
#[async_trait]
pub trait EnvironmentSource: Send + Sync {
    /// Discover environment defaults. Populated at most once per source and
    /// safe to call concurrently afterwards.
    async fn discover(&self) -> Result<EnvironmentInfo>;

    /// Fetch an access token for the control plane.
    async fn access_token(&self) -> Result<String>;
}

/// Environment source backed by `gcloud` with a metadata-server fallback.
#[derive(Default)]
pub struct GcloudEnvironment {
    info: OnceCell<EnvironmentInfo>,
}

impl GcloudEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    async fn load_info() -> Result<EnvironmentInfo> {
        let mut info = EnvironmentInfo::default();

        match run_gcloud(&["info", "--format", "json"]).await {
            Ok(raw) => {
                let parsed: Value = serde_json::from_str(&raw).map_err(|e| {
                    Error::Configuration(format!("unreadable gcloud info output: {}", e))
                })?;
                info.account = string_at(&parsed, &["config", "account"]);
                info.project = string_at(&parsed, &["config", "project"]);
                info.region = string_at(&parsed, &["config", "properties", "compute", "region"]);
                info.zone = string_at(&parsed, &["config", "properties", "compute", "zone"]);
                info.sdk_root =
                    string_at(&parsed, &["installation", "sdk_root"]).map(PathBuf::from);
            }
            Err(e) => {
                warn!("gcloud info unavailable ({}), falling back to instance metadata", e);
            }
        }

        let metadata = MetadataClient::new();
        if info.project.is_none() {
            info.project = metadata.get("project/project-id").await;
        }
        if info.zone.is_none() {
            // metadata reports "projects/<num>/zones/<zone>"
            info.zone = metadata
                .get("instance/zone")
                .await
                .and_then(|z| z.rsplit('/').next().map(str::to_string));
        }
        info.network = metadata
            .get("instance/network-interfaces/0/network")
            .await
            .and_then(|n| n.rsplit('/').next().map(str::to_string));
        info.subnetwork = metadata
            .get("instance/network-interfaces/0/subnetwork")
            .await
            .and_then(|s| s.rsplit('/').next().map(str::to_string));
        info.service_account = metadata
            .get("instance/service-accounts/default/email")
            .await;

        info!(
            "Environment defaults: project={:?} zone={:?} region={:?} account={:?}",
            info.project, info.zone, info.region, info.account
        );
        Ok(info)
    }
}

#[async_trait]
impl EnvironmentSource for GcloudEnvironment {
    async fn discover(&self) -> Result<EnvironmentInfo> {
        let info = self.info.get_or_try_init(Self::load_info).await?;
        Ok(info.clone())
    }

    async fn access_token(&self) -> Result<String> {
        // The same helper the generated kubeconfig delegates to.
        match run_gcloud(&["config", "config-helper", "--format", "json"]).await {
            Ok(raw) => {
                let parsed: Value = serde_json::from_str(&raw).map_err(|e| {
                    Error::Configuration(format!("unreadable config-helper output: {}", e))
                })?;
                string_at(&parsed, &["credential", "access_token"]).ok_or_else(|| {
                    Error::Configuration("config-helper returned no access token".to_string())
                })
            }
            Err(cli_err) => {
                debug!("config-helper unavailable ({}), trying instance metadata", cli_err);
                let raw = MetadataClient::new()
                    .get("instance/service-accounts/default/token")
                    .await
                    .ok_or_else(|| {
                        Error::Configuration(
                            "no access token from gcloud or instance metadata".to_string(),
                        )
                    })?;
                let parsed: Value = serde_json::from_str(&raw).map_err(|e| {
                    Error::Configuration(format!("unreadable metadata token: {}", e))
                })?;
                string_at(&parsed, &["access_token"]).ok_or_else(|| {
                    Error::Configuration("instance metadata returned no access token".to_string())
                })
            }
        }
    }
}

/// Run a gcloud subcommand, returning stdout on success.
async fn run_gcloud(args: &[&str]) -> Result<String> {
    debug!("gcloud {}", args.join(" "));
    let output = Command::new("gcloud")
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| Error::Configuration(format!("failed to execute gcloud: {}", e)))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    } else {
        Err(Error::Configuration(format!(
            "gcloud {} failed: {}",
            args.first().unwrap_or(&""),
            String::from_utf8_lossy(&output.stderr).trim()
        )))
    }
}

/// Instance metadata client. Lookup failures are treated as "not on GCE".
struct MetadataClient {
    client: reqwest::Client,
}

impl MetadataClient {
    fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap_or_default();
        Self { client }
    }

    async fn get(&self, path: &str) -> Option<String> {
        let url = format!("{}/{}", METADATA_BASE, path);
        let response = self
            .client
            .get(&url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            return None;
        }
        let text = response.text().await.ok()?;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

/// Walk a JSON object down a key path, returning a non-blank string leaf.
fn string_at(value: &Value, path: &[&str]) -> Option<String> {
    let mut current = value;
    for key in path {
        current = current.get(key)?;
    }
    current
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Scripted environment for tests.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct FakeEnvironment {
    pub info: EnvironmentInfo,
}

#[cfg(test)]
#[async_trait]
impl EnvironmentSource for FakeEnvironment {
    async fn discover(&self) -> Result<EnvironmentInfo> {
        Ok(self.info.clone())
    }

    async fn access_token(&self) -> Result<String> {
        Ok("fake-token".to_string())
    }
}
