/// Kubeconfig derivation
///
/// Builds a structurally valid multi-cluster client configuration from a
/// fetched cluster resource. Legacy-authorization clusters embed the issued
/// client certificate; everything else delegates to the gcloud
/// config-helper through an auth-provider descriptor.
use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::gke::models::ClusterResource;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KubeConfig {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub preferences: BTreeMap<String, serde_json::Value>,
    pub clusters: Vec<NamedCluster>,
    pub contexts: Vec<NamedContext>,
    pub users: Vec<NamedUser>,
    #[serde(rename = "current-context")]
    pub current_context: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedCluster {
    pub name: String,
    pub cluster: ClusterEndpoint,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterEndpoint {
    #[serde(
        rename = "certificate-authority-data",
        skip_serializing_if = "Option::is_none"
    )]
    pub certificate_authority_data: Option<String>,
    pub server: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedContext {
    pub name: String,
    pub context: ContextRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextRef {
    pub cluster: String,
    pub user: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedUser {
    pub name: String,
    pub user: UserCredentials,
}

/// Either embedded client-certificate material or an auth-provider
/// descriptor, never both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserCredentials {
    #[serde(
        rename = "client-certificate-data",
        skip_serializing_if = "Option::is_none"
    )]
    pub client_certificate_data: Option<String>,
    #[serde(rename = "client-key-data", skip_serializing_if = "Option::is_none")]
    pub client_key_data: Option<String>,
    #[serde(rename = "auth-provider", skip_serializing_if = "Option::is_none")]
    pub auth_provider: Option<AuthProvider>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthProvider {
    pub name: String,
    pub config: BTreeMap<String, String>,
}

impl KubeConfig {
    /// Derive access configuration for `cluster_id` from its fetched state.
    pub fn from_cluster(
        cluster_id: &str,
        info: &ClusterResource,
        gcloud_sdk_root: Option<&Path>,
    ) -> Result<Self> {
        let endpoint = info.endpoint.as_deref().ok_or_else(|| {
            Error::remote(
                "derive kubeconfig",
                cluster_id.to_string(),
                "cluster resource has no endpoint (still provisioning?)",
            )
        })?;
        let master_auth = info.master_auth.as_ref().ok_or_else(|| {
            Error::remote(
                "derive kubeconfig",
                cluster_id.to_string(),
                "cluster resource has no master auth material",
            )
        })?;

        let legacy_auth = info
            .legacy_abac
            .as_ref()
            .map(|abac| abac.enabled)
            .unwrap_or(false);

        let user = if legacy_auth {
            let client_certificate = master_auth.client_certificate.clone().ok_or_else(|| {
                Error::remote(
                    "derive kubeconfig",
                    cluster_id.to_string(),
                    "legacy-auth cluster did not issue a client certificate",
                )
            })?;
            let client_key = master_auth.client_key.clone().ok_or_else(|| {
                Error::remote(
                    "derive kubeconfig",
                    cluster_id.to_string(),
                    "legacy-auth cluster did not issue a client key",
                )
            })?;
            UserCredentials {
                client_certificate_data: Some(client_certificate),
                client_key_data: Some(client_key),
                auth_provider: None,
            }
        } else {
            UserCredentials {
                auth_provider: Some(gcloud_auth_provider(gcloud_sdk_root)),
                ..Default::default()
            }
        };

        let cluster_name = format!("cluster-{}", cluster_id);
        let user_name = format!("user-{}", cluster_id);
        let context_name = format!("context-{}", cluster_id);

        Ok(KubeConfig {
            api_version: "v1".to_string(),
            kind: "Config".to_string(),
            preferences: BTreeMap::new(),
            clusters: vec![NamedCluster {
                name: cluster_name.clone(),
                cluster: ClusterEndpoint {
                    certificate_authority_data: master_auth.cluster_ca_certificate.clone(),
                    server: format!("https://{}", endpoint),
                },
            }],
            contexts: vec![NamedContext {
                name: context_name.clone(),
                context: ContextRef {
                    cluster: cluster_name,
                    user: user_name.clone(),
                },
            }],
            users: vec![NamedUser {
                name: user_name,
                user,
            }],
            current_context: context_name,
        })
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| Error::Validation(format!("unserializable kubeconfig: {}", e)))
    }
}

/// Auth-provider descriptor delegating token acquisition to the gcloud
/// config-helper, the same credential source used for API calls.
fn gcloud_auth_provider(sdk_root: Option<&Path>) -> AuthProvider {
    let cmd_path = sdk_root
        .map(|root| root.join("bin").join("gcloud").display().to_string())
        .unwrap_or_else(|| "gcloud".to_string());

    let mut config = BTreeMap::new();
    config.insert("cmd-args".to_string(), "config config-helper --format=json".to_string());
    config.insert("cmd-path".to_string(), cmd_path);
    config.insert("expiry-key".to_string(), "{.credential.token_expiry}".to_string());
    config.insert("token-key".to_string(), "{.credential.access_token}".to_string());

    AuthProvider {
        name: "gcp".to_string(),
        config,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn cluster_resource(legacy: bool) -> ClusterResource {
        let raw = serde_json::json!({
            "name": "c1",
            "endpoint": "203.0.113.10",
            "legacyAbac": {"enabled": legacy},
            "masterAuth": {
                "clusterCaCertificate": "Q0FDRVJU",
                "clientCertificate": "Q0xJRU5UQ0VSVA==",
                "clientKey": "Q0xJRU5US0VZ"
            }
        });
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn test_legacy_auth_embeds_client_certificate() {
        let config = KubeConfig::from_cluster("c1", &cluster_resource(true), None).unwrap();
        let user = &config.users[0].user;
        assert_eq!(user.client_certificate_data.as_deref(), Some("Q0xJRU5UQ0VSVA=="));
        assert_eq!(user.client_key_data.as_deref(), Some("Q0xJRU5US0VZ"));
        assert!(user.auth_provider.is_none());
    }

    #[test]
    fn test_non_legacy_auth_delegates_to_gcloud() {
        let sdk_root = PathBuf::from("/opt/google-cloud-sdk");
        let config =
            KubeConfig::from_cluster("c1", &cluster_resource(false), Some(&sdk_root)).unwrap();
        let user = &config.users[0].user;
        assert!(user.client_certificate_data.is_none());
        let provider = user.auth_provider.as_ref().unwrap();
        assert_eq!(provider.name, "gcp");
        assert_eq!(
            provider.config.get("cmd-path").map(String::as_str),
            Some("/opt/google-cloud-sdk/bin/gcloud")
        );
        assert_eq!(
            provider.config.get("token-key").map(String::as_str),
            Some("{.credential.access_token}")
        );
    }

    #[test]
    fn test_document_structure() {
        let config = KubeConfig::from_cluster("c1", &cluster_resource(false), None).unwrap();
        assert_eq!(config.api_version, "v1");
        assert_eq!(config.kind, "Config");
        assert_eq!(config.clusters[0].name, "cluster-c1");
        assert_eq!(config.clusters[0].cluster.server, "https://203.0.113.10");
        assert_eq!(
            config.clusters[0].cluster.certificate_authority_data.as_deref(),
            Some("Q0FDRVJU")
        );
        assert_eq!(config.contexts[0].context.cluster, "cluster-c1");
        assert_eq!(config.contexts[0].context.user, "user-c1");
        assert_eq!(config.current_context, "context-c1");

        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("current-context: context-c1"));
        assert!(yaml.contains("certificate-authority-data"));
    }

    #[test]
    fn test_missing_endpoint_is_an_error() {
        let mut info = cluster_resource(false);
        info.endpoint = None;
        let result = KubeConfig::from_cluster("c1", &info, None);
        assert!(matches!(result, Err(Error::RemoteCall { .. })));
    }

    #[test]
    fn test_missing_legacy_certificate_is_an_error() {
        let mut info = cluster_resource(true);
        if let Some(auth) = info.master_auth.as_mut() {
            auth.client_certificate = None;
        }
        let result = KubeConfig::from_cluster("c1", &info, None);
        assert!(matches!(result, Err(Error::RemoteCall { .. })));
    }

    #[test]
    fn test_round_trips_through_yaml() {
        let config = KubeConfig::from_cluster("c1", &cluster_resource(false), None).unwrap();
        let yaml = config.to_yaml().unwrap();
        let parsed: KubeConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.current_context, config.current_context);
        assert_eq!(parsed.users[0].user.auth_provider.as_ref().unwrap().name, "gcp");
    }
}
