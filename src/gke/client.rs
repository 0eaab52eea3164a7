/// GKE control-plane API client
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::gke::api::ContainerApi;
use crate::gke::location::LocationParams;
use crate::gke::models::{
    ApiErrorResponse, ClusterResource, NodePoolResource, OperationResource,
};

const GKE_API_BASE: &str = "https://container.googleapis.com/v1";

/// HTTP client for the GKE v1 API.
///
/// Safe for concurrent independent calls; clone freely.
#[derive(Clone)]
pub struct GkeClient {
    client: Client,
}

impl GkeClient {
    /// Create a new client authenticating with the given access token.
    pub fn new(access_token: &str) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", access_token))
                .map_err(|_| Error::Configuration("invalid access token format".to_string()))?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Configuration(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    async fn get<T: DeserializeOwned>(&self, call: &'static str, path: &str) -> Result<T> {
        let url = format!("{}/{}", GKE_API_BASE, path);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::remote(call, path, e))?;

        Self::handle_response(call, path, response).await
    }

    async fn post<T: Serialize, R: DeserializeOwned>(
        &self,
        call: &'static str,
        path: &str,
        body: &T,
    ) -> Result<R> {
        let url = format!("{}/{}", GKE_API_BASE, path);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::remote(call, path, e))?;

        Self::handle_response(call, path, response).await
    }

    async fn delete<R: DeserializeOwned>(&self, call: &'static str, path: &str) -> Result<R> {
        let url = format!("{}/{}", GKE_API_BASE, path);
        debug!("DELETE {}", url);

        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|e| Error::remote(call, path, e))?;

        Self::handle_response(call, path, response).await
    }

    /// Decode a response, surfacing the control plane's own error message on
    /// a rejected request.
    async fn handle_response<T: DeserializeOwned>(
        call: &'static str,
        path: &str,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();

        if status.is_success() {
            response
                .json::<T>()
                .await
                .map_err(|e| Error::remote(call, path, format!("failed to parse response: {}", e)))
        } else {
            let error_text = response.text().await.unwrap_or_default();

            if let Ok(error_response) = serde_json::from_str::<ApiErrorResponse>(&error_text) {
                let detail = error_response.error;
                return Err(Error::remote(
                    call,
                    path,
                    format!(
                        "{} {}: {}",
                        detail.code.unwrap_or_else(|| status.as_u16() as i32),
                        detail.status.unwrap_or_default(),
                        detail.message
                    ),
                ));
            }

            Err(Error::remote(
                call,
                path,
                format!("status {}: {}", status, error_text),
            ))
        }
    }
}

#[async_trait]
impl ContainerApi for GkeClient {
    async fn create_cluster(
        &self,
        parent: &LocationParams,
        cluster: Value,
    ) -> Result<OperationResource> {
        let request = CreateClusterRequest {
            cluster,
            parent: parent.parent_field(),
        };
        self.post("create cluster", &parent.collection_path("clusters"), &request)
            .await
    }

    async fn get_cluster(&self, cluster: &LocationParams) -> Result<ClusterResource> {
        self.get("get cluster", &cluster.resource_path()).await
    }

    async fn delete_cluster(&self, cluster: &LocationParams) -> Result<OperationResource> {
        self.delete("delete cluster", &cluster.resource_path()).await
    }

    async fn list_node_pools(&self, cluster: &LocationParams) -> Result<Vec<NodePoolResource>> {
        let response: ListNodePoolsResponse = self
            .get("list node pools", &cluster.collection_path("nodePools"))
            .await?;
        Ok(response.node_pools)
    }

    async fn create_node_pool(
        &self,
        cluster: &LocationParams,
        node_pool: Value,
    ) -> Result<OperationResource> {
        let request = CreateNodePoolRequest {
            node_pool,
            parent: cluster.parent_field(),
        };
        self.post(
            "create node pool",
            &cluster.collection_path("nodePools"),
            &request,
        )
        .await
    }

    async fn resize_node_pool(
        &self,
        node_pool: &LocationParams,
        node_count: i32,
    ) -> Result<OperationResource> {
        let request = SetNodePoolSizeRequest { node_count };
        self.post(
            "resize node pool",
            &node_pool.action_path("setSize"),
            &request,
        )
        .await
    }

    async fn delete_node_pool(&self, node_pool: &LocationParams) -> Result<OperationResource> {
        self.delete("delete node pool", &node_pool.resource_path())
            .await
    }

    async fn get_operation(&self, operation: &LocationParams) -> Result<OperationResource> {
        self.get("get operation", &operation.resource_path()).await
    }
}

/// Request structure for creating a cluster. The composed `parent` is only
/// present under the regional dialect.
#[derive(Debug, Serialize)]
pub struct CreateClusterRequest {
    pub cluster: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

/// Request structure for adding a node pool to an existing cluster.
#[derive(Debug, Serialize)]
pub struct CreateNodePoolRequest {
    #[serde(rename = "nodePool")]
    pub node_pool: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

/// Request structure for resizing a node pool.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetNodePoolSizeRequest {
    pub node_count: i32,
}

#[derive(Debug, Deserialize)]
struct ListNodePoolsResponse {
    #[serde(default, rename = "nodePools")]
    node_pools: Vec<NodePoolResource>,
}
