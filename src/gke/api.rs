/// Control-plane boundary
///
/// Everything the crate needs from the remote container API, as a dyn-safe
/// trait so handles and the operation poller can be exercised against a fake
/// plane in tests.
use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::gke::location::LocationParams;
use crate::gke::models::{ClusterResource, NodePoolResource, OperationResource};

/// Remote container control plane. All calls are synchronous
/// request/response; mutating calls return a long-running operation.
#[async_trait]
pub trait ContainerApi: Send + Sync {
    async fn create_cluster(&self, parent: &LocationParams, cluster: Value)
        -> Result<OperationResource>;

    async fn get_cluster(&self, cluster: &LocationParams) -> Result<ClusterResource>;

    async fn delete_cluster(&self, cluster: &LocationParams) -> Result<OperationResource>;

    async fn list_node_pools(&self, cluster: &LocationParams) -> Result<Vec<NodePoolResource>>;

    async fn create_node_pool(
        &self,
        cluster: &LocationParams,
        node_pool: Value,
    ) -> Result<OperationResource>;

    async fn resize_node_pool(
        &self,
        node_pool: &LocationParams,
        node_count: i32,
    ) -> Result<OperationResource>;

    async fn delete_node_pool(&self, node_pool: &LocationParams) -> Result<OperationResource>;

    async fn get_operation(&self, operation: &LocationParams) -> Result<OperationResource>;
}
