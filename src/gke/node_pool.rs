/// Node-pool specification builder and handle
use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::gcloud::EnvironmentSource;
use crate::gke::api::ContainerApi;
use crate::gke::location::LocationDescriptor;
use crate::gke::models::{
    AcceleratorConfig, NodeConfigSpec, NodeManagement, NodePoolAutoscaling, NodePoolResource,
    NodePoolSpec, NodeTaint, OperationResource,
};
use crate::gke::operations::Operation;
use crate::utils::merge::{apply_valve, parse_settings_valve};
use crate::utils::{default_if_blank, is_blank};

/// Scope granting read access to the container registry buckets.
pub const GCR_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/devstorage.read_only";

/// How the nodes' service account is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceAccountType {
    /// Nodes inherit the host's active service account.
    InheritHost,
    /// Named account; a blank name means the platform default.
    Custom,
}

/// Accumulates node-pool options into a create request body.
///
/// Setters validate their own input and fail fast; `build()` is pure and
/// idempotent, returning the assembled body with the settings valve applied
/// last. The caller hands the body to a `ClusterBuilder` (cluster-creation
/// path) or to `NodePool::create` (incremental path).
#[derive(Debug, Clone, Default)]
pub struct NodePoolBuilder {
    name: Option<String>,
    node_count: Option<i32>,
    machine_type: Option<String>,
    disk_type: Option<String>,
    disk_size_gb: Option<i32>,
    oauth_scopes: Vec<String>,
    service_account: Option<String>,
    enable_autoscaling: bool,
    min_node_count: Option<i32>,
    max_node_count: Option<i32>,
    enable_gpu: bool,
    gpu_type: Option<String>,
    gpu_count: i64,
    spot: bool,
    node_labels: BTreeMap<String, String>,
    taints: Vec<NodeTaint>,
    resource_labels: BTreeMap<String, String>,
    network_tags: Vec<String>,
    settings_valve: Option<String>,
}

impl NodePoolBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_node_count(mut self, node_count: i32) -> Self {
        self.node_count = Some(node_count);
        self
    }

    pub fn with_machine_type(mut self, machine_type: Option<&str>) -> Self {
        self.machine_type = default_if_blank(machine_type);
        self
    }

    pub fn with_disk_type(mut self, disk_type: Option<&str>) -> Self {
        self.disk_type = default_if_blank(disk_type);
        self
    }

    pub fn with_disk_size_gb(mut self, disk_size_gb: Option<i32>) -> Self {
        self.disk_size_gb = disk_size_gb;
        self
    }

    /// Grant nodes read access to the container registry. Idempotent: the
    /// scope is added at most once.
    pub fn use_gcr_io(mut self, use_gcr_io: bool) -> Self {
        if use_gcr_io {
            self.add_oauth_scope(GCR_READONLY_SCOPE);
        }
        self
    }

    pub fn with_oauth_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for scope in scopes {
            let scope = scope.as_ref().trim();
            if !scope.is_empty() {
                self.add_oauth_scope(scope);
            }
        }
        self
    }

    fn add_oauth_scope(&mut self, scope: &str) {
        if !self.oauth_scopes.iter().any(|s| s == scope) {
            self.oauth_scopes.push(scope.to_string());
        }
    }

    /// Select the service account the pool's nodes run as. `InheritHost`
    /// resolves the executing host's identity; `Custom` with a blank name
    /// selects the platform default.
    pub async fn with_service_account(
        mut self,
        selection: Option<ServiceAccountType>,
        custom_name: Option<&str>,
        env: &dyn EnvironmentSource,
    ) -> Result<Self> {
        match selection {
            Some(ServiceAccountType::InheritHost) => {
                let host_account = env.discover().await?.service_account;
                match host_account {
                    Some(account) => {
                        info!("Pool nodes will inherit the host service account: {}", account);
                        self.service_account = Some(account);
                    }
                    None => {
                        warn!("Host service account not found, using the platform default");
                        self.service_account = Some(String::new());
                    }
                }
            }
            Some(ServiceAccountType::Custom) => match default_if_blank(custom_name) {
                Some(name) => {
                    info!("Pool nodes will run as custom service account: {}", name);
                    self.service_account = Some(name);
                }
                None => {
                    info!("Pool nodes will run as the platform default service account");
                    self.service_account = Some(String::new());
                }
            },
            None => {}
        }
        Ok(self)
    }

    /// Enable autoscaling; min/max fall back to the initial node count.
    pub fn with_autoscaling(
        mut self,
        enabled: bool,
        min_node_count: Option<i32>,
        max_node_count: Option<i32>,
    ) -> Self {
        self.enable_autoscaling = enabled;
        self.min_node_count = min_node_count;
        self.max_node_count = max_node_count;
        self
    }

    pub fn with_gpu(mut self, enabled: bool, gpu_type: Option<&str>, gpu_count: i64) -> Self {
        self.enable_gpu = enabled;
        self.gpu_type = default_if_blank(gpu_type);
        self.gpu_count = gpu_count;
        self
    }

    pub fn with_spot_vms(mut self, spot: bool) -> Self {
        self.spot = spot;
        self
    }

    /// Kubernetes labels applied to the pool's nodes.
    pub fn with_node_labels(mut self, labels: &BTreeMap<String, String>) -> Result<Self> {
        validate_label_keys(labels, "node label")?;
        if let Some(name) = &self.name {
            info!("Adding node labels {:?} to pool {}", labels, name);
        }
        self.node_labels.extend(labels.clone());
        Ok(self)
    }

    pub fn with_taints(mut self, taints: &[NodeTaint]) -> Result<Self> {
        for taint in taints {
            if is_blank(Some(&taint.key)) {
                return Err(Error::Validation(
                    "node taint with a blank key".to_string(),
                ));
            }
        }
        self.taints.extend(taints.iter().cloned());
        Ok(self)
    }

    /// Cloud resource labels: cluster-level labels first, pool-specific
    /// labels win on collision.
    pub fn with_resource_labels(
        mut self,
        cluster_labels: &BTreeMap<String, String>,
        pool_labels: &BTreeMap<String, String>,
    ) -> Result<Self> {
        validate_label_keys(cluster_labels, "resource label")?;
        validate_label_keys(pool_labels, "resource label")?;
        self.resource_labels.extend(cluster_labels.clone());
        self.resource_labels.extend(pool_labels.clone());
        Ok(self)
    }

    pub fn with_network_tags(mut self, tags: &[String]) -> Self {
        self.network_tags
            .extend(tags.iter().filter(|t| !t.trim().is_empty()).cloned());
        self
    }

    pub fn with_settings_valve(mut self, valve: Option<&str>) -> Self {
        self.settings_valve = default_if_blank(valve);
        self
    }

    /// Assemble the final node-pool body.
    pub fn build(&self) -> Result<Value> {
        if self.enable_gpu && self.gpu_type.is_none() {
            return Err(Error::Validation(
                "accelerator type is required when GPUs are enabled".to_string(),
            ));
        }

        let initial_node_count = self.node_count.unwrap_or(3);

        let accelerators = if self.enable_gpu {
            info!("GPU option enabled");
            Some(vec![AcceleratorConfig {
                accelerator_count: self.gpu_count.max(1),
                accelerator_type: self.gpu_type.clone().unwrap_or_default(),
            }])
        } else {
            None
        };

        let autoscaling = if self.enable_autoscaling {
            Some(NodePoolAutoscaling {
                enabled: true,
                min_node_count: self.min_node_count.unwrap_or(initial_node_count),
                max_node_count: self.max_node_count.unwrap_or(initial_node_count),
            })
        } else {
            None
        };

        let spec = NodePoolSpec {
            name: self
                .name
                .clone()
                .unwrap_or_else(|| "node-pool".to_string()),
            initial_node_count,
            config: NodeConfigSpec {
                machine_type: self.machine_type.clone(),
                disk_type: self.disk_type.clone(),
                disk_size_gb: self.disk_size_gb.filter(|size| *size > 0),
                oauth_scopes: self.oauth_scopes.clone(),
                service_account: self
                    .service_account
                    .clone()
                    .filter(|account| !account.is_empty()),
                accelerators,
                spot: self.spot.then_some(true),
                labels: self.node_labels.clone(),
                resource_labels: self.resource_labels.clone(),
                taints: (!self.taints.is_empty()).then(|| self.taints.clone()),
                tags: (!self.network_tags.is_empty()).then(|| self.network_tags.clone()),
            },
            autoscaling,
            management: NodeManagement {
                auto_upgrade: true,
                auto_repair: true,
            },
        };

        let body = serde_json::to_value(&spec)
            .map_err(|e| Error::Validation(format!("unserializable node pool spec: {}", e)))?;
        let valve = parse_settings_valve(self.settings_valve.as_deref())?;
        Ok(apply_valve(body, valve.as_ref()))
    }
}

fn validate_label_keys(labels: &BTreeMap<String, String>, kind: &str) -> Result<()> {
    for key in labels.keys() {
        if key.trim().is_empty() {
            return Err(Error::Validation(format!("{} with a blank key", kind)));
        }
    }
    Ok(())
}

/// Handle on one node pool of an existing cluster.
pub struct NodePool {
    api: Arc<dyn ContainerApi>,
    location: LocationDescriptor,
    cluster_id: String,
    pub name: String,
}

impl NodePool {
    pub(crate) fn new(
        api: Arc<dyn ContainerApi>,
        location: LocationDescriptor,
        cluster_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            api,
            location,
            cluster_id: cluster_id.into(),
            name: name.into(),
        }
    }

    /// Builder for submitting this pool to the control plane.
    pub fn builder(&self) -> NodePoolBuilder {
        NodePoolBuilder::new().with_name(&self.name)
    }

    /// Fetch this pool's current state.
    pub async fn get_info(&self) -> Result<NodePoolResource> {
        let params = self.location.cluster(&self.cluster_id);
        let pools = self.api.list_node_pools(&params).await?;
        pools
            .into_iter()
            .find(|pool| pool.name == self.name)
            .ok_or_else(|| {
                Error::remote(
                    "get node pool",
                    format!("{}/nodePools/{}", params.resource_path(), self.name),
                    "node pool not found",
                )
            })
    }

    /// Submit a built node-pool body, creating the pool on the cluster.
    pub async fn create(&self, node_pool: Value) -> Result<Operation> {
        info!(
            "Requesting node pool {} on cluster {}",
            self.name, self.cluster_id
        );
        let params = self.location.cluster(&self.cluster_id);
        let response = self.api.create_node_pool(&params, node_pool).await?;
        Ok(self.operation(response))
    }

    /// Resize to a positive node count.
    pub async fn resize(&self, node_count: i32) -> Result<Operation> {
        let params = self.location.node_pool(&self.cluster_id, &self.name);
        let response = self.api.resize_node_pool(&params, node_count).await?;
        Ok(self.operation(response))
    }

    /// Delete this pool.
    pub async fn delete(&self) -> Result<Operation> {
        let params = self.location.node_pool(&self.cluster_id, &self.name);
        let response = self.api.delete_node_pool(&params).await?;
        Ok(self.operation(response))
    }

    /// Scale to `node_count` nodes. Scaling to zero deletes the pool rather
    /// than resizing it, the control plane rejects a zero-size resize.
    pub async fn scale(&self, node_count: i32) -> Result<Operation> {
        if node_count < 0 {
            return Err(Error::Validation(format!(
                "node count must be >= 0, got {}",
                node_count
            )));
        }
        if node_count == 0 {
            info!("Scaling node pool {} to zero: deleting it", self.name);
            self.delete().await
        } else {
            info!("Resizing node pool {} to {} nodes", self.name, node_count);
            self.resize(node_count).await
        }
    }

    fn operation(&self, resource: OperationResource) -> Operation {
        Operation::new(self.api.clone(), self.location.clone(), resource)
    }
}
