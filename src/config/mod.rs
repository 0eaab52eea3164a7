/// Configuration management for Granite - managed Kubernetes on GKE
use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::gke::models::{NodeTaint, ReleaseChannel};
use crate::gke::node_pool::ServiceAccountType;
use crate::utils::is_blank;

/// Main provisioning configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionConfig {
    /// GCP project (falls back to the environment default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    /// Compute zone, e.g. "europe-west1-b" (falls back to the environment default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,

    /// Compute region (derived from the zone when not set)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Cluster-level settings
    pub cluster: ClusterSettings,

    /// Node pools (ignored for autopilot clusters)
    #[serde(default)]
    pub node_pools: Vec<NodePoolSettings>,
}

/// Cluster-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterSettings {
    /// Cluster name (auto-generated when empty)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Kubernetes version for standard clusters, e.g. "1.29" or "latest"
    #[serde(default = "default_version")]
    pub version: String,

    /// Let the platform manage node pools entirely
    #[serde(default)]
    pub autopilot: bool,

    /// Regional cluster (implied by autopilot)
    #[serde(default)]
    pub regional: bool,

    /// Additional zones for regional node spread
    #[serde(default)]
    pub locations: Vec<String>,

    /// Release channel enrollment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_channel: Option<ReleaseChannel>,

    #[serde(default = "default_true")]
    pub release_channel_enrollment: bool,

    /// Reuse the executing host's network and subnetwork
    #[serde(default = "default_true")]
    pub inherit_network: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnetwork: Option<String>,

    /// VPC-native IP allocation (implied by autopilot)
    #[serde(default)]
    pub vpc_native: bool,

    /// Pod range: a CIDR literal or the name of a secondary range
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_ip_range: Option<String>,

    /// Service range: a CIDR literal or the name of a secondary range
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub svc_ip_range: Option<String>,

    /// Cloud resource labels, also merged into every node pool
    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    #[serde(default)]
    pub http_load_balancing: bool,

    /// Legacy ABAC authorization (zonal standard clusters only)
    #[serde(default)]
    pub legacy_auth: bool,

    /// Node count of the default pool when no pools are declared
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_count: Option<i32>,

    /// Raw JSON merged over the generated request as the last step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings_valve: Option<String>,
}

/// Per-pool settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodePoolSettings {
    /// Pool name (defaults to node-pool-<ordinal>)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default = "default_node_count")]
    pub node_count: i32,

    /// GCE machine type, e.g. "e2-standard-4"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_size_gb: Option<i32>,

    /// Grant read access to the container registry
    #[serde(default)]
    pub use_gcr_io: bool,

    /// Extra OAuth scopes: a list, or one comma-delimited string
    #[serde(default, deserialize_with = "string_or_seq")]
    pub oauth_scopes: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_type: Option<ServiceAccountType>,

    /// Account name when service_account_type is "custom"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account: Option<String>,

    #[serde(default)]
    pub autoscaling: AutoscalingSettings,

    #[serde(default)]
    pub gpu: GpuSettings,

    /// Run nodes on spot VMs
    #[serde(default)]
    pub spot: bool,

    /// Kubernetes labels applied to nodes
    #[serde(default)]
    pub node_labels: BTreeMap<String, String>,

    #[serde(default)]
    pub taints: Vec<NodeTaint>,

    /// Cloud resource labels (merged over the cluster labels)
    #[serde(default)]
    pub resource_labels: BTreeMap<String, String>,

    #[serde(default)]
    pub network_tags: Vec<String>,

    /// Raw JSON merged over the generated pool body as the last step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings_valve: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutoscalingSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_node_count: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_node_count: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpuSettings {
    #[serde(default)]
    pub enabled: bool,
    /// Accelerator type, e.g. "nvidia-tesla-t4"
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub gpu_type: Option<String>,
    #[serde(default = "default_gpu_count")]
    pub count: i64,
}

impl Default for GpuSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            gpu_type: None,
            count: default_gpu_count(),
        }
    }
}

fn default_version() -> String {
    "latest".to_string()
}

fn default_true() -> bool {
    true
}

fn default_node_count() -> i32 {
    3
}

fn default_gpu_count() -> i64 {
    1
}

/// Accept scopes as either a YAML list or one comma-delimited string.
fn string_or_seq<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrSeq {
        One(String),
        Many(Vec<String>),
    }

    Ok(match StringOrSeq::deserialize(deserializer)? {
        StringOrSeq::One(joined) => joined
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        StringOrSeq::Many(scopes) => scopes,
    })
}

impl ProvisionConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ProvisionConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.cluster.autopilot && !self.node_pools.is_empty() {
            anyhow::bail!("autopilot clusters do not accept node pools");
        }

        if self.cluster.autopilot {
            if let Some(channel @ (ReleaseChannel::Extended | ReleaseChannel::NoChannel)) =
                self.cluster.release_channel
            {
                anyhow::bail!(
                    "autopilot clusters only support the RAPID, REGULAR and STABLE release channels, got {:?}",
                    channel
                );
            }
        }

        for key in self.cluster.labels.keys() {
            if key.trim().is_empty() {
                anyhow::bail!("cluster label with a blank key");
            }
        }

        for (index, pool) in self.node_pools.iter().enumerate() {
            if pool.node_count < 0 {
                anyhow::bail!("node pool {} has a negative node count", index);
            }
            if pool.gpu.enabled && is_blank(pool.gpu.gpu_type.as_deref()) {
                anyhow::bail!("node pool {} enables GPUs without an accelerator type", index);
            }
            for key in pool.node_labels.keys().chain(pool.resource_labels.keys()) {
                if key.trim().is_empty() {
                    anyhow::bail!("node pool {} has a label with a blank key", index);
                }
            }
        }

        Ok(())
    }

    /// Generate an example configuration file
    pub fn example() -> Self {
        Self {
            project: None,
            zone: Some("europe-west1-b".to_string()),
            region: None,
            cluster: ClusterSettings {
                name: Some("granite-cluster".to_string()),
                version: default_version(),
                autopilot: false,
                regional: false,
                locations: vec![],
                release_channel: Some(ReleaseChannel::Regular),
                release_channel_enrollment: true,
                inherit_network: true,
                network: None,
                subnetwork: None,
                vpc_native: true,
                pod_ip_range: Some("10.4.0.0/14".to_string()),
                svc_ip_range: Some("10.8.0.0/20".to_string()),
                labels: BTreeMap::new(),
                http_load_balancing: false,
                legacy_auth: false,
                node_count: None,
                settings_valve: None,
            },
            node_pools: vec![NodePoolSettings {
                name: None,
                node_count: 3,
                machine_type: Some("e2-standard-4".to_string()),
                disk_type: Some("pd-standard".to_string()),
                disk_size_gb: Some(100),
                use_gcr_io: true,
                oauth_scopes: vec![],
                service_account_type: None,
                service_account: None,
                autoscaling: AutoscalingSettings::default(),
                gpu: GpuSettings::default(),
                spot: false,
                node_labels: BTreeMap::new(),
                taints: vec![],
                resource_labels: BTreeMap::new(),
                network_tags: vec![],
                settings_valve: None,
            }],
        }
    }
}
