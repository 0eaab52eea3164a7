/// GKE control-plane data models
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Cluster portion of a create-cluster request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_cluster_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_node_count: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnetwork: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub resource_labels: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_allocation_policy: Option<IpAllocationPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legacy_abac: Option<LegacyAbac>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub master_auth: Option<MasterAuthSpec>,
    pub addons_config: AddonsConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autopilot: Option<Autopilot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_channel: Option<ReleaseChannelSpec>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub node_pools: Vec<Value>,
}

/// VPC-native IP allocation. Each range is either a CIDR literal (the
/// `*Ipv4CidrBlock` fields) or the name of an existing secondary range.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IpAllocationPolicy {
    pub use_ip_aliases: bool,
    pub create_subnetwork: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_ipv4_cidr_block: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub services_ipv4_cidr_block: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_secondary_range_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub services_secondary_range_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyAbac {
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterAuthSpec {
    pub client_certificate_config: ClientCertificateConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientCertificateConfig {
    pub issue_client_certificate: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddonsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_load_balancing: Option<HttpLoadBalancing>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpLoadBalancing {
    pub disabled: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Autopilot {
    pub enabled: bool,
}

/// Release channel a cluster is enrolled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReleaseChannel {
    Rapid,
    Regular,
    Stable,
    Extended,
    NoChannel,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseChannelSpec {
    pub channel: ReleaseChannel,
}

/// Node-pool portion of a create request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePoolSpec {
    pub name: String,
    pub initial_node_count: i32,
    pub config: NodeConfigSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autoscaling: Option<NodePoolAutoscaling>,
    pub management: NodeManagement,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeConfigSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub machine_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_size_gb: Option<i32>,
    pub oauth_scopes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accelerators: Option<Vec<AcceleratorConfig>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spot: Option<bool>,
    pub labels: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub resource_labels: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taints: Option<Vec<NodeTaint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceleratorConfig {
    pub accelerator_count: i64,
    pub accelerator_type: String,
}

/// Kubernetes node taint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTaint {
    pub key: String,
    #[serde(default)]
    pub value: String,
    pub effect: TaintEffect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaintEffect {
    NoSchedule,
    PreferNoSchedule,
    NoExecute,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePoolAutoscaling {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub min_node_count: i32,
    #[serde(default)]
    pub max_node_count: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeManagement {
    pub auto_upgrade: bool,
    pub auto_repair: bool,
}

/// Cluster resource as reported by the control plane.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterResource {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub current_master_version: Option<String>,
    #[serde(default)]
    pub current_node_count: Option<i32>,
    #[serde(default)]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub master_auth: Option<MasterAuth>,
    #[serde(default)]
    pub legacy_abac: Option<LegacyAbac>,
    #[serde(default)]
    pub node_pools: Vec<NodePoolResource>,
}

/// Master auth material returned on a cluster fetch. Certificate fields are
/// base64-encoded PEM, passed through verbatim into kubeconfig.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterAuth {
    #[serde(default)]
    pub cluster_ca_certificate: Option<String>,
    #[serde(default)]
    pub client_certificate: Option<String>,
    #[serde(default)]
    pub client_key: Option<String>,
}

/// Node-pool resource as reported by the control plane.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePoolResource {
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub initial_node_count: Option<i32>,
    #[serde(default)]
    pub config: Option<NodeConfigResource>,
    #[serde(default)]
    pub autoscaling: Option<NodePoolAutoscaling>,
    #[serde(default)]
    pub instance_group_urls: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeConfigResource {
    #[serde(default)]
    pub machine_type: Option<String>,
    #[serde(default)]
    pub disk_type: Option<String>,
    #[serde(default)]
    pub disk_size_gb: Option<i32>,
    #[serde(default)]
    pub spot: Option<bool>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

/// Long-running operation resource.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResource {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub operation_type: Option<String>,
    #[serde(default)]
    pub status: OperationStatus,
    #[serde(default)]
    pub status_message: Option<String>,
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub target_link: Option<String>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub error: Option<OperationError>,
}

/// Operation status reported by the control plane. Terminal iff `Done`.
/// Unknown wire values degrade to `Unspecified` instead of failing a fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum OperationStatus {
    Pending,
    Running,
    Done,
    Aborting,
    #[default]
    Unspecified,
}

impl From<String> for OperationStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "PENDING" => OperationStatus::Pending,
            "RUNNING" => OperationStatus::Running,
            "DONE" => OperationStatus::Done,
            "ABORTING" => OperationStatus::Aborting,
            _ => OperationStatus::Unspecified,
        }
    }
}

impl OperationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OperationStatus::Done)
    }
}

impl std::fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OperationStatus::Pending => "PENDING",
            OperationStatus::Running => "RUNNING",
            OperationStatus::Done => "DONE",
            OperationStatus::Aborting => "ABORTING",
            OperationStatus::Unspecified => "STATUS_UNSPECIFIED",
        };
        write!(f, "{}", s)
    }
}

/// Error payload carried by a failed operation (google.rpc.Status).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationError {
    #[serde(default)]
    pub code: Option<i32>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Error body returned by the control plane on a rejected request.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub code: Option<i32>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_status_parses_wire_values() {
        let status: OperationStatus = serde_json::from_str("\"RUNNING\"").unwrap();
        assert_eq!(status, OperationStatus::Running);
        let status: OperationStatus = serde_json::from_str("\"DONE\"").unwrap();
        assert!(status.is_terminal());
        // Unknown values degrade to Unspecified instead of failing the fetch.
        let status: OperationStatus = serde_json::from_str("\"SOMETHING_NEW\"").unwrap();
        assert_eq!(status, OperationStatus::Unspecified);
        assert!(!status.is_terminal());
    }

    #[test]
    fn test_cluster_spec_omits_unset_fields() {
        let spec = ClusterSpec {
            name: "test".to_string(),
            description: None,
            initial_cluster_version: Some("latest".to_string()),
            initial_node_count: None,
            network: None,
            subnetwork: None,
            resource_labels: BTreeMap::new(),
            locations: Vec::new(),
            ip_allocation_policy: None,
            legacy_abac: None,
            master_auth: None,
            addons_config: AddonsConfig::default(),
            autopilot: None,
            release_channel: None,
            node_pools: Vec::new(),
        };
        let value = serde_json::to_value(&spec).unwrap();
        let obj = value.as_object().unwrap();
        assert!(obj.contains_key("initialClusterVersion"));
        assert!(!obj.contains_key("network"));
        assert!(!obj.contains_key("resourceLabels"));
        assert!(!obj.contains_key("nodePools"));
        assert!(!obj.contains_key("autopilot"));
    }

    #[test]
    fn test_operation_resource_parses_error_payload() {
        let raw = r#"{
            "name": "operation-123",
            "operationType": "CREATE_CLUSTER",
            "status": "DONE",
            "error": {"code": 9, "message": "insufficient quota"}
        }"#;
        let op: OperationResource = serde_json::from_str(raw).unwrap();
        assert_eq!(op.name, "operation-123");
        assert!(op.status.is_terminal());
        assert_eq!(op.error.unwrap().message.as_deref(), Some("insufficient quota"));
    }

    #[test]
    fn test_release_channel_wire_names() {
        assert_eq!(
            serde_json::to_string(&ReleaseChannel::NoChannel).unwrap(),
            "\"NO_CHANNEL\""
        );
        assert_eq!(
            serde_json::to_string(&ReleaseChannelSpec { channel: ReleaseChannel::Stable }).unwrap(),
            r#"{"channel":"STABLE"}"#
        );
    }

    #[test]
    fn test_taint_effect_wire_names() {
        let taint = NodeTaint {
            key: "dedicated".to_string(),
            value: "gpu".to_string(),
            effect: TaintEffect::NoSchedule,
        };
        let value = serde_json::to_value(&taint).unwrap();
        assert_eq!(value["effect"], "NO_SCHEDULE");
    }
}
