/// Cluster specification builder and handles
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use rand::Rng;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::gcloud::EnvironmentSource;
use crate::gke::api::ContainerApi;
use crate::gke::location::{Addressing, LocationDescriptor};
use crate::gke::models::{
    AddonsConfig, Autopilot, ClientCertificateConfig, ClusterResource, ClusterSpec,
    HttpLoadBalancing, IpAllocationPolicy, LegacyAbac, MasterAuthSpec, ReleaseChannel,
    ReleaseChannelSpec,
};
use crate::gke::node_pool::{NodePool, NodePoolBuilder};
use crate::gke::operations::Operation;
use crate::kubeconfig::KubeConfig;
use crate::utils::default_if_blank;
use crate::utils::merge::{apply_valve, parse_settings_valve};

const AUTO_NAME_PREFIX: &str = "gke-cluster-";
const AUTO_NAME_SUFFIX_LEN: usize = 8;

/// Entry point to the cluster surface of one resolved location.
pub struct Clusters {
    api: Arc<dyn ContainerApi>,
    location: LocationDescriptor,
}

impl Clusters {
    pub fn new(api: Arc<dyn ContainerApi>, location: LocationDescriptor) -> Self {
        Self { api, location }
    }

    pub fn location(&self) -> &LocationDescriptor {
        &self.location
    }

    /// Builder for a new cluster in this location.
    pub fn builder(&self) -> ClusterBuilder {
        ClusterBuilder::new(self.api.clone(), self.location.clone())
    }

    /// Handle on an existing (or in-flight) cluster.
    pub fn cluster(&self, name: &str) -> Cluster {
        Cluster {
            api: self.api.clone(),
            location: self.location.clone(),
            name: name.to_string(),
        }
    }
}

/// Accumulates cluster options into a create request and submits it.
///
/// Owns the autopilot/standard branching; the zonal/regional split is
/// resolved earlier, in the `LocationDescriptor`.
pub struct ClusterBuilder {
    api: Arc<dyn ContainerApi>,
    location: LocationDescriptor,
    name: Option<String>,
    version: Option<String>,
    node_count: Option<i32>,
    network: Option<String>,
    subnetwork: Option<String>,
    labels: BTreeMap<String, String>,
    vpc_native: bool,
    pod_ip_range: Option<String>,
    svc_ip_range: Option<String>,
    legacy_auth: bool,
    http_load_balancing: bool,
    autopilot: bool,
    release_channel: Option<ReleaseChannel>,
    release_channel_enrollment: bool,
    locations: Vec<String>,
    node_pools: Vec<Value>,
    settings_valve: Option<String>,
}

impl ClusterBuilder {
    fn new(api: Arc<dyn ContainerApi>, location: LocationDescriptor) -> Self {
        Self {
            api,
            location,
            name: None,
            version: None,
            node_count: None,
            network: None,
            subnetwork: None,
            labels: BTreeMap::new(),
            vpc_native: false,
            pod_ip_range: None,
            svc_ip_range: None,
            legacy_auth: false,
            http_load_balancing: false,
            autopilot: false,
            release_channel: None,
            release_channel_enrollment: true,
            locations: Vec::new(),
            node_pools: Vec::new(),
            settings_valve: None,
        }
    }

    pub fn with_name(mut self, name: Option<&str>) -> Self {
        self.name = default_if_blank(name);
        self
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.version = default_if_blank(Some(version));
        self
    }

    pub fn with_autopilot(mut self, autopilot: bool) -> Self {
        self.autopilot = autopilot;
        self
    }

    pub fn with_release_channel(mut self, channel: Option<ReleaseChannel>) -> Self {
        self.release_channel = channel;
        self
    }

    pub fn with_release_channel_enrollment(mut self, enrolled: bool) -> Self {
        self.release_channel_enrollment = enrolled;
        self
    }

    /// Node count of the default pool, used only when no explicit pools are
    /// added.
    pub fn with_initial_node_count(mut self, node_count: i32) -> Self {
        self.node_count = Some(node_count);
        self
    }

    /// Select the cluster network: inherited from the executing host, or
    /// explicit values (blank treated as absent).
    pub async fn with_network(
        mut self,
        inherit_from_host: bool,
        network: Option<&str>,
        subnetwork: Option<&str>,
        env: &dyn EnvironmentSource,
    ) -> Result<Self> {
        if inherit_from_host {
            info!("Cluster network/subnetwork inherited from the host");
            let host = env.discover().await?;
            self.network = host.network;
            self.subnetwork = host.subnetwork;
        } else {
            info!("Cluster network/subnetwork set explicitly");
            self.network = default_if_blank(network);
            self.subnetwork = default_if_blank(subnetwork);
        }
        info!(
            "Cluster network is {:?}, subnetwork is {:?}",
            self.network, self.subnetwork
        );
        Ok(self)
    }

    pub fn with_labels(mut self, labels: &BTreeMap<String, String>) -> Result<Self> {
        for key in labels.keys() {
            if key.trim().is_empty() {
                return Err(Error::Validation(
                    "cluster resource label with a blank key".to_string(),
                ));
            }
        }
        self.labels.extend(labels.clone());
        if !self.labels.is_empty() {
            info!("Adding resource labels {:?}", self.labels);
        }
        Ok(self)
    }

    /// Current cluster-level labels, merged into each pool's resource labels.
    pub fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }

    /// VPC-native IP allocation. Each range is either a CIDR literal or the
    /// name of an existing secondary range.
    pub fn with_vpc_native(
        mut self,
        vpc_native: bool,
        pod_ip_range: Option<&str>,
        svc_ip_range: Option<&str>,
    ) -> Self {
        if vpc_native {
            self.vpc_native = true;
            self.pod_ip_range = default_if_blank(pod_ip_range);
            self.svc_ip_range = default_if_blank(svc_ip_range);
        }
        self
    }

    pub fn with_legacy_auth(mut self, legacy_auth: bool) -> Self {
        self.legacy_auth = legacy_auth;
        self
    }

    pub fn with_http_load_balancing(mut self, http_load_balancing: bool) -> Self {
        self.http_load_balancing = http_load_balancing;
        self
    }

    /// Additional zones the cluster's nodes spread over (regional clusters).
    pub fn with_locations(mut self, locations: &[String]) -> Self {
        self.locations = locations
            .iter()
            .filter(|l| !l.trim().is_empty())
            .cloned()
            .collect();
        self
    }

    /// Builder for the next node pool, pre-named by ordinal.
    pub fn node_pool_builder(&self) -> NodePoolBuilder {
        NodePoolBuilder::new().with_name(format!("node-pool-{}", self.node_pools.len()))
    }

    /// Append a built node-pool body to the creation request.
    pub fn add_node_pool(mut self, node_pool: Value) -> Self {
        self.node_pools.push(node_pool);
        self
    }

    pub fn with_settings_valve(mut self, valve: Option<&str>) -> Self {
        self.settings_valve = default_if_blank(valve);
        self
    }

    /// Assemble the full create-cluster body, valve applied last.
    pub fn request_body(&self) -> Result<Value> {
        if self.autopilot && !self.node_pools.is_empty() {
            return Err(Error::Validation(
                "autopilot clusters do not accept explicit node pools".to_string(),
            ));
        }
        if self.autopilot && self.location.addressing == Addressing::Zonal {
            return Err(Error::Validation(
                "autopilot clusters require regional addressing".to_string(),
            ));
        }

        let name = self.name.clone().unwrap_or_else(auto_name);

        let ip_allocation_policy = if self.vpc_native {
            Some(self.ip_allocation_policy()?)
        } else {
            None
        };

        let master_auth = if self.autopilot {
            // client certificates are managed by the platform
            None
        } else {
            let version = self.version.as_deref().unwrap_or("latest");
            issues_client_certificate(version)?.then(|| MasterAuthSpec {
                client_certificate_config: ClientCertificateConfig {
                    issue_client_certificate: true,
                },
            })
        };

        let legacy_abac = if self.legacy_auth {
            if !self.autopilot && self.location.addressing == Addressing::Zonal {
                Some(LegacyAbac { enabled: true })
            } else {
                warn!("Legacy authorization is only available on zonal standard clusters, ignoring");
                None
            }
        } else {
            None
        };

        let release_channel = if self.autopilot {
            Some(ReleaseChannelSpec {
                channel: self.release_channel.unwrap_or(ReleaseChannel::Stable),
            })
        } else if self.release_channel_enrollment {
            self.release_channel
                .filter(|channel| *channel != ReleaseChannel::NoChannel)
                .map(|channel| ReleaseChannelSpec { channel })
        } else {
            None
        };

        let spec = ClusterSpec {
            name,
            description: Some("Provisioned by granite".to_string()),
            initial_cluster_version: if self.autopilot {
                None
            } else {
                self.version.clone()
            },
            initial_node_count: (!self.autopilot && self.node_pools.is_empty())
                .then_some(self.node_count)
                .flatten(),
            network: self.network.clone(),
            subnetwork: self.subnetwork.clone(),
            resource_labels: self.labels.clone(),
            locations: self.locations.clone(),
            ip_allocation_policy,
            legacy_abac,
            master_auth,
            addons_config: AddonsConfig {
                http_load_balancing: Some(HttpLoadBalancing {
                    // autopilot always runs the add-on
                    disabled: !(self.http_load_balancing || self.autopilot),
                }),
            },
            autopilot: self.autopilot.then_some(Autopilot { enabled: true }),
            release_channel,
            node_pools: self.node_pools.clone(),
        };

        let body = serde_json::to_value(&spec)
            .map_err(|e| Error::Validation(format!("unserializable cluster spec: {}", e)))?;
        let valve = parse_settings_valve(self.settings_valve.as_deref())?;
        Ok(apply_valve(body, valve.as_ref()))
    }

    fn ip_allocation_policy(&self) -> Result<IpAllocationPolicy> {
        let pod_range = self.pod_ip_range.as_deref();
        let svc_range = self.svc_ip_range.as_deref();

        if let (Some(pod), Some(svc)) = (pod_range, svc_range) {
            if is_cidr_literal(pod) && is_cidr_literal(svc) && pod == svc {
                return Err(Error::Validation(format!(
                    "pod and service IP ranges must differ, both are {}",
                    pod
                )));
            }
        }

        let mut policy = IpAllocationPolicy {
            use_ip_aliases: true,
            create_subnetwork: false,
            ..Default::default()
        };
        match pod_range {
            Some(range) if is_cidr_literal(range) => {
                policy.cluster_ipv4_cidr_block = Some(range.to_string());
            }
            Some(range) => {
                policy.cluster_secondary_range_name = Some(range.to_string());
            }
            None => {}
        }
        match svc_range {
            Some(range) if is_cidr_literal(range) => {
                policy.services_ipv4_cidr_block = Some(range.to_string());
            }
            Some(range) => {
                policy.services_secondary_range_name = Some(range.to_string());
            }
            None => {}
        }
        Ok(policy)
    }

    /// Submit the create request, returning the resulting operation.
    pub async fn create(&self) -> Result<Operation> {
        let body = self.request_body()?;
        if let Some(name) = body.get("name").and_then(Value::as_str) {
            info!("Requesting cluster {}", name);
        }
        debug!(
            "Create cluster request: {}",
            serde_json::to_string_pretty(&body).unwrap_or_default()
        );

        let parent = self.location.parent();
        let response = self.api.create_cluster(&parent, body).await?;
        Ok(Operation::new(
            self.api.clone(),
            self.location.clone(),
            response,
        ))
    }
}

/// Generate a cluster name: fixed prefix plus a random lowercase
/// alphanumeric suffix.
pub fn auto_name() -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..AUTO_NAME_SUFFIX_LEN)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect();
    format!("{}{}", AUTO_NAME_PREFIX, suffix)
}

/// Whether the control plane issues client certificates for this version.
/// Versions 1.12 and above (and the floating "latest"/"-" selectors) accept
/// the issuance request; older versions reject it.
fn issues_client_certificate(version: &str) -> Result<bool> {
    if version == "latest" || version == "-" {
        return Ok(true);
    }
    let mut chunks = version.split('.');
    let major: u32 = chunks
        .next()
        .unwrap_or_default()
        .parse()
        .map_err(|_| Error::Validation(format!("unparsable cluster version: {}", version)))?;
    let minor: u32 = chunks
        .next()
        .unwrap_or("0")
        .parse()
        .map_err(|_| Error::Validation(format!("unparsable cluster version: {}", version)))?;
    Ok(major > 1 || (major == 1 && minor >= 12))
}

/// True for a strict `a.b.c.d/len` literal or a bare `/len`; anything else
/// is treated as the name of a secondary range.
fn is_cidr_literal(range: &str) -> bool {
    let Some((addr, prefix)) = range.split_once('/') else {
        return false;
    };
    let prefix_ok = !prefix.is_empty()
        && prefix.chars().all(|c| c.is_ascii_digit())
        && prefix.parse::<u8>().map(|p| p <= 32).unwrap_or(false);
    if !prefix_ok {
        return false;
    }
    addr.is_empty() || addr.parse::<std::net::Ipv4Addr>().is_ok()
}

/// Handle on one cluster.
pub struct Cluster {
    api: Arc<dyn ContainerApi>,
    location: LocationDescriptor,
    pub name: String,
}

impl Cluster {
    /// Fetch the cluster's current state.
    pub async fn get_info(&self) -> Result<ClusterResource> {
        let params = self.location.cluster(&self.name);
        self.api.get_cluster(&params).await
    }

    /// Delete the cluster, returning the operation to wait on.
    pub async fn delete(&self) -> Result<Operation> {
        info!("Requesting deletion of cluster {}", self.name);
        let params = self.location.cluster(&self.name);
        let response = self.api.delete_cluster(&params).await?;
        Ok(Operation::new(
            self.api.clone(),
            self.location.clone(),
            response,
        ))
    }

    /// Handles on all current node pools.
    pub async fn node_pools(&self) -> Result<Vec<NodePool>> {
        let params = self.location.cluster(&self.name);
        let pools = self.api.list_node_pools(&params).await?;
        Ok(pools
            .into_iter()
            .map(|pool| {
                NodePool::new(
                    self.api.clone(),
                    self.location.clone(),
                    self.name.clone(),
                    pool.name,
                )
            })
            .collect())
    }

    /// Handle on one node pool by name.
    pub fn node_pool(&self, node_pool_id: &str) -> NodePool {
        NodePool::new(
            self.api.clone(),
            self.location.clone(),
            self.name.clone(),
            node_pool_id,
        )
    }

    /// Derive client-access configuration from the cluster's current state.
    pub async fn kube_config(&self, gcloud_sdk_root: Option<&Path>) -> Result<KubeConfig> {
        let info = self.get_info().await?;
        KubeConfig::from_cluster(&self.name, &info, gcloud_sdk_root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gcloud::{EnvironmentInfo, FakeEnvironment};
    use crate::gke::api::testing::FakeApi;
    use serde_json::json;

    fn zonal_location() -> LocationDescriptor {
        LocationDescriptor {
            project_id: "p".to_string(),
            zone: Some("us-east1-b".to_string()),
            region: Some("us-east1".to_string()),
            addressing: Addressing::Zonal,
        }
    }

    fn regional_location() -> LocationDescriptor {
        LocationDescriptor {
            addressing: Addressing::Regional,
            ..zonal_location()
        }
    }

    fn builder(location: LocationDescriptor) -> ClusterBuilder {
        Clusters::new(Arc::new(FakeApi::new()), location).builder()
    }

    #[test]
    fn test_version_gate_for_client_certificates() {
        for (version, expected) in [
            ("1.11", false),
            ("1.12", true),
            ("2.0", true),
            ("latest", true),
            ("-", true),
        ] {
            let body = builder(zonal_location())
                .with_name(Some("c"))
                .with_version(version)
                .request_body()
                .unwrap();
            assert_eq!(
                body.get("masterAuth").is_some(),
                expected,
                "version {} expected issuance={}",
                version,
                expected
            );
        }
    }

    #[test]
    fn test_unparsable_version_is_validation_error() {
        let result = builder(zonal_location())
            .with_version("stable-ish")
            .request_body();
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_cidr_literal_classification() {
        assert!(is_cidr_literal("10.0.0.0/20"));
        assert!(is_cidr_literal("/14"));
        assert!(!is_cidr_literal("pods-range"));
        assert!(!is_cidr_literal("10.0.0.0"));
        assert!(!is_cidr_literal("10.0.0.0/33"));
        assert!(!is_cidr_literal("not-an-ip/20"));
    }

    #[test]
    fn test_vpc_native_identical_literal_ranges_fail() {
        let result = builder(zonal_location())
            .with_vpc_native(true, Some("10.0.0.0/20"), Some("10.0.0.0/20"))
            .request_body();
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_vpc_native_ranges_classified_independently() {
        let body = builder(zonal_location())
            .with_vpc_native(true, Some("10.0.0.0/14"), Some("services-range"))
            .request_body()
            .unwrap();
        let policy = &body["ipAllocationPolicy"];
        assert_eq!(policy["useIpAliases"], true);
        assert_eq!(policy["createSubnetwork"], false);
        assert_eq!(policy["clusterIpv4CidrBlock"], "10.0.0.0/14");
        assert_eq!(policy["servicesSecondaryRangeName"], "services-range");
        assert!(policy.get("servicesIpv4CidrBlock").is_none());
        assert!(policy.get("clusterSecondaryRangeName").is_none());
    }

    #[test]
    fn test_vpc_native_absent_without_flag() {
        let body = builder(zonal_location())
            .with_vpc_native(false, Some("10.0.0.0/14"), None)
            .request_body()
            .unwrap();
        assert!(body.get("ipAllocationPolicy").is_none());
    }

    #[test]
    fn test_autopilot_request_shape() {
        let body = builder(regional_location())
            .with_name(Some("auto"))
            .with_autopilot(true)
            .request_body()
            .unwrap();
        assert_eq!(body["autopilot"], json!({"enabled": true}));
        assert_eq!(body["releaseChannel"], json!({"channel": "STABLE"}));
        assert_eq!(
            body["addonsConfig"]["httpLoadBalancing"],
            json!({"disabled": false})
        );
        assert!(body.get("nodePools").is_none());
        assert!(body.get("initialClusterVersion").is_none());
        assert!(body.get("masterAuth").is_none());
    }

    #[test]
    fn test_autopilot_rejects_explicit_node_pools() {
        let result = builder(regional_location())
            .with_autopilot(true)
            .add_node_pool(json!({"name": "np"}))
            .request_body();
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_autopilot_rejects_zonal_addressing() {
        let result = builder(zonal_location()).with_autopilot(true).request_body();
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_legacy_auth_only_on_zonal_standard() {
        let body = builder(zonal_location())
            .with_legacy_auth(true)
            .request_body()
            .unwrap();
        assert_eq!(body["legacyAbac"], json!({"enabled": true}));

        let body = builder(regional_location())
            .with_legacy_auth(true)
            .request_body()
            .unwrap();
        assert!(body.get("legacyAbac").is_none());
    }

    #[test]
    fn test_http_load_balancing_flag_on_standard() {
        let body = builder(zonal_location())
            .with_http_load_balancing(true)
            .request_body()
            .unwrap();
        assert_eq!(
            body["addonsConfig"]["httpLoadBalancing"],
            json!({"disabled": false})
        );

        let body = builder(zonal_location()).request_body().unwrap();
        assert_eq!(
            body["addonsConfig"]["httpLoadBalancing"],
            json!({"disabled": true})
        );
    }

    #[test]
    fn test_auto_generated_name() {
        let body = builder(zonal_location()).request_body().unwrap();
        let name = body["name"].as_str().unwrap();
        assert!(name.starts_with(AUTO_NAME_PREFIX));
        assert_eq!(name.len(), AUTO_NAME_PREFIX.len() + AUTO_NAME_SUFFIX_LEN);
        assert!(name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
    }

    #[test]
    fn test_blank_label_key_rejected() {
        let mut labels = BTreeMap::new();
        labels.insert("  ".to_string(), "v".to_string());
        let result = builder(zonal_location()).with_labels(&labels);
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_initial_node_count_only_without_pools() {
        let body = builder(zonal_location())
            .with_initial_node_count(4)
            .request_body()
            .unwrap();
        assert_eq!(body["initialNodeCount"], 4);

        let body = builder(zonal_location())
            .with_initial_node_count(4)
            .add_node_pool(json!({"name": "np"}))
            .request_body()
            .unwrap();
        assert!(body.get("initialNodeCount").is_none());
        assert_eq!(body["nodePools"][0]["name"], "np");
    }

    #[test]
    fn test_release_channel_emission_rules() {
        let body = builder(zonal_location())
            .with_release_channel(Some(ReleaseChannel::Regular))
            .request_body()
            .unwrap();
        assert_eq!(body["releaseChannel"], json!({"channel": "REGULAR"}));

        let body = builder(zonal_location())
            .with_release_channel(Some(ReleaseChannel::Regular))
            .with_release_channel_enrollment(false)
            .request_body()
            .unwrap();
        assert!(body.get("releaseChannel").is_none());

        let body = builder(zonal_location())
            .with_release_channel(Some(ReleaseChannel::NoChannel))
            .request_body()
            .unwrap();
        assert!(body.get("releaseChannel").is_none());
    }

    #[test]
    fn test_settings_valve_applies_last() {
        let body = builder(zonal_location())
            .with_version("1.20")
            .with_settings_valve(Some(
                r#"{"initialClusterVersion": "1.30", "loggingService": "none"}"#,
            ))
            .request_body()
            .unwrap();
        assert_eq!(body["initialClusterVersion"], "1.30");
        assert_eq!(body["loggingService"], "none");
        // builder output survives where the valve is silent
        assert_eq!(body["description"], "Provisioned by granite");
    }

    #[test]
    fn test_node_pool_builders_are_named_by_ordinal() {
        let b = builder(zonal_location());
        let first = b.node_pool_builder().build().unwrap();
        assert_eq!(first["name"], "node-pool-0");
        let b = b.add_node_pool(first);
        let second = b.node_pool_builder().build().unwrap();
        assert_eq!(second["name"], "node-pool-1");
    }

    #[tokio::test]
    async fn test_network_inherited_from_host() {
        let env = FakeEnvironment {
            info: EnvironmentInfo {
                network: Some("host-net".to_string()),
                subnetwork: Some("host-subnet".to_string()),
                ..Default::default()
            },
        };
        let body = builder(zonal_location())
            .with_network(true, Some("ignored"), None, &env)
            .await
            .unwrap()
            .request_body()
            .unwrap();
        assert_eq!(body["network"], "host-net");
        assert_eq!(body["subnetwork"], "host-subnet");
    }

    #[tokio::test]
    async fn test_explicit_network_blank_treated_as_absent() {
        let env = FakeEnvironment::default();
        let body = builder(zonal_location())
            .with_network(false, Some("  "), Some("custom-subnet"), &env)
            .await
            .unwrap()
            .request_body()
            .unwrap();
        assert!(body.get("network").is_none());
        assert_eq!(body["subnetwork"], "custom-subnet");
    }

    #[tokio::test]
    async fn test_create_submits_through_resolved_dialect() {
        let api = Arc::new(FakeApi::new());
        let clusters = Clusters::new(api.clone(), regional_location());
        let mut op = clusters
            .builder()
            .with_name(Some("c1"))
            .create()
            .await
            .unwrap();
        let log = api.call_log();
        assert_eq!(log[0], "create_cluster projects/p/locations/us-east1");
        // The returned operation polls under the same dialect.
        op.wait_done_with(std::time::Duration::from_millis(1), None)
            .await
            .unwrap();
        assert!(api.call_log()[1].starts_with("get_operation projects/p/locations/us-east1/operations/"));
    }

    #[tokio::test]
    async fn test_cluster_delete_uses_cluster_params() {
        let api = Arc::new(FakeApi::new());
        let clusters = Clusters::new(api.clone(), zonal_location());
        clusters.cluster("c1").delete().await.unwrap();
        assert_eq!(
            api.call_log()[0],
            "delete_cluster projects/p/zones/us-east1-b/clusters/c1"
        );
    }
}
