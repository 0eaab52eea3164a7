/// Location resolution and the two GKE addressing dialects
///
/// Zonal resources are addressed with flat project/zone/id parameters,
/// regional resources with a single composed `name` path. All dialect
/// knowledge lives here; builders, the poller, and the orchestrator consume
/// `LocationParams` without ever special-casing one dialect.
use tracing::info;

use crate::error::{Error, Result};
use crate::gcloud::EnvironmentSource;
use crate::utils::default_if_blank;

/// Which addressing dialect a cluster lives under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Addressing {
    Zonal,
    Regional,
}

impl std::fmt::Display for Addressing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Addressing::Zonal => write!(f, "zonal"),
            Addressing::Regional => write!(f, "regional"),
        }
    }
}

/// Fully resolved project/zone/region triple plus the addressing mode.
#[derive(Debug, Clone)]
pub struct LocationDescriptor {
    pub project_id: String,
    pub zone: Option<String>,
    pub region: Option<String>,
    pub addressing: Addressing,
}

impl LocationDescriptor {
    /// Resolve explicit inputs against environment defaults.
    ///
    /// Explicit values win; project and zone fall back to the environment;
    /// region falls back to the environment and then derives from the zone.
    /// Autopilot forces regional addressing.
    pub async fn resolve(
        project: Option<&str>,
        zone: Option<&str>,
        region: Option<&str>,
        is_regional: bool,
        is_autopilot: bool,
        env: &dyn EnvironmentSource,
    ) -> Result<Self> {
        let defaults = env.discover().await?;

        let project_id = default_if_blank(project)
            .or(defaults.project)
            .ok_or_else(|| {
                Error::Configuration(
                    "project could not be resolved: not set explicitly and no default found"
                        .to_string(),
                )
            })?;

        let zone = default_if_blank(zone).or(defaults.zone);
        let region = default_if_blank(region)
            .or(defaults.region)
            .or_else(|| zone.as_deref().and_then(region_from_zone));

        let addressing = if is_autopilot || is_regional {
            Addressing::Regional
        } else {
            Addressing::Zonal
        };

        match addressing {
            Addressing::Zonal if zone.is_none() => {
                return Err(Error::Configuration(
                    "zone could not be resolved: not set explicitly and no default found"
                        .to_string(),
                ));
            }
            Addressing::Regional if region.is_none() => {
                return Err(Error::Configuration(
                    "region could not be resolved: not set, no default, and no zone to derive from"
                        .to_string(),
                ));
            }
            _ => {}
        }

        let descriptor = Self {
            project_id,
            zone,
            region,
            addressing,
        };
        info!(
            "Resolved location: project={} location={} ({})",
            descriptor.project_id,
            descriptor.location(),
            descriptor.addressing
        );
        Ok(descriptor)
    }

    /// The zone or region this descriptor addresses, per its dialect.
    pub fn location(&self) -> &str {
        match self.addressing {
            Addressing::Zonal => self.zone.as_deref().unwrap_or_default(),
            Addressing::Regional => self.region.as_deref().unwrap_or_default(),
        }
    }

    fn composed(&self, suffix: &str) -> String {
        let mut name = format!(
            "projects/{}/locations/{}",
            self.project_id,
            self.location()
        );
        if !suffix.is_empty() {
            name.push('/');
            name.push_str(suffix);
        }
        name
    }

    fn zonal(
        &self,
        cluster_id: Option<&str>,
        node_pool_id: Option<&str>,
        operation_id: Option<&str>,
    ) -> LocationParams {
        LocationParams::Zonal {
            project_id: self.project_id.clone(),
            zone: self.zone.clone().unwrap_or_default(),
            cluster_id: cluster_id.map(str::to_string),
            node_pool_id: node_pool_id.map(str::to_string),
            operation_id: operation_id.map(str::to_string),
        }
    }

    /// Parameters addressing the parent location (create/list calls).
    pub fn parent(&self) -> LocationParams {
        match self.addressing {
            Addressing::Zonal => self.zonal(None, None, None),
            Addressing::Regional => LocationParams::Regional {
                name: self.composed(""),
            },
        }
    }

    /// Parameters addressing one cluster.
    pub fn cluster(&self, cluster_id: &str) -> LocationParams {
        match self.addressing {
            Addressing::Zonal => self.zonal(Some(cluster_id), None, None),
            Addressing::Regional => LocationParams::Regional {
                name: self.composed(&format!("clusters/{}", cluster_id)),
            },
        }
    }

    /// Parameters addressing one node pool.
    pub fn node_pool(&self, cluster_id: &str, node_pool_id: &str) -> LocationParams {
        match self.addressing {
            Addressing::Zonal => self.zonal(Some(cluster_id), Some(node_pool_id), None),
            Addressing::Regional => LocationParams::Regional {
                name: self.composed(&format!("clusters/{}/nodePools/{}", cluster_id, node_pool_id)),
            },
        }
    }

    /// Parameters addressing one operation.
    pub fn operation(&self, operation_id: &str) -> LocationParams {
        match self.addressing {
            Addressing::Zonal => self.zonal(None, None, Some(operation_id)),
            Addressing::Regional => LocationParams::Regional {
                name: self.composed(&format!("operations/{}", operation_id)),
            },
        }
    }
}

/// Derive a region from a zone by dropping the trailing suffix component
/// ("europe-west1-b" -> "europe-west1").
fn region_from_zone(zone: &str) -> Option<String> {
    zone.rsplit_once('-').map(|(region, _)| region.to_string())
}

/// Request-shaped location parameters, one variant per dialect.
///
/// The two shapes are mutually exclusive: zonal parameters never carry a
/// composed `name`, regional parameters never carry separate fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationParams {
    Zonal {
        project_id: String,
        zone: String,
        cluster_id: Option<String>,
        node_pool_id: Option<String>,
        operation_id: Option<String>,
    },
    Regional {
        name: String,
    },
}

impl LocationParams {
    /// REST path of the addressed resource, relative to the API root.
    pub fn resource_path(&self) -> String {
        match self {
            LocationParams::Zonal {
                project_id,
                zone,
                cluster_id,
                node_pool_id,
                operation_id,
            } => {
                let mut path = format!("projects/{}/zones/{}", project_id, zone);
                if let Some(cluster) = cluster_id {
                    path.push_str(&format!("/clusters/{}", cluster));
                }
                if let Some(pool) = node_pool_id {
                    path.push_str(&format!("/nodePools/{}", pool));
                }
                if let Some(operation) = operation_id {
                    path.push_str(&format!("/operations/{}", operation));
                }
                path
            }
            LocationParams::Regional { name } => name.clone(),
        }
    }

    /// Path of a child collection under the addressed resource.
    pub fn collection_path(&self, collection: &str) -> String {
        format!("{}/{}", self.resource_path(), collection)
    }

    /// Path of a custom action on the addressed resource. The zonal surface
    /// nests actions as path segments, the regional surface uses the
    /// `resource:action` form.
    pub fn action_path(&self, action: &str) -> String {
        match self {
            LocationParams::Zonal { .. } => format!("{}/{}", self.resource_path(), action),
            LocationParams::Regional { name } => format!("{}:{}", name, action),
        }
    }

    /// Composed parent path to embed in create bodies, regional dialect only.
    pub fn parent_field(&self) -> Option<String> {
        match self {
            LocationParams::Zonal { .. } => None,
            LocationParams::Regional { name } => Some(name.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gcloud::{EnvironmentInfo, FakeEnvironment};

    fn fake_env(project: Option<&str>, zone: Option<&str>, region: Option<&str>) -> FakeEnvironment {
        FakeEnvironment {
            info: EnvironmentInfo {
                project: project.map(str::to_string),
                zone: zone.map(str::to_string),
                region: region.map(str::to_string),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn test_explicit_values_win_over_defaults() {
        let env = fake_env(Some("default-project"), Some("us-central1-a"), None);
        let location = LocationDescriptor::resolve(
            Some("my-project"),
            Some("europe-west1-b"),
            None,
            false,
            false,
            &env,
        )
        .await
        .unwrap();
        assert_eq!(location.project_id, "my-project");
        assert_eq!(location.zone.as_deref(), Some("europe-west1-b"));
        assert_eq!(location.addressing, Addressing::Zonal);
    }

    #[tokio::test]
    async fn test_region_derived_from_zone() {
        let env = fake_env(Some("p"), None, None);
        let location =
            LocationDescriptor::resolve(None, Some("europe-west1-b"), None, true, false, &env)
                .await
                .unwrap();
        assert_eq!(location.region.as_deref(), Some("europe-west1"));
        assert_eq!(location.addressing, Addressing::Regional);
        assert_eq!(location.location(), "europe-west1");
    }

    #[tokio::test]
    async fn test_unresolvable_project_is_configuration_error() {
        let env = fake_env(None, Some("us-east1-b"), None);
        let result = LocationDescriptor::resolve(None, None, None, false, false, &env).await;
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[tokio::test]
    async fn test_autopilot_forces_regional() {
        let env = fake_env(Some("p"), Some("us-east1-b"), None);
        let location = LocationDescriptor::resolve(None, None, None, false, true, &env)
            .await
            .unwrap();
        assert_eq!(location.addressing, Addressing::Regional);
    }

    #[tokio::test]
    async fn test_zonal_without_zone_is_configuration_error() {
        let env = fake_env(Some("p"), None, Some("europe-west1"));
        let result = LocationDescriptor::resolve(None, None, None, false, false, &env).await;
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    fn zonal_descriptor() -> LocationDescriptor {
        LocationDescriptor {
            project_id: "p".to_string(),
            zone: Some("us-east1-b".to_string()),
            region: Some("us-east1".to_string()),
            addressing: Addressing::Zonal,
        }
    }

    fn regional_descriptor() -> LocationDescriptor {
        LocationDescriptor {
            addressing: Addressing::Regional,
            ..zonal_descriptor()
        }
    }

    #[test]
    fn test_zonal_params_never_compose_a_name() {
        let params = zonal_descriptor().cluster("c1");
        match &params {
            LocationParams::Zonal {
                project_id,
                zone,
                cluster_id,
                ..
            } => {
                assert_eq!(project_id, "p");
                assert_eq!(zone, "us-east1-b");
                assert_eq!(cluster_id.as_deref(), Some("c1"));
            }
            LocationParams::Regional { .. } => panic!("zonal descriptor produced regional params"),
        }
        assert!(params.parent_field().is_none());
        assert_eq!(params.resource_path(), "projects/p/zones/us-east1-b/clusters/c1");
    }

    #[test]
    fn test_regional_params_never_carry_separate_fields() {
        let params = regional_descriptor().cluster("c1");
        match &params {
            LocationParams::Regional { name } => {
                assert_eq!(name, "projects/p/locations/us-east1/clusters/c1");
            }
            LocationParams::Zonal { .. } => panic!("regional descriptor produced zonal params"),
        }
        assert_eq!(
            params.parent_field().as_deref(),
            Some("projects/p/locations/us-east1/clusters/c1")
        );
    }

    #[test]
    fn test_operation_paths_per_dialect() {
        assert_eq!(
            zonal_descriptor().operation("op-1").resource_path(),
            "projects/p/zones/us-east1-b/operations/op-1"
        );
        assert_eq!(
            regional_descriptor().operation("op-1").resource_path(),
            "projects/p/locations/us-east1/operations/op-1"
        );
    }

    #[test]
    fn test_action_path_dialects() {
        let zonal = zonal_descriptor().node_pool("c1", "np1");
        assert_eq!(
            zonal.action_path("setSize"),
            "projects/p/zones/us-east1-b/clusters/c1/nodePools/np1/setSize"
        );
        let regional = regional_descriptor().node_pool("c1", "np1");
        assert_eq!(
            regional.action_path("setSize"),
            "projects/p/locations/us-east1/clusters/c1/nodePools/np1:setSize"
        );
    }

    #[test]
    fn test_collection_path_for_create() {
        assert_eq!(
            zonal_descriptor().parent().collection_path("clusters"),
            "projects/p/zones/us-east1-b/clusters"
        );
        assert_eq!(
            regional_descriptor().cluster("c1").collection_path("nodePools"),
            "projects/p/locations/us-east1/clusters/c1/nodePools"
        );
    }
}
