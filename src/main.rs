/// Granite - managed Kubernetes clusters on GKE
///
/// A Rust-based tool for provisioning GKE clusters and node pools from a
/// declarative configuration: builds the create requests, tracks the
/// long-running operations to completion, and derives a kubeconfig from the
/// resulting cluster.
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use granite::config::{NodePoolSettings, ProvisionConfig};
use granite::gcloud::{EnvironmentSource, GcloudEnvironment};
use granite::gke::cluster::auto_name;
use granite::gke::operations::DEFAULT_POLL_INTERVAL;
use granite::gke::{Cluster, Clusters, GkeClient, LocationDescriptor, NodePoolBuilder, Operation};
use granite::kubeconfig::KubeConfig;
use granite::utils::default_if_blank;

#[derive(Parser)]
#[command(name = "granite")]
#[command(about = "Provision and manage GKE clusters and node pools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "cluster.yaml")]
    config: PathBuf,

    /// Output directory for generated files
    #[arg(short, long, default_value = "./output")]
    output: PathBuf,

    /// Upper bound in seconds on each operation wait (unbounded by default)
    #[arg(long)]
    wait_timeout: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new cluster
    Create,

    /// Delete an existing cluster
    Destroy,

    /// Show cluster and node-pool status
    Status,

    /// Resize a node pool (a count of 0 deletes the pool)
    Scale {
        /// Node pool name; defaults to the cluster's only pool
        #[arg(long)]
        node_pool: Option<String>,

        /// Desired node count
        count: i32,
    },

    /// Add a node pool to an existing cluster
    AddNodePool {
        /// Pool name; defaults to the first free node-pool-<n>
        #[arg(long)]
        name: Option<String>,

        /// Index into the configuration's node_pools list
        #[arg(long, default_value_t = 0)]
        pool_index: usize,
    },

    /// Write the kubeconfig for an existing cluster
    Kubeconfig,

    /// Generate example configuration file
    Init,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("granite={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Execute command
    let result = match cli.command {
        Commands::Create => create_cluster(&cli).await,
        Commands::Destroy => destroy_cluster(&cli).await,
        Commands::Status => show_status(&cli).await,
        Commands::Scale {
            ref node_pool,
            count,
        } => scale_node_pool(&cli, node_pool.as_deref(), count).await,
        Commands::AddNodePool {
            ref name,
            pool_index,
        } => add_node_pool(&cli, name.as_deref(), pool_index).await,
        Commands::Kubeconfig => write_kubeconfig_command(&cli).await,
        Commands::Init => init_config(&cli).await,
    };

    if let Err(e) = result {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Resolve the location and connect to the control plane.
async fn connect(config: &ProvisionConfig, env: &Arc<GcloudEnvironment>) -> Result<Clusters> {
    let location = LocationDescriptor::resolve(
        config.project.as_deref(),
        config.zone.as_deref(),
        config.region.as_deref(),
        config.cluster.regional,
        config.cluster.autopilot,
        env.as_ref(),
    )
    .await
    .context("Failed to resolve the target location")?;

    let token = env
        .access_token()
        .await
        .context("Failed to obtain an access token")?;
    let client = GkeClient::new(&token).context("Failed to create the GKE client")?;

    Ok(Clusters::new(Arc::new(client), location))
}

fn configured_cluster_name(config: &ProvisionConfig) -> Result<String> {
    default_if_blank(config.cluster.name.as_deref())
        .context("cluster.name must be set in the configuration for this command")
}

/// Wait for an operation, honoring the global timeout switch.
async fn wait(cli: &Cli, operation: &mut Operation) -> Result<()> {
    let timeout = cli.wait_timeout.map(Duration::from_secs);
    operation
        .wait_done_with(DEFAULT_POLL_INTERVAL, timeout)
        .await?;
    Ok(())
}

/// Apply one pool's configuration onto a builder.
async fn configure_node_pool(
    mut builder: NodePoolBuilder,
    pool: &NodePoolSettings,
    cluster_labels: &BTreeMap<String, String>,
    env: &dyn EnvironmentSource,
) -> Result<NodePoolBuilder> {
    builder = builder
        .with_node_count(pool.node_count)
        .use_gcr_io(pool.use_gcr_io)
        .with_oauth_scopes(&pool.oauth_scopes)
        .with_machine_type(pool.machine_type.as_deref())
        .with_disk_type(pool.disk_type.as_deref())
        .with_disk_size_gb(pool.disk_size_gb)
        .with_service_account(pool.service_account_type, pool.service_account.as_deref(), env)
        .await?
        .with_autoscaling(
            pool.autoscaling.enabled,
            pool.autoscaling.min_node_count,
            pool.autoscaling.max_node_count,
        )
        .with_gpu(pool.gpu.enabled, pool.gpu.gpu_type.as_deref(), pool.gpu.count)
        .with_spot_vms(pool.spot)
        .with_node_labels(&pool.node_labels)?
        .with_taints(&pool.taints)?
        .with_resource_labels(cluster_labels, &pool.resource_labels)?
        .with_network_tags(&pool.network_tags)
        .with_settings_valve(pool.settings_valve.as_deref());
    Ok(builder)
}

/// Create a new cluster
async fn create_cluster(cli: &Cli) -> Result<()> {
    info!("Starting cluster creation...");

    let config = ProvisionConfig::from_file(&cli.config).context("Failed to load configuration")?;
    let env = Arc::new(GcloudEnvironment::new());
    let clusters = connect(&config, &env).await?;

    let cluster_name = match default_if_blank(config.cluster.name.as_deref()) {
        Some(name) => name,
        None => {
            let name = auto_name();
            info!("No cluster name configured, using generated name: {}", name);
            name
        }
    };

    let settings = &config.cluster;
    let mut builder = clusters.builder().with_name(Some(&cluster_name));

    if settings.autopilot {
        builder = builder
            .with_autopilot(true)
            .with_release_channel(settings.release_channel);
    } else {
        builder = builder
            .with_version(&settings.version)
            .with_release_channel_enrollment(settings.release_channel_enrollment)
            .with_release_channel(settings.release_channel);
        if let Some(node_count) = settings.node_count {
            builder = builder.with_initial_node_count(node_count);
        }
    }

    builder = builder
        .with_network(
            settings.inherit_network,
            settings.network.as_deref(),
            settings.subnetwork.as_deref(),
            env.as_ref(),
        )
        .await?
        .with_vpc_native(
            settings.autopilot || settings.vpc_native,
            settings.pod_ip_range.as_deref(),
            settings.svc_ip_range.as_deref(),
        )
        .with_labels(&settings.labels)?;

    if !settings.autopilot {
        builder = builder
            .with_http_load_balancing(settings.http_load_balancing)
            .with_legacy_auth(settings.legacy_auth)
            .with_locations(&settings.locations);

        for pool in &config.node_pools {
            let mut pool_builder = builder.node_pool_builder();
            if let Some(name) = default_if_blank(pool.name.as_deref()) {
                pool_builder = pool_builder.with_name(name);
            }
            let pool_builder =
                configure_node_pool(pool_builder, pool, builder.labels(), env.as_ref()).await?;
            builder = builder.add_node_pool(pool_builder.build()?);
        }
    }

    builder = builder.with_settings_valve(settings.settings_valve.as_deref());

    let mut operation = builder.create().await?;

    // can take a few minutes...
    info!("Waiting for cluster creation to complete...");
    wait(cli, &mut operation).await?;
    info!("Cluster {} is up", cluster_name);

    // cluster is ready, fetch its final state
    let cluster = clusters.cluster(&cluster_name);
    let cluster_info = cluster.get_info().await?;

    let kubeconfig_path = write_kubeconfig(cli, &cluster, &env).await?;

    info!("✓ Cluster creation completed successfully!");
    info!("");
    info!("Cluster details:");
    info!("  Name: {}", cluster_info.name);
    info!(
        "  Location: {} ({})",
        clusters.location().location(),
        clusters.location().addressing
    );
    if let Some(endpoint) = &cluster_info.endpoint {
        info!("  Endpoint: https://{}", endpoint);
    }
    if let Some(version) = &cluster_info.current_master_version {
        info!("  Master version: {}", version);
    }
    info!("");
    info!("To access your cluster:");
    info!("  export KUBECONFIG={}", kubeconfig_path.display());
    info!("  kubectl get nodes");

    Ok(())
}

/// Delete an existing cluster
async fn destroy_cluster(cli: &Cli) -> Result<()> {
    info!("Starting cluster deletion...");

    let config = ProvisionConfig::from_file(&cli.config).context("Failed to load configuration")?;
    let env = Arc::new(GcloudEnvironment::new());
    let clusters = connect(&config, &env).await?;
    let cluster_name = configured_cluster_name(&config)?;

    let cluster = clusters.cluster(&cluster_name);
    let mut operation = cluster.delete().await?;

    info!("Waiting for cluster deletion to complete...");
    wait(cli, &mut operation).await?;

    info!("✓ Cluster {} deleted successfully", cluster_name);

    Ok(())
}

/// Show cluster and node-pool status
async fn show_status(cli: &Cli) -> Result<()> {
    let config = ProvisionConfig::from_file(&cli.config).context("Failed to load configuration")?;
    let env = Arc::new(GcloudEnvironment::new());
    let clusters = connect(&config, &env).await?;
    let cluster_name = configured_cluster_name(&config)?;

    let cluster_info = clusters.cluster(&cluster_name).get_info().await?;

    info!("Cluster: {}", cluster_info.name);
    if let Some(status) = &cluster_info.status {
        info!("  Status: {}", status);
    }
    if let Some(endpoint) = &cluster_info.endpoint {
        info!("  Endpoint: https://{}", endpoint);
    }
    if let Some(version) = &cluster_info.current_master_version {
        info!("  Master version: {}", version);
    }
    if let Some(created) = &cluster_info.create_time {
        info!("  Created: {}", created);
    }
    if let Some(count) = cluster_info.current_node_count {
        info!("  Nodes: {}", count);
    }

    info!("");
    info!("Node pools:");
    for pool in &cluster_info.node_pools {
        let machine_type = pool
            .config
            .as_ref()
            .and_then(|c| c.machine_type.as_deref())
            .unwrap_or("-");
        let scaling = match &pool.autoscaling {
            Some(autoscaling) if autoscaling.enabled => format!(
                "autoscaling {}..{}",
                autoscaling.min_node_count, autoscaling.max_node_count
            ),
            _ => "fixed size".to_string(),
        };
        info!(
            "  - {} (status: {}, machine: {}, initial nodes: {}, {})",
            pool.name,
            pool.status.as_deref().unwrap_or("-"),
            machine_type,
            pool.initial_node_count.unwrap_or_default(),
            scaling
        );
    }

    Ok(())
}

/// Resize a node pool, deleting it when the requested count is zero
async fn scale_node_pool(cli: &Cli, node_pool: Option<&str>, count: i32) -> Result<()> {
    let config = ProvisionConfig::from_file(&cli.config).context("Failed to load configuration")?;
    let env = Arc::new(GcloudEnvironment::new());
    let clusters = connect(&config, &env).await?;
    let cluster_name = configured_cluster_name(&config)?;
    let cluster = clusters.cluster(&cluster_name);

    let pool_name = match default_if_blank(node_pool) {
        Some(name) => name,
        None => {
            let pools = cluster.node_pools().await?;
            let names: Vec<&str> = pools.iter().map(|p| p.name.as_str()).collect();
            if names.len() != 1 {
                anyhow::bail!(
                    "cluster has {} node pools, specify one with --node-pool (available: {})",
                    names.len(),
                    names.join(", ")
                );
            }
            names[0].to_string()
        }
    };

    let pool = cluster.node_pool(&pool_name);
    info!("Scaling node pool {} to {} nodes", pool_name, count);
    let mut operation = pool.scale(count).await?;
    wait(cli, &mut operation).await?;

    if count == 0 {
        let remaining = cluster.node_pools().await?;
        info!("✓ Node pool {} deleted", pool_name);
        info!(
            "Remaining node pools: {}",
            remaining
                .iter()
                .map(|p| p.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    } else {
        let pool_info = pool.get_info().await?;
        info!(
            "✓ Node pool {} resized (status: {})",
            pool_name,
            pool_info.status.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}

/// Add a node pool to an existing cluster
async fn add_node_pool(cli: &Cli, name: Option<&str>, pool_index: usize) -> Result<()> {
    let config = ProvisionConfig::from_file(&cli.config).context("Failed to load configuration")?;
    let env = Arc::new(GcloudEnvironment::new());
    let clusters = connect(&config, &env).await?;
    let cluster_name = configured_cluster_name(&config)?;
    let cluster = clusters.cluster(&cluster_name);

    let pool_settings = config.node_pools.get(pool_index).with_context(|| {
        format!(
            "no node pool at index {} in the configuration ({} defined)",
            pool_index,
            config.node_pools.len()
        )
    })?;

    let pool_name = match default_if_blank(name) {
        Some(name) => name,
        None => {
            // first free ordinal name
            let existing: Vec<String> = cluster
                .node_pools()
                .await?
                .into_iter()
                .map(|p| p.name)
                .collect();
            let mut ordinal = 0;
            while existing.contains(&format!("node-pool-{}", ordinal)) {
                ordinal += 1;
            }
            format!("node-pool-{}", ordinal)
        }
    };

    let pool = cluster.node_pool(&pool_name);
    let builder = configure_node_pool(
        pool.builder(),
        pool_settings,
        &config.cluster.labels,
        env.as_ref(),
    )
    .await?;

    let mut operation = pool.create(builder.build()?).await?;
    info!("Waiting for node pool creation to complete...");
    wait(cli, &mut operation).await?;

    let pool_info = pool.get_info().await?;
    info!(
        "✓ Node pool {} created (status: {})",
        pool_info.name,
        pool_info.status.as_deref().unwrap_or("-")
    );

    Ok(())
}

/// Write the kubeconfig for an existing cluster
async fn write_kubeconfig_command(cli: &Cli) -> Result<()> {
    let config = ProvisionConfig::from_file(&cli.config).context("Failed to load configuration")?;
    let env = Arc::new(GcloudEnvironment::new());
    let clusters = connect(&config, &env).await?;
    let cluster_name = configured_cluster_name(&config)?;

    let cluster = clusters.cluster(&cluster_name);
    let path = write_kubeconfig(cli, &cluster, &env).await?;
    info!("✓ Kubeconfig written to {}", path.display());

    Ok(())
}

/// Derive the kubeconfig and write it under the output directory.
async fn write_kubeconfig(
    cli: &Cli,
    cluster: &Cluster,
    env: &Arc<GcloudEnvironment>,
) -> Result<PathBuf> {
    let host = env.discover().await?;
    let kubeconfig: KubeConfig = cluster.kube_config(host.sdk_root.as_deref()).await?;

    tokio::fs::create_dir_all(&cli.output)
        .await
        .context("Failed to create output directory")?;
    let path = cli.output.join("kubeconfig");
    tokio::fs::write(&path, kubeconfig.to_yaml()?)
        .await
        .context("Failed to write kubeconfig")?;

    Ok(path)
}

/// Initialize example configuration file
async fn init_config(cli: &Cli) -> Result<()> {
    if cli.config.exists() {
        anyhow::bail!(
            "Configuration file already exists: {}",
            cli.config.display()
        );
    }

    let example_config = ProvisionConfig::example();
    let yaml = serde_yaml::to_string(&example_config)?;

    tokio::fs::write(&cli.config, yaml)
        .await
        .context("Failed to write configuration file")?;

    info!("Example configuration created: {}", cli.config.display());
    info!("");
    info!("Next steps:");
    info!("  1. Edit the configuration file to match your requirements");
    info!("  2. Authenticate with Google Cloud:");
    info!("     gcloud auth login && gcloud config set project <project>");
    info!("  3. Create the cluster:");
    info!("     granite create");

    Ok(())
}
