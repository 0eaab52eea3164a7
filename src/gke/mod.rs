/// GKE control-plane surface
pub mod api;
pub mod client;
pub mod cluster;
pub mod location;
pub mod models;
pub mod node_pool;
pub mod operations;

pub use api::ContainerApi;
pub use client::GkeClient;
pub use cluster::{Cluster, ClusterBuilder, Clusters};
pub use location::{Addressing, LocationDescriptor, LocationParams};
pub use node_pool::{NodePool, NodePoolBuilder};
pub use operations::Operation;
