/// Granite - managed Kubernetes clusters on GKE
///
/// Turns a declarative configuration into GKE API requests, tracks the
/// resulting long-running operations to completion, and derives client
/// access configuration from the final cluster state.
pub mod config;
pub mod error;
pub mod gcloud;
pub mod gke;
pub mod kubeconfig;
pub mod utils;

pub use error::{Error, Result};
