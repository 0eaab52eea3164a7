/// Long-running operation handles
///
/// Every mutating call returns an `Operation` that must be polled to its
/// terminal state before the mutation's effects are guaranteed visible. The
/// handle remembers the addressing dialect it was created under, since
/// operation lookup uses a different parameter shape per dialect.
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::error::{Error, Result};
use crate::gke::api::ContainerApi;
use crate::gke::location::LocationDescriptor;
use crate::gke::models::{OperationResource, OperationStatus};
use crate::utils::is_blank;

/// Interval between status refreshes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Handle on one long-running control-plane operation.
///
/// Not meant to be shared across concurrent waiters; the issuer owns it.
pub struct Operation {
    api: Arc<dyn ContainerApi>,
    location: LocationDescriptor,
    resource: OperationResource,
}

impl Operation {
    pub(crate) fn new(
        api: Arc<dyn ContainerApi>,
        location: LocationDescriptor,
        resource: OperationResource,
    ) -> Self {
        Self {
            api,
            location,
            resource,
        }
    }

    /// Control-plane identifier of this operation.
    pub fn id(&self) -> &str {
        &self.resource.name
    }

    /// Last observed status.
    pub fn status(&self) -> OperationStatus {
        self.resource.status
    }

    pub fn is_done(&self) -> bool {
        self.resource.status.is_terminal()
    }

    /// Re-fetch the current status under the dialect this operation was
    /// created with.
    pub async fn refresh(&mut self) -> Result<()> {
        let params = self.location.operation(&self.resource.name);
        self.resource = self.api.get_operation(&params).await?;
        Ok(())
    }

    /// Block until the operation reaches its terminal state, polling at the
    /// default interval with no upper bound on the total wait.
    pub async fn wait_done(&mut self) -> Result<()> {
        self.wait_done_with(DEFAULT_POLL_INTERVAL, None).await
    }

    /// Block until terminal, polling at `interval`, giving up after
    /// `timeout` when one is supplied.
    ///
    /// An operation that is already terminal performs no refresh. A refresh
    /// failure aborts the wait; the remote operation is left in whatever
    /// state the control plane reports.
    pub async fn wait_done_with(
        &mut self,
        interval: Duration,
        timeout: Option<Duration>,
    ) -> Result<()> {
        let start = Instant::now();

        while !self.is_done() {
            if let Some(limit) = timeout {
                if start.elapsed() > limit {
                    return Err(Error::OperationFailed {
                        id: self.resource.name.clone(),
                        message: format!(
                            "not terminal after {}s, last status {}",
                            limit.as_secs(),
                            self.resource.status
                        ),
                    });
                }
            }

            debug!(
                "Operation {} is {}, polling again",
                self.resource.name, self.resource.status
            );
            sleep(interval).await;
            self.refresh().await?;
        }

        self.check_terminal_error()
    }

    /// A terminal operation carrying an error payload is a failure even
    /// though its status reads DONE.
    fn check_terminal_error(&self) -> Result<()> {
        if let Some(error) = &self.resource.error {
            let message = error
                .message
                .clone()
                .unwrap_or_else(|| format!("error code {}", error.code.unwrap_or_default()));
            return Err(Error::OperationFailed {
                id: self.resource.name.clone(),
                message,
            });
        }
        if let Some(message) = &self.resource.status_message {
            if !is_blank(Some(message)) {
                return Err(Error::OperationFailed {
                    id: self.resource.name.clone(),
                    message: message.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gke::api::testing::{operation, FakeApi};
    use crate::gke::location::{Addressing, LocationDescriptor};
    use crate::gke::models::OperationError;

    fn zonal_location() -> LocationDescriptor {
        LocationDescriptor {
            project_id: "p".to_string(),
            zone: Some("us-east1-b".to_string()),
            region: Some("us-east1".to_string()),
            addressing: Addressing::Zonal,
        }
    }

    fn fast() -> Duration {
        Duration::from_millis(1)
    }

    #[tokio::test]
    async fn test_wait_refreshes_until_done() {
        // RUNNING for two refreshes, DONE on the third: exactly 3 fetches.
        let api = Arc::new(FakeApi::with_operation_script(&[
            OperationStatus::Running,
            OperationStatus::Running,
            OperationStatus::Done,
        ]));
        let mut op = Operation::new(
            api.clone(),
            zonal_location(),
            operation("operation-1", OperationStatus::Running),
        );

        op.wait_done_with(fast(), None).await.unwrap();
        assert_eq!(api.refresh_count(), 3);
        assert!(op.is_done());
    }

    #[tokio::test]
    async fn test_wait_on_already_done_operation_never_refreshes() {
        let api = Arc::new(FakeApi::new());
        let mut op = Operation::new(
            api.clone(),
            zonal_location(),
            operation("operation-1", OperationStatus::Done),
        );

        op.wait_done_with(fast(), None).await.unwrap();
        assert_eq!(api.refresh_count(), 0);
    }

    #[tokio::test]
    async fn test_wait_polls_with_dialect_of_creation() {
        let api = Arc::new(FakeApi::with_operation_script(&[OperationStatus::Done]));
        let regional = LocationDescriptor {
            addressing: Addressing::Regional,
            ..zonal_location()
        };
        let mut op = Operation::new(
            api.clone(),
            regional,
            operation("operation-1", OperationStatus::Pending),
        );

        op.wait_done_with(fast(), None).await.unwrap();
        let log = api.call_log();
        assert_eq!(
            log[0],
            "get_operation projects/p/locations/us-east1/operations/operation-1"
        );
    }

    #[tokio::test]
    async fn test_terminal_error_payload_is_surfaced() {
        let api = Arc::new(FakeApi::new());
        {
            let mut script = api.operations.lock().unwrap();
            let mut failed = operation("operation-1", OperationStatus::Done);
            failed.error = Some(OperationError {
                code: Some(9),
                message: Some("insufficient quota".to_string()),
            });
            script.push_back(failed);
        }
        let mut op = Operation::new(
            api.clone(),
            zonal_location(),
            operation("operation-1", OperationStatus::Running),
        );

        let result = op.wait_done_with(fast(), None).await;
        match result {
            Err(Error::OperationFailed { id, message }) => {
                assert_eq!(id, "operation-1");
                assert!(message.contains("insufficient quota"));
            }
            other => panic!("expected OperationFailed, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_refresh_failure_aborts_wait() {
        let api = Arc::new(FakeApi {
            fail_refresh: true,
            ..FakeApi::new()
        });
        let mut op = Operation::new(
            api,
            zonal_location(),
            operation("operation-1", OperationStatus::Running),
        );

        let result = op.wait_done_with(fast(), None).await;
        assert!(matches!(result, Err(Error::RemoteCall { .. })));
    }

    #[tokio::test]
    async fn test_timeout_bounds_the_wait() {
        let api = Arc::new(FakeApi {
            always_running: true,
            ..FakeApi::new()
        });
        let mut op = Operation::new(
            api,
            zonal_location(),
            operation("operation-1", OperationStatus::Running),
        );

        let result = op
            .wait_done_with(fast(), Some(Duration::from_millis(10)))
            .await;
        assert!(matches!(result, Err(Error::OperationFailed { .. })));
    }
}
