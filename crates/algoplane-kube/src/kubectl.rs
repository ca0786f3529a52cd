//! kubectl-backed implementation of [`WorkloadController`].
//!
//! Shells out to `kubectl run` / `kubectl delete pod` / `kubectl get
//! pods -o json`, capturing stderr so idempotent-success cases can be
//! told apart from real failures by the orchestrator's error text.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::error::{WorkloadError, WorkloadResult};
use crate::WorkloadController;

/// Drives pod lifecycle through the `kubectl` binary.
pub struct KubectlController {
    bin: PathBuf,
}

impl KubectlController {
    /// `bin` is the kubectl binary to invoke — a bare `"kubectl"`
    /// resolves through `PATH`.
    pub fn new(bin: impl Into<PathBuf>) -> Self {
        Self { bin: bin.into() }
    }
}

#[async_trait]
impl WorkloadController for KubectlController {
    async fn create_workload(&self, name: &str, image: &str) -> WorkloadResult<()> {
        let output = Command::new(&self.bin)
            .arg("run")
            .arg(name)
            .arg(format!("--image={image}"))
            .output()
            .await?;

        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if is_already_exists(&stderr) {
            debug!(%name, "workload already exists");
            return Ok(());
        }
        Err(WorkloadError::CommandFailed {
            action: "run",
            stderr: stderr.trim().to_string(),
        })
    }

    async fn delete_workload(&self, name: &str) -> WorkloadResult<()> {
        let output = Command::new(&self.bin)
            .arg("delete")
            .arg("pod")
            .arg(name)
            .output()
            .await?;

        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if is_not_found(&stderr) {
            debug!(%name, "workload already absent");
            return Ok(());
        }
        Err(WorkloadError::CommandFailed {
            action: "delete",
            stderr: stderr.trim().to_string(),
        })
    }

    async fn list_workloads(&self) -> WorkloadResult<Vec<String>> {
        let output = Command::new(&self.bin)
            .arg("get")
            .arg("pods")
            .arg("-o")
            .arg("json")
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(WorkloadError::CommandFailed {
                action: "get",
                stderr: stderr.trim().to_string(),
            });
        }

        let list: PodList = serde_json::from_slice(&output.stdout)?;
        Ok(list.items.into_iter().map(|p| p.metadata.name).collect())
    }
}

/// Shape of `kubectl get pods -o json`, reduced to the names.
#[derive(Deserialize)]
struct PodList {
    #[serde(default)]
    items: Vec<PodItem>,
}

#[derive(Deserialize)]
struct PodItem {
    metadata: PodMetadata,
}

#[derive(Deserialize)]
struct PodMetadata {
    name: String,
}

fn is_already_exists(stderr: &str) -> bool {
    stderr.contains("already exists") || stderr.contains("AlreadyExists")
}

fn is_not_found(stderr: &str) -> bool {
    stderr.contains("NotFound") || stderr.contains("not found")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    /// Install a fake kubectl script into `dir` and return its path.
    fn fake_kubectl(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("kubectl");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    #[test]
    fn stderr_classification() {
        assert!(is_already_exists(
            "Error from server (AlreadyExists): pods \"vwap-1\" already exists"
        ));
        assert!(!is_already_exists("connection refused"));

        assert!(is_not_found(
            "Error from server (NotFound): pods \"twap-1\" not found"
        ));
        assert!(!is_not_found("connection refused"));
    }

    #[tokio::test]
    async fn create_succeeds_on_zero_exit() {
        let dir = tempfile::tempdir().unwrap();
        let bin = fake_kubectl(dir.path(), "exit 0");

        let controller = KubectlController::new(bin);
        controller.create_workload("vwap-1", "algo/vwap:1.0").await.unwrap();
    }

    #[tokio::test]
    async fn create_already_exists_is_success() {
        let dir = tempfile::tempdir().unwrap();
        let bin = fake_kubectl(
            dir.path(),
            "echo 'Error from server (AlreadyExists): pods \"vwap-1\" already exists' >&2\nexit 1",
        );

        let controller = KubectlController::new(bin);
        controller.create_workload("vwap-1", "algo/vwap:1.0").await.unwrap();
    }

    #[tokio::test]
    async fn create_other_failure_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let bin = fake_kubectl(
            dir.path(),
            "echo 'Unable to connect to the server: connection refused' >&2\nexit 1",
        );

        let controller = KubectlController::new(bin);
        let err = controller
            .create_workload("vwap-1", "algo/vwap:1.0")
            .await
            .unwrap_err();
        assert!(matches!(err, WorkloadError::CommandFailed { action: "run", .. }));
    }

    #[tokio::test]
    async fn delete_not_found_is_success() {
        let dir = tempfile::tempdir().unwrap();
        let bin = fake_kubectl(
            dir.path(),
            "echo 'Error from server (NotFound): pods \"twap-1\" not found' >&2\nexit 1",
        );

        let controller = KubectlController::new(bin);
        controller.delete_workload("twap-1").await.unwrap();
    }

    #[tokio::test]
    async fn delete_other_failure_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let bin = fake_kubectl(dir.path(), "echo 'permission denied' >&2\nexit 1");

        let controller = KubectlController::new(bin);
        let err = controller.delete_workload("twap-1").await.unwrap_err();
        assert!(matches!(err, WorkloadError::CommandFailed { action: "delete", .. }));
    }

    #[tokio::test]
    async fn list_parses_pod_names() {
        let dir = tempfile::tempdir().unwrap();
        let bin = fake_kubectl(
            dir.path(),
            r#"echo '{"items":[{"metadata":{"name":"vwap-1"}},{"metadata":{"name":"hft-2"}}]}'"#,
        );

        let controller = KubectlController::new(bin);
        let pods = controller.list_workloads().await.unwrap();
        assert_eq!(pods, vec!["vwap-1".to_string(), "hft-2".to_string()]);
    }

    #[tokio::test]
    async fn list_with_no_items_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let bin = fake_kubectl(dir.path(), r#"echo '{"items":[]}'"#);

        let controller = KubectlController::new(bin);
        assert!(controller.list_workloads().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_binary_is_spawn_error() {
        let controller = KubectlController::new("/nonexistent/kubectl");
        let err = controller.delete_workload("twap-1").await.unwrap_err();
        assert!(matches!(err, WorkloadError::Spawn(_)));
    }
}
