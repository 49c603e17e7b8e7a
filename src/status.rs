//! Cached daemon status
//!
//! A single task owns [`DappnodeStatus`]. Writers send [`StatusPatch`]es
//! through a [`StatusHandle`]; readers take snapshots or subscribe to
//! changes. `apply` returns once the patch is visible to readers.

use crate::api::types::{DiagnoseItem, Notification, Params, Stats};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

const PATCH_QUEUE: usize = 64;

// =============================================================================
// State
// =============================================================================

/// Progress of a named UI operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "state", content = "error")]
pub enum LoadingState {
    Loading,
    Success,
    Error(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DappnodeStatus {
    pub system_info: Option<Params>,
    pub stats: Option<Stats>,
    pub diagnose: BTreeMap<String, DiagnoseItem>,
    pub password_is_insecure: bool,
    pub auto_update_data: Option<Value>,
    /// Last ping result per module
    pub pings: BTreeMap<String, bool>,
    pub notifications: BTreeMap<String, Notification>,
    pub loading: HashMap<String, LoadingState>,
}

impl DappnodeStatus {
    /// Host identity with the dynamic ip and domain hidden when a static IP is set
    pub fn identity_clean(&self) -> Option<Params> {
        let mut params = self.system_info.clone()?;
        if params.static_ip.as_deref().is_some_and(|ip| !ip.is_empty()) {
            params.ip = None;
            params.domain = None;
        }
        Some(params)
    }

    /// Static IP, or an empty string when unset
    pub fn static_ip(&self) -> &str {
        self.system_info
            .as_ref()
            .and_then(|p| p.static_ip.as_deref())
            .unwrap_or("")
    }

    pub fn upnp_available(&self) -> bool {
        self.system_info
            .as_ref()
            .and_then(|p| p.upnp_available)
            .unwrap_or(false)
    }

    /// Whether auto-updates are on for "system-packages"
    pub fn is_core_auto_update_active(&self) -> bool {
        self.auto_update_data
            .as_ref()
            .and_then(|d| d.pointer("/settings/system-packages/enabled"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn loading(&self, id: &str) -> Option<&LoadingState> {
        self.loading.get(id)
    }

    fn apply(&mut self, patch: StatusPatch) {
        match patch {
            StatusPatch::SystemInfo(params) => self.system_info = Some(params),
            StatusPatch::Stats(stats) => self.stats = Some(stats),
            StatusPatch::Diagnose(diagnose) => self.diagnose = diagnose,
            StatusPatch::PasswordIsInsecure(insecure) => self.password_is_insecure = insecure,
            StatusPatch::AutoUpdateData(data) => self.auto_update_data = Some(data),
            StatusPatch::Ping { module, ok } => {
                self.pings.insert(module, ok);
            }
            StatusPatch::Notifications(notifications) => self.notifications.extend(notifications),
            StatusPatch::NotificationsRemoved(ids) => {
                for id in ids {
                    self.notifications.remove(&id);
                }
            }
            StatusPatch::Loading { id, state } => {
                self.loading.insert(id, state);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatusPatch {
    SystemInfo(Params),
    Stats(Stats),
    Diagnose(BTreeMap<String, DiagnoseItem>),
    PasswordIsInsecure(bool),
    AutoUpdateData(Value),
    Ping { module: String, ok: bool },
    /// Merged into the known notifications
    Notifications(BTreeMap<String, Notification>),
    NotificationsRemoved(Vec<String>),
    Loading { id: String, state: LoadingState },
}

// =============================================================================
// Store
// =============================================================================

type PatchMsg = (StatusPatch, oneshot::Sender<()>);

pub struct StatusStore {
    patches: mpsc::Receiver<PatchMsg>,
    state: watch::Sender<DappnodeStatus>,
}

impl StatusStore {
    /// Start the store task
    ///
    /// The task stops once every handle is dropped.
    pub fn spawn() -> (StatusHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(PATCH_QUEUE);
        let (state, snapshots) = watch::channel(DappnodeStatus::default());

        let store = StatusStore { patches: rx, state };
        let task = tokio::spawn(store.run());

        (StatusHandle { patches: tx, snapshots }, task)
    }

    async fn run(mut self) {
        tracing::debug!(op = "rpc.status.start", "Status store started");

        while let Some((patch, ack)) = self.patches.recv().await {
            self.state.send_modify(|status| status.apply(patch));
            let _ = ack.send(());
        }

        tracing::debug!(op = "rpc.status.stop", "Status store stopped");
    }
}

#[derive(Clone)]
pub struct StatusHandle {
    patches: mpsc::Sender<PatchMsg>,
    snapshots: watch::Receiver<DappnodeStatus>,
}

impl StatusHandle {
    /// Apply a patch and wait until readers can see it
    pub async fn apply(&self, patch: StatusPatch) {
        let (ack, done) = oneshot::channel();
        if self.patches.send((patch, ack)).await.is_err() {
            tracing::warn!(op = "rpc.status.closed", "Status store is gone, patch dropped");
            return;
        }
        let _ = done.await;
    }

    pub fn snapshot(&self) -> DappnodeStatus {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DappnodeStatus> {
        self.snapshots.clone()
    }

    pub async fn set_loading(&self, id: &str, state: LoadingState) {
        self.apply(StatusPatch::Loading {
            id: id.to_string(),
            state,
        })
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(ip: &str, static_ip: Option<&str>) -> Params {
        Params {
            ip: Some(ip.to_string()),
            domain: Some("abcd1234.dyndns.dappnode.io".to_string()),
            static_ip: static_ip.map(str::to_string),
            upnp_available: Some(true),
            ..Default::default()
        }
    }

    fn notification(id: &str) -> Notification {
        Notification {
            id: id.to_string(),
            kind: "warning".to_string(),
            title: "Disk space is running out".to_string(),
            body: String::new(),
        }
    }

    #[tokio::test]
    async fn test_patches_visible_after_apply() {
        let (status, task) = StatusStore::spawn();

        status
            .apply(StatusPatch::Stats(Stats {
                cpu: "35%".to_string(),
                memory: "46%".to_string(),
                disk: "57%".to_string(),
            }))
            .await;
        status.set_loading("dappnodeStatus", LoadingState::Loading).await;

        let snapshot = status.snapshot();
        assert_eq!(snapshot.stats.as_ref().unwrap().disk, "57%");
        assert_eq!(snapshot.loading("dappnodeStatus"), Some(&LoadingState::Loading));
        assert_eq!(snapshot.loading("other"), None);

        drop(status);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let (status, _task) = StatusStore::spawn();
        let mut rx = status.subscribe();

        status.apply(StatusPatch::PasswordIsInsecure(true)).await;

        rx.changed().await.unwrap();
        assert!(rx.borrow().password_is_insecure);
    }

    #[tokio::test]
    async fn test_notifications_merge_and_remove() {
        let (status, _task) = StatusStore::spawn();

        status
            .apply(StatusPatch::Notifications(BTreeMap::from([("a".to_string(), notification("a"))])))
            .await;
        status
            .apply(StatusPatch::Notifications(BTreeMap::from([("b".to_string(), notification("b"))])))
            .await;
        assert_eq!(status.snapshot().notifications.len(), 2);

        status
            .apply(StatusPatch::NotificationsRemoved(vec!["a".to_string(), "zzz".to_string()]))
            .await;
        let keys: Vec<_> = status.snapshot().notifications.into_keys().collect();
        assert_eq!(keys, vec!["b".to_string()]);
    }

    #[test]
    fn test_identity_clean() {
        let mut status = DappnodeStatus::default();
        assert_eq!(status.identity_clean(), None);
        assert_eq!(status.static_ip(), "");

        status.apply(StatusPatch::SystemInfo(params("85.84.83.82", None)));
        let clean = status.identity_clean().unwrap();
        assert_eq!(clean.ip.as_deref(), Some("85.84.83.82"));
        assert!(status.upnp_available());

        status.apply(StatusPatch::SystemInfo(params("85.84.83.82", Some("192.168.1.5"))));
        let clean = status.identity_clean().unwrap();
        assert_eq!(clean.ip, None);
        assert_eq!(clean.domain, None);
        assert_eq!(status.static_ip(), "192.168.1.5");

        // Empty static IP means unset
        status.apply(StatusPatch::SystemInfo(params("85.84.83.82", Some(""))));
        assert!(status.identity_clean().unwrap().ip.is_some());
    }

    #[test]
    fn test_core_auto_update_active() {
        let mut status = DappnodeStatus::default();
        assert!(!status.is_core_auto_update_active());

        status.apply(StatusPatch::AutoUpdateData(json!({
            "settings": {
                "my-packages": { "enabled": false },
                "system-packages": { "enabled": true }
            },
            "registry": {},
            "pending": {}
        })));
        assert!(status.is_core_auto_update_active());

        status.apply(StatusPatch::AutoUpdateData(json!({ "settings": {} })));
        assert!(!status.is_core_auto_update_active());
    }

    #[tokio::test]
    async fn test_apply_after_store_stopped() {
        let (status, task) = StatusStore::spawn();
        task.abort();
        let _ = task.await;

        // Dropped with a warning, never hangs
        status.apply(StatusPatch::PasswordIsInsecure(true)).await;
        assert!(!status.snapshot().password_is_insecure);
    }
}
