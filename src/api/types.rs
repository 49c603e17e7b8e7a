//! Argument and result shapes of the typed bindings
//!
//! Field names serialize in camelCase, as the daemon expects.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use zeroize::{Zeroize, ZeroizeOnDrop};

// =============================================================================
// Shared
// =============================================================================

/// Kwargs of calls that only take a DNP name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdArgs {
    pub id: String,
}

impl IdArgs {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    Tcp,
    Udp,
}

// =============================================================================
// Auto-update
// =============================================================================

/// `id` is "my-packages", "system-packages" or a DNP name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutoUpdateSettingsEditArgs {
    pub id: String,
    pub enabled: bool,
}

// =============================================================================
// Backups and file transfer
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupItem {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackupGetArgs {
    pub id: String,
    pub backup: Vec<BackupItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupRestoreArgs {
    pub id: String,
    pub backup: Vec<BackupItem>,
    pub file_id: String,
}

/// `fromPath` may be a file, a directory (sent as .tar.gz) or relative to WORKDIR
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyFileFromArgs {
    pub id: String,
    pub from_path: String,
}

/// `filename` must be a bare name, not a path
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyFileToArgs {
    pub id: String,
    pub data_uri: String,
    pub filename: String,
    pub to_path: String,
}

// =============================================================================
// Packages
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct InstallOptions {
    /// Allow dncore DNPs from unverified sources (IPFS)
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub bypass_core_restriction: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub bypass_resolver: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallPackageArgs {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_set_envs: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<InstallOptions>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstallPackageSafeArgs {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<InstallOptions>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LogOptions {
    pub timestamp: bool,
    /// Lines from the bottom
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tail: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogPackageArgs {
    pub id: String,
    pub options: LogOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovePackageArgs {
    pub id: String,
    pub delete_volumes: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TogglePackageArgs {
    pub id: String,
    /// Seconds to wait when stopping
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdatePackageEnvArgs {
    pub id: String,
    pub envs: BTreeMap<String, String>,
    pub restart: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageGettingStartedToggleArgs {
    pub id: String,
    pub show: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnpRequest {
    pub name: String,
    pub ver: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolveRequestArgs {
    pub req: DnpRequest,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveResult {
    #[serde(default)]
    pub state: BTreeMap<String, String>,
    #[serde(default)]
    pub already_updated: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PackageVersion {
    pub version: String,
    #[serde(default)]
    pub manifest: Value,
}

// =============================================================================
// Network
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PortAction {
    Open,
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortToOpen {
    pub port_number: u16,
    pub protocol: Protocol,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManagePortsArgs {
    pub ports: Vec<PortToOpen>,
    pub action: PortAction,
}

/// Host port is optional; the daemon picks an ephemeral one when absent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortMapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<u16>,
    pub container: u16,
    pub protocol: Protocol,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePortMappingsArgs {
    pub id: String,
    pub port_mappings: Vec<PortMapping>,
}

/// Empty `static_ip` disables the static IP
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetStaticIpArgs {
    pub static_ip: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeIpfsTimeoutArgs {
    /// Milliseconds
    pub timeout: u64,
}

// =============================================================================
// Notifications
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationsRemoveArgs {
    pub ids: Vec<String>,
}

/// `None` asks the daemon for a random notification
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NotificationsTestArgs {
    pub notification: Option<Notification>,
}

// =============================================================================
// Host
// =============================================================================

/// Host identity as reported by `getParams`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Params {
    pub ip: Option<String>,
    pub name: Option<String>,
    pub static_ip: Option<String>,
    pub domain: Option<String>,
    pub upnp_available: Option<bool>,
    pub no_nat_loopback: Option<bool>,
    pub alert_to_open_ports: Option<bool>,
    pub internal_ip: Option<String>,
}

/// Usage percentages as strings, e.g. "35%"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub cpu: String,
    pub memory: String,
    pub disk: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnoseItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct VersionData {
    pub version: Option<String>,
    pub branch: Option<String>,
    pub commit: Option<String>,
}

/// New host user password. Wiped from memory on drop.
#[derive(Clone, PartialEq, Serialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChangeArgs {
    pub new_password: String,
}

impl std::fmt::Debug for PasswordChangeArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordChangeArgs")
            .field("new_password", &"********")
            .finish()
    }
}

/// tweetnacl box (base64, nonce included) of the 12-word seed phrase
#[derive(Clone, PartialEq, Serialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct SeedPhraseSetArgs {
    pub seed_phrase_encrypted: String,
}

impl std::fmt::Debug for SeedPhraseSetArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedPhraseSetArgs")
            .field("seed_phrase_encrypted", &"********")
            .finish()
    }
}

// =============================================================================
// User action logs
// =============================================================================

/// Window over the user action logs; `None` uses the facade defaults
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetUserActionLogsArgs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_log: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_logs: Option<usize>,
}
