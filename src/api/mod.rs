//! Call Facade
//!
//! One typed async binding per registry method. Each binding serializes its
//! argument struct into kwargs and goes through the [`Dispatcher`], so
//! validation, user action logging and completion hooks apply the same way
//! as for untyped calls.

pub mod types;

use crate::config::RpcConfig;
use crate::dispatch::Dispatcher;
use crate::error::CallError;
use crate::password::check_new_password;
use crate::registry::Method;
use crate::status::{StatusHandle, StatusPatch};
use crate::transport::StdioTransport;
use crate::types::{CallOptions, Kwargs};
use crate::user_action_log::{self, FileUserActionLog, UserActionLogEntry, DEFAULT_NUM_LOGS};
use crate::validate::kwargs_from_value;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use types::*;

#[derive(Clone)]
pub struct Api {
    dispatcher: Arc<Dispatcher>,
}

impl Api {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Stdio transport to the daemon bridge and a file-backed user action log
    pub fn from_config(config: &RpcConfig) -> Self {
        let transport = Arc::new(StdioTransport::from_config(config));
        let log = Arc::new(FileUserActionLog::new(&config.user_action_log_path));
        Self::new(Arc::new(Dispatcher::new(transport, log)))
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    async fn invoke<A, T>(&self, method: Method, args: &A, options: CallOptions) -> Result<T, CallError>
    where
        A: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let kwargs = match kwargs_of(method, args) {
            Ok(kwargs) => kwargs,
            Err(e) => return Err(self.dispatcher.reject(method.name(), Kwargs::new(), e, options).await),
        };

        let data = self.dispatcher.call(method.name(), kwargs, options).await?;
        decode(method, data)
    }

    // =========================================================================
    // Auto-update
    // =========================================================================

    pub async fn auto_update_data_get(&self, options: CallOptions) -> Result<Value, CallError> {
        self.invoke(Method::AutoUpdateDataGet, &(), options).await
    }

    pub async fn auto_update_settings_edit(
        &self,
        args: &AutoUpdateSettingsEditArgs,
        options: CallOptions,
    ) -> Result<Value, CallError> {
        self.invoke(Method::AutoUpdateSettingsEdit, args, options).await
    }

    // =========================================================================
    // Backups and file transfer
    // =========================================================================

    /// Returns the daemon's reply as is (`{ fileId }` on current daemons)
    pub async fn backup_get(&self, args: &BackupGetArgs, options: CallOptions) -> Result<Value, CallError> {
        self.invoke(Method::BackupGet, args, options).await
    }

    pub async fn backup_restore(&self, args: &BackupRestoreArgs, options: CallOptions) -> Result<Value, CallError> {
        self.invoke(Method::BackupRestore, args, options).await
    }

    /// Data URI of the file (see [`crate::data_uri::decode`])
    pub async fn copy_file_from(&self, args: &CopyFileFromArgs, options: CallOptions) -> Result<String, CallError> {
        self.invoke(Method::CopyFileFrom, args, options).await
    }

    pub async fn copy_file_to(&self, args: &CopyFileToArgs, options: CallOptions) -> Result<Value, CallError> {
        self.invoke(Method::CopyFileTo, args, options).await
    }

    // =========================================================================
    // Packages
    // =========================================================================

    pub async fn fetch_core_update_data(&self, options: CallOptions) -> Result<Value, CallError> {
        self.invoke(Method::FetchCoreUpdateData, &(), options).await
    }

    pub async fn fetch_directory(&self, options: CallOptions) -> Result<Value, CallError> {
        self.invoke(Method::FetchDirectory, &(), options).await
    }

    pub async fn fetch_dnp_request(&self, args: &IdArgs, options: CallOptions) -> Result<Value, CallError> {
        self.invoke(Method::FetchDnpRequest, args, options).await
    }

    pub async fn fetch_package_versions(
        &self,
        args: &IdArgs,
        options: CallOptions,
    ) -> Result<Vec<PackageVersion>, CallError> {
        self.invoke(Method::FetchPackageVersions, args, options).await
    }

    pub async fn install_package(&self, args: &InstallPackageArgs, options: CallOptions) -> Result<Value, CallError> {
        self.invoke(Method::InstallPackage, args, options).await
    }

    pub async fn install_package_safe(
        &self,
        args: &InstallPackageSafeArgs,
        options: CallOptions,
    ) -> Result<Value, CallError> {
        self.invoke(Method::InstallPackageSafe, args, options).await
    }

    pub async fn list_packages(&self, options: CallOptions) -> Result<Value, CallError> {
        self.invoke(Method::ListPackages, &(), options).await
    }

    pub async fn log_package(&self, args: &LogPackageArgs, options: CallOptions) -> Result<String, CallError> {
        self.invoke(Method::LogPackage, args, options).await
    }

    pub async fn package_detail_data_get(&self, args: &IdArgs, options: CallOptions) -> Result<Value, CallError> {
        self.invoke(Method::PackageDetailDataGet, args, options).await
    }

    pub async fn package_getting_started_toggle(
        &self,
        args: &PackageGettingStartedToggleArgs,
        options: CallOptions,
    ) -> Result<Value, CallError> {
        self.invoke(Method::PackageGettingStartedToggle, args, options).await
    }

    pub async fn remove_package(&self, args: &RemovePackageArgs, options: CallOptions) -> Result<Value, CallError> {
        self.invoke(Method::RemovePackage, args, options).await
    }

    pub async fn request_chain_data(&self, options: CallOptions) -> Result<Value, CallError> {
        self.invoke(Method::RequestChainData, &(), options).await
    }

    pub async fn resolve_request(
        &self,
        args: &ResolveRequestArgs,
        options: CallOptions,
    ) -> Result<ResolveResult, CallError> {
        self.invoke(Method::ResolveRequest, args, options).await
    }

    pub async fn restart_package(&self, args: &IdArgs, options: CallOptions) -> Result<Value, CallError> {
        self.invoke(Method::RestartPackage, args, options).await
    }

    pub async fn restart_package_volumes(&self, args: &IdArgs, options: CallOptions) -> Result<Value, CallError> {
        self.invoke(Method::RestartPackageVolumes, args, options).await
    }

    pub async fn toggle_package(&self, args: &TogglePackageArgs, options: CallOptions) -> Result<Value, CallError> {
        self.invoke(Method::TogglePackage, args, options).await
    }

    pub async fn update_package_env(
        &self,
        args: &UpdatePackageEnvArgs,
        options: CallOptions,
    ) -> Result<Value, CallError> {
        self.invoke(Method::UpdatePackageEnv, args, options).await
    }

    // =========================================================================
    // Network
    // =========================================================================

    pub async fn change_ipfs_timeout(
        &self,
        args: &ChangeIpfsTimeoutArgs,
        options: CallOptions,
    ) -> Result<Value, CallError> {
        self.invoke(Method::ChangeIpfsTimeout, args, options).await
    }

    pub async fn manage_ports(&self, args: &ManagePortsArgs, options: CallOptions) -> Result<Value, CallError> {
        self.invoke(Method::ManagePorts, args, options).await
    }

    pub async fn set_static_ip(&self, args: &SetStaticIpArgs, options: CallOptions) -> Result<Value, CallError> {
        self.invoke(Method::SetStaticIp, args, options).await
    }

    pub async fn update_port_mappings(
        &self,
        args: &UpdatePortMappingsArgs,
        options: CallOptions,
    ) -> Result<Value, CallError> {
        self.invoke(Method::UpdatePortMappings, args, options).await
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    /// Pending notifications keyed by id
    pub async fn notifications_get(
        &self,
        options: CallOptions,
    ) -> Result<BTreeMap<String, Notification>, CallError> {
        self.invoke(Method::NotificationsGet, &(), options).await
    }

    pub async fn notifications_remove(
        &self,
        args: &NotificationsRemoveArgs,
        options: CallOptions,
    ) -> Result<Value, CallError> {
        self.invoke(Method::NotificationsRemove, args, options).await
    }

    pub async fn notifications_test(
        &self,
        args: &NotificationsTestArgs,
        options: CallOptions,
    ) -> Result<Value, CallError> {
        self.invoke(Method::NotificationsTest, args, options).await
    }

    // =========================================================================
    // Host
    // =========================================================================

    pub async fn ping(&self, options: CallOptions) -> Result<Value, CallError> {
        self.invoke(Method::Ping, &(), options).await
    }

    /// Clears the local DB, user action logs and the transfer folder
    pub async fn clean_cache(&self, options: CallOptions) -> Result<Value, CallError> {
        self.invoke(Method::CleanCache, &(), options).await
    }

    /// Diagnose checks keyed by check id
    pub async fn diagnose(&self, options: CallOptions) -> Result<BTreeMap<String, DiagnoseItem>, CallError> {
        self.invoke(Method::Diagnose, &(), options).await
    }

    pub async fn get_params(&self, options: CallOptions) -> Result<Params, CallError> {
        self.invoke(Method::GetParams, &(), options).await
    }

    pub async fn get_stats(&self, options: CallOptions) -> Result<Stats, CallError> {
        self.invoke(Method::GetStats, &(), options).await
    }

    pub async fn get_version_data(&self, options: CallOptions) -> Result<VersionData, CallError> {
        self.invoke(Method::GetVersionData, &(), options).await
    }

    pub async fn mountpoints_get(&self, options: CallOptions) -> Result<Value, CallError> {
        self.invoke(Method::MountpointsGet, &(), options).await
    }

    pub async fn nacl_encryption_get_public_key(&self, options: CallOptions) -> Result<String, CallError> {
        self.invoke(Method::NaclEncryptionGetPublicKey, &(), options).await
    }

    /// Passwords that break the host rules are refused without contacting
    /// the daemon; the refusal is logged like any failed call
    pub async fn password_change(
        &self,
        args: &PasswordChangeArgs,
        options: CallOptions,
    ) -> Result<Value, CallError> {
        let violations = check_new_password(&args.new_password, None);
        if !violations.is_empty() {
            tracing::warn!(
                op = "rpc.password.rejected",
                violations = ?violations,
                "New password rejected before sending"
            );
            let kwargs = kwargs_of(Method::PasswordChange, args).unwrap_or_default();
            let error = CallError::InvalidArgument("newPassword".to_string());
            return Err(self
                .dispatcher
                .reject(Method::PasswordChange.name(), kwargs, error, options)
                .await);
        }
        self.invoke(Method::PasswordChange, args, options).await
    }

    pub async fn password_is_secure(&self, options: CallOptions) -> Result<bool, CallError> {
        self.invoke(Method::PasswordIsSecure, &(), options).await
    }

    pub async fn poweroff_host(&self, options: CallOptions) -> Result<Value, CallError> {
        self.invoke(Method::PoweroffHost, &(), options).await
    }

    pub async fn reboot_host(&self, options: CallOptions) -> Result<Value, CallError> {
        self.invoke(Method::RebootHost, &(), options).await
    }

    pub async fn seed_phrase_get_public_key(&self, options: CallOptions) -> Result<String, CallError> {
        self.invoke(Method::SeedPhraseGetPublicKey, &(), options).await
    }

    pub async fn seed_phrase_set(&self, args: &SeedPhraseSetArgs, options: CallOptions) -> Result<Value, CallError> {
        self.invoke(Method::SeedPhraseSet, args, options).await
    }

    // =========================================================================
    // User action logs
    // =========================================================================

    /// Newest-first window of user action logs
    ///
    /// Missing bounds default to `fromLog = 0`, `numLogs = 50`. An out of
    /// bounds `fromLog` yields an empty list.
    pub async fn get_user_action_logs(
        &self,
        args: &GetUserActionLogsArgs,
        options: CallOptions,
    ) -> Result<Vec<UserActionLogEntry>, CallError> {
        let args = GetUserActionLogsArgs {
            from_log: Some(args.from_log.unwrap_or(0)),
            num_logs: Some(args.num_logs.unwrap_or(DEFAULT_NUM_LOGS)),
        };
        let data: Value = self.invoke(Method::GetUserActionLogs, &args, options).await?;

        match data {
            // Daemon replies with stringified entries, one per line
            Value::String(text) => Ok(user_action_log::parse_lines(&text)),
            Value::Null => Ok(Vec::new()),
            other => decode(Method::GetUserActionLogs, other),
        }
    }

    // =========================================================================
    // Status refresh
    // =========================================================================

    pub async fn refresh_system_info(&self, status: &StatusHandle) -> Result<(), CallError> {
        let params = self.get_params(CallOptions::default()).await?;
        status.apply(StatusPatch::SystemInfo(params)).await;
        Ok(())
    }

    pub async fn refresh_stats(&self, status: &StatusHandle) -> Result<(), CallError> {
        let stats = self.get_stats(CallOptions::default()).await?;
        status.apply(StatusPatch::Stats(stats)).await;
        Ok(())
    }

    pub async fn refresh_diagnose(&self, status: &StatusHandle) -> Result<(), CallError> {
        let diagnose = self.diagnose(CallOptions::default()).await?;
        status.apply(StatusPatch::Diagnose(diagnose)).await;
        Ok(())
    }

    pub async fn refresh_password_is_secure(&self, status: &StatusHandle) -> Result<(), CallError> {
        let secure = self.password_is_secure(CallOptions::default()).await?;
        status.apply(StatusPatch::PasswordIsInsecure(!secure)).await;
        Ok(())
    }

    pub async fn refresh_auto_update_data(&self, status: &StatusHandle) -> Result<(), CallError> {
        let data = self.auto_update_data_get(CallOptions::default()).await?;
        status.apply(StatusPatch::AutoUpdateData(data)).await;
        Ok(())
    }

    pub async fn refresh_notifications(&self, status: &StatusHandle) -> Result<(), CallError> {
        let notifications = self.notifications_get(CallOptions::default()).await?;
        status.apply(StatusPatch::Notifications(notifications)).await;
        Ok(())
    }

    /// Ping the daemon and record whether it answered
    ///
    /// A failed ping is recorded, not returned.
    pub async fn refresh_ping(&self, status: &StatusHandle) {
        let ok = self.ping(CallOptions::default().suppress_error_toast()).await.is_ok();
        status
            .apply(StatusPatch::Ping {
                module: Method::Ping.event_name(),
                ok,
            })
            .await;
    }

    /// Remove notifications on the daemon, then drop them from the store
    pub async fn remove_notifications(&self, ids: Vec<String>, status: &StatusHandle) -> Result<(), CallError> {
        self.notifications_remove(&NotificationsRemoveArgs { ids: ids.clone() }, CallOptions::default())
            .await?;
        status.apply(StatusPatch::NotificationsRemoved(ids)).await;
        Ok(())
    }
}

fn kwargs_of<A: Serialize + ?Sized>(method: Method, args: &A) -> Result<Kwargs, CallError> {
    let value = serde_json::to_value(args)
        .map_err(|e| CallError::InvalidArgument(format!("kwargs of {}: {}", method, e)))?;
    kwargs_from_value(value)
}

fn decode<T: DeserializeOwned>(method: Method, data: Value) -> Result<T, CallError> {
    serde_json::from_value(data).map_err(|e| CallError::Transport {
        message: format!("malformed {} response: {}", method, e),
    })
}
