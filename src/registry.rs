//! Call Schema Registry
//!
//! The closed catalogue of DAPPMANAGER RPC methods. Each method is one
//! variant of [`Method`]; its wire name and mandatory kwargs are declared
//! once in the table below. The lookup map is built on first access and is
//! never mutated afterwards, so concurrent reads need no locking.
//!
//! Adding a method means adding one row here and one binding in
//! [`crate::api`].

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::OnceLock;

/// Namespace appended to method names in user-facing event names
pub const EVENT_NAMESPACE: &str = "dappmanager.dnp.dappnode.eth";

macro_rules! rpc_methods {
    ($( $(#[$doc:meta])* $variant:ident => $name:literal [$($kw:literal),*] ),* $(,)?) => {
        /// Every RPC method the daemon exposes
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Method {
            $( $(#[$doc])* $variant, )*
        }

        impl Method {
            /// All methods, in catalogue order
            pub const ALL: &'static [Method] = &[$(Method::$variant),*];

            /// Wire name (dot-free)
            pub fn name(self) -> &'static str {
                match self {
                    $( Method::$variant => $name, )*
                }
            }

            /// Kwargs that must be present for the call to be sent
            pub fn mandatory_kwargs(self) -> &'static [&'static str] {
                match self {
                    $( Method::$variant => &[$($kw),*], )*
                }
            }
        }
    };
}

rpc_methods! {
    /// Liveness check
    Ping => "ping" [],
    /// Auto-update settings, registry, pending updates and display data
    AutoUpdateDataGet => "autoUpdateDataGet" [],
    /// Enable or disable auto-updates for "my-packages", "system-packages" or a DNP
    AutoUpdateSettingsEdit => "autoUpdateSettingsEdit" ["id", "enabled"],
    /// Back up a DNP's paths and return a file id for download
    BackupGet => "backupGet" ["id", "backup"],
    /// Restore a previously uploaded backup
    BackupRestore => "backupRestore" ["id", "backup", "fileId"],
    ChangeIpfsTimeout => "changeIpfsTimeout" ["timeout"],
    /// Clear local DB, user action logs and the transfer folder
    CleanCache => "cleanCache" [],
    /// Download a file or directory from a DNP as a data URI
    CopyFileFrom => "copyFileFrom" ["id", "fromPath"],
    /// Upload a data URI into a DNP
    CopyFileTo => "copyFileTo" ["id", "dataUri", "filename", "toPath"],
    Diagnose => "diagnose" [],
    FetchCoreUpdateData => "fetchCoreUpdateData" [],
    FetchDirectory => "fetchDirectory" [],
    FetchDnpRequest => "fetchDnpRequest" ["id"],
    /// All published versions of a package
    FetchPackageVersions => "fetchPackageVersions" ["id"],
    /// Host identity (ip, name, static ip, domain, upnp)
    GetParams => "getParams" [],
    /// cpu / memory / disk usage as percentage strings
    GetStats => "getStats" [],
    /// Newest-first user action logs (fromLog = 0, numLogs = 50 by default)
    GetUserActionLogs => "getUserActionLogs" [],
    GetVersionData => "getVersionData" [],
    InstallPackage => "installPackage" ["name"],
    /// Install bypassing the resolver
    InstallPackageSafe => "installPackageSafe" ["id"],
    ListPackages => "listPackages" [],
    /// Container logs of a package
    LogPackage => "logPackage" ["id", "options"],
    /// Open or close host ports through UPnP
    ManagePorts => "managePorts" ["ports", "action"],
    MountpointsGet => "mountpointsGet" [],
    NaclEncryptionGetPublicKey => "naclEncryptionGetPublicKey" [],
    NotificationsGet => "notificationsGet" [],
    NotificationsRemove => "notificationsRemove" ["ids"],
    NotificationsTest => "notificationsTest" [],
    PackageDetailDataGet => "packageDetailDataGet" ["id"],
    PackageGettingStartedToggle => "packageGettingStartedToggle" ["id", "show"],
    /// Change the host user password
    PasswordChange => "passwordChange" ["newPassword"],
    PasswordIsSecure => "passwordIsSecure" [],
    PoweroffHost => "poweroffHost" [],
    RebootHost => "rebootHost" [],
    /// docker down + disk files, optionally volumes
    RemovePackage => "removePackage" ["id", "deleteVolumes"],
    RequestChainData => "requestChainData" [],
    ResolveRequest => "resolveRequest" ["req"],
    RestartPackage => "restartPackage" ["id"],
    RestartPackageVolumes => "restartPackageVolumes" ["id"],
    SeedPhraseGetPublicKey => "seedPhraseGetPublicKey" [],
    SeedPhraseSet => "seedPhraseSet" ["seedPhraseEncrypted"],
    /// Empty string disables the static IP
    SetStaticIp => "setStaticIp" ["staticIp"],
    TogglePackage => "togglePackage" ["id"],
    UpdatePackageEnv => "updatePackageEnv" ["id", "envs", "restart"],
    UpdatePortMappings => "updatePortMappings" ["id", "portMappings"],
}

impl Method {
    /// Dotted event name shown to users, e.g. `backupGet.dappmanager.dnp.dappnode.eth`
    pub fn event_name(self) -> String {
        format!("{}.{}", self.name(), EVENT_NAMESPACE)
    }

    /// Schema of this method
    pub fn schema(self) -> &'static CallSchema {
        // Every variant is registered at init
        &registry().by_name[self.name()]
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Method {
    type Err = crate::CallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        registry()
            .get(s)
            .map(|schema| schema.method)
            .ok_or_else(|| crate::CallError::UnknownMethod(s.to_string()))
    }
}

/// Contract of one method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSchema {
    pub method: Method,
    pub method_name: &'static str,
    pub mandatory_kwargs: &'static [&'static str],
}

/// Read-only map from method name to schema
pub struct Registry {
    by_name: HashMap<&'static str, CallSchema>,
}

impl Registry {
    fn load() -> Self {
        let by_name: HashMap<_, _> = Method::ALL
            .iter()
            .map(|&method| {
                let schema = CallSchema {
                    method,
                    method_name: method.name(),
                    mandatory_kwargs: method.mandatory_kwargs(),
                };
                (schema.method_name, schema)
            })
            .collect();

        tracing::debug!(
            op = "rpc.registry.loaded",
            methods = by_name.len(),
            "Call schema registry loaded"
        );

        Self { by_name }
    }

    pub fn get(&self, method_name: &str) -> Option<&CallSchema> {
        self.by_name.get(method_name)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// All schemas, sorted by method name
    pub fn schemas(&self) -> Vec<&CallSchema> {
        let mut schemas: Vec<_> = self.by_name.values().collect();
        schemas.sort_by_key(|s| s.method_name);
        schemas
    }
}

static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// Process-wide registry (built once, never torn down)
pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::load)
}
