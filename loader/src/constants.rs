// src/constants.rs

//! Defines global constants, enums, and bitflags shared with the daemon.

use crate::lp_select;
use bitflags::bitflags;
use log::LevelFilter;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::time::Duration;

// --- Configuration Constants ---

/// The maximum log level for the loader. Set to `Trace` for debug builds and `Info` for release builds.
#[cfg(debug_assertions)]
pub const MAX_LOG_LEVEL: LevelFilter = LevelFilter::Trace;
#[cfg(not(debug_assertions))]
pub const MAX_LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// The directory where installed modules keep their `module.prop`.
pub const PATH_MODULES_DIR: &str = "/data/adb/modules";

/// Name of the property file inside each module directory.
pub const MODULE_PROP: &str = "module.prop";

/// Environment variable holding the daemon's temporary directory.
pub const TMP_PATH_ENV: &str = "TMP_PATH";

// --- IPC Constants ---

/// The daemon socket file, appended to the temporary directory.
/// Each ABI has its own daemon, so the name follows the pointer width.
pub const SOCKET_NAME: &str = lp_select!("/cp32.sock", "/cp64.sock");

/// Pause between two connection attempts.
pub const CONNECT_RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Connection attempts for the heartbeat, which races the daemon's startup.
pub const HEARTBEAT_ATTEMPTS: u8 = 5;

/// Connection attempts for one-shot queries.
pub const QUERY_ATTEMPTS: u8 = 1;

/// Status byte sent by the daemon when a companion socket is available.
pub const COMPANION_OK: u8 = 1;

/// Defines the set of actions that can be requested from the daemon over its main Unix socket.
///
/// The discriminants are positional and must match the daemon's own enumeration.
#[derive(Debug, Eq, PartialEq, IntoPrimitive, TryFromPrimitive, Copy, Clone)]
#[repr(u8)]
pub enum SocketAction {
    PingHeartbeat,
    GetProcessFlags,
    ReadModules,
    RequestCompanionSocket,
    GetModuleDir,
    ZygoteRestart,
    SystemServerStarted,
    GetInfo,
    UpdateMountNamespace,
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ProcessFlags: u32 {
        /// The process has been granted root privileges.
        const PROCESS_GRANTED_ROOT = 1 << 0;
        /// The process is on the denylist and module mounts should be hidden.
        const PROCESS_ON_DENYLIST = 1 << 1;
        /// The active root solution is APatch.
        const PROCESS_ROOT_IS_APATCH = 1 << 27;
        /// The process is the root manager application itself.
        const PROCESS_IS_MANAGER = 1 << 28;
        /// The active root solution is KernelSU.
        const PROCESS_ROOT_IS_KSU = 1 << 29;
        /// The active root solution is Magisk.
        const PROCESS_ROOT_IS_MAGISK = 1 << 30;
        /// Zygote has been started for the first time since boot.
        const PROCESS_IS_FIRST_STARTED = 1 << 31;
    }
}
