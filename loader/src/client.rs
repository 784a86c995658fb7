// src/client.rs

//! The request/reply client for the Zygisk daemon (`zygiskd`).
//!
//! Every operation opens its own connection, writes a single action byte
//! followed by the action's payload, reads the reply and closes the socket.
//! Nothing is shared between calls apart from the immutable [`DaemonClient`].
//!
//! Public operations never return errors. A failed connection, a short read
//! or a sentinel reply is logged once and turned into the operation's
//! "absent" value (`false`, empty flags, an empty list, `None`, or a
//! [`ZygoteInfo`] with `running == false`).

use crate::constants::{
    COMPANION_OK, CONNECT_RETRY_INTERVAL, HEARTBEAT_ATTEMPTS, PATH_MODULES_DIR, ProcessFlags,
    QUERY_ATTEMPTS, SOCKET_NAME, SocketAction, TMP_PATH_ENV,
};
use crate::module::{self, ModuleInfo};
use crate::mount::{self, MountNamespace};
use crate::root_impl::RootImpl;
use crate::utils::UnixStreamExt;
use anyhow::{Context, Result, bail};
use log::{debug, trace, warn};
use rustix::net::{AddressFamily, SocketAddrUnix, SocketFlags, SocketType, connect, socket_with};
use std::io;
use std::os::fd::OwnedFd;
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

/// Status snapshot of the daemon, as returned by [`DaemonClient::get_info`].
///
/// When `running` is false the daemon could not be reached (or its reply was
/// unreadable) and the other fields hold their defaults.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ZygoteInfo {
    pub running: bool,
    pub root_impl: RootImpl,
    pub pid: u32,
    /// Display names of the loaded modules.
    pub modules: Vec<String>,
}

/// Handle on the daemon's control socket.
///
/// Built once at startup from the daemon's temporary directory and passed to
/// every call site; it holds configuration only, never a connection.
#[derive(Debug, Clone)]
pub struct DaemonClient {
    tmp_path: PathBuf,
    socket_path: PathBuf,
    modules_dir: PathBuf,
    retry_interval: Duration,
}

impl DaemonClient {
    /// Creates a client for the daemon living in `tmp_path`.
    pub fn new(tmp_path: impl Into<PathBuf>) -> Self {
        let tmp_path = tmp_path.into();
        let mut socket_path = tmp_path.clone().into_os_string();
        socket_path.push(SOCKET_NAME);
        Self {
            tmp_path,
            socket_path: PathBuf::from(socket_path),
            modules_dir: PathBuf::from(PATH_MODULES_DIR),
            retry_interval: CONNECT_RETRY_INTERVAL,
        }
    }

    /// Creates a client from the `TMP_PATH` environment variable.
    pub fn from_env() -> Result<Self> {
        let tmp_path = std::env::var(TMP_PATH_ENV)
            .with_context(|| format!("{} environment variable not set", TMP_PATH_ENV))?;
        Ok(Self::new(tmp_path))
    }

    /// Overrides the directory searched for `module.prop` files.
    pub fn with_modules_dir(mut self, modules_dir: impl Into<PathBuf>) -> Self {
        self.modules_dir = modules_dir.into();
        self
    }

    /// Overrides the pause between connection attempts.
    pub fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    pub fn tmp_path(&self) -> &Path {
        &self.tmp_path
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    pub fn modules_dir(&self) -> &Path {
        &self.modules_dir
    }

    // --- Connection ---

    /// Connects to the daemon socket, trying at most `max_attempts` times.
    ///
    /// A single close-on-exec socket is reused for every attempt, with a fixed
    /// pause between failures. The socket is closed if every attempt fails.
    pub fn connect(&self, max_attempts: u8) -> Result<UnixStream> {
        let addr = SocketAddrUnix::new(self.socket_path.as_path())
            .with_context(|| format!("Invalid socket path {}", self.socket_path.display()))?;
        let socket = socket_with(
            AddressFamily::UNIX,
            SocketType::STREAM,
            SocketFlags::CLOEXEC,
            None,
        )
        .context("Failed to create socket")?;

        let mut last_error = None;
        for attempt in 1..=max_attempts {
            match connect(&socket, &addr) {
                Ok(()) => {
                    trace!("Connected to zygiskd on attempt {}", attempt);
                    return Ok(UnixStream::from(socket));
                }
                Err(errno) => {
                    if attempt < max_attempts {
                        warn!(
                            "Retrying to connect to zygiskd ({}), sleep {:?}",
                            errno, self.retry_interval
                        );
                        thread::sleep(self.retry_interval);
                    }
                    last_error = Some(errno);
                }
            }
        }

        match last_error {
            Some(errno) => Err(io::Error::from(errno)).with_context(|| {
                format!(
                    "Failed to connect to {} after {} attempt(s)",
                    self.socket_path.display(),
                    max_attempts
                )
            }),
            None => bail!("No connection attempts requested"),
        }
    }

    /// Runs one request: connect, send `action`, then let `exchange` handle the rest.
    ///
    /// The connection is dropped, and therefore closed, on every return path.
    fn request<T>(
        &self,
        action: SocketAction,
        max_attempts: u8,
        exchange: impl FnOnce(&mut UnixStream) -> Result<T>,
    ) -> Result<T> {
        let mut stream = self.connect(max_attempts)?;
        stream
            .write_u8(action.into())
            .with_context(|| format!("Failed to send {:?}", action))?;
        exchange(&mut stream)
    }

    // --- Operations ---

    /// Tells the daemon that Zygote has been injected.
    pub fn ping_heartbeat(&self) -> bool {
        let action = SocketAction::PingHeartbeat;
        settle(action, self.request(action, HEARTBEAT_ATTEMPTS, |_| Ok(()))).is_some()
    }

    /// Fetches the flags the daemon assigns to processes running as `uid`.
    pub fn get_process_flags(&self, uid: u32) -> ProcessFlags {
        let action = SocketAction::GetProcessFlags;
        let result = self.request(action, QUERY_ATTEMPTS, |stream| {
            stream.write_u32(uid)?;
            let bits = stream.read_u32()?;
            Ok(ProcessFlags::from_bits_retain(bits))
        });
        settle(action, result).unwrap_or(ProcessFlags::empty())
    }

    /// Lists the module libraries the daemon has loaded.
    pub fn read_modules(&self) -> Vec<ModuleInfo> {
        let action = SocketAction::ReadModules;
        let result = self.request(action, QUERY_ATTEMPTS, |stream| {
            let count = stream.read_usize()?;
            let mut modules = Vec::new();
            modules.try_reserve(count)?;
            for i in 0..count {
                let path = stream
                    .read_string()
                    .with_context(|| format!("Failed to read path of module #{}", i))?;
                let name = stream
                    .read_string()
                    .with_context(|| format!("Failed to read name of module #{}", i))?;
                modules.push(ModuleInfo { path, name });
            }
            Ok(modules)
        });
        settle(action, result).unwrap_or_default()
    }

    /// Asks for a socket connected to the companion process of module `index`.
    pub fn connect_companion(&self, index: usize) -> Option<UnixStream> {
        let action = SocketAction::RequestCompanionSocket;
        let result = self.request(action, QUERY_ATTEMPTS, |stream| {
            stream.write_usize(index)?;
            match stream.read_u8()? {
                COMPANION_OK => {
                    let fd = stream
                        .recv_fd()
                        .context("Failed to receive companion socket")?;
                    Ok(Some(UnixStream::from(fd)))
                }
                status => {
                    debug!("No companion for module #{} (status {})", index, status);
                    Ok(None)
                }
            }
        });
        settle(action, result).flatten()
    }

    /// Obtains a descriptor for the installation directory of module `index`.
    pub fn get_module_dir(&self, index: usize) -> Option<OwnedFd> {
        let action = SocketAction::GetModuleDir;
        let result = self.request(action, QUERY_ATTEMPTS, |stream| {
            stream.write_usize(index)?;
            stream.recv_fd()
        });
        settle(action, result)
    }

    /// Notifies the daemon that Zygote restarted.
    pub fn zygote_restart(&self) {
        let action = SocketAction::ZygoteRestart;
        if let Err(e) = self.request(action, QUERY_ATTEMPTS, |_| Ok(())) {
            if is_not_found(&e) {
                debug!("Could not notify ZygoteRestart (maybe it hasn't been created)");
            } else {
                warn!("Could not notify ZygoteRestart: {:#}", e);
            }
        }
    }

    /// Notifies the daemon that `system_server` is up.
    pub fn system_server_started(&self) {
        let action = SocketAction::SystemServerStarted;
        settle(action, self.request(action, QUERY_ATTEMPTS, |_| Ok(())));
    }

    /// Takes a status snapshot of the daemon.
    ///
    /// Module ids are replaced by the `name=` entry of their `module.prop` when
    /// one can be found under the modules directory.
    pub fn get_info(&self) -> ZygoteInfo {
        let action = SocketAction::GetInfo;
        let result = self.request(action, QUERY_ATTEMPTS, |stream| self.read_info(stream));
        settle(action, result).unwrap_or_default()
    }

    fn read_info(&self, stream: &mut UnixStream) -> Result<ZygoteInfo> {
        let flags = ProcessFlags::from_bits_retain(stream.read_u32()?);
        let pid = stream.read_u32()?;
        let count = stream.read_usize()?;

        let mut modules = Vec::new();
        modules.try_reserve(count)?;
        for i in 0..count {
            let id = stream
                .read_string()
                .with_context(|| format!("Failed to read module #{}", i))?;
            modules.push(module::display_name(&self.modules_dir, &id));
        }

        Ok(ZygoteInfo {
            running: true,
            root_impl: RootImpl::from_flags(flags),
            pid,
            modules,
        })
    }

    /// Asks the daemon for a handle on the `state` mount namespace.
    ///
    /// Returns a `/proc/<pid>/fd/<fd>` path into the daemon's descriptor table.
    /// It stays valid only while the daemon keeps that descriptor open.
    pub fn update_mount_namespace(&self, state: MountNamespace) -> Option<PathBuf> {
        let action = SocketAction::UpdateMountNamespace;
        let result = self.request(action, QUERY_ATTEMPTS, |stream| {
            stream.write_u32(std::process::id())?;
            stream.write_u8(state.into())?;

            let target_pid = stream.read_u32()?;
            if target_pid == 0 {
                bail!("Daemon has no {:?} namespace", state);
            }
            let target_fd = stream.read_u32()?;
            mount::namespace_fd_path(target_pid, target_fd)
                .with_context(|| format!("Daemon has no {:?} namespace descriptor", state))
        });
        settle(action, result)
    }
}

/// Logs a failed request and discards the error.
fn settle<T>(action: SocketAction, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("{:?} failed: {:#}", action, e);
            None
        }
    }
}

fn is_not_found(e: &anyhow::Error) -> bool {
    e.chain().any(|cause| {
        cause
            .downcast_ref::<io::Error>()
            .is_some_and(|e| e.kind() == io::ErrorKind::NotFound)
    })
}
