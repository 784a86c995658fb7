// src/lib.rs

//! Client library for the NeoZygisk daemon control socket.
//!
//! Code injected into Zygote talks to `zygiskd` over a Unix domain socket
//! living in the daemon's temporary directory. Each request is a single
//! action byte followed by a small binary payload; replies may carry file
//! descriptors passed as `SCM_RIGHTS`.
//!
//! ```no_run
//! use zygisk_loader::DaemonClient;
//!
//! let client = DaemonClient::new("/debug_ramdisk/zygisksu");
//! if client.ping_heartbeat() {
//!     for module in client.read_modules() {
//!         println!("{} -> {}", module.name, module.path);
//!     }
//! }
//! ```

pub mod client;
pub mod constants;
pub mod module;
pub mod mount;
pub mod root_impl;
pub mod utils;

pub use client::{DaemonClient, ZygoteInfo};
pub use constants::{ProcessFlags, SocketAction};
pub use module::ModuleInfo;
pub use mount::MountNamespace;
pub use root_impl::RootImpl;
pub use utils::UnixStreamExt;

/// Initializes the Android logger with a specific tag.
///
/// Safe to call more than once; only the first call takes effect.
pub fn init_logger(tag: &str) {
    android_logger::init_once(
        android_logger::Config::default()
            .with_max_level(constants::MAX_LOG_LEVEL)
            .with_tag(tag),
    );
}
