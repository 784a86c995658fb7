// src/main.rs

//! `zygisk-ctl`: a small diagnostic front-end for the daemon control socket.
//!
//! The daemon's temporary directory is taken from the `TMP_PATH` environment
//! variable. Supported commands:
//! - `ping`: sends a heartbeat.
//! - `flags <uid>`: prints the process flags for a uid.
//! - `modules`: lists the loaded module libraries.
//! - `info`: prints the daemon status snapshot.
//! - `version`: prints the client version.

use log::error;
use zygisk_loader::{DaemonClient, init_logger};

const USAGE: &str = "usage: zygisk-ctl <ping|flags <uid>|modules|info|version>";

/// Parses command-line arguments and dispatches to the correct query.
fn start() {
    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str);

    if command == Some("version") {
        println!("zygisk-ctl {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let client = match DaemonClient::from_env() {
        Ok(client) => client,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("{:#}", e);
            return;
        }
    };

    match command {
        Some("ping") => {
            println!("{}", if client.ping_heartbeat() { "alive" } else { "unreachable" });
        }
        Some("flags") => match args.get(2).map(|uid| uid.parse::<u32>()) {
            Some(Ok(uid)) => {
                let flags = client.get_process_flags(uid);
                println!("{:#010x} {:?}", flags.bits(), flags);
            }
            Some(Err(_)) => error!("flags: Invalid uid provided."),
            None => error!("flags: Missing uid argument."),
        },
        Some("modules") => {
            for (index, module) in client.read_modules().iter().enumerate() {
                println!("{}\t{}\t{}", index, module.name, module.path);
            }
        }
        Some("info") => {
            let info = client.get_info();
            if !info.running {
                println!("daemon: not running");
                return;
            }
            println!("daemon: running (pid {})", info.pid);
            println!("root: {:?}", info.root_impl);
            for name in &info.modules {
                println!("module: {}", name);
            }
        }
        _ => eprintln!("{}", USAGE),
    }
}

fn main() {
    // Use the binary name as the log tag.
    let arg0 = std::env::args().next().unwrap_or_default();
    let process_name = arg0.split('/').next_back().unwrap_or("zygisk-ctl");
    init_logger(process_name);

    start();
}
