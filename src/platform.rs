//! Platform probes used by engine availability checks

use log::debug;
use std::fs;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Maximum length of the device identifier sent to synthesis providers
pub const DEVICE_ID_MAX_LEN: usize = 32;

/// Find an executable on `PATH`
///
/// Absolute or relative paths containing a separator are checked directly.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    if name.contains(std::path::MAIN_SEPARATOR) {
        let path = PathBuf::from(name);
        return is_executable(&path).then_some(path);
    }

    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

/// Check whether an executable is installed
pub fn check_executable(name: &str) -> bool {
    let found = find_executable(name);
    debug!("Executable '{}' lookup: {:?}", name, found);
    found.is_some()
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Check that `host:port` accepts a TCP connection within `timeout`
pub fn check_network_connection(host: &str, timeout: Duration) -> bool {
    let addrs = match host.to_socket_addrs() {
        Ok(addrs) => addrs,
        Err(e) => {
            debug!("Could not resolve {}: {}", host, e);
            return false;
        }
    };

    for addr in addrs {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(_) => return true,
            Err(e) => debug!("Connection to {} failed: {}", addr, e),
        }
    }
    false
}

/// Identifier of this device, at most [`DEVICE_ID_MAX_LEN`] characters
///
/// Uses /etc/machine-id when readable and a random UUID otherwise.
pub fn device_id() -> String {
    let id = fs::read_to_string("/etc/machine-id")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());

    truncate_device_id(&id)
}

/// Clip an identifier to the provider's length limit
pub fn truncate_device_id(id: &str) -> String {
    id.chars().take(DEVICE_ID_MAX_LEN).collect()
}
