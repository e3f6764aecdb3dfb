use if_addrs::get_if_addrs;
use std::net::IpAddr;
use std::process::Command;

/// Collect every address bound to every interface, loopback included.
///
/// Enumeration failure is not an error condition for a diagnostics run; it
/// just produces an empty list. No network traffic, runs synchronously.
pub fn interface_addrs() -> Vec<IpAddr> {
    match get_if_addrs() {
        Ok(ifaces) => ifaces.into_iter().map(|iface| iface.ip()).collect(),
        Err(_) => Vec::new(),
    }
}

/// Sort addresses lexicographically by their raw byte sequence: 4 octets for
/// IPv4, 16 for IPv6. IPv4 addresses therefore sort in numeric order, and
/// mixed v4/v6 lists get a stable byte-wise interleaving.
pub fn sort_addrs(addrs: &mut [IpAddr]) {
    addrs.sort_by_key(addr_bytes);
}

fn addr_bytes(addr: &IpAddr) -> Vec<u8> {
    match addr {
        IpAddr::V4(v4) => v4.octets().to_vec(),
        IpAddr::V6(v6) => v6.octets().to_vec(),
    }
}

/// Identity facts about the host running the collection: who it is and what
/// it runs on. Gathered synchronously up front, before any probe dispatch.
#[derive(Debug, Clone)]
pub struct HostIdentity {
    pub hostname: String,
    /// Display name plus the raw identifier, e.g. `Linux (linux)`.
    pub os_platform: String,
    /// Raw `std::env::consts::OS` value; keys the command table.
    pub os_id: String,
    pub os_version: String,
    /// Display name plus the raw identifier, e.g. `AMD/Intel x64 (x86_64)`.
    pub architecture: String,
}

impl HostIdentity {
    pub fn collect() -> Self {
        let os_id = std::env::consts::OS.to_string();
        let arch_id = std::env::consts::ARCH;
        Self {
            hostname: hostname(),
            os_platform: format!("{} ({})", os_display_name(&os_id), os_id),
            os_id,
            os_version: os_info::get().version().to_string(),
            architecture: format!("{} ({})", arch_display_name(arch_id), arch_id),
        }
    }
}

fn os_display_name(os: &str) -> &'static str {
    match os {
        "macos" => "Apple macOS",
        "linux" => "Linux",
        "windows" => "Microsoft Windows",
        _ => "Unknown OS",
    }
}

fn arch_display_name(arch: &str) -> &'static str {
    match arch {
        "x86_64" => "AMD/Intel x64",
        "aarch64" => "ARM 64-bit",
        _ => "Unknown architecture",
    }
}

fn hostname() -> String {
    std::env::var("HOSTNAME")
        .or_else(|_| {
            Command::new("hostname")
                .output()
                .map(|out| String::from_utf8_lossy(&out.stdout).trim().to_string())
                .map_err(|_| std::env::VarError::NotPresent)
        })
        .unwrap_or_default()
}
