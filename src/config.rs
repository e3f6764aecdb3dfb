use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Static configuration tables driving one collection run.
///
/// Three tables, all read-only once loaded:
/// - `outbound_targets`: hosts whose preferred outbound route we probe
/// - `public_sites`: plain-text IP echo services queried for our public IP
/// - `commands`: shell command lines keyed by OS identifier (`linux`,
///   `macos`, `windows`); an OS with no entry simply runs no commands
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_outbound_targets")]
    pub outbound_targets: Vec<String>,
    #[serde(default = "default_public_sites")]
    pub public_sites: Vec<String>,
    #[serde(default = "default_commands")]
    pub commands: HashMap<String, Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            outbound_targets: default_outbound_targets(),
            public_sites: default_public_sites(),
            commands: default_commands(),
        }
    }
}

fn default_outbound_targets() -> Vec<String> {
    vec!["8.8.8.8".into(), "1.1.1.1".into()]
}

fn default_public_sites() -> Vec<String> {
    vec![
        "https://api.ipify.org".into(),
        "https://icanhazip.com".into(),
    ]
}

fn default_commands() -> HashMap<String, Vec<String>> {
    let mut map = HashMap::new();
    map.insert(
        "linux".to_string(),
        vec![
            "ip addr".to_string(),
            "ip route".to_string(),
            "resolvectl status".to_string(),
        ],
    );
    map.insert(
        "macos".to_string(),
        vec![
            "ifconfig".to_string(),
            "netstat -rn".to_string(),
            "scutil --dns".to_string(),
        ],
    );
    map.insert(
        "windows".to_string(),
        vec!["ipconfig /all".to_string(), "route print".to_string()],
    );
    map
}

impl Config {
    /// Ordered command list for an OS identifier. Unknown OS yields no commands.
    pub fn commands_for_os(&self, os: &str) -> &[String] {
        self.commands.get(os).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of probes a run on the given OS will dispatch.
    pub fn total_probes(&self, os: &str) -> usize {
        self.outbound_targets.len() + self.public_sites.len() + self.commands_for_os(os).len()
    }

    /// Human-readable list of every action the run will perform, shown to the
    /// user at the confirmation gate before anything is dispatched.
    pub fn collection_plan(&self, os: &str) -> Vec<String> {
        let mut plan = Vec::with_capacity(self.total_probes(os));
        for target in &self.outbound_targets {
            plan.push(format!("Check outbound path to {target}"));
        }
        for site in &self.public_sites {
            plan.push(format!("Check source IP as seen from {site}"));
        }
        for command in self.commands_for_os(os) {
            plan.push(format!("Run command: {command}"));
        }
        plan
    }
}

/// Parse a JSON configuration. Missing sections fall back to the defaults.
pub fn parse_config_str(s: &str) -> Result<Config> {
    serde_json::from_str(s).context("invalid configuration JSON")
}

/// Load configuration tables from a file path. Errors if the file cannot be
/// read or parsed.
pub fn load_config_from_path(path: impl AsRef<Path>) -> Result<Config> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("failed to read config file: {}", path.as_ref().display()))?;
    parse_config_str(&content)
}

/// Load configuration from a file, or return the built-in tables if missing
/// or unreadable.
pub fn load_config_or_default(path: impl AsRef<Path>) -> Config {
    load_config_from_path(&path).unwrap_or_default()
}
