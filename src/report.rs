use crate::collector::CollectedResults;
use crate::config::Config;
use crate::netinfo::HostIdentity;
use std::net::IpAddr;
use time::format_description::well_known::Rfc2822;
use time::OffsetDateTime;

/// Section separator used throughout the report.
pub const DIVIDER: &str =
    "______________________________________________________________________\n";

/// Assemble the final diagnostics report.
///
/// Deterministic and single-threaded; runs only after the collection barrier,
/// so every result slot is final. Section order and per-section line order
/// follow the configuration tables, never probe completion order. Degraded
/// results render as blank values in their lines.
pub fn assemble(
    identity: &HostIdentity,
    addrs: &[IpAddr],
    config: &Config,
    os: &str,
    results: &CollectedResults,
    timestamp: OffsetDateTime,
) -> String {
    let mut out = String::new();

    let ran_at = timestamp
        .format(&Rfc2822)
        .unwrap_or_else(|_| String::from("(unknown time)"));
    out.push_str(&format!("Diagnostics run on {ran_at}\n"));
    out.push_str(DIVIDER);

    out.push_str(&format!("HOSTNAME:          {}\n", identity.hostname));
    out.push_str(&format!("OPERATING SYSTEM:  {}\n", identity.os_platform));
    out.push_str(&format!("OS VERSION:        {}\n", identity.os_version));
    out.push_str(&format!("ARCHITECTURE:      {}\n\n", identity.architecture));
    out.push_str(DIVIDER);

    out.push_str("HOST INTERFACE IP ADDRESSES (SORTED):\n\n");
    for addr in addrs {
        out.push_str(&format!("{addr}\n"));
    }
    out.push('\n');
    out.push_str(DIVIDER);

    out.push_str("PREFERRED OUTBOUND IP (I.E., LOCAL INTERFACE)\n\n");
    for (index, target) in config.outbound_targets.iter().enumerate() {
        out.push_str(&format!("To {}:  {}\n", target, results.outbound[index]));
    }
    out.push('\n');
    out.push_str(DIVIDER);

    out.push_str("PUBLIC SITES:\n\n");
    for (index, site) in config.public_sites.iter().enumerate() {
        out.push_str(&format!(
            "{} sees this host coming from {}\n",
            site, results.public_ip[index]
        ));
    }
    out.push('\n');
    out.push_str(DIVIDER);

    for (index, command) in config.commands_for_os(os).iter().enumerate() {
        let captured = &results.command[index];
        out.push_str(&format!("OUTPUT FROM RUNNING '{command}':\n\n"));
        out.push_str(captured.strip_suffix('\n').unwrap_or(captured));
        out.push('\n');
        out.push('\n');
        out.push_str(DIVIDER);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config_str;

    fn fixture() -> (HostIdentity, Config, CollectedResults) {
        let identity = HostIdentity {
            hostname: "testbox".into(),
            os_platform: "Linux (linux)".into(),
            os_id: "linux".into(),
            os_version: "6.1".into(),
            architecture: "AMD/Intel x64 (x86_64)".into(),
        };
        let config = parse_config_str(
            r#"{
                "outbound_targets": ["8.8.8.8"],
                "public_sites": ["http://example/ip-echo"],
                "commands": {"linux": ["echo hi"]}
            }"#,
        )
        .unwrap();
        let results = CollectedResults {
            outbound: vec!["192.168.1.5".into()],
            public_ip: vec!["203.0.113.5".into()],
            command: vec!["hi\n".into()],
        };
        (identity, config, results)
    }

    #[test]
    fn report_contains_expected_lines() {
        let (identity, config, results) = fixture();
        let report = assemble(
            &identity,
            &[],
            &config,
            "linux",
            &results,
            OffsetDateTime::UNIX_EPOCH,
        );
        assert!(report.contains("To 8.8.8.8:  192.168.1.5\n"));
        assert!(report.contains("http://example/ip-echo sees this host coming from 203.0.113.5\n"));
        assert!(report.contains("OUTPUT FROM RUNNING 'echo hi':\n\nhi\n"));
        assert!(report.contains("HOSTNAME:          testbox\n"));
    }

    #[test]
    fn command_output_trailing_newline_is_trimmed() {
        let (identity, config, mut results) = fixture();
        results.command[0] = "hi\n".into();
        let report = assemble(
            &identity,
            &[],
            &config,
            "linux",
            &results,
            OffsetDateTime::UNIX_EPOCH,
        );
        // One newline from trimming + block spacing, not two from the output.
        assert!(report.contains("hi\n\n______"));
    }

    #[test]
    fn degraded_results_render_blank_not_missing() {
        let (identity, config, mut results) = fixture();
        results.outbound[0] = String::new();
        let report = assemble(
            &identity,
            &[],
            &config,
            "linux",
            &results,
            OffsetDateTime::UNIX_EPOCH,
        );
        assert!(report.contains("To 8.8.8.8:  \n"));
    }

    #[test]
    fn unknown_os_yields_empty_command_section() {
        let (identity, config, _) = fixture();
        let results = CollectedResults {
            outbound: vec!["192.168.1.5".into()],
            public_ip: vec!["203.0.113.5".into()],
            command: vec![],
        };
        let report = assemble(
            &identity,
            &[],
            &config,
            "plan9",
            &results,
            OffsetDateTime::UNIX_EPOCH,
        );
        assert!(!report.contains("OUTPUT FROM RUNNING"));
    }

    #[test]
    fn assembly_is_deterministic() {
        let (identity, config, results) = fixture();
        let addrs = vec!["10.0.0.1".parse().unwrap(), "127.0.0.1".parse().unwrap()];
        let a = assemble(
            &identity,
            &addrs,
            &config,
            "linux",
            &results,
            OffsetDateTime::UNIX_EPOCH,
        );
        let b = assemble(
            &identity,
            &addrs,
            &config,
            "linux",
            &results,
            OffsetDateTime::UNIX_EPOCH,
        );
        assert_eq!(a, b);
    }

    #[test]
    fn sections_appear_in_fixed_order() {
        let (identity, config, results) = fixture();
        let report = assemble(
            &identity,
            &[],
            &config,
            "linux",
            &results,
            OffsetDateTime::UNIX_EPOCH,
        );
        let host = report.find("HOSTNAME:").unwrap();
        let ifaces = report.find("HOST INTERFACE IP ADDRESSES").unwrap();
        let routing = report.find("PREFERRED OUTBOUND IP").unwrap();
        let public = report.find("PUBLIC SITES:").unwrap();
        let commands = report.find("OUTPUT FROM RUNNING").unwrap();
        assert!(host < ifaces && ifaces < routing && routing < public && public < commands);
    }
}
