use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::process::Command;

/// Port appended to outbound targets that carry none. Route selection only
/// needs a nominal port; no datagram is ever sent.
const DEFAULT_OUTBOUND_PORT: u16 = 80;

/// Probe failures never surface as errors; a probe that cannot produce a
/// value yields an empty string and the run carries on. The report renders
/// the blank as-is.
pub const DEGRADED: &str = "";

/// Determine the preferred outbound (local) IP toward `target`.
///
/// "Connects" a UDP socket to the target, which makes the OS consult its
/// routing table and bind a local source address without sending any
/// traffic, then reads that address back. A target without a port gets
/// `:80` appended; targets already carrying a port (or `host:port` forms)
/// are used verbatim.
pub async fn outbound_route(target: &str) -> String {
    let endpoint = if target.contains(':') {
        target.to_string()
    } else {
        format!("{target}:{DEFAULT_OUTBOUND_PORT}")
    };

    let socket = match UdpSocket::bind("0.0.0.0:0").await {
        Ok(s) => s,
        Err(_) => return DEGRADED.to_string(),
    };
    if socket.connect(&endpoint).await.is_err() {
        return DEGRADED.to_string();
    }
    match socket.local_addr() {
        Ok(addr) => addr.ip().to_string(),
        Err(_) => DEGRADED.to_string(),
    }
}

/// Ask a plain-text IP echo service which address this host appears to come
/// from. Reads the full body and trims a single trailing newline.
///
/// Unlike the other probes this one crosses the open internet, but the
/// failure policy is the same: any transport error degrades to an empty
/// result rather than aborting the run.
pub async fn public_ip(client: &reqwest::Client, url: &str) -> String {
    let body = match client.get(url).send().await {
        Ok(resp) => match resp.error_for_status() {
            Ok(resp) => resp.text().await.unwrap_or_default(),
            Err(_) => return DEGRADED.to_string(),
        },
        Err(_) => return DEGRADED.to_string(),
    };
    body.strip_suffix('\n').unwrap_or(&body).to_string()
}

/// Run one configured command line to completion and capture stdout.
///
/// The line is tokenized on whitespace: first token is the executable
/// (resolved via PATH), the rest are arguments. No shell is involved, so
/// quoting and metacharacters are not interpreted. A command that fails to
/// start or exits non-zero yields an empty result; error details are not
/// surfaced.
pub async fn command_output(line: &str) -> String {
    let mut tokens = line.split_whitespace();
    let Some(program) = tokens.next() else {
        return DEGRADED.to_string();
    };
    match Command::new(program).args(tokens).output().await {
        Ok(out) if out.status.success() => String::from_utf8_lossy(&out.stdout).into_owned(),
        _ => DEGRADED.to_string(),
    }
}

/// Build the shared HTTP client used by all public-IP probes in a run.
/// The request timeout doubles as this probe kind's per-probe bound.
pub fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}
