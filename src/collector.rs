use crate::config::Config;
use crate::probe;
use crate::progress::CompletionCounter;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProbeKind {
    OutboundRoute,
    PublicIp,
    Command,
}

/// Results of one full collection run, slot-addressed by configuration index.
///
/// Each array is pre-sized to its probe kind's target count; slot `i` holds
/// the result for the `i`-th configured input of that kind, regardless of the
/// order tasks actually finished in. Empty string means the probe degraded.
#[derive(Debug, Clone, Default)]
pub struct CollectedResults {
    pub outbound: Vec<String>,
    pub public_ip: Vec<String>,
    pub command: Vec<String>,
}

/// Run every configured probe concurrently and gather the results.
///
/// One tokio task per probe, all dispatched up front into a `JoinSet`. Each
/// task races its probe against `cancel` and a per-probe `timeout` bound,
/// increments the shared counter exactly once (success, failure, timeout or
/// cancellation alike), and reports `(kind, slot, result)` back. Draining the
/// JoinSet is the join barrier: no result slot is read until every task has
/// been joined. The counter is advisory for progress display and plays no
/// part in the barrier.
pub async fn collect(
    config: &Config,
    os: &str,
    counter: CompletionCounter,
    cancel: CancellationToken,
    timeout: Duration,
) -> CollectedResults {
    let commands = config.commands_for_os(os);
    let mut results = CollectedResults {
        outbound: vec![String::new(); config.outbound_targets.len()],
        public_ip: vec![String::new(); config.public_sites.len()],
        command: vec![String::new(); commands.len()],
    };

    // One client shared by all public-IP probes; its request timeout is that
    // probe kind's bound.
    let client = probe::http_client(timeout);

    let mut set: JoinSet<(ProbeKind, usize, String)> = JoinSet::new();

    for (index, target) in config.outbound_targets.iter().enumerate() {
        let target = target.clone();
        let counter = counter.clone();
        let cancel = cancel.clone();
        set.spawn(async move {
            let result = bounded(probe::outbound_route(&target), timeout, &cancel).await;
            counter.increment();
            (ProbeKind::OutboundRoute, index, result)
        });
    }

    for (index, site) in config.public_sites.iter().enumerate() {
        let site = site.clone();
        let client = client.clone();
        let counter = counter.clone();
        let cancel = cancel.clone();
        set.spawn(async move {
            let result = bounded(probe::public_ip(&client, &site), timeout, &cancel).await;
            counter.increment();
            (ProbeKind::PublicIp, index, result)
        });
    }

    for (index, command) in commands.iter().enumerate() {
        let command = command.clone();
        let counter = counter.clone();
        let cancel = cancel.clone();
        set.spawn(async move {
            let result = bounded(probe::command_output(&command), timeout, &cancel).await;
            counter.increment();
            (ProbeKind::Command, index, result)
        });
    }

    // Join barrier: wait for every dispatched task, then place each result
    // into its fixed slot. Completion order is irrelevant here.
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((kind, index, result)) => {
                let slot = match kind {
                    ProbeKind::OutboundRoute => &mut results.outbound[index],
                    ProbeKind::PublicIp => &mut results.public_ip[index],
                    ProbeKind::Command => &mut results.command[index],
                };
                *slot = result;
            }
            Err(e) => eprintln!("probe task failed to join: {e}"),
        }
    }

    results
}

/// Race a probe against cancellation and the per-probe timeout. Either bound
/// firing degrades the probe to an empty result.
async fn bounded<F>(fut: F, bound: Duration, cancel: &CancellationToken) -> String
where
    F: Future<Output = String>,
{
    tokio::select! {
        _ = cancel.cancelled() => probe::DEGRADED.to_string(),
        res = time::timeout(bound, fut) => res.unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config_str;

    fn test_config(json: &str) -> Config {
        parse_config_str(json).expect("valid test config")
    }

    #[tokio::test]
    async fn counter_matches_total_after_barrier() {
        let cfg = test_config(
            r#"{
                "outbound_targets": ["127.0.0.1"],
                "public_sites": [],
                "commands": {"testos": ["echo one", "echo two"]}
            }"#,
        );
        let counter = CompletionCounter::new();
        let total = cfg.total_probes("testos") as u64;
        collect(
            &cfg,
            "testos",
            counter.clone(),
            CancellationToken::new(),
            Duration::from_secs(5),
        )
        .await;
        assert_eq!(counter.snapshot(), total);
    }

    #[tokio::test]
    async fn results_land_in_configuration_order() {
        // Stagger runtimes so completion order differs from config order.
        let cfg = test_config(
            r#"{
                "outbound_targets": [],
                "public_sites": [],
                "commands": {"testos": ["sleep 0.2", "echo first", "echo second"]}
            }"#,
        );
        let results = collect(
            &cfg,
            "testos",
            CompletionCounter::new(),
            CancellationToken::new(),
            Duration::from_secs(5),
        )
        .await;
        assert_eq!(results.command[0], "");
        assert_eq!(results.command[1], "first\n");
        assert_eq!(results.command[2], "second\n");
    }

    #[tokio::test]
    async fn unknown_os_dispatches_no_command_tasks() {
        let cfg = test_config(
            r#"{
                "outbound_targets": ["127.0.0.1"],
                "public_sites": [],
                "commands": {"linux": ["echo hi"]}
            }"#,
        );
        let counter = CompletionCounter::new();
        let results = collect(
            &cfg,
            "plan9",
            counter.clone(),
            CancellationToken::new(),
            Duration::from_secs(5),
        )
        .await;
        assert!(results.command.is_empty());
        assert_eq!(counter.snapshot(), 1);
    }

    #[tokio::test]
    async fn timed_out_probe_degrades_but_still_counts() {
        let cfg = test_config(
            r#"{
                "outbound_targets": [],
                "public_sites": [],
                "commands": {"testos": ["sleep 5"]}
            }"#,
        );
        let counter = CompletionCounter::new();
        let results = collect(
            &cfg,
            "testos",
            counter.clone(),
            CancellationToken::new(),
            Duration::from_millis(50),
        )
        .await;
        assert_eq!(results.command[0], "");
        assert_eq!(counter.snapshot(), 1);
    }

    #[tokio::test]
    async fn cancelled_run_degrades_outstanding_probes() {
        let cfg = test_config(
            r#"{
                "outbound_targets": [],
                "public_sites": [],
                "commands": {"testos": ["sleep 5", "echo hi"]}
            }"#,
        );
        let counter = CompletionCounter::new();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let results = collect(
            &cfg,
            "testos",
            counter.clone(),
            cancel,
            Duration::from_secs(10),
        )
        .await;
        assert_eq!(results.command[0], "");
        assert_eq!(counter.snapshot(), 2);
    }
}
