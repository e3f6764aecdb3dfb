use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use net_diag_rs::{collector, config, netinfo, progress, report, server};

use anyhow::{Context, Result};
use clap::Parser;
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;

/// net-diag-rs — Concurrent host network-diagnostics collector with a
/// deterministic text report and a tiny embedded web UI.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "net-diag-rs",
    version,
    about = "Gathers outbound-route, public-IP, interface and command diagnostics into one report.",
    long_about = None
)]
struct Cli {
    /// Path to a JSON config with outbound targets, public sites and
    /// OS-keyed commands. Missing sections use built-in defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Per-probe timeout in milliseconds. A probe exceeding it yields an
    /// empty result instead of blocking the run.
    #[arg(long = "timeout-ms", default_value_t = 10_000)]
    timeout_ms: u64,

    /// Write the assembled report to this path as well as stdout.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Start the embedded HTTP UI server (progress + report endpoints).
    #[arg(long = "serve-ui", default_value_t = false)]
    serve_ui: bool,

    /// Skip the confirmation prompt and start collecting immediately.
    #[arg(long, short = 'y', default_value_t = false)]
    yes: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let cfg = match cli.config.as_deref() {
        Some(path) => config::load_config_from_path(path)?,
        None => config::Config::default(),
    };
    let os = std::env::consts::OS;
    let total = cfg.total_probes(os);

    // Confirmation gate: show every action before anything runs. Declining
    // ends the process without dispatching a single probe.
    println!("The following information will be collected:");
    for action in cfg.collection_plan(os) {
        println!("  - {action}");
    }
    if !cli.yes && !confirm("Proceed? [y/N] ")? {
        println!("Collection declined; nothing was run.");
        return Ok(());
    }

    // Synchronous, probe-free facts gathered up front.
    let identity = netinfo::HostIdentity::collect();
    let mut addrs = netinfo::interface_addrs();
    netinfo::sort_addrs(&mut addrs);

    let counter = progress::CompletionCounter::new();
    let cancel = CancellationToken::new();

    // Ctrl-C cancels outstanding probes; they degrade rather than hang the
    // barrier.
    let cancel_ctrlc = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        cancel_ctrlc.cancel();
    });

    // Optional embedded UI, fed the same advisory progress as the console.
    let ui_state = if cli.serve_ui {
        let state = server::AppState::new(total as u64);
        let bind = "127.0.0.1:8080";
        let srv_state = state.clone();
        tokio::spawn(async move {
            if let Err(e) = server::spawn_server(bind, srv_state).await {
                eprintln!("HTTP UI server error: {e}");
            }
        });
        Some(state)
    } else {
        None
    };

    // Background progress reporter: polls the completion counter and
    // publishes a fraction until it reaches 1.0. Advisory only; the collect
    // call below is what actually waits for the probes.
    let mut progress_rx =
        progress::spawn_progress_reporter(counter.clone(), total as u64, progress::POLL_INTERVAL);
    let display_counter = counter.clone();
    let display_state = ui_state.clone();
    tokio::spawn(async move {
        while progress_rx.changed().await.is_ok() {
            let fraction = *progress_rx.borrow();
            print!("\rCollecting... {:3.0}%", fraction * 100.0);
            let _ = io::stdout().flush();
            if let Some(state) = display_state.as_ref() {
                state
                    .publish_progress(fraction, display_counter.snapshot())
                    .await;
            }
            if fraction >= 1.0 {
                break;
            }
        }
    });

    let results = collector::collect(
        &cfg,
        os,
        counter.clone(),
        cancel.clone(),
        Duration::from_millis(cli.timeout_ms),
    )
    .await;
    println!("\rCollecting... done.");

    let text = report::assemble(
        &identity,
        &addrs,
        &cfg,
        os,
        &results,
        OffsetDateTime::now_utc(),
    );

    println!("{text}");
    if let Some(path) = cli.output.as_deref() {
        std::fs::write(path, &text)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        println!("Wrote report to {}", path.display());
    }

    if let Some(state) = ui_state {
        state.publish_report(text).await;
        println!("Report available at http://127.0.0.1:8080/api/report (Ctrl+C to stop)...");
        let _ = tokio::signal::ctrl_c().await;
    }

    Ok(())
}

/// Prompt on stdout and read one line from stdin; `y`/`yes` means proceed.
fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let answer = line.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}
