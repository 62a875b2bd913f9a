// lanprobe - sweep local subnets for hosts with a TCP port open

use anyhow::Context;
use lanprobe::cli::Args;
use lanprobe::config::AppSettings;
use lanprobe::interfaces;
use lanprobe::output;
use lanprobe::scanner::{build_session, ConsoleSink, SessionExit};
use std::process;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = Args::parse_normalized();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(args).await {
        Ok(exit) => {
            info!(?exit, "exiting");
            // In-flight probes (if interrupted) are abandoned; the OS reclaims their sockets.
            process::exit(0);
        }
        Err(e) => {
            output::print_error(&format!("{e:#}"));
            process::exit(1);
        }
    }
}

async fn run(args: Args) -> anyhow::Result<SessionExit> {
    // Registered before any setup so an early Ctrl+C still ends with status 0.
    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    let file_settings = match &args.config {
        Some(path) => AppSettings::load_from(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => AppSettings::load().context("loading settings")?,
    };
    let settings = file_settings.resolve(&args.overrides())?;

    let segments = if args.segments.is_empty() {
        interfaces::local_segments().context("failed to enumerate network interfaces")?
    } else {
        args.segments.clone()
    };

    let port = args.port.as_u16();
    output::print_scan_header(port, segments.len());
    if segments.is_empty() {
        output::print_info("No IPv4 segments to scan.");
    }

    let session = build_session(&settings, Arc::new(ConsoleSink));
    Ok(session.run(&segments, port, &cancel).await)
}

/// Register the SIGINT handler (and SIGTERM on unix) now, and cancel `cancel`
/// when either signal arrives.
fn spawn_interrupt_handler(cancel: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
            (Ok(mut interrupt), Ok(mut terminate)) => {
                tokio::spawn(async move {
                    tokio::select! {
                        _ = interrupt.recv() => {}
                        _ = terminate.recv() => {}
                    }
                    interrupted(&cancel);
                });
                return;
            }
            (Err(e), _) | (_, Err(e)) => tracing::warn!(error = %e, "signal handler unavailable"),
        }
    }

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => interrupted(&cancel),
            Err(e) => tracing::warn!(error = %e, "interrupt handler unavailable"),
        }
    });
}

fn interrupted(cancel: &CancellationToken) {
    println!("\n\r- Ctrl+C pressed in Terminal");
    cancel.cancel();
}
