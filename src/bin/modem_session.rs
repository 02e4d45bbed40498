use clap::Parser;
use std::fs;
use std::path::PathBuf;
use tracing::{error, warn};
use vmodem_rs::link::TcpLink;
use vmodem_rs::session::{DEFAULT_SPEED_BPS, DEFAULT_TIMEOUT_MS, Session, SessionSpec};

#[derive(Debug, Parser)]
#[command(
    name = "modem-session",
    about = "Run one measurement session from session.json against a remote lab server"
)]
struct Args {
    /// Path to session.json
    #[arg(long)]
    session: PathBuf,

    /// Remote lab server address (host:port)
    #[arg(long)]
    addr: String,

    /// Directory for CSV and image outputs
    #[arg(long, default_value = "data")]
    out_dir: PathBuf,

    /// Shared session log file (one banner-bounded block appended per session)
    #[arg(long, default_value = "log.txt")]
    log_file: PathBuf,

    /// Override test duration (ms)
    #[arg(long)]
    duration_ms: Option<u64>,

    /// Override link speed (bps)
    #[arg(long)]
    speed_bps: Option<u32>,

    /// Write a machine-readable session summary JSON file
    #[arg(long)]
    summary_json: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();
    let raw = fs::read_to_string(&args.session).expect("read session.json");
    let mut spec: SessionSpec = serde_json::from_str(&raw).expect("parse session.json");

    if args.duration_ms.is_some() {
        spec.duration_ms = args.duration_ms;
    }
    if args.speed_bps.is_some() {
        spec.speed_bps = args.speed_bps;
    }

    let name = spec.name.clone().unwrap_or_else(|| "lab".to_string());
    let link = TcpLink::new(args.addr.clone());
    let mut session = Session::open(
        Box::new(link),
        &name,
        spec.speed_bps.unwrap_or(DEFAULT_SPEED_BPS),
        spec.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS),
        args.log_file.clone(),
    )
    .expect("open link");

    session.read_greeting();

    let outcome = session.run(&spec, &args.out_dir);
    match &outcome {
        Ok(summary) => {
            println!(
                "session_result action={} rounds={:?} acks={:?} nacks={:?} image_bytes={:?} traces={:?}",
                summary.action,
                summary.rounds,
                summary.acks_sent,
                summary.nacks_sent,
                summary.image_bytes,
                summary.traces_captured
            );
            if let Some(path) = &args.summary_json {
                let json = serde_json::to_string_pretty(summary).expect("serialize summary");
                match fs::write(path, json) {
                    Ok(()) => eprintln!("wrote session summary to {}", path.display()),
                    Err(e) => warn!(path = %path.display(), error = %e, "write summary json failed"),
                }
            }
        }
        Err(e) => error!(error = %e, "session aborted"),
    }

    session.finish();

    if outcome.is_err() {
        std::process::exit(1);
    }
}
