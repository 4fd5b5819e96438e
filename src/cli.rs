use crate::client::{RedashClient, ScaleoutTransport};
use crate::config::{self, AppConfig};
use crate::flow::ScaleoutFlow;
use crate::metadata::{QueryMetadataFormatter, QueryResultSnapshot};
use crate::model::{
    DurationHours, FlowEvent, FlowReport, FlowStatus, RequestShape, ScaleLevel, ToastKind,
};
use crate::orchestrator::{run_controller, FlowCommand};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                    let _ = err.flush();
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "trino-scaleout",
    version,
    about = "Request a temporary Trino scale-out and inspect query metadata, with optional TUI"
)]
pub struct Cli {
    /// Config file (default: <config dir>/trino-scaleout/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the Redash server
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// API key sent as `Authorization: Key <key>`
    #[arg(long, global = true, env = "TRINO_SCALEOUT_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Print JSON result and exit (no TUI)
    #[arg(long, global = true)]
    pub json: bool,

    /// Print text output and exit (no TUI)
    #[arg(long, global = true)]
    pub text: bool,

    /// Request body shape expected by the server: level, size or empty
    #[arg(long)]
    pub shape: Option<RequestShape>,

    /// Performance level: LIGHT, STANDARD or MAXIMUM
    #[arg(long)]
    pub level: Option<ScaleLevel>,

    /// Number of workers to add (size shape)
    #[arg(long)]
    pub size: Option<u32>,

    /// Time until the scale-out expires, e.g. 30m, 2h or 0.5 (hours)
    #[arg(long)]
    pub hours: Option<DurationHours>,

    /// Submit without a confirmation step
    #[arg(long)]
    pub no_confirm: bool,

    /// Answer yes to the confirmation prompt (text/JSON modes)
    #[arg(long)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Show execution metadata (rows, runtime, cost, refresh time) for a query result
    Metadata(MetadataArgs),
}

#[derive(Debug, Args, Clone)]
pub struct MetadataArgs {
    /// Query result JSON as returned by /api/query_results/<id>
    #[arg(long, conflicts_with = "id", required_unless_present = "id")]
    pub file: Option<PathBuf>,

    /// Fetch the query result with this id from the server
    #[arg(long)]
    pub id: Option<u64>,

    /// The query is still executing
    #[arg(long)]
    pub executing: bool,
}

impl Cli {
    /// Whether this invocation takes over the terminal.
    pub fn uses_tui(&self) -> bool {
        cfg!(feature = "tui") && self.command.is_none() && !self.json && !self.text
    }
}

pub async fn run(args: Cli) -> Result<()> {
    if args.json && args.text {
        return Err(anyhow::anyhow!("--json and --text cannot be used together"));
    }

    let cfg = build_config(&args)?;

    if let Some(Command::Metadata(m)) = &args.command {
        return run_metadata(&args, m, &cfg).await;
    }

    if !args.json && !args.text {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(cfg).await;
        }
        #[cfg(not(feature = "tui"))]
        {
            // Fallback when built without TUI support.
            return run_text(args, cfg).await;
        }
    }

    run_text(args, cfg).await
}

/// Load the config file and apply CLI overrides on top.
pub fn build_config(args: &Cli) -> Result<AppConfig> {
    let mut cfg = config::load_or_default(args.config.as_deref()).context("load config")?;
    if let Some(url) = args.base_url.as_ref() {
        cfg.base_url = url.clone();
    }
    if let Some(key) = args.api_key.as_ref() {
        cfg.api_key = Some(key.clone());
    }
    if let Some(shape) = args.shape {
        cfg.scaleout.shape = shape;
    }
    if let Some(level) = args.level {
        cfg.scaleout.default_level = level;
    }
    if let Some(size) = args.size {
        cfg.scaleout.default_size = size;
    }
    if let Some(hours) = args.hours {
        cfg.scaleout.default_duration = hours;
    }
    if args.no_confirm {
        cfg.scaleout.confirm = false;
    }
    cfg.validate().context("invalid options")?;
    Ok(cfg)
}

/// Ask on stderr, read one line from stdin.
async fn prompt_confirm(out_tx: &mpsc::UnboundedSender<OutputLine>) -> Result<bool> {
    let _ = out_tx.send(OutputLine::Stderr("Proceed with scale-out? [y/N]".into()));
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    let answer = lines.next_line().await.context("read confirmation")?;
    Ok(matches!(
        answer.as_deref().map(str::trim),
        Some("y") | Some("Y") | Some("yes") | Some("YES")
    ))
}

/// Drive the flow without a UI: apply, confirm (prompt or --yes), report.
async fn run_text(args: Cli, cfg: AppConfig) -> Result<()> {
    let mut settings = cfg.scaleout.clone();
    // No panel to show outside the TUI: report success and exit right away.
    settings.success_close_delay = Duration::ZERO;
    let flow = ScaleoutFlow::new(settings);
    let transport: Arc<dyn ScaleoutTransport> = Arc::new(RedashClient::new(&cfg)?);

    let (out_tx, out_handle) = spawn_output_writer();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<FlowEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<FlowCommand>();
    let controller = tokio::spawn(run_controller(flow, transport, event_tx, cmd_rx));

    // Installed once a request is in flight so Ctrl-C waits for its outcome.
    let mut ctrl_c: Option<tokio::task::JoinHandle<()>> = None;

    let _ = cmd_tx.send(FlowCommand::Apply);

    let mut prompted = false;
    let mut report: Option<FlowReport> = None;
    while let Some(ev) = event_rx.recv().await {
        match ev {
            FlowEvent::Updated(view) => match view.status {
                FlowStatus::AwaitingConfirmation if !prompted => {
                    prompted = true;
                    for line in crate::text_summary::build_confirmation_summary(&view).lines {
                        let _ = out_tx.send(OutputLine::Stderr(line));
                    }
                    let confirmed = args.yes || prompt_confirm(&out_tx).await?;
                    if confirmed {
                        let _ = cmd_tx.send(FlowCommand::Confirm);
                    } else {
                        // Back to Idle, then dismiss.
                        let _ = cmd_tx.send(FlowCommand::Cancel);
                        let _ = cmd_tx.send(FlowCommand::Cancel);
                    }
                }
                FlowStatus::Submitting => {
                    if ctrl_c.is_none() {
                        let quit_tx = cmd_tx.clone();
                        ctrl_c = Some(tokio::spawn(async move {
                            if tokio::signal::ctrl_c().await.is_ok() {
                                let _ = quit_tx.send(FlowCommand::Quit);
                            }
                        }));
                    }
                    let _ = out_tx.send(OutputLine::Stderr(
                        "Submitting scale-out request…".into(),
                    ));
                }
                FlowStatus::Failed => {
                    // No manual retry outside the TUI.
                    let _ = cmd_tx.send(FlowCommand::Close);
                }
                _ => {}
            },
            FlowEvent::Toast(toast) => {
                if !args.json {
                    let line = match toast.kind {
                        ToastKind::Success => OutputLine::Stdout(toast.message),
                        ToastKind::Error => OutputLine::Stderr(toast.message),
                    };
                    let _ = out_tx.send(line);
                }
            }
            FlowEvent::SuccessPanel { message, .. } => {
                let _ = out_tx.send(OutputLine::Stdout(message));
            }
            FlowEvent::Info(msg) => {
                let _ = out_tx.send(OutputLine::Stderr(msg));
            }
            FlowEvent::Closed(r) => {
                report = Some(*r);
                break;
            }
        }
    }

    if let Some(handle) = ctrl_c {
        handle.abort();
    }
    drop(cmd_tx);
    let report = match report {
        Some(r) => r,
        None => controller.await.context("scale-out controller task failed")?,
    };

    if args.json {
        let out = serde_json::to_string_pretty(&report)?;
        let _ = out_tx.send(OutputLine::Stdout(out));
    } else if report.outcome == FlowStatus::Idle && report.submissions == 0 {
        let _ = out_tx.send(OutputLine::Stderr("Scale-out cancelled".into()));
    }

    drop(out_tx);
    let _ = out_handle.await;

    if report.outcome == FlowStatus::Failed {
        return Err(anyhow::anyhow!(
            report
                .error
                .unwrap_or_else(|| "scale-out request failed".to_string())
        ));
    }
    Ok(())
}

async fn run_metadata(args: &Cli, m: &MetadataArgs, cfg: &AppConfig) -> Result<()> {
    let snapshot = match (m.file.as_ref(), m.id) {
        (Some(path), _) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("read {}", path.display()))?;
            QueryResultSnapshot::from_envelope_json(&raw)
                .with_context(|| format!("parse {}", path.display()))?
        }
        (None, Some(id)) => RedashClient::new(cfg)?.fetch_query_result(id).await?,
        (None, None) => return Err(anyhow::anyhow!("either --file or --id is required")),
    };

    let formatter = QueryMetadataFormatter::from_config(cfg);
    let view = formatter.format(&snapshot, m.executing, time::OffsetDateTime::now_utc());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        for line in crate::text_summary::build_metadata_summary(&view).lines {
            println!("{line}");
        }
    }
    Ok(())
}
