use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use kindlens_host::{EditorOpener, Host, HostConfig, KubeCatalog};
use kindlens_view::{channel, ViewConfig, ViewSession};
use serde::Serialize;
use tokio::signal;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "kindlensctl", version, about = "Browse CRD schemas and instances from the terminal")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, global = true, default_value_t = Output::Human)]
    output: Output,

    /// Namespace scope for instance listings (default: all namespaces)
    #[arg(long = "ns", global = true)]
    namespace: Option<String>,

    /// Seconds to wait for the cluster before giving up
    #[arg(long = "timeout", global = true, default_value_t = 30)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Output {
    Human,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the CRD catalog
    Catalog {
        /// Only show kinds matching this query (substring or fuzzy)
        #[arg(long = "filter")]
        filter: Option<String>,
    },
    /// Render the schema tree of one kind
    Schema {
        /// Catalog key, e.g. "cert-manager.io/v1/Certificate"
        key: String,
        /// Expand every node instead of sections only
        #[arg(long = "expand-all", action = ArgAction::SetTrue)]
        expand_all: bool,
        /// Print the schema YAML instead of the tree
        #[arg(long = "raw", action = ArgAction::SetTrue)]
        raw: bool,
    },
    /// List instances of one kind as a table
    Instances {
        /// Catalog key, e.g. "cert-manager.io/v1/Certificate"
        key: String,
        /// Sort by this column (label or 0-based index)
        #[arg(long = "sort")]
        sort: Option<String>,
        /// Sort descending
        #[arg(long = "desc", action = ArgAction::SetTrue)]
        desc: bool,
        /// Column filter as <column>=<text>; repeatable
        #[arg(long = "filter")]
        filters: Vec<String>,
    },
}

fn init_tracing() {
    let env = std::env::var("KINDLENS_LOG").unwrap_or_else(|_| "warn".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_writer(std::io::stderr).init();
}

fn init_metrics() {
    if let Ok(addr) = std::env::var("KINDLENS_METRICS_ADDR") {
        if let Ok(sock) = addr.parse::<std::net::SocketAddr>() {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            match builder.with_http_listener(sock).install() {
                Ok(_) => info!(addr = %addr, "Prometheus metrics exporter listening"),
                Err(e) => warn!(error = %e, "failed to install metrics exporter"),
            }
        } else {
            warn!(addr = %addr, "invalid KINDLENS_METRICS_ADDR; expected host:port");
        }
    }
}

/// Resolve `--sort` as a column label (case-insensitive) or an index.
fn resolve_column(columns: &[String], wanted: &str) -> Option<usize> {
    columns
        .iter()
        .position(|c| c.eq_ignore_ascii_case(wanted))
        .or_else(|| wanted.parse::<usize>().ok().filter(|i| *i < columns.len()))
}

fn parse_filter(raw: &str) -> Result<(&str, &str)> {
    raw.split_once('=').ok_or_else(|| anyhow!("filter {:?} must look like <column>=<text>", raw))
}

/// Apply host events until `done` holds, the deadline passes, or the user interrupts.
async fn settle(
    session: &mut ViewSession,
    events: &mut UnboundedReceiver<String>,
    deadline: Instant,
    done: impl Fn(&ViewSession) -> bool,
) -> Result<()> {
    while !done(session) {
        let rem = deadline.saturating_duration_since(Instant::now());
        tokio::select! {
            _ = signal::ctrl_c() => bail!("interrupted"),
            next = tokio::time::timeout(rem, events.recv()) => match next {
                Ok(Some(raw)) => {
                    session.handle_message(&raw);
                }
                Ok(None) => bail!("host stopped before answering"),
                Err(_) => bail!("timed out waiting for the cluster"),
            },
        }
    }
    Ok(())
}

fn settled(s: &ViewSession) -> bool {
    !s.is_loading() && (s.has_results() || s.error().is_some())
}

/// The schema subcommand only needs the tree; an instance listing failure must not hide it.
fn schema_settled(s: &ViewSession) -> bool {
    !s.tree().is_empty() || s.error().is_some()
}

fn fail_on_error(session: &ViewSession) -> Result<()> {
    match session.error() {
        Some(msg) => Err(anyhow!("{}", msg)),
        None => Ok(()),
    }
}

#[derive(Serialize)]
struct Rows<'a> {
    columns: &'a [String],
    rows: Vec<&'a [String]>,
    status: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    init_metrics();
    let cli = Cli::parse();

    let mut config = HostConfig::from_env();
    if cli.namespace.is_some() {
        config.default_namespace = cli.namespace.clone();
    }
    let opener = Arc::new(EditorOpener::new(config.editor.clone()));
    let host = Host::new(Arc::new(KubeCatalog::new()), opener, config);
    let (view_tx, host_rx, host_tx, mut events) = channel();
    let host_task = tokio::spawn(host.run(host_rx, host_tx));

    let mut session = ViewSession::new(view_tx, ViewConfig::from_env());
    let deadline = Instant::now() + Duration::from_secs(cli.timeout_secs);
    let t0 = Instant::now();
    session.start();
    settle(&mut session, &mut events, deadline, |s| !s.scope_options().is_empty() || s.error().is_some())
        .await
        .context("loading catalog")?;
    fail_on_error(&session)?;
    info!(took_ms = %t0.elapsed().as_millis(), entries = session.catalog().entries().len(), "catalog loaded");

    match cli.command {
        Commands::Catalog { filter } => {
            if let Some(q) = &filter {
                session.set_catalog_query(q);
            }
            let visible = session.catalog().visible();
            match cli.output {
                Output::Human => {
                    for e in visible {
                        match &e.description {
                            Some(d) => println!("{} • {} • {}", e.display_key, e.kind, d.lines().next().unwrap_or_default()),
                            None => println!("{} • {}", e.display_key, e.kind),
                        }
                    }
                }
                Output::Json => println!("{}", serde_json::to_string_pretty(&visible)?),
            }
        }
        Commands::Schema { key, expand_all, raw } => {
            session.select(&key);
            settle(&mut session, &mut events, deadline, schema_settled)
                .await
                .with_context(|| format!("loading {}", key))?;
            if session.tree().is_empty() {
                fail_on_error(&session)?;
            }
            if expand_all {
                session.expand_all();
            }
            match (cli.output, raw) {
                (_, true) => print!("{}", session.raw_text()),
                (Output::Human, false) => {
                    if let Some(d) = session.description() {
                        println!("{}\n", d);
                    }
                    print!("{}", session.tree().render_text());
                }
                (Output::Json, false) => println!("{}", serde_json::to_string_pretty(session.tree().roots())?),
            }
        }
        Commands::Instances { key, sort, desc, filters } => {
            session.select(&key);
            settle(&mut session, &mut events, deadline, settled).await.with_context(|| format!("loading {}", key))?;
            fail_on_error(&session)?;
            let columns = session.table().state().columns().to_vec();
            if let Some(wanted) = &sort {
                let col = resolve_column(&columns, wanted).ok_or_else(|| anyhow!("unknown column {:?}", wanted))?;
                session.click_header(col);
                if desc {
                    session.click_header(col);
                }
            }
            for f in &filters {
                let (name, text) = parse_filter(f)?;
                let col = resolve_column(&columns, name).ok_or_else(|| anyhow!("unknown column {:?}", name))?;
                session.edit_filter(col, text);
            }
            let table = session.table();
            match cli.output {
                Output::Human => {
                    print!("{}", table.render_text());
                    eprintln!("{}", session.status_line());
                }
                Output::Json => {
                    let rows = Rows {
                        columns: table.state().columns(),
                        rows: table.body().iter().map(|r| r.cells.as_slice()).collect(),
                        status: session.status_line(),
                    };
                    println!("{}", serde_json::to_string_pretty(&rows)?);
                }
            }
        }
    }

    drop(session);
    let _ = host_task.await;
    Ok(())
}
