use std::str::FromStr;
use std::sync::Arc;

use kindlens_host::{EditorOpener, Host, HostConfig, KubeCatalog};
use kindlens_view::{channel, ViewConfig, ViewSession};
use tracing::info;

fn init_tracing() {
    let env = std::env::var("KINDLENS_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    init_tracing();
    let config = HostConfig::from_env();
    info!(editor = %config.editor, max_rows = config.max_rows, "starting kindlens");
    let opener = Arc::new(EditorOpener::new(config.editor.clone()));
    let host = Host::new(Arc::new(KubeCatalog::new()), opener, config);

    let (view_tx, host_rx, host_tx, view_rx) = channel();
    tokio::spawn(host.run(host_rx, host_tx));

    let session = ViewSession::new(view_tx, ViewConfig::from_env());
    if let Err(e) = kindlens_gui::run_native(session, view_rx) {
        eprintln!("GUI error: {}", e);
        std::process::exit(1);
    }
}
