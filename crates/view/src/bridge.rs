use kindlens_core::protocol::{encode, Intent};
use metrics::counter;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

/// Outbound half of the host bridge. Sends are fire-and-forget.
pub struct Bridge {
    tx: UnboundedSender<String>,
    last_token: u64,
}

impl Bridge {
    pub fn new(tx: UnboundedSender<String>) -> Self {
        Self { tx, last_token: 0 }
    }

    /// Next request token; strictly increasing for the life of the bridge.
    pub fn issue_token(&mut self) -> u64 {
        self.last_token += 1;
        self.last_token
    }

    pub fn last_token(&self) -> u64 {
        self.last_token
    }

    /// Returns false when the host side is gone; the view keeps working either way.
    pub fn post(&self, intent: &Intent) -> bool {
        let json = match encode(intent) {
            Ok(j) => j,
            Err(e) => {
                warn!(error = %e, "view: failed to encode intent");
                return false;
            }
        };
        counter!("view_intents_sent", 1);
        if self.tx.send(json).is_err() {
            debug!(?intent, "view: host channel closed");
            return false;
        }
        true
    }
}

/// Both directions of an in-process host/view link: `(view_tx, host_rx, host_tx, view_rx)`.
pub fn channel() -> (UnboundedSender<String>, UnboundedReceiver<String>, UnboundedSender<String>, UnboundedReceiver<String>) {
    let (intent_tx, intent_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    (intent_tx, intent_rx, event_tx, event_rx)
}
