//! Two-state gate: callers park while it is blocked and are all released
//! together when it opens.

use tokio::sync::watch;

#[derive(Debug)]
pub(crate) struct Gate {
    state: watch::Sender<bool>,
}

impl Gate {
    pub(crate) fn blocked() -> Self {
        let (state, _) = watch::channel(false);
        Self { state }
    }

    pub(crate) fn open(&self) {
        self.state.send_replace(true);
    }

    pub(crate) fn block(&self) {
        self.state.send_replace(false);
    }

    pub(crate) fn is_open(&self) -> bool {
        *self.state.borrow()
    }

    /// Resolves immediately when open, otherwise at the next `open()`.
    pub(crate) async fn wait_open(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|open| *open).await;
    }
}
