use firefly_core::{Config, FireflyApp};
use tokio_util::sync::CancellationToken;

/// Shared application state
pub struct AppState {
    app: FireflyApp,
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(app: FireflyApp, shutdown: CancellationToken) -> Self {
        Self { app, shutdown }
    }

    pub fn config(&self) -> &Config {
        self.app.config()
    }

    pub fn app(&self) -> &FireflyApp {
        &self.app
    }

    /// Cancelled when the server begins shutting down.
    pub fn shutdown(&self) -> &CancellationToken {
        &self.shutdown
    }
}
