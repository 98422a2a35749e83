//! Per-call HTTP session.
//!
//! Every dispatch opens its own session and drops it before returning, so
//! connections are never pooled or reused between calls.

use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use crate::error::Result;

/// RAII wrapper around a single-use HTTP client.
///
/// The underlying connections are released when the session is closed or
/// dropped, including on early returns through `?`.
pub struct CallSession {
    client: Client,
    closed: bool,
}

impl CallSession {
    pub fn open(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder().pool_max_idle_per_host(0);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build()?;
        debug!(timeout_secs = ?timeout.map(|t| t.as_secs()), "Session opened");

        Ok(Self {
            client,
            closed: false,
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Close the session explicitly
    pub fn close(mut self) {
        self.closed = true;
        debug!("Session closed");
    }
}

impl Drop for CallSession {
    fn drop(&mut self) {
        if !self.closed {
            debug!("Session dropped before explicit close");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_and_close() {
        let session = CallSession::open(Some(Duration::from_secs(5))).unwrap();
        let _ = session.client();
        session.close();
    }

    #[tokio::test]
    async fn test_drop_without_close() {
        let session = CallSession::open(None).unwrap();
        drop(session);
    }
}
