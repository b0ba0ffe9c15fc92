use rquest_util::Emulation;
use tracing::debug;

use crate::clients::http::HttpClient;
use crate::config::HttpConfig;
use crate::error::Result;

/// Round-robin pool over a handful of browser emulations so one
/// storefront does not see a single fingerprint for the whole crawl.
pub struct ClientPool {
    clients: Vec<HttpClient>,
    current: std::sync::atomic::AtomicUsize,
}

impl ClientPool {
    pub fn new(http: &HttpConfig) -> Result<Self> {
        let emulations = vec![
            Emulation::Firefox136,
            Emulation::Chrome133,
            Emulation::Safari18_3,
            Emulation::Edge134,
        ];

        debug!("Creating client pool with {} emulations", emulations.len());

        let clients = emulations
            .into_iter()
            .map(|emulation| HttpClient::new(http, emulation))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            clients,
            current: std::sync::atomic::AtomicUsize::new(0),
        })
    }

    pub fn next_client(&self) -> &HttpClient {
        let current = self
            .current
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        &self.clients[current % self.clients.len()]
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
