use async_trait::async_trait;
use parking_lot::Mutex;
use showroom_core::{FetchError, FetchedMedia, MediaFetcher, MediaReference};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::watch;

/// A [`MediaFetcher`] that answers from a script and counts calls.
///
/// Unscripted references fail with `FetchError::Status(404)`.
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    responses: HashMap<MediaReference, Result<FetchedMedia, FetchError>>,
    calls: Mutex<HashMap<MediaReference, usize>>,
    delay: Option<Duration>,
    gate: Option<watch::Receiver<bool>>,
}

/// Holds gated fetches until [`open`](FetchGate::open) is called.
#[derive(Debug)]
pub struct FetchGate {
    tx: watch::Sender<bool>,
}

impl FetchGate {
    pub fn open(&self) {
        let _ = self.tx.send(true);
    }
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_media(mut self, reference: impl Into<MediaReference>, media: FetchedMedia) -> Self {
        self.responses.insert(reference.into(), Ok(media));
        self
    }

    pub fn with_failure(mut self, reference: impl Into<MediaReference>, error: FetchError) -> Self {
        self.responses.insert(reference.into(), Err(error));
        self
    }

    /// Every fetch sleeps this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Makes every fetch wait for the returned gate.
    ///
    /// Calls are counted before waiting, so tests can observe a fetch that
    /// has started but not finished.
    pub fn gated(mut self) -> (Self, FetchGate) {
        let (tx, rx) = watch::channel(false);
        self.gate = Some(rx);
        (self, FetchGate { tx })
    }

    pub fn calls(&self, reference: &MediaReference) -> usize {
        self.calls.lock().get(reference).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().values().sum()
    }
}

#[async_trait]
impl MediaFetcher for ScriptedFetcher {
    async fn fetch(&self, reference: &MediaReference) -> Result<FetchedMedia, FetchError> {
        *self.calls.lock().entry(reference.clone()).or_default() += 1;

        if let Some(gate) = &self.gate {
            let mut gate = gate.clone();
            let _ = gate.wait_for(|open| *open).await;
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.responses
            .get(reference)
            .cloned()
            .unwrap_or(Err(FetchError::Status(404)))
    }
}
