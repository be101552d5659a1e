//! Asset loader bridge.
//!
//! Each [`AssetLoader::load`] fetches, decodes and prepares one asset on a
//! named background thread. Results travel back over an mpsc channel
//! tagged with the [`LoadTicket`] of the request; [`AssetLoader::poll`]
//! drains the channel on the UI thread and drops every message whose
//! ticket is no longer current. A newer `load` or a `cancel` therefore
//! supersedes an in-flight request without ever blocking on it.

/// Payload decoding.
pub mod decode;
/// URL resolution and byte transport.
pub mod fetch;
/// Shadow and material preparation pass.
pub mod prepare;

use std::sync::mpsc;
use std::sync::Arc;

pub use decode::{Decode, GltfDecoder};
pub use fetch::{resolve_url, Fetch, HttpFetcher, Locator};

use crate::error::{LoadError, VitrineError};
use crate::options::LoaderOptions;
use crate::scene::Node;

/// Identifies one `load` request. Tickets increase monotonically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadTicket(u64);

impl LoadTicket {
    /// Raw sequence number.
    #[must_use]
    pub fn id(self) -> u64 {
        self.0
    }
}

/// A decoded, prepared asset ready to be placed in a session.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedAsset {
    /// The url as requested.
    pub url: String,
    /// Root of the asset's scene graph, not yet normalized.
    pub root: Node,
}

/// Progress or outcome of the current load.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadEvent {
    /// Download progress in `0.0..=1.0`.
    Progress(f32),
    /// Terminal: the asset is ready.
    Ready(LoadedAsset),
    /// Terminal: the load failed.
    Failed(LoadError),
}

impl LoadEvent {
    /// Whether no further events follow for this ticket.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress(_))
    }
}

struct LoadMessage {
    ticket: LoadTicket,
    event: LoadEvent,
}

/// Runs asset loads in the background and suppresses stale results.
pub struct AssetLoader {
    fetcher: Arc<dyn Fetch>,
    decoder: Arc<dyn Decode>,
    base_url: Option<String>,
    tx: mpsc::Sender<LoadMessage>,
    rx: mpsc::Receiver<LoadMessage>,
    next_ticket: u64,
    current: Option<LoadTicket>,
    discarded: u64,
}

impl AssetLoader {
    /// Loader using [`HttpFetcher`] and [`GltfDecoder`].
    #[must_use]
    pub fn new(options: &LoaderOptions) -> Self {
        Self::with_backends(
            options,
            Arc::new(HttpFetcher::new(options.timeout())),
            Arc::new(GltfDecoder),
        )
    }

    /// Loader with custom transport and decoding.
    #[must_use]
    pub fn with_backends(
        options: &LoaderOptions,
        fetcher: Arc<dyn Fetch>,
        decoder: Arc<dyn Decode>,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            fetcher,
            decoder,
            base_url: options.base_url.clone(),
            tx,
            rx,
            next_ticket: 0,
            current: None,
            discarded: 0,
        }
    }

    /// The ticket whose results will be delivered, if a load is in flight.
    #[must_use]
    pub fn current(&self) -> Option<LoadTicket> {
        self.current
    }

    /// Whether a load is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.current.is_some()
    }

    /// Number of terminal results dropped because their load had been
    /// superseded or cancelled.
    #[must_use]
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    /// Start loading `url`, superseding any in-flight load.
    ///
    /// # Errors
    ///
    /// Returns [`VitrineError::ThreadSpawn`] if the loader thread cannot
    /// be started; no load is current afterwards.
    pub fn load(&mut self, url: &str) -> Result<LoadTicket, VitrineError> {
        self.next_ticket += 1;
        let ticket = LoadTicket(self.next_ticket);
        if let Some(previous) = self.current.replace(ticket) {
            log::debug!("load {} superseded by {}", previous.id(), ticket.id());
        }

        let locator = resolve_url(url, self.base_url.as_deref());
        log::info!("loading {url} from {locator} (ticket {})", ticket.id());

        let fetcher = Arc::clone(&self.fetcher);
        let decoder = Arc::clone(&self.decoder);
        let tx = self.tx.clone();
        let url = url.to_owned();
        let spawned = std::thread::Builder::new()
            .name(format!("asset-loader-{}", ticket.id()))
            .spawn(move || {
                let event = match run_load(&*fetcher, &*decoder, &locator, ticket, &tx) {
                    Ok(root) => LoadEvent::Ready(LoadedAsset { url, root }),
                    Err(e) => LoadEvent::Failed(e),
                };
                // The receiver is gone once the loader is dropped.
                let _ = tx.send(LoadMessage { ticket, event });
            });

        match spawned {
            Ok(_) => Ok(ticket),
            Err(e) => {
                self.current = None;
                Err(VitrineError::ThreadSpawn(e))
            }
        }
    }

    /// Supersede the in-flight load, if any, without starting a new one.
    pub fn cancel(&mut self) {
        if let Some(ticket) = self.current.take() {
            log::debug!("load {} cancelled", ticket.id());
        }
    }

    /// Drain delivered messages, returning only the current load's events
    /// in arrival order. A terminal event ends the current load.
    pub fn poll(&mut self) -> Vec<LoadEvent> {
        let mut events = Vec::new();
        while let Ok(LoadMessage { ticket, event }) = self.rx.try_recv() {
            if self.current != Some(ticket) {
                if event.is_terminal() {
                    log::warn!("discarding result of superseded load {}", ticket.id());
                    self.discarded += 1;
                }
                continue;
            }
            if event.is_terminal() {
                self.current = None;
            }
            events.push(event);
        }
        events
    }
}

fn run_load(
    fetcher: &dyn Fetch,
    decoder: &dyn Decode,
    locator: &Locator,
    ticket: LoadTicket,
    tx: &mpsc::Sender<LoadMessage>,
) -> Result<Node, LoadError> {
    let mut last = -1.0_f32;
    let bytes = fetcher.fetch(locator, &mut |progress| {
        // Coalesce to whole percents.
        let progress = (progress.clamp(0.0, 1.0) * 100.0).floor() / 100.0;
        if progress > last {
            last = progress;
            let _ = tx.send(LoadMessage {
                ticket,
                event: LoadEvent::Progress(progress),
            });
        }
    })?;
    let mut root = decoder.decode(&bytes, locator)?;
    let prepared = prepare::prepare(&mut root);
    log::debug!(
        "prepared {locator}: {} meshes, {} vertex-colored",
        prepared.meshes,
        prepared.vertex_colored
    );
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{box_node, poll_until, FakeDecoder, GatedFetcher};

    fn loader(fetcher: &Arc<GatedFetcher>) -> AssetLoader {
        AssetLoader::with_backends(
            &LoaderOptions::default(),
            fetcher.clone(),
            Arc::new(FakeDecoder::new(box_node(glam::Vec3::ZERO, glam::Vec3::ONE))),
        )
    }

    fn terminal(loader: &mut AssetLoader) -> Vec<LoadEvent> {
        let mut seen = Vec::new();
        poll_until(|| {
            seen.extend(loader.poll());
            seen.iter().any(LoadEvent::is_terminal)
        });
        seen
    }

    #[test]
    fn successful_load_is_prepared() {
        let fetcher = Arc::new(GatedFetcher::open());
        let mut loader = loader(&fetcher);
        let ticket = loader.load("model.glb").unwrap();
        assert_eq!(loader.current(), Some(ticket));

        let events = terminal(&mut loader);
        let Some(LoadEvent::Ready(asset)) = events.last() else {
            panic!("expected Ready, got {events:?}");
        };
        assert_eq!(asset.url, "model.glb");
        let mesh = asset.root.mesh.as_ref().unwrap();
        assert!(mesh.cast_shadow && mesh.receive_shadow);
        assert!(events.contains(&LoadEvent::Progress(1.0)));
        assert!(!loader.is_loading());
    }

    #[test]
    fn fetch_failure_is_reported() {
        let fetcher = Arc::new(GatedFetcher::open());
        fetcher.fail("missing.glb", LoadError::Network("HTTP status 404".into()));
        let mut loader = loader(&fetcher);
        let _ = loader.load("missing.glb").unwrap();
        let events = terminal(&mut loader);
        assert_eq!(
            events.last(),
            Some(&LoadEvent::Failed(LoadError::Network("HTTP status 404".into())))
        );
    }

    fn drain_discarded(loader: &mut AssetLoader, count: u64) -> Vec<LoadEvent> {
        let mut seen = Vec::new();
        poll_until(|| {
            seen.extend(loader.poll());
            loader.discarded() >= count
        });
        seen
    }

    #[test]
    fn newer_load_wins_when_older_settles_last() {
        let fetcher = Arc::new(GatedFetcher::gated());
        let mut loader = loader(&fetcher);
        let a = loader.load("a.glb").unwrap();
        let b = loader.load("b.glb").unwrap();
        assert!(b > a);

        fetcher.release("b.glb");
        let events = terminal(&mut loader);
        let Some(LoadEvent::Ready(asset)) = events.last() else {
            panic!("expected Ready, got {events:?}");
        };
        assert_eq!(asset.url, "b.glb");

        fetcher.release("a.glb");
        assert!(drain_discarded(&mut loader, 1).is_empty());
    }

    #[test]
    fn newer_load_wins_when_older_settles_first() {
        let fetcher = Arc::new(GatedFetcher::gated());
        fetcher.fail("a.glb", LoadError::Timeout);
        let mut loader = loader(&fetcher);
        let _ = loader.load("a.glb").unwrap();
        let _ = loader.load("b.glb").unwrap();

        fetcher.release("a.glb");
        let stale = drain_discarded(&mut loader, 1);
        assert!(stale.iter().all(|e| !e.is_terminal()), "stale failure must be dropped");
        assert!(loader.is_loading());

        fetcher.release("b.glb");
        let events = terminal(&mut loader);
        assert!(matches!(events.last(), Some(LoadEvent::Ready(a)) if a.url == "b.glb"));
    }

    #[test]
    fn cancel_discards_outcome() {
        let fetcher = Arc::new(GatedFetcher::gated());
        let mut loader = loader(&fetcher);
        let _ = loader.load("a.glb").unwrap();
        loader.cancel();
        assert!(!loader.is_loading());
        fetcher.release("a.glb");
        assert!(drain_discarded(&mut loader, 1).is_empty());
    }

    #[test]
    fn default_loader_accepts_out_of_range_timeout() {
        let options = crate::options::Options::from_toml("[loader]\ntimeout_secs = inf\n").unwrap();
        assert!(options.loader.timeout_secs.is_infinite());
        let loader = AssetLoader::new(&options.loader);
        assert!(!loader.is_loading());
    }
}
