//! The viewer session: owns load lifecycle and user-facing status.
//!
//! At most one load is in flight. A request while busy is rejected
//! outright; there is no queueing and no cancel-and-restart. Terminal
//! outcomes (success, failure, timeout) clear the deadline
//! unconditionally, and every loader event carries its attempt's
//! generation so a late worker from a timed-out attempt is ignored.

use crate::fetch::{LoadDispatcher, LoadEvent, LoadRequest};
use crate::source::{Locator, ModelSource, SAMPLE_FALLBACK_URL, has_ply_extension};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use vantage_data::{Geometry, PreparedModel, prepare_for_display};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Severity of the user-facing status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Neutral,
    Success,
    Error,
}

/// A short human-readable message, overwritten on every lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub message: String,
    pub severity: Severity,
}

impl Status {
    pub fn neutral(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Neutral,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Success,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Error,
        }
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::neutral("Ready to load PLY models")
    }
}

/// A successful load, transformed and ready for GPU upload.
pub struct DisplayUpdate {
    pub prepared: PreparedModel,
    pub name: String,
}

struct ActiveLoad {
    source: ModelSource,
    generation: u64,
    deadline: Option<Instant>,
    is_fallback: bool,
}

pub struct ViewerSession {
    dispatcher: Box<dyn LoadDispatcher>,
    events_tx: Sender<LoadEvent>,
    events_rx: Receiver<LoadEvent>,
    active: Option<ActiveLoad>,
    next_generation: u64,
    timeout: Option<Duration>,
    status: Status,
    model_info: Option<String>,
}

impl ViewerSession {
    pub fn new(dispatcher: Box<dyn LoadDispatcher>, timeout: Option<Duration>) -> Self {
        let (events_tx, events_rx) = channel();
        Self {
            dispatcher,
            events_tx,
            events_rx,
            active: None,
            next_generation: 0,
            timeout,
            status: Status::default(),
            model_info: None,
        }
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn model_info(&self) -> Option<&str> {
        self.model_info.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    /// Start loading from `source`. Rejected while a load is in flight;
    /// a local file is validated before anything is dispatched.
    pub fn request_load(&mut self, source: ModelSource) {
        if self.active.is_some() {
            debug!("already loading a model, request ignored");
            return;
        }

        match &source {
            ModelSource::LocalFile { path } => {
                let name = source.display_name();
                if !has_ply_extension(&name) {
                    warn!("rejected non-PLY file {}", path.display());
                    self.status = Status::error("Error: Please select a PLY file");
                    return;
                }
            }
            ModelSource::RemoteUrl { url } => {
                if url.trim().is_empty() {
                    self.status = Status::error("Error: Please enter a URL");
                    return;
                }
            }
            ModelSource::Sample => {}
        }

        self.begin_attempt(source, false);
    }

    fn begin_attempt(&mut self, source: ModelSource, is_fallback: bool) {
        self.next_generation += 1;
        let generation = self.next_generation;

        let message = match &source {
            ModelSource::Sample if !is_fallback => "Loading sample model...",
            ModelSource::RemoteUrl { .. } => "Loading model from URL...",
            _ => "Loading model...",
        };
        self.status = Status::neutral(message);
        info!("loading {}", source.display_name());

        let locator = if is_fallback {
            Locator::Url(SAMPLE_FALLBACK_URL.to_string())
        } else {
            source.locator()
        };

        self.active = Some(ActiveLoad {
            source,
            generation,
            deadline: self.timeout.map(|t| Instant::now() + t),
            is_fallback,
        });

        self.dispatcher
            .dispatch(LoadRequest { generation, locator }, self.events_tx.clone());
    }

    /// Drain loader events and check the timeout. Returns a prepared
    /// model when a load completed this poll.
    pub fn poll(&mut self, now: Instant) -> Option<DisplayUpdate> {
        let mut ready = None;

        let events: Vec<LoadEvent> = self.events_rx.try_iter().collect();
        for event in events {
            match event {
                LoadEvent::Progress {
                    generation,
                    loaded,
                    total,
                } => self.on_progress(generation, loaded, total),
                LoadEvent::Finished {
                    generation,
                    geometry,
                } => {
                    if let Some(update) = self.on_success(generation, geometry) {
                        ready = Some(update);
                    }
                }
                LoadEvent::Failed { generation, reason } => self.on_failure(generation, &reason),
            }
        }

        self.poll_timeout(now);
        ready
    }

    fn is_current(&self, generation: u64) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.generation == generation)
    }

    fn on_progress(&mut self, generation: u64, loaded: u64, total: Option<u64>) {
        if !self.is_current(generation) {
            return;
        }
        self.status = Status::neutral(match total {
            Some(total) if total > 0 => format!("Loading: {}%", loaded * 100 / total),
            _ => format!("Loaded {} KB...", loaded / 1024),
        });
    }

    fn on_success(&mut self, generation: u64, geometry: Geometry) -> Option<DisplayUpdate> {
        if !self.is_current(generation) {
            debug!("dropping result from stale load attempt {generation}");
            return None;
        }
        // Terminal outcome: the deadline dies with the active session.
        let active = self.active.take()?;

        let name = active.source.display_name();
        let vertex_count = geometry.vertex_count();

        match prepare_for_display(geometry) {
            Ok(prepared) => {
                info!("model loaded: {name} ({vertex_count} vertices)");
                self.status = Status::success("Model loaded successfully");
                self.model_info = Some(format!("Model: {name} | Vertices: {vertex_count}"));
                Some(DisplayUpdate { prepared, name })
            }
            Err(e) => {
                error!("error processing model: {e}");
                self.status = Status::error(format!("Error processing model: {e}"));
                None
            }
        }
    }

    fn on_failure(&mut self, generation: u64, reason: &str) {
        if !self.is_current(generation) {
            debug!("dropping failure from stale load attempt {generation}");
            return;
        }
        let Some(active) = self.active.take() else {
            return;
        };

        error!("error loading {}: {reason}", active.source.display_name());
        self.fail_or_fall_back(active, format!("Error loading model: {reason}"));
    }

    fn poll_timeout(&mut self, now: Instant) {
        let timed_out = self
            .active
            .as_ref()
            .and_then(|active| active.deadline)
            .is_some_and(|deadline| now >= deadline);
        if !timed_out {
            return;
        }
        let Some(active) = self.active.take() else {
            return;
        };

        warn!("loading {} timed out", active.source.display_name());
        self.fail_or_fall_back(
            active,
            "Error: Loading timed out. Try another file or URL.".to_string(),
        );
    }

    /// The bundled sample gets exactly one fallback attempt against the
    /// fixed URL; everything else is terminal.
    fn fail_or_fall_back(&mut self, failed: ActiveLoad, message: String) {
        if matches!(failed.source, ModelSource::Sample) && !failed.is_fallback {
            info!("bundled sample unavailable, trying fallback URL");
            self.begin_attempt(ModelSource::Sample, true);
        } else {
            self.status = Status::error(message);
        }
    }

    /// Record a failure that happened while turning a prepared model into
    /// GPU resources. The previously displayed model is untouched.
    pub fn on_display_error(&mut self, reason: &str) {
        error!("error displaying model: {reason}");
        self.status = Status::error(format!("Error processing model: {reason}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    /// Dispatcher that records requests and lets the test drive events.
    #[derive(Clone, Default)]
    struct RecordingDispatcher {
        dispatched: Arc<Mutex<Vec<(LoadRequest, Sender<LoadEvent>)>>>,
    }

    impl LoadDispatcher for RecordingDispatcher {
        fn dispatch(&self, request: LoadRequest, events: Sender<LoadEvent>) {
            self.dispatched.lock().unwrap().push((request, events));
        }
    }

    impl RecordingDispatcher {
        fn count(&self) -> usize {
            self.dispatched.lock().unwrap().len()
        }

        fn last(&self) -> (LoadRequest, Sender<LoadEvent>) {
            let guard = self.dispatched.lock().unwrap();
            let (request, sender) = guard.last().expect("nothing dispatched");
            (request.clone(), sender.clone())
        }
    }

    fn session_with(
        timeout: Option<Duration>,
    ) -> (ViewerSession, RecordingDispatcher) {
        let dispatcher = RecordingDispatcher::default();
        let session = ViewerSession::new(Box::new(dispatcher.clone()), timeout);
        (session, dispatcher)
    }

    fn triangle_geometry() -> Geometry {
        Geometry {
            positions: vec![Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0), Vec3::new(0.0, 4.0, 0.0)],
            colors: vec![Vec3::splat(0.8); 3],
            faces: vec![[0, 1, 2]],
            ..Default::default()
        }
    }

    fn url_source() -> ModelSource {
        ModelSource::RemoteUrl {
            url: "https://example.com/scan.ply".into(),
        }
    }

    #[test]
    fn starts_idle_and_ready() {
        let (session, dispatcher) = session_with(None);
        assert!(!session.is_busy());
        assert_eq!(session.status().message, "Ready to load PLY models");
        assert_eq!(dispatcher.count(), 0);
    }

    #[test]
    fn request_while_busy_is_rejected() {
        let (mut session, dispatcher) = session_with(None);
        session.request_load(url_source());
        assert!(session.is_busy());
        let status_before = session.status().clone();

        session.request_load(ModelSource::Sample);

        assert_eq!(dispatcher.count(), 1);
        assert_eq!(session.status(), &status_before);
    }

    #[test]
    fn non_ply_file_is_rejected_before_dispatch() {
        let (mut session, dispatcher) = session_with(None);
        session.request_load(ModelSource::LocalFile {
            path: PathBuf::from("scan.txt"),
        });

        assert_eq!(dispatcher.count(), 0);
        assert!(!session.is_busy());
        assert_eq!(session.status().severity, Severity::Error);
        assert_eq!(session.status().message, "Error: Please select a PLY file");
    }

    #[test]
    fn uppercase_ply_extension_is_accepted() {
        let (mut session, dispatcher) = session_with(None);
        session.request_load(ModelSource::LocalFile {
            path: PathBuf::from("scan.PLY"),
        });
        assert_eq!(dispatcher.count(), 1);
        assert!(session.is_busy());
    }

    #[test]
    fn empty_url_is_rejected_before_dispatch() {
        let (mut session, dispatcher) = session_with(None);
        session.request_load(ModelSource::RemoteUrl { url: "  ".into() });
        assert_eq!(dispatcher.count(), 0);
        assert_eq!(session.status().message, "Error: Please enter a URL");
    }

    #[test]
    fn successful_load_updates_status_and_clears_busy() {
        let (mut session, dispatcher) = session_with(Some(DEFAULT_TIMEOUT));
        session.request_load(url_source());
        let (request, events) = dispatcher.last();

        events
            .send(LoadEvent::Finished {
                generation: request.generation,
                geometry: triangle_geometry(),
            })
            .unwrap();

        let update = session.poll(Instant::now()).expect("model ready");
        assert_eq!(update.name, "Model from URL");
        assert!(!session.is_busy());
        assert_eq!(session.status().severity, Severity::Success);
        assert_eq!(
            session.model_info(),
            Some("Model: Model from URL | Vertices: 3")
        );
    }

    #[test]
    fn timeout_after_success_does_not_alter_status() {
        let (mut session, dispatcher) = session_with(Some(Duration::from_secs(5)));
        session.request_load(url_source());
        let (request, events) = dispatcher.last();

        events
            .send(LoadEvent::Finished {
                generation: request.generation,
                geometry: triangle_geometry(),
            })
            .unwrap();
        assert!(session.poll(Instant::now()).is_some());
        let status = session.status().clone();

        // Long past the original deadline: nothing may change.
        session.poll(Instant::now() + Duration::from_secs(3600));
        assert_eq!(session.status(), &status);
    }

    #[test]
    fn timeout_fails_the_load() {
        let (mut session, _dispatcher) = session_with(Some(Duration::from_secs(5)));
        session.request_load(url_source());

        assert!(session.poll(Instant::now() + Duration::from_secs(6)).is_none());
        assert!(!session.is_busy());
        assert_eq!(session.status().severity, Severity::Error);
        assert!(session.status().message.contains("timed out"));
    }

    #[test]
    fn result_arriving_after_timeout_is_dropped() {
        let (mut session, dispatcher) = session_with(Some(Duration::from_secs(5)));
        session.request_load(url_source());
        let (request, events) = dispatcher.last();

        session.poll(Instant::now() + Duration::from_secs(6));
        let status = session.status().clone();

        events
            .send(LoadEvent::Finished {
                generation: request.generation,
                geometry: triangle_geometry(),
            })
            .unwrap();
        assert!(session.poll(Instant::now() + Duration::from_secs(7)).is_none());
        assert_eq!(session.status(), &status);
    }

    #[test]
    fn sample_failure_falls_back_to_fixed_url_once() {
        let (mut session, dispatcher) = session_with(None);
        session.request_load(ModelSource::Sample);
        let (first, events) = dispatcher.last();

        events
            .send(LoadEvent::Failed {
                generation: first.generation,
                reason: "no such file".into(),
            })
            .unwrap();
        session.poll(Instant::now());

        // One fallback attempt against the fixed URL.
        assert_eq!(dispatcher.count(), 2);
        let (second, events) = dispatcher.last();
        assert_eq!(second.locator, Locator::Url(SAMPLE_FALLBACK_URL.into()));
        assert!(session.is_busy());

        // The fallback failing is terminal.
        events
            .send(LoadEvent::Failed {
                generation: second.generation,
                reason: "404".into(),
            })
            .unwrap();
        session.poll(Instant::now());
        assert_eq!(dispatcher.count(), 2);
        assert!(!session.is_busy());
        assert_eq!(session.status().severity, Severity::Error);
    }

    #[test]
    fn url_failure_is_terminal() {
        let (mut session, dispatcher) = session_with(None);
        session.request_load(url_source());
        let (request, events) = dispatcher.last();

        events
            .send(LoadEvent::Failed {
                generation: request.generation,
                reason: "connection refused".into(),
            })
            .unwrap();
        session.poll(Instant::now());

        assert_eq!(dispatcher.count(), 1);
        assert_eq!(session.status().severity, Severity::Error);
        assert!(session.status().message.contains("connection refused"));
    }

    #[test]
    fn progress_reports_percentage_when_total_known() {
        let (mut session, dispatcher) = session_with(None);
        session.request_load(url_source());
        let (request, events) = dispatcher.last();

        events
            .send(LoadEvent::Progress {
                generation: request.generation,
                loaded: 50,
                total: Some(200),
            })
            .unwrap();
        session.poll(Instant::now());
        assert_eq!(session.status().message, "Loading: 25%");

        events
            .send(LoadEvent::Progress {
                generation: request.generation,
                loaded: 4096,
                total: None,
            })
            .unwrap();
        session.poll(Instant::now());
        assert_eq!(session.status().message, "Loaded 4 KB...");
    }

    #[test]
    fn empty_geometry_surfaces_a_processing_error() {
        let (mut session, dispatcher) = session_with(None);
        session.request_load(url_source());
        let (request, events) = dispatcher.last();

        events
            .send(LoadEvent::Finished {
                generation: request.generation,
                geometry: Geometry::default(),
            })
            .unwrap();

        assert!(session.poll(Instant::now()).is_none());
        assert!(!session.is_busy());
        assert_eq!(session.status().severity, Severity::Error);
        assert!(session.status().message.starts_with("Error processing model"));
    }
}
