//! Load dispatching: fetch bytes from a locator on a worker thread,
//! decode them, and report back over a channel.
//!
//! The worker only ever sends events; all session state lives on the
//! event-loop thread. Every event carries the generation of the load
//! attempt that produced it so stale workers cannot disturb a newer
//! session.

use crate::source::Locator;
use std::fs::File;
use std::io::{Cursor, Read};
use std::sync::mpsc::Sender;
use tracing::{debug, info, warn};
use vantage_data::{Geometry, PlyError, decode_ply};

const CHUNK_SIZE: usize = 64 * 1024;

/// Events produced by one load attempt: any number of `Progress`
/// followed by exactly one `Finished` or `Failed`.
#[derive(Debug)]
pub enum LoadEvent {
    Progress {
        generation: u64,
        loaded: u64,
        total: Option<u64>,
    },
    Finished {
        generation: u64,
        geometry: Geometry,
    },
    Failed {
        generation: u64,
        reason: String,
    },
}

/// One load attempt handed to a dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub generation: u64,
    pub locator: Locator,
}

/// Seam between the session state machine and actual I/O.
pub trait LoadDispatcher: Send {
    fn dispatch(&self, request: LoadRequest, events: Sender<LoadEvent>);
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned HTTP {0}")]
    HttpStatus(u16),
    #[error(transparent)]
    Decode(#[from] PlyError),
}

/// Production dispatcher: fetch and decode on a short-lived thread.
pub struct ThreadedDispatcher;

impl LoadDispatcher for ThreadedDispatcher {
    fn dispatch(&self, request: LoadRequest, events: Sender<LoadEvent>) {
        std::thread::spawn(move || {
            let generation = request.generation;
            match fetch_and_decode(&request.locator, generation, &events) {
                Ok(geometry) => {
                    // Send failures mean the session is gone; nothing to do.
                    let _ = events.send(LoadEvent::Finished {
                        generation,
                        geometry,
                    });
                }
                Err(e) => {
                    warn!("load attempt failed: {e}");
                    let _ = events.send(LoadEvent::Failed {
                        generation,
                        reason: e.to_string(),
                    });
                }
            }
        });
    }
}

fn fetch_and_decode(
    locator: &Locator,
    generation: u64,
    events: &Sender<LoadEvent>,
) -> Result<Geometry, LoadError> {
    let bytes = match locator {
        Locator::Path(path) => {
            debug!("reading {}", path.display());
            let file = File::open(path)?;
            let total = file.metadata().ok().map(|m| m.len());
            read_with_progress(file, total, generation, events)?
        }
        Locator::Url(url) => {
            info!("fetching {url}");
            let response = reqwest::blocking::get(url)?;
            if !response.status().is_success() {
                return Err(LoadError::HttpStatus(response.status().as_u16()));
            }
            let total = response.content_length();
            read_with_progress(response, total, generation, events)?
        }
    };

    Ok(decode_ply(Cursor::new(bytes))?)
}

/// Read everything from `reader`, reporting byte counts as chunks arrive.
fn read_with_progress<R: Read>(
    mut reader: R,
    total: Option<u64>,
    generation: u64,
    events: &Sender<LoadEvent>,
) -> std::io::Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(total.unwrap_or(0) as usize);
    let mut chunk = vec![0u8; CHUNK_SIZE];

    loop {
        let read = reader.read(&mut chunk)?;
        if read == 0 {
            break;
        }
        bytes.extend_from_slice(&chunk[..read]);
        let _ = events.send(LoadEvent::Progress {
            generation,
            loaded: bytes.len() as u64,
            total,
        });
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::mpsc;

    const CUBE_POINTS: &str = "\
ply
format ascii 1.0
element vertex 2
property float x
property float y
property float z
end_header
0 0 0
1 1 1
";

    #[test]
    fn read_with_progress_reports_totals() {
        let (tx, rx) = mpsc::channel();
        let data = vec![7u8; CHUNK_SIZE + 10];
        let bytes = read_with_progress(Cursor::new(&data), Some(data.len() as u64), 3, &tx).unwrap();
        assert_eq!(bytes, data);

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events.len(), 2);
        match &events[1] {
            LoadEvent::Progress {
                generation,
                loaded,
                total,
            } => {
                assert_eq!(*generation, 3);
                assert_eq!(*loaded, data.len() as u64);
                assert_eq!(*total, Some(data.len() as u64));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn dispatch_decodes_a_file_and_finishes() {
        let path = std::env::temp_dir().join("vantage_fetch_test.ply");
        std::fs::write(&path, CUBE_POINTS).unwrap();

        let (tx, rx) = mpsc::channel();
        ThreadedDispatcher.dispatch(
            LoadRequest {
                generation: 1,
                locator: Locator::Path(path.clone()),
            },
            tx,
        );

        // The sender is moved into the worker, so the channel closes once
        // the attempt is done and this loop terminates.
        let mut finished = false;
        for event in rx.iter() {
            match event {
                LoadEvent::Finished {
                    generation,
                    geometry,
                } => {
                    assert_eq!(generation, 1);
                    assert_eq!(geometry.vertex_count(), 2);
                    finished = true;
                }
                LoadEvent::Progress { .. } => {}
                LoadEvent::Failed { reason, .. } => panic!("load failed: {reason}"),
            }
        }
        assert!(finished);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn dispatch_reports_missing_file_as_failure() {
        let (tx, rx) = mpsc::channel();
        ThreadedDispatcher.dispatch(
            LoadRequest {
                generation: 7,
                locator: Locator::Path(PathBuf::from("/definitely/not/here.ply")),
            },
            tx,
        );

        let mut failed = false;
        for event in rx.iter() {
            if let LoadEvent::Failed { generation, .. } = event {
                assert_eq!(generation, 7);
                failed = true;
            }
        }
        assert!(failed);
    }
}
