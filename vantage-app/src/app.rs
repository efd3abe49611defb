//! Wires the session, panel, and delegate together and runs the viewer.

use crate::Args;
use crate::panel::{self, PanelView};
use crate::source::ModelSource;
use crate::viewer::{ViewerDelegate, ViewerInit};
use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use vantage_window::{CameraPose, default_pose, run_with_delegate};

pub fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let timeout = (!args.no_timeout).then(|| Duration::from_secs(args.timeout_secs));

    let initial = match (args.file, args.url) {
        (Some(path), _) => Some(ModelSource::LocalFile { path }),
        (None, Some(url)) => Some(ModelSource::RemoteUrl { url }),
        (None, None) => None,
    };

    let (actions_tx, actions_rx) = mpsc::channel();
    let panel_view = Arc::new(Mutex::new(PanelView::default()));
    let reset_signal = Arc::new(AtomicBool::new(false));
    let displayed_signal = Arc::new(AtomicBool::new(false));
    let show_grid = Arc::new(AtomicBool::new(true));

    let panel_fn = panel::build_panel(
        actions_tx,
        panel_view.clone(),
        reset_signal.clone(),
        show_grid.clone(),
    );

    let init = ViewerInit {
        initial,
        timeout,
        actions: actions_rx,
        panel: panel_view,
        reset_signal: reset_signal.clone(),
        displayed_signal: displayed_signal.clone(),
        show_grid,
    };

    run_with_delegate::<ViewerDelegate, _>("Vantage PLY Viewer", init, move |controls| {
        controls.on_ui(panel_fn);
        controls.on_frame(move |frame| {
            if let Some(pose) = take_reset_request(&reset_signal, &displayed_signal) {
                *frame.reset_request = Some(pose);
            }
        });
    })
}

/// Consume a pending reset request. Resetting the view is a no-op until
/// a model has been displayed.
fn take_reset_request(reset: &AtomicBool, displayed: &AtomicBool) -> Option<CameraPose> {
    if reset.swap(false, Ordering::Relaxed) && displayed.load(Ordering::Relaxed) {
        Some(default_pose())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_is_a_noop_without_a_displayed_model() {
        let reset = AtomicBool::new(true);
        let displayed = AtomicBool::new(false);
        assert!(take_reset_request(&reset, &displayed).is_none());
        // The request is consumed either way.
        assert!(!reset.load(Ordering::Relaxed));
    }

    #[test]
    fn reset_restores_the_default_pose_when_displayed() {
        let reset = AtomicBool::new(true);
        let displayed = AtomicBool::new(true);
        let pose = take_reset_request(&reset, &displayed).expect("reset pose");
        assert_eq!(pose, default_pose());
    }

    #[test]
    fn no_request_means_no_reset() {
        let reset = AtomicBool::new(false);
        let displayed = AtomicBool::new(true);
        assert!(take_reset_request(&reset, &displayed).is_none());
    }
}
