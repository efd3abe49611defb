//! The egui control panel: load buttons, URL field, and the status bar.

use crate::session::{Severity, Status};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use vantage_window::egui::{self, Color32, Context, TopBottomPanel};

/// Actions the panel sends to the viewer delegate.
#[derive(Debug, Clone)]
pub enum UiAction {
    LoadFile(PathBuf),
    LoadUrl(String),
    LoadSample,
}

/// Status surface shared between the delegate (writer) and panel (reader).
#[derive(Debug, Default)]
pub struct PanelView {
    pub status: Status,
    pub model_info: Option<String>,
}

pub type SharedPanel = Arc<Mutex<PanelView>>;

/// Build the per-frame UI closure.
pub fn build_panel(
    actions: Sender<UiAction>,
    view: SharedPanel,
    reset_signal: Arc<AtomicBool>,
    show_grid: Arc<AtomicBool>,
) -> impl FnMut(&Context) + Send + 'static {
    let mut url_input = String::new();

    move |ctx: &Context| {
        TopBottomPanel::top("control_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Open PLY...").clicked() {
                    // File dialog on a separate thread to avoid blocking
                    // the event loop.
                    let sender = actions.clone();
                    std::thread::spawn(move || {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("PLY Files", &["ply"])
                            .add_filter("All Files", &["*"])
                            .pick_file()
                        {
                            let _ = sender.send(UiAction::LoadFile(path));
                        }
                    });
                }

                ui.separator();
                ui.label("URL:");
                ui.add(egui::TextEdit::singleline(&mut url_input).desired_width(280.0));
                if ui.button("Load URL").clicked() {
                    let _ = actions.send(UiAction::LoadUrl(url_input.trim().to_string()));
                }

                ui.separator();
                if ui.button("Load Sample").clicked() {
                    let _ = actions.send(UiAction::LoadSample);
                }
                if ui.button("Reset View").clicked() {
                    reset_signal.store(true, Ordering::Relaxed);
                }

                ui.separator();
                let mut grid = show_grid.load(Ordering::Relaxed);
                if ui.checkbox(&mut grid, "Grid").changed() {
                    show_grid.store(grid, Ordering::Relaxed);
                }
            });
        });

        TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            let view = view.lock().unwrap();
            ui.horizontal(|ui| {
                status_label(ui, &view.status);
                if let Some(info) = &view.model_info {
                    ui.separator();
                    ui.label(info);
                }
            });
        });
    }
}

fn status_label(ui: &mut egui::Ui, status: &Status) {
    match status.severity {
        Severity::Neutral => {
            ui.label(&status.message);
        }
        Severity::Success => {
            ui.colored_label(Color32::from_rgb(0x2e, 0x7d, 0x32), &status.message);
        }
        Severity::Error => {
            ui.colored_label(Color32::RED, &status.message);
        }
    }
}
