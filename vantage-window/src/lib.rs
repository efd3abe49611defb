//! Vantage Window Crate
//!
//! Winit application shell for the viewer: event loop, camera and orbit
//! controls, and the egui overlay. Scene content is supplied through a
//! [`vantage_gpu::RenderDelegate`].

mod app;
mod camera;
mod controls;
mod overlay;

pub use app::run_with_delegate;
pub use camera::{Camera, CameraPose, Projection, default_pose};
pub use controls::{CameraControl, Controls, FrameUpdate, InputState, MouseController};

pub use egui;
pub use winit::event::MouseButton;
pub use winit::keyboard::{KeyCode, PhysicalKey};
