use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

use crate::camera::{Camera, CameraPose};

/// Per-frame snapshot of pointer state that controllers and hooks can
/// inspect.
#[derive(Debug, Default)]
pub struct InputState {
    mouse_position: Option<Vec2>,
    mouse_delta: Vec2,
    scroll_delta: f32,
}

impl InputState {
    pub fn mouse_position(&self) -> Option<Vec2> {
        self.mouse_position
    }

    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    pub fn scroll_delta(&self) -> f32 {
        self.scroll_delta
    }

    fn end_frame(&mut self) {
        self.mouse_delta = Vec2::ZERO;
        self.scroll_delta = 0.0;
    }

    fn record_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                let current = Vec2::new(position.x as f32, position.y as f32);
                if let Some(prev) = self.mouse_position {
                    self.mouse_delta += current - prev;
                }
                self.mouse_position = Some(current);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let amount = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                };
                self.scroll_delta += amount;
            }
            _ => {}
        }
    }
}

/// Trait for camera controllers. Implementations react to events and
/// produce an updated pose.
pub trait CameraControl: Send {
    /// Handle an individual window event. Return true if the event was
    /// consumed.
    fn handle_event(&mut self, event: &WindowEvent, input: &mut InputState) -> bool {
        let _ = (event, input);
        false
    }

    /// Per-frame update hook. Receives the current pose and returns a
    /// replacement when the controller moved the camera.
    fn update(&mut self, _dt: f32, _input: &InputState, _current: &CameraPose) -> Option<CameraPose> {
        None
    }

    /// Called when the camera is reset so controllers can re-seed state.
    fn on_reset(&mut self, _pose: &CameraPose) {}
}

/// Mutable view of one frame handed to frame hooks.
pub struct FrameUpdate<'a> {
    pub dt: f32,
    pub input: &'a InputState,
    pub pose: &'a mut CameraPose,
    pub reset_request: &'a mut Option<CameraPose>,
}

/// Collection of controllers plus frame and UI hooks.
pub struct Controls {
    input: InputState,
    controllers: Vec<Box<dyn CameraControl>>,
    frame_hooks: Vec<Box<dyn FnMut(FrameUpdate<'_>) + Send>>,
    ui_hooks: Vec<Box<dyn FnMut(&egui::Context) + Send>>,
    reset: Option<CameraPose>,
}

impl Controls {
    pub fn new() -> Self {
        let mut controls = Self::empty();
        controls.add_controller(Box::new(MouseController::default()));
        controls
    }

    pub fn empty() -> Self {
        Self {
            input: InputState::default(),
            controllers: Vec::new(),
            frame_hooks: Vec::new(),
            ui_hooks: Vec::new(),
            reset: None,
        }
    }

    pub fn add_controller(&mut self, controller: Box<dyn CameraControl>) -> &mut Self {
        self.controllers.push(controller);
        self
    }

    /// Register a hook run once per frame after controllers.
    pub fn on_frame<F>(&mut self, hook: F) -> &mut Self
    where
        F: FnMut(FrameUpdate<'_>) + Send + 'static,
    {
        self.frame_hooks.push(Box::new(hook));
        self
    }

    /// Register a hook that draws egui UI each frame.
    pub fn on_ui<F>(&mut self, hook: F) -> &mut Self
    where
        F: FnMut(&egui::Context) + Send + 'static,
    {
        self.ui_hooks.push(Box::new(hook));
        self
    }

    /// Request a camera reset that will be applied before the next update.
    pub fn request_reset(&mut self, pose: CameraPose) {
        self.reset = Some(pose);
    }

    pub fn handle_event(&mut self, event: &WindowEvent) -> bool {
        self.input.record_event(event);
        self.controllers
            .iter_mut()
            .any(|controller| controller.handle_event(event, &mut self.input))
    }

    pub fn update(&mut self, dt: f32, camera: &mut Camera) {
        // Apply pending reset and re-seed controllers.
        if let Some(reset_pose) = self.reset.take() {
            camera.apply_pose(&reset_pose);
            for controller in self.controllers.iter_mut() {
                controller.on_reset(&reset_pose);
            }
        }

        let mut working_pose = camera.pose();

        for controller in self.controllers.iter_mut() {
            if let Some(pose) = controller.update(dt, &self.input, &working_pose) {
                working_pose = pose;
            }
        }

        let mut requested_reset = None;
        for hook in self.frame_hooks.iter_mut() {
            hook(FrameUpdate {
                dt,
                input: &self.input,
                pose: &mut working_pose,
                reset_request: &mut requested_reset,
            });
        }

        if let Some(reset_pose) = requested_reset {
            // Apply immediately and notify controllers so state is latched.
            for controller in self.controllers.iter_mut() {
                controller.on_reset(&reset_pose);
            }
            working_pose = reset_pose;
        }

        camera.apply_pose(&working_pose);
        self.input.end_frame();
    }

    pub(crate) fn run_ui(&mut self, ctx: &egui::Context) {
        for hook in self.ui_hooks.iter_mut() {
            hook(ctx);
        }
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }
}

impl Default for Controls {
    fn default() -> Self {
        Self::new()
    }
}

/// Orbit/pan/zoom mouse controller: left-drag orbits, right-drag pans,
/// scroll dollies.
#[derive(Debug)]
pub struct MouseController {
    orbit_button: MouseButton,
    pan_button: MouseButton,
    drag_state: Option<DragState>,
    orbit_sensitivity: f32,
    pan_sensitivity: f32,
    scroll_sensitivity: f32,
}

impl MouseController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn orbit_sensitivity(&mut self, value: f32) -> &mut Self {
        self.orbit_sensitivity = value;
        self
    }

    pub fn pan_sensitivity(&mut self, value: f32) -> &mut Self {
        self.pan_sensitivity = value;
        self
    }

    pub fn scroll_sensitivity(&mut self, value: f32) -> &mut Self {
        self.scroll_sensitivity = value;
        self
    }
}

impl Default for MouseController {
    fn default() -> Self {
        Self {
            orbit_button: MouseButton::Left,
            pan_button: MouseButton::Right,
            drag_state: None,
            orbit_sensitivity: 0.005,
            pan_sensitivity: 0.0025,
            scroll_sensitivity: 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum DragMode {
    Orbit,
    Pan,
}

#[derive(Debug, Clone, Copy)]
struct DragState {
    mode: DragMode,
    last: Option<Vec2>,
}

impl CameraControl for MouseController {
    fn handle_event(&mut self, event: &WindowEvent, input: &mut InputState) -> bool {
        match event {
            WindowEvent::MouseInput { state, button, .. } => {
                if *state == ElementState::Pressed {
                    let mode = if *button == self.orbit_button {
                        Some(DragMode::Orbit)
                    } else if *button == self.pan_button {
                        Some(DragMode::Pan)
                    } else {
                        None
                    };

                    if let Some(mode) = mode {
                        self.drag_state = Some(DragState {
                            mode,
                            last: input.mouse_position(),
                        });
                        return true;
                    }
                } else if self
                    .drag_state
                    .as_ref()
                    .map(|state| match (state.mode, button) {
                        (DragMode::Orbit, btn) if *btn == self.orbit_button => true,
                        (DragMode::Pan, btn) if *btn == self.pan_button => true,
                        _ => false,
                    })
                    .unwrap_or(false)
                {
                    self.drag_state = None;
                    return true;
                }
                false
            }
            _ => false,
        }
    }

    fn update(&mut self, _dt: f32, input: &InputState, current: &CameraPose) -> Option<CameraPose> {
        let mut pose = *current;

        if let Some(state) = self.drag_state.as_mut() {
            if let Some(current_pos) = input.mouse_position() {
                if let Some(last) = state.last {
                    let delta = current_pos - last;
                    state.last = Some(current_pos);
                    match state.mode {
                        DragMode::Orbit => pose.orbit(delta, self.orbit_sensitivity),
                        DragMode::Pan => pose.pan(delta, self.pan_sensitivity),
                    }
                } else {
                    state.last = Some(current_pos);
                }
            }
        }

        let scroll = input.scroll_delta();
        if scroll != 0.0 {
            pose.dolly(scroll * self.scroll_sensitivity);
        }

        (pose != *current).then_some(pose)
    }

    fn on_reset(&mut self, _pose: &CameraPose) {
        self.drag_state = None;
    }
}
