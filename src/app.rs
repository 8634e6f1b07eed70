use std::sync::Arc;
use std::time::{Duration, Instant};

use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{DeviceEvent, DeviceId, ElementState, Event, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::config::ViewerConfig;
use crate::error::{Result, VistaError};
use crate::gfx::rendering::RenderEngine;
use crate::ui::UiManager;
use crate::views::{ModelViewer, PanoramaTour, Pointer, RoomTour, View};

/// Which view the app opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ViewMode {
    /// Building cluster with hover details
    Model,
    /// Walkable room with floor waypoints
    Room,
    /// Equirectangular rooms linked by hotspots
    Panorama,
}

impl ViewMode {
    pub fn create_view(self, config: &ViewerConfig) -> Result<Box<dyn View>> {
        Ok(match self {
            ViewMode::Model => Box::new(ModelViewer::new(&config.model_viewer, &config.lighting)?),
            ViewMode::Room => Box::new(RoomTour::new(&config.room_tour, &config.lighting)?),
            ViewMode::Panorama => {
                Box::new(PanoramaTour::new(&config.panorama, &config.lighting)?)
            }
        })
    }
}

/// Turns left-button presses into single and double clicks.
#[derive(Debug, Clone)]
pub struct ClickTracker {
    interval: Duration,
    slop: f32,
    last: Option<(Instant, [f32; 2])>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Click {
    Single,
    Double,
}

impl ClickTracker {
    pub fn new(interval: Duration, slop: f32) -> Self {
        Self {
            interval,
            slop,
            last: None,
        }
    }

    /// Registers a press at `position`. A press close in time and space to
    /// the previous one completes a double click; the pair is then consumed.
    pub fn press(&mut self, at: Instant, position: [f32; 2]) -> Click {
        if let Some((time, previous)) = self.last.take() {
            let dx = position[0] - previous[0];
            let dy = position[1] - previous[1];
            if at.duration_since(time) <= self.interval && dx * dx + dy * dy <= self.slop * self.slop
            {
                return Click::Double;
            }
        }
        self.last = Some((at, position));
        Click::Single
    }
}

impl Default for ClickTracker {
    fn default() -> Self {
        Self::new(Duration::from_millis(400), 4.0)
    }
}

pub struct VistaApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    config: ViewerConfig,
    view: Box<dyn View>,
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    ui_manager: Option<UiManager>,
    cursor: Option<[f32; 2]>,
    clicks: ClickTracker,
    last_frame: Instant,
    error: Option<VistaError>,
}

impl VistaApp {
    /// Loads the assets for `mode`; fails on a missing model or a broken
    /// tour table.
    pub fn new(config: ViewerConfig, mode: ViewMode) -> Result<Self> {
        let event_loop = EventLoop::new()?;
        let view = mode.create_view(&config)?;
        log::info!("Opening {}", view.title());

        Ok(Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                config,
                view,
                window: None,
                render_engine: None,
                ui_manager: None,
                cursor: None,
                clicks: ClickTracker::default(),
                last_frame: Instant::now(),
                error: None,
            },
        })
    }

    /// Runs the event loop until the window closes.
    pub fn run(mut self) -> Result<()> {
        let Some(event_loop) = self.event_loop.take() else {
            return Ok(());
        };
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop.run_app(&mut self.app_state)?;

        match self.app_state.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl AppState {
    fn viewport(&self) -> (f32, f32) {
        self.render_engine
            .as_ref()
            .map(|engine| {
                let (width, height) = engine.get_surface_size();
                (width as f32, height as f32)
            })
            .unwrap_or((1.0, 1.0))
    }

    fn pointer(&self) -> Option<Pointer> {
        self.cursor.map(|position| Pointer {
            position,
            viewport: self.viewport(),
        })
    }

    fn ui_wants_mouse(&self) -> bool {
        self.ui_manager
            .as_ref()
            .is_some_and(|ui_manager| ui_manager.wants_mouse())
    }

    fn handle_left_press(&mut self) {
        let Some(pointer) = self.pointer() else {
            return;
        };
        match self.clicks.press(Instant::now(), pointer.position) {
            Click::Single => self.view.click(pointer),
            Click::Double => self.view.double_click(pointer),
        }
    }

    fn redraw(&mut self) {
        let (Some(window), Some(render_engine), Some(ui_manager)) = (
            self.window.as_ref(),
            self.render_engine.as_mut(),
            self.ui_manager.as_mut(),
        ) else {
            return;
        };

        let now = Instant::now();
        let delta_seconds = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;

        let (width, height) = render_engine.get_surface_size();
        self.view.update(delta_seconds, (width as f32, height as f32));

        let camera = &mut self.view.camera_manager_mut().camera;
        camera.update_view_proj();
        let uniform = camera.uniform;
        render_engine.set_light(self.view.light());
        render_engine.update(uniform);
        render_engine.prepare(self.view.scene_mut());

        let view = &mut self.view;
        ui_manager.update_logic(window, |ui| view.draw_ui(ui));

        let result = render_engine.render_frame(
            self.view.scene(),
            Some(|device: &wgpu::Device,
                  queue: &wgpu::Queue,
                  encoder: &mut wgpu::CommandEncoder,
                  target: &wgpu::TextureView| {
                ui_manager.render_display_only(device, queue, encoder, target)
            }),
        );
        if let Err(e) = result {
            log::error!("Frame failed: {}", e);
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_config = &self.config.window;
        let attributes = WindowAttributes::default()
            .with_title(format!("{} - {}", window_config.title, self.view.title()))
            .with_inner_size(LogicalSize::new(window_config.width, window_config.height));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let (width, height) = window.inner_size().into();
        let renderer = match pollster::block_on(RenderEngine::new(window.clone(), width, height))
        {
            Ok(renderer) => renderer,
            Err(e) => {
                log::error!("Failed to initialise rendering: {}", e);
                self.error = Some(e);
                event_loop.exit();
                return;
            }
        };

        let ui_manager = UiManager::new(
            renderer.device(),
            renderer.queue(),
            renderer.surface_format(),
            &window,
        );

        self.view
            .camera_manager_mut()
            .camera
            .resize_projection(width, height);
        renderer.prepare(self.view.scene_mut());
        log::info!("Scene ready: {:?}", self.view.scene().get_statistics());

        self.last_frame = Instant::now();
        self.ui_manager = Some(ui_manager);
        self.render_engine = Some(renderer);
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(window) = self.window.clone() else {
            return;
        };

        // Releases always reach the orbit controls so a drag never sticks.
        if let WindowEvent::MouseInput {
            state: ElementState::Released,
            button,
            ..
        } = event
        {
            self.view
                .camera_manager_mut()
                .process_mouse_button(button, ElementState::Released);
        }

        if let Some(ui_manager) = self.ui_manager.as_mut() {
            let ui_event: Event<()> = Event::WindowEvent {
                window_id,
                event: event.clone(),
            };
            if ui_manager.handle_input(&window, &ui_event) {
                if matches!(event, WindowEvent::CursorMoved { .. }) {
                    self.view.pointer_moved(None);
                }
                return;
            }
        }

        match event {
            WindowEvent::KeyboardInput {
                event: key_event, ..
            } => {
                if key_event.physical_key == PhysicalKey::Code(KeyCode::Escape) {
                    event_loop.exit();
                    return;
                }
                self.view
                    .camera_manager_mut()
                    .process_keyboard_event(&key_event);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Some([position.x as f32, position.y as f32]);
                let pointer = self.pointer();
                self.view.pointer_moved(pointer);
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                self.view.pointer_moved(None);
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button,
                ..
            } => {
                if self.view.orbit_enabled() {
                    self.view
                        .camera_manager_mut()
                        .process_mouse_button(button, ElementState::Pressed);
                }
                if button == MouseButton::Left {
                    self.handle_left_press();
                }
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                self.view
                    .camera_manager_mut()
                    .camera
                    .resize_projection(width, height);
                if let Some(render_engine) = self.render_engine.as_mut() {
                    render_engine.resize(width, height);
                }
                if let Some(ui_manager) = self.ui_manager.as_mut() {
                    ui_manager.update_display_size(width, height);
                }
            }
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => (),
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        if self.window.is_none() || !self.view.orbit_enabled() || self.ui_wants_mouse() {
            return;
        }
        self.view.camera_manager_mut().process_event(&event);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_press_nearby_is_double_click() {
        let mut clicks = ClickTracker::default();
        let t0 = Instant::now();
        assert_eq!(clicks.press(t0, [100.0, 100.0]), Click::Single);
        assert_eq!(
            clicks.press(t0 + Duration::from_millis(200), [102.0, 101.0]),
            Click::Double
        );
        // The pair is consumed: a third press starts over.
        assert_eq!(
            clicks.press(t0 + Duration::from_millis(300), [102.0, 101.0]),
            Click::Single
        );
    }

    #[test]
    fn slow_or_distant_presses_stay_single() {
        let mut clicks = ClickTracker::default();
        let t0 = Instant::now();
        clicks.press(t0, [100.0, 100.0]);
        assert_eq!(
            clicks.press(t0 + Duration::from_millis(500), [100.0, 100.0]),
            Click::Single
        );
        assert_eq!(
            clicks.press(t0 + Duration::from_millis(600), [120.0, 100.0]),
            Click::Single
        );
    }
}
