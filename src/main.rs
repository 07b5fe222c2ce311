use std::sync::Arc;
use std::time::Instant;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use penumbra::{
    Camera, Controls, DrawItem, FramePipeline, GpuContext, Hierarchy, LoggingConfig, Mat4, Mesh,
    RenderError, RenderSettings, RigAnimator, SceneContext, Texture, Vec3, hierarchy_draws,
    humanoid_rig, init_logging,
};

const FLOOR_Y: f32 = -2.0;

/// GPU-side state, created once the window exists.
struct Scene {
    pipeline: FramePipeline,
    floor: Mesh,
    cube: Mesh,
    albedo: Texture,
    rig: Hierarchy,
}

struct App {
    window: Option<Arc<Window>>,
    gpu: Option<GpuContext>,
    scene: Option<Scene>,
    settings: RenderSettings,
    camera: Camera,
    controls: Controls,
    animator: RigAnimator,
    texture_path: Option<String>,
    start_time: Instant,
    last_frame: Instant,
}

impl App {
    fn new(texture_path: Option<String>) -> Self {
        let camera = Camera::new().at(0.0, 4.0, 12.0).looking_at(0.0, 0.0, 0.0);
        Self {
            window: None,
            gpu: None,
            scene: None,
            settings: RenderSettings::new(),
            camera,
            controls: Controls::new(camera),
            animator: RigAnimator::default(),
            texture_path,
            start_time: Instant::now(),
            last_frame: Instant::now(),
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), Box<dyn std::error::Error>> {
        let attributes = Window::default_attributes()
            .with_title("penumbra")
            .with_inner_size(LogicalSize::new(self.settings.width, self.settings.height));
        let window = Arc::new(event_loop.create_window(attributes)?);

        let gpu = GpuContext::new(window.clone())?;
        let pipeline = FramePipeline::new(&gpu, &self.settings)?;

        let albedo = match &self.texture_path {
            Some(path) => Texture::from_file(&gpu, path).unwrap_or_else(|error| {
                log::warn!("could not load '{}': {}; using a checker", path, error);
                Texture::checker(&gpu, 512, 8, 7)
            }),
            None => Texture::checker(&gpu, 512, 8, 7),
        };

        let mut rig = humanoid_rig()?;
        rig.solve();

        self.camera.aspect = gpu.aspect();
        self.scene = Some(Scene {
            pipeline,
            floor: Mesh::plane(&gpu, 10.0, 5),
            cube: Mesh::cube(&gpu),
            albedo,
            rig,
        });
        self.gpu = Some(gpu);
        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    /// Returns false when the app should stop.
    fn redraw(&mut self) -> bool {
        let (Some(gpu), Some(scene)) = (&self.gpu, &mut self.scene) else {
            return true;
        };

        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        let time = now.duration_since(self.start_time).as_secs_f32();
        self.last_frame = now;

        if let Err(error) = self.animator.animate(&mut scene.rig, time, dt) {
            log::error!("rig animation failed: {}", error);
        }
        scene.rig.solve();

        let albedo = &scene.albedo;
        let mut draws = hierarchy_draws(&scene.rig, &scene.cube, Some(albedo));
        draws.push(
            DrawItem::new(&scene.floor, Mat4::from_translation(Vec3::new(0.0, FLOOR_Y, 0.0)))
                .with_texture(albedo)
                .casts_shadow(false),
        );

        self.camera.aspect = gpu.aspect();
        let context = SceneContext {
            camera: &self.camera,
            settings: &self.settings,
            draws: &draws,
        };

        match scene.pipeline.render(gpu, &context, |_, _| {}) {
            Ok(()) => true,
            Err(RenderError::Surface(wgpu::SurfaceError::OutOfMemory)) => {
                log::error!("surface out of memory");
                false
            }
            Err(error) => {
                log::error!("frame failed: {}", error);
                true
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(error) = self.init(event_loop) {
            log::error!("startup failed: {}", error);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(size.width, size.height);
                }
            }
            WindowEvent::KeyboardInput { ref event, .. }
                if event.state == ElementState::Pressed
                    && event.physical_key == PhysicalKey::Code(KeyCode::Escape) =>
            {
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { .. } => {
                self.controls
                    .handle_event(&event, &mut self.settings, &mut self.camera);
            }
            WindowEvent::RedrawRequested => {
                if !self.redraw() {
                    event_loop.exit();
                    return;
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => (),
        }
    }
}

fn main() {
    init_logging(LoggingConfig::new());

    let event_loop = EventLoop::new().expect("failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(std::env::args().nth(1));
    if let Err(error) = event_loop.run_app(&mut app) {
        log::error!("event loop exited with an error: {}", error);
    }
}
