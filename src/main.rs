// PlacentaFlow - Sequential Placental Circulation Animator
// Licensed under MIT License

mod controller;
mod particles;
mod scene;
mod stages;

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use anyhow::{Context, Result};
use egui_wgpu::ScreenDescriptor;
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::EventLoop;
use winit::keyboard::{KeyCode, PhysicalKey};

use controller::{StageController, MAX_SPEED, MIN_SPEED, SPEED_STEP};
use particles::{generate_particles, FrameJitter, Particle};
use stages::FINAL_STAGE;

const WINDOW_TITLE: &str = "Placental Blood Flow Animator";
const FRAME_TIME_CAP: Duration = Duration::from_millis(16);

/// Window clear color behind the egui panels.
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.09,
    g: 0.09,
    b: 0.10,
    a: 1.0,
};

struct ViewerState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_config: wgpu::SurfaceConfiguration,
    egui_renderer: egui_wgpu::Renderer,
}

impl ViewerState {
    fn new(window: Arc<winit::window::Window>) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .context("create window surface")?;
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no compatible GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Viewer Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("request GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps.formats[0];
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        Ok(Self {
            surface,
            device,
            queue,
            surface_config,
            egui_renderer,
        })
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.surface_config.width = new_size.width;
            self.surface_config.height = new_size.height;
            self.surface.configure(&self.device, &self.surface_config);
        }
    }

    fn render(
        &mut self,
        clipped_primitives: Vec<egui::ClippedPrimitive>,
        textures_delta: egui::TexturesDelta,
        screen_descriptor: ScreenDescriptor,
    ) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui Encoder"),
            });

        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &clipped_primitives,
            &screen_descriptor,
        );

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            // SAFETY: The render pass lives long enough for this call.
            // The lifetime requirement is overly restrictive in egui-wgpu 0.29.
            let rpass_static: &mut wgpu::RenderPass<'static> =
                unsafe { std::mem::transmute(&mut rpass) };
            self.egui_renderer
                .render(rpass_static, &clipped_primitives, &screen_descriptor);
        }

        for id in &textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

fn build_ui(ctx: &egui::Context, controller: &mut StageController, particles: &[Particle]) {
    egui::SidePanel::left("stage_controls")
        .default_width(340.0)
        .resizable(true)
        .frame(
            egui::Frame::none()
                .fill(egui::Color32::from_rgb(70, 70, 70))
                .inner_margin(egui::Margin::same(10.0)),
        )
        .show(ctx, |ui| {
            ui.heading(
                egui::RichText::new("Placental Blood Flow")
                    .color(egui::Color32::WHITE)
                    .strong(),
            );
            ui.label(
                egui::RichText::new(stages::descriptor(controller.state.stage).title)
                    .color(egui::Color32::WHITE),
            );
            ui.add(
                egui::ProgressBar::new(controller.state.progress / 100.0)
                    .fill(egui::Color32::from_rgb(230, 160, 188))
                    .show_percentage(),
            );
            ui.add_space(8.0);

            egui::Frame::none()
                .fill(egui::Color32::from_rgb(85, 85, 85))
                .inner_margin(egui::Margin::same(8.0))
                .show(ui, |ui| {
                    ui.horizontal_wrapped(|ui| {
                        let play_label = if controller.state.playing {
                            "Pause"
                        } else {
                            "Play"
                        };
                        if ui.button(play_label).clicked() {
                            controller.toggle_play();
                        }
                        let at_first = controller.state.stage == 0;
                        if ui
                            .add_enabled(!at_first, egui::Button::new("Previous"))
                            .clicked()
                        {
                            controller.prev_stage();
                        }
                        let at_last = controller.state.stage == FINAL_STAGE;
                        if ui.add_enabled(!at_last, egui::Button::new("Next")).clicked() {
                            controller.next_stage();
                        }
                        if ui.button("Reset").clicked() {
                            controller.reset();
                        }
                    });
                });
            ui.add_space(8.0);

            ui.horizontal(|ui| {
                ui.label("Speed:");
                ui.add(
                    egui::Slider::new(&mut controller.state.speed, MIN_SPEED..=MAX_SPEED)
                        .step_by(SPEED_STEP)
                        .suffix("x"),
                );
            });
            ui.checkbox(&mut controller.state.auto_advance, "Auto-advance");
            ui.checkbox(&mut controller.state.show_labels, "Labels");
            ui.separator();

            ui.label(egui::RichText::new("Jump to stage:").strong());
            let mut jump_target = None;
            for (idx, stage) in stages::STAGES.iter().enumerate() {
                let active = idx == controller.state.stage;
                if ui.selectable_label(active, stage.title).clicked() {
                    jump_target = Some(idx);
                }
            }
            if let Some(idx) = jump_target {
                controller.jump_to_stage(idx);
            }
            ui.separator();

            ui.label(egui::RichText::new("Current stage:").strong());
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.label(stages::descriptor(controller.state.stage).explanation);
            });
        });

    egui::CentralPanel::default()
        .frame(egui::Frame::none().fill(egui::Color32::from_rgb(32, 32, 36)))
        .show(ctx, |ui| {
            let (response, painter) =
                ui.allocate_painter(ui.available_size(), egui::Sense::hover());
            let to_screen = scene::canvas_transform(response.rect);
            scene::paint_scene(&painter, &to_screen, &controller.state, particles);
        });
}

fn main() -> Result<()> {
    use env_logger::Env;
    env_logger::Builder::from_env(Env::default().default_filter_or("error")).init();

    let event_loop = EventLoop::new().context("create event loop")?;
    let window = Arc::new(
        event_loop
            .create_window(
                winit::window::WindowAttributes::default()
                    .with_title(WINDOW_TITLE)
                    .with_inner_size(winit::dpi::LogicalSize::new(1180, 640)),
            )
            .context("create window")?,
    );

    let mut viewer = ViewerState::new(window.clone())?;
    let mut controller = StageController::new();
    let mut last_frame_time = Instant::now();

    let mut egui_state = egui_winit::State::new(
        egui::Context::default(),
        egui::ViewportId::ROOT,
        &window,
        None,
        None,
        None,
    );

    event_loop.run(move |event, target| {
        let Event::WindowEvent { event, window_id } = event else {
            return;
        };
        if window_id != window.id() {
            return;
        }

        // Let egui handle the event first; keyboard shortcuts only apply
        // when egui did not consume it (e.g. while a slider is focused).
        let response = egui_state.on_window_event(&window, &event);

        match event {
            WindowEvent::CloseRequested => target.exit(),
            WindowEvent::Resized(physical_size) => viewer.resize(physical_size),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key,
                        state: key_state,
                        ..
                    },
                ..
            } if !response.consumed => {
                if key_state == ElementState::Pressed {
                    match physical_key {
                        PhysicalKey::Code(KeyCode::Space) => controller.toggle_play(),
                        PhysicalKey::Code(KeyCode::ArrowRight) => controller.next_stage(),
                        PhysicalKey::Code(KeyCode::ArrowLeft) => controller.prev_stage(),
                        PhysicalKey::Code(KeyCode::KeyR) => controller.reset(),
                        _ => {}
                    }
                    window.request_redraw();
                }
            }
            WindowEvent::RedrawRequested => {
                // Frame pacing; the 50 ms tick deadline is much coarser than
                // the frame rate, so polling once per frame is enough.
                let elapsed = last_frame_time.elapsed();
                if elapsed < FRAME_TIME_CAP {
                    std::thread::sleep(FRAME_TIME_CAP - elapsed);
                }
                last_frame_time = Instant::now();

                controller.poll(Instant::now());

                let jitter = FrameJitter::from_clock(SystemTime::now());
                let particles = generate_particles(
                    controller.state.stage,
                    controller.state.progress,
                    &jitter,
                );

                let raw_input = egui_state.take_egui_input(&window);
                let full_output = egui_state.egui_ctx().run(raw_input, |ctx| {
                    build_ui(ctx, &mut controller, &particles);
                });
                egui_state.handle_platform_output(&window, full_output.platform_output);

                let clipped_primitives = egui_state
                    .egui_ctx()
                    .tessellate(full_output.shapes, full_output.pixels_per_point);
                let screen_descriptor = ScreenDescriptor {
                    size_in_pixels: [viewer.surface_config.width, viewer.surface_config.height],
                    pixels_per_point: window.scale_factor() as f32,
                };

                match viewer.render(
                    clipped_primitives,
                    full_output.textures_delta,
                    screen_descriptor,
                ) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => viewer.resize(window.inner_size()),
                    Err(wgpu::SurfaceError::Outdated) => {}
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        eprintln!("out of GPU memory, exiting");
                        target.exit();
                    }
                    Err(e) => eprintln!("{:?}", e),
                }

                window.request_redraw();
            }
            _ => {}
        }
    })?;

    Ok(())
}
