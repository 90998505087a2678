#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for Rollout Reef.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in the containerised CI environment.
//! To keep `cargo test` usable everywhere we depend on macroquad without its
//! default `audio` feature.
//!
//! The adapter uses Macroquad's immediate-mode UI module for the control
//! panel. All UI-specific calls live inside the local `ui` module to avoid
//! leaking Macroquad UI types throughout the renderer.

mod atlas;
mod ui;

pub use atlas::{DrawParams, TextureAtlas, BACKGROUND_IMAGE};

use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use glam::Vec2;
use macroquad::input::{is_key_pressed, KeyCode};
use rollout_reef_rendering::{
    histogram::{layout_bars, RoundedRect, CAPSULE_FILL},
    Color, FrameInput, PanelCommand, Presentation, RenderingBackend, Scene, SurfaceExtent,
};

use self::ui::PanelUiContext;

const PANEL_WIDTH: f32 = 300.0;
const PANEL_HEIGHT: f32 = 600.0;
const PANEL_MARGIN: f32 = 50.0;

/// Tracks UI-sourced interactions so they can be merged with the next
/// frame's input.
#[derive(Clone, Copy, Debug, Default)]
struct PanelInputState {
    latched: Option<PanelCommand>,
}

impl PanelInputState {
    /// Returns the latched panel interaction and clears the latch so the
    /// action fires only once.
    fn take(&mut self) -> Option<PanelCommand> {
        self.latched.take()
    }

    /// Records a panel interaction observed during this frame.
    fn register(&mut self, command: PanelCommand) {
        self.latched = Some(command);
    }
}

/// Tracks the average frames-per-second produced by the render loop.
#[derive(Clone, Copy, Debug, Default)]
struct FpsCounter {
    elapsed: Duration,
    frames: u32,
}

impl FpsCounter {
    /// Records a rendered frame and returns the per-second average once one
    /// second has elapsed.
    fn record_frame(&mut self, dt: Duration) -> Option<f32> {
        self.elapsed += dt;
        self.frames = self.frames.saturating_add(1);

        if self.elapsed < Duration::from_secs(1) {
            return None;
        }

        let seconds = self.elapsed.as_secs_f32();
        let per_second = if seconds <= f32::EPSILON {
            0.0
        } else {
            self.frames as f32 / seconds
        };
        self.elapsed = Duration::ZERO;
        self.frames = 0;
        Some(per_second)
    }
}

/// Rendering backend implemented on top of macroquad.
#[derive(Debug, Default)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    show_fps: bool,
    manifest_path: Option<PathBuf>,
    load_images: bool,
}

impl MacroquadBackend {
    /// Returns a backend that loads images from the default manifest.
    #[must_use]
    pub fn new() -> Self {
        Self {
            swap_interval: None,
            show_fps: false,
            manifest_path: None,
            load_images: true,
        }
    }

    /// Configures the backend to request a specific swap interval.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Synchronises presentation with the display refresh rate, or renders
    /// as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Configures whether the backend prints frame rate metrics once per second.
    #[must_use]
    pub fn with_show_fps(mut self, show: bool) -> Self {
        self.show_fps = show;
        self
    }

    /// Overrides the image manifest location.
    #[must_use]
    pub fn with_manifest_path(mut self, path: PathBuf) -> Self {
        self.manifest_path = Some(path);
        self
    }

    /// Configures whether the backend should attempt to load image assets.
    #[must_use]
    pub fn with_image_loading(mut self, enabled: bool) -> Self {
        self.load_images = enabled;
        self
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static,
    {
        let Self {
            swap_interval,
            show_fps,
            manifest_path,
            load_images,
        } = self;

        let Presentation {
            window_title,
            clear_color,
            scene,
        } = presentation;

        let mut config = macroquad::window::Conf {
            window_title,
            window_width: scene.surface.width.max(1.0) as i32,
            window_height: scene.surface.height.max(1.0) as i32,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        macroquad::Window::from_config(config, async move {
            let mut scene = scene;
            let atlas = if load_images {
                let manifest =
                    manifest_path.unwrap_or_else(TextureAtlas::default_manifest_path);
                match TextureAtlas::from_manifest_path(&manifest) {
                    Ok(atlas) => Some(atlas),
                    Err(error) => {
                        // Every missing image degrades to an invisible
                        // sprite, so a missing atlas only blanks the scene.
                        tracing::warn!(%error, "running without an image atlas");
                        None
                    }
                }
            } else {
                None
            };

            let background = to_macroquad_color(clear_color);
            let mut panel_input = PanelInputState::default();
            let mut fps_counter = FpsCounter::default();

            loop {
                if is_key_pressed(KeyCode::Escape) || is_key_pressed(KeyCode::Q) {
                    break;
                }

                macroquad::window::clear_background(background);

                let screen_width = macroquad::window::screen_width();
                let screen_height = macroquad::window::screen_height();

                let dt_seconds = macroquad::time::get_frame_time();
                let frame_dt = Duration::from_secs_f32(dt_seconds.max(0.0));

                scene.surface = SurfaceExtent::new(screen_width, screen_height);
                let frame_input = FrameInput {
                    panel: panel_input.take(),
                };

                update_scene(frame_dt, frame_input, &mut scene);

                draw_backdrop(atlas.as_ref(), screen_width, screen_height);
                draw_sprites(&scene, atlas.as_ref());
                draw_histogram(&scene, screen_width, screen_height);

                let panel_context = PanelUiContext {
                    origin: macroquad::math::Vec2::new(
                        (screen_width - PANEL_WIDTH - PANEL_MARGIN).max(0.0),
                        PANEL_MARGIN,
                    ),
                    size: macroquad::math::Vec2::new(PANEL_WIDTH, PANEL_HEIGHT),
                    background: macroquad::color::Color::from_rgba(39, 12, 83, 200),
                };
                {
                    let mut root_ui = macroquad::ui::root_ui();
                    if let Some(command) =
                        ui::draw_panel_ui(&mut root_ui, &scene.panel, panel_context)
                    {
                        panel_input.register(command);
                    }
                }

                if show_fps {
                    if let Some(per_second) = fps_counter.record_frame(frame_dt) {
                        println!("FPS: {per_second:.2}");
                    }
                }

                macroquad::window::next_frame().await;
            }
        });

        Ok(())
    }
}

fn draw_backdrop(atlas: Option<&TextureAtlas>, screen_width: f32, screen_height: f32) {
    let Some(atlas) = atlas else {
        return;
    };
    let _ = atlas.draw(
        BACKGROUND_IMAGE,
        DrawParams::new(Vec2::ZERO, Vec2::new(screen_width, screen_height)),
    );
}

fn draw_sprites(scene: &Scene, atlas: Option<&TextureAtlas>) {
    let Some(atlas) = atlas else {
        return;
    };
    for instance in &scene.sprites {
        let _ = atlas.draw(
            &instance.variant.asset_name(),
            DrawParams::new(instance.position, instance.size),
        );
    }
}

fn draw_histogram(scene: &Scene, screen_width: f32, screen_height: f32) {
    for geometry in layout_bars(screen_width, screen_height, &scene.bars) {
        draw_rounded_rect(geometry.capsule, CAPSULE_FILL);
        for segment in geometry.segments {
            draw_rounded_rect(segment.rect, segment.fill);
        }
    }
}

/// Approximates a rounded rectangle with axis-aligned rectangles and corner
/// circles; macroquad has no rounded-rect primitive.
fn draw_rounded_rect(rect: RoundedRect, fill: Color) {
    if rect.height <= 0.0 || rect.width <= 0.0 {
        return;
    }

    let color = to_macroquad_color(fill);
    let radius = rect.effective_radius();
    if radius <= f32::EPSILON {
        macroquad::shapes::draw_rectangle(rect.x, rect.y, rect.width, rect.height, color);
        return;
    }

    macroquad::shapes::draw_rectangle(
        rect.x,
        rect.y + radius,
        rect.width,
        rect.height - 2.0 * radius,
        color,
    );
    macroquad::shapes::draw_rectangle(
        rect.x + radius,
        rect.y,
        rect.width - 2.0 * radius,
        rect.height,
        color,
    );
    for (corner_x, corner_y) in [
        (rect.x + radius, rect.y + radius),
        (rect.x + rect.width - radius, rect.y + radius),
        (rect.x + radius, rect.y + rect.height - radius),
        (rect.x + rect.width - radius, rect.y + rect.height - radius),
    ] {
        macroquad::shapes::draw_circle(corner_x, corner_y, radius, color);
    }
}

pub(crate) fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}
