#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Rollout Reef adapters.

pub mod histogram;

use anyhow::Result as AnyResult;
use glam::Vec2;
use rollout_reef_core::{Category, HistogramBar, SpriteVariant};
use std::time::Duration;

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }
}

/// Dimensions of the drawing surface in surface units.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct SurfaceExtent {
    /// Surface width.
    pub width: f32,
    /// Surface height.
    pub height: f32,
}

impl SurfaceExtent {
    /// Creates a new surface extent.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// A sprite placed in the scene, resolved to a position and draw size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpriteInstance {
    /// Visual identity used to look the bitmap up in the image cache.
    pub variant: SpriteVariant,
    /// Top-left corner of the sprite in surface units.
    pub position: Vec2,
    /// Draw size of the sprite in surface units.
    pub size: Vec2,
}

impl SpriteInstance {
    /// Creates a sprite instance at the provided position, sized from the
    /// variant's dimensions table.
    #[must_use]
    pub fn at(variant: SpriteVariant, position: Vec2) -> Self {
        let dimensions = variant.dimensions();
        Self {
            variant,
            position,
            size: Vec2::new(dimensions.width, dimensions.height),
        }
    }
}

/// One control-panel row presented to the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PanelEntryView {
    /// Category the row configures.
    pub category: Category,
    /// Error-rate percent shown on the first slider.
    pub return_500: u32,
    /// Delay probability percent shown on the second slider.
    pub delay_percent: u32,
    /// Injected latency seconds shown on the third slider.
    pub delay_length: u32,
    /// Whether this row is the current selection.
    pub selected: bool,
}

/// Presentable control-panel state.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct PanelView {
    /// Rows in discovery order.
    pub entries: Vec<PanelEntryView>,
}

/// Interaction captured from the control-panel UI during one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelCommand {
    /// The user clicked a category row.
    Select(Category),
    /// The user moved the sliders of the current selection.
    Adjust {
        /// New error-rate percent.
        return_500: u32,
        /// New delay probability percent.
        delay_percent: u32,
        /// New injected latency in whole seconds.
        delay_length: u32,
    },
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct FrameInput {
    /// Control-panel interaction observed on this frame, if any.
    pub panel: Option<PanelCommand>,
}

/// Scene description combining the surface, the sprite stream, the histogram
/// history, and the control panel.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Scene {
    /// Drawing surface dimensions.
    pub surface: SurfaceExtent,
    /// Sprites in draw order, newest first.
    pub sprites: Vec<SpriteInstance>,
    /// Histogram bars from oldest to newest.
    pub bars: Vec<HistogramBar>,
    /// Control-panel rows.
    pub panel: PanelView,
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame when no background bitmap exists.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Rollout Reef scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the real frame delta and
    /// per-frame input captured by the adapter, and may mutate the scene
    /// before it is rendered.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}
