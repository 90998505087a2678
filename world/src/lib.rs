#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Rollout Reef.
//!
//! The world owns the sprite roster and the histogram aggregation state and
//! mutates them exclusively through [`apply`]. Systems and adapters observe
//! the world through the read-only [`query`] module and the events emitted by
//! each command.

mod histogram;
pub mod query;

use std::{collections::VecDeque, time::Duration};

use rollout_reef_core::{
    horizontal_drift_speed, Command, Event, HistogramBar, SpriteId, SpriteVariant,
    BAR_HISTORY_CAPACITY, CHART_PANEL_HEIGHT, SPRITE_MAX_EXTENT, SPRITE_ROSTER_CAPACITY,
    TOP_BANNER_MARGIN,
};

use crate::histogram::HistogramWindow;

const DEFAULT_SURFACE_WIDTH: f32 = 1280.0;
const DEFAULT_SURFACE_HEIGHT: f32 = 720.0;

/// Dimensions of the drawing surface sprites stream across.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceSize {
    width: f32,
    height: f32,
}

impl SurfaceSize {
    /// Creates a new surface description.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Surface width in surface units.
    #[must_use]
    pub const fn width(&self) -> f32 {
        self.width
    }

    /// Surface height in surface units.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.height
    }

    /// Vertical position inside the spawn band for a lane fraction.
    ///
    /// The band excludes the chart area at the bottom, the banner margin at
    /// the top, and the largest sprite extent so artwork never spawns
    /// clipped. Lanes outside `0.0..=1.0` are clamped.
    #[must_use]
    pub fn spawn_height(&self, lane: f32) -> f32 {
        let band = (self.height - CHART_PANEL_HEIGHT - SPRITE_MAX_EXTENT - TOP_BANNER_MARGIN)
            .max(0.0);
        band * lane.clamp(0.0, 1.0) + TOP_BANNER_MARGIN
    }
}

/// A single moving visual element owned by the world.
#[derive(Clone, Debug)]
pub(crate) struct Sprite {
    id: SpriteId,
    x: f32,
    y: f32,
    velocity_x: f32,
    velocity_y: f32,
    variant: SpriteVariant,
    failed: bool,
}

impl Sprite {
    fn advance(&mut self, dt: Duration) {
        let seconds = dt.as_secs_f32();
        // Motion is leftward toward the viewer; the vertical axis is a
        // currently unused hook with velocity fixed at zero.
        self.x -= self.velocity_x * seconds;
        self.y += self.velocity_y * seconds;
    }
}

/// Represents the authoritative Rollout Reef world state.
#[derive(Debug)]
pub struct World {
    surface: SurfaceSize,
    sprites: VecDeque<Sprite>,
    window: HistogramWindow,
    bars: VecDeque<HistogramBar>,
    next_sprite: u64,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Creates a new world ready for simulation.
    #[must_use]
    pub fn new() -> Self {
        Self {
            surface: SurfaceSize::new(DEFAULT_SURFACE_WIDTH, DEFAULT_SURFACE_HEIGHT),
            sprites: VecDeque::with_capacity(SPRITE_ROSTER_CAPACITY),
            window: HistogramWindow::new(),
            bars: VecDeque::new(),
            next_sprite: 0,
        }
    }

    fn allocate_sprite_id(&mut self) -> SpriteId {
        let id = SpriteId::new(self.next_sprite);
        self.next_sprite = self.next_sprite.wrapping_add(1);
        id
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureSurface { width, height } => {
            world.surface = SurfaceSize::new(width, height);
            out_events.push(Event::SurfaceConfigured { width, height });
        }
        Command::Tick { dt } => {
            out_events.push(Event::TimeAdvanced { dt });

            for sprite in world.sprites.iter_mut() {
                sprite.advance(dt);
            }

            if let Some(bar) = world.window.advance(dt) {
                world.bars.push_back(bar.clone());
                while world.bars.len() > BAR_HISTORY_CAPACITY {
                    let _ = world.bars.pop_front();
                }
                out_events.push(Event::BarCommitted { bar });
            }
        }
        Command::SpawnSprite {
            category,
            status,
            tier,
            lane,
            round_trip,
        } => {
            let variant = SpriteVariant::for_outcome(category, status, tier);
            let velocity = horizontal_drift_speed(round_trip);
            let id = world.allocate_sprite_id();
            let sprite = Sprite {
                id,
                x: world.surface.width(),
                y: world.surface.spawn_height(lane),
                velocity_x: velocity,
                velocity_y: 0.0,
                variant,
                failed: status.is_failure(),
            };

            world.sprites.push_front(sprite);
            while world.sprites.len() > SPRITE_ROSTER_CAPACITY {
                if let Some(evicted) = world.sprites.pop_back() {
                    out_events.push(Event::SpriteRetired { sprite: evicted.id });
                }
            }

            world.window.record(category, status);
            out_events.push(Event::SpriteSpawned {
                sprite: id,
                variant,
                velocity,
            });
        }
    }
}
