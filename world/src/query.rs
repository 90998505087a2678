//! Read-only queries over the authoritative world state.

use rollout_reef_core::{HistogramBar, SpriteSnapshot, SpriteView};

use crate::{SurfaceSize, World};

/// Captures the sprite roster in draw order, newest first.
#[must_use]
pub fn sprites(world: &World) -> SpriteView {
    let snapshots: Vec<SpriteSnapshot> = world
        .sprites
        .iter()
        .map(|sprite| SpriteSnapshot {
            id: sprite.id,
            x: sprite.x,
            y: sprite.y,
            variant: sprite.variant,
            failed: sprite.failed,
        })
        .collect();
    SpriteView::from_snapshots(snapshots)
}

/// Iterates the committed histogram bars from oldest to newest.
pub fn bars(world: &World) -> impl Iterator<Item = &HistogramBar> {
    world.bars.iter()
}

/// Current drawing surface dimensions.
#[must_use]
pub fn surface(world: &World) -> SurfaceSize {
    world.surface
}

/// Number of samples accumulated in the histogram window but not yet flushed.
#[must_use]
pub fn pending_window_total(world: &World) -> u64 {
    world.window.pending_total()
}
