#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Rollout Reef visualization.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

use std::{error::Error, fmt, time::Duration};

use serde::{Deserialize, Serialize};

/// Horizontal speed of a sprite spawned from an instantaneous response.
pub const BASE_DRIFT_SPEED: f32 = 300.0;

/// Maximum speed penalty applied to a sprite spawned from a slow response.
pub const DRIFT_SLOWDOWN: f32 = 200.0;

/// Response latency at which the speed penalty saturates.
pub const MAX_COUNTED_DELAY: Duration = Duration::from_millis(5_000);

/// Maximum number of sprites retained in the roster, oldest evicted first.
pub const SPRITE_ROSTER_CAPACITY: usize = 200;

/// Maximum number of histogram bars retained in history, oldest evicted first.
pub const BAR_HISTORY_CAPACITY: usize = 600;

/// Accumulation interval that must elapse before the histogram snapshots a bar.
pub const HISTOGRAM_WINDOW: Duration = Duration::from_secs(3);

/// Nominal cadence of the simulated-request dispatch loop.
pub const PROBE_PERIOD: Duration = Duration::from_millis(300);

/// Nominal cadence of the render tick; the real frame rate is bounded by
/// rendering cost, not this timer.
pub const FRAME_PERIOD: Duration = Duration::from_millis(10);

/// Height of the histogram chart area in surface units.
pub const CHART_PANEL_HEIGHT: f32 = 180.0;

/// Largest extent a sprite bitmap may occupy, reserved below the spawn band.
pub const SPRITE_MAX_EXTENT: f32 = 200.0;

/// Top margin reserved above the spawn band for the banner artwork.
pub const TOP_BANNER_MARGIN: f32 = 100.0;

/// Logical backend version a simulated request is assigned to.
///
/// Previously an open string key ("color"/"fish" in different skins of the
/// original UI); enumerated here so variant lookups are exhaustive at compile
/// time. The derived ordering matches ascending wire-name order.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// The "blue" rollout track.
    Blue,
    /// The "yellow" rollout track.
    Yellow,
}

impl Category {
    /// Every category known to the visualization, in ascending wire order.
    pub const ALL: [Category; 2] = [Category::Blue, Category::Yellow];

    /// Stable lowercase name used on the wire and in asset identifiers.
    #[must_use]
    pub const fn wire_name(&self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Yellow => "yellow",
        }
    }

    /// Parses a wire name back into a category.
    #[must_use]
    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.wire_name() == name)
    }
}

/// Outcome of a simulated request as conveyed by the transport status line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// The simulated request succeeded.
    Ok,
    /// The backend simulated an internal server error.
    ServerError,
}

impl StatusCode {
    /// Maps an HTTP-style status number onto the known outcomes.
    #[must_use]
    pub const fn from_u16(status: u16) -> Option<Self> {
        match status {
            200 => Some(Self::Ok),
            500 => Some(Self::ServerError),
            _ => None,
        }
    }

    /// Numeric status carried on the reply envelope.
    #[must_use]
    pub const fn as_u16(&self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::ServerError => 500,
        }
    }

    /// Whether the status denotes a terminal (failed) request.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::ServerError)
    }
}

/// Visual-detail variant appended to a category's base identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResolutionTier {
    /// Full-size artwork.
    Tier0,
    /// Slightly reduced artwork.
    Tier1,
    /// Reduced artwork.
    Tier2,
    /// Smallest artwork.
    Tier3,
}

impl ResolutionTier {
    /// Every resolution tier, ordered by decreasing artwork size.
    pub const ALL: [ResolutionTier; 4] = [
        ResolutionTier::Tier0,
        ResolutionTier::Tier1,
        ResolutionTier::Tier2,
        ResolutionTier::Tier3,
    ];

    /// Zero-based index used in asset identifiers.
    #[must_use]
    pub const fn index(&self) -> u8 {
        match self {
            Self::Tier0 => 0,
            Self::Tier1 => 1,
            Self::Tier2 => 2,
            Self::Tier3 => 3,
        }
    }

    /// Retrieves the tier matching a zero-based index.
    #[must_use]
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|tier| tier.index() == index)
    }
}

/// Whether a sprite represents a successful or a failed request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Liveness {
    /// Rendered with the category's regular artwork.
    Alive,
    /// Rendered with the darkened artwork reserved for failures.
    Dead,
}

/// Pixel dimensions of a sprite bitmap.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpriteDimensions {
    /// Bitmap width in surface units.
    pub width: f32,
    /// Bitmap height in surface units.
    pub height: f32,
}

impl SpriteDimensions {
    /// Creates a new dimensions descriptor.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Fully resolved visual identity of a sprite.
///
/// Replaces the original string-keyed lookup table so that every combination
/// of category, liveness and tier maps through an exhaustive dimensions table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpriteVariant {
    category: Category,
    liveness: Liveness,
    tier: ResolutionTier,
}

impl SpriteVariant {
    /// Creates a variant from explicit components.
    #[must_use]
    pub const fn new(category: Category, liveness: Liveness, tier: ResolutionTier) -> Self {
        Self {
            category,
            liveness,
            tier,
        }
    }

    /// Resolves the variant for a request outcome; failures select the
    /// darkened artwork before storage.
    #[must_use]
    pub const fn for_outcome(category: Category, status: StatusCode, tier: ResolutionTier) -> Self {
        let liveness = if status.is_failure() {
            Liveness::Dead
        } else {
            Liveness::Alive
        };
        Self::new(category, liveness, tier)
    }

    /// Category component of the variant.
    #[must_use]
    pub const fn category(&self) -> Category {
        self.category
    }

    /// Liveness component of the variant.
    #[must_use]
    pub const fn liveness(&self) -> Liveness {
        self.liveness
    }

    /// Resolution tier component of the variant.
    #[must_use]
    pub const fn tier(&self) -> ResolutionTier {
        self.tier
    }

    /// Stable asset identifier used for image-cache lookups, e.g. `darkblue1`.
    #[must_use]
    pub fn asset_name(&self) -> String {
        let marker = match self.liveness {
            Liveness::Alive => "",
            Liveness::Dead => "dark",
        };
        format!(
            "{marker}{}{}",
            self.category.wire_name(),
            self.tier.index()
        )
    }

    /// Bitmap dimensions for the variant.
    ///
    /// Darkened artwork shares the dimensions of the regular artwork, so the
    /// table only branches on category and tier.
    #[must_use]
    pub const fn dimensions(&self) -> SpriteDimensions {
        match (self.category, self.tier) {
            (Category::Blue, ResolutionTier::Tier0) => SpriteDimensions::new(73.0, 70.0),
            (Category::Blue, ResolutionTier::Tier1) => SpriteDimensions::new(62.0, 60.0),
            (Category::Blue, ResolutionTier::Tier2) => SpriteDimensions::new(52.0, 50.0),
            (Category::Blue, ResolutionTier::Tier3) => SpriteDimensions::new(43.0, 41.0),
            (Category::Yellow, ResolutionTier::Tier0) => SpriteDimensions::new(122.0, 70.0),
            (Category::Yellow, ResolutionTier::Tier1) => SpriteDimensions::new(105.0, 61.0),
            (Category::Yellow, ResolutionTier::Tier2) => SpriteDimensions::new(91.0, 56.0),
            (Category::Yellow, ResolutionTier::Tier3) => SpriteDimensions::new(79.0, 51.0),
        }
    }
}

/// Unique identifier assigned to a sprite by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpriteId(u64);

impl SpriteId {
    /// Creates a new sprite identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Derives the horizontal drift speed of a sprite from its response latency.
///
/// The speed is a decreasing affine function of latency that saturates at
/// [`MAX_COUNTED_DELAY`] and is explicitly floored at zero. The floor cannot
/// trigger with the configured constants, but the contract guarantees a
/// non-negative speed rather than inheriting that property accidentally.
#[must_use]
pub fn horizontal_drift_speed(round_trip: Duration) -> f32 {
    let counted = round_trip.min(MAX_COUNTED_DELAY);
    let fraction = counted.as_secs_f32() / MAX_COUNTED_DELAY.as_secs_f32();
    (BASE_DRIFT_SPEED - DRIFT_SLOWDOWN * fraction).max(0.0)
}

/// Per-category configuration exported by the control panel for transmission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelValues {
    /// Category the entry configures.
    pub category: Category,
    /// Probability (percent) that the backend answers with a 500.
    #[serde(rename = "return500")]
    pub return_500: u32,
    /// Probability (percent) that the backend injects latency.
    #[serde(rename = "delayPercent")]
    pub delay_percent: u32,
    /// Injected latency in whole seconds.
    #[serde(rename = "delayLength")]
    pub delay_length: u32,
}

impl PanelValues {
    /// Creates a new panel value export.
    #[must_use]
    pub const fn new(
        category: Category,
        return_500: u32,
        delay_percent: u32,
        delay_length: u32,
    ) -> Self {
        Self {
            category,
            return_500,
            delay_percent,
            delay_length,
        }
    }
}

/// Reply envelope produced by a probe transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProbeReply {
    /// HTTP-style status number; read from the envelope, never the body.
    pub status: u16,
    /// JSON body naming the category that served the request.
    pub body: String,
    /// Time the backend spent servicing the request, including injected delay.
    pub service_time: Duration,
}

/// Errors surfaced by a probe transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProbeError {
    /// The transport could not deliver the request at all.
    Unreachable {
        /// Human-readable failure detail.
        detail: String,
    },
    /// The request payload could not be understood by the backend.
    MalformedPayload {
        /// Human-readable failure detail.
        detail: String,
    },
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreachable { detail } => write!(f, "probe transport unreachable: {detail}"),
            Self::MalformedPayload { detail } => write!(f, "malformed probe payload: {detail}"),
        }
    }
}

impl Error for ProbeError {}

/// Port through which the traffic system dispatches simulated requests.
///
/// The in-process simulated backend is the canonical implementation; tests
/// substitute scripted transports. A dispatch resolves immediately from the
/// caller's perspective, with the injected delay reported as `service_time`
/// so the caller can defer the completion.
pub trait ProbeTransport {
    /// Delivers the serialized panel payload and returns the reply envelope.
    fn dispatch(&mut self, payload: &str) -> Result<ProbeReply, ProbeError>;
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Configures the drawing surface the world spawns sprites against.
    ConfigureSurface {
        /// Surface width in surface units.
        width: f32,
        /// Surface height in surface units.
        height: f32,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Spawns a sprite for a completed simulated request and records its
    /// sample in the histogram window.
    SpawnSprite {
        /// Category the backend assigned to the request.
        category: Category,
        /// Outcome conveyed by the reply status.
        status: StatusCode,
        /// Randomly chosen visual-detail tier.
        tier: ResolutionTier,
        /// Vertical spawn position as a fraction of the spawn band, 0.0..=1.0.
        lane: f32,
        /// Measured round-trip latency of the request.
        round_trip: Duration,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the drawing surface dimensions changed.
    SurfaceConfigured {
        /// Surface width in surface units.
        width: f32,
        /// Surface height in surface units.
        height: f32,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a sprite was spawned at the roster front.
    SpriteSpawned {
        /// Identifier assigned to the sprite by the world.
        sprite: SpriteId,
        /// Resolved visual identity of the sprite.
        variant: SpriteVariant,
        /// Derived horizontal drift speed.
        velocity: f32,
    },
    /// Confirms that a sprite was evicted once the roster exceeded capacity.
    SpriteRetired {
        /// Identifier of the evicted sprite.
        sprite: SpriteId,
    },
    /// Announces that the histogram window snapshotted a new bar.
    BarCommitted {
        /// The percentage-normalized bar appended to history.
        bar: HistogramBar,
    },
}

/// Share of a histogram window attributed to one category.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BarSegment {
    /// Category the segment describes.
    pub category: Category,
    /// The category's share of the window total, 0.0..=1.0.
    pub share: f32,
    /// Fraction of the window total that succeeded for this category.
    pub ok_share: f32,
    /// Fraction of the window total that failed for this category.
    pub err_share: f32,
}

impl BarSegment {
    /// Creates a new bar segment.
    #[must_use]
    pub const fn new(category: Category, share: f32, ok_share: f32, err_share: f32) -> Self {
        Self {
            category,
            share,
            ok_share,
            err_share,
        }
    }
}

/// One snapshotted histogram bar: per-category window shares sorted by
/// ascending category wire name.
///
/// Shares are fractions of the window's total sample count, not global
/// totals; a category's `ok_share + err_share` equals its `share` of the
/// window rather than summing to one.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct HistogramBar {
    segments: Vec<BarSegment>,
}

impl HistogramBar {
    /// Creates a bar from segments, enforcing the ascending category order.
    #[must_use]
    pub fn from_segments(mut segments: Vec<BarSegment>) -> Self {
        segments.sort_by_key(|segment| segment.category);
        Self { segments }
    }

    /// Segments composing the bar in ascending category order.
    #[must_use]
    pub fn segments(&self) -> &[BarSegment] {
        &self.segments
    }
}

/// Immutable representation of a single sprite's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpriteSnapshot {
    /// Unique identifier assigned to the sprite.
    pub id: SpriteId,
    /// Horizontal position of the sprite's top-left corner.
    pub x: f32,
    /// Vertical position of the sprite's top-left corner.
    pub y: f32,
    /// Resolved visual identity of the sprite.
    pub variant: SpriteVariant,
    /// Whether the sprite represents a failed request.
    pub failed: bool,
}

/// Read-only snapshot describing the sprite roster in draw order.
///
/// Unlike identifier-sorted views, roster order is semantic here: the front
/// of the roster is the most recently spawned sprite and adapters draw in
/// exactly this order.
#[derive(Clone, Debug, Default)]
pub struct SpriteView {
    snapshots: Vec<SpriteSnapshot>,
}

impl SpriteView {
    /// Creates a new sprite view preserving roster order.
    #[must_use]
    pub fn from_snapshots(snapshots: Vec<SpriteSnapshot>) -> Self {
        Self { snapshots }
    }

    /// Iterator over the captured snapshots, newest first.
    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = &SpriteSnapshot> {
        self.snapshots.iter()
    }

    /// Number of sprites captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether the view captured no sprites.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<SpriteSnapshot> {
        self.snapshots
    }
}
