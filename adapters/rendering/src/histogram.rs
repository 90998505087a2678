//! Geometry for the rolling outcome histogram.
//!
//! Layout follows the original chart: bars march leftward from a fixed
//! anchor at one third of the surface width, newest bar at the anchor, each
//! bar a translucent capsule holding stacked rounded segments. All math here
//! is pure so adapters only translate rectangles into draw calls.

use rollout_reef_core::{Category, HistogramBar, Liveness, CHART_PANEL_HEIGHT};

use crate::Color;

/// Width of one histogram bar in surface units.
pub const BAR_WIDTH: f32 = 17.0;

/// Horizontal gutter between adjacent bars.
pub const BAR_GAP: f32 = 20.0;

/// Corner radius requested for capsules and segments before clamping.
pub const BAR_CORNER_RADIUS: f32 = 8.0;

/// Extra height the background capsule extends beyond the tallest segment.
pub const CAPSULE_EXTRA_HEIGHT: f32 = 20.0;

/// Distance between the bottom of the bars and the bottom surface edge.
pub const BOTTOM_OFFSET: f32 = 100.0;

/// Translucent fill behind every bar.
pub const CAPSULE_FILL: Color = Color::new(225.0 / 255.0, 225.0 / 255.0, 225.0 / 255.0, 0.2);

/// Color used for every failure sub-segment regardless of category.
const FAILURE_FILL: Color = Color::from_rgb_u8(255, 0, 0);

/// Fill color for a category's histogram segment.
#[must_use]
pub fn segment_color(category: Category, liveness: Liveness) -> Color {
    match liveness {
        Liveness::Dead => FAILURE_FILL,
        Liveness::Alive => match category {
            Category::Blue => Color::from_rgb_u8(0x77, 0x19, 0xd6),
            Category::Yellow => Color::from_rgb_u8(0xfe, 0xb2, 0x02),
        },
    }
}

/// Axis-aligned rectangle with rounded corners.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RoundedRect {
    /// Left edge in surface units.
    pub x: f32,
    /// Top edge in surface units.
    pub y: f32,
    /// Rectangle width.
    pub width: f32,
    /// Rectangle height.
    pub height: f32,
    /// Requested corner radius before clamping.
    pub radius: f32,
}

impl RoundedRect {
    /// Creates a new rounded rectangle descriptor.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32, radius: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            radius,
        }
    }

    /// Corner radius clamped to half of the smaller dimension so thin
    /// rectangles never produce malformed corners.
    #[must_use]
    pub fn effective_radius(&self) -> f32 {
        self.radius
            .min(self.width / 2.0)
            .min(self.height / 2.0)
            .max(0.0)
    }
}

/// One stacked segment resolved to a rectangle and fill color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentGeometry {
    /// Rounded rectangle occupied by the segment.
    pub rect: RoundedRect,
    /// Fill color of the segment.
    pub fill: Color,
}

/// One bar resolved to its capsule and stacked segments.
#[derive(Clone, Debug, PartialEq)]
pub struct BarGeometry {
    /// Translucent background capsule behind the segments.
    pub capsule: RoundedRect,
    /// Stacked segments from the bottom of the bar upward.
    pub segments: Vec<SegmentGeometry>,
}

/// Number of bars that fit the surface, newest first.
///
/// The capacity is a third of the surface width divided by the bar pitch;
/// a fractional capacity rounds up so the oldest visible bar may clip the
/// left edge rather than leaving the anchor side sparse.
#[must_use]
pub fn visible_bar_count(surface_width: f32, available: usize) -> usize {
    let capacity = surface_width / (3.0 * (BAR_WIDTH + BAR_GAP));
    if capacity <= 0.0 {
        return 0;
    }
    available.min(capacity.ceil() as usize)
}

/// Lays out the newest bars that fit the surface.
///
/// `bars` is ordered oldest to newest; the returned geometry is newest
/// first, with the newest bar anchored at one third of the surface width and
/// older bars marching leftward by one pitch each.
#[must_use]
pub fn layout_bars(surface_width: f32, surface_height: f32, bars: &[HistogramBar]) -> Vec<BarGeometry> {
    let visible = visible_bar_count(surface_width, bars.len());
    let anchor = surface_width / 3.0;
    let bottom = surface_height - BOTTOM_OFFSET;
    let capsule_height = CHART_PANEL_HEIGHT + CAPSULE_EXTRA_HEIGHT;

    bars.iter()
        .rev()
        .take(visible)
        .enumerate()
        .map(|(index, bar)| {
            let x = anchor - (BAR_GAP + BAR_WIDTH) * index as f32;
            let capsule = RoundedRect::new(
                x,
                bottom - capsule_height,
                BAR_WIDTH,
                capsule_height,
                BAR_CORNER_RADIUS,
            );

            let mut offset = 0.0;
            let mut segments = Vec::new();
            for part in bar.segments() {
                if part.err_share > 0.0 {
                    let height = CHART_PANEL_HEIGHT * part.err_share;
                    segments.push(SegmentGeometry {
                        rect: RoundedRect::new(
                            x,
                            bottom - (height + offset),
                            BAR_WIDTH,
                            height,
                            BAR_CORNER_RADIUS,
                        ),
                        fill: segment_color(part.category, Liveness::Dead),
                    });
                    offset += height;
                }

                let height = CHART_PANEL_HEIGHT * part.ok_share;
                segments.push(SegmentGeometry {
                    rect: RoundedRect::new(
                        x,
                        bottom - (height + offset),
                        BAR_WIDTH,
                        height,
                        BAR_CORNER_RADIUS,
                    ),
                    fill: segment_color(part.category, Liveness::Alive),
                });
                offset += height;
            }

            BarGeometry { capsule, segments }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollout_reef_core::BarSegment;

    fn solid_bar(category: Category, ok: f32, err: f32) -> HistogramBar {
        HistogramBar::from_segments(vec![BarSegment::new(category, ok + err, ok, err)])
    }

    #[test]
    fn radius_clamps_to_half_the_smaller_dimension() {
        let wide = RoundedRect::new(0.0, 0.0, 100.0, 4.0, 8.0);
        assert!((wide.effective_radius() - 2.0).abs() < f32::EPSILON);

        let narrow = RoundedRect::new(0.0, 0.0, 6.0, 100.0, 8.0);
        assert!((narrow.effective_radius() - 3.0).abs() < f32::EPSILON);

        let roomy = RoundedRect::new(0.0, 0.0, 100.0, 100.0, 8.0);
        assert!((roomy.effective_radius() - 8.0).abs() < f32::EPSILON);
    }

    #[test]
    fn newest_bar_sits_at_the_anchor_and_older_bars_march_left() {
        let bars = vec![
            solid_bar(Category::Blue, 1.0, 0.0),
            solid_bar(Category::Yellow, 1.0, 0.0),
        ];
        let layout = layout_bars(1200.0, 720.0, &bars);

        assert_eq!(layout.len(), 2);
        assert!((layout[0].capsule.x - 400.0).abs() < f32::EPSILON, "newest at width/3");
        assert!((layout[1].capsule.x - (400.0 - 37.0)).abs() < f32::EPSILON);

        // Newest-first means the yellow bar (last committed) leads.
        assert_eq!(
            layout[0].segments[0].fill,
            segment_color(Category::Yellow, Liveness::Alive)
        );
    }

    #[test]
    fn visible_count_is_bounded_by_the_surface_width() {
        // 1200 / (3 * 37) = 10.81.. bars, rounded up to 11.
        assert_eq!(visible_bar_count(1200.0, 600), 11);
        assert_eq!(visible_bar_count(1200.0, 4), 4);
        assert_eq!(visible_bar_count(0.0, 4), 0);
    }

    #[test]
    fn failure_segments_stack_below_success_segments() {
        let bars = vec![solid_bar(Category::Blue, 0.25, 0.25)];
        let layout = layout_bars(900.0, 600.0, &bars);
        let segments = &layout[0].segments;

        assert_eq!(segments.len(), 2);

        let bottom = 600.0 - BOTTOM_OFFSET;
        let failure = segments[0];
        let success = segments[1];

        assert_eq!(failure.fill, segment_color(Category::Blue, Liveness::Dead));
        assert!((failure.rect.height - 45.0).abs() < 1e-4);
        assert!((failure.rect.y - (bottom - 45.0)).abs() < 1e-4);

        assert_eq!(success.fill, segment_color(Category::Blue, Liveness::Alive));
        assert!((success.rect.height - 45.0).abs() < 1e-4);
        assert!((success.rect.y - (bottom - 90.0)).abs() < 1e-4);
    }

    #[test]
    fn success_only_bars_omit_the_failure_segment() {
        let bars = vec![solid_bar(Category::Yellow, 1.0, 0.0)];
        let layout = layout_bars(900.0, 600.0, &bars);
        let segments = &layout[0].segments;

        assert_eq!(segments.len(), 1);
        assert_eq!(
            segments[0].fill,
            segment_color(Category::Yellow, Liveness::Alive)
        );
        assert!((segments[0].rect.height - CHART_PANEL_HEIGHT).abs() < 1e-4);
    }

    #[test]
    fn capsules_extend_beyond_the_tallest_segment() {
        let bars = vec![solid_bar(Category::Blue, 1.0, 0.0)];
        let layout = layout_bars(900.0, 600.0, &bars);
        let capsule = layout[0].capsule;

        assert!((capsule.height - (CHART_PANEL_HEIGHT + CAPSULE_EXTRA_HEIGHT)).abs() < 1e-4);
        assert!(capsule.y < layout[0].segments[0].rect.y);
    }
}
