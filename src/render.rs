//! Segment renderer.
//!
//! Turns a waypoint polyline plus per-segment crossing offsets into a
//! drawable path: a plain polyline when nothing crosses, small breaks in
//! `Gap` mode, or semicircular hops in `Detour` mode. Both crossing modes
//! start and end exactly where the plain polyline does.

use crate::geometry::{segment_axis, Axis, Point};
use crate::intersect::SegmentCrossings;

/// How a connection visualizes the places other connections cross it.
///
/// A per-document policy toggle; both modes consume the same crossing data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CrossingStyle {
    /// Break the stroke around each crossing.
    #[default]
    Gap,
    /// Hop over each crossing with a semicircular arc.
    Detour,
}

/// Tunables for crossing detection and rendering.
#[derive(Clone, Copy, Debug)]
pub struct CrossingConfig {
    /// Crossings closer than this to a segment end are ignored.
    pub edge_tolerance: f32,
    /// Half-width of the stroke break in [`CrossingStyle::Gap`] mode.
    pub gap_radius: f32,
    /// Radius of the hop arc in [`CrossingStyle::Detour`] mode.
    pub detour_radius: f32,
    /// Minimum spacing between two hops before a straight run is drawn
    /// between their arcs; closer hops chain arc-to-arc.
    pub detour_straight_tolerance: f32,
}

impl Default for CrossingConfig {
    fn default() -> Self {
        Self {
            edge_tolerance: 5.0,
            gap_radius: 4.0,
            detour_radius: 5.0,
            detour_straight_tolerance: 20.0,
        }
    }
}

/// One drawing instruction of a rendered path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    /// Circular arc to `to`; `sweep` picks the side the arc bulges toward.
    Arc { to: Point, radius: f32, sweep: bool },
}

/// Render a polyline without any crossing treatment.
pub fn render_plain(points: &[Point]) -> Vec<PathCommand> {
    let mut commands = Vec::with_capacity(points.len());
    let mut iter = points.iter();
    if let Some(first) = iter.next() {
        commands.push(PathCommand::MoveTo(first.snapped()));
        for point in iter {
            commands.push(PathCommand::LineTo(point.snapped()));
        }
    }
    commands
}

/// Render a polyline, resolving each crossing according to `style`.
///
/// `crossings` holds sorted offsets per segment as produced by
/// [`crate::intersect::find_crossings`]; segments without an entry render
/// as plain lines.
pub fn render_route(
    points: &[Point],
    crossings: &SegmentCrossings,
    style: CrossingStyle,
    cfg: &CrossingConfig,
) -> Vec<PathCommand> {
    let Some(first) = points.first() else {
        return Vec::new();
    };
    let mut commands = vec![PathCommand::MoveTo(first.snapped())];

    for index in 0..points.len().saturating_sub(1) {
        let a = points[index];
        let b = points[index + 1];
        let offsets = crossings.get(index).map(Vec::as_slice).unwrap_or(&[]);

        if offsets.is_empty() || segment_axis(a, b).is_none() {
            commands.push(PathCommand::LineTo(b.snapped()));
            continue;
        }

        match style {
            CrossingStyle::Gap => render_gapped_segment(&mut commands, a, b, offsets, cfg),
            CrossingStyle::Detour => render_detoured_segment(&mut commands, a, b, offsets, cfg),
        }
    }

    commands
}

/// Point at `offset` units from `a` toward `b` along an orthogonal segment.
fn point_at(a: Point, b: Point, offset: f32) -> Point {
    match segment_axis(a, b) {
        Some(Axis::Horizontal) => Point::new(a.x + offset * (b.x - a.x).signum(), a.y),
        Some(Axis::Vertical) => Point::new(a.x, a.y + offset * (b.y - a.y).signum()),
        None => a,
    }
}

fn segment_length(a: Point, b: Point) -> f32 {
    (b.x - a.x).abs() + (b.y - a.y).abs()
}

/// Draw up to each crossing minus the gap radius, lift the pen, and resume
/// past it. Crossings closer than two radii collapse into one break.
fn render_gapped_segment(
    commands: &mut Vec<PathCommand>,
    a: Point,
    b: Point,
    offsets: &[f32],
    cfg: &CrossingConfig,
) {
    let g = cfg.gap_radius;
    let length = segment_length(a, b);

    let mut breaks: Vec<(f32, f32)> = Vec::new();
    for &offset in offsets {
        let start = (offset - g).max(0.0);
        let end = (offset + g).min(length);
        match breaks.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => breaks.push((start, end)),
        }
    }

    for (start, end) in breaks {
        commands.push(PathCommand::LineTo(point_at(a, b, start).snapped()));
        commands.push(PathCommand::MoveTo(point_at(a, b, end).snapped()));
    }
    commands.push(PathCommand::LineTo(b.snapped()));
}

/// Hop over each crossing with a semicircular arc. Hops spaced wider than
/// the straight tolerance get a line between their arcs; closer hops chain
/// directly from arc to arc.
fn render_detoured_segment(
    commands: &mut Vec<PathCommand>,
    a: Point,
    b: Point,
    offsets: &[f32],
    cfg: &CrossingConfig,
) {
    let r = cfg.detour_radius;
    let length = segment_length(a, b);
    let sweep = detour_sweep(a, b);

    let mut previous: Option<f32> = None;
    for &offset in offsets {
        let entry = (offset - r).max(0.0);
        let exit = (offset + r).min(length);
        let chained = previous.is_some_and(|p| offset - p < cfg.detour_straight_tolerance);
        if !chained {
            commands.push(PathCommand::LineTo(point_at(a, b, entry).snapped()));
        }
        commands.push(PathCommand::Arc {
            to: point_at(a, b, exit).snapped(),
            radius: r,
            sweep,
        });
        previous = Some(offset);
    }
    commands.push(PathCommand::LineTo(b.snapped()));
}

/// Arc sweep flag for a hop, chosen from the segment's direction sign so
/// the bulge lands on a consistent side of the stroke.
fn detour_sweep(a: Point, b: Point) -> bool {
    match segment_axis(a, b) {
        Some(Axis::Horizontal) => b.x > a.x,
        Some(Axis::Vertical) => b.y > a.y,
        None => true,
    }
}

/// Serialize a command list into SVG path-data commands.
pub fn to_svg(commands: &[PathCommand]) -> String {
    let mut out = String::new();
    for command in commands {
        if !out.is_empty() {
            out.push(' ');
        }
        match command {
            PathCommand::MoveTo(p) => {
                out.push_str(&format!("M {} {}", p.x, p.y));
            }
            PathCommand::LineTo(p) => {
                out.push_str(&format!("L {} {}", p.x, p.y));
            }
            PathCommand::Arc { to, radius, sweep } => {
                out.push_str(&format!(
                    "A {} {} 0 0 {} {} {}",
                    radius,
                    radius,
                    if *sweep { 1 } else { 0 },
                    to.x,
                    to.y
                ));
            }
        }
    }
    out
}
