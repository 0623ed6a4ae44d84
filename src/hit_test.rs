//! Hit testing against resolved geometry: connector picking, polyline
//! distance for connection picking, and selection-box queries.

use crate::geometry::{distance_to_segment_sq, Point};
use crate::state::GeometryCache;

/// Find the connector closest to the given position.
///
/// Returns the nearest connector whose anchor lies within `pick_radius`,
/// or `None`.
pub fn find_connector_at(cache: &GeometryCache, x: f32, y: f32, pick_radius: f32) -> Option<i32> {
    let radius_sq = pick_radius * pick_radius;
    let mut best: Option<(i32, f32)> = None;

    for &id in cache.connectors.keys() {
        let Some(anchor) = cache.connector_anchor(id) else {
            continue;
        };
        let dx = x - anchor.x;
        let dy = y - anchor.y;
        let dist_sq = dx * dx + dy * dy;
        if dist_sq <= radius_sq && best.map_or(true, |(_, d)| dist_sq < d) {
            best = Some((id, dist_sq));
        }
    }

    best.map(|(id, _)| id)
}

/// Minimum distance from a point to a waypoint polyline.
pub fn distance_to_polyline(point: (f32, f32), points: &[Point]) -> f32 {
    let mut min_sq = f32::MAX;
    for pair in points.windows(2) {
        let d = distance_to_segment_sq(point, pair[0], pair[1]);
        if d < min_sq {
            min_sq = d;
        }
    }
    if min_sq == f32::MAX {
        f32::MAX
    } else {
        min_sq.sqrt()
    }
}

/// Find the connection whose routed polyline passes closest to the given
/// position, within `hover_distance`.
pub fn find_connection_at<'a, I>(routes: I, x: f32, y: f32, hover_distance: f32) -> Option<i32>
where
    I: IntoIterator<Item = (i32, &'a [Point])>,
{
    let mut closest: Option<(i32, f32)> = None;
    for (id, points) in routes {
        let distance = distance_to_polyline((x, y), points);
        if distance <= hover_distance && closest.map_or(true, |(_, d)| distance < d) {
            closest = Some((id, distance));
        }
    }
    closest.map(|(id, _)| id)
}

/// Topmost node containing the given position, if any. `order` is the
/// document's node order; later nodes draw on top.
pub fn find_node_at(cache: &GeometryCache, order: &[i32], x: f32, y: f32) -> Option<i32> {
    order
        .iter()
        .rev()
        .find(|id| {
            cache.node_rect(**id).is_some_and(|rect| {
                x >= rect.x && x <= rect.x + rect.width && y >= rect.y && y <= rect.y + rect.height
            })
        })
        .copied()
}

/// All nodes whose rectangle intersects the selection box.
pub fn nodes_in_box(cache: &GeometryCache, x: f32, y: f32, width: f32, height: f32) -> Vec<i32> {
    let mut ids: Vec<i32> = cache
        .node_rects
        .values()
        .filter(|rect| {
            rect.x < x + width && rect.x + rect.width > x && rect.y < y + height && rect.y + rect.height > y
        })
        .map(|rect| rect.id)
        .collect();
    ids.sort_unstable();
    ids
}

/// All connections with at least one waypoint inside the selection box.
pub fn connections_in_box<'a, I>(routes: I, x: f32, y: f32, width: f32, height: f32) -> Vec<i32>
where
    I: IntoIterator<Item = (i32, &'a [Point])>,
{
    let mut ids: Vec<i32> = routes
        .into_iter()
        .filter(|(_, points)| {
            points
                .iter()
                .any(|p| p.x >= x && p.x <= x + width && p.y >= y && p.y <= y + height)
        })
        .map(|(id, _)| id)
        .collect();
    ids.sort_unstable();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::skin::SkinRegistry;

    fn setup() -> (GeometryCache, Vec<i32>, i32, i32) {
        let mut doc = Document::new();
        let n1 = doc.add_node("task", 0.0, 0.0, 100.0, 60.0);
        let n2 = doc.add_node("task", 300.0, 100.0, 100.0, 60.0);
        let out = doc.add_connector(n1, "right-output", false).unwrap();
        let inp = doc.add_connector(n2, "left-input", false).unwrap();
        let mut cache = GeometryCache::new();
        cache.rebuild(&doc, &SkinRegistry::new());
        (cache, doc.node_order().to_vec(), out, inp)
    }

    // ========================================================================
    // find_connector_at()
    // ========================================================================

    #[test]
    fn test_find_connector_within_radius() {
        let (cache, _, out, _) = setup();
        // Output anchor is at (100, 30).
        assert_eq!(find_connector_at(&cache, 102.0, 28.0, 10.0), Some(out));
    }

    #[test]
    fn test_find_connector_misses_outside_radius() {
        let (cache, _, _, _) = setup();
        assert_eq!(find_connector_at(&cache, 150.0, 80.0, 10.0), None);
    }

    #[test]
    fn test_find_connector_picks_nearest() {
        let mut doc = Document::new();
        let n = doc.add_node("task", 0.0, 0.0, 100.0, 60.0);
        let a = doc.add_connector(n, "right-output", false).unwrap();
        let b = doc.add_connector(n, "right-output", false).unwrap();
        let mut cache = GeometryCache::new();
        cache.rebuild(&doc, &SkinRegistry::new());
        // Anchors distribute at y = 20 and y = 40.
        assert_eq!(find_connector_at(&cache, 100.0, 22.0, 30.0), Some(a));
        assert_eq!(find_connector_at(&cache, 100.0, 38.0, 30.0), Some(b));
    }

    // ========================================================================
    // Polyline distance and connection picking
    // ========================================================================

    #[test]
    fn test_distance_to_polyline() {
        let points = [Point::new(0.0, 0.0), Point::new(100.0, 0.0), Point::new(100.0, 100.0)];
        assert!((distance_to_polyline((50.0, 5.0), &points) - 5.0).abs() < 1e-3);
        assert!((distance_to_polyline((105.0, 50.0), &points) - 5.0).abs() < 1e-3);
    }

    #[test]
    fn test_find_connection_at_picks_closest_route() {
        let near: Vec<Point> = vec![Point::new(0.0, 10.0), Point::new(100.0, 10.0)];
        let far: Vec<Point> = vec![Point::new(0.0, 40.0), Point::new(100.0, 40.0)];
        let routes = vec![(1, far.as_slice()), (2, near.as_slice())];
        assert_eq!(find_connection_at(routes, 50.0, 12.0, 8.0), Some(2));
    }

    #[test]
    fn test_find_connection_at_respects_hover_distance() {
        let route: Vec<Point> = vec![Point::new(0.0, 10.0), Point::new(100.0, 10.0)];
        let routes = vec![(1, route.as_slice())];
        assert_eq!(find_connection_at(routes, 50.0, 30.0, 8.0), None);
    }

    // ========================================================================
    // Node picking and box queries
    // ========================================================================

    #[test]
    fn test_find_node_at_topmost_wins() {
        let mut doc = Document::new();
        let bottom = doc.add_node("task", 0.0, 0.0, 100.0, 100.0);
        let top = doc.add_node("task", 50.0, 50.0, 100.0, 100.0);
        let mut cache = GeometryCache::new();
        cache.rebuild(&doc, &SkinRegistry::new());
        let order = doc.node_order().to_vec();

        assert_eq!(find_node_at(&cache, &order, 75.0, 75.0), Some(top));
        assert_eq!(find_node_at(&cache, &order, 10.0, 10.0), Some(bottom));
        assert_eq!(find_node_at(&cache, &order, 300.0, 300.0), None);
    }

    #[test]
    fn test_nodes_in_box() {
        let (cache, order, _, _) = setup();
        let hit = nodes_in_box(&cache, -10.0, -10.0, 50.0, 50.0);
        assert_eq!(hit, vec![order[0]]);
        assert!(nodes_in_box(&cache, 500.0, 500.0, 10.0, 10.0).is_empty());
    }

    #[test]
    fn test_connections_in_box() {
        let route: Vec<Point> = vec![Point::new(100.0, 30.0), Point::new(200.0, 30.0), Point::new(200.0, 130.0)];
        let routes = vec![(5, route.as_slice())];
        assert_eq!(connections_in_box(routes.clone(), 190.0, 20.0, 20.0, 20.0), vec![5]);
        assert!(connections_in_box(routes, 0.0, 200.0, 20.0, 20.0).is_empty());
    }
}
