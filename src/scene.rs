//! Scene assembly: turns routed connection shapes plus the crossing style
//! into final per-connection path data and keeps a bound Slint model in
//! sync.
//!
//! # Auto-Sync Mode
//!
//! Use [`bind_model`](Scene::bind_model) to enable automatic
//! synchronization to a Slint `VecModel`. After binding, every refresh
//! updates rows in place (update, push, truncate), so unchanged
//! connections keep their visual elements.
//!
//! ```ignore
//! let model = Rc::new(VecModel::<ConnectionPath>::default());
//! scene.bind_model(model.clone(), |id, commands, color, width| ConnectionPath {
//!     id,
//!     commands,
//!     color,
//!     width,
//! });
//! window.set_connection_paths(ModelRc::from(model));
//! ```

use std::rc::Rc;

use slint::{Color, Model, SharedString, VecModel};

use crate::document::Document;
use crate::intersect::{find_crossings, CrossingScope};
use crate::render::{render_route, to_svg, CrossingConfig, CrossingStyle};
use crate::route::RouteConfig;
use crate::shape::ShapeManager;
use crate::skin::StyleRegistry;
use crate::tail::{TailFeedback, TailManager};

/// Row id used for the tail preview path.
pub const TAIL_PATH_ID: i32 = -1;

/// Final render data of one connection (or the tail preview).
#[derive(Clone, Debug, PartialEq)]
pub struct ConnectionPathData {
    pub id: i32,
    /// SVG path-data commands for the rendering surface.
    pub commands: String,
    pub color: Color,
    pub line_width: f32,
}

/// Internal trait for auto-syncing to Slint models.
trait ModelSyncer {
    fn sync(&self, paths: &[ConnectionPathData]);
}

/// Concrete implementation of [`ModelSyncer`] for a specific row type.
struct ConcreteModelSyncer<P, F> {
    model: Rc<VecModel<P>>,
    constructor: F,
}

impl<P, F> ModelSyncer for ConcreteModelSyncer<P, F>
where
    P: Clone + 'static,
    F: Fn(i32, SharedString, Color, f32) -> P,
{
    fn sync(&self, paths: &[ConnectionPathData]) {
        for (index, path) in paths.iter().enumerate() {
            let item = (self.constructor)(
                path.id,
                SharedString::from(path.commands.as_str()),
                path.color,
                path.line_width,
            );
            if index < self.model.row_count() {
                self.model.set_row_data(index, item);
            } else {
                self.model.push(item);
            }
        }
        while self.model.row_count() > paths.len() {
            self.model.remove(self.model.row_count() - 1);
        }
    }
}

/// Styling applied to the tail preview per feedback state.
#[derive(Clone, Copy, Debug)]
pub struct TailPalette {
    pub neutral: Color,
    pub allowed: Color,
    pub forbidden: Color,
    pub line_width: f32,
}

impl Default for TailPalette {
    fn default() -> Self {
        Self {
            neutral: Color::from_rgb_u8(160, 160, 160),
            allowed: Color::from_rgb_u8(90, 200, 120),
            forbidden: Color::from_rgb_u8(220, 80, 80),
            line_width: 2.0,
        }
    }
}

/// Computes and caches the drawable paths of all displayed connections.
#[derive(Default)]
pub struct Scene {
    paths: Vec<ConnectionPathData>,
    crossing_style: CrossingStyle,
    tail_palette: TailPalette,
    syncer: Option<Box<dyn ModelSyncer>>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-document toggle between gap and detour crossing visuals.
    pub fn set_crossing_style(&mut self, style: CrossingStyle) {
        self.crossing_style = style;
    }

    pub fn crossing_style(&self) -> CrossingStyle {
        self.crossing_style
    }

    pub fn set_tail_palette(&mut self, palette: TailPalette) {
        self.tail_palette = palette;
    }

    /// Bind a Slint model for automatic row synchronization.
    pub fn bind_model<P, F>(&mut self, model: Rc<VecModel<P>>, constructor: F)
    where
        P: Clone + 'static,
        F: Fn(i32, SharedString, Color, f32) -> P + 'static,
    {
        self.syncer = Some(Box::new(ConcreteModelSyncer { model, constructor }));
    }

    /// Computed paths, in paint order, tail last.
    pub fn paths(&self) -> &[ConnectionPathData] {
        &self.paths
    }

    /// Recompute every connection path and push the rows to the bound
    /// model.
    ///
    /// `hidden` suppresses one connection (the one whose endpoint is
    /// currently detached). In `Gap` mode a connection is trimmed where
    /// connections in front of it cross; in `Detour` mode it hops over
    /// connections behind it.
    #[allow(clippy::too_many_arguments)]
    pub fn refresh(
        &mut self,
        document: &Document,
        shapes: &ShapeManager,
        styles: &StyleRegistry,
        crossing_cfg: &CrossingConfig,
        route_cfg: &RouteConfig,
        hidden: Option<i32>,
        tail: &TailManager,
    ) {
        self.paths.clear();

        let routes: Vec<(i32, Vec<crate::geometry::Point>)> = document
            .connection_order()
            .iter()
            .filter(|id| Some(**id) != hidden)
            .filter_map(|id| shapes.route_points(*id).map(|points| (*id, points.to_vec())))
            .collect();

        let scope = match self.crossing_style {
            CrossingStyle::Gap => CrossingScope::InFront,
            CrossingStyle::Detour => CrossingScope::Behind,
        };

        for (index, (id, points)) in routes.iter().enumerate() {
            let crossings = find_crossings(index, &routes, scope, crossing_cfg.edge_tolerance);
            let commands = render_route(points, &crossings, self.crossing_style, crossing_cfg);
            let style = document
                .connection(*id)
                .map(|connection| styles.resolve(&connection.kind))
                .unwrap_or_default();
            self.paths.push(ConnectionPathData {
                id: *id,
                commands: to_svg(&commands),
                color: style.color,
                line_width: style.line_width,
            });
        }

        if let Some(points) = tail.waypoints(route_cfg) {
            let color = match tail.feedback() {
                TailFeedback::Neutral => self.tail_palette.neutral,
                TailFeedback::Allowed => self.tail_palette.allowed,
                TailFeedback::Forbidden => self.tail_palette.forbidden,
            };
            let commands = crate::render::render_plain(&points);
            self.paths.push(ConnectionPathData {
                id: TAIL_PATH_ID,
                commands: to_svg(&commands),
                color,
                line_width: self.tail_palette.line_width,
            });
        }

        if let Some(syncer) = &self.syncer {
            syncer.sync(&self.paths);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::skin::SkinRegistry;
    use crate::state::GeometryCache;

    struct Stage {
        doc: Document,
        shapes: ShapeManager,
        styles: StyleRegistry,
        scene: Scene,
    }

    /// Two crossing connections: one horizontal pair, one vertical pair.
    fn crossing_stage() -> (Stage, i32, i32) {
        let mut doc = Document::new();
        let left = doc.add_node("task", 0.0, 70.0, 60.0, 60.0);
        let right = doc.add_node("task", 300.0, 70.0, 60.0, 60.0);
        let top = doc.add_node("task", 150.0, -100.0, 60.0, 60.0);
        let bottom = doc.add_node("task", 150.0, 300.0, 60.0, 60.0);

        let left_out = doc.add_connector(left, "right-output", false).unwrap();
        let right_in = doc.add_connector(right, "left-input", false).unwrap();
        let top_out = doc.add_connector(top, "bottom-output", false).unwrap();
        let bottom_in = doc.add_connector(bottom, "top-input", false).unwrap();

        let horizontal = doc.add_connection("standard", left_out, right_in).unwrap();
        let vertical = doc.add_connection("standard", top_out, bottom_in).unwrap();

        let mut cache = GeometryCache::new();
        cache.rebuild(&doc, &SkinRegistry::new());
        let mut shapes = ShapeManager::new();
        shapes.refresh_all(&mut doc, &cache, &RouteConfig::default());

        let stage = Stage { doc, shapes, styles: StyleRegistry::new(), scene: Scene::new() };
        (stage, horizontal, vertical)
    }

    fn refresh(stage: &mut Stage, hidden: Option<i32>, tail: &TailManager) {
        stage.scene.refresh(
            &stage.doc,
            &stage.shapes,
            &stage.styles,
            &CrossingConfig::default(),
            &RouteConfig::default(),
            hidden,
            tail,
        );
    }

    // ========================================================================
    // Crossing styles
    // ========================================================================

    #[test]
    fn test_gap_trims_connection_behind() {
        let (mut stage, horizontal, vertical) = crossing_stage();
        let tail = TailManager::new();
        refresh(&mut stage, None, &tail);

        let paths = stage.scene.paths();
        assert_eq!(paths.len(), 2);
        // The earlier connection breaks where the later one crosses it.
        let first = paths.iter().find(|p| p.id == horizontal).unwrap();
        let moves = first.commands.matches("M ").count();
        assert_eq!(moves, 2, "gap mode lifts the pen once: {}", first.commands);
        // The later connection draws through uninterrupted.
        let second = paths.iter().find(|p| p.id == vertical).unwrap();
        assert_eq!(second.commands.matches("M ").count(), 1);
        assert!(!second.commands.contains(" A "));
    }

    #[test]
    fn test_detour_hops_connection_in_front() {
        let (mut stage, horizontal, vertical) = crossing_stage();
        stage.scene.set_crossing_style(CrossingStyle::Detour);
        let tail = TailManager::new();
        refresh(&mut stage, None, &tail);

        let paths = stage.scene.paths();
        let first = paths.iter().find(|p| p.id == horizontal).unwrap();
        assert!(!first.commands.contains(" A "));
        let second = paths.iter().find(|p| p.id == vertical).unwrap();
        assert!(second.commands.contains(" A "), "detour arcs: {}", second.commands);
    }

    // ========================================================================
    // Hidden connections and tail rendering
    // ========================================================================

    #[test]
    fn test_hidden_connection_is_skipped() {
        let (mut stage, horizontal, vertical) = crossing_stage();
        let tail = TailManager::new();
        refresh(&mut stage, Some(horizontal), &tail);

        let paths = stage.scene.paths();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].id, vertical);
        // With the crossing partner hidden, no gap is drawn.
        assert_eq!(paths[0].commands.matches("M ").count(), 1);
    }

    #[test]
    fn test_tail_rendered_last_with_feedback_color() {
        let (mut stage, _, _) = crossing_stage();
        let mut tail = TailManager::new();
        tail.create(
            99,
            crate::geometry::Point::new(60.0, 100.0),
            crate::geometry::Side::Right,
            crate::geometry::Point::new(120.0, 140.0),
        );
        tail.snap_position(
            crate::geometry::Point::new(300.0, 100.0),
            crate::geometry::Side::Left,
            true,
        );
        refresh(&mut stage, None, &tail);

        let paths = stage.scene.paths();
        let last = paths.last().unwrap();
        assert_eq!(last.id, TAIL_PATH_ID);
        assert_eq!(last.color, TailPalette::default().allowed);
    }

    // ========================================================================
    // Model binding
    // ========================================================================

    #[derive(Clone, Debug, PartialEq)]
    struct Row {
        id: i32,
        commands: SharedString,
    }

    #[test]
    fn test_bound_model_rows_follow_scene() {
        let (mut stage, _, _) = crossing_stage();
        let model = Rc::new(VecModel::<Row>::default());
        stage
            .scene
            .bind_model(model.clone(), |id, commands, _color, _width| Row { id, commands });

        let tail = TailManager::new();
        refresh(&mut stage, None, &tail);
        assert_eq!(model.row_count(), 2);

        // Removing a connection truncates rather than rebuilding.
        let first_id = model.row_data(0).unwrap().id;
        stage.doc.remove_connection(first_id);
        let mut cache = GeometryCache::new();
        cache.rebuild(&stage.doc, &SkinRegistry::new());
        stage.shapes.refresh_all(&mut stage.doc, &cache, &RouteConfig::default());
        refresh(&mut stage, None, &tail);
        assert_eq!(model.row_count(), 1);
    }

    #[test]
    fn test_unchanged_connection_keeps_row_index() {
        let (mut stage, horizontal, _) = crossing_stage();
        let model = Rc::new(VecModel::<Row>::default());
        stage
            .scene
            .bind_model(model.clone(), |id, commands, _color, _width| Row { id, commands });

        let tail = TailManager::new();
        refresh(&mut stage, None, &tail);
        let index_before = (0..model.row_count())
            .position(|i| model.row_data(i).unwrap().id == horizontal)
            .unwrap();
        refresh(&mut stage, None, &tail);
        let index_after = (0..model.row_count())
            .position(|i| model.row_data(i).unwrap().id == horizontal)
            .unwrap();
        assert_eq!(index_before, index_after);
    }
}
