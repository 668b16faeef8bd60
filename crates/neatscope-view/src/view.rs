//! Substrate geometry, lazy network refresh, and screen-space picking.

use glam::{Vec2, Vec3};
use std::collections::HashMap;
use tracing::debug;

use neatscope_engine::{ExperimentType, NodeAddress, Substrate};

use crate::camera::ScreenProjector;
use crate::color::{ColorEncoder, Rgb};

/// How far the black backing plate extends past each node quad, and how far
/// it sits below the layer plane.
const PLATE_INFLATE: f32 = 0.1;
const PLATE_DROP: f32 = 0.05;

/// Axis-aligned screen rectangle in pixel coordinates, inclusive on all
/// edges (legacy pick behavior).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickRect {
    pub min: Vec2,
    pub max: Vec2,
}

impl PickRect {
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        self.min.x <= point.x && point.x <= self.max.x && self.min.y <= point.y && point.y <= self.max.y
    }
}

/// One colored quad on a layer plane: spans `extent` in X/Z from `origin`.
#[derive(Debug, Clone, Copy)]
pub struct NodeQuad {
    pub node: NodeAddress,
    pub origin: Vec3,
    pub extent: Vec2,
    pub color: Rgb,
}

/// Status overlay values; indices are 1-based for display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HudState {
    pub run: u32,
    pub generation: usize,
    pub generation_count: usize,
    pub individual: usize,
    pub individual_count: usize,
}

impl HudState {
    #[must_use]
    pub fn lines(&self) -> [String; 3] {
        [
            format!("Run:        {}", self.run),
            format!(
                "Generation: {}/{}",
                self.generation + 1,
                self.generation_count
            ),
            format!(
                "Individual: {}/{}",
                self.individual + 1,
                self.individual_count
            ),
        ]
    }
}

/// Everything the (external) renderer needs for one frame. Plates draw
/// first, nodes on top, HUD last.
#[derive(Debug, Clone)]
pub struct FrameGeometry {
    pub plates: Vec<NodeQuad>,
    pub nodes: Vec<NodeQuad>,
    pub hud: HudState,
}

/// Owns one substrate instance plus the interaction state layered over it:
/// forced input overrides, the dirty/refresh cache, the hover selection, and
/// the per-frame pick rectangles.
///
/// Destroyed and rebuilt (overrides carried over) whenever the navigated
/// individual changes; a different individual means a different network.
pub struct SubstrateView {
    substrate: Box<dyn Substrate>,
    experiment: ExperimentType,
    overrides: HashMap<NodeAddress, f64>,
    hovered: Option<NodeAddress>,
    dirty: bool,
    pick_rects: Vec<(PickRect, NodeAddress)>,
    evaluations: u64,
}

impl SubstrateView {
    /// Wraps a freshly populated substrate. The override map is owned by this
    /// view; entries are applied immediately and again on every refresh.
    #[must_use]
    pub fn new(
        substrate: Box<dyn Substrate>,
        experiment: ExperimentType,
        overrides: HashMap<NodeAddress, f64>,
    ) -> Self {
        let mut view = Self {
            substrate,
            experiment,
            overrides,
            hovered: None,
            dirty: true,
            pick_rects: Vec::new(),
            evaluations: 0,
        };
        for (&node, &value) in &view.overrides {
            view.substrate.set_value(node, value);
        }
        view
    }

    #[must_use]
    pub fn overrides(&self) -> &HashMap<NodeAddress, f64> {
        &self.overrides
    }

    /// Hands the override map to the next view when the substrate is
    /// reloaded; this view is discarded right after.
    #[must_use]
    pub fn take_overrides(&mut self) -> HashMap<NodeAddress, f64> {
        std::mem::take(&mut self.overrides)
    }

    pub fn set_override(&mut self, node: NodeAddress, value: f64) {
        self.overrides.insert(node, value);
        self.dirty = true;
    }

    /// Adds `delta` to the node's override (starting from zero when absent).
    /// The pick interaction path.
    pub fn nudge_override(&mut self, node: NodeAddress, delta: f64) {
        let value = self.overrides.get(&node).copied().unwrap_or(0.0) + delta;
        debug!(%node, value, "input override nudged");
        self.set_override(node, value);
    }

    #[must_use]
    pub fn hovered(&self) -> Option<NodeAddress> {
        self.hovered
    }

    pub fn set_hovered(&mut self, node: Option<NodeAddress>) {
        self.hovered = node;
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Number of full network evaluations performed so far.
    #[must_use]
    pub fn evaluation_count(&self) -> u64 {
        self.evaluations
    }

    /// Re-evaluates the network if any override changed since the last pass:
    /// reinitialize, re-apply every override, one propagation step. Strict
    /// no-op while clean, so callers may invoke it before every read.
    pub fn refresh_if_dirty(&mut self) {
        if !self.dirty {
            return;
        }
        self.substrate.network_mut().reinitialize();
        for (&node, &value) in &self.overrides {
            self.substrate.set_value(node, value);
        }
        self.substrate.network_mut().update();
        self.evaluations += 1;
        self.dirty = false;
    }

    /// Addresses present on layer `z`, honoring the checkerboard filter for
    /// the experiments that sparsify layer 0. Geometry and picking both draw
    /// from here so they cannot disagree.
    fn layer_nodes(&self, z: usize) -> impl Iterator<Item = NodeAddress> + '_ {
        let (width, height) = self.substrate.layer_size(z);
        let checkerboard = self.experiment.checkerboard_input() && z == 0;
        (0..height).flat_map(move |y| {
            (0..width).filter_map(move |x| {
                if checkerboard && (x + y) % 2 == 1 {
                    None
                } else {
                    Some(NodeAddress::new(x, y, z))
                }
            })
        })
    }

    /// World-space origin (min-X/min-Z corner) of a node's unit quad: the
    /// layer grid is centered on the layer location in the XZ plane.
    fn node_origin(&self, node: NodeAddress) -> Vec3 {
        let (width, height) = self.substrate.layer_size(node.layer);
        let (lx, ly, lz) = self.substrate.layer_location(node.layer);
        Vec3::new(
            lx + node.x as f32 - width as f32 / 2.0,
            ly,
            lz + node.y as f32 - height as f32 / 2.0,
        )
    }

    /// Colored quads for the current frame. Call [`Self::refresh_if_dirty`]
    /// first; colors read whatever the network currently holds.
    #[must_use]
    pub fn frame_geometry(&self, hud: HudState) -> FrameGeometry {
        let encoder = ColorEncoder::new(self.substrate.as_ref());
        let mut plates = Vec::new();
        let mut nodes = Vec::new();
        for z in 0..self.substrate.num_layers() {
            for node in self.layer_nodes(z) {
                let origin = self.node_origin(node);
                plates.push(NodeQuad {
                    node,
                    origin: origin + Vec3::new(-PLATE_INFLATE, -PLATE_DROP, -PLATE_INFLATE),
                    extent: Vec2::splat(1.0 + 2.0 * PLATE_INFLATE),
                    color: [0.0, 0.0, 0.0],
                });
                nodes.push(NodeQuad {
                    node,
                    origin,
                    extent: Vec2::ONE,
                    color: encoder.color_for(node, self.hovered),
                });
            }
        }
        FrameGeometry { plates, nodes, hud }
    }

    /// Recomputes the pick rectangles: each node quad's four corners are
    /// projected and bounding-boxed, layers appended in draw order, then the
    /// whole list is reversed so the scan in [`Self::pick_at`] hits the
    /// front-most (last-drawn) layer first without a depth test.
    pub fn rebuild_pick_rects(&mut self, projector: &ScreenProjector) {
        let mut rects = Vec::new();
        for z in 0..self.substrate.num_layers() {
            for node in self.layer_nodes(z) {
                let origin = self.node_origin(node);
                let corners = [
                    origin,
                    origin + Vec3::new(1.0, 0.0, 0.0),
                    origin + Vec3::new(1.0, 0.0, 1.0),
                    origin + Vec3::new(0.0, 0.0, 1.0),
                ];
                let mut min = Vec2::splat(f32::INFINITY);
                let mut max = Vec2::splat(f32::NEG_INFINITY);
                for corner in corners {
                    let screen = projector.project(corner);
                    min = min.min(screen);
                    max = max.max(screen);
                }
                rects.push((PickRect { min, max }, node));
            }
        }
        rects.reverse();
        self.pick_rects = rects;
    }

    /// Resolves a screen point to the front-most node under it. First match
    /// wins; an empty or missed list is a normal miss, not an error.
    #[must_use]
    pub fn pick_at(&self, point: Vec2) -> Option<NodeAddress> {
        self.pick_rects
            .iter()
            .find(|(rect, _)| rect.contains(point))
            .map(|&(_, node)| node)
    }

    #[must_use]
    pub fn pick_rects(&self) -> &[(PickRect, NodeAddress)] {
        &self.pick_rects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::OrbitCamera;
    use neatscope_engine::scripted::ScriptedSubstrate;

    const LAYERS: [((i32, i32), (f32, f32, f32)); 2] =
        [((4, 4), (0.0, 0.0, 0.0)), ((2, 2), (0.0, 4.0, 0.0))];

    fn plain_view() -> SubstrateView {
        SubstrateView::new(
            Box::new(ScriptedSubstrate::with_layers(&LAYERS)),
            ExperimentType(0),
            HashMap::new(),
        )
    }

    fn hud() -> HudState {
        HudState {
            run: 1,
            generation: 0,
            generation_count: 1,
            individual: 0,
            individual_count: 1,
        }
    }

    fn projector() -> ScreenProjector {
        ScreenProjector::new(
            &OrbitCamera::default(),
            (640, 480),
            45.0f32.to_radians(),
            0.1,
            100.0,
        )
    }

    #[test]
    fn refresh_runs_once_until_redirtied() {
        let mut view = plain_view();
        assert!(view.is_dirty());
        view.refresh_if_dirty();
        view.refresh_if_dirty();
        assert_eq!(view.evaluation_count(), 1);
        view.set_override(NodeAddress::new(0, 0, 0), 0.5);
        view.refresh_if_dirty();
        assert_eq!(view.evaluation_count(), 2);
    }

    #[test]
    fn nudge_accumulates_from_zero() {
        let mut view = plain_view();
        let node = NodeAddress::new(1, 2, 0);
        view.nudge_override(node, 0.5);
        view.nudge_override(node, 0.5);
        view.nudge_override(node, -0.5);
        assert_eq!(view.overrides()[&node], 0.5);
    }

    #[test]
    fn pick_prefers_front_most_layer() {
        let mut view = plain_view();
        // Two known, overlapping boxes: one layer-0 node
        // and one layer-1 node over the same pixels, layer 1 appended later
        // in draw order. After the reversal the layer-1 rect is scanned
        // first.
        let a = NodeAddress::new(0, 0, 0);
        let b = NodeAddress::new(0, 0, 1);
        let rect = PickRect {
            min: Vec2::new(10.0, 10.0),
            max: Vec2::new(20.0, 20.0),
        };
        view.pick_rects = vec![(rect, a), (rect, b)];
        view.pick_rects.reverse();
        assert_eq!(view.pick_at(Vec2::new(15.0, 15.0)), Some(b));
    }

    #[test]
    fn pick_misses_return_none() {
        let mut view = plain_view();
        assert_eq!(view.pick_at(Vec2::new(5.0, 5.0)), None);
        view.rebuild_pick_rects(&projector());
        assert_eq!(view.pick_at(Vec2::new(-100.0, -100.0)), None);
    }

    #[test]
    fn pick_rect_list_is_reversed_draw_order() {
        let mut view = plain_view();
        view.rebuild_pick_rects(&projector());
        let first = view.pick_rects().first().expect("rects built").1;
        let last = view.pick_rects().last().expect("rects built").1;
        assert_eq!(first.layer, 1, "front layer scans first");
        assert_eq!(last.layer, 0);
        assert_eq!(last, NodeAddress::new(0, 0, 0));
    }

    #[test]
    fn checkerboard_filter_applies_to_geometry_and_picking() {
        let mut view = SubstrateView::new(
            Box::new(ScriptedSubstrate::with_layers(&LAYERS)),
            ExperimentType(15),
            HashMap::new(),
        );
        let odd = NodeAddress::new(1, 0, 0);
        let geometry = view.frame_geometry(hud());
        assert!(geometry.nodes.iter().all(|quad| quad.node != odd));
        assert!(geometry.plates.iter().all(|quad| quad.node != odd));

        view.rebuild_pick_rects(&projector());
        assert!(view.pick_rects().iter().all(|&(_, node)| node != odd));
        // Layer 1 keeps its odd-parity nodes.
        assert!(view
            .pick_rects()
            .iter()
            .any(|&(_, node)| node == NodeAddress::new(1, 0, 1)));
    }

    #[test]
    fn geometry_centers_each_layer_grid() {
        let view = plain_view();
        let geometry = view.frame_geometry(hud());
        let quad = geometry
            .nodes
            .iter()
            .find(|quad| quad.node == NodeAddress::new(0, 0, 0))
            .expect("node present");
        assert_eq!(quad.origin, Vec3::new(-2.0, 0.0, -2.0));
        let top = geometry
            .nodes
            .iter()
            .find(|quad| quad.node == NodeAddress::new(1, 1, 1))
            .expect("node present");
        assert_eq!(top.origin, Vec3::new(0.0, 4.0, 0.0));
    }

    #[test]
    fn hud_lines_are_one_based() {
        let hud = HudState {
            run: 3,
            generation: 0,
            generation_count: 50,
            individual: 9,
            individual_count: 10,
        };
        let lines = hud.lines();
        assert_eq!(lines[0], "Run:        3");
        assert_eq!(lines[1], "Generation: 1/50");
        assert_eq!(lines[2], "Individual: 10/10");
    }
}
