//! Canvas session: data, filter, layout and interaction in one place.
//!
//! The session is the single owner of everything the canvas shows. Every
//! mutation that can move a card (new data, a filter change, a drag step,
//! a reset) recomputes the layout synchronously, rebuilds the card index and
//! installs fresh canvas metrics, so queries never observe a stale layout.

use std::collections::{BTreeMap, HashMap, HashSet};

use log::{debug, warn};

use crate::filter::{GenerationLabel, RelativeFilter, generation_labels};
use crate::geometry::{Point, Rect, Size};
use crate::graph::{Relationship, Relative, RelativeId};
use crate::interaction::{CaptureProvider, Effect, InteractionController, PointerTarget};
use crate::layout::{LayoutConfig, LayoutEngine, ManualPositions, NodePosition};
use crate::routing::{EdgeDescriptor, EdgeRouter};
use crate::spatial::SpatialIndex;
use crate::viewport::{CanvasMetrics, Viewport, ViewportConfig};

/// Owner of the canvas state.
#[derive(Debug, Default)]
pub struct CanvasSession {
    relatives: Vec<Relative>,
    relationships: Vec<Relationship>,
    filter: RelativeFilter,
    engine: LayoutEngine,
    router: EdgeRouter,
    interaction: InteractionController,
    cards: SpatialIndex,
    positions: Vec<NodePosition>,
    /// Index into `positions` by relative.
    slots: HashMap<RelativeId, usize>,
}

impl CanvasSession {
    pub fn new(layout: LayoutConfig, viewport: ViewportConfig) -> Self {
        let router = EdgeRouter::new(Self::card_size(&layout));
        Self {
            engine: LayoutEngine::new(layout),
            router,
            interaction: InteractionController::new(Viewport::new(viewport)),
            ..Default::default()
        }
    }

    fn card_size(config: &LayoutConfig) -> Size {
        Size::new(config.card_width, config.card_height)
    }

    // =========================================================================
    // Data and filter
    // =========================================================================

    /// Replace the tree contents.
    ///
    /// Relatives sharing an id keep the first occurrence. The view re-centers
    /// on the next `auto_center`; manual positions survive.
    pub fn set_data(&mut self, relatives: Vec<Relative>, relationships: Vec<Relationship>) {
        let mut seen = HashSet::with_capacity(relatives.len());
        let before = relatives.len();
        self.relatives = relatives
            .into_iter()
            .filter(|r| seen.insert(r.id))
            .collect();
        if self.relatives.len() != before {
            warn!(
                "session: dropped {} relatives with duplicate ids",
                before - self.relatives.len()
            );
        }
        self.relationships = relationships;
        debug!(
            "session: {} relatives, {} relationships",
            self.relatives.len(),
            self.relationships.len()
        );
        self.interaction.viewport_mut().invalidate_auto_center();
        self.relayout();
    }

    pub fn relatives(&self) -> &[Relative] {
        &self.relatives
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn relative(&self, id: RelativeId) -> Option<&Relative> {
        self.relatives.iter().find(|r| r.id == id)
    }

    pub fn filter(&self) -> &RelativeFilter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: RelativeFilter) {
        self.filter = filter;
        self.interaction.viewport_mut().invalidate_auto_center();
        self.relayout();
    }

    pub fn clear_filter(&mut self) {
        self.set_filter(RelativeFilter::default());
    }

    /// Relatives that pass the current filter, in input order.
    pub fn visible_relatives(&self) -> Vec<Relative> {
        self.filter.apply(&self.relatives)
    }

    /// Row labels for every generation in the data set.
    pub fn generation_labels(&self) -> BTreeMap<i32, GenerationLabel> {
        generation_labels(&self.relatives)
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    pub fn layout_config(&self) -> &LayoutConfig {
        self.engine.config()
    }

    pub fn set_layout_config(&mut self, config: LayoutConfig) {
        self.router = EdgeRouter::new(Self::card_size(&config));
        self.engine.set_config(config);
        self.relayout();
    }

    pub fn set_viewport_config(&mut self, config: ViewportConfig) {
        self.interaction.viewport_mut().set_config(config);
        self.install_metrics();
    }

    // =========================================================================
    // Layout
    // =========================================================================

    /// Recompute every card position and everything derived from them.
    pub fn relayout(&mut self) {
        self.positions = self.engine.recompute(
            &self.relatives,
            &self.relationships,
            &self.filter,
            self.interaction.manual_positions(),
        );
        self.slots = self
            .positions
            .iter()
            .enumerate()
            .map(|(slot, p)| (p.relative, slot))
            .collect();
        self.cards.rebuild(&self.positions, self.engine.config());
        self.install_metrics();
    }

    fn install_metrics(&mut self) {
        let card = Self::card_size(self.engine.config());
        let viewport = self.interaction.viewport_mut();
        let metrics = CanvasMetrics::compute(&self.positions, card, viewport.config());
        viewport.set_metrics(metrics);
    }

    pub fn positions(&self) -> &[NodePosition] {
        &self.positions
    }

    pub fn position_of(&self, id: RelativeId) -> Option<Point> {
        self.slots.get(&id).map(|&slot| self.positions[slot].point())
    }

    /// Card position in canvas space, the space cards are drawn in.
    pub fn canvas_position_of(&self, id: RelativeId) -> Option<Point> {
        self.position_of(id)
            .map(|p| self.interaction.viewport().to_canvas(p))
    }

    pub fn manual_positions(&self) -> &ManualPositions {
        self.interaction.manual_positions()
    }

    /// Route every relationship between visible cards.
    pub fn edges(&self) -> Vec<EdgeDescriptor> {
        self.router.route(
            &self.relationships,
            &self.relatives,
            &self.positions,
            self.interaction.viewport().metrics(),
        )
    }

    pub fn cards(&self) -> &SpatialIndex {
        &self.cards
    }

    /// Card whose rectangle contains the world point, topmost first.
    pub fn card_at(&self, world: Point) -> Option<RelativeId> {
        self.cards.card_at(world)
    }

    // =========================================================================
    // View
    // =========================================================================

    pub fn viewport(&self) -> &Viewport {
        self.interaction.viewport()
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        self.interaction.viewport_mut()
    }

    pub fn interaction(&self) -> &InteractionController {
        &self.interaction
    }

    pub fn set_container(&mut self, container: Rect) {
        self.interaction.set_container(container);
    }

    /// Center the content once after a data or filter change.
    pub fn auto_center(&mut self) -> bool {
        let size = self.interaction.container_size();
        self.interaction.viewport_mut().auto_center(size)
    }

    pub fn center_view(&mut self) {
        let size = self.interaction.container_size();
        self.interaction.viewport_mut().center_view(size);
    }

    pub fn fit_to_view(&mut self) {
        let size = self.interaction.container_size();
        self.interaction.viewport_mut().fit_to_view(size);
    }

    // =========================================================================
    // Pointer input
    // =========================================================================

    fn apply(&mut self, effect: Effect) -> Effect {
        if effect.relayout {
            self.relayout();
        }
        effect
    }

    pub fn pointer_down(
        &mut self,
        client: Point,
        target: PointerTarget,
        captures: &mut dyn CaptureProvider,
    ) -> Effect {
        let effect = self
            .interaction
            .pointer_down(client, target, &self.cards, captures);
        self.apply(effect)
    }

    pub fn pointer_move(&mut self, client: Point) -> Effect {
        let effect = self.interaction.pointer_move(client);
        self.apply(effect)
    }

    pub fn pointer_up(&mut self) -> bool {
        self.interaction.pointer_up()
    }

    pub fn pointer_leave(&mut self) -> bool {
        self.interaction.pointer_leave()
    }

    pub fn wheel(&mut self, client: Point, delta_y: f64) -> Effect {
        self.interaction.wheel(client, delta_y)
    }

    pub fn touch_start(
        &mut self,
        touches: &[Point],
        target: PointerTarget,
        captures: &mut dyn CaptureProvider,
    ) -> Effect {
        let effect = self
            .interaction
            .touch_start(touches, target, &self.cards, captures);
        self.apply(effect)
    }

    pub fn touch_move(&mut self, touches: &[Point]) -> Effect {
        let effect = self.interaction.touch_move(touches);
        self.apply(effect)
    }

    pub fn touch_end(&mut self) -> bool {
        self.interaction.touch_end()
    }

    /// Drop every manual position and lay out from scratch.
    pub fn reset_positions(&mut self) {
        let effect = self.interaction.reset_positions();
        self.apply(effect);
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::graph::{FALLBACK_COLOR, Gender, RelationshipType};
    use crate::interaction::NoCapture;
    use crate::routing::{RouteKind, label_width};

    fn family() -> (Vec<Relative>, Vec<Relationship>) {
        let relatives = vec![
            Relative::new(1, "Иван", "Петров")
                .with_gender(Gender::Male)
                .with_generation(0),
            Relative::new(2, "Мария", "Петрова")
                .with_gender(Gender::Female)
                .with_generation(0),
            Relative::new(3, "Олег", "Петров")
                .with_gender(Gender::Male)
                .with_generation(1),
            Relative::new(4, "Анна", "Петрова")
                .with_gender(Gender::Female)
                .with_generation(1)
                .with_story("Детство", "..."),
        ];
        let relationships = vec![
            Relationship::new(1, 1, 3, RelationshipType::Father),
            Relationship::new(2, 1, 4, RelationshipType::Father),
            Relationship::new(3, 2, 3, RelationshipType::Mother),
            Relationship::new(4, 1, 2, RelationshipType::Spouse),
            Relationship::new(5, 3, 4, RelationshipType::Sister),
        ];
        (relatives, relationships)
    }

    fn session() -> CanvasSession {
        let mut session = CanvasSession::default();
        session.set_container(Rect::new(0.0, 0.0, 1280.0, 800.0));
        let (relatives, relationships) = family();
        session.set_data(relatives, relationships);
        session
    }

    #[test]
    fn test_set_data_lays_out_every_relative() {
        let session = session();
        assert_eq!(session.positions().len(), 4);
        assert_eq!(session.cards().len(), 4);
        assert!(session.viewport().metrics().has_content);
        for id in 1..=4 {
            assert!(session.position_of(RelativeId(id)).is_some());
        }
    }

    #[test]
    fn test_duplicate_relatives_keep_first() {
        let mut session = CanvasSession::default();
        session.set_data(
            vec![
                Relative::new(1, "First", ""),
                Relative::new(1, "Second", ""),
            ],
            Vec::new(),
        );
        assert_eq!(session.relatives().len(), 1);
        assert_eq!(session.relative(RelativeId(1)).unwrap().first_name, "First");
    }

    #[test]
    fn test_edges_cover_every_route_kind() {
        let session = session();
        let edges = session.edges();
        assert_eq!(edges.len(), 5);
        let kind = |id: i64| {
            edges
                .iter()
                .find(|e| e.relationship_id.raw() == id)
                .map(|e| e.kind)
        };
        assert_eq!(kind(1), Some(RouteKind::Descent));
        assert_eq!(kind(4), Some(RouteKind::SpouseWire));
        assert_eq!(kind(5), Some(RouteKind::SiblingArc));
    }

    #[test]
    fn test_unknown_tag_is_labelled_with_itself() {
        let (relatives, mut relationships) = family();
        relationships.push(
            serde_json::from_value(serde_json::json!({
                "id": 6,
                "from_relative_id": 2,
                "to_relative_id": 4,
                "relationship_type": "best_friend"
            }))
            .unwrap(),
        );
        let mut session = CanvasSession::default();
        session.set_data(relatives, relationships);

        let edges = session.edges();
        let edge = edges
            .iter()
            .find(|e| e.relationship_id.raw() == 6)
            .unwrap();
        assert_eq!(edge.relationship_type, RelationshipType::Unknown);
        assert_eq!(edge.label, "best_friend");
        assert_eq!(edge.label_width, label_width("best_friend"));
        assert_eq!(edge.color, FALLBACK_COLOR);
        assert_eq!(edge.kind, RouteKind::Descent);
    }

    #[test]
    fn test_filter_hides_cards_and_their_edges() {
        let mut session = session();
        session.set_filter(RelativeFilter::new().with_generation(1));

        assert_eq!(session.positions().len(), 2);
        assert!(session.position_of(RelativeId(1)).is_none());
        let edges = session.edges();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].relationship_id.raw(), 5);

        session.clear_filter();
        assert_eq!(session.positions().len(), 4);
    }

    #[test]
    fn test_auto_center_once_per_change() {
        let mut session = session();
        assert!(session.auto_center());
        assert!(!session.auto_center());

        session.set_filter(RelativeFilter::new().with_search("анна"));
        assert!(session.auto_center());
    }

    #[test]
    fn test_pan_blocks_auto_center() {
        let mut session = session();
        session.pointer_down(Point::new(-5000.0, -5000.0), PointerTarget::Canvas, &mut NoCapture);
        session.pointer_up();
        assert!(!session.auto_center());
    }

    #[test]
    fn test_drag_moves_card_and_rebuilds_index() {
        let mut session = session();
        session.auto_center();

        let id = RelativeId(3);
        let start = session.position_of(id).unwrap();
        let container = session.interaction().container().origin;
        let press = session
            .viewport()
            .world_to_client(start + Point::new(10.0, 10.0), container);

        session.pointer_down(press, PointerTarget::Card(id), &mut NoCapture);
        let scale = session.viewport().scale();
        let effect = session.pointer_move(press + Point::new(0.0, 900.0 * scale));
        assert!(effect.relayout);
        session.pointer_up();

        let moved = session.position_of(id).unwrap();
        assert!((moved.y - (start.y + 900.0)).abs() < 1e-6);
        assert!(session.manual_positions().contains(id));
        assert_eq!(session.card_at(moved + Point::new(1.0, 1.0)), Some(id));

        session.reset_positions();
        assert!(session.manual_positions().is_empty());
        assert_eq!(session.position_of(id), Some(start));
    }

    #[test]
    fn test_generation_labels_follow_data() {
        let session = session();
        let labels = session.generation_labels();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[&0].roman, "I");
        assert_eq!(labels[&1].roman, "II");
    }

    #[test]
    fn test_layout_config_changes_card_size() {
        let mut session = session();
        let config = LayoutConfig {
            card_width: 100.0,
            card_height: 120.0,
            ..LayoutConfig::default()
        };
        session.set_layout_config(config);
        let id = RelativeId(1);
        let p = session.position_of(id).unwrap();
        assert_eq!(session.card_at(p + Point::new(99.0, 119.0)), Some(id));
        assert_eq!(session.card_at(p + Point::new(150.0, 119.0)), None);
    }
}
