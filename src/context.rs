use std::sync::atomic::AtomicBool;

use eframe::egui::Vec2;
use tracing::{debug, info};

use crate::config::{CanvasSize, LayoutConfig};
use crate::dataset::RawDataset;
use crate::error::Result;
use crate::focus::{FocusState, Threshold, resolve};
use crate::graph::GraphModel;
use crate::physics::{Simulation, TickHandle, WarmUp};
use crate::render::Bindings;

const STRONGEST_CORRESPONDENTS: usize = 8;

/// What the host shows about the selected person.
#[derive(Clone, Debug, PartialEq)]
pub struct PersonInfo {
    pub name: String,
    pub affiliation: String,
    pub cluster: Option<String>,
    pub documents: f32,
    pub correspondents: usize,
    /// Strongest correspondents with the weight of the connecting link.
    pub strongest: Vec<(String, f32)>,
}

pub struct SimulationContext {
    model: GraphModel,
    simulation: Simulation,
    bindings: Bindings,
    focus: FocusState,
    threshold: Threshold,
    handle: TickHandle,
    dragging: Option<usize>,
}

impl SimulationContext {
    pub fn new(
        mut model: GraphModel,
        config: &LayoutConfig,
        canvas: CanvasSize,
        clustering: bool,
        threshold: Threshold,
    ) -> Result<Self> {
        let simulation = Simulation::start(&mut model, config, canvas, clustering)?;
        debug!(
            forces = ?simulation.forces().iter().map(|force| force.name()).collect::<Vec<_>>(),
            "registered forces"
        );
        resolve(&mut model, &FocusState::None, threshold);
        let bindings = Bindings::new(&model);
        let handle = simulation.handle();

        Ok(Self {
            model,
            simulation,
            bindings,
            focus: FocusState::None,
            threshold,
            handle,
            dragging: None,
        })
    }

    pub fn from_dataset(
        dataset: &RawDataset,
        config: &LayoutConfig,
        canvas: CanvasSize,
        clustering: bool,
        threshold: Threshold,
    ) -> Result<Self> {
        let model = GraphModel::build(dataset, config.min_radius)?;
        Self::new(model, config, canvas, clustering, threshold)
    }

    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub fn focus(&self) -> &FocusState {
        &self.focus
    }

    pub fn threshold(&self) -> Threshold {
        self.threshold
    }

    pub fn clustering(&self) -> bool {
        self.simulation.clustering()
    }

    pub fn canvas(&self) -> CanvasSize {
        self.simulation.canvas()
    }

    pub fn handle(&self) -> TickHandle {
        self.handle
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging.is_some()
    }

    pub fn warm_up(&mut self, cancel: &AtomicBool) -> WarmUp {
        let outcome = self.simulation.warm_up(&mut self.model, cancel);
        self.bindings.sync_positions(&self.model);
        outcome
    }

    pub fn tick(&mut self) -> bool {
        self.tick_with(self.handle)
    }

    /// Advances one tick on behalf of `handle`; superseded handles do nothing.
    pub fn tick_with(&mut self, handle: TickHandle) -> bool {
        let applied = self.simulation.tick(&mut self.model, handle);
        if applied {
            self.bindings.sync_positions(&self.model);
        }
        applied
    }

    pub fn is_running(&self) -> bool {
        self.simulation.is_running()
    }

    pub fn set_focus(&mut self, focus: FocusState) -> Option<usize> {
        self.focus = focus;
        self.refresh_focus()
    }

    pub fn set_threshold(&mut self, threshold: Threshold) {
        if self.threshold == threshold {
            return;
        }
        self.threshold = threshold;
        self.refresh_focus();
    }

    fn refresh_focus(&mut self) -> Option<usize> {
        let center = resolve(&mut self.model, &self.focus, self.threshold);
        self.bindings.sync(&self.model);
        center
    }

    /// Flips clustering and reheats. Returns the new mode.
    pub fn toggle_clustering(&mut self) -> bool {
        self.set_clustering(!self.simulation.clustering());
        self.simulation.clustering()
    }

    pub fn set_clustering(&mut self, clustering: bool) {
        if self.simulation.clustering() == clustering {
            return;
        }
        self.handle = self.simulation.set_clustering(&self.model, clustering);
    }

    /// Validates the new size and re-settles the layout on it. Same-size
    /// resizes are ignored.
    pub fn resize(&mut self, width: f32, height: f32) -> Result<()> {
        let canvas = CanvasSize::new(width, height)?;
        if canvas == self.simulation.canvas() {
            return Ok(());
        }
        self.handle = self.simulation.resize(&mut self.model, canvas);
        self.bindings.sync_positions(&self.model);
        Ok(())
    }

    /// Pins `name` where it is and keeps the simulation hot. A node still
    /// held from an earlier drag is dropped where it is first.
    pub fn drag_start(&mut self, name: &str) -> bool {
        let Some(index) = self.model.node_index(name) else {
            debug!(name, "drag started on an unknown node");
            return false;
        };
        if self.dragging.is_some() {
            self.drag_end();
        }
        let position = self.model.nodes()[index].position;
        self.model.nodes_mut()[index].pinned = Some(position);
        self.dragging = Some(index);
        self.handle = self.simulation.restart(self.simulation.config().drag_alpha_target);
        true
    }

    /// Moves the held node to `point`, clamped into the layout bounds.
    pub fn drag_move(&mut self, point: Vec2) {
        let Some(index) = self.dragging else {
            return;
        };
        let point = self.simulation.clamp_to_bounds(point);
        let node = &mut self.model.nodes_mut()[index];
        node.pinned = Some(point);
        node.position = point;
        node.velocity = Vec2::ZERO;
        self.bindings.sync_positions(&self.model);
    }

    /// Releases the held node; the drop point becomes its gravity target.
    pub fn drag_end(&mut self) -> Option<Vec2> {
        let index = self.dragging.take()?;
        let node = &mut self.model.nodes_mut()[index];
        let dropped = node.pinned.take().unwrap_or(node.position);
        node.anchor = Some(dropped);
        self.simulation.release();
        info!(name = %node.name, x = dropped.x, y = dropped.y, "node anchored");
        Some(dropped)
    }

    pub fn gravity_target(&self, name: &str) -> Option<Vec2> {
        self.model
            .node(name)
            .map(|node| self.simulation.gravity_target(node))
    }

    pub fn find_name(&self, query: &str) -> Option<String> {
        self.model.find_name(query).map(str::to_owned)
    }

    pub fn person_info(&self, name: &str) -> Option<PersonInfo> {
        let index = self.model.node_index(name)?;
        let node = &self.model.nodes()[index];
        let strongest = self
            .model
            .strongest_links(index, STRONGEST_CORRESPONDENTS)
            .into_iter()
            .map(|(other, weight)| (self.model.nodes()[other].name.clone(), weight))
            .collect();

        Some(PersonInfo {
            name: node.name.clone(),
            affiliation: node.affiliation.clone(),
            cluster: self.model.cluster_of(index).map(|cluster| cluster.name.clone()),
            documents: node.weight,
            correspondents: self
                .model
                .adjacency()
                .neighbors(index)
                .iter()
                .filter(|&&other| other != index)
                .count(),
            strongest,
        })
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::graph::tests::abc_dataset;

    fn context() -> SimulationContext {
        let canvas = CanvasSize::new(800.0, 600.0).expect("valid canvas");
        SimulationContext::from_dataset(
            &abc_dataset(),
            &LayoutConfig::default(),
            canvas,
            true,
            Threshold::Neighbors,
        )
        .expect("valid dataset")
    }

    #[test]
    fn resize_rejects_degenerate_canvas_and_supersedes_ticks() {
        let mut context = context();
        assert!(context.resize(0.0, 600.0).is_err());
        assert_eq!(context.canvas(), CanvasSize::new(800.0, 600.0).expect("valid canvas"));

        let stale = context.handle();
        context.resize(1024.0, 768.0).expect("valid size");
        assert!(!context.tick_with(stale));
        assert!(context.tick());
    }

    #[test]
    fn drag_release_anchors_node_at_drop_point() {
        let mut context = context();
        assert!(context.drag_start("A"));
        assert!(context.is_dragging());
        assert_eq!(context.simulation().alpha_target(), 0.3);

        context.drag_move(vec2(500.0, 120.0));
        context.tick();
        assert_eq!(context.model().nodes()[0].position, vec2(500.0, 120.0));

        assert_eq!(context.drag_end(), Some(vec2(500.0, 120.0)));
        assert_eq!(context.gravity_target("A"), Some(vec2(500.0, 120.0)));
        assert_eq!(context.simulation().alpha_target(), 0.0);
        assert_eq!(context.model().nodes()[0].pinned, None);
    }

    #[test]
    fn second_drag_drops_the_held_node() {
        let mut context = context();
        assert!(context.drag_start("A"));
        context.drag_move(vec2(450.0, 200.0));

        assert!(context.drag_start("B"));
        let a = &context.model().nodes()[0];
        assert_eq!(a.pinned, None);
        assert_eq!(a.anchor, Some(vec2(450.0, 200.0)));
        assert_eq!(context.simulation().alpha_target(), 0.3);

        assert!(context.drag_end().is_some());
        assert!(!context.is_dragging());
        for _ in 0..50 {
            context.tick();
        }
        assert!(context.model().nodes().iter().all(|node| node.pinned.is_none()));
        assert_eq!(context.gravity_target("A"), Some(vec2(450.0, 200.0)));
    }

    #[test]
    fn drag_on_unknown_node_keeps_the_current_drag() {
        let mut context = context();
        assert!(context.drag_start("A"));
        assert!(!context.drag_start("Nobody"));
        assert!(context.is_dragging());
        assert!(context.model().nodes()[0].pinned.is_some());
    }

    #[test]
    fn person_info_lists_strongest_correspondents() {
        let context = context();
        let info = context.person_info("B").expect("B exists");
        assert_eq!(info.affiliation, "Left");
        assert_eq!(info.cluster.as_deref(), Some("Left"));
        assert_eq!(info.correspondents, 2);
        assert_eq!(
            info.strongest,
            vec![("A".to_owned(), 5.0), ("C".to_owned(), 1.0)]
        );
        assert_eq!(context.person_info("Z"), None);
    }

    #[test]
    fn threshold_change_rebinds_hidden_nodes() {
        let mut context = context();
        context.set_focus(FocusState::center("A"));
        assert_eq!(context.bindings().nodes().len(), 2);

        context.set_threshold(Threshold::Everything);
        assert_eq!(context.bindings().nodes().len(), 3);
    }
}
