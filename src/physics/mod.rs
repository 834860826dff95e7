mod forces;
mod quadtree;

use std::f32::consts::PI;
use std::sync::atomic::{AtomicBool, Ordering};

use eframe::egui::{Vec2, vec2};
use tracing::{debug, info, trace, warn};

use crate::config::{CanvasSize, LayoutConfig};
use crate::error::Result;
use crate::graph::{GraphModel, Node};

pub use forces::{DEFAULT_FORCES, ForceKind};
use forces::ForceFrame;

const INITIAL_RADIUS: f32 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimulationState {
    Idle,
    Running,
}

/// Proof that a tick belongs to the current run of the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickHandle {
    generation: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WarmUp {
    Completed { ticks: usize },
    Cancelled { ticks: usize },
}

#[derive(Default)]
struct PhysicsScratch {
    positions: Vec<Vec2>,
    predicted: Vec<Vec2>,
    targets: Vec<Vec2>,
    deltas: Vec<Vec2>,
}

#[derive(Default)]
struct IntegrationReport {
    repaired: usize,
    limited: usize,
}

pub struct Simulation {
    config: LayoutConfig,
    canvas: CanvasSize,
    clustering: bool,
    forces: Vec<ForceKind>,
    state: SimulationState,
    alpha: f32,
    alpha_target: f32,
    generation: u64,
    ticks: u64,
    cluster_centers: Vec<Vec2>,
    scratch: PhysicsScratch,
}

impl Simulation {
    /// Validates the configuration, seeds node positions around their gravity
    /// targets and starts a hot simulation.
    pub fn start(
        model: &mut GraphModel,
        config: &LayoutConfig,
        canvas: CanvasSize,
        clustering: bool,
    ) -> Result<Self> {
        config.validate()?;

        let mut simulation = Self {
            config: config.clone(),
            canvas,
            clustering,
            forces: DEFAULT_FORCES.to_vec(),
            state: SimulationState::Running,
            alpha: 1.0,
            alpha_target: 0.0,
            generation: 0,
            ticks: 0,
            cluster_centers: Vec::new(),
            scratch: PhysicsScratch::default(),
        };
        simulation.refresh_cluster_centers(model);
        simulation.seed_positions(model);

        info!(
            nodes = model.node_count(),
            links = model.link_count(),
            clustering,
            width = canvas.width(),
            height = canvas.height(),
            "simulation started"
        );
        Ok(simulation)
    }

    pub fn forces(&self) -> &[ForceKind] {
        &self.forces
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SimulationState::Running
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn alpha_target(&self) -> f32 {
        self.alpha_target
    }

    pub fn clustering(&self) -> bool {
        self.clustering
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn handle(&self) -> TickHandle {
        TickHandle {
            generation: self.generation,
        }
    }

    fn supersede(&mut self) -> TickHandle {
        self.generation = self.generation.wrapping_add(1);
        self.state = SimulationState::Running;
        self.handle()
    }

    /// Keeps the simulation hot at `alpha_target` (drag in progress).
    pub fn restart(&mut self, alpha_target: f32) -> TickHandle {
        self.alpha_target = alpha_target.clamp(0.0, 1.0);
        trace!(alpha_target = self.alpha_target, "simulation restarted");
        self.supersede()
    }

    /// Raises alpha to at least `alpha` and lets the layout cool from there.
    pub fn reheat(&mut self, alpha: f32) -> TickHandle {
        self.alpha = self.alpha.max(alpha.clamp(0.0, 1.0));
        self.alpha_target = 0.0;
        debug!(alpha = self.alpha, "simulation reheated");
        self.supersede()
    }

    pub fn release(&mut self) {
        self.alpha_target = 0.0;
    }

    pub fn stop(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.state = SimulationState::Idle;
    }

    /// Advances one tick if `handle` belongs to the current run.
    pub fn tick(&mut self, model: &mut GraphModel, handle: TickHandle) -> bool {
        if handle.generation != self.generation {
            trace!(
                stale = handle.generation,
                current = self.generation,
                "dropping superseded tick"
            );
            return false;
        }
        self.step(model)
    }

    /// Advances one tick of the current run. Returns `false` once idle.
    pub fn step(&mut self, model: &mut GraphModel) -> bool {
        if self.state == SimulationState::Idle {
            return false;
        }
        if self.cluster_centers.len() != model.clusters().len() {
            self.refresh_cluster_centers(model);
        }

        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
        self.prepare_scratch(model);

        let table = *self.config.forces(self.clustering);
        let collision_cap =
            fair_share_radius(self.canvas, model.node_count()) * table.collision_fair_share;
        let canvas_center = self.canvas.center();
        let PhysicsScratch {
            positions,
            predicted,
            targets,
            deltas,
        } = &mut self.scratch;

        let frame = ForceFrame {
            alpha: self.alpha,
            table: &table,
            positions: positions.as_slice(),
            predicted: predicted.as_slice(),
            targets: targets.as_slice(),
            canvas_center,
            collision_cap,
        };
        for force in &self.forces {
            force.apply(model, &frame, deltas);
        }

        let (min, max) = bounds(self.canvas, self.config.bounds_margin);
        let report = integrate(model, &self.config, min, max, targets, deltas);
        if report.repaired > 0 {
            warn!(
                repaired = report.repaired,
                tick = self.ticks,
                "repaired non-finite node state"
            );
        }
        if report.limited > 0 {
            trace!(limited = report.limited, "clamped node motion");
        }

        self.ticks += 1;
        if self.alpha < self.config.alpha_min && self.alpha_target < self.config.alpha_min {
            self.state = SimulationState::Idle;
            debug!(ticks = self.ticks, "simulation cooled");
        }
        true
    }

    /// Runs up to the configured number of ticks without rendering, checking
    /// `cancel` before every tick.
    pub fn warm_up(&mut self, model: &mut GraphModel, cancel: &AtomicBool) -> WarmUp {
        let limit = self.config.warmup_ticks();
        for ticks in 0..limit {
            if cancel.load(Ordering::Relaxed) {
                info!(ticks, "warm-up cancelled");
                return WarmUp::Cancelled { ticks };
            }
            if !self.step(model) {
                debug!(ticks, "warm-up finished early");
                return WarmUp::Completed { ticks };
            }
        }
        debug!(ticks = limit, alpha = self.alpha, "warm-up finished");
        WarmUp::Completed { ticks: limit }
    }

    pub fn set_clustering(&mut self, model: &GraphModel, clustering: bool) -> TickHandle {
        self.clustering = clustering;
        self.refresh_cluster_centers(model);
        info!(clustering, "layout mode changed");
        self.reheat(self.config.reheat_alpha)
    }

    pub fn resize(&mut self, model: &mut GraphModel, canvas: CanvasSize) -> TickHandle {
        let (old_width, old_height) = (self.canvas.width(), self.canvas.height());
        self.canvas = canvas;
        self.refresh_cluster_centers(model);

        let scale = vec2(canvas.width() / old_width, canvas.height() / old_height);
        for node in model.nodes_mut() {
            node.anchor = node.anchor.map(|anchor| anchor * scale);
            node.pinned = node.pinned.map(|pin| pin * scale);
        }
        debug!(
            width = canvas.width(),
            height = canvas.height(),
            "canvas resized"
        );
        self.reheat(self.config.reheat_alpha)
    }

    /// Gravity center of a cluster in canvas coordinates for the current mode.
    pub fn cluster_center(&self, cluster: usize) -> Option<Vec2> {
        self.cluster_centers.get(cluster).copied()
    }

    /// Where gravity pulls `node`: its drop anchor, its cluster center, or the canvas center.
    pub fn gravity_target(&self, node: &Node) -> Vec2 {
        node.anchor
            .or_else(|| node.cluster.and_then(|cluster| self.cluster_center(cluster)))
            .unwrap_or_else(|| self.canvas.center())
    }

    pub fn bounds(&self) -> (Vec2, Vec2) {
        bounds(self.canvas, self.config.bounds_margin)
    }

    pub fn clamp_to_bounds(&self, point: Vec2) -> Vec2 {
        let (min, max) = self.bounds();
        point.clamp(min, max)
    }

    fn refresh_cluster_centers(&mut self, model: &GraphModel) {
        let size = self.canvas.size();
        let center = self.canvas.center();
        let clustering = self.clustering;
        self.cluster_centers = model
            .clusters()
            .iter()
            .map(|cluster| {
                if clustering {
                    cluster.anchor * size
                } else {
                    center
                }
            })
            .collect();
    }

    fn seed_positions(&mut self, model: &mut GraphModel) {
        let angle_step = PI * (3.0 - 5.0_f32.sqrt());
        let targets = model
            .nodes()
            .iter()
            .map(|node| self.gravity_target(node))
            .collect::<Vec<_>>();
        for (index, (node, target)) in model.nodes_mut().iter_mut().zip(targets).enumerate() {
            let radius = INITIAL_RADIUS * (0.5 + index as f32).sqrt();
            let angle = index as f32 * angle_step;
            node.position = self.clamp_to_bounds(target + vec2(angle.cos(), angle.sin()) * radius);
            node.velocity = Vec2::ZERO;
        }
    }

    fn prepare_scratch(&mut self, model: &GraphModel) {
        let count = model.node_count();
        let scratch = &mut self.scratch;
        scratch.positions.clear();
        scratch.predicted.clear();
        scratch.targets.clear();
        scratch.positions.reserve(count);
        scratch.predicted.reserve(count);
        scratch.targets.reserve(count);
        for node in model.nodes() {
            scratch.positions.push(node.position);
            scratch.predicted.push(node.position + node.velocity);
        }
        for node in model.nodes() {
            let target = node
                .anchor
                .or_else(|| {
                    node.cluster
                        .and_then(|cluster| self.cluster_centers.get(cluster).copied())
                })
                .unwrap_or_else(|| self.canvas.center());
            scratch.targets.push(target);
        }
        scratch.deltas.clear();
        scratch.deltas.resize(count, Vec2::ZERO);
    }
}

/// Radius at which `count` equal circles would tile the canvas.
fn fair_share_radius(canvas: CanvasSize, count: usize) -> f32 {
    (canvas.area() / (count.max(1) as f32 * PI)).sqrt()
}

fn bounds(canvas: CanvasSize, margin: f32) -> (Vec2, Vec2) {
    let size = canvas.size();
    (-size * margin, size * (1.0 + margin))
}

fn is_finite(value: Vec2) -> bool {
    value.x.is_finite() && value.y.is_finite()
}

fn integrate(
    model: &mut GraphModel,
    config: &LayoutConfig,
    min: Vec2,
    max: Vec2,
    targets: &[Vec2],
    deltas: &[Vec2],
) -> IntegrationReport {
    let mut report = IntegrationReport::default();
    let keep = 1.0 - config.velocity_decay;
    let max_speed = config.max_velocity;

    for (index, node) in model.nodes_mut().iter_mut().enumerate() {
        if let Some(pin) = node.pinned {
            node.position = pin.clamp(min, max);
            node.velocity = Vec2::ZERO;
            continue;
        }

        let mut velocity = (node.velocity + deltas[index]) * keep;
        if !is_finite(velocity) {
            velocity = Vec2::ZERO;
            report.repaired += 1;
        }
        let speed_sq = velocity.length_sq();
        if speed_sq > max_speed * max_speed {
            velocity *= max_speed / speed_sq.sqrt();
            report.limited += 1;
        }

        let mut position = node.position + velocity;
        if !is_finite(position) {
            position = targets[index];
            velocity = Vec2::ZERO;
            report.repaired += 1;
        }
        let bounded = position.clamp(min, max);
        if bounded != position {
            if bounded.x != position.x {
                velocity.x = 0.0;
            }
            if bounded.y != position.y {
                velocity.y = 0.0;
            }
            report.limited += 1;
        }

        node.position = bounded;
        node.velocity = velocity;
    }
    report
}
