use std::fs;
use std::path::Path;

use anyhow::Context;
use eframe::egui::{Vec2, vec2};
use serde::Deserialize;

use crate::error::{GraphError, Result};

/// Hard ceiling for synchronous warm-up, whatever the configuration asks for.
pub const MAX_WARMUP_TICKS: usize = 2_000;

/// Strengths of the named forces for one layout mode.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ForceTable {
    /// Many-body strength; negative values repel.
    pub charge_strength: f32,
    pub charge_distance_min: f32,
    pub charge_distance_max: f32,
    pub theta: f32,
    pub link_distance: f32,
    pub link_strength: f32,
    /// Multiplier applied to links whose endpoints share a cluster.
    pub same_cluster_link_factor: f32,
    pub gravity_strength: f32,
    /// Gravity toward the point a node was dropped at after a drag.
    pub anchor_gravity_strength: f32,
    pub collision_padding: f32,
    pub collision_strength: f32,
    /// Fraction of the fair-share radius a collision circle may grow to.
    pub collision_fair_share: f32,
    pub center_strength: f32,
}

impl ForceTable {
    pub fn clustered() -> Self {
        Self {
            charge_strength: -120.0,
            charge_distance_min: 1.0,
            charge_distance_max: 600.0,
            theta: 0.9,
            link_distance: 50.0,
            link_strength: 0.12,
            same_cluster_link_factor: 0.25,
            gravity_strength: 0.12,
            anchor_gravity_strength: 0.3,
            collision_padding: 3.0,
            collision_strength: 0.7,
            collision_fair_share: 0.6,
            center_strength: 0.05,
        }
    }

    pub fn spread() -> Self {
        Self {
            charge_strength: -240.0,
            charge_distance_min: 1.0,
            charge_distance_max: 900.0,
            theta: 0.9,
            link_distance: 50.0,
            link_strength: 0.6,
            same_cluster_link_factor: 0.25,
            gravity_strength: 0.04,
            anchor_gravity_strength: 0.3,
            collision_padding: 2.0,
            collision_strength: 0.7,
            collision_fair_share: 0.6,
            center_strength: 0.1,
        }
    }

    fn validate(&self, label: &str) -> Result<()> {
        let fields = [
            ("charge_strength", self.charge_strength),
            ("charge_distance_min", self.charge_distance_min),
            ("charge_distance_max", self.charge_distance_max),
            ("theta", self.theta),
            ("link_distance", self.link_distance),
            ("link_strength", self.link_strength),
            ("same_cluster_link_factor", self.same_cluster_link_factor),
            ("gravity_strength", self.gravity_strength),
            ("anchor_gravity_strength", self.anchor_gravity_strength),
            ("collision_padding", self.collision_padding),
            ("collision_strength", self.collision_strength),
            ("collision_fair_share", self.collision_fair_share),
            ("center_strength", self.center_strength),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(GraphError::InvalidConfig(format!("{label}.{name} is not finite")));
            }
            if name != "charge_strength" && value < 0.0 {
                return Err(GraphError::InvalidConfig(format!("{label}.{name} is negative")));
            }
        }

        if self.charge_distance_min <= 0.0 || self.charge_distance_max <= self.charge_distance_min {
            return Err(GraphError::InvalidConfig(format!(
                "{label}: charge distances must satisfy 0 < min < max"
            )));
        }
        if self.link_strength > 1.0 || self.collision_strength > 1.0 || self.center_strength > 1.0
        {
            return Err(GraphError::InvalidConfig(format!(
                "{label}: link, collision and center strengths must be at most 1"
            )));
        }
        Ok(())
    }
}

impl Default for ForceTable {
    fn default() -> Self {
        Self::spread()
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    pub clustered_forces: ForceTable,
    pub spread_forces: ForceTable,
    pub alpha_min: f32,
    pub alpha_decay: f32,
    /// Fraction of velocity lost every tick.
    pub velocity_decay: f32,
    pub drag_alpha_target: f32,
    /// Alpha injected by a clustering toggle or a resize.
    pub reheat_alpha: f32,
    pub max_velocity: f32,
    /// How far outside the canvas a node may go, as a fraction of the canvas size.
    pub bounds_margin: f32,
    pub warmup_ticks: usize,
    pub min_radius: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let alpha_min = 0.001_f32;
        Self {
            clustered_forces: ForceTable::clustered(),
            spread_forces: ForceTable::spread(),
            alpha_min,
            alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
            velocity_decay: 0.4,
            drag_alpha_target: 0.3,
            reheat_alpha: 0.6,
            max_velocity: 40.0,
            bounds_margin: 0.25,
            warmup_ticks: 300,
            min_radius: 5.0,
        }
    }
}

impl LayoutConfig {
    pub fn from_json_str(raw: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(raw).context("invalid layout configuration JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read layout configuration {}", path.display()))?;
        Self::from_json_str(&raw)
            .with_context(|| format!("failed to load layout configuration {}", path.display()))
    }

    pub fn forces(&self, clustering: bool) -> &ForceTable {
        if clustering {
            &self.clustered_forces
        } else {
            &self.spread_forces
        }
    }

    pub fn warmup_ticks(&self) -> usize {
        self.warmup_ticks.min(MAX_WARMUP_TICKS)
    }

    pub fn validate(&self) -> Result<()> {
        self.clustered_forces.validate("clustered_forces")?;
        self.spread_forces.validate("spread_forces")?;

        let unit_interval = [
            ("alpha_min", self.alpha_min),
            ("alpha_decay", self.alpha_decay),
            ("velocity_decay", self.velocity_decay),
            ("drag_alpha_target", self.drag_alpha_target),
            ("reheat_alpha", self.reheat_alpha),
        ];
        for (name, value) in unit_interval {
            if !(value > 0.0 && value < 1.0) {
                return Err(GraphError::InvalidConfig(format!("{name} must lie in (0, 1)")));
            }
        }

        if !(self.max_velocity.is_finite() && self.max_velocity > 0.0) {
            return Err(GraphError::InvalidConfig("max_velocity must be positive".into()));
        }
        if !(self.bounds_margin.is_finite() && self.bounds_margin >= 0.0) {
            return Err(GraphError::InvalidConfig("bounds_margin must not be negative".into()));
        }
        if !(self.min_radius.is_finite() && self.min_radius > 0.0) {
            return Err(GraphError::InvalidConfig("min_radius must be positive".into()));
        }
        Ok(())
    }
}

/// Size of the drawing surface in canvas units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanvasSize {
    width: f32,
    height: f32,
}

impl CanvasSize {
    pub fn new(width: f32, height: f32) -> Result<Self> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(GraphError::InvalidCanvas { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn width(self) -> f32 {
        self.width
    }

    pub fn height(self) -> f32 {
        self.height
    }

    pub fn size(self) -> Vec2 {
        vec2(self.width, self.height)
    }

    pub fn center(self) -> Vec2 {
        vec2(self.width / 2.0, self.height / 2.0)
    }

    pub fn area(self) -> f32 {
        self.width * self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn default_configuration_is_valid() {
        LayoutConfig::default().validate().expect("defaults validate");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = LayoutConfig::from_json_str(
            r#"{"warmup_ticks": 120, "clustered_forces": {"charge_strength": -80}}"#,
        )
        .expect("partial config loads");

        assert_eq!(config.warmup_ticks, 120);
        assert_eq!(config.clustered_forces.charge_strength, -80.0);
        assert_eq!(
            config.clustered_forces.gravity_strength,
            ForceTable::clustered().gravity_strength
        );
        assert_eq!(config.spread_forces, ForceTable::spread());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(LayoutConfig::from_json_str(r#"{"warmup": 10}"#).is_err());
    }

    #[test]
    fn out_of_range_parameters_are_configuration_errors() {
        let config = LayoutConfig {
            alpha_decay: 1.5,
            ..LayoutConfig::default()
        };
        let error = config.validate().expect_err("alpha decay above one");
        assert_eq!(error.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn warmup_is_capped() {
        let config = LayoutConfig {
            warmup_ticks: 1_000_000,
            ..LayoutConfig::default()
        };
        assert_eq!(config.warmup_ticks(), MAX_WARMUP_TICKS);
    }

    #[test]
    fn canvas_rejects_degenerate_sizes() {
        for (width, height) in [(0.0, 100.0), (100.0, -1.0), (f32::NAN, 10.0)] {
            let error = CanvasSize::new(width, height).expect_err("degenerate canvas");
            assert_eq!(error.kind(), ErrorKind::Configuration);
        }
        let canvas = CanvasSize::new(800.0, 600.0).expect("valid canvas");
        assert_eq!(canvas.center(), vec2(400.0, 300.0));
    }
}
