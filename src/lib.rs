//! Force-directed layout and focus handling for correspondence networks.

pub mod config;
pub mod context;
pub mod dataset;
pub mod error;
pub mod focus;
pub mod graph;
pub mod interaction;
pub mod physics;
pub mod render;
pub mod search;
pub mod util;
