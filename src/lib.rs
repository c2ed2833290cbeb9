// Glow quad: a flat polygon whose silhouette fades to transparent at glancing angles.
// The core (engine::glow_mesh, engine::extrude) is pure geometry; the hosts
// (engine::glow_quad, engine::glow_polygon) decide when to rebuild vs refresh.

pub mod engine;

pub use engine::{GlowError, Result};
