// Engine module - glow mesh generation, per-frame extrusion, and the hosts that drive them

pub mod camera;
pub mod color;
pub mod curve;
pub mod debug_lines;
pub mod debug_overlay;
pub mod extrude;
pub mod glow_mesh;
pub mod glow_polygon;
pub mod glow_quad;
pub mod input;
pub mod math;
pub mod mesh;
pub mod sections;

// Re-export commonly used items
pub use color::LinearColor;
pub use extrude::{extrude_quad, ExtrudedQuad, FadeParams, ScaleMode};
pub use glow_mesh::{build_glow_mesh, build_split_glow_mesh, SplitGlowMesh};
pub use glow_polygon::GlowPolygon;
pub use glow_quad::{GlowQuad, GlowSettings, ViewerSource};
pub use math::LocalFrame;
pub use mesh::MeshBuffers;
pub use sections::{MaterialId, MeshSink, SectionLayout};

#[derive(Debug, thiserror::Error)]
pub enum GlowError {
    #[error("polygon must have at least 3 points, got {count}")]
    TooFewPoints { count: usize },

    #[error("quad must have exactly 4 points, got {count}")]
    QuadPointCount { count: usize },

    #[error("index buffer length must be a multiple of 3, got {len}")]
    IndicesNotTriangles { len: usize },

    #[error("mesh index out of bounds: {index} >= {vertex_count}")]
    IndexOutOfBounds { index: u32, vertex_count: usize },

    #[error("{attribute} has {len} entries, expected {expected}")]
    AttributeLength { attribute: &'static str, len: usize, expected: usize },
}

pub type Result<T> = std::result::Result<T, GlowError>;
