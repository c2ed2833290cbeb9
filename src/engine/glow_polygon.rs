// Glowing polygon host: an N-gon whose glow is pushed by a shader at draw time.
// Only topology changes reach the sink; there is no per-frame refresh.

use glam::Vec3;
use log::{debug, warn};
use super::glow_mesh::{self, SplitGlowMesh, DEFAULT_EPS};
use super::mesh::MeshBuffers;
use super::sections::{MaterialId, MeshSink, SectionLayout, FILL_SECTION, GLOW_SECTION};
use super::{GlowError, Result};

pub struct GlowPolygon {
    points: Vec<Vec3>,
    eps: f32,
    glow_material: Option<MaterialId>,
    fill_material: Option<MaterialId>,
    layout: SectionLayout,

    // Rebuild scratch, reused across rebuilds.
    combined: MeshBuffers,
    split: SplitGlowMesh,
}

impl GlowPolygon {
    pub fn new(points: Vec<Vec3>) -> Result<Self> {
        check_points(&points)?;
        Ok(Self {
            points,
            eps: DEFAULT_EPS,
            glow_material: None,
            fill_material: None,
            layout: SectionLayout::Empty,
            combined: MeshBuffers::new(),
            split: SplitGlowMesh::default(),
        })
    }

    pub fn points(&self) -> &[Vec3] { &self.points }
    pub fn eps(&self) -> f32 { self.eps }
    pub fn layout(&self) -> SectionLayout { self.layout }

    /// Replace the outline. Fewer than 3 points is rejected and nothing changes.
    pub fn set_polygon(&mut self, points: &[Vec3], sink: &mut dyn MeshSink) -> Result<()> {
        check_points(points)?;
        self.points.clear();
        self.points.extend_from_slice(points);
        self.rebuild(sink)
    }

    pub fn set_eps(&mut self, eps: f32, sink: &mut dyn MeshSink) -> Result<()> {
        self.eps = eps;
        self.rebuild(sink)
    }

    /// Identical materials are a no-op.
    pub fn set_materials(
        &mut self,
        glow: Option<MaterialId>,
        fill: Option<MaterialId>,
        sink: &mut dyn MeshSink,
    ) -> Result<()> {
        if glow == self.glow_material && fill == self.fill_material {
            return Ok(());
        }
        self.glow_material = glow;
        self.fill_material = fill;
        self.rebuild(sink)
    }

    /// Regenerate buffers and recreate sections for the current layout.
    pub fn rebuild(&mut self, sink: &mut dyn MeshSink) -> Result<()> {
        let layout = SectionLayout::resolve(self.glow_material, self.fill_material);

        // Build before clearing so a failure leaves the sink's sections intact.
        match layout {
            SectionLayout::Empty => {}
            SectionLayout::Merged => glow_mesh::build_glow_mesh_into(&self.points, self.eps, &mut self.combined)?,
            _ => glow_mesh::build_split_glow_mesh_into(&self.points, self.eps, &mut self.split)?,
        }
        self.layout = layout;
        sink.clear_all_sections();

        match (layout, self.glow_material, self.fill_material) {
            (SectionLayout::Empty, _, _) => {
                warn!("glow polygon rebuilt without any material; nothing will be drawn");
            }
            (SectionLayout::Merged, Some(material), _) => {
                sink.create_section(GLOW_SECTION, &self.combined, material);
            }
            (layout, glow, fill) => {
                if let (true, Some(material)) = (layout.has_glow(), glow) {
                    sink.create_section(GLOW_SECTION, &self.split.glow, material);
                }
                if let (true, Some(material)) = (layout.has_separate_fill(), fill) {
                    sink.create_section(FILL_SECTION, &self.split.fill, material);
                }
            }
        }

        debug!("glow polygon rebuilt: {} points, layout {:?}", self.points.len(), self.layout);
        Ok(())
    }
}

fn check_points(points: &[Vec3]) -> Result<()> {
    if points.len() < 3 {
        return Err(GlowError::TooFewPoints { count: points.len() });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::sections::MeshSections;

    const GLOW: MaterialId = MaterialId(1);
    const FILL: MaterialId = MaterialId(2);

    fn hexagon() -> Vec<Vec3> {
        (0..6)
            .map(|i| {
                let t = i as f32 * std::f32::consts::TAU / 6.0;
                Vec3::new(t.cos(), t.sin(), 0.0) * 10.0
            })
            .collect()
    }

    #[test]
    fn too_few_points_rejected_up_front() {
        assert!(matches!(GlowPolygon::new(vec![Vec3::ZERO; 2]), Err(GlowError::TooFewPoints { count: 2 })));
    }

    #[test]
    fn merged_materials_use_combined_mesh() {
        let mut sink = MeshSections::new();
        let mut poly = GlowPolygon::new(hexagon()).unwrap();
        poly.set_materials(Some(GLOW), Some(GLOW), &mut sink).unwrap();

        assert_eq!(poly.layout(), SectionLayout::Merged);
        assert_eq!(sink.section_count(), 1);
        let mesh = &sink.section(GLOW_SECTION).unwrap().mesh;
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.indices.len(), glow_mesh::combined_index_count(6));
    }

    #[test]
    fn split_materials_use_two_sections() {
        let mut sink = MeshSections::new();
        let mut poly = GlowPolygon::new(hexagon()).unwrap();
        poly.set_materials(Some(GLOW), Some(FILL), &mut sink).unwrap();

        assert_eq!(sink.section_count(), 2);
        let glow = sink.section(GLOW_SECTION).unwrap();
        let fill = sink.section(FILL_SECTION).unwrap();
        assert_eq!((glow.material, fill.material), (GLOW, FILL));
        assert_eq!(glow.mesh.indices.len(), 3 * 4 * 6);
        assert_eq!(fill.mesh.vertex_count(), 6);
        assert_eq!(fill.mesh.triangle_count(), 4);
    }

    #[test]
    fn glow_only_skips_fill() {
        let mut sink = MeshSections::new();
        let mut poly = GlowPolygon::new(hexagon()).unwrap();
        poly.set_materials(Some(GLOW), None, &mut sink).unwrap();
        assert_eq!(sink.section_count(), 1);
        assert!(sink.section(FILL_SECTION).is_none());
        assert_eq!(sink.section(GLOW_SECTION).unwrap().mesh.indices.len(), 72);
    }

    #[test]
    fn bad_polygon_keeps_previous_sections() {
        let mut sink = MeshSections::new();
        let mut poly = GlowPolygon::new(hexagon()).unwrap();
        poly.set_materials(Some(GLOW), Some(GLOW), &mut sink).unwrap();
        let before = sink.section(GLOW_SECTION).unwrap().clone();

        assert!(poly.set_polygon(&[Vec3::ZERO, Vec3::X], &mut sink).is_err());
        assert_eq!(poly.points(), &hexagon()[..]);
        assert_eq!(sink.section(GLOW_SECTION).unwrap(), &before);
    }

    #[test]
    fn new_polygon_changes_topology() {
        let mut sink = MeshSections::new();
        let mut poly = GlowPolygon::new(hexagon()).unwrap();
        poly.set_materials(Some(GLOW), Some(GLOW), &mut sink).unwrap();
        let tri = [Vec3::ZERO, Vec3::X, Vec3::Y];
        poly.set_polygon(&tri, &mut sink).unwrap();
        let mesh = &sink.section(GLOW_SECTION).unwrap().mesh;
        assert_eq!(mesh.vertex_count(), 12);
        assert_eq!(mesh.indices.len(), 39);
    }

    #[test]
    fn repeated_rebuilds_are_identical() {
        let mut sink = MeshSections::new();
        let mut poly = GlowPolygon::new(hexagon()).unwrap();
        poly.set_materials(Some(GLOW), Some(FILL), &mut sink).unwrap();
        let first = sink.section(GLOW_SECTION).unwrap().clone();
        poly.rebuild(&mut sink).unwrap();
        assert_eq!(sink.section(GLOW_SECTION).unwrap(), &first);
        assert_eq!(sink.clears, 2);
    }
}
