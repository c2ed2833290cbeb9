// Mesh sections: how glow and fill are split across draw calls, and the sink
// that receives them.
//
// Two kinds of calls reach a sink:
//   create_section  topology change: new index buffer, vertex count, material
//   update_section  per-frame refresh: same lengths, new positions/colors

use glam::{Vec2, Vec3};
use log::warn;
use super::color::LinearColor;
use super::mesh::MeshBuffers;

pub const GLOW_SECTION: usize = 0;
pub const FILL_SECTION: usize = 1;

/// Opaque handle to a host-side material. Only compared for identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialId(pub u32);

// ============================================================================
// LAYOUT POLICY
// ============================================================================

/// Which sections exist for a given pair of materials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SectionLayout {
    /// Nothing to draw.
    #[default]
    Empty,
    /// Same material: fill triangles live in the glow section's index buffer.
    Merged,
    /// Different materials: glow in section 0, fill in section 1.
    Split,
    GlowOnly,
    FillOnly,
}

impl SectionLayout {
    pub fn resolve(glow: Option<MaterialId>, fill: Option<MaterialId>) -> Self {
        match (glow, fill) {
            (None, None) => Self::Empty,
            (Some(g), Some(f)) if g == f => Self::Merged,
            (Some(_), Some(_)) => Self::Split,
            (Some(_), None) => Self::GlowOnly,
            (None, Some(_)) => Self::FillOnly,
        }
    }

    pub fn has_glow(self) -> bool {
        matches!(self, Self::Merged | Self::Split | Self::GlowOnly)
    }

    /// Fill drawn in its own section.
    pub fn has_separate_fill(self) -> bool {
        matches!(self, Self::Split | Self::FillOnly)
    }

    pub fn is_empty(self) -> bool {
        self == Self::Empty
    }
}

// ============================================================================
// SINK
// ============================================================================

/// Per-frame payload: replaces vertex attributes without touching indices.
#[derive(Debug, Clone, Copy)]
pub struct SectionUpdate<'a> {
    pub positions: &'a [Vec3],
    pub colors: &'a [LinearColor],
    pub uv0: Option<&'a [Vec2]>,
}

/// Receives mesh sections from a glow host. Implemented by the renderer.
pub trait MeshSink {
    fn clear_all_sections(&mut self);
    fn create_section(&mut self, section: usize, mesh: &MeshBuffers, material: MaterialId);
    /// Must not reallocate: lengths match the section's last `create_section`.
    fn update_section(&mut self, section: usize, update: SectionUpdate<'_>);
}

/// A section as held by `MeshSections`.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSection {
    pub mesh: MeshBuffers,
    pub material: MaterialId,
}

/// CPU-side sink. Keeps the latest buffers per section and counts calls, so a
/// host can be driven headless and checked for rebuild vs refresh behavior.
#[derive(Debug, Default)]
pub struct MeshSections {
    sections: Vec<Option<StoredSection>>,
    pub creates: usize,
    pub updates: usize,
    pub clears: usize,
}

impl MeshSections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section(&self, index: usize) -> Option<&StoredSection> {
        self.sections.get(index).and_then(Option::as_ref)
    }

    pub fn section_count(&self) -> usize {
        self.sections.iter().filter(|s| s.is_some()).count()
    }
}

impl MeshSink for MeshSections {
    fn clear_all_sections(&mut self) {
        self.sections.clear();
        self.clears += 1;
    }

    fn create_section(&mut self, section: usize, mesh: &MeshBuffers, material: MaterialId) {
        if self.sections.len() <= section {
            self.sections.resize(section + 1, None);
        }
        self.sections[section] = Some(StoredSection { mesh: mesh.clone(), material });
        self.creates += 1;
    }

    fn update_section(&mut self, section: usize, update: SectionUpdate<'_>) {
        let Some(stored) = self.sections.get_mut(section).and_then(Option::as_mut) else {
            warn!("update of missing mesh section {section}");
            return;
        };
        let mesh = &mut stored.mesh;
        if mesh.positions.len() != update.positions.len() || mesh.colors.len() != update.colors.len() {
            warn!(
                "section {section} update has {} vertices, section holds {}",
                update.positions.len(),
                mesh.positions.len()
            );
            return;
        }
        mesh.positions.copy_from_slice(update.positions);
        mesh.colors.copy_from_slice(update.colors);
        if let Some(uv) = update.uv0 {
            if mesh.uv0.len() == uv.len() {
                mesh.uv0.copy_from_slice(uv);
            }
        }
        self.updates += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: MaterialId = MaterialId(1);
    const B: MaterialId = MaterialId(2);

    #[test]
    fn layout_from_materials() {
        assert_eq!(SectionLayout::resolve(None, None), SectionLayout::Empty);
        assert_eq!(SectionLayout::resolve(Some(A), Some(A)), SectionLayout::Merged);
        assert_eq!(SectionLayout::resolve(Some(A), Some(B)), SectionLayout::Split);
        assert_eq!(SectionLayout::resolve(Some(A), None), SectionLayout::GlowOnly);
        assert_eq!(SectionLayout::resolve(None, Some(B)), SectionLayout::FillOnly);

        assert!(SectionLayout::Merged.has_glow() && !SectionLayout::Merged.has_separate_fill());
        assert!(!SectionLayout::FillOnly.has_glow() && SectionLayout::FillOnly.has_separate_fill());
    }

    #[test]
    fn update_rewrites_in_place() {
        let mut sink = MeshSections::new();
        let mesh = MeshBuffers {
            positions: vec![Vec3::ZERO; 3],
            indices: vec![0, 1, 2],
            colors: vec![LinearColor::TRANSPARENT; 3],
            ..MeshBuffers::default()
        };
        sink.create_section(1, &mesh, A);
        assert!(sink.section(0).is_none());
        let capacity = sink.section(1).unwrap().mesh.positions.capacity();

        let positions = [Vec3::X, Vec3::Y, Vec3::Z];
        let colors = [LinearColor::WHITE; 3];
        sink.update_section(1, SectionUpdate { positions: &positions, colors: &colors, uv0: None });

        let stored = &sink.section(1).unwrap().mesh;
        assert_eq!(stored.positions, positions);
        assert_eq!(stored.positions.capacity(), capacity);
        assert_eq!(stored.indices, vec![0, 1, 2]);
        assert_eq!((sink.creates, sink.updates), (1, 1));
    }

    #[test]
    fn mismatched_update_is_ignored() {
        let mut sink = MeshSections::new();
        sink.create_section(0, &MeshBuffers::default(), A);
        sink.update_section(0, SectionUpdate { positions: &[Vec3::ONE], colors: &[LinearColor::WHITE], uv0: None });
        sink.update_section(3, SectionUpdate { positions: &[], colors: &[], uv0: None });
        assert_eq!(sink.updates, 0);
        assert!(sink.section(0).unwrap().mesh.positions.is_empty());
    }
}
