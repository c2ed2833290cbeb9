// Glowing quad host: owns the quad, its style and materials, and drives a mesh sink.
//
// Lifecycle:
//   rebuild()  on material or point changes: clear sections, recreate with fixed indices
//   update()   every frame: re-extrude for the current viewer, refresh in place

use glam::{Vec2, Vec3};
use log::{debug, error, warn};
use super::color::LinearColor;
use super::curve::DistanceFadeCurve;
use super::debug_lines::{DebugLineSink, DEBUG_EDGE_COLOR};
use super::extrude::{self, ExtrudedQuad, FadeParams, ScaleMode, QUAD_INDICES};
use super::math::LocalFrame;
use super::mesh::MeshBuffers;
use super::sections::{MaterialId, MeshSink, SectionLayout, SectionUpdate, FILL_SECTION, GLOW_SECTION};
use super::{GlowError, Result};

// ============================================================================
// VIEWER SOURCE
// ============================================================================

/// Where the viewer is this frame, in world space. `None` skips the update.
pub trait ViewerSource {
    fn viewer_location(&self) -> Option<Vec3>;
}

impl ViewerSource for Vec3 {
    fn viewer_location(&self) -> Option<Vec3> {
        Some(*self)
    }
}

impl ViewerSource for Option<Vec3> {
    fn viewer_location(&self) -> Option<Vec3> {
        *self
    }
}

// ============================================================================
// SETTINGS
// ============================================================================

/// Tunables for a glowing quad. Changing these takes effect on the next `update`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlowSettings {
    pub glow_color: LinearColor,
    pub fill_color: LinearColor,
    /// Width of the glow, in local units unless `scale_mode` is `World`.
    pub glow_size: f32,
    pub scale_mode: ScaleMode,
    /// One-sided (false) or two-sided (true) quad.
    pub show_bottom: bool,
    /// Glow fades from 1 to 0 as the cosine of the view angle goes from `y` to `x`.
    pub angle_fade_range: Vec2,
    pub draw_debug_edges: bool,
}

impl Default for GlowSettings {
    fn default() -> Self {
        Self {
            glow_color: LinearColor::CYAN,
            fill_color: LinearColor::WHITE,
            glow_size: 30.0,
            scale_mode: ScaleMode::Local,
            show_bottom: false,
            angle_fade_range: Vec2::new(0.001, 0.1),
            draw_debug_edges: false,
        }
    }
}

pub const DEFAULT_QUAD_SIZE: Vec2 = Vec2::new(100.0, 100.0);

// ============================================================================
// GLOW QUAD
// ============================================================================

pub struct GlowQuad {
    pub settings: GlowSettings,
    /// Placement of the quad in the world.
    pub frame: LocalFrame,
    /// Scales the glow width by viewer distance. `None` keeps full width.
    pub distance_fade: Option<Box<dyn DistanceFadeCurve>>,

    quad_size: Vec2,
    quad_points: [Vec3; 4],
    glow_material: Option<MaterialId>,
    quad_material: Option<MaterialId>,
    layout: SectionLayout,

    // Refresh buffers: fixed size, rewritten every update.
    extruded: ExtrudedQuad,
    /// World-space viewer of the last successful update, reused by rebuild().
    last_viewer: Option<Vec3>,
    quad_colors: [LinearColor; 4],
    quad_uvs: [Vec2; 4],
}

impl GlowQuad {
    /// A 100x100 quad drawn with one material for both glow and fill.
    pub fn new(material: Option<MaterialId>) -> Self {
        let mut quad = Self {
            settings: GlowSettings::default(),
            frame: LocalFrame::IDENTITY,
            distance_fade: None,
            quad_size: DEFAULT_QUAD_SIZE,
            quad_points: [Vec3::ZERO; 4],
            glow_material: material,
            quad_material: material,
            layout: SectionLayout::Empty,
            extruded: ExtrudedQuad::default(),
            last_viewer: None,
            quad_colors: [LinearColor::TRANSPARENT; 4],
            quad_uvs: extrude::QUAD_UVS,
        };
        quad.update_quad_points();
        quad
    }

    pub fn with_settings(mut self, settings: GlowSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn quad_points(&self) -> &[Vec3; 4] { &self.quad_points }
    pub fn quad_size(&self) -> Vec2 { self.quad_size }
    pub fn layout(&self) -> SectionLayout { self.layout }
    pub fn materials(&self) -> (Option<MaterialId>, Option<MaterialId>) { (self.glow_material, self.quad_material) }
    /// Result of the last successful `update`, re-derived by `rebuild`.
    pub fn extruded(&self) -> &ExtrudedQuad { &self.extruded }

    /// Resize the quad, centered on the local origin in the XY plane.
    /// A non-positive component leaves the current points as they are.
    pub fn set_quad_size(&mut self, size: Vec2, sink: &mut dyn MeshSink) {
        self.quad_size = size;
        self.rebuild(sink);
    }

    /// Replace the corners. Anything but exactly 4 points is a caller bug:
    /// it is logged, reported, and leaves the quad unchanged.
    pub fn set_quad_points(&mut self, points: &[Vec3], sink: &mut dyn MeshSink) -> Result<()> {
        let Ok(points) = <[Vec3; 4]>::try_from(points) else {
            error!("set_quad_points expects 4 points, got {}", points.len());
            return Err(GlowError::QuadPointCount { count: points.len() });
        };
        self.quad_points = points;
        // Zero size so rebuild() does not regenerate the corners.
        self.quad_size = Vec2::ZERO;
        self.rebuild(sink);
        Ok(())
    }

    /// Swap materials. Identical materials are a no-op; anything else rebuilds,
    /// since it may change how many sections there are.
    pub fn set_materials(&mut self, glow: Option<MaterialId>, quad: Option<MaterialId>, sink: &mut dyn MeshSink) {
        if glow == self.glow_material && quad == self.quad_material {
            return;
        }
        self.glow_material = glow;
        self.quad_material = quad;
        self.rebuild(sink);
    }

    /// Recreate every section from scratch.
    pub fn rebuild(&mut self, sink: &mut dyn MeshSink) {
        self.update_quad_points();
        self.layout = SectionLayout::resolve(self.glow_material, self.quad_material);
        // Keep the last view-dependent state; flaps stay collapsed until a viewer is known.
        match self.last_viewer {
            Some(viewer) => self.extrude_for(viewer),
            None => self.extruded = ExtrudedQuad::collapsed(&self.quad_points, self.settings.fill_color),
        }
        self.quad_colors = [self.extruded.colors[0]; 4];
        self.quad_uvs = self.extruded.quad_uvs();

        sink.clear_all_sections();

        if let (true, Some(material)) = (self.layout.has_glow(), self.glow_material) {
            let merged = self.layout == SectionLayout::Merged;
            let mesh = MeshBuffers {
                positions: self.extruded.vertices.to_vec(),
                indices: extrude::glow_indices(merged),
                colors: self.extruded.colors.to_vec(),
                ..MeshBuffers::default()
            };
            sink.create_section(GLOW_SECTION, &mesh, material);
        }

        if let (true, Some(material)) = (self.layout.has_separate_fill(), self.quad_material) {
            let mesh = MeshBuffers {
                positions: self.extruded.corners().to_vec(),
                indices: QUAD_INDICES.to_vec(),
                colors: self.quad_colors.to_vec(),
                uv0: self.quad_uvs.to_vec(),
                ..MeshBuffers::default()
            };
            sink.create_section(FILL_SECTION, &mesh, material);
        }

        if self.layout.is_empty() {
            warn!("glow quad rebuilt without any material; nothing will be drawn");
        }
        debug!("glow quad rebuilt: layout {:?}, points {:?}", self.layout, self.quad_points);
    }

    /// Re-extrude for the current viewer and refresh the sections in place.
    ///
    /// Returns false (and leaves every buffer untouched) when the viewer is
    /// unavailable or there is nothing to draw.
    pub fn update(&mut self, viewer: &dyn ViewerSource, sink: &mut dyn MeshSink, debug_lines: &mut dyn DebugLineSink) -> bool {
        let Some(viewer_world) = viewer.viewer_location() else {
            return false;
        };
        if self.layout.is_empty() {
            return false;
        }
        self.extrude_for(viewer_world);
        self.last_viewer = Some(viewer_world);

        if self.layout.has_glow() {
            sink.update_section(GLOW_SECTION, SectionUpdate {
                positions: &self.extruded.vertices,
                colors: &self.extruded.colors,
                uv0: None,
            });
        }

        if self.layout.has_separate_fill() {
            self.quad_colors = [self.extruded.colors[0]; 4];
            self.quad_uvs = self.extruded.quad_uvs();
            sink.update_section(FILL_SECTION, SectionUpdate {
                positions: self.extruded.corners(),
                colors: &self.quad_colors,
                uv0: Some(&self.quad_uvs),
            });
        }

        if self.settings.draw_debug_edges {
            for (from, to) in extrude::debug_edges(&self.extruded, &self.frame) {
                debug_lines.line(from, to, DEBUG_EDGE_COLOR);
            }
        }
        true
    }

    fn extrude_for(&mut self, viewer_world: Vec3) {
        let viewer_local = self.frame.inverse_transform_point(viewer_world);
        let params = FadeParams {
            glow_color: self.settings.glow_color,
            fill_color: self.settings.fill_color,
            glow_size: self.settings.glow_size,
            angle_fade_range: self.settings.angle_fade_range,
            show_bottom: self.settings.show_bottom,
            scale_mode: self.settings.scale_mode,
            distance_fade: self.distance_fade.as_deref(),
        };
        extrude::extrude_quad_into(&self.quad_points, viewer_local, &self.frame, &params, &mut self.extruded);
    }

    fn update_quad_points(&mut self) {
        let size = self.quad_size;
        if size.x > 0.0 && size.y > 0.0 {
            let h = size / 2.0;
            self.quad_points = [
                Vec3::new(-h.x, -h.y, 0.0),
                Vec3::new(h.x, -h.y, 0.0),
                Vec3::new(h.x, h.y, 0.0),
                Vec3::new(-h.x, h.y, 0.0),
            ];
        }
    }
}
