use crate::foundation::core::{Point, Rect, Rgba8, Vec2};
use crate::quad::filter::FilterOperations;
use crate::render_pass::RenderPassId;
use crate::resources::ResourceId;

/// Solid fill shown while real content is not rasterized yet.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CheckerboardMaterial {
    /// Fill color.
    pub color: Rgba8,
}

/// Stroked outline around the quad, used for debugging layer bounds.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DebugBorderMaterial {
    /// Stroke color.
    pub color: Rgba8,
    /// Stroke width in device pixels.
    pub width: f32,
}

/// Uniform color fill.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SolidColorMaterial {
    /// Fill color.
    pub color: Rgba8,
    /// Never anti-alias this quad, even when its edges are exterior.
    #[serde(default)]
    pub force_anti_aliasing_off: bool,
}

/// Bitmap resource stretched over the quad.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextureMaterial {
    /// Pixels to draw.
    pub resource_id: ResourceId,
    /// Normalized texture coordinate mapped to the quad's top-left corner.
    #[serde(default = "uv_origin")]
    pub uv_top_left: Point,
    /// Normalized texture coordinate mapped to the quad's bottom-right corner.
    #[serde(default = "uv_extent")]
    pub uv_bottom_right: Point,
    /// Painted beneath non-opaque bitmaps.
    #[serde(default)]
    pub background_color: Rgba8,
    /// Mirror vertically.
    #[serde(default)]
    pub flipped: bool,
}

fn uv_origin() -> Point {
    Point::ZERO
}

fn uv_extent() -> Point {
    Point::new(1.0, 1.0)
}

/// One tile of a pre-rasterized, tiled layer.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TileMaterial {
    /// Tile pixels.
    pub resource_id: ResourceId,
    /// Texel rectangle of the tile bitmap mapped onto the quad rect.
    pub tex_coord_rect: Rect,
}

/// Output of an earlier render pass in the same frame, used as a texture.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RenderPassMaterial {
    /// Producer pass.
    pub render_pass_id: RenderPassId,
    /// Optional mask whose alpha scales coverage.
    #[serde(default)]
    pub mask_resource_id: Option<ResourceId>,
    /// Normalized region of the mask mapped onto the quad rect.
    #[serde(default = "unit_rect")]
    pub mask_uv_rect: Rect,
    /// Applied to the producer output before compositing.
    #[serde(default)]
    pub filters: FilterOperations,
    /// Scale from content pixels to filter units (blur radii, shadow offsets).
    #[serde(default = "unit_scale")]
    pub filters_scale: Vec2,
}

fn unit_rect() -> Rect {
    Rect::new(0.0, 0.0, 1.0, 1.0)
}

fn unit_scale() -> Vec2 {
    Vec2::new(1.0, 1.0)
}

/// Content the software path cannot draw.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct UnsupportedMaterial {
    /// Free-form description for logs.
    #[serde(default)]
    pub reason: String,
}

/// Closed set of quad recipes.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Material {
    /// See [`CheckerboardMaterial`].
    Checkerboard(CheckerboardMaterial),
    /// See [`DebugBorderMaterial`].
    DebugBorder(DebugBorderMaterial),
    /// See [`SolidColorMaterial`].
    SolidColor(SolidColorMaterial),
    /// See [`TextureMaterial`].
    Texture(TextureMaterial),
    /// See [`TileMaterial`].
    Tile(TileMaterial),
    /// See [`RenderPassMaterial`].
    RenderPassReference(RenderPassMaterial),
    /// See [`UnsupportedMaterial`].
    Unsupported(UnsupportedMaterial),
}

/// Discriminant of [`Material`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MaterialKind {
    /// Checkerboard.
    Checkerboard,
    /// Debug border.
    DebugBorder,
    /// Solid color.
    SolidColor,
    /// Texture.
    Texture,
    /// Tile.
    Tile,
    /// Render pass reference.
    RenderPassReference,
    /// Unsupported.
    Unsupported,
}

impl MaterialKind {
    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Checkerboard => "checkerboard",
            Self::DebugBorder => "debug_border",
            Self::SolidColor => "solid_color",
            Self::Texture => "texture",
            Self::Tile => "tile",
            Self::RenderPassReference => "render_pass_reference",
            Self::Unsupported => "unsupported",
        }
    }
}

impl Material {
    /// Discriminant.
    pub fn kind(&self) -> MaterialKind {
        match self {
            Self::Checkerboard(_) => MaterialKind::Checkerboard,
            Self::DebugBorder(_) => MaterialKind::DebugBorder,
            Self::SolidColor(_) => MaterialKind::SolidColor,
            Self::Texture(_) => MaterialKind::Texture,
            Self::Tile(_) => MaterialKind::Tile,
            Self::RenderPassReference(_) => MaterialKind::RenderPassReference,
            Self::Unsupported(_) => MaterialKind::Unsupported,
        }
    }

    /// Call `f` for every table resource the material reads.
    ///
    /// A pass reference yields only its mask: pass content lives in the surface pool, not the
    /// resource table.
    pub(crate) fn visit_resources(&self, mut f: impl FnMut(ResourceId)) {
        match self {
            Self::Checkerboard(_)
            | Self::DebugBorder(_)
            | Self::SolidColor(_)
            | Self::Unsupported(_) => {}
            Self::Texture(m) => f(m.resource_id),
            Self::Tile(m) => f(m.resource_id),
            Self::RenderPassReference(m) => {
                if let Some(mask) = m.mask_resource_id {
                    f(mask);
                }
            }
        }
    }

    pub(crate) fn remap_resources(&mut self, mut f: impl FnMut(ResourceId) -> ResourceId) {
        match self {
            Self::Checkerboard(_)
            | Self::DebugBorder(_)
            | Self::SolidColor(_)
            | Self::Unsupported(_) => {}
            Self::Texture(m) => m.resource_id = f(m.resource_id),
            Self::Tile(m) => m.resource_id = f(m.resource_id),
            Self::RenderPassReference(m) => {
                if let Some(mask) = m.mask_resource_id {
                    m.mask_resource_id = Some(f(mask));
                }
            }
        }
    }

    /// Solid color material.
    pub fn solid_color(color: Rgba8) -> Self {
        Self::SolidColor(SolidColorMaterial {
            color,
            force_anti_aliasing_off: false,
        })
    }

    /// Texture material sampling the whole bitmap.
    pub fn texture(resource_id: ResourceId) -> Self {
        Self::Texture(TextureMaterial {
            resource_id,
            uv_top_left: uv_origin(),
            uv_bottom_right: uv_extent(),
            background_color: Rgba8::TRANSPARENT,
            flipped: false,
        })
    }

    /// Render pass reference without mask or filters.
    pub fn render_pass(render_pass_id: RenderPassId) -> Self {
        Self::RenderPassReference(RenderPassMaterial {
            render_pass_id,
            mask_resource_id: None,
            mask_uv_rect: unit_rect(),
            filters: FilterOperations::new(),
            filters_scale: unit_scale(),
        })
    }
}
