use crate::foundation::geometry::{IntRect, IntSize};
use crate::foundation::transform::Transform3d;
use crate::render_pass::RenderPassId;

/// Separable blend modes applied when a quad is composited into its target.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Porter-Duff source-over.
    #[default]
    Normal,
    /// Multiply.
    Multiply,
    /// Screen.
    Screen,
    /// Overlay.
    Overlay,
    /// Darken.
    Darken,
    /// Lighten.
    Lighten,
    /// Color dodge.
    ColorDodge,
    /// Color burn.
    ColorBurn,
    /// Soft light.
    SoftLight,
    /// Hard light.
    HardLight,
    /// Difference.
    Difference,
    /// Exclusion.
    Exclusion,
}

/// Index of a [`SharedQuadState`] inside the pass that owns it.
///
/// Only passes mint these; quads carry them as non-owning back-references.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SharedStateId {
    pub(crate) pass: RenderPassId,
    pub(crate) index: u32,
}

impl SharedStateId {
    /// Owning pass.
    pub fn pass(self) -> RenderPassId {
        self.pass
    }

    /// Position in the owning pass's shared-state list.
    pub fn index(self) -> usize {
        self.index as usize
    }
}

/// Transform, opacity and clip state shared by a run of quads from one layer.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SharedQuadState {
    id: SharedStateId,
    /// Maps layer content space into the target space of the owning pass.
    #[serde(default)]
    pub content_to_target_transform: Transform3d,
    /// Size of the layer's content space; quads touching these bounds are exterior edges.
    #[serde(default)]
    pub content_bounds: IntSize,
    /// Part of the layer content that is visible in the target.
    #[serde(default)]
    pub visible_content_rect: IntRect,
    /// Clip in target space.
    #[serde(default)]
    pub clip_rect: Option<IntRect>,
    /// Opacity in `[0, 1]`.
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    /// How quads are blended into the target.
    #[serde(default)]
    pub blend_mode: BlendMode,
    /// 3D sorting context; 0 means none.
    #[serde(default)]
    pub sorting_context_id: i32,
}

fn default_opacity() -> f32 {
    1.0
}

impl SharedQuadState {
    pub(crate) fn new(id: SharedStateId) -> Self {
        Self {
            id,
            content_to_target_transform: Transform3d::IDENTITY,
            content_bounds: IntSize::default(),
            visible_content_rect: IntRect::default(),
            clip_rect: None,
            opacity: 1.0,
            blend_mode: BlendMode::Normal,
            sorting_context_id: 0,
        }
    }

    /// Handle that quads use to reference this state.
    pub fn id(&self) -> SharedStateId {
        self.id
    }

    pub(crate) fn rebind(&mut self, id: SharedStateId) {
        self.id = id;
    }

    /// Overwrite every field except the identity.
    #[allow(clippy::too_many_arguments)]
    pub fn set_all(
        &mut self,
        content_to_target_transform: Transform3d,
        content_bounds: IntSize,
        visible_content_rect: IntRect,
        clip_rect: Option<IntRect>,
        opacity: f32,
        blend_mode: BlendMode,
        sorting_context_id: i32,
    ) {
        self.content_to_target_transform = content_to_target_transform;
        self.content_bounds = content_bounds;
        self.visible_content_rect = visible_content_rect;
        self.clip_rect = clip_rect;
        self.opacity = opacity;
        self.blend_mode = blend_mode;
        self.sorting_context_id = sorting_context_id;
    }

    /// Copy every field except the identity from `other`.
    pub fn copy_from(&mut self, other: &SharedQuadState) {
        let id = self.id;
        *self = other.clone();
        self.id = id;
    }

    /// Opacity clamped to `[0, 1]`; NaN is treated as fully transparent.
    pub fn effective_opacity(&self) -> f32 {
        if self.opacity.is_nan() {
            return 0.0;
        }
        self.opacity.clamp(0.0, 1.0)
    }
}
