use crate::foundation::core::Rgba8;

/// One step of a render-pass post-processing chain.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterOperation {
    /// Desaturate towards luminance; `amount` in `[0, 1]`.
    Grayscale { amount: f32 },
    /// Sepia tone; `amount` in `[0, 1]`.
    Sepia { amount: f32 },
    /// Saturation multiplier; 1 is identity.
    Saturate { amount: f32 },
    /// Hue rotation in degrees.
    HueRotate { degrees: f32 },
    /// Color inversion; `amount` in `[0, 1]`.
    Invert { amount: f32 },
    /// Linear brightness multiplier; 1 is identity.
    Brightness { amount: f32 },
    /// Contrast around mid-gray; 1 is identity.
    Contrast { amount: f32 },
    /// Alpha multiplier in `[0, 1]`.
    Opacity { amount: f32 },
    /// Gaussian blur with standard deviation `sigma` in content pixels.
    Blur { sigma: f32 },
    /// Blurred, tinted and offset copy of the content's alpha painted beneath it.
    DropShadow {
        dx: i32,
        dy: i32,
        sigma: f32,
        color: Rgba8,
    },
    /// Row-major 4x5 matrix over straight-alpha RGBA in `[0, 1]`.
    ColorMatrix { matrix: [f32; 20] },
}

impl FilterOperation {
    /// `true` for filters whose output pixel depends on neighbouring input pixels.
    pub fn moves_pixels(&self) -> bool {
        matches!(self, Self::Blur { .. } | Self::DropShadow { .. })
    }
}

/// Ordered filter chain; the first operation runs first.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct FilterOperations(Vec<FilterOperation>);

impl FilterOperations {
    /// Empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an operation at the end of the chain.
    pub fn push(&mut self, op: FilterOperation) {
        self.0.push(op);
    }

    /// Operations in application order.
    pub fn iter(&self) -> std::slice::Iter<'_, FilterOperation> {
        self.0.iter()
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` when no operation is present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `true` when any operation reads neighbouring pixels.
    pub fn has_filter_that_moves_pixels(&self) -> bool {
        self.0.iter().any(FilterOperation::moves_pixels)
    }
}

impl FromIterator<FilterOperation> for FilterOperations {
    fn from_iter<T: IntoIterator<Item = FilterOperation>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
