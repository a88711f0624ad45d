use std::fmt;

use crate::foundation::geometry::IntRect;
use crate::resources::Bitmap;

/// Outcome delivered to a [`CopyOutputRequest`] callback.
#[derive(Debug)]
pub enum CopyOutputResult {
    /// The pass was never drawn, or the request was dropped unfulfilled.
    Empty,
    /// Premultiplied pixels of the requested area.
    Bitmap(Bitmap),
}

impl CopyOutputResult {
    /// `true` for [`CopyOutputResult::Empty`].
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Pixels, if any were produced.
    pub fn into_bitmap(self) -> Option<Bitmap> {
        match self {
            Self::Empty => None,
            Self::Bitmap(b) => Some(b),
        }
    }
}

type CopyCallback = Box<dyn FnOnce(CopyOutputResult) + Send>;

/// Asynchronous readback of a render pass's output.
///
/// The callback runs exactly once: with pixels after the pass is drawn, or with
/// [`CopyOutputResult::Empty`] when the request is dropped first.
pub struct CopyOutputRequest {
    area: Option<IntRect>,
    callback: Option<CopyCallback>,
}

impl CopyOutputRequest {
    /// Request the whole output rect of the pass.
    pub fn new(callback: impl FnOnce(CopyOutputResult) + Send + 'static) -> Self {
        Self {
            area: None,
            callback: Some(Box::new(callback)),
        }
    }

    /// Restrict the readback to `area`, in the pass's target space.
    pub fn with_area(mut self, area: IntRect) -> Self {
        self.area = Some(area);
        self
    }

    /// Requested area, if restricted.
    pub fn area(&self) -> Option<IntRect> {
        self.area
    }

    /// Deliver `result` and consume the request.
    pub fn send_result(mut self, result: CopyOutputResult) {
        if let Some(cb) = self.callback.take() {
            cb(result);
        }
    }
}

impl Drop for CopyOutputRequest {
    fn drop(&mut self) {
        if let Some(cb) = self.callback.take() {
            cb(CopyOutputResult::Empty);
        }
    }
}

impl fmt::Debug for CopyOutputRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CopyOutputRequest")
            .field("area", &self.area)
            .field("pending", &self.callback.is_some())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render_pass/copy_request.rs"]
mod tests;
