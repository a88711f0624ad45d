use crate::foundation::core::Rgba8;
use crate::render::surface_pool::SurfacePoolOpts;

/// Knobs of the software renderer and its output device.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    /// Clear color for passes without a transparent background.
    pub clear_rgba: Rgba8,
    /// Redraw only the root damage rect, keeping the rest of the previous frame.
    pub partial_swap: bool,
    /// Allow anti-aliased edges on quads with all-exterior edges.
    pub allow_antialiasing: bool,
    /// Color painted for unsupported materials. `None` picks magenta in debug builds and
    /// white otherwise.
    pub sentinel_rgba: Option<Rgba8>,
    /// Software frames that may be in flight before an ack is required.
    pub max_frames_pending: usize,
    /// Scratch surface recycling.
    pub pool: SurfacePoolOpts,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            clear_rgba: Rgba8::BLACK,
            partial_swap: false,
            allow_antialiasing: true,
            sentinel_rgba: None,
            max_frames_pending: 2,
            pool: SurfacePoolOpts::default(),
        }
    }
}

impl RendererSettings {
    /// Apply `TESSERA_PARTIAL_SWAP`, `TESSERA_MAX_FRAMES_PENDING` and
    /// `TESSERA_SURFACE_POOL_BYTES` when set and parseable.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = var("TESSERA_PARTIAL_SWAP").and_then(|v| parse_flag(&v)) {
            self.partial_swap = v;
        }
        if let Some(n) = var("TESSERA_MAX_FRAMES_PENDING")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|&n| n > 0)
        {
            self.max_frames_pending = n;
        }
        if let Some(n) = var("TESSERA_SURFACE_POOL_BYTES").and_then(|v| v.trim().parse::<usize>().ok())
        {
            self.pool.max_pool_bytes = n;
        }
        self
    }

    /// Sentinel color for the current build.
    pub fn sentinel_color(&self) -> Rgba8 {
        self.sentinel_rgba.unwrap_or(if cfg!(debug_assertions) {
            Rgba8::MAGENTA
        } else {
            Rgba8::WHITE
        })
    }
}

fn parse_flag(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/settings.rs"]
mod tests;
