//! Software rasterization of render pass lists.

pub(crate) mod composite;
pub(crate) mod filters;
pub(crate) mod output_device;
pub(crate) mod settings;
pub(crate) mod software;
pub(crate) mod surface_pool;

pub use settings::RendererSettings;
pub use software::{DrawStats, SoftwareRenderer};
pub use surface_pool::{SurfacePoolOpts, SurfacePoolStats};
