// VIEW: Rendering and graphics
pub mod render;
pub mod gpu_init;

pub use render::Renderer;
pub use gpu_init::GpuContext;

use crate::model::{Camera, SceneGraph};

/// What the frame loop and viewport manager need from a renderer.
pub trait SceneRenderer {
    type Error: std::error::Error;

    /// Draws `scene` through `camera` to the drawable surface.
    fn render(&mut self, scene: &SceneGraph, camera: &Camera) -> Result<(), Self::Error>;

    /// Resizes the output surface. `width`/`height` are logical pixels; the
    /// backing surface is `round(size * pixel_ratio)`.
    fn set_size(&mut self, width: u32, height: u32, pixel_ratio: f32);
}
