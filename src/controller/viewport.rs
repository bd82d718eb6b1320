use crate::model::{Camera, ViewportState};
use crate::view::SceneRenderer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeOutcome {
    /// Camera and renderer were updated.
    Applied,
    /// Same size and pixel ratio as before; nothing touched.
    Unchanged,
    /// Zero-sized surface, e.g. a minimized window.
    Ignored,
}

/// Keeps camera aspect and renderer size in step with the drawable surface.
/// Runs synchronously on the resize event so the next frame is never
/// stretched.
pub struct ViewportManager;

impl ViewportManager {
    pub fn resize<R: SceneRenderer>(
        viewport: &mut ViewportState,
        camera: &mut Camera,
        renderer: &mut R,
        width: u32,
        height: u32,
        device_pixel_ratio: f32,
    ) -> ResizeOutcome {
        if width == 0 || height == 0 {
            tracing::debug!(width, height, "ignoring zero-sized resize");
            return ResizeOutcome::Ignored;
        }
        let pixel_ratio = viewport.effective_pixel_ratio(device_pixel_ratio);
        if viewport.width == width && viewport.height == height && viewport.pixel_ratio == pixel_ratio {
            return ResizeOutcome::Unchanged;
        }
        Self::apply(viewport, camera, renderer, width, height, pixel_ratio);
        ResizeOutcome::Applied
    }

    /// Pushes the viewport to camera and renderer regardless of the previous
    /// state. Used once at startup.
    pub fn force<R: SceneRenderer>(
        viewport: &mut ViewportState,
        camera: &mut Camera,
        renderer: &mut R,
        device_pixel_ratio: f32,
    ) {
        let (width, height) = (viewport.width.max(1), viewport.height.max(1));
        let pixel_ratio = viewport.effective_pixel_ratio(device_pixel_ratio);
        Self::apply(viewport, camera, renderer, width, height, pixel_ratio);
    }

    fn apply<R: SceneRenderer>(
        viewport: &mut ViewportState,
        camera: &mut Camera,
        renderer: &mut R,
        width: u32,
        height: u32,
        pixel_ratio: f32,
    ) {
        viewport.width = width;
        viewport.height = height;
        viewport.pixel_ratio = pixel_ratio;

        camera.set_aspect(width, height);
        camera.update_projection();
        renderer.set_size(width, height, pixel_ratio);
        tracing::info!(width, height, pixel_ratio, "viewport resized");
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::SceneGraph;

    /// Renderer double recording every call in order.
    #[derive(Default)]
    pub(crate) struct RecordingRenderer {
        pub calls: Vec<RendererCall>,
        pub size: Option<(u32, u32, f32)>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum RendererCall {
        SetSize(u32, u32, f32),
        Render { aspect: f32, node_count: usize },
    }

    impl SceneRenderer for RecordingRenderer {
        type Error = std::io::Error;

        fn render(&mut self, scene: &SceneGraph, camera: &Camera) -> Result<(), Self::Error> {
            self.calls.push(RendererCall::Render { aspect: camera.aspect, node_count: scene.len() });
            Ok(())
        }

        fn set_size(&mut self, width: u32, height: u32, pixel_ratio: f32) {
            self.size = Some((width, height, pixel_ratio));
            self.calls.push(RendererCall::SetSize(width, height, pixel_ratio));
        }
    }

    #[test]
    fn test_resize_updates_camera_and_renderer() {
        let mut viewport = ViewportState::new(1280, 720, 2.0);
        let mut camera = Camera::new(1280, 720);
        let mut renderer = RecordingRenderer::default();

        let outcome = ViewportManager::resize(&mut viewport, &mut camera, &mut renderer, 800, 600, 1.0);
        assert_eq!(outcome, ResizeOutcome::Applied);
        assert_eq!(camera.aspect, 800.0 / 600.0);
        assert_eq!(renderer.size, Some((800, 600, 1.0)));
        assert_eq!(viewport.drawable_size(), (800, 600));
    }

    #[test]
    fn test_resize_is_idempotent() {
        let mut viewport = ViewportState::new(1280, 720, 2.0);
        let mut camera = Camera::new(1280, 720);
        let mut renderer = RecordingRenderer::default();

        ViewportManager::resize(&mut viewport, &mut camera, &mut renderer, 1024, 768, 3.0);
        let aspect = camera.aspect;
        let projection = camera.projection();
        let size = renderer.size;

        let outcome = ViewportManager::resize(&mut viewport, &mut camera, &mut renderer, 1024, 768, 3.0);
        assert_eq!(outcome, ResizeOutcome::Unchanged);
        assert_eq!(camera.aspect, aspect);
        assert_eq!(camera.projection(), projection);
        assert_eq!(renderer.size, size);
        assert_eq!(renderer.calls.len(), 1);
    }

    #[test]
    fn test_zero_size_is_ignored() {
        let mut viewport = ViewportState::new(800, 600, 2.0);
        let mut camera = Camera::new(800, 600);
        let mut renderer = RecordingRenderer::default();

        for (w, h) in [(0, 600), (800, 0), (0, 0)] {
            let outcome = ViewportManager::resize(&mut viewport, &mut camera, &mut renderer, w, h, 1.0);
            assert_eq!(outcome, ResizeOutcome::Ignored);
        }
        assert!(renderer.calls.is_empty());
        assert_eq!(camera.aspect, 800.0 / 600.0);
        assert!(camera.aspect.is_finite());
    }

    #[test]
    fn test_pixel_ratio_change_alone_reapplies() {
        let mut viewport = ViewportState::new(800, 600, 2.0);
        let mut camera = Camera::new(800, 600);
        let mut renderer = RecordingRenderer::default();
        ViewportManager::force(&mut viewport, &mut camera, &mut renderer, 1.0);

        let outcome = ViewportManager::resize(&mut viewport, &mut camera, &mut renderer, 800, 600, 2.0);
        assert_eq!(outcome, ResizeOutcome::Applied);
        assert_eq!(renderer.size, Some((800, 600, 2.0)));
        assert_eq!(viewport.drawable_size(), (1600, 1200));
    }
}
