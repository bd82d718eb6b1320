use crate::context::SceneContext;
use crate::controller::sync;
use crate::view::SceneRenderer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// No tick has run yet.
    Idle,
    /// Ticking once per display refresh until the host goes away.
    Running,
}

/// Timing state of the per-frame loop.
#[derive(Debug)]
pub struct FrameLoop {
    state: LoopState,
    last_elapsed: f64,
    frame_count: u64,
}

/// What one tick did, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub frame: u64,
    pub delta: f64,
    pub substeps: u32,
    pub synced: usize,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self { state: LoopState::Idle, last_elapsed: 0.0, frame_count: 0 }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn last_elapsed(&self) -> f64 {
        self.last_elapsed
    }

    /// Records a new clock reading and returns the time since the previous
    /// one. A non-finite reading yields a zero delta and is not stored.
    pub fn begin_tick(&mut self, elapsed: f64) -> f64 {
        self.state = LoopState::Running;
        self.frame_count += 1;
        if !elapsed.is_finite() {
            return 0.0;
        }
        let delta = elapsed - self.last_elapsed;
        self.last_elapsed = elapsed;
        delta
    }
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneContext {
    /// Runs one frame: clock, orbit controls, physics, sync, render.
    ///
    /// Sync always follows the physics advance and precedes the render call
    /// of the same tick. Scheduling the next tick is the host's job.
    pub fn tick<R: SceneRenderer>(
        &mut self,
        elapsed_seconds: f64,
        renderer: &mut R,
    ) -> Result<TickReport, R::Error> {
        let delta = self.frame_loop.begin_tick(elapsed_seconds);

        self.orbit.update(&mut self.camera);

        let physics = &self.config.physics;
        let substeps = self.physics.step(physics.fixed_interval, delta, physics.max_substeps);

        let synced = sync::sync(&self.registry, self.physics.world(), &mut self.scene);

        renderer.render(&self.scene, &self.camera)?;

        let report = TickReport { frame: self.frame_loop.frame_count(), delta, substeps, synced };
        tracing::trace!(?report, "tick");
        Ok(report)
    }
}
