use glam::{Quat, Vec3};
use rapier3d::na::{Isometry3, Quaternion, Translation3, Unit, UnitQuaternion, Vector3};
use rapier3d::prelude::*;

use crate::config::ContactConfig;

/// Opaque reference to a rigid body in a [`PhysicsWorld`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(RigidBodyHandle);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BodyShape {
    Sphere { radius: f32 },
    /// Infinite plane through the body origin with local +Y as its normal.
    Plane,
}

/// Everything needed to create a body. `mass == 0` makes it static.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDesc {
    pub shape: BodyShape,
    pub mass: f32,
    pub position: Vec3,
    pub orientation: Quat,
    /// Overrides the world's default contact material.
    pub material: Option<ContactConfig>,
}

impl BodyDesc {
    pub fn sphere(radius: f32, mass: f32, position: Vec3) -> Self {
        Self {
            shape: BodyShape::Sphere { radius },
            mass,
            position,
            orientation: Quat::IDENTITY,
            material: None,
        }
    }

    pub fn ground_plane() -> Self {
        Self {
            shape: BodyShape::Plane,
            mass: 0.0,
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            material: None,
        }
    }
}

/// Rigid-body world backed by rapier.
///
/// Forces assigned through [`PhysicsWorld::set_force`] stay on the body
/// across steps until overwritten. Contacts are predicted ahead of the
/// step so a ball falling a sizeable part of its radius per step is caught
/// at the surface instead of inside it.
pub struct PhysicsWorld {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    default_material: ContactConfig,
}

/// Contact prediction distance, relative to the world's length unit.
const PREDICTION_DISTANCE: Real = 0.2;

impl PhysicsWorld {
    pub fn new(gravity: Vec3, default_material: ContactConfig) -> Self {
        Self {
            gravity: to_na(gravity),
            integration_parameters: IntegrationParameters {
                normalized_prediction_distance: PREDICTION_DISTANCE,
                ..IntegrationParameters::default()
            },
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            default_material,
        }
    }

    pub fn gravity(&self) -> Vec3 {
        from_na(&self.gravity)
    }

    pub fn default_material(&self) -> ContactConfig {
        self.default_material
    }

    pub fn add_body(&mut self, desc: &BodyDesc) -> BodyHandle {
        let pose = Isometry3::from_parts(
            Translation3::new(desc.position.x, desc.position.y, desc.position.z),
            to_na_rotation(desc.orientation),
        );
        let body = if desc.mass > 0.0 {
            RigidBodyBuilder::dynamic().position(pose).build()
        } else {
            RigidBodyBuilder::fixed().position(pose).build()
        };
        let handle = self.bodies.insert(body);

        let material = desc.material.unwrap_or(self.default_material);
        let builder = match desc.shape {
            BodyShape::Sphere { radius } => ColliderBuilder::ball(radius),
            BodyShape::Plane => ColliderBuilder::halfspace(Unit::new_normalize(Vector3::y())),
        };
        let mut builder = builder
            .friction(material.friction)
            .restitution(material.restitution);
        if desc.mass > 0.0 {
            builder = builder.mass(desc.mass);
        }
        self.colliders
            .insert_with_parent(builder.build(), handle, &mut self.bodies);

        BodyHandle(handle)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_dynamic(&self, handle: BodyHandle) -> bool {
        self.bodies.get(handle.0).map(|b| b.is_dynamic()).unwrap_or(false)
    }

    pub fn position(&self, handle: BodyHandle) -> Option<Vec3> {
        self.bodies.get(handle.0).map(|b| from_na(b.translation()))
    }

    pub fn orientation(&self, handle: BodyHandle) -> Option<Quat> {
        self.bodies.get(handle.0).map(|b| from_na_rotation(b.rotation()))
    }

    pub fn linear_velocity(&self, handle: BodyHandle) -> Option<Vec3> {
        self.bodies.get(handle.0).map(|b| from_na(b.linvel()))
    }

    /// Force currently assigned to the body (zero if never set).
    pub fn force(&self, handle: BodyHandle) -> Option<Vec3> {
        self.bodies.get(handle.0).map(|b| from_na(&b.user_force()))
    }

    /// Replaces the body's persistent force. Returns false for unknown or
    /// static bodies.
    pub fn set_force(&mut self, handle: BodyHandle, force: Vec3) -> bool {
        let Some(body) = self.bodies.get_mut(handle.0) else {
            return false;
        };
        if !body.is_dynamic() {
            return false;
        }
        body.reset_forces(true);
        body.add_force(to_na(force), true);
        true
    }

    /// Advances the simulation by exactly `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );
    }
}

/// Fixed-interval stepping on top of a [`PhysicsWorld`].
///
/// Wall-clock deltas are accumulated; each call takes as many fixed
/// sub-steps as fit, up to a cap. Time that does not fit under the cap is
/// dropped rather than carried, so a long stall cannot snowball.
pub struct PhysicsStepper {
    world: PhysicsWorld,
    accumulator: f64,
    total_substeps: u64,
}

impl PhysicsStepper {
    pub fn new(world: PhysicsWorld) -> Self {
        Self { world, accumulator: 0.0, total_substeps: 0 }
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.world
    }

    pub fn total_substeps(&self) -> u64 {
        self.total_substeps
    }

    /// Returns the number of fixed sub-steps taken by this call.
    pub fn step(&mut self, fixed_interval: f32, delta_seconds: f64, max_substeps: u32) -> u32 {
        let fixed = fixed_interval as f64;
        if !delta_seconds.is_finite() || delta_seconds <= 0.0 {
            return 0;
        }
        if !fixed.is_finite() || fixed <= 0.0 || max_substeps == 0 {
            return 0;
        }

        self.accumulator += delta_seconds;
        let mut substeps = 0;
        while self.accumulator >= fixed && substeps < max_substeps {
            self.world.advance(fixed_interval);
            self.accumulator -= fixed;
            substeps += 1;
        }
        if self.accumulator >= fixed {
            tracing::debug!(
                backlog = self.accumulator,
                max_substeps,
                "physics fell behind, dropping backlog"
            );
        }
        self.accumulator %= fixed;
        self.total_substeps += substeps as u64;
        substeps
    }
}

fn to_na(v: Vec3) -> Vector<Real> {
    Vector3::new(v.x, v.y, v.z)
}

fn from_na(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

fn to_na_rotation(q: Quat) -> UnitQuaternion<Real> {
    UnitQuaternion::from_quaternion(Quaternion::new(q.w, q.x, q.y, q.z))
}

fn from_na_rotation(q: &UnitQuaternion<Real>) -> Quat {
    let c = q.coords;
    Quat::from_xyzw(c.x, c.y, c.z, c.w)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stock_world() -> (PhysicsStepper, Vec<BodyHandle>) {
        let mut world = PhysicsWorld::new(Vec3::new(0.0, -9.82, 0.0), ContactConfig::default());
        let a = world.add_body(&BodyDesc::sphere(0.5, 1.0, Vec3::new(1.0, 2.0, 0.0)));
        let b = world.add_body(&BodyDesc::sphere(0.5, 1.0, Vec3::new(-1.0, 2.0, 0.0)));
        world.add_body(&BodyDesc::ground_plane());
        (PhysicsStepper::new(world), vec![a, b])
    }

    fn poses(stepper: &PhysicsStepper, handles: &[BodyHandle]) -> Vec<(Vec3, Quat)> {
        handles
            .iter()
            .map(|h| {
                let w = stepper.world();
                (w.position(*h).unwrap(), w.orientation(*h).unwrap())
            })
            .collect()
    }

    #[test]
    fn test_non_positive_delta_is_noop() {
        let (mut stepper, handles) = stock_world();
        let before = poses(&stepper, &handles);
        for delta in [0.0, -0.016, -1.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert_eq!(stepper.step(1.0 / 60.0, delta, 3), 0);
        }
        assert_eq!(poses(&stepper, &handles), before);
        assert_eq!(stepper.total_substeps(), 0);
    }

    #[test]
    fn test_substeps_never_exceed_cap() {
        let (mut stepper, _) = stock_world();
        let deltas = [0.5, 0.001, 0.016, 0.033, 2.0, 0.017, 0.1, 0.0, 0.05];
        let mut calls = 0u64;
        for delta in deltas {
            let taken = stepper.step(1.0 / 60.0, delta, 3);
            assert!(taken <= 3);
            calls += 1;
        }
        assert!(stepper.total_substeps() <= calls * 3);
    }

    #[test]
    fn test_long_stall_drops_backlog() {
        let (mut stepper, _) = stock_world();
        assert_eq!(stepper.step(1.0 / 60.0, 10.0, 3), 3);
        // The dropped backlog is not replayed by the next short frame.
        assert!(stepper.step(1.0 / 60.0, 1.0 / 60.0, 3) <= 2);
    }

    #[test]
    fn test_small_deltas_accumulate() {
        let (mut stepper, _) = stock_world();
        let h = 1.0 / 60.0;
        let quarter = (h as f64) / 4.0;
        let mut taken = 0;
        for _ in 0..8 {
            taken += stepper.step(h, quarter, 3);
        }
        // Two whole intervals, give or take float rounding at the boundary.
        assert!((1..=2).contains(&taken));
    }

    #[test]
    fn test_spheres_fall_under_gravity() {
        let (mut stepper, handles) = stock_world();
        stepper.step(1.0 / 60.0, 0.05, 3);
        let y = stepper.world().position(handles[0]).unwrap().y;
        assert!(y < 2.0);
        let v = stepper.world().linear_velocity(handles[0]).unwrap();
        assert!(v.y < 0.0);
    }

    #[test]
    fn test_spheres_settle_on_floor() {
        let (mut stepper, handles) = stock_world();
        let h = 1.0 / 60.0;
        let mut lowest = f32::MAX;
        for _ in 0..(60 * 30) {
            stepper.step(h, h as f64, 3);
            for handle in &handles {
                lowest = lowest.min(stepper.world().position(*handle).unwrap().y);
            }
        }
        // Radius 0.5: the first bounce must not bury the ball.
        assert!(lowest > 0.45, "sphere sank into the floor: y = {lowest}");
        for handle in &handles {
            let p = stepper.world().position(*handle).unwrap();
            assert!((p.y - 0.5).abs() < 0.05, "sphere not resting on floor: y = {}", p.y);
        }
    }

    #[test]
    fn test_force_is_replaced_not_added() {
        let (mut stepper, handles) = stock_world();
        let world = stepper.world_mut();
        assert_eq!(world.force(handles[0]), Some(Vec3::ZERO));
        assert!(world.set_force(handles[0], Vec3::new(150.0, 0.0, 0.0)));
        assert!(world.set_force(handles[0], Vec3::new(150.0, 0.0, 0.0)));
        assert_eq!(world.force(handles[0]), Some(Vec3::new(150.0, 0.0, 0.0)));
        assert!(world.set_force(handles[0], Vec3::new(-150.0, 0.0, 0.0)));
        assert_eq!(world.force(handles[0]), Some(Vec3::new(-150.0, 0.0, 0.0)));
    }

    #[test]
    fn test_fast_impact_is_caught_at_surface() {
        let mut world = PhysicsWorld::new(Vec3::new(0.0, -9.82, 0.0), ContactConfig::default());
        let ball = world.add_body(&BodyDesc::sphere(0.5, 1.0, Vec3::new(0.0, 6.0, 0.0)));
        world.add_body(&BodyDesc::ground_plane());
        let mut stepper = PhysicsStepper::new(world);
        let h = 1.0 / 60.0;
        let mut lowest = f32::MAX;
        for _ in 0..120 {
            stepper.step(h, h as f64, 3);
            lowest = lowest.min(stepper.world().position(ball).unwrap().y);
        }
        assert!(lowest > 0.45, "ball penetrated to y = {lowest}");
    }

    #[test]
    fn test_force_reads_back_from_body() {
        let (mut stepper, handles) = stock_world();
        stepper.world_mut().set_force(handles[0], Vec3::new(150.0, 0.0, 0.0));
        let h = 1.0 / 60.0;
        for _ in 0..10 {
            stepper.step(h, h as f64, 3);
        }
        // Persistent across steps and held by the body itself.
        assert_eq!(stepper.world().force(handles[0]), Some(Vec3::new(150.0, 0.0, 0.0)));
        assert_eq!(stepper.world().force(handles[1]), Some(Vec3::ZERO));
    }

    #[test]
    fn test_force_moves_body_and_static_bodies_refuse_it() {
        let mut world = PhysicsWorld::new(Vec3::ZERO, ContactConfig::default());
        let ball = world.add_body(&BodyDesc::sphere(0.5, 1.0, Vec3::new(0.0, 5.0, 0.0)));
        let floor = world.add_body(&BodyDesc::ground_plane());
        assert!(!world.is_dynamic(floor));
        assert!(!world.set_force(floor, Vec3::X));

        world.set_force(ball, Vec3::new(150.0, 0.0, 0.0));
        let mut stepper = PhysicsStepper::new(world);
        stepper.step(1.0 / 60.0, 0.05, 3);
        assert!(stepper.world().position(ball).unwrap().x > 0.0);
    }

    #[test]
    fn test_orientation_round_trips() {
        let mut world = PhysicsWorld::new(Vec3::ZERO, ContactConfig::default());
        let q = Quat::from_rotation_y(0.7);
        let mut desc = BodyDesc::sphere(0.5, 1.0, Vec3::ZERO);
        desc.orientation = q;
        let h = world.add_body(&desc);
        let back = world.orientation(h).unwrap();
        assert!(back.dot(q).abs() > 0.9999);
    }
}
