//! Shared state for one running scene.
//!
//! Everything the frame loop and the event handlers touch lives in a single
//! [`SceneContext`]. Hosts keep it behind one `Rc<RefCell<_>>` (browser) or
//! own it directly (native); both deliver events and ticks on the same
//! thread, so handlers never interleave with a tick.

use glam::{Quat, Vec3};

use crate::config::SceneConfig;
use crate::controller::camera_controller::OrbitControls;
use crate::controller::frame_loop::FrameLoop;
use crate::controller::input::{InputController, InputEvent};
use crate::controller::physics::{BodyDesc, PhysicsStepper, PhysicsWorld};
use crate::controller::viewport::{ResizeOutcome, ViewportManager};
use crate::error::StartupError;
use crate::model::{
    AmbientLight, Camera, DirectionalLight, Geometry, Lights, Material, Node, ObjectRegistry,
    SceneGraph, Transform, ViewportState,
};
use crate::view::SceneRenderer;

pub struct SceneContext {
    pub config: SceneConfig,
    pub physics: PhysicsStepper,
    pub registry: ObjectRegistry,
    pub scene: SceneGraph,
    pub camera: Camera,
    pub orbit: OrbitControls,
    pub viewport: ViewportState,
    pub input: InputController,
    pub frame_loop: FrameLoop,
}

impl SceneContext {
    /// Builds the scene in a fixed order: physics world, dynamic objects
    /// (mesh + body pairs), static scenery, then camera and viewport.
    pub fn new(config: SceneConfig) -> Result<Self, StartupError> {
        config.validate()?;

        let mut world = PhysicsWorld::new(
            Vec3::from_array(config.physics.gravity),
            config.physics.contact,
        );
        let mut scene = SceneGraph::new();
        let mut registry = ObjectRegistry::new();

        for sphere in &config.spheres.0 {
            let position = Vec3::from_array(sphere.position);
            let body = world.add_body(&BodyDesc::sphere(sphere.radius, sphere.mass, position));
            let [r, g, b] = sphere.color;
            let visual = scene.add(
                Node::new(
                    Geometry::sphere(sphere.radius),
                    Material::Standard {
                        color: [r, g, b, 1.0],
                        metalness: sphere.metalness,
                        roughness: sphere.roughness,
                    },
                )
                .with_transform(Transform::from_translation(position)),
            );
            // Spheres with mass 0 never move, so they stay out of the sync path.
            // Validation keeps the controlled tag off them.
            if world.is_dynamic(body) {
                let id = registry.add_dynamic_object(visual, body);
                if sphere.controlled {
                    registry.set_controlled(id);
                }
            }
        }

        world.add_body(&BodyDesc::ground_plane());
        let [r, g, b] = config.floor.color;
        scene.add(
            Node::new(
                Geometry::Plane { width: config.floor.size[0], depth: config.floor.size[1] },
                Material::Basic { color: [r, g, b, 1.0] },
            )
            .with_transform(Transform {
                rotation: Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2),
                ..Transform::default()
            }),
        );
        if config.axes.enabled {
            scene.add(Node::new(
                Geometry::Axes { size: config.axes.size },
                Material::Basic { color: [1.0; 4] },
            ));
        }
        let lights = &config.lights;
        scene.lights = Lights {
            ambient: AmbientLight { color: lights.ambient_color, intensity: lights.ambient_intensity },
            directional: DirectionalLight {
                color: lights.directional_color,
                intensity: lights.directional_intensity,
                position: Vec3::from_array(lights.directional_position),
            },
        };

        let viewport = ViewportState::new(
            config.viewport.width,
            config.viewport.height,
            config.viewport.pixel_ratio_cap,
        );
        let camera = Camera::from_config(&config.camera, viewport.width, viewport.height);

        tracing::info!(
            dynamic = registry.len(),
            bodies = world.body_count(),
            nodes = scene.len(),
            "scene built"
        );

        Ok(Self {
            physics: PhysicsStepper::new(world),
            registry,
            scene,
            camera,
            orbit: OrbitControls::from_config(&config.orbit),
            viewport,
            input: InputController::from_config(&config.input),
            frame_loop: FrameLoop::new(),
            config,
        })
    }

    /// Sizes a freshly created renderer to the current viewport.
    pub fn attach_renderer<R: SceneRenderer>(
        &mut self,
        renderer: &mut R,
        width: u32,
        height: u32,
        device_pixel_ratio: f32,
    ) {
        if width > 0 && height > 0 {
            self.viewport.width = width;
            self.viewport.height = height;
        }
        ViewportManager::force(&mut self.viewport, &mut self.camera, renderer, device_pixel_ratio);
    }

    pub fn on_resize<R: SceneRenderer>(
        &mut self,
        renderer: &mut R,
        width: u32,
        height: u32,
        device_pixel_ratio: f32,
    ) -> ResizeOutcome {
        ViewportManager::resize(
            &mut self.viewport,
            &mut self.camera,
            renderer,
            width,
            height,
            device_pixel_ratio,
        )
    }

    /// Routes a host event to the input controller or the orbit controls.
    pub fn on_input(&mut self, event: &InputEvent) -> bool {
        let world = self.physics.world_mut();
        match event {
            InputEvent::KeyDown(code) => self.input.key_down(code, &self.registry, world),
            InputEvent::KeyUp(code) => self.input.key_up(code, &self.registry, world),
            _ => self.orbit.handle_event(event),
        }
    }
}
