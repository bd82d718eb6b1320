use crate::controller::physics::PhysicsWorld;
use crate::model::registry::ObjectRegistry;
use crate::model::scene::SceneGraph;

/// Copies every registered body's pose onto its mesh.
///
/// A straight copy: no interpolation between physics steps. Returns how
/// many objects were updated; objects whose body or node has gone missing
/// are skipped.
pub fn sync(registry: &ObjectRegistry, world: &PhysicsWorld, scene: &mut SceneGraph) -> usize {
    let mut updated = 0;
    registry.for_each(|object| {
        let (Some(position), Some(orientation)) =
            (world.position(object.body), world.orientation(object.body))
        else {
            tracing::warn!(?object, "registered body missing from physics world");
            return;
        };
        if scene.set_position(object.visual, position) && scene.set_orientation(object.visual, orientation) {
            updated += 1;
        }
    });
    updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContactConfig;
    use crate::controller::physics::{BodyDesc, PhysicsStepper};
    use crate::model::scene::{Geometry, Material, Node, NodeId};
    use glam::Vec3;

    fn material() -> Material {
        Material::Basic { color: [1.0; 4] }
    }

    #[test]
    fn test_sync_copies_pose_exactly() {
        let mut world = PhysicsWorld::new(Vec3::new(0.0, -9.82, 0.0), ContactConfig::default());
        let mut scene = SceneGraph::new();
        let mut registry = ObjectRegistry::new();

        for x in [1.0, -1.0] {
            let body = world.add_body(&BodyDesc::sphere(0.5, 1.0, Vec3::new(x, 2.0, 0.0)));
            let node = scene.add(Node::new(Geometry::sphere(0.5), material()));
            registry.add_dynamic_object(node, body);
        }
        world.set_force(registry.iter().next().unwrap().body, Vec3::new(150.0, 0.0, 30.0));

        let mut stepper = PhysicsStepper::new(world);
        for _ in 0..20 {
            stepper.step(1.0 / 60.0, 0.021, 3);
            assert_eq!(sync(&registry, stepper.world(), &mut scene), 2);

            for object in registry.iter() {
                let node = scene.node(object.visual).unwrap();
                let p = stepper.world().position(object.body).unwrap();
                let q = stepper.world().orientation(object.body).unwrap();
                assert_eq!(node.transform.translation.to_array(), p.to_array());
                assert_eq!(node.transform.rotation.to_array(), q.to_array());
            }
        }
    }

    #[test]
    fn test_unregistered_nodes_are_untouched() {
        let mut world = PhysicsWorld::new(Vec3::new(0.0, -9.82, 0.0), ContactConfig::default());
        let mut scene = SceneGraph::new();
        let mut registry = ObjectRegistry::new();

        let floor_node = scene.add(Node::new(Geometry::Plane { width: 5.0, depth: 5.0 }, material()));
        world.add_body(&BodyDesc::ground_plane());
        let body = world.add_body(&BodyDesc::sphere(0.5, 1.0, Vec3::new(0.0, 2.0, 0.0)));
        let node = scene.add(Node::new(Geometry::sphere(0.5), material()));
        registry.add_dynamic_object(node, body);

        let floor_before = scene.node(floor_node).unwrap().transform;
        let mut stepper = PhysicsStepper::new(world);
        stepper.step(1.0 / 60.0, 0.05, 3);
        sync(&registry, stepper.world(), &mut scene);

        assert_eq!(scene.node(floor_node).unwrap().transform, floor_before);
        assert_ne!(scene.node(node).unwrap().transform.translation, Vec3::ZERO);
    }

    #[test]
    fn test_missing_node_is_skipped() {
        let mut world = PhysicsWorld::new(Vec3::ZERO, ContactConfig::default());
        let mut scene = SceneGraph::new();
        let mut registry = ObjectRegistry::new();
        let body = world.add_body(&BodyDesc::sphere(0.5, 1.0, Vec3::ONE));
        registry.add_dynamic_object(NodeId(42), body);
        assert_eq!(sync(&registry, &world, &mut scene), 0);
    }
}
