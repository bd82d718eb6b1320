use crate::controller::physics::BodyHandle;
use crate::model::scene::NodeId;

/// Index of a [`SceneObject`] in its registry, i.e. its creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(pub usize);

/// A dynamic object seen twice: once as a mesh, once as a rigid body.
/// Both halves are created together and updated together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneObject {
    pub visual: NodeId,
    pub body: BodyHandle,
}

/// Append-only list of dynamic objects, iterated once per frame.
///
/// Static objects (the floor) live in the physics world and the scene graph
/// but are never registered here, so the per-frame sync skips them.
#[derive(Debug, Default)]
pub struct ObjectRegistry {
    objects: Vec<SceneObject>,
    controlled: Option<ObjectId>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_dynamic_object(&mut self, visual: NodeId, body: BodyHandle) -> ObjectId {
        self.objects.push(SceneObject { visual, body });
        ObjectId(self.objects.len() - 1)
    }

    /// Marks the object that keyboard input pushes. Returns false for an
    /// unknown id and leaves the previous choice in place.
    pub fn set_controlled(&mut self, id: ObjectId) -> bool {
        if id.0 < self.objects.len() {
            self.controlled = Some(id);
            true
        } else {
            false
        }
    }

    pub fn controlled(&self) -> Option<&SceneObject> {
        self.controlled.and_then(|id| self.get(id))
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(id.0)
    }

    pub fn for_each(&self, mut f: impl FnMut(&SceneObject)) {
        for object in &self.objects {
            f(object);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::physics::{BodyDesc, PhysicsWorld};
    use crate::config::ContactConfig;
    use glam::Vec3;

    fn bodies(n: usize) -> Vec<BodyHandle> {
        let mut world = PhysicsWorld::new(Vec3::ZERO, ContactConfig::default());
        (0..n)
            .map(|i| world.add_body(&BodyDesc::sphere(0.5, 1.0, Vec3::new(i as f32, 0.0, 0.0))))
            .collect()
    }

    #[test]
    fn test_for_each_visits_in_insertion_order() {
        let handles = bodies(3);
        let mut registry = ObjectRegistry::new();
        for (i, body) in handles.iter().enumerate() {
            registry.add_dynamic_object(NodeId(10 + i), *body);
        }

        let mut seen = Vec::new();
        registry.for_each(|o| seen.push(o.visual));
        assert_eq!(seen, vec![NodeId(10), NodeId(11), NodeId(12)]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_controlled_is_explicit() {
        let handles = bodies(2);
        let mut registry = ObjectRegistry::new();
        let first = registry.add_dynamic_object(NodeId(0), handles[0]);
        let second = registry.add_dynamic_object(NodeId(1), handles[1]);
        assert_eq!(first, ObjectId(0));

        // Nothing is controlled until tagged, even with objects present.
        assert!(registry.controlled().is_none());

        assert!(registry.set_controlled(second));
        assert_eq!(registry.controlled().map(|o| o.body), Some(handles[1]));

        assert!(!registry.set_controlled(ObjectId(7)));
        assert_eq!(registry.controlled().map(|o| o.body), Some(handles[1]));
    }
}
