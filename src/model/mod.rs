// MODEL: Scene state and data
pub mod camera;
pub mod registry;
pub mod scene;
pub mod viewport;

pub use camera::Camera;
pub use registry::{ObjectId, ObjectRegistry, SceneObject};
pub use scene::{
    AmbientLight, DirectionalLight, Geometry, Lights, Material, Node, NodeId, SceneGraph, Transform,
};
pub use viewport::ViewportState;
