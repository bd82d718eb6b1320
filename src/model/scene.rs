use glam::{Mat4, Quat, Vec3};

/// Stable handle to a node in a [`SceneGraph`]. Ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Geometry {
    Sphere { radius: f32, segments: u32, rings: u32 },
    /// Flat quad in its local XY plane, facing +Z.
    Plane { width: f32, depth: f32 },
    /// Red/green/blue lines along +X/+Y/+Z.
    Axes { size: f32 },
}

impl Geometry {
    pub fn sphere(radius: f32) -> Self {
        Geometry::Sphere { radius, segments: 32, rings: 16 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Material {
    /// Flat color, not affected by lights.
    Basic { color: [f32; 4] },
    Standard { color: [f32; 4], metalness: f32, roughness: f32 },
}

impl Material {
    pub fn color(&self) -> [f32; 4] {
        match self {
            Material::Basic { color } | Material::Standard { color, .. } => *color,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self { translation: Vec3::ZERO, rotation: Quat::IDENTITY, scale: Vec3::ONE }
    }
}

impl Transform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self { translation, ..Default::default() }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub geometry: Geometry,
    pub material: Material,
    pub transform: Transform,
    pub visible: bool,
}

impl Node {
    pub fn new(geometry: Geometry, material: Material) -> Self {
        Self { geometry, material, transform: Transform::default(), visible: true }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub color: [f32; 3],
    pub intensity: f32,
}

/// Directional light placed at `position`, shining toward the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub color: [f32; 3],
    pub intensity: f32,
    pub position: Vec3,
}

impl DirectionalLight {
    /// Unit vector pointing from the scene toward the light.
    pub fn direction_to_light(&self) -> Vec3 {
        let dir = self.position.normalize_or_zero();
        if dir == Vec3::ZERO { Vec3::Y } else { dir }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lights {
    pub ambient: AmbientLight,
    pub directional: DirectionalLight,
}

impl Default for Lights {
    fn default() -> Self {
        Self {
            ambient: AmbientLight { color: [1.0; 3], intensity: 0.5 },
            directional: DirectionalLight {
                color: [1.0; 3],
                intensity: 0.8,
                position: Vec3::new(-3.0, 3.0, 0.0),
            },
        }
    }
}

/// Render-side scene description. Holds no GPU resources; the renderer
/// uploads geometry lazily per [`NodeId`].
pub struct SceneGraph {
    nodes: Vec<Node>,
    pub lights: Lights,
    pub background: [f32; 4],
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            lights: Lights::default(),
            background: [0.0, 0.0, 0.0, 1.0],
        }
    }

    pub fn add(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    pub fn set_position(&mut self, id: NodeId, position: Vec3) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.transform.translation = position;
                true
            }
            None => false,
        }
    }

    pub fn set_orientation(&mut self, id: NodeId, rotation: Quat) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.transform.rotation = rotation;
                true
            }
            None => false,
        }
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
