use std::f32::consts::{PI, TAU};

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::model::Geometry;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x4,
        3 => Float32x2,
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// How a mesh's index buffer is meant to be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    Triangles,
    Lines,
}

pub struct MeshBuffer {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
    pub topology: Topology,
}

#[derive(Debug, Clone)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub topology: Topology,
}

impl Mesh {
    /// Builds the local-space mesh for a scene geometry.
    pub fn from_geometry(geometry: &Geometry) -> Self {
        match *geometry {
            Geometry::Sphere { radius, segments, rings } => sphere_mesh(radius, segments, rings),
            Geometry::Plane { width, depth } => plane_mesh(width, depth),
            Geometry::Axes { size } => axes_mesh(size),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.indices.is_empty()
    }

    pub fn upload(&self, device: &wgpu::Device) -> MeshBuffer {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertex Buffer"),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Index Buffer"),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        MeshBuffer {
            vertex_buffer,
            index_buffer,
            index_count: self.indices.len() as u32,
            topology: self.topology,
        }
    }
}

const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// UV sphere centred at the origin. Faces wind counter-clockwise seen from
/// outside.
pub fn sphere_mesh(radius: f32, segments: u32, rings: u32) -> Mesh {
    let segments = segments.max(3);
    let rings = rings.max(2);

    let mut vertices = Vec::with_capacity(((rings + 1) * (segments + 1)) as usize);
    for r in 0..=rings {
        let v = r as f32 / rings as f32;
        let phi = v * PI;
        for s in 0..=segments {
            let u = s as f32 / segments as f32;
            let theta = u * TAU;
            let normal = [phi.sin() * theta.sin(), phi.cos(), phi.sin() * theta.cos()];
            vertices.push(Vertex {
                pos: normal.map(|c| c * radius),
                normal,
                color: WHITE,
                uv: [u, v],
            });
        }
    }

    let row = segments + 1;
    let mut indices = Vec::with_capacity((rings * segments * 6) as usize);
    for r in 0..rings {
        for s in 0..segments {
            let a = r * row + s;
            let b = a + row;
            // The first and last rings collapse to a pole; skip the
            // degenerate half of each quad there.
            if r != 0 {
                indices.extend_from_slice(&[a, b, a + 1]);
            }
            if r != rings - 1 {
                indices.extend_from_slice(&[b, b + 1, a + 1]);
            }
        }
    }

    Mesh { vertices, indices, topology: Topology::Triangles }
}

/// Quad of `width` x `depth` in the local XY plane, facing +Z.
pub fn plane_mesh(width: f32, depth: f32) -> Mesh {
    let (hw, hd) = (width * 0.5, depth * 0.5);
    let normal = [0.0, 0.0, 1.0];
    let vertices = vec![
        Vertex { pos: [-hw, -hd, 0.0], normal, color: WHITE, uv: [0.0, 1.0] },
        Vertex { pos: [hw, -hd, 0.0], normal, color: WHITE, uv: [1.0, 1.0] },
        Vertex { pos: [hw, hd, 0.0], normal, color: WHITE, uv: [1.0, 0.0] },
        Vertex { pos: [-hw, hd, 0.0], normal, color: WHITE, uv: [0.0, 0.0] },
    ];
    Mesh { vertices, indices: vec![0, 1, 2, 0, 2, 3], topology: Topology::Triangles }
}

/// Three line segments from the origin: X red, Y green, Z blue.
pub fn axes_mesh(size: f32) -> Mesh {
    let axes = [
        ([size, 0.0, 0.0], [1.0, 0.0, 0.0, 1.0]),
        ([0.0, size, 0.0], [0.0, 1.0, 0.0, 1.0]),
        ([0.0, 0.0, size], [0.0, 0.0, 1.0, 1.0]),
    ];
    let mut vertices = Vec::with_capacity(6);
    for (tip, color) in axes {
        let normal = [0.0, 1.0, 0.0];
        vertices.push(Vertex { pos: [0.0; 3], normal, color, uv: [0.0, 0.0] });
        vertices.push(Vertex { pos: tip, normal, color, uv: [1.0, 0.0] });
    }
    Mesh { vertices, indices: (0..6).collect(), topology: Topology::Lines }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn assert_indices_valid(mesh: &Mesh) {
        let n = mesh.vertices.len() as u32;
        assert!(mesh.indices.iter().all(|&i| i < n));
        match mesh.topology {
            Topology::Triangles => assert_eq!(mesh.indices.len() % 3, 0),
            Topology::Lines => assert_eq!(mesh.indices.len() % 2, 0),
        }
    }

    #[test]
    fn test_sphere_vertices_lie_on_surface() {
        let mesh = sphere_mesh(0.5, 32, 16);
        assert_indices_valid(&mesh);
        for v in &mesh.vertices {
            assert!((Vec3::from_array(v.pos).length() - 0.5).abs() < 1e-5);
            assert!((Vec3::from_array(v.normal).length() - 1.0).abs() < 1e-5);
        }
        // Two caps of one triangle per segment, two per segment elsewhere.
        assert_eq!(mesh.indices.len(), (32 * 2 + 32 * 14 * 2) * 3);
    }

    #[test]
    fn test_sphere_faces_point_outward() {
        let mesh = sphere_mesh(1.0, 12, 6);
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from_array(mesh.vertices[i as usize].pos));
            let face_normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(face_normal.dot(centroid) > 0.0);
        }
    }

    #[test]
    fn test_sphere_clamps_degenerate_resolution() {
        let mesh = sphere_mesh(1.0, 0, 0);
        assert_indices_valid(&mesh);
        assert!(!mesh.is_empty());
    }

    #[test]
    fn test_plane_faces_plus_z() {
        let mesh = plane_mesh(5.0, 5.0);
        assert_indices_valid(&mesh);
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from_array(mesh.vertices[i as usize].pos));
            assert!((b - a).cross(c - a).z > 0.0);
        }
        let max_x = mesh.vertices.iter().map(|v| v.pos[0]).fold(f32::MIN, f32::max);
        assert_eq!(max_x, 2.5);
    }

    #[test]
    fn test_axes_are_colored_lines() {
        let mesh = Mesh::from_geometry(&Geometry::Axes { size: 5.0 });
        assert_indices_valid(&mesh);
        assert_eq!(mesh.topology, Topology::Lines);
        assert_eq!(mesh.vertices[1].pos, [5.0, 0.0, 0.0]);
        assert_eq!(mesh.vertices[1].color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(mesh.vertices[5].color, [0.0, 0.0, 1.0, 1.0]);
    }
}
