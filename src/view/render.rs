use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use wgpu::*;

use crate::error::RenderError;
use crate::model::{Camera, Geometry, Material, Node, NodeId, SceneGraph};
use crate::utils::{Mesh, MeshBuffer, Topology, Vertex};
use crate::view::{GpuContext, SceneRenderer};

const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub eye: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct LightsUniform {
    pub ambient: [f32; 4],
    pub sun_color: [f32; 4],
    pub sun_dir: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct NodeUniform {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
    pub params: [f32; 4],
}

impl CameraUniform {
    pub fn from_camera(camera: &Camera) -> Self {
        Self { view_proj: camera.view_proj().to_cols_array_2d(), eye: camera.eye.extend(1.0).to_array() }
    }
}

impl LightsUniform {
    pub fn from_scene(scene: &SceneGraph) -> Self {
        let ambient = scene.lights.ambient;
        let sun = scene.lights.directional;
        let scaled = |c: [f32; 3], i: f32| [c[0] * i, c[1] * i, c[2] * i, 1.0];
        Self {
            ambient: scaled(ambient.color, ambient.intensity),
            sun_color: scaled(sun.color, sun.intensity),
            sun_dir: sun.direction_to_light().extend(0.0).to_array(),
        }
    }
}

impl NodeUniform {
    pub fn from_node(node: &Node) -> Self {
        let params = match node.material {
            Material::Basic { .. } => [0.0, 1.0, 0.0, 0.0],
            Material::Standard { metalness, roughness, .. } => [metalness, roughness, 1.0, 0.0],
        };
        Self { model: node.transform.matrix().to_cols_array_2d(), color: node.material.color(), params }
    }
}

/// GPU-side copy of one scene node.
struct GpuNode {
    geometry: Geometry,
    mesh: MeshBuffer,
    uniform: Buffer,
    bind_group: BindGroup,
}

pub fn create_depth_texture(device: &Device, width: u32, height: u32) -> TextureView {
    let depth_texture = device.create_texture(&TextureDescriptor {
        label: Some("depth_texture"),
        size: Extent3d { width, height, depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    depth_texture.create_view(&TextureViewDescriptor::default())
}

fn uniform_entry(binding: u32, visibility: ShaderStages) -> BindGroupLayoutEntry {
    BindGroupLayoutEntry {
        binding,
        visibility,
        ty: BindingType::Buffer {
            ty: BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn uniform_buffer(device: &Device, label: &str, size: usize) -> Buffer {
    device.create_buffer(&BufferDescriptor {
        label: Some(label),
        size: size as BufferAddress,
        usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_pipeline(
    device: &Device,
    label: &str,
    layout: &PipelineLayout,
    shader: &ShaderModule,
    format: TextureFormat,
    topology: PrimitiveTopology,
) -> RenderPipeline {
    let cull_mode = match topology {
        PrimitiveTopology::TriangleList => Some(Face::Back),
        _ => None,
    };
    device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[Vertex::layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(ColorTargetState { format, blend: Some(BlendState::REPLACE), write_mask: ColorWrites::ALL })],
            compilation_options: Default::default(),
        }),
        primitive: PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: FrontFace::Ccw,
            cull_mode,
            polygon_mode: PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: CompareFunction::Less,
            stencil: StencilState::default(),
            bias: DepthBiasState::default(),
        }),
        multisample: MultisampleState { count: 1, mask: !0, alpha_to_coverage_enabled: false },
        multiview: None,
        cache: None,
    })
}

/// wgpu renderer for a [`SceneGraph`]. Owns the surface and uploads node
/// geometry on first sight.
pub struct Renderer {
    gpu: GpuContext,
    depth_view: TextureView,
    camera_buffer: Buffer,
    lights_buffer: Buffer,
    frame_bind_group: BindGroup,
    node_layout: BindGroupLayout,
    mesh_pipeline: RenderPipeline,
    line_pipeline: RenderPipeline,
    nodes: HashMap<NodeId, GpuNode>,
}

impl Renderer {
    pub fn new(gpu: GpuContext) -> Self {
        let device = gpu.device.as_ref();

        let camera_buffer = uniform_buffer(device, "camera_buffer", std::mem::size_of::<CameraUniform>());
        let lights_buffer = uniform_buffer(device, "lights_buffer", std::mem::size_of::<LightsUniform>());

        let frame_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("frame_bind_group_layout"),
            entries: &[
                uniform_entry(0, ShaderStages::VERTEX | ShaderStages::FRAGMENT),
                uniform_entry(1, ShaderStages::FRAGMENT),
            ],
        });
        let frame_bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &frame_layout,
            entries: &[
                BindGroupEntry { binding: 0, resource: camera_buffer.as_entire_binding() },
                BindGroupEntry { binding: 1, resource: lights_buffer.as_entire_binding() },
            ],
        });
        let node_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("node_bind_group_layout"),
            entries: &[uniform_entry(0, ShaderStages::VERTEX | ShaderStages::FRAGMENT)],
        });

        let shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("scene_shader"),
            source: ShaderSource::Wgsl(include_str!("shaders/scene.wgsl").into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[&frame_layout, &node_layout],
            push_constant_ranges: &[],
        });
        let mesh_pipeline = create_pipeline(
            device,
            "mesh_pipeline",
            &pipeline_layout,
            &shader,
            gpu.format,
            PrimitiveTopology::TriangleList,
        );
        let line_pipeline = create_pipeline(
            device,
            "line_pipeline",
            &pipeline_layout,
            &shader,
            gpu.format,
            PrimitiveTopology::LineList,
        );

        let depth_view = create_depth_texture(device, gpu.config.width, gpu.config.height);

        Self {
            gpu,
            depth_view,
            camera_buffer,
            lights_buffer,
            frame_bind_group,
            node_layout,
            mesh_pipeline,
            line_pipeline,
            nodes: HashMap::new(),
        }
    }

    /// Uploads new nodes, rebuilds ones whose geometry changed, drops
    /// removed ones and refreshes every node's uniform.
    fn prepare_nodes(&mut self, scene: &SceneGraph) {
        self.nodes.retain(|id, _| scene.node(*id).is_some());

        for (id, node) in scene.nodes() {
            let stale = self.nodes.get(&id).is_some_and(|gpu_node| gpu_node.geometry != node.geometry);
            if stale || !self.nodes.contains_key(&id) {
                let gpu_node = self.upload_node(node);
                self.nodes.insert(id, gpu_node);
            }
            if let Some(gpu_node) = self.nodes.get(&id) {
                self.gpu.queue.write_buffer(&gpu_node.uniform, 0, bytemuck::bytes_of(&NodeUniform::from_node(node)));
            }
        }
    }

    fn upload_node(&self, node: &Node) -> GpuNode {
        let device = self.gpu.device.as_ref();
        let mesh = Mesh::from_geometry(&node.geometry).upload(device);
        let uniform = uniform_buffer(device, "node_uniform", std::mem::size_of::<NodeUniform>());
        let bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("node_bind_group"),
            layout: &self.node_layout,
            entries: &[BindGroupEntry { binding: 0, resource: uniform.as_entire_binding() }],
        });
        tracing::debug!(geometry = ?node.geometry, indices = mesh.index_count, "uploaded node mesh");
        GpuNode { geometry: node.geometry, mesh, uniform, bind_group }
    }
}

impl SceneRenderer for Renderer {
    type Error = RenderError;

    fn render(&mut self, scene: &SceneGraph, camera: &Camera) -> Result<(), RenderError> {
        let frame = match self.gpu.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(SurfaceError::Lost | SurfaceError::Outdated) => {
                tracing::warn!("surface lost or outdated, reconfiguring and skipping frame");
                self.gpu.reconfigure();
                return Ok(());
            }
            Err(SurfaceError::Timeout) => {
                tracing::debug!("surface timeout, skipping frame");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let queue = self.gpu.queue.clone();
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&CameraUniform::from_camera(camera)));
        queue.write_buffer(&self.lights_buffer, 0, bytemuck::bytes_of(&LightsUniform::from_scene(scene)));
        self.prepare_nodes(scene);

        let view = frame.texture.create_view(&TextureViewDescriptor::default());
        let mut encoder = self.gpu.device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some("encoder"),
        });

        {
            let [r, g, b, a] = scene.background.map(f64::from);
            let mut rp = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: Operations { load: LoadOp::Clear(Color { r, g, b, a }), store: StoreOp::Store },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations { load: LoadOp::Clear(1.0), store: StoreOp::Store }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            rp.set_bind_group(0, &self.frame_bind_group, &[]);
            for (id, node) in scene.nodes() {
                if !node.visible {
                    continue;
                }
                let Some(gpu_node) = self.nodes.get(&id) else { continue };
                if gpu_node.mesh.index_count == 0 {
                    continue;
                }
                let pipeline = match gpu_node.mesh.topology {
                    Topology::Triangles => &self.mesh_pipeline,
                    Topology::Lines => &self.line_pipeline,
                };
                rp.set_pipeline(pipeline);
                rp.set_bind_group(1, &gpu_node.bind_group, &[]);
                rp.set_vertex_buffer(0, gpu_node.mesh.vertex_buffer.slice(..));
                rp.set_index_buffer(gpu_node.mesh.index_buffer.slice(..), IndexFormat::Uint32);
                rp.draw_indexed(0..gpu_node.mesh.index_count, 0, 0..1);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn set_size(&mut self, width: u32, height: u32, pixel_ratio: f32) {
        let max = self.gpu.max_dimension();
        let physical = |logical: u32| ((logical as f32 * pixel_ratio).round() as u32).clamp(1, max);
        let (w, h) = (physical(width), physical(height));

        self.gpu.config.width = w;
        self.gpu.config.height = h;
        self.gpu.reconfigure();
        self.depth_view = create_depth_texture(self.gpu.device.as_ref(), w, h);
        tracing::debug!(width = w, height = h, "surface reconfigured");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Lights, Transform};
    use glam::Vec3;

    #[test]
    fn test_uniform_sizes_match_shader_layout() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 80);
        assert_eq!(std::mem::size_of::<LightsUniform>(), 48);
        assert_eq!(std::mem::size_of::<NodeUniform>(), 96);
    }

    #[test]
    fn test_lights_uniform_premultiplies_intensity() {
        let mut scene = SceneGraph::new();
        scene.lights = Lights::default();
        let u = LightsUniform::from_scene(&scene);
        assert_eq!(u.ambient, [0.5, 0.5, 0.5, 1.0]);
        assert!((u.sun_color[0] - 0.8).abs() < 1e-6);
        let dir = Vec3::new(u.sun_dir[0], u.sun_dir[1], u.sun_dir[2]);
        assert!((dir.length() - 1.0).abs() < 1e-5);
        assert!(dir.x < 0.0 && dir.y > 0.0);
    }

    #[test]
    fn test_node_uniform_marks_lit_materials() {
        let basic = Node::new(Geometry::Axes { size: 5.0 }, Material::Basic { color: [1.0; 4] });
        assert_eq!(NodeUniform::from_node(&basic).params[2], 0.0);

        let sphere = Node::new(
            Geometry::sphere(0.5),
            Material::Standard { color: [1.0, 0.0, 0.0, 1.0], metalness: 0.1, roughness: 0.3 },
        )
        .with_transform(Transform::from_translation(Vec3::new(1.0, 2.0, 0.0)));
        let u = NodeUniform::from_node(&sphere);
        assert_eq!(u.params, [0.1, 0.3, 1.0, 0.0]);
        assert_eq!(u.model[3], [1.0, 2.0, 0.0, 1.0]);
    }
}
