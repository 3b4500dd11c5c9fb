//! Indirect instanced-mesh draw pass.
//!
//! Issues exactly one `draw_indexed_indirect` per frame. The GPU reads
//! `instance_count` and `index_count` from the argument buffer at draw
//! time — no CPU readback — so a compute pass (or a future GPU-side
//! culling stage) can change the drawn population without a round trip.
//!
//! Buffer bindings are explicit draw parameters rather than stored
//! material state: the caller passes the instance bind group and argument
//! buffer into [`IndirectMeshRenderer::draw`] every frame.

use crate::gpu::pipeline_helpers;
use crate::gpu::shader_composer::ShaderComposer;
use crate::mesh::{Mesh, Vertex};

/// Render pipeline for drawing one mesh many times with per-instance
/// position/size and color/alpha fetched from storage buffers.
pub struct IndirectMeshRenderer {
    pipeline: wgpu::RenderPipeline,
    camera_bind_group_layout: wgpu::BindGroupLayout,
    instance_bind_group_layout: wgpu::BindGroupLayout,
}

impl IndirectMeshRenderer {
    /// Build the render pipeline for the given surface format.
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        shader_composer: &mut ShaderComposer,
    ) -> Self {
        let shader = shader_composer.compose(
            device,
            "Instanced Mesh",
            include_str!("../../assets/shaders/raster/instanced_mesh.wgsl"),
            "raster/instanced_mesh.wgsl",
        );

        let camera_bind_group_layout = device.create_bind_group_layout(
            &wgpu::BindGroupLayoutDescriptor {
                label: Some("Instanced Mesh Camera Layout"),
                entries: &[pipeline_helpers::uniform_buffer(
                    0,
                    wgpu::ShaderStages::VERTEX,
                )],
            },
        );

        let instance_bind_group_layout = device.create_bind_group_layout(
            &wgpu::BindGroupLayoutDescriptor {
                label: Some("Instanced Mesh Instance Layout"),
                entries: &[
                    pipeline_helpers::storage_buffer_ro(
                        0,
                        wgpu::ShaderStages::VERTEX,
                    ),
                    pipeline_helpers::storage_buffer_ro(
                        1,
                        wgpu::ShaderStages::VERTEX,
                    ),
                ],
            },
        );

        let pipeline_layout = device.create_pipeline_layout(
            &wgpu::PipelineLayoutDescriptor {
                label: Some("Instanced Mesh Layout"),
                bind_group_layouts: &[
                    &camera_bind_group_layout,
                    &instance_bind_group_layout,
                ],
                push_constant_ranges: &[],
            },
        );

        let pipeline = device.create_render_pipeline(
            &wgpu::RenderPipelineDescriptor {
                label: Some("Instanced Mesh Pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[Vertex::layout()],
                    compilation_options:
                        wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: surface_format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options:
                        wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: Some(wgpu::Face::Back),
                    ..Default::default()
                },
                depth_stencil: Some(pipeline_helpers::depth_stencil_state()),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            },
        );

        Self {
            pipeline,
            camera_bind_group_layout,
            instance_bind_group_layout,
        }
    }

    /// Bind group for the camera uniform.
    #[must_use]
    pub fn create_camera_bind_group(
        &self,
        device: &wgpu::Device,
        camera_buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Instanced Mesh Camera Bind Group"),
            layout: &self.camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        })
    }

    /// Bind group for the position and color attribute buffers. Recreated
    /// whenever the buffers are reallocated.
    #[must_use]
    pub fn create_instance_bind_group(
        &self,
        device: &wgpu::Device,
        position: &wgpu::Buffer,
        color: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Instanced Mesh Instance Bind Group"),
            layout: &self.instance_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: position.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: color.as_entire_binding(),
                },
            ],
        })
    }

    /// Issue the indirect draw for the mesh's submesh 0.
    ///
    /// Precondition: `args` has been populated at least once (the resize
    /// controller does this on first allocation).
    pub fn draw<'a>(
        &'a self,
        render_pass: &mut wgpu::RenderPass<'a>,
        mesh: &'a Mesh,
        camera_bind_group: &'a wgpu::BindGroup,
        instance_bind_group: &'a wgpu::BindGroup,
        args: &'a wgpu::Buffer,
    ) {
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, camera_bind_group, &[]);
        render_pass.set_bind_group(1, instance_bind_group, &[]);
        render_pass.set_vertex_buffer(0, mesh.vertex_buffer().slice(..));
        render_pass.set_index_buffer(
            mesh.index_buffer().slice(..),
            wgpu::IndexFormat::Uint32,
        );
        render_pass.draw_indexed_indirect(args, 0);
    }
}
