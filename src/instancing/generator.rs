use crate::gpu::pipeline_helpers;
use crate::gpu::shader_composer::ShaderComposer;

/// Compute threads per workgroup; the kernel declares the same value.
pub const WORKGROUP_SIZE: u32 = 64;

/// Workgroups needed to cover `instance_count` threads. Counts below one
/// workgroup clamp to a single group; the kernel's `arrayLength` guard
/// discards the surplus threads.
#[must_use]
pub fn workgroup_count(instance_count: u32) -> u32 {
    (instance_count / WORKGROUP_SIZE).max(1)
}

/// Per-frame scalar inputs to the position kernel. Layout matches the
/// `GeneratorParams` uniform in `position_kernel.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct GeneratorParams {
    /// Square root of the instance count; maps a linear index onto a 2D
    /// grid inside the kernel.
    grid_dim: f32,
    /// Seconds since engine start.
    elapsed: f32,
    _pad: [f32; 2],
}

/// The attribute-generator compute pass: rewrites every position record
/// once per frame as a deterministic function of (index, time, grid dim).
///
/// The position buffer is bound explicitly via
/// [`bind_position_buffer`](Self::bind_position_buffer) after each
/// reallocation; dispatching without a bound buffer is a soft failure
/// (logged, nothing written), so a misconfigured scene renders nothing
/// instead of crashing.
pub struct AttributeGenerator {
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    params_buffer: wgpu::Buffer,
    bind_group: Option<wgpu::BindGroup>,
}

impl AttributeGenerator {
    /// Build the compute pipeline and params uniform.
    pub fn new(
        device: &wgpu::Device,
        shader_composer: &mut ShaderComposer,
    ) -> Self {
        let shader = shader_composer.compose(
            device,
            "Position Kernel",
            include_str!("../../assets/shaders/compute/position_kernel.wgsl"),
            "compute/position_kernel.wgsl",
        );

        let bind_group_layout = device.create_bind_group_layout(
            &wgpu::BindGroupLayoutDescriptor {
                label: Some("Position Kernel Bind Group Layout"),
                entries: &[
                    pipeline_helpers::storage_buffer_rw(
                        0,
                        wgpu::ShaderStages::COMPUTE,
                    ),
                    pipeline_helpers::uniform_buffer(
                        1,
                        wgpu::ShaderStages::COMPUTE,
                    ),
                ],
            },
        );

        let pipeline_layout = device.create_pipeline_layout(
            &wgpu::PipelineLayoutDescriptor {
                label: Some("Position Kernel Layout"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            },
        );

        let pipeline = device.create_compute_pipeline(
            &wgpu::ComputePipelineDescriptor {
                label: Some("Position Kernel Pipeline"),
                layout: Some(&pipeline_layout),
                module: &shader,
                entry_point: Some("cs_position_kernel"),
                compilation_options:
                    wgpu::PipelineCompilationOptions::default(),
                cache: None,
            },
        );

        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Generator Params"),
            size: size_of::<GeneratorParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            pipeline,
            bind_group_layout,
            params_buffer,
            bind_group: None,
        }
    }

    /// Point the kernel at a (re)allocated position buffer. Called once
    /// per reallocation, not per frame.
    pub fn bind_position_buffer(
        &mut self,
        device: &wgpu::Device,
        position: &wgpu::Buffer,
    ) {
        self.bind_group =
            Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Position Kernel Bind Group"),
                layout: &self.bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: position.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: self.params_buffer.as_entire_binding(),
                    },
                ],
            }));
    }

    /// Encode the per-frame dispatch: upload the scalar params, then
    /// dispatch `max(1, instance_count / 64)` workgroups.
    ///
    /// Must be encoded before the frame's draw in the same submission so
    /// the draw observes this frame's positions.
    pub fn dispatch(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        queue: &wgpu::Queue,
        instance_count: u32,
        elapsed: f32,
    ) {
        let Some(bind_group) = &self.bind_group else {
            log::warn!("attribute generator has no position buffer bound");
            return;
        };

        let params = GeneratorParams {
            grid_dim: (instance_count as f32).sqrt(),
            elapsed,
            _pad: [0.0; 2],
        };
        queue.write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&params));

        let mut pass =
            encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Attribute Generator Pass"),
                timestamp_writes: None,
            });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.dispatch_workgroups(workgroup_count(instance_count), 1, 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_workgroup_at_the_64_boundary() {
        assert_eq!(workgroup_count(64), 1);
    }

    #[test]
    fn test_small_counts_clamp_to_one_workgroup() {
        assert_eq!(workgroup_count(1), 1);
        assert_eq!(workgroup_count(32), 1);
    }

    #[test]
    fn test_power_of_two_counts_divide_evenly() {
        assert_eq!(workgroup_count(1024), 16);
        assert_eq!(workgroup_count(4_194_304), 65_536);
    }
}
