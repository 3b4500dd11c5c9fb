use crate::mesh::Mesh;

/// Arguments for an indexed indirect draw, in the exact layout
/// `RenderPass::draw_indexed_indirect` reads from the GPU:
/// `[index_count, instance_count, first_index, base_vertex, first_instance]`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct IndirectArgs {
    /// Indices drawn per instance (the mesh's submesh-0 index count).
    pub index_count: u32,
    /// Number of instances to draw; must match the attribute buffer length.
    pub instance_count: u32,
    /// First index within the index buffer.
    pub first_index: u32,
    /// Value added to each index before vertex lookup.
    pub base_vertex: i32,
    /// First instance to draw.
    pub first_instance: u32,
}

impl IndirectArgs {
    /// Args for drawing `instance_count` copies of the given mesh. A
    /// missing mesh yields an index count of 0 — a degenerate draw that
    /// renders nothing rather than crashing.
    #[must_use]
    pub fn for_submesh(mesh: Option<&Mesh>, instance_count: u32) -> Self {
        Self {
            index_count: mesh.map_or(0, Mesh::index_count),
            instance_count,
            first_index: 0,
            base_vertex: 0,
            first_instance: 0,
        }
    }
}

/// The fixed GPU buffer holding one [`IndirectArgs`] record.
///
/// Allocated once at startup and never reallocated; only its contents
/// change, on resize. The draw call reads `instance_count` and
/// `index_count` from this buffer at execution time, so the instance
/// population can change without any CPU readback.
pub struct IndirectArgsBuffer {
    buffer: Option<wgpu::Buffer>,
}

impl IndirectArgsBuffer {
    /// Allocate the 20-byte argument buffer.
    #[must_use]
    pub fn new(device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Indirect Args Buffer"),
            size: size_of::<IndirectArgs>() as u64,
            usage: wgpu::BufferUsages::INDIRECT
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        Self {
            buffer: Some(buffer),
        }
    }

    /// Upload a new argument record. No-op after release.
    pub fn write(&self, queue: &wgpu::Queue, args: IndirectArgs) {
        if let Some(buffer) = &self.buffer {
            queue.write_buffer(buffer, 0, bytemuck::bytes_of(&args));
            log::debug!(
                "indirect args: {} indices x {} instances",
                args.index_count,
                args.instance_count
            );
        }
    }

    /// The underlying buffer, if not released.
    #[must_use]
    pub fn buffer(&self) -> Option<&wgpu::Buffer> {
        self.buffer.as_ref()
    }

    /// Destroy the buffer. Idempotent.
    pub fn release(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            buffer.destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_record_matches_indirect_layout() {
        assert_eq!(size_of::<IndirectArgs>(), 20);
        let args = IndirectArgs {
            index_count: 36,
            instance_count: 1024,
            first_index: 0,
            base_vertex: 0,
            first_instance: 0,
        };
        let words: [u32; 5] = bytemuck::cast(args);
        assert_eq!(words, [36, 1024, 0, 0, 0]);
    }

    #[test]
    fn test_missing_mesh_yields_degenerate_draw() {
        let args = IndirectArgs::for_submesh(None, 1024);
        assert_eq!(args.index_count, 0);
        assert_eq!(args.instance_count, 1024);
    }
}
