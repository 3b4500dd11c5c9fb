//! Generated instance mesh and its bounding volume.

use glam::Vec3;
use wgpu::util::DeviceExt;

/// Mesh vertex: position + normal.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Object-space position.
    pub position: [f32; 3],
    /// Object-space normal.
    pub normal: [f32; 3],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    /// Vertex buffer layout for render pipelines.
    #[must_use]
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: size_of::<Self>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Axis-aligned bounding volume for a mesh and everything drawn with it.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Bounds {
    /// Box center in world space.
    pub center: Vec3,
    /// Half extent along each axis.
    pub half_extent: Vec3,
}

impl Bounds {
    /// The conservative fixed box used when instance positions are
    /// procedural: the engine cannot derive bounds from vertex data it
    /// never sees, so the volume covers everything the kernel can emit.
    #[must_use]
    pub fn procedural_instances() -> Self {
        Self {
            center: Vec3::ZERO,
            half_extent: Vec3::splat(5000.0),
        }
    }

    /// Distance from the center to a corner.
    #[must_use]
    pub fn radius(&self) -> f32 {
        self.half_extent.length()
    }
}

/// A GPU-resident indexed mesh with a settable bounding volume.
pub struct Mesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    bounds: Bounds,
}

impl Mesh {
    /// Upload a mesh from vertex and index arrays.
    #[must_use]
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        vertices: &[Vertex],
        indices: &[u32],
        bounds: Bounds,
    ) -> Self {
        let vertex_buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} Vertices")),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} Indices")),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
            bounds,
        }
    }

    /// A unit cube centered at the origin (24 vertices, 36 indices).
    #[must_use]
    pub fn cube(device: &wgpu::Device) -> Self {
        let (vertices, indices) = cube_geometry();
        Self::new(
            device,
            "Cube Mesh",
            &vertices,
            &indices,
            Bounds {
                center: Vec3::ZERO,
                half_extent: Vec3::splat(0.5),
            },
        )
    }

    /// Submesh-0 index count.
    #[must_use]
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// The current bounding volume.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Replace the bounding volume.
    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
    }

    /// The vertex buffer.
    #[must_use]
    pub fn vertex_buffer(&self) -> &wgpu::Buffer {
        &self.vertex_buffer
    }

    /// The index buffer (Uint32).
    #[must_use]
    pub fn index_buffer(&self) -> &wgpu::Buffer {
        &self.index_buffer
    }
}

/// Unit cube with per-face normals.
fn cube_geometry() -> (Vec<Vertex>, Vec<u32>) {
    // (normal, four corners counter-clockwise when viewed from outside)
    let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
        (
            [0.0, 0.0, 1.0],
            [
                [-0.5, -0.5, 0.5],
                [0.5, -0.5, 0.5],
                [0.5, 0.5, 0.5],
                [-0.5, 0.5, 0.5],
            ],
        ),
        (
            [0.0, 0.0, -1.0],
            [
                [0.5, -0.5, -0.5],
                [-0.5, -0.5, -0.5],
                [-0.5, 0.5, -0.5],
                [0.5, 0.5, -0.5],
            ],
        ),
        (
            [1.0, 0.0, 0.0],
            [
                [0.5, -0.5, 0.5],
                [0.5, -0.5, -0.5],
                [0.5, 0.5, -0.5],
                [0.5, 0.5, 0.5],
            ],
        ),
        (
            [-1.0, 0.0, 0.0],
            [
                [-0.5, -0.5, -0.5],
                [-0.5, -0.5, 0.5],
                [-0.5, 0.5, 0.5],
                [-0.5, 0.5, -0.5],
            ],
        ),
        (
            [0.0, 1.0, 0.0],
            [
                [-0.5, 0.5, 0.5],
                [0.5, 0.5, 0.5],
                [0.5, 0.5, -0.5],
                [-0.5, 0.5, -0.5],
            ],
        ),
        (
            [0.0, -1.0, 0.0],
            [
                [-0.5, -0.5, -0.5],
                [0.5, -0.5, -0.5],
                [0.5, -0.5, 0.5],
                [-0.5, -0.5, 0.5],
            ],
        ),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, corners) in faces {
        let base = vertices.len() as u32;
        for position in corners {
            vertices.push(Vertex { position, normal });
        }
        indices.extend_from_slice(&[
            base,
            base + 1,
            base + 2,
            base,
            base + 2,
            base + 3,
        ]);
    }
    (vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_geometry_counts() {
        let (vertices, indices) = cube_geometry();
        assert_eq!(vertices.len(), 24);
        assert_eq!(indices.len(), 36);
        assert!(indices.iter().all(|&i| i < 24));
    }

    #[test]
    fn test_procedural_bounds_cover_the_generator_ring() {
        let bounds = Bounds::procedural_instances();
        // The kernel emits radii up to 100 and heights within ±2.
        assert!(bounds.half_extent.min_element() >= 100.0);
        assert!(bounds.radius() > 100.0);
    }
}
