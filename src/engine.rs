//! Frame orchestration: resize → compute → indirect draw.

use glam::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use wgpu::util::DeviceExt;

use crate::camera::{Camera, CameraUniform};
use crate::error::MyriadError;
use crate::gpu::pipeline_helpers;
use crate::gpu::render_context::RenderContext;
use crate::gpu::shader_composer::ShaderComposer;
use crate::instancing::{
    clamp_instance_count, AttributeGenerator, IndirectArgs,
    IndirectArgsBuffer, InstanceBuffers,
};
use crate::mesh::{Bounds, Mesh};
use crate::options::Options;
use crate::renderer::instanced_mesh::IndirectMeshRenderer;
use crate::util::frame_timing::FrameClock;

/// The core engine: owns the GPU context, the instance buffer set, the
/// indirect argument buffer, the attribute-generator compute pass, and
/// the indirect draw pass, and sequences them once per frame.
///
/// Lifecycle: construction allocates the argument buffer and performs the
/// first resize (the `Uninitialized → Ready` transition). Each frame in
/// `Ready` applies any pending instance-count change, dispatches the
/// generator, and issues the draw. [`release`](Self::release) tears down
/// all GPU buffers idempotently.
pub struct InstancedRenderEngine {
    /// GPU device, queue, and surface.
    pub context: RenderContext,
    /// Runtime configuration.
    pub options: Options,
    camera: Camera,
    camera_uniform: CameraUniform,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    depth_view: wgpu::TextureView,
    mesh: Mesh,
    instances: InstanceBuffers,
    args: IndirectArgsBuffer,
    generator: AttributeGenerator,
    renderer: IndirectMeshRenderer,
    instance_bind_group: Option<wgpu::BindGroup>,
    desired_count: u32,
    clock: FrameClock,
    rng: StdRng,
}

impl InstancedRenderEngine {
    /// Create an engine rendering to the given window with default
    /// options.
    ///
    /// # Errors
    ///
    /// Returns [`MyriadError::Gpu`] when GPU context initialization fails.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        size: (u32, u32),
    ) -> Result<Self, MyriadError> {
        Self::with_options(window, size, Options::default()).await
    }

    /// Create an engine rendering to the given window.
    ///
    /// # Errors
    ///
    /// Returns [`MyriadError::Gpu`] when GPU context initialization fails.
    pub async fn with_options(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        size: (u32, u32),
        options: Options,
    ) -> Result<Self, MyriadError> {
        let context = RenderContext::new(window, size).await?;
        Ok(Self::from_context(context, options))
    }

    /// Create an engine on an existing context (headless rendering and
    /// tests use this with [`RenderContext::from_device`]).
    #[must_use]
    pub fn from_context(context: RenderContext, options: Options) -> Self {
        let mut shader_composer = ShaderComposer::new();

        let mesh = Mesh::cube(&context.device);
        let generator =
            AttributeGenerator::new(&context.device, &mut shader_composer);
        let renderer = IndirectMeshRenderer::new(
            &context.device,
            context.format(),
            &mut shader_composer,
        );

        let camera = Camera {
            eye: Vec3::new(
                0.0,
                options.camera.eye_height,
                options.camera.eye_distance,
            ),
            target: Vec3::ZERO,
            up: Vec3::Y,
            aspect: context.config.width as f32
                / context.config.height.max(1) as f32,
            fovy: options.camera.fovy,
            znear: options.camera.znear,
            zfar: 10_000.0,
        };
        let camera_uniform = CameraUniform::new();
        let camera_buffer = context.device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("Camera Uniform"),
                contents: bytemuck::bytes_of(&camera_uniform),
                usage: wgpu::BufferUsages::UNIFORM
                    | wgpu::BufferUsages::COPY_DST,
            },
        );
        let camera_bind_group =
            renderer.create_camera_bind_group(&context.device, &camera_buffer);

        let depth_view = pipeline_helpers::create_depth_view(
            &context.device,
            context.config.width,
            context.config.height,
        );

        // Uninitialized → Ready: allocate the argument buffer (fixed
        // size, never reallocated), then perform the first resize below.
        let args = IndirectArgsBuffer::new(&context.device);

        let desired_count = options.instances.count;
        let target_fps = options.frame.target_fps;
        let mut engine = Self {
            context,
            options,
            camera,
            camera_uniform,
            camera_buffer,
            camera_bind_group,
            depth_view,
            mesh,
            instances: InstanceBuffers::new(),
            args,
            generator,
            renderer,
            instance_bind_group: None,
            desired_count,
            clock: FrameClock::new(target_fps),
            rng: StdRng::from_os_rng(),
        };

        engine.apply_instance_count();
        engine
    }

    /// Request a new desired instance count. Non-finite or sub-1 values
    /// clamp to 1; values beyond the supported maximum clamp down. The
    /// change is applied at the start of the next frame.
    pub fn set_instance_count(&mut self, desired: f64) {
        self.desired_count = clamp_instance_count(desired);
    }

    /// The currently requested (pre-rounding) instance count.
    #[must_use]
    pub fn desired_instance_count(&self) -> u32 {
        self.desired_count
    }

    /// The applied (clamped, power-of-two) instance count.
    #[must_use]
    pub fn applied_instance_count(&self) -> u32 {
        self.instances.count()
    }

    /// Smoothed frames-per-second estimate.
    #[must_use]
    pub fn fps(&self) -> f32 {
        self.clock.fps()
    }

    /// Whether the frame limiter allows rendering now.
    #[must_use]
    pub fn should_render(&self) -> bool {
        self.clock.should_render()
    }

    /// Handle a window resize.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.context.resize(width, height);
        self.camera.aspect = width as f32 / height.max(1) as f32;
        self.depth_view = pipeline_helpers::create_depth_view(
            &self.context.device,
            width,
            height,
        );
    }

    /// Render one frame to the surface.
    ///
    /// # Errors
    ///
    /// Returns [`wgpu::SurfaceError`] when the swapchain texture cannot
    /// be acquired; the caller decides whether to reconfigure or exit.
    pub fn render_frame(&mut self) -> Result<(), wgpu::SurfaceError> {
        let frame = self.context.get_next_frame()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.draw_frame(&view);
        frame.present();
        Ok(())
    }

    /// Encode and submit one frame into the given color target: apply any
    /// pending resize, dispatch the attribute generator, then issue the
    /// indirect draw.
    ///
    /// Ordering invariant: the compute pass is encoded before the render
    /// pass in one encoder and both are submitted together; wgpu executes
    /// passes in submission order on a queue, so the draw reads the
    /// positions this frame's dispatch wrote without any CPU-side
    /// synchronization.
    pub fn draw_frame(&mut self, view: &wgpu::TextureView) {
        self.apply_instance_count();
        self.update_camera();

        let mut encoder = self.context.create_encoder();

        self.generator.dispatch(
            &mut encoder,
            &self.context.queue,
            self.instances.count(),
            self.clock.elapsed(),
        );

        {
            let mut render_pass =
                encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Instanced Mesh Pass"),
                    color_attachments: &[Some(
                        wgpu::RenderPassColorAttachment {
                            view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Clear(wgpu::Color {
                                    r: 0.01,
                                    g: 0.01,
                                    b: 0.02,
                                    a: 1.0,
                                }),
                                store: wgpu::StoreOp::Store,
                            },
                            depth_slice: None,
                        },
                    )],
                    depth_stencil_attachment: Some(
                        wgpu::RenderPassDepthStencilAttachment {
                            view: &self.depth_view,
                            depth_ops: Some(wgpu::Operations {
                                load: wgpu::LoadOp::Clear(1.0),
                                store: wgpu::StoreOp::Store,
                            }),
                            stencil_ops: None,
                        },
                    ),
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });

            if let (Some(instance_bind_group), Some(args)) =
                (&self.instance_bind_group, self.args.buffer())
            {
                self.renderer.draw(
                    &mut render_pass,
                    &self.mesh,
                    &self.camera_bind_group,
                    instance_bind_group,
                    args,
                );
            }
        }

        self.context.submit(encoder);
        self.clock.end_frame();
    }

    /// Ready → Released: destroy the position, color, and argument
    /// buffers. Each release is idempotent; a subsequent resize
    /// reallocates cleanly.
    pub fn release(&mut self) {
        self.instance_bind_group = None;
        self.instances.release();
        self.args.release();
    }

    /// Apply a pending instance-count change. When the rounded count
    /// differs from the allocated one, the buffer set is replaced and
    /// everything derived from it is refreshed: indirect args, the
    /// generator and draw bind groups, and the mesh's bounding volume
    /// (expanded to the fixed procedural box, since the engine never sees
    /// the kernel's output on the CPU).
    fn apply_instance_count(&mut self) {
        let generation = self.instances.allocation_generation();
        let applied = self.instances.ensure_capacity(
            &self.context.device,
            &self.context.queue,
            self.desired_count,
            &mut self.rng,
        );
        if self.instances.allocation_generation() == generation {
            return;
        }

        self.args.write(
            &self.context.queue,
            IndirectArgs::for_submesh(Some(&self.mesh), applied),
        );
        if let (Some(position), Some(color)) =
            (self.instances.position(), self.instances.color())
        {
            self.generator
                .bind_position_buffer(&self.context.device, position);
            self.instance_bind_group =
                Some(self.renderer.create_instance_bind_group(
                    &self.context.device,
                    position,
                    color,
                ));
        }
        self.mesh.set_bounds(Bounds::procedural_instances());
    }

    /// Upload the camera uniform for this frame. The far plane tracks the
    /// mesh's (expanded) bounding volume so procedural instances never
    /// clip against it.
    fn update_camera(&mut self) {
        self.camera.zfar = (self.mesh.bounds().radius() * 2.0)
            .max(self.camera.znear + 1.0);
        self.camera_uniform.update_view_proj(&self.camera);
        self.context.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::bytes_of(&self.camera_uniform),
        );
    }
}
