use rand::Rng;

use super::attributes::{seed_ring_attributes, InstanceAttribute};

/// Upper bound on the applied instance count (2^24). Requests above this
/// clamp down before rounding.
pub const MAX_INSTANCE_COUNT: u32 = 1 << 24;

/// Round `n` to the nearest power of two. Exact powers map to themselves;
/// the midpoint between two powers rounds up.
#[must_use]
pub fn closest_power_of_two(n: u32) -> u32 {
    if n <= 1 {
        return 1;
    }
    if n >= 1 << 31 {
        return 1 << 31;
    }
    let lower = 1u32 << (31 - n.leading_zeros());
    if n == lower {
        return lower;
    }
    let upper = lower << 1;
    if n - lower < upper - n {
        lower
    } else {
        upper
    }
}

/// Clamp a requested instance count to the supported range: non-finite
/// or sub-1 requests clamp to 1, requests above [`MAX_INSTANCE_COUNT`]
/// clamp down. This is the single clamping policy; everything that
/// accepts a count request goes through here.
#[must_use]
pub fn clamp_instance_count(desired: f64) -> u32 {
    if !desired.is_finite() || desired < 1.0 {
        return 1;
    }
    desired.min(f64::from(MAX_INSTANCE_COUNT)) as u32
}

/// Normalize a requested instance count to the count that will actually
/// be applied: [`clamp_instance_count`] followed by rounding to the
/// nearest power of two (ties up).
#[must_use]
pub fn applied_instance_count(desired: f64) -> u32 {
    closest_power_of_two(clamp_instance_count(desired))
}

/// Owns the position and color attribute buffers and applies instance-count
/// changes: release, reallocate, reseed, upload.
///
/// Buffer length is always exactly `count() × 16` bytes — the dispatch
/// bound and the shaders' `arrayLength` both rely on it, so this
/// deliberately never over-allocates the way a grow-only buffer would.
pub struct InstanceBuffers {
    position: Option<wgpu::Buffer>,
    color: Option<wgpu::Buffer>,
    applied_count: u32,
    allocations: u64,
}

impl Default for InstanceBuffers {
    fn default() -> Self {
        Self::new()
    }
}

impl InstanceBuffers {
    /// Empty buffer set; nothing is allocated until the first
    /// [`ensure_capacity`](Self::ensure_capacity).
    #[must_use]
    pub fn new() -> Self {
        Self {
            position: None,
            color: None,
            applied_count: 0,
            allocations: 0,
        }
    }

    /// Ensure the buffers hold exactly the applied (clamped, rounded)
    /// count for `desired`, returning that count.
    ///
    /// When the applied count already matches the allocated buffers this
    /// is a no-op. Otherwise the old buffers are destroyed, new ones are
    /// allocated and seeded with fresh ring attributes from `rng`, and
    /// both arrays are uploaded in one `write_buffer` each. The caller is
    /// responsible for refreshing anything derived from the old buffers
    /// (indirect args, bind groups, mesh bounds); a change is observable
    /// through [`allocation_generation`](Self::allocation_generation).
    ///
    /// Device out-of-memory surfaces through wgpu's uncaptured-error
    /// handler and is fatal; there is no in-band recovery path.
    pub fn ensure_capacity<R: Rng>(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        desired: u32,
        rng: &mut R,
    ) -> u32 {
        let applied = applied_instance_count(f64::from(desired));
        if applied == self.applied_count && self.position.is_some() {
            return applied;
        }

        self.release();

        let size = u64::from(applied)
            * size_of::<InstanceAttribute>() as u64;
        let usage = wgpu::BufferUsages::STORAGE
            | wgpu::BufferUsages::COPY_DST
            | wgpu::BufferUsages::COPY_SRC;
        let position = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Instance Position Buffer"),
            size,
            usage,
            mapped_at_creation: false,
        });
        let color = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Instance Color Buffer"),
            size,
            usage,
            mapped_at_creation: false,
        });

        let (positions, colors) = seed_ring_attributes(applied, rng);
        queue.write_buffer(&position, 0, bytemuck::cast_slice(&positions));
        queue.write_buffer(&color, 0, bytemuck::cast_slice(&colors));

        log::info!(
            "instance buffers reallocated: {} -> {} instances ({} KiB per stream)",
            self.applied_count,
            applied,
            size / 1024
        );

        self.position = Some(position);
        self.color = Some(color);
        self.applied_count = applied;
        self.allocations += 1;
        applied
    }

    /// The last-applied instance count (0 before the first allocation or
    /// after release).
    #[must_use]
    pub fn count(&self) -> u32 {
        self.applied_count
    }

    /// The position attribute buffer, if allocated.
    #[must_use]
    pub fn position(&self) -> Option<&wgpu::Buffer> {
        self.position.as_ref()
    }

    /// The color attribute buffer, if allocated.
    #[must_use]
    pub fn color(&self) -> Option<&wgpu::Buffer> {
        self.color.as_ref()
    }

    /// Monotonic counter incremented on every reallocation. Callers
    /// compare it across `ensure_capacity` to detect buffer replacement
    /// (and verify no-op resizes in tests).
    #[must_use]
    pub fn allocation_generation(&self) -> u64 {
        self.allocations
    }

    /// Destroy both buffers. Idempotent; a later `ensure_capacity`
    /// reallocates cleanly.
    pub fn release(&mut self) {
        if let Some(buffer) = self.position.take() {
            buffer.destroy();
        }
        if let Some(buffer) = self.color.take() {
            buffer.destroy();
        }
        self.applied_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closest_power_of_two_exact_powers_unchanged() {
        for shift in 0..24 {
            let p = 1u32 << shift;
            assert_eq!(closest_power_of_two(p), p);
        }
    }

    #[test]
    fn test_closest_power_of_two_rounds_to_nearest() {
        assert_eq!(closest_power_of_two(3), 4);
        assert_eq!(closest_power_of_two(5), 4);
        assert_eq!(closest_power_of_two(7), 8);
        assert_eq!(closest_power_of_two(1000), 1024);
        assert_eq!(closest_power_of_two(1500), 1024);
    }

    #[test]
    fn test_closest_power_of_two_ties_round_up() {
        // 96 is exactly between 64 and 128.
        assert_eq!(closest_power_of_two(96), 128);
        assert_eq!(closest_power_of_two(6), 8);
    }

    #[test]
    fn test_applied_count_clamps_degenerate_requests() {
        // Any non-finite request silently clamps to 1, infinities
        // included; only finite requests beyond the maximum clamp down.
        assert_eq!(applied_instance_count(0.0), 1);
        assert_eq!(applied_instance_count(-5.0), 1);
        assert_eq!(applied_instance_count(f64::NAN), 1);
        assert_eq!(applied_instance_count(f64::INFINITY), 1);
        assert_eq!(applied_instance_count(f64::NEG_INFINITY), 1);
        assert_eq!(applied_instance_count(1.0), 1);
        assert_eq!(applied_instance_count(1e12), MAX_INSTANCE_COUNT);
    }

    #[test]
    fn test_clamp_and_rounding_compose() {
        for desired in [f64::NAN, -1.0, 0.5, 1.0, 1000.0, 5_000_000.0, 1e12]
        {
            assert_eq!(
                applied_instance_count(desired),
                closest_power_of_two(clamp_instance_count(desired))
            );
        }
        assert_eq!(clamp_instance_count(f64::INFINITY), 1);
        assert_eq!(clamp_instance_count(1e12), MAX_INSTANCE_COUNT);
        // Clamping alone does not round.
        assert_eq!(clamp_instance_count(1000.0), 1000);
    }

    #[test]
    fn test_applied_count_demo_maximum() {
        // The documented demo range tops out at 5,000,000, which is
        // nearer to 2^22 than to 2^23.
        assert_eq!(applied_instance_count(5_000_000.0), 4_194_304);
    }
}
