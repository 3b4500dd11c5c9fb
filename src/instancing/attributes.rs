use std::f32::consts::TAU;

use rand::Rng;

/// One per-instance attribute record: 16 bytes on the GPU, matching the
/// `InstanceAttribute` struct in `assets/shaders/modules/instance.wgsl`.
///
/// Reused for both attribute streams: position + size (`xyz` = world
/// position, `w` = uniform scale) and color + alpha (`xyz` = linear rgb,
/// `w` = alpha).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceAttribute {
    /// Position or color, depending on the stream.
    pub xyz: [f32; 3],
    /// Uniform scale or alpha, depending on the stream.
    pub w: f32,
}

/// Generate initial attributes for `count` instances: positions scattered
/// on a ring (angle in [0, 2π), radius in [20, 100], height in [-2, 2],
/// size in [0.05, 0.25]) and random RGB colors with alpha 1.
///
/// The generator is injected so tests can seed it; production callers
/// pass an OS-seeded RNG and get a fresh scatter per reallocation.
pub fn seed_ring_attributes<R: Rng>(
    count: u32,
    rng: &mut R,
) -> (Vec<InstanceAttribute>, Vec<InstanceAttribute>) {
    let n = count as usize;
    let mut positions = Vec::with_capacity(n);
    let mut colors = Vec::with_capacity(n);

    for _ in 0..n {
        let angle = rng.random_range(0.0..TAU);
        let radius = rng.random_range(20.0f32..=100.0);
        let height = rng.random_range(-2.0f32..=2.0);
        let size = rng.random_range(0.05f32..=0.25);
        positions.push(InstanceAttribute {
            xyz: [angle.sin() * radius, height, angle.cos() * radius],
            w: size,
        });
        colors.push(InstanceAttribute {
            xyz: [rng.random(), rng.random(), rng.random()],
            w: 1.0,
        });
    }

    (positions, colors)
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn test_attribute_record_is_16_bytes() {
        assert_eq!(size_of::<InstanceAttribute>(), 16);
    }

    #[test]
    fn test_seeded_values_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let (positions, colors) = seed_ring_attributes(4096, &mut rng);
        assert_eq!(positions.len(), 4096);
        assert_eq!(colors.len(), 4096);

        for p in &positions {
            let radius = (p.xyz[0] * p.xyz[0] + p.xyz[2] * p.xyz[2]).sqrt();
            assert!(
                (20.0 - 1e-3..=100.0 + 1e-3).contains(&radius),
                "radius {radius} outside ring"
            );
            assert!((-2.0..=2.0).contains(&p.xyz[1]));
            assert!((0.05..=0.25).contains(&p.w));
        }
        for c in &colors {
            assert!(c.xyz.iter().all(|&ch| (0.0..=1.0).contains(&ch)));
            assert_eq!(c.w, 1.0);
        }
    }

    #[test]
    fn test_seeding_is_deterministic_for_a_fixed_seed() {
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        assert_eq!(
            seed_ring_attributes(256, &mut a),
            seed_ring_attributes(256, &mut b)
        );
    }
}
