use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::{GeometryParams, GeometryTransform, Symmetry};
use crate::fixtures::layout::FixtureSlot;
use crate::models::MovementSpec;

const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// Stable across runs and platforms, unlike `DefaultHasher`.
fn seed_from_targets(targets: &[String]) -> u64 {
    let mut sorted: Vec<&str> = targets.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    let mut hash = FNV_OFFSET;
    for id in sorted {
        for byte in id.bytes().chain(std::iter::once(0u8)) {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(FNV_PRIME);
        }
    }
    hash
}

/// Reproducible pseudo-random scatter.
///
/// Only the static mode exists: `mode: "dynamic"` with `reseed_every_bars`
/// is accepted but renders exactly like static.
pub struct ScatteredChaos;

impl GeometryTransform for ScatteredChaos {
    fn id(&self) -> &'static str {
        "scattered_chaos"
    }

    fn symmetry(&self) -> Symmetry {
        Symmetry::Asymmetric
    }

    fn distribute(
        &self,
        targets: &[String],
        slots: &[FixtureSlot],
        base: &MovementSpec,
        params: &GeometryParams,
    ) -> Vec<MovementSpec> {
        let max_pan = params.f32_or("max_pan_deg", 30.0).abs();
        let max_tilt = params.f32_or("max_tilt_deg", 15.0).abs();
        if params.str_or("mode", "static") == "dynamic" || params.contains("reseed_every_bars") {
            log::warn!("[geometry] scattered_chaos: dynamic reseeding is not supported, rendering static scatter");
        }

        let seed = params
            .u64_opt("seed")
            .unwrap_or_else(|| seed_from_targets(targets));
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        slots
            .iter()
            .map(|_| {
                let pan = rng.gen_range(-1.0f32..=1.0) * max_pan;
                let tilt = rng.gen_range(-1.0f32..=1.0) * max_tilt;
                base.clone()
                    .with_pan_offset_deg(base.pan_offset_deg() + pan)
                    .with_tilt_offset_deg(base.tilt_offset_deg() + tilt)
            })
            .collect()
    }
}
