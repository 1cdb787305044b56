/// Where a fixture sits within an ordered selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixtureSlot {
    pub index: usize,
    pub count: usize,
    /// 0.0 (leftmost) to 1.0 (rightmost); a lone fixture sits at 0.5.
    pub position: f32,
    /// -1.0 (left edge) to +1.0 (right edge), 0.0 at the centre.
    pub signed_distance: f32,
}

impl FixtureSlot {
    pub fn distance_from_center(&self) -> f32 {
        self.signed_distance.abs()
    }

    /// -1 for the left half, +1 for the right half, 0 for an exact centre.
    pub fn side(&self) -> f32 {
        if self.signed_distance.abs() < 1e-6 {
            0.0
        } else {
            self.signed_distance.signum()
        }
    }
}

/// Evenly distribute `count` fixtures across the normalized stage width.
pub fn compute_slots(count: usize) -> Vec<FixtureSlot> {
    (0..count)
        .map(|index| {
            let position = if count <= 1 {
                0.5
            } else {
                index as f32 / (count - 1) as f32
            };
            FixtureSlot {
                index,
                count,
                position,
                signed_distance: (position - 0.5) * 2.0,
            }
        })
        .collect()
}

/// Piecewise-linear lookup of a normalized position in an evenly spaced preset.
pub fn interpolate_preset(preset: &[f32], position: f32) -> f32 {
    match preset.len() {
        0 => 0.0,
        1 => preset[0],
        len => {
            let x = position.clamp(0.0, 1.0) * (len - 1) as f32;
            let lower = (x.floor() as usize).min(len - 2);
            let frac = x - lower as f32;
            preset[lower] + (preset[lower + 1] - preset[lower]) * frac
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_span_the_stage() {
        let slots = compute_slots(4);
        let positions: Vec<f32> = slots.iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![0.0, 1.0 / 3.0, 2.0 / 3.0, 1.0]);
        assert_eq!(slots[0].signed_distance, -1.0);
        assert_eq!(slots[3].signed_distance, 1.0);
        assert_eq!(slots[0].side(), -1.0);
    }

    #[test]
    fn single_fixture_is_centred() {
        let slots = compute_slots(1);
        assert_eq!(slots[0].position, 0.5);
        assert_eq!(slots[0].signed_distance, 0.0);
        assert_eq!(slots[0].side(), 0.0);
    }

    #[test]
    fn preset_interpolation_hits_knots_and_midpoints() {
        let preset = [-30.0, -10.0, 10.0, 30.0];
        assert_eq!(interpolate_preset(&preset, 0.0), -30.0);
        assert_eq!(interpolate_preset(&preset, 1.0), 30.0);
        assert!((interpolate_preset(&preset, 0.5) - 0.0).abs() < 1e-5);
        assert!((interpolate_preset(&preset, 1.0 / 6.0) + 20.0).abs() < 1e-4);
    }
}
