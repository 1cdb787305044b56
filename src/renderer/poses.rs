use crate::fixtures::models::PoseDeg;
use crate::models::PoseRef;

/// Built-in named poses, degrees relative to the calibrated zero point.
const NAMED_POSES: &[(&str, f32, f32)] = &[
    ("home", 0.0, 0.0),
    ("center", 0.0, 0.0),
    ("forward", 0.0, 0.0),
    ("audience", 0.0, -20.0),
    ("up", 0.0, 90.0),
    ("ceiling", 0.0, 90.0),
    ("down", 0.0, -60.0),
    ("floor", 0.0, -60.0),
    ("stage_left", -90.0, 0.0),
    ("stage_right", 90.0, 0.0),
    ("backdrop", 180.0, 20.0),
];

pub fn named_pose(name: &str) -> Option<PoseDeg> {
    let key = name.trim().to_ascii_lowercase();
    NAMED_POSES
        .iter()
        .find(|(n, _, _)| *n == key)
        .map(|(_, pan, tilt)| PoseDeg::new(*pan, *tilt))
}

/// Resolve a pose reference; unknown names fall back to `fallback`.
pub fn resolve_pose(pose: Option<&PoseRef>, fallback: PoseDeg) -> PoseDeg {
    match pose {
        None => fallback,
        Some(PoseRef::Explicit { pan_deg, tilt_deg }) => PoseDeg::new(*pan_deg, *tilt_deg),
        Some(PoseRef::Named(name)) => named_pose(name).unwrap_or_else(|| {
            log::warn!("[renderer] unknown pose '{}', using resting pose", name);
            fallback
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_resolve_case_insensitively() {
        assert_eq!(named_pose("Ceiling"), Some(PoseDeg::new(0.0, 90.0)));
        assert_eq!(named_pose("nowhere"), None);
    }

    #[test]
    fn explicit_and_unknown_poses() {
        let fallback = PoseDeg::new(5.0, 5.0);
        let explicit = PoseRef::Explicit {
            pan_deg: -30.0,
            tilt_deg: 10.0,
        };
        assert_eq!(resolve_pose(Some(&explicit), fallback), PoseDeg::new(-30.0, 10.0));
        assert_eq!(
            resolve_pose(Some(&PoseRef::Named("moon".into())), fallback),
            fallback
        );
        assert_eq!(resolve_pose(None, fallback), fallback);
    }
}
