use crate::models::{
    ChannelValue, ColorValue, CurveSpec, CustomCurve, NativeCurve, NativeKind, OverlayValue,
    SectionOverlay,
};

/// Appearance channels for one section, resolved once and cloned per effect.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedOverlay {
    pub shutter: Option<ChannelValue>,
    pub color: Option<ColorValue>,
    pub gobo: Option<ChannelValue>,
}

fn curve_value(spec: &CurveSpec) -> ChannelValue {
    match spec {
        CurveSpec::Points { points } => ChannelValue::Custom(CustomCurve::new(points.clone())),
        CurveSpec::Native {
            kind: NativeKind::Ramp,
            min,
            max,
            ..
        } => ChannelValue::Native(NativeCurve::ramp(*min, *max)),
        CurveSpec::Native {
            kind,
            min,
            max,
            cycles,
        } => ChannelValue::Native(NativeCurve::periodic(*kind, *min, *max, *cycles)),
    }
}

fn channel_value(section_id: &str, channel: &str, value: &OverlayValue) -> Option<ChannelValue> {
    match value {
        OverlayValue::Static(v) => Some(ChannelValue::Static(*v)),
        OverlayValue::Curve(spec) => Some(curve_value(spec)),
        OverlayValue::Rgb(rgb) => {
            log::warn!(
                "[renderer] section {}: rgb {:?} is not valid for {}, ignoring",
                section_id,
                rgb,
                channel
            );
            None
        }
    }
}

pub fn resolve_overlay(section_id: &str, overlay: Option<&SectionOverlay>) -> ResolvedOverlay {
    let Some(overlay) = overlay else {
        return ResolvedOverlay::default();
    };
    ResolvedOverlay {
        shutter: overlay
            .shutter
            .as_ref()
            .and_then(|v| channel_value(section_id, "shutter", v)),
        color: overlay.color.as_ref().map(|v| match v {
            OverlayValue::Rgb(rgb) => ColorValue::Rgb(*rgb),
            OverlayValue::Static(slot) => ColorValue::Wheel(ChannelValue::Static(*slot)),
            OverlayValue::Curve(spec) => ColorValue::Wheel(curve_value(spec)),
        }),
        gobo: overlay
            .gobo
            .as_ref()
            .and_then(|v| channel_value(section_id, "gobo", v)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CurvePoint;

    #[test]
    fn every_overlay_form_resolves() {
        let overlay = SectionOverlay {
            shutter: Some(OverlayValue::Static(200)),
            color: Some(OverlayValue::Rgb([1, 2, 3])),
            gobo: Some(OverlayValue::Curve(CurveSpec::Native {
                kind: NativeKind::Ramp,
                min: 0.0,
                max: 60.0,
                cycles: 1.0,
            })),
        };
        let resolved = resolve_overlay("verse", Some(&overlay));
        assert_eq!(resolved.shutter, Some(ChannelValue::Static(200)));
        assert_eq!(resolved.color, Some(ColorValue::Rgb([1, 2, 3])));
        assert_eq!(resolved.gobo.as_ref().map(|g| g.end_value()), Some(60.0));
    }

    #[test]
    fn rgb_on_a_plain_channel_is_dropped() {
        let overlay = SectionOverlay {
            shutter: Some(OverlayValue::Rgb([9, 9, 9])),
            color: Some(OverlayValue::Curve(CurveSpec::Points {
                points: vec![CurvePoint::new(0.0, 10.0), CurvePoint::new(1.0, 20.0)],
            })),
            gobo: None,
        };
        let resolved = resolve_overlay("chorus", Some(&overlay));
        assert_eq!(resolved.shutter, None);
        assert!(matches!(
            resolved.color,
            Some(ColorValue::Wheel(ChannelValue::Custom(_)))
        ));
        assert_eq!(resolve_overlay("x", None), ResolvedOverlay::default());
    }
}
