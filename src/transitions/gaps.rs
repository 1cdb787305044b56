use crate::models::{GapSegment, GapType, SequencedEffect};

/// Idle intervals of one fixture over [0, song_duration_ms].
///
/// `effects` must be sorted by start. Gaps shorter than `min_gap_ms` are
/// treated as noise and not reported.
pub fn detect_gaps(
    effects: &[SequencedEffect],
    song_duration_ms: u64,
    min_gap_ms: u64,
) -> Vec<GapSegment> {
    let min_gap_ms = min_gap_ms.max(1);
    if effects.is_empty() {
        if song_duration_ms == 0 {
            return Vec::new();
        }
        return vec![GapSegment {
            start_ms: 0,
            end_ms: song_duration_ms,
            section_id: String::new(),
            gap_type: GapType::Start,
        }];
    }

    let mut gaps = Vec::new();
    let mut cursor = 0u64;
    let mut previous: Option<&SequencedEffect> = None;

    for effect in effects {
        if effect.start_ms >= cursor + min_gap_ms {
            gaps.push(GapSegment {
                start_ms: cursor,
                end_ms: effect.start_ms,
                section_id: effect.boundary.section_id.clone(),
                gap_type: if previous.is_some() {
                    GapType::InterSection
                } else {
                    GapType::Start
                },
            });
        }
        cursor = cursor.max(effect.end_ms);
        previous = Some(effect);
    }

    if song_duration_ms >= cursor + min_gap_ms {
        gaps.push(GapSegment {
            start_ms: cursor,
            end_ms: song_duration_ms,
            section_id: previous
                .map(|e| e.boundary.section_id.clone())
                .unwrap_or_default(),
            gap_type: GapType::End,
        });
    }
    gaps
}

/// Trim overlaps so the timeline is time-disjoint; a later effect wins over
/// the tail of an earlier one. Fully covered effects are dropped.
///
/// A trimmed effect keeps the values it had over its remaining span; native
/// curves are baked into `curve_points` custom points to do so.
pub fn resolve_overlaps(mut effects: Vec<SequencedEffect>, curve_points: usize) -> Vec<SequencedEffect> {
    effects.sort_by_key(|e| e.start_ms);
    let mut out: Vec<SequencedEffect> = Vec::with_capacity(effects.len());
    for effect in effects {
        if effect.end_ms <= effect.start_ms {
            continue;
        }
        while let Some(last) = out.last_mut() {
            if last.end_ms <= effect.start_ms {
                break;
            }
            if last.start_ms >= effect.start_ms {
                log::debug!(
                    "[transitions] {}: '{}' at {} ms fully replaced by '{}'",
                    last.fixture_id,
                    last.label,
                    last.start_ms,
                    effect.label
                );
                out.pop();
                continue;
            }
            let ratio = (effect.start_ms - last.start_ms) as f32 / (last.end_ms - last.start_ms) as f32;
            last.channels = last.channels.truncated(ratio, curve_points);
            last.end_ms = effect.start_ms;
            break;
        }
        out.push(effect);
    }
    out
}
