use std::fs;
use std::path::Path;

use crate::error::{RenderError, RenderResult};
use crate::fixtures::models::FixtureGroup;

/// Load a fixture group from a JSON file and fill in the built-in groups.
pub fn load_fixture_group(path: &Path) -> RenderResult<FixtureGroup> {
    let content = fs::read_to_string(path).map_err(|source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_fixture_group(&content)
}

pub fn parse_fixture_group(content: &str) -> RenderResult<FixtureGroup> {
    let mut group: FixtureGroup = serde_json::from_str(content)?;
    group.fill_semantic_groups();
    Ok(group)
}

/// Resolve a target spec into fixture ids, in stage (left to right) order.
///
/// Accepted forms: `ALL`, semantic group names, `A-B` ranges over fixture ids
/// or 1-based positions, comma separated lists, and single fixture ids.
pub fn resolve_targets(spec: &str, group: &FixtureGroup) -> RenderResult<Vec<String>> {
    let spec = spec.trim();
    if spec.is_empty() {
        return Err(RenderError::invalid_target(spec, "empty target"));
    }

    let mut indices: Vec<usize> = Vec::new();
    for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        indices.extend(resolve_part(part, group)?);
    }

    indices.sort_unstable();
    indices.dedup();
    Ok(indices
        .into_iter()
        .map(|i| group.fixtures[i].id.clone())
        .collect())
}

fn resolve_part(part: &str, group: &FixtureGroup) -> RenderResult<Vec<usize>> {
    if part.eq_ignore_ascii_case("all") {
        return Ok((0..group.len()).collect());
    }

    if let Some(idx) = group.index_of(part) {
        return Ok(vec![idx]);
    }

    if let Some((_, members)) = group
        .groups
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(part))
    {
        return members
            .iter()
            .map(|id| {
                group
                    .index_of(id)
                    .ok_or_else(|| RenderError::UnknownTarget(id.clone()))
            })
            .collect();
    }

    if let Some((from, to)) = part.split_once('-') {
        let from_idx = resolve_endpoint(from.trim(), group)
            .ok_or_else(|| RenderError::UnknownTarget(from.trim().to_string()))?;
        let to_idx = resolve_endpoint(to.trim(), group)
            .ok_or_else(|| RenderError::UnknownTarget(to.trim().to_string()))?;
        let (lo, hi) = if from_idx <= to_idx {
            (from_idx, to_idx)
        } else {
            (to_idx, from_idx)
        };
        return Ok((lo..=hi).collect());
    }

    Err(RenderError::UnknownTarget(part.to_string()))
}

fn resolve_endpoint(token: &str, group: &FixtureGroup) -> Option<usize> {
    if let Some(idx) = group.index_of(token) {
        return Some(idx);
    }
    token
        .parse::<usize>()
        .ok()
        .filter(|n| *n >= 1 && *n <= group.len())
        .map(|n| n - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::models::FixtureConfig;
    use std::io::Write;

    fn group() -> FixtureGroup {
        FixtureGroup::new(
            (1..=6)
                .map(|i| FixtureConfig::new(format!("MH{}", i)))
                .collect(),
        )
    }

    #[test]
    fn all_expands_to_every_fixture() {
        let ids = resolve_targets("ALL", &group()).unwrap();
        assert_eq!(ids.len(), 6);
        assert_eq!(ids[0], "MH1");
    }

    #[test]
    fn groups_ranges_and_lists_resolve() {
        let g = group();
        assert_eq!(resolve_targets("left", &g).unwrap(), vec!["MH1", "MH2", "MH3"]);
        assert_eq!(resolve_targets("MH2-MH4", &g).unwrap(), vec!["MH2", "MH3", "MH4"]);
        assert_eq!(resolve_targets("5-6", &g).unwrap(), vec!["MH5", "MH6"]);
        assert_eq!(resolve_targets("MH6, MH1,MH6", &g).unwrap(), vec!["MH1", "MH6"]);
        assert_eq!(resolve_targets("EVEN", &g).unwrap(), vec!["MH2", "MH4", "MH6"]);
    }

    #[test]
    fn ids_containing_dashes_win_over_ranges() {
        let g = FixtureGroup::new(vec![
            FixtureConfig::new("mh-1"),
            FixtureConfig::new("mh-2"),
        ]);
        assert_eq!(resolve_targets("mh-2", &g).unwrap(), vec!["mh-2"]);
    }

    #[test]
    fn unknown_targets_are_errors() {
        let g = group();
        assert!(matches!(
            resolve_targets("MH9", &g),
            Err(RenderError::UnknownTarget(id)) if id == "MH9"
        ));
        assert!(matches!(
            resolve_targets("MH1-MH9", &g),
            Err(RenderError::UnknownTarget(_))
        ));
        assert!(resolve_targets("  ", &g).is_err());
    }

    #[test]
    fn loads_group_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"fixtures":[{{"id":"A"}},{{"id":"B"}}],"groups":{{"stage_left":["A"]}}}}"#
        )
        .unwrap();

        let g = load_fixture_group(file.path()).unwrap();
        assert_eq!(g.len(), 2);
        assert_eq!(resolve_targets("stage_left", &g).unwrap(), vec!["A"]);
        assert_eq!(resolve_targets("right", &g).unwrap(), vec!["B"]);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_fixture_group(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
