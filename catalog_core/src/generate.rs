//! Artifact generation: master maps from classification output, and
//! master map / headers / package indices from descriptor rows.
//!
//! Generation never stops on bad data. Duplicate keys keep their first
//! occurrence and leave a marker line in the artifact so the result can
//! still be diffed and reviewed.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::PathBuf;

use compat_uqm::defines::{self, GENERATED_BANNER};
use compat_uqm::descriptor::{DescriptorRow, ABSENT};
use compat_uqm::ls2;
use compat_uqm::rmp;

use crate::classifier::{Classification, Classifier};
use crate::config::CatalogConfig;
use crate::diagnostics::{Diagnostic, Report};
use crate::error::CatalogError;
use crate::registry::{MasterMap, MasterMapEntry, Package, PackageIndexEntry};
use crate::resource_number::{ResourceNumber, ResourceType, UNKNOWN_RES};

pub const NO_MATCH_MARKER: &str = "# NO MATCH FOR";
pub const DUPLICATE_KEY_MARKER: &str = "# ERROR: DUPLICATE KEY";

/// An asset path as it appears in a package index, with its type code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetRef {
    pub path: String,
    pub type_code: u32,
}

impl AssetRef {
    pub fn from_entry(entry: &PackageIndexEntry) -> Self {
        Self {
            path: entry.target.clone(),
            type_code: entry.number.res_type(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct GeneratedMap {
    pub map: MasterMap,
    /// Paths no rule matched, in input order.
    pub unmatched: Vec<String>,
    /// Dropped `(key, path)` pairs whose key was already taken.
    pub duplicates: Vec<(String, String)>,
}

impl GeneratedMap {
    /// Artifact text: placeholders first, then entries sorted by key, each
    /// followed by one marker per dropped duplicate of that key.
    pub fn lines(&self) -> Vec<String> {
        let mut unmatched = self.unmatched.clone();
        unmatched.sort();
        let mut lines: Vec<String> = unmatched
            .iter()
            .map(|path| format!("{} {}", NO_MATCH_MARKER, path))
            .collect();
        for entry in self.map.entries() {
            lines.push(entry.to_line());
            for (key, _) in self.duplicates.iter().filter(|(key, _)| *key == entry.key) {
                lines.push(format!("{} {}", DUPLICATE_KEY_MARKER, key));
            }
        }
        lines
    }
}

pub fn generate_master_map(
    assets: &[AssetRef],
    classifier: &Classifier,
    report: &mut Report,
) -> GeneratedMap {
    let mut generated = GeneratedMap::default();
    let mut seen_paths = HashSet::new();
    for asset in assets {
        if !seen_paths.insert(asset.path.as_str()) {
            continue;
        }
        let file_path = index_reference(&asset.path);
        let key = match classifier.classify(&asset.path) {
            Classification::Named(key) => key,
            Classification::NoMatch => {
                report.push(Diagnostic::NoClassification {
                    path: asset.path.clone(),
                });
                generated.unmatched.push(file_path);
                continue;
            }
        };
        let entry = MasterMapEntry {
            key: key.clone(),
            resource_type: ResourceType::name_for_code(asset.type_code).to_string(),
            file_path: file_path.clone(),
            line: 0,
        };
        if generated.map.insert(entry).is_err() {
            report.push(Diagnostic::DuplicateKey {
                key: key.clone(),
                path: file_path.clone(),
            });
            generated.duplicates.push((key, file_path));
        }
    }
    tracing::info!(
        entries = generated.map.len(),
        unmatched = generated.unmatched.len(),
        duplicates = generated.duplicates.len(),
        "generated master map"
    );
    generated
}

/// Index files are listed as `.lst` sources but shipped as `.ls2`.
fn index_reference(path: &str) -> String {
    match path.strip_suffix(".lst") {
        Some(stem) => format!("{}.ls2", stem),
        None => path.to_string(),
    }
}

/// Re-emits a package index with each target replaced by its classified key.
pub fn relabel_package(package: &Package, classifier: &Classifier) -> Vec<String> {
    package
        .entries()
        .iter()
        .map(|entry| {
            let (p, i, t) = entry.number.decode();
            let classification = classifier.classify(&entry.target);
            ls2::format_index_line(p, i, t, classification.name_or_placeholder())
        })
        .collect()
}

fn row_number(row: &DescriptorRow) -> ResourceNumber {
    ResourceNumber::encode(row.package, row.instance, row.res_type)
}

/// Text artifacts keyed by their path relative to the content or source tree.
#[derive(Clone, Debug, Default)]
pub struct Artifacts {
    pub master_map: Vec<String>,
    pub headers: BTreeMap<String, Vec<String>>,
    pub indices: BTreeMap<String, Vec<String>>,
}

impl Artifacts {
    /// Writes every artifact under the configured trees and returns the
    /// written paths in write order.
    pub fn write_to(&self, config: &CatalogConfig) -> Result<Vec<PathBuf>, CatalogError> {
        let mut targets = Vec::new();
        for (name, lines) in &self.indices {
            targets.push((config.content_dir.join(name), lines));
        }
        for (name, lines) in &self.headers {
            targets.push((config.source_dir.join(name), lines));
        }
        targets.push((config.master_map_path(), &self.master_map));
        let mut written = Vec::new();
        for (path, lines) in targets {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|err| CatalogError::io(parent, err))?;
            }
            let mut text = lines.join("\n");
            text.push('\n');
            fs::write(&path, text).map_err(|err| CatalogError::io(&path, err))?;
            tracing::info!(path = %path.display(), "wrote artifact");
            written.push(path);
        }
        Ok(written)
    }
}

pub fn generate_artifacts(rows: &[DescriptorRow], report: &mut Report) -> Artifacts {
    Artifacts {
        master_map: descriptor_master_map(rows, report),
        headers: descriptor_headers(rows),
        indices: descriptor_indices(rows),
    }
}

fn descriptor_indices(rows: &[DescriptorRow]) -> BTreeMap<String, Vec<String>> {
    let mut groups: BTreeMap<String, Vec<&DescriptorRow>> = BTreeMap::new();
    for row in rows {
        groups.entry(row.index_file.clone()).or_default().push(row);
    }
    groups
        .into_iter()
        .map(|(name, mut group)| {
            group.sort_by_key(|row| row_number(row));
            let lines = group
                .iter()
                .map(|row| {
                    let (p, i, t) = row_number(row).decode();
                    ls2::format_index_line(p, i, t, &row.res_id)
                })
                .collect();
            (name, lines)
        })
        .collect()
}

fn descriptor_headers(rows: &[DescriptorRow]) -> BTreeMap<String, Vec<String>> {
    let mut groups: BTreeMap<String, Vec<(&str, ResourceNumber)>> = BTreeMap::new();
    for row in rows {
        if let (Some(header), Some(constant)) = (&row.header_file, &row.constant) {
            groups
                .entry(header.clone())
                .or_default()
                .push((constant.as_str(), row_number(row)));
        }
    }
    groups
        .into_iter()
        .map(|(name, mut group)| {
            group.sort_by_key(|(_, number)| *number);
            let mut lines: Vec<String> = GENERATED_BANNER.iter().map(|l| l.to_string()).collect();
            lines.push(String::new());
            for (constant, number) in group {
                lines.push(defines::format_define(constant, &number.literal()));
            }
            (name, lines)
        })
        .collect()
}

fn descriptor_master_map(rows: &[DescriptorRow], report: &mut Report) -> Vec<String> {
    let mut mapped: Vec<&DescriptorRow> = rows.iter().filter(|row| row.file.is_some()).collect();
    mapped.sort_by(|a, b| a.res_id.cmp(&b.res_id));
    let mut lines = Vec::new();
    let mut previous: Option<(&str, String, &str)> = None;
    for row in mapped {
        let Some(file) = row.file.as_deref() else {
            continue;
        };
        let res_type = match &row.type_tag {
            Some(tag) => tag.clone(),
            None => {
                report.push(Diagnostic::UntypedDescriptor {
                    line: row.line,
                    res_id: row.res_id.clone(),
                });
                UNKNOWN_RES.to_string()
            }
        };
        if let Some((id, prev_type, prev_file)) = &previous {
            if *id == row.res_id {
                // Identical rows collapse into one line.
                if *prev_type != res_type || *prev_file != file {
                    report.push(Diagnostic::DuplicateKey {
                        key: row.res_id.clone(),
                        path: file.to_string(),
                    });
                    lines.push(format!("{} {}", DUPLICATE_KEY_MARKER, row.res_id));
                }
                continue;
            }
        }
        lines.push(rmp::format_map_line(&row.res_id, &res_type, file));
        previous = Some((row.res_id.as_str(), res_type, file));
    }
    lines
}

/// Updates descriptor type and file columns from the master map wherever the
/// map disagrees; returns the number of rows changed.
pub fn sync_descriptors(rows: &mut [DescriptorRow], map: &MasterMap, report: &mut Report) -> usize {
    let mut changed = 0;
    for row in rows.iter_mut() {
        let Some(entry) = map.get(&row.res_id) else {
            continue;
        };
        let current_type = row.type_tag.as_deref().unwrap_or(ABSENT);
        let current_file = row.file.as_deref().unwrap_or(ABSENT);
        if current_type == entry.resource_type && current_file == entry.file_path {
            continue;
        }
        report.push(Diagnostic::DescriptorSynced {
            line: row.line,
            res_id: row.res_id.clone(),
            from: format!("{}:{}", current_type, current_file),
            to: format!("{}:{}", entry.resource_type, entry.file_path),
        });
        row.type_tag = Some(entry.resource_type.clone());
        row.file = Some(entry.file_path.clone());
        changed += 1;
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticKind;
    use crate::registry::load_master_map;
    use compat_uqm::descriptor::parse_descriptors;

    fn asset(path: &str, type_code: u32) -> AssetRef {
        AssetRef {
            path: path.to_string(),
            type_code,
        }
    }

    #[test]
    fn duplicate_key_keeps_first_and_marks_once() {
        let mut report = Report::new();
        let generated = generate_master_map(
            &[
                asset("comm/arilou/arilou.ani", 2),
                asset("comm/arilou/arilou2.ani", 2),
            ],
            Classifier::builtin(),
            &mut report,
        );
        let lines = generated.lines();
        assert_eq!(
            lines,
            [
                "comm.arilou.graphics = GFXRES:comm/arilou/arilou.ani",
                "# ERROR: DUPLICATE KEY comm.arilou.graphics",
            ]
        );
        assert_eq!(report.count(DiagnosticKind::DuplicateKey), 1);
        assert_eq!(generated.map.len(), 1);
    }

    #[test]
    fn unmatched_paths_get_placeholders() {
        let mut report = Report::new();
        let generated = generate_master_map(
            &[asset("readme", 0), asset("lbm/title.ani", 2)],
            Classifier::builtin(),
            &mut report,
        );
        assert_eq!(
            generated.lines(),
            ["# NO MATCH FOR readme", "graphics.title = GFXRES:lbm/title.ani"]
        );
        assert_eq!(report.count(DiagnosticKind::NoClassification), 1);
    }

    #[test]
    fn repeated_paths_are_not_duplicates() {
        let mut report = Report::new();
        let generated = generate_master_map(
            &[asset("lbm/title.ani", 2), asset("lbm/title.ani", 2)],
            Classifier::builtin(),
            &mut report,
        );
        assert!(report.is_empty());
        assert_eq!(generated.lines().len(), 1);
    }

    #[test]
    fn index_lists_reference_ls2_files() {
        let mut report = Report::new();
        let generated = generate_master_map(&[asset("comm/arilou.lst", 7)], Classifier::builtin(), &mut report);
        assert_eq!(
            generated.lines(),
            ["comm.arilou.resources = RES_INDEX:comm/arilou.ls2"]
        );
    }

    #[test]
    fn generated_map_is_sorted_by_key() {
        let mut report = Report::new();
        let generated = generate_master_map(
            &[asset("lbm/zebra.ani", 2), asset("lbm/apple.ani", 2)],
            Classifier::builtin(),
            &mut report,
        );
        assert_eq!(
            generated.lines(),
            [
                "graphics.apple = GFXRES:lbm/apple.ani",
                "graphics.zebra = GFXRES:lbm/zebra.ani",
            ]
        );
    }

    #[test]
    fn relabel_uses_placeholder_for_no_match() {
        let mut package = Package::new("starcon.ls2");
        package.insert(PackageIndexEntry {
            number: ResourceNumber::encode(1, 4, 2),
            target: "lbm/title.ani".to_string(),
            line: 1,
        });
        package.insert(PackageIndexEntry {
            number: ResourceNumber::encode(1, 5, 0),
            target: "readme".to_string(),
            line: 2,
        });
        assert_eq!(
            relabel_package(&package, Classifier::builtin()),
            ["  1   4   2 graphics.title", "  1   5   0 ERROR"]
        );
    }

    const DESCRIPTORS: &str = "\
ships/arilou/resinst.h, ship/arilou.ls2, ARILOU_SMALL, 3, 14, 2, ship.arilou.graphics.skiff.small, GFXRES, arilou/skiff.sml
ships/arilou/resinst.h, ship/arilou.ls2, ARILOU_BIG_ICON, 3, 12, 2, ship.arilou.icons, GFXRES, arilou/bigicon.ani
--, starcon.ls2, --, 1, 4, 2, graphics.title, --, lbm/title.ani
uqm/resinst.h, starcon.ls2, ARILOU_LIST, 1, 2, 7, ship.arilou.resources, RES_INDEX, --
";

    #[test]
    fn descriptor_artifacts_are_grouped_and_sorted() {
        let rows = parse_descriptors(DESCRIPTORS).records;
        let mut report = Report::new();
        let artifacts = generate_artifacts(&rows, &mut report);

        assert_eq!(
            artifacts.indices["ship/arilou.ls2"],
            [
                "  3  12   2 ship.arilou.icons",
                "  3  14   2 ship.arilou.graphics.skiff.small",
            ]
        );
        assert_eq!(
            artifacts.indices["starcon.ls2"],
            ["  1   2   7 ship.arilou.resources", "  1   4   2 graphics.title"]
        );

        let header = &artifacts.headers["ships/arilou/resinst.h"];
        assert_eq!(header[..3], GENERATED_BANNER.map(str::to_string));
        assert_eq!(header[3], "");
        assert_eq!(header[4], "#define ARILOU_BIG_ICON 0x00600c02L");
        assert_eq!(header[5], "#define ARILOU_SMALL 0x00600e02L");
        assert!(!artifacts.headers.contains_key("--"));

        assert_eq!(
            artifacts.master_map,
            [
                "graphics.title = UNKNOWNRES:lbm/title.ani",
                "ship.arilou.graphics.skiff.small = GFXRES:arilou/skiff.sml",
                "ship.arilou.icons = GFXRES:arilou/bigicon.ani",
            ]
        );
        assert_eq!(report.count(DiagnosticKind::UntypedDescriptor), 1);
    }

    #[test]
    fn conflicting_descriptor_ids_are_marked() {
        let text = "\
a.h, a.ls2, A, 1, 1, 2, same.id, GFXRES, a.ani
b.h, b.ls2, B, 2, 1, 2, same.id, GFXRES, b.ani
c.h, c.ls2, C, 3, 1, 2, same.id, GFXRES, a.ani
";
        let rows = parse_descriptors(text).records;
        let mut report = Report::new();
        let artifacts = generate_artifacts(&rows, &mut report);
        assert_eq!(
            artifacts.master_map,
            [
                "same.id = GFXRES:a.ani",
                "# ERROR: DUPLICATE KEY same.id",
            ]
        );
        assert_eq!(report.count(DiagnosticKind::DuplicateKey), 1);
    }

    #[test]
    fn identical_descriptor_rows_collapse_without_marker() {
        let text = "\
a.h, a.ls2, A, 1, 1, 2, same.id, GFXRES, a.ani
b.h, b.ls2, B, 2, 1, 2, same.id, GFXRES, a.ani
";
        let rows = parse_descriptors(text).records;
        let mut report = Report::new();
        let artifacts = generate_artifacts(&rows, &mut report);
        assert_eq!(artifacts.master_map, ["same.id = GFXRES:a.ani"]);
        assert!(report.is_empty());
    }

    #[test]
    fn sync_takes_type_and_file_from_map() {
        let mut rows = parse_descriptors(DESCRIPTORS).records;
        let mut report = Report::new();
        let map = load_master_map(
            "uqm.rmp",
            "graphics.title = GFXRES:lbm/newtitle.ani\nship.arilou.icons = GFXRES:arilou/bigicon.ani\n",
            &mut report,
        );
        let changed = sync_descriptors(&mut rows, &map, &mut report);
        assert_eq!(changed, 1);
        let title = rows.iter().find(|row| row.res_id == "graphics.title").unwrap();
        assert_eq!(title.type_tag.as_deref(), Some("GFXRES"));
        assert_eq!(title.file.as_deref(), Some("lbm/newtitle.ani"));
        assert_eq!(report.count(DiagnosticKind::DescriptorSynced), 1);
    }

    #[test]
    fn artifacts_write_under_configured_trees() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = CatalogConfig::default();
        config.rebase_relative_paths(dir.path());
        let rows = parse_descriptors(DESCRIPTORS).records;
        let mut report = Report::new();
        let written = generate_artifacts(&rows, &mut report).write_to(&config).unwrap();
        assert_eq!(written.len(), 5);
        let index = fs::read_to_string(dir.path().join("content/ship/arilou.ls2")).unwrap();
        assert!(index.starts_with("  3  12   2 ship.arilou.icons\n"));
        assert!(dir.path().join("src/ships/arilou/resinst.h").is_file());
        assert!(dir.path().join("content/uqm.rmp").is_file());
    }
}
