//! In-memory tables for the three sources of truth: package indices, the
//! master map and header constants.
//!
//! Loaders take text that has already been read; see [`crate::content`] for
//! reading a catalog snapshot from disk.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use compat_uqm::{defines, ls2, rmp};

use crate::diagnostics::{Diagnostic, Report};
use crate::resource_number::{ResourceNumber, UNKNOWN_TYPE};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageIndexEntry {
    pub number: ResourceNumber,
    /// Asset path, or a symbolic key in relabelled indices.
    pub target: String,
    pub line: usize,
}

/// One index file's entries, unique by `(instance, type)`.
#[derive(Clone, Debug, Default)]
pub struct Package {
    name: String,
    entries: Vec<PackageIndexEntry>,
    slots: HashMap<(u32, u32), usize>,
}

impl Package {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
            slots: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entries(&self) -> &[PackageIndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts an entry; a later entry with the same `(instance, type)`
    /// replaces the earlier one in place and the replaced entry is returned.
    pub fn insert(&mut self, entry: PackageIndexEntry) -> Option<PackageIndexEntry> {
        let slot = (entry.number.instance(), entry.number.res_type());
        match self.slots.get(&slot) {
            Some(&index) => Some(std::mem::replace(&mut self.entries[index], entry)),
            None => {
                self.slots.insert(slot, self.entries.len());
                self.entries.push(entry);
                None
            }
        }
    }

    pub fn position(&self, number: ResourceNumber) -> Option<usize> {
        let index = *self.slots.get(&(number.instance(), number.res_type()))?;
        (self.entries[index].number == number).then_some(index)
    }

    pub fn get(&self, number: ResourceNumber) -> Option<&PackageIndexEntry> {
        self.position(number).map(|index| &self.entries[index])
    }
}

pub type PackageSet = BTreeMap<String, Package>;

#[derive(Clone, Debug)]
pub struct IndexSource {
    /// Logical name, e.g. `comm/arilou.ls2`.
    pub name: String,
    pub text: String,
}

pub fn load_packages(sources: impl IntoIterator<Item = IndexSource>, report: &mut Report) -> PackageSet {
    let mut packages = PackageSet::new();
    for source in sources {
        let parsed = ls2::parse_index(&source.text);
        for rejected in parsed.rejected {
            report.push(Diagnostic::MalformedLine {
                source: source.name.clone(),
                line: rejected.line,
                reason: rejected.reason,
            });
        }
        let package = packages
            .entry(source.name.clone())
            .or_insert_with(|| Package::new(source.name.clone()));
        for record in parsed.records {
            let entry = PackageIndexEntry {
                number: ResourceNumber::encode(record.package, record.instance, record.res_type),
                target: record.target,
                line: record.line,
            };
            let number = entry.number;
            let replacement = entry.target.clone();
            if let Some(previous) = package.insert(entry) {
                report.push(Diagnostic::IndexOverwrite {
                    package: source.name.clone(),
                    line: record.line,
                    number,
                    previous: previous.target,
                    replacement,
                });
            }
        }
        tracing::debug!(package = %source.name, entries = package.len(), "loaded package index");
    }
    packages
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MasterMapEntry {
    pub key: String,
    pub resource_type: String,
    pub file_path: String,
    pub line: usize,
}

impl MasterMapEntry {
    pub fn to_line(&self) -> String {
        rmp::format_map_line(&self.key, &self.resource_type, &self.file_path)
    }
}

/// Symbolic key → `(type, path)`; keys are unique.
#[derive(Clone, Debug, Default)]
pub struct MasterMap {
    entries: BTreeMap<String, MasterMapEntry>,
    by_path: HashMap<String, String>,
}

impl MasterMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry unless its key is taken, in which case the existing
    /// entry is kept and returned as the error.
    pub fn insert(&mut self, entry: MasterMapEntry) -> Result<(), &MasterMapEntry> {
        if self.entries.contains_key(&entry.key) {
            return Err(&self.entries[&entry.key]);
        }
        self.by_path
            .entry(entry.file_path.clone())
            .or_insert_with(|| entry.key.clone());
        self.entries.insert(entry.key.clone(), entry);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&MasterMapEntry> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// First entry (in load order) whose file path is `path`.
    pub fn entry_for_path(&self, path: &str) -> Option<&MasterMapEntry> {
        self.by_path.get(path).and_then(|key| self.entries.get(key))
    }

    /// Entries sorted by key.
    pub fn entries(&self) -> impl Iterator<Item = &MasterMapEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn known_types(&self) -> BTreeSet<&str> {
        self.entries
            .values()
            .map(|entry| entry.resource_type.as_str())
            .collect()
    }

    pub fn to_lines(&self) -> Vec<String> {
        self.entries().map(MasterMapEntry::to_line).collect()
    }
}

pub fn load_master_map(source: &str, text: &str, report: &mut Report) -> MasterMap {
    let parsed = rmp::parse_map(text);
    for rejected in parsed.rejected {
        report.push(Diagnostic::MalformedLine {
            source: source.to_string(),
            line: rejected.line,
            reason: rejected.reason,
        });
    }
    let mut map = MasterMap::new();
    for record in parsed.records {
        let resource_type = match record.res_type {
            Some(res_type) => res_type,
            None => {
                report.push(Diagnostic::UntypedMapEntry {
                    source: source.to_string(),
                    line: record.line,
                    key: record.key.clone(),
                });
                UNKNOWN_TYPE.to_string()
            }
        };
        let entry = MasterMapEntry {
            key: record.key,
            resource_type,
            file_path: record.path,
            line: record.line,
        };
        let (key, line) = (entry.key.clone(), entry.line);
        if let Err(existing) = map.insert(entry) {
            let first_line = existing.line;
            report.push(Diagnostic::DuplicateMapKey {
                source: source.to_string(),
                line,
                key,
                first_line,
            });
        }
    }
    tracing::debug!(source, entries = map.len(), "loaded master map");
    map
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderConstant {
    pub source_header: String,
    pub symbol_name: String,
    pub resource_number: ResourceNumber,
    pub line: usize,
}

#[derive(Clone, Debug)]
pub struct HeaderSource {
    /// Path relative to the source tree, `/`-separated.
    pub path: String,
    pub text: String,
}

/// Extracts resource constants; defines whose value is not a valid literal
/// are skipped silently.
pub fn load_header_constants(sources: impl IntoIterator<Item = HeaderSource>) -> Vec<HeaderConstant> {
    let mut constants = Vec::new();
    for source in sources {
        for define in defines::parse_defines(&source.text) {
            match ResourceNumber::parse(&define.literal) {
                Ok(resource_number) => constants.push(HeaderConstant {
                    source_header: source.path.clone(),
                    symbol_name: define.symbol,
                    resource_number,
                    line: define.line,
                }),
                Err(err) => {
                    tracing::debug!(header = %source.path, symbol = %define.symbol, "{}", err);
                }
            }
        }
    }
    constants
}

/// A fully loaded catalog snapshot.
#[derive(Clone, Debug, Default)]
pub struct RegistryModel {
    pub packages: PackageSet,
    pub master_map: MasterMap,
    pub constants: Vec<HeaderConstant>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticKind;

    fn index(name: &str, text: &str) -> IndexSource {
        IndexSource {
            name: name.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn packages_are_keyed_by_resource_number() {
        let mut report = Report::new();
        let packages = load_packages(
            [index("ship/arilou.ls2", "3 12 2 arilou/bigicon.ani\n3 13 5 arilou/arilou.snd\n")],
            &mut report,
        );
        assert!(report.is_empty());
        let package = &packages["ship/arilou.ls2"];
        assert_eq!(package.len(), 2);
        let entry = package.get(ResourceNumber::from_raw(0x0060_0c02)).unwrap();
        assert_eq!(entry.target, "arilou/bigicon.ani");
        assert!(package.get(ResourceNumber::encode(4, 12, 2)).is_none());
    }

    #[test]
    fn colliding_instance_and_type_overwrites_with_warning() {
        let mut report = Report::new();
        let packages = load_packages(
            [index(
                "starcon.ls2",
                "1 4 2 lbm/old.ani\n1 5 2 lbm/keep.ani\n1 4 2 lbm/new.ani\n",
            )],
            &mut report,
        );
        let package = &packages["starcon.ls2"];
        assert_eq!(package.len(), 2);
        assert_eq!(package.entries()[0].target, "lbm/new.ani");
        assert_eq!(package.entries()[1].target, "lbm/keep.ani");
        assert_eq!(report.count(DiagnosticKind::IndexOverwrite), 1);
        match &report.diagnostics()[0] {
            Diagnostic::IndexOverwrite {
                previous,
                replacement,
                line,
                ..
            } => {
                assert_eq!(previous, "lbm/old.ani");
                assert_eq!(replacement, "lbm/new.ani");
                assert_eq!(*line, 3);
            }
            other => panic!("unexpected diagnostic {other:?}"),
        }
    }

    #[test]
    fn malformed_index_lines_are_reported_and_skipped() {
        let mut report = Report::new();
        let packages = load_packages([index("a.ls2", "1 x 2 path\n1 2 2 ok\n")], &mut report);
        assert_eq!(packages["a.ls2"].len(), 1);
        assert_eq!(report.count(DiagnosticKind::MalformedLine), 1);
    }

    #[test]
    fn master_map_tags_untyped_lines() {
        let mut report = Report::new();
        let map = load_master_map(
            "uqm.rmp",
            "ship.arilou.icons = GFXRES:arilou/bigicon.ani\nmusic.title = lbm/title.ogg\n",
            &mut report,
        );
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("music.title").unwrap().resource_type, UNKNOWN_TYPE);
        assert_eq!(report.count(DiagnosticKind::UntypedMapEntry), 1);
        assert!(!report.has_errors());
        assert_eq!(
            map.entry_for_path("arilou/bigicon.ani").unwrap().key,
            "ship.arilou.icons"
        );
    }

    #[test]
    fn master_map_keeps_first_of_duplicate_keys() {
        let mut report = Report::new();
        let map = load_master_map(
            "uqm.rmp",
            "a.b = GFXRES:first.ani\na.b = GFXRES:second.ani\n",
            &mut report,
        );
        assert_eq!(map.get("a.b").unwrap().file_path, "first.ani");
        assert_eq!(report.count(DiagnosticKind::DuplicateMapKey), 1);
    }

    #[test]
    fn known_types_and_lines() {
        let mut report = Report::new();
        let map = load_master_map(
            "uqm.rmp",
            "b = SNDRES:b.snd\na = GFXRES:a.ani\nc = GFXRES:c.ani\n",
            &mut report,
        );
        let types: Vec<&str> = map.known_types().into_iter().collect();
        assert_eq!(types, ["GFXRES", "SNDRES"]);
        assert_eq!(map.to_lines()[0], "a = GFXRES:a.ani");
    }

    #[test]
    fn header_constants_skip_non_resource_values() {
        let constants = load_header_constants([HeaderSource {
            path: "ships/arilou/resource.h".to_string(),
            text: "#define ARILOU_BIG_ICON 0x00600c02L\n#define NOT_HEX 0xZZL\n#define COUNT 3\n"
                .to_string(),
        }]);
        assert_eq!(constants.len(), 1);
        assert_eq!(constants[0].symbol_name, "ARILOU_BIG_ICON");
        assert_eq!(constants[0].resource_number.decode(), (3, 12, 2));
    }
}
