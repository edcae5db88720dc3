//! Cross-checks between headers, package indices and the master map, plus
//! map-to-map diff and archive verification.

use std::collections::{HashMap, HashSet};

use crate::classifier::Classifier;
use crate::diagnostics::{Diagnostic, Report};
use crate::generate::{generate_master_map, AssetRef, GeneratedMap};
use crate::governing::GoverningRules;
use crate::registry::{MasterMap, MasterMapEntry, PackageIndexEntry, RegistryModel};
use crate::resource_number::{ResourceNumber, UNKNOWN_RES};

/// A header constant traced through its package to an asset path and type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedConstant {
    pub header: String,
    pub symbol: String,
    pub number: ResourceNumber,
    pub package: String,
    pub file_path: String,
    /// Master map key describing the asset, when one was found.
    pub key: Option<String>,
    pub resource_type: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Orphan {
    pub package: String,
    pub entry: PackageIndexEntry,
}

#[derive(Debug, Default)]
pub struct Reconciliation {
    pub report: Report,
    pub resolved: Vec<ResolvedConstant>,
    pub orphans: Vec<Orphan>,
    pub dangling: Vec<String>,
    pub generated: GeneratedMap,
}

pub fn reconcile(
    model: &RegistryModel,
    rules: &GoverningRules,
    classifier: &Classifier,
) -> Reconciliation {
    let mut outcome = Reconciliation::default();
    let mut used: HashMap<&str, Vec<bool>> = model
        .packages
        .iter()
        .map(|(name, package)| (name.as_str(), vec![false; package.len()]))
        .collect();
    let mut unknown_reported = HashSet::new();

    for constant in &model.constants {
        let package_name = rules.governing_package(&constant.source_header);
        let Some(package) = model.packages.get(&package_name) else {
            if unknown_reported.insert(constant.source_header.as_str()) {
                outcome.report.push(Diagnostic::UnknownPackage {
                    header: constant.source_header.clone(),
                    package: package_name,
                });
            }
            continue;
        };
        let Some(position) = package.position(constant.resource_number) else {
            outcome.report.push(Diagnostic::UnresolvedConstant {
                header: constant.source_header.clone(),
                symbol: constant.symbol_name.clone(),
                number: constant.resource_number,
                package: package_name,
            });
            continue;
        };
        if let Some(flags) = used.get_mut(package.name()) {
            flags[position] = true;
        }

        let file_path = package.entries()[position].target.clone();
        // Relabelled indices carry keys where paths used to be.
        let map_entry = model
            .master_map
            .entry_for_path(&file_path)
            .or_else(|| model.master_map.get(&file_path));
        let (key, resource_type) = match map_entry {
            Some(entry) => (Some(entry.key.clone()), entry.resource_type.clone()),
            None => {
                outcome.report.push(Diagnostic::MissingTypeInfo {
                    symbol: constant.symbol_name.clone(),
                    file_path: file_path.clone(),
                });
                (None, UNKNOWN_RES.to_string())
            }
        };
        outcome.resolved.push(ResolvedConstant {
            header: constant.source_header.clone(),
            symbol: constant.symbol_name.clone(),
            number: constant.resource_number,
            package: package_name,
            file_path,
            key,
            resource_type,
        });
    }

    for (name, package) in &model.packages {
        let Some(flags) = used.get(name.as_str()) else {
            continue;
        };
        for (entry, _) in package.entries().iter().zip(flags).filter(|(_, flag)| !**flag) {
            outcome.report.push(Diagnostic::OrphanResource {
                package: name.clone(),
                number: entry.number,
                target: entry.target.clone(),
            });
            outcome.orphans.push(Orphan {
                package: name.clone(),
                entry: entry.clone(),
            });
        }
    }

    let assets: Vec<AssetRef> = model
        .packages
        .values()
        .flat_map(|package| package.entries().iter().map(AssetRef::from_entry))
        .collect();
    outcome.generated = generate_master_map(&assets, classifier, &mut outcome.report);

    let referenced: HashSet<&str> = outcome
        .resolved
        .iter()
        .filter_map(|resolved| resolved.key.as_deref())
        .collect();
    let mut dangling = Vec::new();
    for entry in model.master_map.entries() {
        if outcome.generated.map.contains_key(&entry.key) || referenced.contains(entry.key.as_str()) {
            continue;
        }
        dangling.push((entry.line, entry.key.clone()));
    }
    dangling.sort();
    for (line, key) in dangling {
        outcome.report.push(Diagnostic::DanglingMapEntry {
            line,
            key: key.clone(),
        });
        outcome.dangling.push(key);
    }

    tracing::info!(
        resolved = outcome.resolved.len(),
        orphans = outcome.orphans.len(),
        dangling = outcome.dangling.len(),
        errors = outcome.report.has_errors(),
        "reconciled catalog"
    );
    outcome
}

/// Reports keys and types `target` introduces relative to `base`, in
/// `target` line order.
pub fn diff_master_maps(base: &MasterMap, target: &MasterMap) -> Report {
    let valid_types = base.known_types();
    let mut entries: Vec<&MasterMapEntry> = target.entries().collect();
    entries.sort_by(|a, b| a.line.cmp(&b.line).then_with(|| a.key.cmp(&b.key)));

    let mut report = Report::new();
    for entry in entries {
        if !base.contains_key(&entry.key) {
            report.push(Diagnostic::NewKey {
                line: entry.line,
                key: entry.key.clone(),
            });
        }
        if !valid_types.contains(entry.resource_type.as_str()) {
            report.push(Diagnostic::NewType {
                line: entry.line,
                key: entry.key.clone(),
                res_type: entry.resource_type.clone(),
            });
        }
    }
    report
}

/// A master map found inside an archive.
#[derive(Clone, Debug)]
pub struct BundledMap {
    pub name: String,
    pub map: MasterMap,
}

/// Checks every file path the bundled maps reference against the archive's
/// entry names. `prefix` is stripped from entry names and map paths before
/// comparing.
pub fn verify_archive(entries: &[String], maps: &[BundledMap], prefix: Option<&str>) -> Vec<Diagnostic> {
    let normalize = |name: &str| -> String {
        let name = name.replace('\\', "/");
        match prefix {
            Some(prefix) if name.starts_with(prefix) => name[prefix.len()..].to_string(),
            _ => name,
        }
    };
    let present: HashSet<String> = entries.iter().map(|name| normalize(name.as_str())).collect();

    let mut missing = Vec::new();
    for bundled in maps {
        let mut map_entries: Vec<&MasterMapEntry> = bundled.map.entries().collect();
        map_entries.sort_by_key(|entry| entry.line);
        for entry in map_entries {
            if !present.contains(&normalize(entry.file_path.as_str())) {
                missing.push(Diagnostic::ArchiveMissingFile {
                    map: bundled.name.clone(),
                    line: entry.line,
                    path: entry.file_path.clone(),
                });
            }
        }
    }
    missing
}
