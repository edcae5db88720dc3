//! Loading a catalog snapshot from the content and source trees on disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use compat_uqm::descriptor::{self, DescriptorRow};
use regex::Regex;

use crate::config::CatalogConfig;
use crate::diagnostics::{Diagnostic, Report};
use crate::error::CatalogError;
use crate::registry::{
    load_header_constants, load_master_map, load_packages, HeaderSource, IndexSource, MasterMap,
    RegistryModel,
};

#[derive(Debug, Default)]
pub struct Snapshot {
    pub model: RegistryModel,
    pub report: Report,
}

/// Reads every package index under the content tree, the master map and
/// every header under the source tree.
///
/// Missing or unreadable inputs become `UnreadableSource` diagnostics; only
/// an invalid header pattern fails the load.
pub fn load_snapshot(config: &CatalogConfig) -> Result<Snapshot, CatalogError> {
    let header_pattern =
        Regex::new(&config.header_pattern).map_err(|source| CatalogError::InvalidPattern {
            pattern: config.header_pattern.clone(),
            source,
        })?;
    let index_suffix = format!(".{}", config.index_extension);
    let mut report = Report::new();

    let index_files = list_files(&config.content_dir, &mut report, |rel| rel.ends_with(&index_suffix));
    let index_sources: Vec<IndexSource> = read_sources(index_files, &mut report)
        .map(|(name, text)| IndexSource { name, text })
        .collect();
    let packages = load_packages(index_sources, &mut report);

    let map_path = config.master_map_path();
    let master_map = match fs::read_to_string(&map_path) {
        Ok(text) => load_master_map(&config.master_map, &text, &mut report),
        Err(err) => {
            report.push(unreadable(&map_path, err));
            MasterMap::new()
        }
    };

    let header_files = list_files(&config.source_dir, &mut report, |rel| header_pattern.is_match(rel));
    let header_sources: Vec<HeaderSource> = read_sources(header_files, &mut report)
        .map(|(path, text)| HeaderSource { path, text })
        .collect();
    let constants = load_header_constants(header_sources);

    tracing::info!(
        packages = packages.len(),
        map_entries = master_map.len(),
        constants = constants.len(),
        "loaded catalog snapshot"
    );
    Ok(Snapshot {
        model: RegistryModel {
            packages,
            master_map,
            constants,
        },
        report,
    })
}

/// Reads a standalone master map file, naming it by its path in diagnostics.
pub fn read_master_map(path: &Path, report: &mut Report) -> Result<MasterMap, CatalogError> {
    let text = fs::read_to_string(path).map_err(|err| CatalogError::io(path, err))?;
    Ok(load_master_map(&path.display().to_string(), &text, report))
}

/// Reads a descriptor table. Rejected rows are reported as malformed lines.
pub fn read_descriptors(path: &Path, report: &mut Report) -> Result<Vec<DescriptorRow>, CatalogError> {
    let text = fs::read_to_string(path).map_err(|err| CatalogError::io(path, err))?;
    let parsed = descriptor::parse_descriptors(&text);
    let source = path.display().to_string();
    for rejected in parsed.rejected {
        report.push(Diagnostic::MalformedLine {
            source: source.clone(),
            line: rejected.line,
            reason: rejected.reason,
        });
    }
    Ok(parsed.records)
}

pub fn write_descriptors(path: &Path, rows: &[DescriptorRow]) -> Result<(), CatalogError> {
    let mut text = String::new();
    for row in rows {
        text.push_str(&row.to_row());
        text.push('\n');
    }
    fs::write(path, text).map_err(|err| CatalogError::io(path, err))
}

fn unreadable(path: &Path, err: impl std::fmt::Display) -> Diagnostic {
    Diagnostic::UnreadableSource {
        source: path.display().to_string(),
        message: err.to_string(),
    }
}

struct TreeFile {
    full: PathBuf,
    rel: String,
}

fn list_files(root: &Path, report: &mut Report, keep: impl Fn(&str) -> bool) -> Vec<TreeFile> {
    let mut walk = TreeWalk {
        root,
        files: Vec::new(),
        report,
    };
    walk.visit(root);
    let mut files = walk.files;
    files.retain(|file| keep(&file.rel));
    files
}

fn read_sources<'a>(
    files: Vec<TreeFile>,
    report: &'a mut Report,
) -> impl Iterator<Item = (String, String)> + 'a {
    files.into_iter().filter_map(move |file| match fs::read_to_string(&file.full) {
        Ok(text) => Some((file.rel, text)),
        Err(err) => {
            report.push(unreadable(&file.full, err));
            None
        }
    })
}

enum EntryKind {
    File,
    Dir,
    Other,
}

/// Symlinks count as what they point at; linked directories are not entered.
fn entry_kind(entry: &fs::DirEntry) -> io::Result<EntryKind> {
    let file_type = entry.file_type()?;
    if file_type.is_symlink() {
        let meta = fs::metadata(entry.path())?;
        return Ok(if meta.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        });
    }
    Ok(if file_type.is_dir() {
        EntryKind::Dir
    } else if file_type.is_file() {
        EntryKind::File
    } else {
        EntryKind::Other
    })
}

/// Sorted recursive listing of one tree. A directory or entry that cannot be
/// read is reported and skipped; its siblings are still listed.
struct TreeWalk<'a> {
    root: &'a Path,
    files: Vec<TreeFile>,
    report: &'a mut Report,
}

impl TreeWalk<'_> {
    fn visit(&mut self, dir: &Path) {
        let listing = match fs::read_dir(dir) {
            Ok(listing) => listing,
            Err(err) => {
                self.report.push(unreadable(dir, err));
                return;
            }
        };
        let mut entries = Vec::new();
        for entry in listing {
            match entry {
                Ok(entry) => entries.push(entry),
                Err(err) => self.report.push(unreadable(dir, err)),
            }
        }
        entries.sort_by_key(|entry| entry.file_name());
        for entry in entries {
            let path = entry.path();
            match entry_kind(&entry) {
                Ok(EntryKind::Dir) => self.visit(&path),
                Ok(EntryKind::File) => self.push_file(path),
                Ok(EntryKind::Other) => {}
                Err(err) => self.report.push(unreadable(&path, err)),
            }
        }
    }

    fn push_file(&mut self, full: PathBuf) {
        let Ok(rel) = full.strip_prefix(self.root) else {
            return;
        };
        let rel = rel.to_string_lossy().replace('\\', "/");
        self.files.push(TreeFile { full, rel });
    }
}
