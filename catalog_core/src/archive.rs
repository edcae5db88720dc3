//! Verification of packaged content archives.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use zip::ZipArchive;

use crate::diagnostics::{Diagnostic, Report};
use crate::error::CatalogError;
use crate::reconcile::{verify_archive, BundledMap};
use crate::registry::load_master_map;

const MASTER_MAP_SUFFIX: &str = ".rmp";

/// Opens a zip archive, loads every bundled master map and reports each map
/// entry whose file is not in the archive.
pub fn verify_zip(path: &Path, prefix: Option<&str>) -> Result<Report, CatalogError> {
    let archive_error = |source| CatalogError::Archive {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(|err| CatalogError::io(path, err))?;
    let mut archive = ZipArchive::new(file).map_err(archive_error)?;

    let mut report = Report::new();
    let mut names = Vec::with_capacity(archive.len());
    let mut maps = Vec::new();
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(archive_error)?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().replace('\\', "/");
        if name.ends_with(MASTER_MAP_SUFFIX) {
            let mut text = String::new();
            match entry.read_to_string(&mut text) {
                Ok(_) => maps.push(BundledMap {
                    map: load_master_map(&name, &text, &mut report),
                    name: name.clone(),
                }),
                Err(err) => report.push(Diagnostic::UnreadableSource {
                    source: name.clone(),
                    message: err.to_string(),
                }),
            }
        }
        names.push(name);
    }

    tracing::debug!(
        archive = %path.display(),
        entries = names.len(),
        maps = maps.len(),
        "scanned archive"
    );
    for missing in verify_archive(&names, &maps, prefix) {
        report.push(missing);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticKind;
    use std::io::Write;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    fn build_zip(path: &Path, files: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let mut writer = ZipWriter::new(file);
        for (name, contents) in files {
            writer.start_file(*name, FileOptions::default()).unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn complete_archive_verifies_clean() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("content.zip");
        build_zip(
            &path,
            &[
                ("content/uqm.rmp", "graphics.title = GFXRES:lbm/title.ani\n"),
                ("content/lbm/title.ani", "frames"),
            ],
        );
        let report = verify_zip(&path, Some("content/")).unwrap();
        assert!(report.is_empty(), "{}", report.render());
    }

    #[test]
    fn missing_files_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("content.zip");
        build_zip(
            &path,
            &[
                (
                    "content/uqm.rmp",
                    "graphics.title = GFXRES:lbm/title.ani\nmusic.title = MUSICRES:lbm/title.ogg\n",
                ),
                ("content/lbm/title.ani", "frames"),
            ],
        );
        let report = verify_zip(&path, Some("content/")).unwrap();
        assert!(report.has_errors());
        assert_eq!(
            report.diagnostics(),
            [Diagnostic::ArchiveMissingFile {
                map: "content/uqm.rmp".to_string(),
                line: 2,
                path: "lbm/title.ogg".to_string(),
            }]
        );
        assert_eq!(report.count(DiagnosticKind::ArchiveMissingFile), 1);
    }

    #[test]
    fn non_zip_input_is_an_archive_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("content.zip");
        std::fs::write(&path, b"plain text").unwrap();
        let err = verify_zip(&path, None).unwrap_err();
        assert!(matches!(err, CatalogError::Archive { .. }));
    }
}
