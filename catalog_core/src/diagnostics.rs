//! Collected findings of a load, reconcile, diff or verification pass.
//!
//! Nothing in the engine raises on bad data; every finding becomes a
//! [`Diagnostic`] in a [`Report`]. Pushing into a report also emits a
//! `tracing` event at the finding's severity.

use std::collections::BTreeMap;
use std::fmt;

use crate::resource_number::ResourceNumber;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(label)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticKind {
    UnreadableSource,
    MalformedLine,
    IndexOverwrite,
    UntypedMapEntry,
    DuplicateMapKey,
    UnknownPackage,
    UnresolvedConstant,
    MissingTypeInfo,
    OrphanResource,
    DanglingMapEntry,
    NoClassification,
    DuplicateKey,
    UntypedDescriptor,
    DescriptorSynced,
    NewKey,
    NewType,
    ArchiveMissingFile,
}

impl DiagnosticKind {
    pub fn label(self) -> &'static str {
        match self {
            DiagnosticKind::UnreadableSource => "unreadable sources",
            DiagnosticKind::MalformedLine => "malformed lines",
            DiagnosticKind::IndexOverwrite => "overwritten index entries",
            DiagnosticKind::UntypedMapEntry => "untyped master map entries",
            DiagnosticKind::DuplicateMapKey => "duplicate master map keys",
            DiagnosticKind::UnknownPackage => "unknown packages",
            DiagnosticKind::UnresolvedConstant => "unresolved constants",
            DiagnosticKind::MissingTypeInfo => "missing type info",
            DiagnosticKind::OrphanResource => "orphan resources",
            DiagnosticKind::DanglingMapEntry => "dangling map entries",
            DiagnosticKind::NoClassification => "unclassified paths",
            DiagnosticKind::DuplicateKey => "duplicate generated keys",
            DiagnosticKind::UntypedDescriptor => "untyped descriptors",
            DiagnosticKind::DescriptorSynced => "descriptors synced from master map",
            DiagnosticKind::NewKey => "new keys",
            DiagnosticKind::NewType => "new types",
            DiagnosticKind::ArchiveMissingFile => "missing archive files",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Diagnostic {
    UnreadableSource {
        source: String,
        message: String,
    },
    MalformedLine {
        source: String,
        line: usize,
        reason: String,
    },
    IndexOverwrite {
        package: String,
        line: usize,
        number: ResourceNumber,
        previous: String,
        replacement: String,
    },
    UntypedMapEntry {
        source: String,
        line: usize,
        key: String,
    },
    DuplicateMapKey {
        source: String,
        line: usize,
        key: String,
        first_line: usize,
    },
    UnknownPackage {
        header: String,
        package: String,
    },
    UnresolvedConstant {
        header: String,
        symbol: String,
        number: ResourceNumber,
        package: String,
    },
    MissingTypeInfo {
        symbol: String,
        file_path: String,
    },
    OrphanResource {
        package: String,
        number: ResourceNumber,
        target: String,
    },
    DanglingMapEntry {
        line: usize,
        key: String,
    },
    NoClassification {
        path: String,
    },
    DuplicateKey {
        key: String,
        path: String,
    },
    UntypedDescriptor {
        line: usize,
        res_id: String,
    },
    DescriptorSynced {
        line: usize,
        res_id: String,
        from: String,
        to: String,
    },
    NewKey {
        line: usize,
        key: String,
    },
    NewType {
        line: usize,
        key: String,
        res_type: String,
    },
    ArchiveMissingFile {
        map: String,
        line: usize,
        path: String,
    },
}

impl Diagnostic {
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Diagnostic::UnreadableSource { .. } => DiagnosticKind::UnreadableSource,
            Diagnostic::MalformedLine { .. } => DiagnosticKind::MalformedLine,
            Diagnostic::IndexOverwrite { .. } => DiagnosticKind::IndexOverwrite,
            Diagnostic::UntypedMapEntry { .. } => DiagnosticKind::UntypedMapEntry,
            Diagnostic::DuplicateMapKey { .. } => DiagnosticKind::DuplicateMapKey,
            Diagnostic::UnknownPackage { .. } => DiagnosticKind::UnknownPackage,
            Diagnostic::UnresolvedConstant { .. } => DiagnosticKind::UnresolvedConstant,
            Diagnostic::MissingTypeInfo { .. } => DiagnosticKind::MissingTypeInfo,
            Diagnostic::OrphanResource { .. } => DiagnosticKind::OrphanResource,
            Diagnostic::DanglingMapEntry { .. } => DiagnosticKind::DanglingMapEntry,
            Diagnostic::NoClassification { .. } => DiagnosticKind::NoClassification,
            Diagnostic::DuplicateKey { .. } => DiagnosticKind::DuplicateKey,
            Diagnostic::UntypedDescriptor { .. } => DiagnosticKind::UntypedDescriptor,
            Diagnostic::DescriptorSynced { .. } => DiagnosticKind::DescriptorSynced,
            Diagnostic::NewKey { .. } => DiagnosticKind::NewKey,
            Diagnostic::NewType { .. } => DiagnosticKind::NewType,
            Diagnostic::ArchiveMissingFile { .. } => DiagnosticKind::ArchiveMissingFile,
        }
    }

    pub fn severity(&self) -> Severity {
        match self.kind() {
            DiagnosticKind::UnreadableSource
            | DiagnosticKind::DuplicateMapKey
            | DiagnosticKind::UnknownPackage
            | DiagnosticKind::UnresolvedConstant
            | DiagnosticKind::DuplicateKey
            | DiagnosticKind::ArchiveMissingFile => Severity::Error,
            DiagnosticKind::OrphanResource | DiagnosticKind::DescriptorSynced => Severity::Info,
            _ => Severity::Warning,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnreadableSource { source, message } => {
                write!(f, "{}: {}", source, message)
            }
            Diagnostic::MalformedLine {
                source,
                line,
                reason,
            } => write!(f, "{}:{}: {}", source, line, reason),
            Diagnostic::IndexOverwrite {
                package,
                line,
                number,
                previous,
                replacement,
            } => write!(
                f,
                "{}:{}: {} replaces '{}' with '{}'",
                package, line, number, previous, replacement
            ),
            Diagnostic::UntypedMapEntry { source, line, key } => {
                write!(f, "{}:{}: resource '{}' has no type", source, line, key)
            }
            Diagnostic::DuplicateMapKey {
                source,
                line,
                key,
                first_line,
            } => write!(
                f,
                "{}:{}: key '{}' already defined on line {}",
                source, line, key, first_line
            ),
            Diagnostic::UnknownPackage { header, package } => {
                write!(f, "{}: unknown package '{}'", header, package)
            }
            Diagnostic::UnresolvedConstant {
                header,
                symbol,
                number,
                package,
            } => write!(
                f,
                "{}: unknown resource {} for {} (package {})",
                header, number, symbol, package
            ),
            Diagnostic::MissingTypeInfo { symbol, file_path } => {
                write!(f, "{}: no master map entry for '{}'", symbol, file_path)
            }
            Diagnostic::OrphanResource {
                package,
                number,
                target,
            } => write!(f, "{}: {} '{}' is not referenced", package, number, target),
            Diagnostic::DanglingMapEntry { line, key } => {
                write!(f, "{}: key '{}' is never produced or referenced", line, key)
            }
            Diagnostic::NoClassification { path } => write!(f, "no match for '{}'", path),
            Diagnostic::DuplicateKey { key, path } => {
                write!(f, "duplicate key '{}' (dropped '{}')", key, path)
            }
            Diagnostic::UntypedDescriptor { line, res_id } => write!(
                f,
                "line {}: resource id '{}' has no associated type",
                line, res_id
            ),
            Diagnostic::DescriptorSynced {
                line,
                res_id,
                from,
                to,
            } => write!(f, "line {}: {} changed from {} to {}", line, res_id, from, to),
            Diagnostic::NewKey { line, key } => write!(f, "{}: new key '{}'", line, key),
            Diagnostic::NewType {
                line,
                key,
                res_type,
            } => write!(f, "{}: new type '{}' (key '{}')", line, res_type, key),
            Diagnostic::ArchiveMissingFile { map, line, path } => {
                write!(f, "{}:{}: '{}' is not in the archive", map, line, path)
            }
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Report {
    diagnostics: Vec<Diagnostic>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity() {
            Severity::Error => tracing::error!(kind = ?diagnostic.kind(), "{}", diagnostic),
            Severity::Warning => tracing::warn!(kind = ?diagnostic.kind(), "{}", diagnostic),
            Severity::Info => tracing::debug!(kind = ?diagnostic.kind(), "{}", diagnostic),
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn merge(&mut self, other: Report) {
        self.diagnostics.extend(other.diagnostics);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(move |diagnostic| diagnostic.kind() == kind)
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.of_kind(kind).count()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diagnostic| diagnostic.severity() == Severity::Error)
    }

    pub fn grouped(&self) -> BTreeMap<DiagnosticKind, Vec<&Diagnostic>> {
        let mut groups: BTreeMap<DiagnosticKind, Vec<&Diagnostic>> = BTreeMap::new();
        for diagnostic in &self.diagnostics {
            groups.entry(diagnostic.kind()).or_default().push(diagnostic);
        }
        groups
    }

    /// Plain-text rendering, one section per diagnostic kind.
    pub fn render(&self) -> String {
        let mut lines = Vec::new();
        for (kind, diagnostics) in self.grouped() {
            let severity = diagnostics
                .first()
                .map(|diagnostic| diagnostic.severity())
                .unwrap_or(Severity::Info);
            lines.push(format!(
                "{} ({}, {})",
                kind.label(),
                severity,
                diagnostics.len()
            ));
            for diagnostic in diagnostics {
                lines.push(format!("  {}", diagnostic));
            }
        }
        lines.join("\n")
    }
}
