//! Module writer and aggregator.
//!
//! Rendering is pure; writing and checking are the only filesystem touches.
//! Every run overwrites the full output set. A failed write stops the run
//! and leaves already-written files in place.

use crate::core::buckets::BucketConfig;
use crate::core::deps::DependencyEdge;
use crate::core::diag::Warning;
use crate::core::error::SplitError;
use crate::core::partition::Partition;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub file_name: String,
    pub contents: String,
}

impl OutputFile {
    pub fn sha256(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.contents.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// Module files in module order, then the index file.
pub fn render(partition: &Partition, config: &BucketConfig) -> Vec<OutputFile> {
    let ext = config.extension();
    let mut files: Vec<OutputFile> = partition
        .modules
        .iter()
        .map(|module| {
            let mut out = String::new();
            if !config.header.trim().is_empty() {
                out.push_str(config.header.trim_end());
                out.push('\n');
            }
            for import in partition.imports_for(&module.name) {
                out.push_str(&import.render());
                out.push('\n');
            }
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&module.body);
            out.push('\n');
            OutputFile {
                file_name: format!("{}.{}", module.name, ext),
                contents: out,
            }
        })
        .collect();

    let index: String = partition
        .modules
        .iter()
        .map(|m| format!("export * from './{}';\n", m.name))
        .collect();
    files.push(OutputFile {
        file_name: format!("{}.{}", config.index_name, ext),
        contents: index,
    });
    files
}

/// Write every file into `dir`, creating it if needed.
pub fn write_outputs(dir: &Path, files: &[OutputFile]) -> Result<Vec<PathBuf>, SplitError> {
    fs::create_dir_all(dir).map_err(|source| SplitError::WriteFailure {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut written = Vec::with_capacity(files.len());
    for file in files {
        let path = dir.join(&file.file_name);
        fs::write(&path, &file.contents).map_err(|source| SplitError::WriteFailure {
            path: path.clone(),
            source,
        })?;
        written.push(path);
    }
    Ok(written)
}

/// Difference between rendered output and what is on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub missing: Vec<String>,
    pub stale: Vec<String>,
    /// Files with the output extension that this run would not produce.
    pub orphaned: Vec<String>,
}

impl CheckReport {
    pub fn is_current(&self) -> bool {
        self.missing.is_empty() && self.stale.is_empty()
    }
}

pub fn check_outputs(
    dir: &Path,
    files: &[OutputFile],
    extension: &str,
) -> Result<CheckReport, SplitError> {
    let mut report = CheckReport::default();
    for file in files {
        match fs::read_to_string(dir.join(&file.file_name)) {
            Ok(existing) if existing == file.contents => {}
            Ok(_) => report.stale.push(file.file_name.clone()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                report.missing.push(file.file_name.clone())
            }
            Err(e) => return Err(SplitError::IoError(e)),
        }
    }

    if dir.is_dir() {
        for entry in fs::read_dir(dir)?.flatten() {
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(extension) {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if !files.iter().any(|f| f.file_name == name) {
                report.orphaned.push(name);
            }
        }
        report.orphaned.sort();
    }
    Ok(report)
}

#[derive(Debug, Clone, Serialize)]
pub struct FileDigest {
    pub file: String,
    pub sha256: String,
    pub bytes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleSummary {
    pub name: String,
    pub symbols: Vec<String>,
}

/// Machine-readable account of one run.
#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    pub source: String,
    pub entities: usize,
    pub aliases: usize,
    pub modules: Vec<ModuleSummary>,
    pub files: Vec<FileDigest>,
    pub edges: Vec<DependencyEdge>,
    pub warnings: Vec<Warning>,
}

impl Manifest {
    pub fn new(source: &str, partition: &Partition, files: &[OutputFile]) -> Self {
        Self {
            source: source.to_string(),
            entities: partition.catalog.entities().len(),
            aliases: partition.catalog.aliases().len(),
            modules: partition
                .modules
                .iter()
                .map(|m| ModuleSummary {
                    name: m.name.clone(),
                    symbols: m.owned.clone(),
                })
                .collect(),
            files: files
                .iter()
                .map(|f| FileDigest {
                    file: f.file_name.clone(),
                    sha256: f.sha256(),
                    bytes: f.contents.len(),
                })
                .collect(),
            edges: partition.edges.clone(),
            warnings: partition.warnings.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::buckets::BucketDef;
    use crate::core::partition::partition;

    fn config() -> BucketConfig {
        BucketConfig {
            header: "import { int } from \"drizzle-orm/mysql-core\";".to_string(),
            keep_leading_comments: false,
            buckets: vec![
                BucketDef {
                    name: "core".into(),
                    entities: vec!["users".into()],
                },
                BucketDef {
                    name: "sales".into(),
                    entities: vec!["orders".into()],
                },
            ],
            ..BucketConfig::default()
        }
    }

    const SRC: &str = "export const users = mysqlTable(\"users\", { id: int(\"id\") });\n\
export const orders = mysqlTable(\"orders\", { userId: int(\"userId\").references(() => users.id) });\n";

    #[test]
    fn module_file_layout() {
        let p = partition(SRC, "s.ts", &config()).unwrap();
        let files = render(&p, &config());
        let sales = files.iter().find(|f| f.file_name == "sales.ts").unwrap();
        assert_eq!(
            sales.contents,
            "import { int } from \"drizzle-orm/mysql-core\";\n\
import { users } from \"./core\";\n\
\n\
export const orders = mysqlTable(\"orders\", { userId: int(\"userId\").references(() => users.id) });\n"
        );
    }

    #[test]
    fn headerless_module_without_imports_starts_with_body() {
        let cfg = BucketConfig {
            header: String::new(),
            ..config()
        };
        let p = partition(SRC, "s.ts", &cfg).unwrap();
        let files = render(&p, &cfg);
        let core = files.iter().find(|f| f.file_name == "core.ts").unwrap();
        assert_eq!(
            core.contents,
            "export const users = mysqlTable(\"users\", { id: int(\"id\") });\n"
        );
        let sales = files.iter().find(|f| f.file_name == "sales.ts").unwrap();
        assert!(sales.contents.starts_with("import { users } from \"./core\";\n\nexport const orders"));
    }

    #[test]
    fn index_lists_modules_in_order() {
        let p = partition(SRC, "s.ts", &config()).unwrap();
        let files = render(&p, &config());
        let index = files.last().unwrap();
        assert_eq!(index.file_name, "index.ts");
        assert_eq!(
            index.contents,
            "export * from './core';\nexport * from './sales';\n"
        );
    }

    #[test]
    fn check_reports_missing_stale_and_orphaned() {
        let tmp = tempfile::tempdir().unwrap();
        let p = partition(SRC, "s.ts", &config()).unwrap();
        let files = render(&p, &config());

        let report = check_outputs(tmp.path(), &files, "ts").unwrap();
        assert_eq!(report.missing.len(), 3);
        assert!(!report.is_current());

        write_outputs(tmp.path(), &files).unwrap();
        assert!(check_outputs(tmp.path(), &files, "ts").unwrap().is_current());

        fs::write(tmp.path().join("core.ts"), "// edited\n").unwrap();
        fs::write(tmp.path().join("legacy.ts"), "").unwrap();
        let report = check_outputs(tmp.path(), &files, "ts").unwrap();
        assert_eq!(report.stale, vec!["core.ts"]);
        assert_eq!(report.orphaned, vec!["legacy.ts"]);
    }

    #[test]
    fn manifest_digests_match_contents() {
        let p = partition(SRC, "s.ts", &config()).unwrap();
        let files = render(&p, &config());
        let manifest = Manifest::new("s.ts", &p, &files);
        assert_eq!(manifest.entities, 2);
        assert_eq!(manifest.files.len(), 3);
        assert_eq!(manifest.files[0].sha256.len(), 64);
        assert_eq!(manifest.edges.len(), 1);
    }
}
