use anyhow::Result;
use log::{debug, warn};
use regex::Regex;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Name of the dependency directory that is never descended into.
const VENDOR_DIR: &str = "node_modules";

/// File scanner for selecting numbered tool directories and collecting their sources.
///
/// The `FileScanner` looks at the immediate children of a root directory and keeps only
/// directories whose name starts with an integer (`1_cards`, `2-webhooks`, `3`). Those
/// directories are ordered by that integer and walked depth-first for source files, skipping
/// any `node_modules` directory on the way.
///
/// # Example
///
/// ```no_run
/// use postman_from_source::scanner::FileScanner;
/// use std::path::PathBuf;
///
/// let scanner = FileScanner::new(PathBuf::from("./tools"));
/// let result = scanner.scan().unwrap();
/// println!("Found {} source files", result.source_files.len());
/// ```
pub struct FileScanner {
    root_path: PathBuf,
    extensions: Vec<String>,
}

/// A numbered directory selected for scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberedDir {
    /// Integer prefix of the directory name
    pub index: u64,
    /// Full path to the directory
    pub path: PathBuf,
}

/// Result of directory scanning operation.
///
/// Contains the selected numbered directories, the discovered source files and any warnings
/// encountered during scanning.
pub struct ScanResult {
    /// Numbered directories in scan order
    pub selected_dirs: Vec<NumberedDir>,
    /// Source files, grouped by directory order, depth-first within each directory
    pub source_files: Vec<PathBuf>,
    /// Warning messages for any issues encountered (e.g., inaccessible directories)
    pub warnings: Vec<String>,
}

impl FileScanner {
    /// Creates a new `FileScanner` for the specified root directory, collecting `.js` files.
    pub fn new(root_path: PathBuf) -> Self {
        Self {
            root_path,
            extensions: vec![".js".to_string()],
        }
    }

    /// Replaces the list of file name suffixes that mark a source file.
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    /// Selects the numbered directories and collects every source file beneath them.
    ///
    /// A root that does not exist or is not a directory yields an empty result rather than
    /// an error. Entries that cannot be read are recorded as warnings and scanning continues.
    pub fn scan(&self) -> Result<ScanResult> {
        let mut warnings = Vec::new();

        if !self.root_path.is_dir() {
            debug!(
                "Root is not a directory, nothing to scan: {}",
                self.root_path.display()
            );
            return Ok(ScanResult {
                selected_dirs: Vec::new(),
                source_files: Vec::new(),
                warnings,
            });
        }

        let selected_dirs = self.select_numbered_dirs(&mut warnings)?;
        debug!(
            "Selected {} numbered directories under {}",
            selected_dirs.len(),
            self.root_path.display()
        );

        let mut source_files = Vec::new();
        for dir in &selected_dirs {
            let before = source_files.len();
            self.collect_sources(&dir.path, &mut source_files, &mut warnings);
            debug!(
                "Collected {} files from {}",
                source_files.len() - before,
                dir.path.display()
            );
        }

        Ok(ScanResult {
            selected_dirs,
            source_files,
            warnings,
        })
    }

    /// Lists the immediate children of the root and keeps the numbered directories.
    fn select_numbered_dirs(&self, warnings: &mut Vec<String>) -> Result<Vec<NumberedDir>> {
        let pattern = Regex::new(r"^([0-9]+)(?:[_-].*)?$")?;
        let mut numbered = Vec::new();

        for entry in WalkDir::new(&self.root_path)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                    continue;
                }
            };

            if !entry.file_type().is_dir() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            let Some(captures) = pattern.captures(&name) else {
                continue;
            };

            match captures[1].parse::<u64>() {
                Ok(index) => numbered.push(NumberedDir {
                    index,
                    path: entry.path().to_path_buf(),
                }),
                Err(e) => {
                    let warning = format!("Skipping directory {}: prefix out of range ({})", name, e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        let Some(max_index) = numbered.iter().map(|d| d.index).max() else {
            return Ok(Vec::new());
        };

        let mut selected: Vec<NumberedDir> = numbered
            .into_iter()
            .filter(|d| d.index >= 1 && d.index <= max_index)
            .collect();
        selected.sort_by_key(|d| d.index);

        Ok(selected)
    }

    /// Walks one directory depth-first and appends matching files.
    fn collect_sources(&self, dir: &Path, files: &mut Vec<PathBuf>, warnings: &mut Vec<String>) {
        for entry in WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || e.file_name() != VENDOR_DIR)
        {
            match entry {
                Ok(entry) => {
                    if !entry.file_type().is_file() {
                        continue;
                    }
                    let name = entry.file_name().to_string_lossy();
                    if self.extensions.iter().any(|ext| name.ends_with(ext.as_str())) {
                        files.push(entry.path().to_path_buf());
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }
    }
}
