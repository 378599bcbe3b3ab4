//! Unit test manifest types
//!
//! A manifest is a JSON file in one of two shapes:
//!
//! ```json
//! [ { "filename": "cpu/ld.rom", "abort_pc": 4660, "checksum": "0xBEEF" } ]
//! ```
//!
//! or, grouped by platform:
//!
//! ```json
//! { "gameboy": [ { "filename": "...", "abort_pc": "0x100", "checksum": "..." } ] }
//! ```
//!
//! ROM filenames are relative to the directory containing the manifest.

use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::common::{Error, Result};

/// A single ROM test declared in the manifest
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct TestEntry {
    /// ROM path, relative to the manifest's directory
    pub filename: PathBuf,
    /// Program counter at which the emulator stops and compares the checksum
    pub abort_pc: AbortPc,
    /// Expected checksum, passed to the emulator untouched
    pub checksum: String,
}

impl TestEntry {
    /// Name used for the report test case: the final path segment up to its first `.`
    pub fn test_name(&self) -> String {
        test_name(&self.filename)
    }
}

/// Abort PC as written in the manifest
///
/// Numbers and strings are both accepted and forwarded verbatim.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum AbortPc {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for AbortPc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortPc::Number(n) => write!(f, "{}", n),
            AbortPc::Text(s) => f.write_str(s),
        }
    }
}

/// Which top-level shape the manifest used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestKind {
    /// A bare array of tests
    Flat,
    /// An object mapping platform names to arrays of tests
    Platforms,
}

/// Tests belonging to one platform, in manifest order
#[derive(Debug, Clone)]
pub struct TestGroup {
    /// Platform name; for flat manifests, the manifest file stem
    pub platform: String,
    pub entries: Vec<TestEntry>,
}

/// A loaded manifest
#[derive(Debug, Clone)]
pub struct Manifest {
    pub kind: ManifestKind,
    /// Directory ROM filenames are resolved against
    pub base_dir: PathBuf,
    /// Groups in the order they appear in the file
    pub groups: Vec<TestGroup>,
}

impl Manifest {
    /// Load and parse a manifest from disk
    pub fn load(path: &Path) -> Result<Self> {
        let read_err = |source: io::Error| Error::ManifestRead {
            path: path.display().to_string(),
            source,
        };

        let content = std::fs::read_to_string(path).map_err(read_err)?;
        // Symlinks are not followed: ROMs live next to the path we were given
        let absolute = lexical_absolute(path).map_err(read_err)?;
        let base_dir = absolute
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "default".to_string());

        Self::parse(path, &content, base_dir, &stem)
    }

    fn parse(path: &Path, content: &str, base_dir: PathBuf, stem: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content)
            .map_err(|e| Error::manifest_parse(path, e.to_string()))?;

        let (kind, groups) = match value {
            Value::Array(items) => {
                let entries = parse_entries(path, None, items)?;
                (
                    ManifestKind::Flat,
                    vec![TestGroup {
                        platform: stem.to_string(),
                        entries,
                    }],
                )
            }
            Value::Object(platforms) => {
                let mut groups = Vec::with_capacity(platforms.len());
                for (platform, tests) in platforms {
                    let Value::Array(items) = tests else {
                        return Err(Error::manifest_parse(
                            path,
                            format!("platform '{}' must map to an array of tests", platform),
                        ));
                    };
                    if !is_plain_name(&platform) {
                        return Err(Error::manifest_parse(
                            path,
                            format!(
                                "platform name '{}' must be a single path component",
                                platform
                            ),
                        ));
                    }
                    let entries = parse_entries(path, Some(&platform), items)?;
                    groups.push(TestGroup { platform, entries });
                }
                (ManifestKind::Platforms, groups)
            }
            _ => {
                return Err(Error::manifest_parse(
                    path,
                    "expected an array of tests or an object mapping platforms to arrays of tests",
                ))
            }
        };

        tracing::debug!(
            manifest = %path.display(),
            groups = groups.len(),
            "Loaded unit test manifest"
        );

        Ok(Self {
            kind,
            base_dir,
            groups,
        })
    }

    /// Absolute path of the ROM for an entry
    pub fn rom_path(&self, entry: &TestEntry) -> PathBuf {
        self.base_dir.join(&entry.filename)
    }

    /// Total number of tests across all groups
    pub fn test_count(&self) -> usize {
        self.groups.iter().map(|g| g.entries.len()).sum()
    }
}

fn parse_entries(path: &Path, platform: Option<&str>, items: Vec<Value>) -> Result<Vec<TestEntry>> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            serde_json::from_value(item).map_err(|e| {
                let location = match platform {
                    Some(p) => format!("platform '{}', test #{}", p, i),
                    None => format!("test #{}", i),
                };
                Error::manifest_parse(path, format!("{}: {}", location, e))
            })
        })
        .collect()
}

/// Absolute form of `path` with `.` and `..` folded away without touching the filesystem
fn lexical_absolute(path: &Path) -> io::Result<PathBuf> {
    let mut out = PathBuf::new();
    for component in std::path::absolute(path)?.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    Ok(out)
}

/// Platform names become report directories under the results dir
fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}

/// Derive a test case name from a ROM filename
pub fn test_name(filename: &Path) -> String {
    let last = filename
        .file_name()
        .map(|s| s.to_string_lossy())
        .unwrap_or_else(|| filename.to_string_lossy());
    last.split('.').next().unwrap_or_default().to_string()
}
