#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

/// Bank export with every default canonical field present, headers in a
/// different case and order than the canonical list.
pub const BANK_EXPORT: &str = "\
reference,date,amount,description,contact name,account code
INV-001,2024-01-05,120.00,Office chairs,Acme Supplies,610
INV-002,2024-01-09,-45.50,Refund,Bob's Bikes,200
";

/// Export whose headers only partly match the canonical fields.
pub const PARTIAL_EXPORT: &str = "\
Posted On,Amount,Memo,Payee
2024-02-01,10.00,Coffee,Cafe Uno
2024-02-02,25.00,Lunch,Deli Dos
";

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        fs::write(&path, contents).expect("write temp file contents");
        path
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }
}

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}
