#![allow(dead_code)]
use std::fs;
use std::path::{Path, PathBuf};

pub const INTERPRETED_SOLVER: &str = "#!/bin/sh
echo \"Solving $2 with capacity file $1\"
echo \"Total Profit: 10\"
echo \"Total Weight: 5\"
echo \"Selected Pallets: [1, 3]\"
";

pub const COMPILED_SOLVER: &str = "#!/bin/sh
echo \"Exact solution: Profit = 10, Weight = 5, Pallets = 1 3\"
";

pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[cfg(unix)]
pub fn write_executable(dir: &Path, name: &str, content: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = write_file(dir, name, content);
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Three instances: P1 complete, P2 without ground truth, P3 without
/// capacity file.
pub fn write_instances(dir: &Path) {
    write_file(dir, "P1.csv", "1,2,6\n3,3,4\n");
    write_file(dir, "TP1.csv", "5,2\n");
    write_file(dir, "OptimalSolution_01.txt", "10,5\n");
    write_file(dir, "P2.csv", "1,2,6\n3,3,4\n");
    write_file(dir, "TP2.csv", "5,2\n");
    write_file(dir, "P3.csv", "1,2,6\n");
}
