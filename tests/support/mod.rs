//! Shared helpers for integration tests: project fixtures and recording fakes
//! for the external collaborators.
#![allow(dead_code)]

use devbox::{
    BuildFlags, ContainerBuilder, Devbox, DevboxError, PackageIndex, PackageInstaller,
    ShellLauncher, ShellRequest,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub fn get_devbox_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_devbox"))
}

/// Temporary project containing the given `(relative path, content)` files
pub fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (path, content) in files {
        let full = dir.path().join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, content).unwrap();
    }
    dir
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn read(path: impl AsRef<Path>) -> String {
    fs::read_to_string(path).unwrap()
}

/// Index that knows a fixed set of packages
pub struct FakeIndex {
    known: Vec<String>,
}

impl FakeIndex {
    pub fn new(known: &[&str]) -> Self {
        Self {
            known: strings(known),
        }
    }
}

impl PackageIndex for FakeIndex {
    fn exists(&self, package: &str) -> bool {
        self.known.iter().any(|p| p == package)
    }
}

/// Index that reports every package as available
pub struct AcceptAllIndex;

impl PackageIndex for AcceptAllIndex {
    fn exists(&self, _package: &str) -> bool {
        true
    }
}

#[derive(Default)]
pub struct RecordingInstaller {
    pub calls: Mutex<Vec<(PathBuf, PathBuf)>>,
    pub fail: bool,
}

impl RecordingInstaller {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl PackageInstaller for RecordingInstaller {
    fn apply(&self, profile_dir: &Path, derivation: &Path) -> devbox::Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((profile_dir.to_path_buf(), derivation.to_path_buf()));
        if self.fail {
            return Err(DevboxError::InstallFailure {
                command: "nix-env --install".to_string(),
                status: 1,
                output: "error: undefined variable 'nope'".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingShell {
    pub runs: Mutex<Vec<ShellRequest>>,
    pub execs: Mutex<Vec<(PathBuf, Vec<String>)>>,
}

impl ShellLauncher for RecordingShell {
    fn run(&self, request: &ShellRequest) -> devbox::Result<()> {
        self.runs.lock().unwrap().push(request.clone());
        Ok(())
    }

    fn exec(&self, shell_nix: &Path, commands: &[String]) -> devbox::Result<()> {
        self.execs
            .lock()
            .unwrap()
            .push((shell_nix.to_path_buf(), commands.to_vec()));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingBuilder {
    pub builds: Mutex<Vec<(PathBuf, BuildFlags)>>,
}

impl ContainerBuilder for RecordingBuilder {
    fn build(&self, context_dir: &Path, flags: &BuildFlags) -> devbox::Result<()> {
        self.builds
            .lock()
            .unwrap()
            .push((context_dir.to_path_buf(), flags.clone()));
        Ok(())
    }
}

/// A devbox wired to fakes, plus handles to inspect them
pub struct Harness {
    pub devbox: Devbox,
    pub installer: Arc<RecordingInstaller>,
    pub shell: Arc<RecordingShell>,
    pub builder: Arc<RecordingBuilder>,
}

impl Harness {
    pub fn open(dir: &Path, shell_enabled: bool) -> Self {
        Self::open_with(dir, shell_enabled, RecordingInstaller::default())
    }

    pub fn open_with(dir: &Path, shell_enabled: bool, installer: RecordingInstaller) -> Self {
        let installer = Arc::new(installer);
        let shell = Arc::new(RecordingShell::default());
        let builder = Arc::new(RecordingBuilder::default());

        let devbox = Devbox::open(dir, shell_enabled)
            .unwrap()
            .with_package_index(Arc::new(FakeIndex::new(&["git", "go", "nodejs", "ripgrep"])))
            .with_installer(installer.clone())
            .with_shell_launcher(shell.clone())
            .with_container_builder(builder.clone());

        Self {
            devbox,
            installer,
            shell,
            builder,
        }
    }
}
