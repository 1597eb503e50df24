//! Runs the project's package manager to install packages.

use anyhow::{Context, Result};
use depsize_core::{DepsizeError, PackageManager, detect_package_manager};
use log::{debug, info};
use std::{
    fmt,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

/// The add invocation for a package manager, e.g. `pnpm add react`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallCommand {
    pub manager: PackageManager,
    /// Executable to spawn, the manager's name unless overridden
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl InstallCommand {
    pub fn new(manager: PackageManager, packages: &[String], cwd: impl AsRef<Path>) -> Self {
        let mut args = Vec::with_capacity(packages.len() + 1);
        args.push(manager.add_subcommand().to_string());
        args.extend(packages.iter().cloned());
        InstallCommand {
            manager,
            program: PathBuf::from(manager.as_str()),
            args,
            cwd: cwd.as_ref().to_path_buf(),
        }
    }

    /// Spawn `program` instead of the manager found on `PATH`.
    pub fn with_program(mut self, program: impl AsRef<Path>) -> Self {
        self.program = program.as_ref().to_path_buf();
        self
    }

    /// Build the command for the manager detected in `root`.
    pub fn detect(packages: &[String], cwd: impl AsRef<Path>, root: &Path) -> Self {
        let manager = detect_package_manager(root);
        debug!("Detected package manager {} in {}", manager, root.display());
        Self::new(manager, packages, cwd)
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).current_dir(&self.cwd);
        // Installers prompt and draw progress on the terminal
        cmd.stdin(Stdio::inherit()).stdout(Stdio::inherit()).stderr(Stdio::inherit());
        cmd
    }

    /// Spawn the installer and wait for it to exit.
    pub fn run(&self) -> Result<()> {
        info!("Running `{}` in {}", self, self.cwd.display());
        let status = self
            .build_command()
            .status()
            .with_context(|| format!("failed to spawn `{}`", self.program.display()))?;

        if !status.success() {
            return Err(DepsizeError::InstallFailed {
                manager: self.manager.to_string(),
                status: status.to_string(),
            }
            .into());
        }
        Ok(())
    }
}

impl fmt::Display for InstallCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.program.display(), self.args.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn packages() -> Vec<String> {
        vec!["react@18.2.0".to_string(), "dayjs".to_string()]
    }

    #[test]
    fn test_npm_uses_install() {
        let cmd = InstallCommand::new(PackageManager::Npm, &packages(), "/repo");
        assert_eq!(cmd.args, ["install", "react@18.2.0", "dayjs"]);
        assert_eq!(cmd.to_string(), "npm install react@18.2.0 dayjs");
        assert_eq!(cmd.cwd, PathBuf::from("/repo"));
    }

    #[test]
    fn test_pnpm_and_yarn_use_add() {
        let pnpm = InstallCommand::new(PackageManager::Pnpm, &packages(), "/repo");
        assert_eq!(pnpm.to_string(), "pnpm add react@18.2.0 dayjs");

        let yarn = InstallCommand::new(PackageManager::Yarn, &packages(), "/repo");
        assert_eq!(yarn.to_string(), "yarn add react@18.2.0 dayjs");
    }

    #[test]
    fn test_detect_uses_root_lockfile_and_cwd() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let app = root.join("packages/app");
        fs::create_dir_all(&app).unwrap();
        fs::write(root.join("yarn.lock"), "").unwrap();

        let cmd = InstallCommand::detect(&packages(), &app, root);
        assert_eq!(cmd.manager, PackageManager::Yarn);
        assert_eq!(cmd.cwd, app);
    }

    /// Write an executable shell script that records its args and cwd
    #[cfg(unix)]
    fn stub_installer(dir: &Path, exit_code: i32) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("fake-pm");
        let log = dir.join("invocation.txt");
        fs::write(
            &script,
            format!(
                "#!/bin/sh\necho \"$@\" > '{}'\npwd >> '{}'\nexit {}\n",
                log.display(),
                log.display(),
                exit_code
            ),
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    #[cfg(unix)]
    #[test]
    fn test_run_passes_args_and_cwd() {
        let temp_dir = TempDir::new().unwrap();
        let app = temp_dir.path().join("app");
        fs::create_dir_all(&app).unwrap();
        let script = stub_installer(temp_dir.path(), 0);

        InstallCommand::new(PackageManager::Pnpm, &packages(), &app)
            .with_program(&script)
            .run()
            .unwrap();

        let invocation = fs::read_to_string(temp_dir.path().join("invocation.txt")).unwrap();
        let lines: Vec<&str> = invocation.lines().collect();
        assert_eq!(lines[0], "add react@18.2.0 dayjs");
        assert_eq!(fs::canonicalize(lines[1]).unwrap(), fs::canonicalize(&app).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_run_failure_is_install_failed() {
        let temp_dir = TempDir::new().unwrap();
        let script = stub_installer(temp_dir.path(), 3);

        let err = InstallCommand::new(PackageManager::Yarn, &packages(), temp_dir.path())
            .with_program(&script)
            .run()
            .unwrap_err();

        match err.downcast_ref::<DepsizeError>() {
            Some(DepsizeError::InstallFailed { manager, status }) => {
                assert_eq!(manager, "yarn");
                assert!(status.contains('3'), "{}", status);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_run_missing_program() {
        let temp_dir = TempDir::new().unwrap();
        let err = InstallCommand::new(PackageManager::Npm, &packages(), temp_dir.path())
            .with_program(temp_dir.path().join("no-such-installer"))
            .run()
            .unwrap_err();
        assert!(err.to_string().contains("failed to spawn"));
    }

    #[test]
    fn test_build_command_targets_cwd() {
        let cmd = InstallCommand::new(PackageManager::Pnpm, &packages(), "/repo");
        let built = cmd.build_command();
        assert_eq!(built.get_program(), "pnpm");
        assert_eq!(built.get_current_dir(), Some(Path::new("/repo")));
        assert_eq!(built.get_args().count(), 3);
    }
}
