//! Locating and spawning the Playwright driver process.
//!
//! Resolution order:
//! 1. `PLAYWRIGHT_DRIVER_PATH` pointing at an unpacked driver (`node` + `package/cli.js`).
//! 2. A `playwright` executable on `PATH` (`npm i -g playwright`).
//! 3. `npx playwright` as a last resort.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use crate::error::{Error, Result};

/// Environment variable naming an unpacked driver directory.
pub const DRIVER_PATH_ENV: &str = "PLAYWRIGHT_DRIVER_PATH";

/// Program and arguments that start `playwright run-driver`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverCommand {
	pub program: PathBuf,
	pub args: Vec<OsString>,
}

impl DriverCommand {
	/// Driver bundled as `<dir>/node` + `<dir>/package/cli.js`.
	pub fn from_driver_dir(dir: &Path) -> Option<Self> {
		let node = dir.join(if cfg!(windows) { "node.exe" } else { "node" });
		let cli = dir.join("package").join("cli.js");
		(node.is_file() && cli.is_file()).then(|| Self {
			program: node,
			args: vec![cli.into_os_string(), "run-driver".into()],
		})
	}

	/// Resolves the driver from the environment and `PATH`.
	pub fn locate() -> Result<Self> {
		if let Some(dir) = std::env::var_os(DRIVER_PATH_ENV) {
			let dir = PathBuf::from(dir);
			return Self::from_driver_dir(&dir).ok_or_else(|| {
				Error::DriverNotFound(format!(
					"{DRIVER_PATH_ENV}={} does not contain node and package/cli.js",
					dir.display()
				))
			});
		}

		if let Ok(playwright) = which::which("playwright") {
			return Ok(Self {
				program: playwright,
				args: vec!["run-driver".into()],
			});
		}

		if let Ok(npx) = which::which("npx") {
			return Ok(Self {
				program: npx,
				args: vec!["--yes".into(), "playwright".into(), "run-driver".into()],
			});
		}

		Err(Error::DriverNotFound(format!(
			"install Playwright (`npm i -g playwright && playwright install chromium`) or set {DRIVER_PATH_ENV}"
		)))
	}

	/// Spawns the driver with piped stdio. The child is killed when dropped.
	pub fn spawn(&self) -> Result<(Child, ChildStdin, ChildStdout)> {
		tracing::debug!(target = "unipfp.runtime", program = %self.program.display(), "spawning Playwright driver");

		let mut child = Command::new(&self.program)
			.args(&self.args)
			.stdin(Stdio::piped())
			.stdout(Stdio::piped())
			.stderr(Stdio::inherit())
			.kill_on_drop(true)
			.spawn()
			.map_err(|e| Error::Launch(format!("{}: {e}", self.program.display())))?;

		let stdin = child.stdin.take().ok_or_else(|| Error::Launch("driver stdin unavailable".into()))?;
		let stdout = child.stdout.take().ok_or_else(|| Error::Launch("driver stdout unavailable".into()))?;
		Ok((child, stdin, stdout))
	}
}
