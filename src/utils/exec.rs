//! External command execution for delegated transforms.
//!
//! Stylus compilation and the optional lint command are plain subprocesses:
//! source bytes go in on stdin (or as a path argument), stdout comes back.
//!
//! ```ignore
//! use crate::utils::exec::Cmd;
//!
//! let css = Cmd::from_slice(&["stylus", "--include", "src/stylus"])
//!     .stdin(source)
//!     .run()?
//!     .stdout;
//! ```

use anyhow::{Context, Result, bail};
use std::{
    ffi::{OsStr, OsString},
    io::Write,
    path::{Path, PathBuf},
    process::{Command, Output, Stdio},
};

/// Command builder for external process execution.
#[derive(Debug, Default)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    stdin_data: Option<Vec<u8>>,
}

impl Cmd {
    /// Create from a command array (e.g., `["stylus"]` or `["npx", "eslint"]`).
    pub fn from_slice<S: AsRef<OsStr>>(cmd: &[S]) -> Self {
        let mut iter = cmd.iter();
        let program = iter
            .next()
            .map(|s| s.as_ref().to_owned())
            .unwrap_or_default();
        let args: Vec<_> = iter.map(|s| s.as_ref().to_owned()).collect();
        Self {
            program,
            args,
            ..Default::default()
        }
    }

    /// Set working directory.
    pub fn cwd<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.cwd = Some(dir.as_ref().to_owned());
        self
    }

    /// Set stdin data to pipe to the process.
    pub fn stdin<D: AsRef<[u8]>>(mut self, data: D) -> Self {
        self.stdin_data = Some(data.as_ref().to_vec());
        self
    }

    fn program_name(&self) -> String {
        self.program.to_string_lossy().to_string()
    }

    /// Execute the command, failing on spawn errors and non-zero exit.
    pub fn run(self) -> Result<Output> {
        let name = self.program_name();
        if name.is_empty() {
            bail!("empty command");
        }

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(if self.stdin_data.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }

        let mut child = cmd
            .spawn()
            .with_context(|| format!("Failed to spawn `{name}`"))?;

        // Feed stdin while stdout is drained
        let writer = match (child.stdin.take(), self.stdin_data) {
            (Some(mut stdin), Some(data)) => Some(std::thread::spawn(move || stdin.write_all(&data))),
            _ => None,
        };

        let output = child
            .wait_with_output()
            .with_context(|| format!("Failed to wait for `{name}`"))?;

        if let Some(handle) = writer {
            match handle.join() {
                Ok(result) => {
                    result.with_context(|| format!("Failed to write stdin to `{name}`"))?
                }
                Err(_) => bail!("stdin writer for `{name}` panicked"),
            }
        }

        if !output.status.success() {
            bail!(format_error(&name, &output));
        }

        Ok(output)
    }
}

/// Error message with the process status and its trimmed output.
fn format_error(name: &str, output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let detail = [stderr.trim(), stdout.trim()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    if detail.is_empty() {
        format!("`{name}` exited with {}", output.status)
    } else {
        format!("`{name}` exited with {}\n{detail}", output.status)
    }
}

/// Replace `$FILE` / `$DIR` placeholders in command arguments.
pub fn resolve_args(args: &[String], file: &Path) -> Vec<String> {
    let file_str = file.display().to_string();
    let dir_str = file
        .parent()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    args.iter()
        .map(|arg| arg.replace("$FILE", &file_str).replace("$DIR", &dir_str))
        .collect()
}
