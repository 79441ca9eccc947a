use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

/// Capabilities of the hosting process that storage depends on.
///
/// Implementations decide where the managed storage tree lives and how files are
/// handed to the operating system. Tests substitute their own.
pub trait Host {
    /// Returns the absolute directory that managed relative paths are resolved against.
    fn storage_root(&self) -> io::Result<PathBuf>;

    /// Asks the operating system to open `path` with its default handler.
    fn launch_default(&self, path: &Path) -> io::Result<()>;
}

/// Host backed by the real filesystem and desktop environment.
#[derive(Debug, Clone, Default)]
pub struct SystemHost {
    root: Option<PathBuf>,
}

impl SystemHost {
    /// Uses the process working directory, looked up on every call.
    pub fn new() -> Self {
        SystemHost { root: None }
    }

    /// Uses a fixed storage root.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        SystemHost { root: Some(root.into()) }
    }

    /// Uses `root` when given, otherwise the working directory.
    pub fn from_config(root: Option<PathBuf>) -> Self {
        SystemHost { root }
    }
}

impl Host for SystemHost {
    fn storage_root(&self) -> io::Result<PathBuf> {
        match &self.root {
            Some(root) => Ok(root.clone()),
            None => std::env::current_dir(),
        }
    }

    fn launch_default(&self, path: &Path) -> io::Result<()> {
        debug!("Launching default handler for {}", path.display());
        default_handler_command(path).spawn()?;
        Ok(())
    }
}

#[cfg(target_os = "windows")]
fn default_handler_command(path: &Path) -> Command {
    let mut cmd = Command::new("explorer");
    cmd.arg(path);
    cmd
}

#[cfg(target_os = "macos")]
fn default_handler_command(path: &Path) -> Command {
    let mut cmd = Command::new("open");
    cmd.arg(path);
    cmd
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn default_handler_command(path: &Path) -> Command {
    let mut cmd = Command::new("xdg-open");
    cmd.arg(path);
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_root_is_returned_verbatim() {
        let host = SystemHost::with_root("/srv/docket");
        assert_eq!(host.storage_root().unwrap(), PathBuf::from("/srv/docket"));
    }

    #[test]
    fn unconfigured_root_follows_working_directory() {
        let host = SystemHost::from_config(None);
        assert_eq!(host.storage_root().unwrap(), std::env::current_dir().unwrap());
    }

    #[test]
    fn handler_command_receives_the_path() {
        let cmd = default_handler_command(Path::new("/srv/docket/projects/p/a.pdf"));
        let args: Vec<_> = cmd.get_args().collect();
        assert_eq!(args, vec![std::ffi::OsStr::new("/srv/docket/projects/p/a.pdf")]);
    }
}
