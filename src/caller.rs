//! Identification of the process behind a filesystem request.

use std::path::PathBuf;
use tracing::debug;

/// Reader for per-process metadata under a procfs mount.
#[derive(Debug, Clone)]
pub struct ProcFs {
	root: PathBuf,
}

impl Default for ProcFs {
	fn default() -> Self {
		ProcFs {
			root: PathBuf::from("/proc"),
		}
	}
}

impl ProcFs {
	/// Use a procfs-like tree rooted somewhere other than `/proc`.
	pub fn new(root: impl Into<PathBuf>) -> Self {
		ProcFs { root: root.into() }
	}

	/// Command line of `pid`, arguments separated by single spaces. The bytes
	/// are returned as read, they need not be valid UTF-8.
	///
	/// Returns an empty command line if the process metadata cannot be read, e.g.
	/// because the process already exited.
	pub fn cmdline(&self, pid: u32) -> Vec<u8> {
		let path = self.root.join(pid.to_string()).join("cmdline");
		match std::fs::read(&path) {
			Ok(mut raw) => {
				for byte in raw.iter_mut().filter(|b| **b == 0) {
					*byte = b' ';
				}
				raw
			}
			Err(e) => {
				debug!("cannot read {}: {}", path.display(), e);
				Vec::new()
			}
		}
	}
}

/// Command line of `pid` as read from `/proc`.
pub fn caller_cmdline(pid: u32) -> Vec<u8> {
	ProcFs::default().cmdline(pid)
}
