//! Creation of missing parent directories on behalf of the requesting user.
//!
//! The effective uid/gid are process-wide, so every impersonation is
//! serialized behind [`PRIVILEGE_LOCK`].

use nix::unistd::{Gid, Uid, getegid, geteuid, setegid, seteuid};
use parking_lot::{Mutex, const_mutex};
use std::fs::DirBuilder;
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};
use tracing::warn;

static PRIVILEGE_LOCK: Mutex<()> = const_mutex(());

/// Why parent directories could not be created.
#[derive(Debug, thiserror::Error)]
pub enum AutocreateError {
	#[error("could not set EGID to {gid}")]
	SetEgid {
		gid: u32,
		#[source]
		source: nix::Error,
	},

	#[error("could not set EUID to {uid}")]
	SetEuid {
		uid: u32,
		#[source]
		source: nix::Error,
	},

	#[error("could not create {path}")]
	CreateDir {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
}

/// Effective ids switched to another user. Dropping it restores the ids
/// that were in effect when it was created.
struct Impersonation {
	euid: Uid,
	egid: Gid,
}

impl Impersonation {
	fn begin(uid: u32, gid: u32) -> Result<Self, AutocreateError> {
		let saved = Impersonation {
			euid: geteuid(),
			egid: getegid(),
		};

		// group first: after giving up root the group can no longer change
		setegid(Gid::from_raw(gid)).map_err(|source| AutocreateError::SetEgid { gid, source })?;
		seteuid(Uid::from_raw(uid)).map_err(|source| AutocreateError::SetEuid { uid, source })?;

		Ok(saved)
	}
}

impl Drop for Impersonation {
	fn drop(&mut self) {
		if let Err(e) = seteuid(self.euid) {
			warn!("could not restore EUID {}: {}", self.euid, e);
		}
		if let Err(e) = setegid(self.egid) {
			warn!("could not restore EGID {}: {}", self.egid, e);
		}
	}
}

/// Create every missing ancestor directory of `path` as `uid`/`gid`.
///
/// Directories get mode 0777 filtered through the daemon's umask.
pub fn ensure_parents(path: &Path, uid: u32, gid: u32) -> Result<(), AutocreateError> {
	let Some(parent) = path.parent() else {
		return Ok(());
	};
	if parent.as_os_str().is_empty() || parent.is_dir() {
		return Ok(());
	}

	let _lock = PRIVILEGE_LOCK.lock();
	let _identity = Impersonation::begin(uid, gid)?;

	DirBuilder::new()
		.recursive(true)
		.mode(0o777)
		.create(parent)
		.map_err(|source| AutocreateError::CreateDir {
			path: parent.to_path_buf(),
			source,
		})
}
