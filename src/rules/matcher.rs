use crate::autocreate::ensure_parents;
use crate::caller::ProcFs;
use crate::config::types::{Config, Rewrite, Rule};
use regex::bytes::Captures;
use std::ffi::OsString;
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Identity of the process behind a filesystem request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
	pub pid: u32,
	pub uid: u32,
	pub gid: u32,
}

/// Maps virtual paths under the mount point onto real paths in the source tree.
///
/// Holds no per-request state, so a single resolver can serve concurrent
/// requests.
#[derive(Debug, Clone)]
pub struct Resolver {
	config: Arc<Config>,
	procfs: ProcFs,
}

impl Resolver {
	pub fn new(config: Arc<Config>) -> Self {
		Resolver {
			config,
			procfs: ProcFs::default(),
		}
	}

	/// Read caller command lines from `procfs` instead of `/proc`.
	pub fn with_procfs(mut self, procfs: ProcFs) -> Self {
		self.procfs = procfs;
		self
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	/// Resolve `path` (absolute, relative to the mount point) to a real path.
	///
	/// The first context whose caller filter matches and which holds a rule
	/// matching the path decides the result. A context without a matching rule
	/// passes the path on to the next context. Paths nothing matches map
	/// straight onto the source root.
	pub fn resolve(&self, path: &Path, request: &RequestContext) -> PathBuf {
		let path = path.as_os_str().as_bytes();
		let relative = path.strip_prefix(b"/").unwrap_or(path);
		let mut caller: Option<Vec<u8>> = None;

		trace!("{}:", String::from_utf8_lossy(path));

		for ctx in self.config.rules.contexts() {
			match &ctx.filter {
				Some(filter) => {
					let cmdline = caller.get_or_insert_with(|| self.procfs.cmdline(request.pid));
					if !filter.is_match(cmdline.as_slice()) {
						trace!("  CTX NOMATCH \"{}\"", filter);
						continue;
					}
					trace!("  CTX OK \"{}\"", filter);
				}
				None => trace!("  CTX DEFAULT"),
			}

			for rule in &ctx.rules {
				match rule.pattern.captures(relative) {
					Some(captures) => {
						trace!("    RULE OK \"{}\" \"{}\"", rule.pattern, rule.rewrite);
						return self.apply_rule(path, relative, rule, &captures, request);
					}
					None => trace!("    RULE NOMATCH \"{}\"", rule.pattern),
				}
			}
		}

		self.identity(path)
	}

	/// The source root followed by the unmodified virtual path.
	fn identity(&self, path: &[u8]) -> PathBuf {
		let mut real = self.config.source_root.clone().into_vec();
		real.extend_from_slice(path);
		let real = PathBuf::from(OsString::from_vec(real));
		debug!(
			"  (ignored) {} -> {}",
			String::from_utf8_lossy(path),
			real.display()
		);
		real
	}

	fn apply_rule(
		&self,
		path: &[u8],
		relative: &[u8],
		rule: &Rule,
		captures: &Captures<'_>,
		request: &RequestContext,
	) -> PathBuf {
		let template = match &rule.rewrite {
			Rewrite::Identity => return self.identity(path),
			Rewrite::Template(template) => template,
		};

		// match offsets are relative to the path without its leading '/'
		let offset = path.len() - relative.len();
		let (start, end) = captures
			.get(0)
			.map(|m| (m.start() + offset, m.end() + offset))
			.unwrap_or((offset, offset));
		let rendered = template.render(captures);

		if self.config.verbose >= 4 {
			trace!("  orig_fs = {}", self.config.source_root.to_string_lossy());
			trace!("  begin = {}", String::from_utf8_lossy(&path[..start]));
			trace!("  rewritten = {}", String::from_utf8_lossy(&rendered));
			trace!("  end = {}", String::from_utf8_lossy(&path[end..]));
		}

		let source_root = self.config.source_root.as_bytes();
		let mut real = Vec::with_capacity(source_root.len() + path.len() + rendered.len());
		real.extend_from_slice(source_root);
		real.extend_from_slice(&path[..start]);
		real.extend_from_slice(&rendered);
		real.extend_from_slice(&path[end..]);
		let real = PathBuf::from(OsString::from_vec(real));

		if self.config.autocreate
			&& let Err(e) = ensure_parents(&real, request.uid, request.gid)
		{
			warn!(
				"{} -> {}: autocreating parents failed: {}",
				String::from_utf8_lossy(path),
				real.display(),
				e
			);
		}

		info!("  {} -> {}", String::from_utf8_lossy(path), real.display());
		real
	}
}
