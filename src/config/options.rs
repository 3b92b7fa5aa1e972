use crate::config::parser::parse_rule_file;
use crate::config::types::{Config, RuleSet};
use crate::error::{Result, RewriteError};
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;

/// Startup options, as given on the command line or in `-o` mount options.
#[derive(Debug, Clone, Default)]
pub struct MountOptions {
	/// Directory the mount point is backed by.
	pub source: Option<PathBuf>,

	pub mount_point: Option<PathBuf>,

	/// Rule file. Without one every path maps straight onto the source.
	pub config_file: Option<PathBuf>,

	/// Create missing parent directories of rewritten paths.
	pub autocreate: bool,

	/// Debug output level, 0 to 4.
	pub verbose: u8,
}

impl MountOptions {
	/// Apply a comma-separated mount option string (`config=PATH,verbose=N,autocreate`).
	///
	/// Options rewritefs does not know are returned in order for the mounting layer.
	pub fn apply_mount_options(&mut self, options: &str) -> Result<Vec<String>> {
		let mut passthrough = Vec::new();

		for option in options.split(',').filter(|o| !o.is_empty()) {
			match option.split_once('=') {
				Some(("config", path)) => self.config_file = Some(PathBuf::from(path)),
				Some(("verbose", level)) => {
					self.verbose = level.parse().map_err(|_| RewriteError::InvalidOption {
						option: option.to_string(),
					})?;
				}
				None if option == "autocreate" => self.autocreate = true,
				_ => passthrough.push(option.to_string()),
			}
		}

		Ok(passthrough)
	}
}

/// Build the process-wide configuration.
///
/// Canonicalizes the source directory, refuses a rule file located inside the
/// mount point, and parses the rule file when one is given.
pub fn initialize(options: &MountOptions) -> Result<Config> {
	let source = options.source.as_ref().ok_or(RewriteError::MissingSource)?;
	let mount_point = options
		.mount_point
		.as_ref()
		.ok_or(RewriteError::MissingMountPoint)?;

	let source = std::fs::canonicalize(source).map_err(|e| RewriteError::SourceNotFound {
		path: source.clone(),
		source: e,
	})?;

	let rules = match &options.config_file {
		Some(config_file) => {
			// plain prefix comparison, "/mnt/x" also rejects "/mnt/xyz.conf"
			if config_file
				.as_os_str()
				.as_bytes()
				.starts_with(mount_point.as_os_str().as_bytes())
			{
				return Err(RewriteError::ConfigInsideMountPoint {
					config: config_file.clone(),
					mount_point: mount_point.clone(),
				});
			}
			parse_rule_file(config_file)?
		}
		None => RuleSet::default(),
	};

	let config = Config::new(source, mount_point.clone())
		.with_rules(rules)
		.with_verbose(options.verbose)
		.with_autocreate(options.autocreate);

	if options.config_file.is_some() {
		config.rules.log_table();
	}

	Ok(config)
}
