use std::path::PathBuf;

/// Library-level structured errors for rewritefs.
///
/// All of these are startup-time failures. Per-request problems never surface
/// as errors; they are logged and resolution falls back to the identity mapping.
#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
	#[error("missing source argument")]
	MissingSource,

	#[error("missing mount point argument")]
	MissingMountPoint,

	#[error("Cannot open source directory: {path}")]
	SourceNotFound {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error(
		"configuration file {config} must not be located inside the mount point ({mount_point})"
	)]
	ConfigInsideMountPoint { config: PathBuf, mount_point: PathBuf },

	#[error("Failed to read config file: {path}")]
	ConfigReadError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Unexpected EOF (line {line})")]
	UnexpectedEof { line: usize },

	#[error("Unexpected character {ch:?} (line {line})")]
	UnexpectedChar { ch: char, line: usize },

	#[error("Unknown flag {flag:?} (line {line})")]
	UnknownFlag { flag: char, line: usize },

	#[error("Invalid regular expression: {pattern}")]
	InvalidPattern {
		pattern: String,
		#[source]
		source: regex::Error,
	},

	#[error("Invalid mount option value: {option}")]
	InvalidOption { option: String },
}

/// Result type alias using RewriteError.
pub type Result<T> = std::result::Result<T, RewriteError>;
