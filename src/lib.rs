//! rewritefs - path-rewriting layer for a mirrored filesystem.
//!
//! This library provides the core of rewritefs, including:
//! - Rule file parsing into per-caller contexts
//! - Matching virtual paths and substituting backreferences
//! - Identifying the calling process by its command line
//! - Creating missing parent directories as the requesting user
//!
//! # Example
//!
//! ```no_run
//! use rewritefs::config::{MountOptions, initialize};
//! use rewritefs::rules::{RequestContext, Resolver};
//! use std::path::{Path, PathBuf};
//! use std::sync::Arc;
//!
//! let options = MountOptions {
//!     source: Some(PathBuf::from("/home/user")),
//!     mount_point: Some(PathBuf::from("/mnt/home")),
//!     config_file: Some(PathBuf::from("/etc/rewritefs.conf")),
//!     ..Default::default()
//! };
//! let resolver = Resolver::new(Arc::new(initialize(&options).unwrap()));
//!
//! let request = RequestContext { pid: 1234, uid: 1000, gid: 1000 };
//! let real = resolver.resolve(Path::new("/.vimrc"), &request);
//! println!("{}", real.display());
//! ```

pub mod autocreate;
pub mod caller;
pub mod config;
pub mod error;
pub mod rules;

pub use error::{Result, RewriteError};
