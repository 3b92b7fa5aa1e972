use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use nix::unistd::{getegid, geteuid, getppid};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use rewritefs::config::{Config, MountOptions, initialize};
use rewritefs::rules::{RequestContext, Resolver};

#[derive(Parser)]
#[command(name = "rewritefs")]
#[command(
	author,
	version,
	about = "Path-rewriting filesystem core with per-caller rule contexts"
)]
#[command(arg_required_else_help = true)]
struct Cli {
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Load the rule file and print the parsed context/rule table
	Check {
		#[command(flatten)]
		mount: MountArgs,
	},
	/// Print the real path each virtual path resolves to
	Resolve {
		#[command(flatten)]
		mount: MountArgs,

		/// Process whose command line is matched against caller filters
		/// (defaults to the parent process)
		#[arg(long)]
		pid: Option<u32>,

		/// User id directories are autocreated as (defaults to the effective uid)
		#[arg(long)]
		uid: Option<u32>,

		/// Group id directories are autocreated as (defaults to the effective gid)
		#[arg(long)]
		gid: Option<u32>,

		/// Virtual paths, relative to the mount point and starting with '/'
		#[arg(required = true)]
		paths: Vec<PathBuf>,
	},
}

#[derive(Args)]
struct MountArgs {
	/// Source directory backing the mount point
	source: PathBuf,

	/// Mount point the rewritten tree is exposed at
	mount_point: PathBuf,

	/// Path to the rule file
	#[arg(short = 'c', long = "config", value_name = "CONFIG")]
	config: Option<PathBuf>,

	/// Verbose level, 0 to 4
	#[arg(short = 'v', long, value_name = "LEVEL", default_value_t = 0)]
	verbose: u8,

	/// Create missing parent directories of rewritten paths
	#[arg(long)]
	autocreate: bool,

	/// Mount options: config=PATH, verbose=N, autocreate
	#[arg(short = 'o', value_name = "OPT[,OPT...]")]
	options: Vec<String>,
}

impl MountArgs {
	/// Startup options plus the `-o` options rewritefs does not use itself.
	fn to_options(&self) -> Result<(MountOptions, Vec<String>)> {
		let mut options = MountOptions {
			source: Some(self.source.clone()),
			mount_point: Some(self.mount_point.clone()),
			config_file: self.config.clone(),
			autocreate: self.autocreate,
			verbose: self.verbose,
		};

		let mut ignored = Vec::new();
		for opts in &self.options {
			ignored.extend(
				options
					.apply_mount_options(opts)
					.with_context(|| format!("Invalid mount options: {}", opts))?,
			);
		}

		Ok((options, ignored))
	}
}

fn main() -> ExitCode {
	match run() {
		Ok(code) => code,
		Err(e) => {
			eprintln!("error: {e:?}");
			ExitCode::FAILURE
		}
	}
}

fn run() -> Result<ExitCode> {
	let cli = Cli::parse();

	match cli.command {
		Commands::Check { mount } => {
			let config = load(&mount)?;
			handle_check(&config)
		}
		Commands::Resolve {
			mount,
			pid,
			uid,
			gid,
			paths,
		} => {
			let config = load(&mount)?;
			let request = RequestContext {
				pid: pid.unwrap_or_else(|| getppid().as_raw() as u32),
				uid: uid.unwrap_or_else(|| geteuid().as_raw()),
				gid: gid.unwrap_or_else(|| getegid().as_raw()),
			};
			handle_resolve(config, &request, &paths)
		}
	}
}

/// Parse options, set up logging for the resulting verbosity and build the config.
fn load(mount: &MountArgs) -> Result<Config> {
	let (options, ignored) = mount.to_options()?;
	init_tracing(options.verbose);
	for option in ignored {
		tracing::debug!("ignoring mount option {}", option);
	}

	initialize(&options).context("Failed to initialize rewritefs")
}

fn init_tracing(verbose: u8) {
	let level = match verbose {
		0 => "warn",
		1 => "info",
		2 => "debug",
		_ => "trace",
	};
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(false)
		.without_time()
		.init();
}

fn handle_check(config: &Config) -> Result<ExitCode> {
	println!("# source: {}", config.source_root.to_string_lossy());
	println!("# mount point: {}", config.mount_point.display());
	println!("# autocreate: {}", config.autocreate);
	println!(
		"# contexts: {}, rules: {}",
		config.rules.contexts().len(),
		config.rules.rule_count()
	);
	println!();
	print!("{}", config.rules);

	Ok(ExitCode::SUCCESS)
}

fn handle_resolve(config: Config, request: &RequestContext, paths: &[PathBuf]) -> Result<ExitCode> {
	let resolver = Resolver::new(Arc::new(config));

	for path in paths {
		if !path.has_root() {
			anyhow::bail!("Virtual path must start with '/': {}", path.display());
		}
		let real = resolver.resolve(path, request);
		println!("{}", real.display());
	}

	Ok(ExitCode::SUCCESS)
}
