#![allow(deprecated)] // assert_cmd::Command::cargo_bin is deprecated but replacement requires nightly

use predicates::prelude::*;
use std::fs;
use std::path::Path;

fn rewritefs_cmd() -> assert_cmd::Command {
	assert_cmd::Command::cargo_bin("rewritefs").unwrap()
}

/// Canonical source dir as a string, matching what rewritefs prints.
fn source_of(dir: &Path) -> String {
	fs::canonicalize(dir).unwrap().display().to_string()
}

// ============================================================================
// CLI flag tests
// ============================================================================

#[test]
fn test_help_flag() {
	rewritefs_cmd()
		.arg("--help")
		.assert()
		.success()
		.stdout(predicate::str::contains("Path-rewriting filesystem"));
}

#[test]
fn test_version_flag() {
	rewritefs_cmd()
		.arg("--version")
		.assert()
		.success()
		.stdout(predicate::str::contains("rewritefs"));
}

#[test]
fn test_no_args_shows_help() {
	rewritefs_cmd()
		.assert()
		.failure()
		.stderr(predicate::str::contains("Usage"));
}

// ============================================================================
// check subcommand tests
// ============================================================================

#[test]
fn test_check_without_rule_file() {
	let source = tempfile::tempdir().unwrap();

	rewritefs_cmd()
		.args(["check"])
		.arg(source.path())
		.arg("/mnt/rewritefs-test")
		.assert()
		.success()
		.stdout(predicate::str::contains("contexts: 1, rules: 0"))
		.stdout(predicate::str::contains("CTX \"default\":"));
}

#[test]
fn test_check_prints_table() {
	let source = tempfile::tempdir().unwrap();
	let etc = tempfile::tempdir().unwrap();
	let rule_file = etc.path().join("rewritefs.conf");
	fs::write(
		&rule_file,
		"# dotfiles\n/^\\.(\\w+)rc$/ config/\\1/rc\n- /vim/\n/^\\.viminfo$/ .\n",
	)
	.unwrap();

	rewritefs_cmd()
		.arg("check")
		.arg(source.path())
		.arg("/mnt/rewritefs-test")
		.arg("-c")
		.arg(&rule_file)
		.assert()
		.success()
		.stdout(predicate::str::contains("contexts: 2, rules: 2"))
		.stdout(predicate::str::contains("CTX \"vim\":"))
		.stdout(predicate::str::contains("\"^\\.viminfo$\" -> \"(don't rewrite)\""));
}

#[test]
fn test_check_invalid_rule_file() {
	let source = tempfile::tempdir().unwrap();
	let etc = tempfile::tempdir().unwrap();
	let rule_file = etc.path().join("rewritefs.conf");
	fs::write(&rule_file, "/^a/ b\nbogus\n").unwrap();

	rewritefs_cmd()
		.arg("check")
		.arg(source.path())
		.arg("/mnt/rewritefs-test")
		.arg("-c")
		.arg(&rule_file)
		.assert()
		.failure()
		.stderr(predicate::str::contains("Unexpected character"));
}

#[test]
fn test_check_invalid_regex() {
	let source = tempfile::tempdir().unwrap();
	let etc = tempfile::tempdir().unwrap();
	let rule_file = etc.path().join("rewritefs.conf");
	fs::write(&rule_file, "/(unclosed/ b\n").unwrap();

	rewritefs_cmd()
		.arg("check")
		.arg(source.path())
		.arg("/mnt/rewritefs-test")
		.arg("-c")
		.arg(&rule_file)
		.assert()
		.failure()
		.stderr(predicate::str::contains("Invalid regular expression"));
}

#[test]
fn test_check_missing_source() {
	rewritefs_cmd()
		.args(["check", "/nonexistent/rewritefs/source", "/mnt/rewritefs-test"])
		.assert()
		.failure()
		.stderr(predicate::str::contains("Cannot open source directory"));
}

#[test]
fn test_check_rule_file_inside_mount_point() {
	let source = tempfile::tempdir().unwrap();
	let mount = tempfile::tempdir().unwrap();
	let rule_file = mount.path().join("rewritefs.conf");
	fs::write(&rule_file, "").unwrap();

	rewritefs_cmd()
		.arg("check")
		.arg(source.path())
		.arg(mount.path())
		.arg("-c")
		.arg(&rule_file)
		.assert()
		.failure()
		.stderr(predicate::str::contains("must not be located inside the mount point"));
}

#[test]
fn test_check_mount_option_config() {
	let source = tempfile::tempdir().unwrap();
	let etc = tempfile::tempdir().unwrap();
	let rule_file = etc.path().join("rewritefs.conf");
	fs::write(&rule_file, "/^a/ b\n").unwrap();

	rewritefs_cmd()
		.arg("check")
		.arg(source.path())
		.arg("/mnt/rewritefs-test")
		.arg("-o")
		.arg(format!("allow_other,config={},autocreate", rule_file.display()))
		.assert()
		.success()
		.stdout(predicate::str::contains("autocreate: true"))
		.stdout(predicate::str::contains("rules: 1"));
}

// ============================================================================
// resolve subcommand tests
// ============================================================================

#[test]
fn test_resolve_identity_without_rules() {
	let source = tempfile::tempdir().unwrap();
	let expected = format!("{}/some/file.txt\n", source_of(source.path()));

	rewritefs_cmd()
		.arg("resolve")
		.arg(source.path())
		.arg("/mnt/rewritefs-test")
		.arg("/some/file.txt")
		.assert()
		.success()
		.stdout(expected);
}

#[test]
fn test_resolve_backreferences() {
	let source = tempfile::tempdir().unwrap();
	let etc = tempfile::tempdir().unwrap();
	let rule_file = etc.path().join("rewritefs.conf");
	fs::write(&rule_file, "m|^foo/(\\w+)/(\\w+)$| bar/\\2/\\1\n/^keep/ .\n").unwrap();
	let root = source_of(source.path());

	rewritefs_cmd()
		.arg("resolve")
		.arg(source.path())
		.arg("/mnt/rewritefs-test")
		.arg("-c")
		.arg(&rule_file)
		.args(["/foo/alpha/be", "/keep/x", "/other"])
		.assert()
		.success()
		.stdout(format!(
			"{root}/bar/be/alpha\n{root}/keep/x\n{root}/other\n"
		));
}

#[cfg(target_os = "linux")]
#[test]
fn test_resolve_caller_filter_by_pid() {
	let source = tempfile::tempdir().unwrap();
	let etc = tempfile::tempdir().unwrap();
	let rule_file = etc.path().join("rewritefs.conf");
	// the test harness itself is the caller; its pid never matches this filter
	fs::write(
		&rule_file,
		"- /^this-command-never-runs$/\n/^notes/ private\n- //\n/^notes/ shared\n",
	)
	.unwrap();
	let root = source_of(source.path());

	rewritefs_cmd()
		.arg("resolve")
		.arg(source.path())
		.arg("/mnt/rewritefs-test")
		.arg("-c")
		.arg(&rule_file)
		.arg("--pid")
		.arg(std::process::id().to_string())
		.arg("/notes/a")
		.assert()
		.success()
		.stdout(format!("{root}/shared/a\n"));
}

#[test]
fn test_resolve_autocreate() {
	let source = tempfile::tempdir().unwrap();
	let etc = tempfile::tempdir().unwrap();
	let rule_file = etc.path().join("rewritefs.conf");
	fs::write(&rule_file, "/^(\\w+)\\.log$/ logs/\\1/current.log\n").unwrap();
	let root = source_of(source.path());

	rewritefs_cmd()
		.arg("resolve")
		.arg(source.path())
		.arg("/mnt/rewritefs-test")
		.arg("-c")
		.arg(&rule_file)
		.arg("--autocreate")
		.arg("/app.log")
		.assert()
		.success()
		.stdout(format!("{root}/logs/app/current.log\n"));

	assert!(source.path().join("logs/app").is_dir());
}

#[test]
fn test_resolve_verbose_logs_rewrite() {
	let source = tempfile::tempdir().unwrap();
	let etc = tempfile::tempdir().unwrap();
	let rule_file = etc.path().join("rewritefs.conf");
	fs::write(&rule_file, "/^a$/ b\n").unwrap();

	rewritefs_cmd()
		.env_remove("RUST_LOG")
		.arg("resolve")
		.arg(source.path())
		.arg("/mnt/rewritefs-test")
		.arg("-c")
		.arg(&rule_file)
		.args(["-v", "1", "/a"])
		.assert()
		.success()
		.stderr(predicate::str::contains("CTX \"default\":"))
		.stderr(predicate::str::contains("/a -> "));
}

#[test]
fn test_resolve_rejects_relative_path() {
	let source = tempfile::tempdir().unwrap();

	rewritefs_cmd()
		.arg("resolve")
		.arg(source.path())
		.arg("/mnt/rewritefs-test")
		.arg("relative/path")
		.assert()
		.failure()
		.stderr(predicate::str::contains("must start with '/'"));
}
