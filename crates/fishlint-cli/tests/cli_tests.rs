//! End-to-end tests for the fishlint CLI, against files on disk.

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use fishlint_cli::{check, load_config, read_inputs, run, Args};
use fishlint_kernel::ErrorCode;
use tempfile::TempDir;

fn args(dir: &Path, rest: &[&str]) -> Args {
    let config = dir.join("fishlint.toml");
    if !config.exists() {
        fs::write(&config, "").unwrap();
    }
    let mut argv = vec![
        "fishlint".to_string(),
        "--no-color".to_string(),
        "--config".to_string(),
        config.display().to_string(),
    ];
    argv.extend(rest.iter().map(|s| s.to_string()));
    Args::try_parse_from(argv).unwrap()
}

fn codes(dir: &Path, rest: &[&str]) -> Vec<Vec<ErrorCode>> {
    let args = args(dir, rest);
    let config = load_config(&args).unwrap();
    read_inputs(&args)
        .unwrap()
        .iter()
        .map(|input| {
            check(input, &config)
                .unwrap()
                .diagnostics
                .iter()
                .map(|d| d.code)
                .collect()
        })
        .collect()
}

#[test]
fn functions_directory_marks_files_autoloaded() {
    let dir = TempDir::new().unwrap();
    let functions = dir.path().join("functions");
    fs::create_dir(&functions).unwrap();
    let file = functions.join("mkcd.fish");
    fs::write(&file, "function other\nend\n").unwrap();

    let found = codes(dir.path(), &[file.to_str().unwrap()]);
    assert_eq!(found, [[ErrorCode::MissingAutoloadedFunctionName]]);
}

#[test]
fn autoload_name_flag_overrides_the_path() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("script.fish");
    fs::write(&file, "function mkcd\nend\n").unwrap();

    let plain = codes(dir.path(), &[file.to_str().unwrap()]);
    assert_eq!(plain, [[ErrorCode::PrivateHelperFunction]]);

    // the matching name still lacks the `_` prefix
    let autoloaded = codes(
        dir.path(),
        &["--autoload-name", "mkcd", file.to_str().unwrap()],
    );
    assert_eq!(autoloaded, [[ErrorCode::PrivateHelperFunction]]);

    let mismatched = codes(
        dir.path(),
        &["--autoload-name", "other", file.to_str().unwrap()],
    );
    assert_eq!(mismatched, [[ErrorCode::MissingAutoloadedFunctionName]]);
}

#[test]
fn config_file_and_disable_flag_combine() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("fishlint.toml"),
        "disable = [\"universalVariable\"]\n",
    )
    .unwrap();
    let file = dir.path().join("vars.fish");
    fs::write(&file, "set -U A 1\nset MY_PATH x\nset --path B y\n").unwrap();

    let found = codes(dir.path(), &["--disable", "4003", file.to_str().unwrap()]);
    assert_eq!(found, [[ErrorCode::PathVariable]]);
}

#[test]
fn each_file_gets_its_own_pass() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.fish");
    let b = dir.path().join("b.fish");
    fs::write(&a, "function _f; end\n").unwrap();
    fs::write(&b, "function _f; end\n").unwrap();

    let found = codes(dir.path(), &[a.to_str().unwrap(), b.to_str().unwrap()]);
    assert_eq!(found, [Vec::<ErrorCode>::new(), Vec::new()]);
}

#[test]
fn directory_expands_to_its_fish_files() {
    let dir = TempDir::new().unwrap();
    let conf = dir.path().join("conf.d");
    fs::create_dir_all(conf.join("nested")).unwrap();
    fs::write(conf.join("b.fish"), "set -U B 1\n").unwrap();
    fs::write(conf.join("a.fish"), "function _a; end\n").unwrap();
    fs::write(conf.join("nested").join("c.fish"), "end\n").unwrap();
    fs::write(conf.join("notes.txt"), "end\n").unwrap();

    let args = args(dir.path(), &[conf.to_str().unwrap()]);
    let labels: Vec<String> = read_inputs(&args)
        .unwrap()
        .into_iter()
        .map(|input| input.label)
        .collect();
    let expected: Vec<String> = [
        conf.join("a.fish"),
        conf.join("b.fish"),
        conf.join("nested").join("c.fish"),
    ]
    .iter()
    .map(|p| p.display().to_string())
    .collect();
    assert_eq!(labels, expected);

    let found = codes(dir.path(), &[conf.to_str().unwrap()]);
    assert_eq!(
        found,
        [
            vec![],
            vec![ErrorCode::UniversalVariable],
            vec![ErrorCode::ExtraEnd],
        ]
    );
}

#[test]
fn exit_status_reflects_errors() {
    let dir = TempDir::new().unwrap();
    let clean = dir.path().join("clean.fish");
    let broken = dir.path().join("broken.fish");
    fs::write(&clean, "set -U X 1\n").unwrap();
    fs::write(&broken, "if true\n  echo\n").unwrap();

    let status = run(args(dir.path(), &[clean.to_str().unwrap()])).unwrap();
    assert_eq!(status, ExitCode::SUCCESS);

    let status = run(args(dir.path(), &[broken.to_str().unwrap()])).unwrap();
    assert_eq!(status, ExitCode::from(1));
}

#[test]
fn missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.fish");
    let err = read_inputs(&args(dir.path(), &[missing.to_str().unwrap()])).unwrap_err();
    assert!(err.to_string().contains("nope.fish"), "{err}");
}

#[test]
fn malformed_config_is_an_error() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("fishlint.toml"), "disable = [\"bogus\"]\n").unwrap();
    assert!(load_config(&args(dir.path(), &[])).is_err());
}
