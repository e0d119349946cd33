use std::env;

use xshell::cmd;

type DynError = Box<dyn std::error::Error>;
type Result<T> = std::result::Result<T, DynError>;

/// 64-bit Raspberry Pi OS.
const PI_TARGET: &str = "aarch64-unknown-linux-gnu";

/// Each task: name, summary, action.
const TASKS: &[(&str, &str, fn() -> Result<()>)] = &[
    ("ci", "Formats, builds, lints and tests, as CI does.", ci),
    ("check_fmt", "Checks formatting of the workspace.", check_fmt),
    ("build", "Builds the tracker, calibrate and scoreboard binaries.", build),
    ("clippy", "Lints every target with warnings denied.", clippy),
    ("test", "Runs unit and integration tests.", test),
    ("build_pi", "Cross-builds release binaries for the car's Raspberry Pi.", build_pi),
];

fn main() {
    let task = env::args().nth(1);
    let found = TASKS
        .iter()
        .find(|(name, _, _)| Some(*name) == task.as_deref());
    let result = match found {
        Some((_, _, action)) => action(),
        None => {
            print_help();
            Ok(())
        }
    };
    if let Err(e) = result {
        eprintln!("xtask {}: {}", task.unwrap_or_default(), e);
        std::process::exit(1);
    }
}

fn print_help() {
    eprintln!("score-drive tasks (cargo xtask <task>):");
    for (name, summary, _) in TASKS {
        eprintln!("  {:<10} {}", name, summary);
    }
}

fn ci() -> Result<()> {
    check_fmt()?;
    build()?;
    clippy()?;
    test()?;
    if env::var_os("SCORE_DRIVE_CI_PI").is_some() {
        build_pi()?;
    }

    eprintln!("Done!");

    Ok(())
}

fn check_fmt() -> Result<()> {
    eprintln!("Checking formatting...");
    cmd!("cargo fmt --all -- --check").run()?;
    Ok(())
}

fn build() -> Result<()> {
    eprintln!("Building binaries...");
    cmd!("cargo build --bins")
        .env("RUSTFLAGS", "-D warnings")
        .run()?;

    eprintln!("Building library without logging...");
    cmd!("cargo build --lib --no-default-features")
        .env("RUSTFLAGS", "-D warnings")
        .run()?;

    Ok(())
}

fn clippy() -> Result<()> {
    eprintln!("Linting...");
    cmd!("cargo clippy --all-targets -- -D warnings").run()?;
    Ok(())
}

fn test() -> Result<()> {
    eprintln!("Testing...");
    cmd!("cargo test").run()?;
    Ok(())
}

fn build_pi() -> Result<()> {
    eprintln!("Cross-building for {}...", PI_TARGET);
    cmd!("cargo build --release --bins --target {PI_TARGET}").run()?;
    eprintln!("Binaries are in target/{}/release", PI_TARGET);
    Ok(())
}
