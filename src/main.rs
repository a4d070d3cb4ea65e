//! `instutils` - command-line front end for the installer utilities
//!
//! Without arguments, detects the real OS version and build and prints a
//! summary. With arguments, runs one host call the way an installer script
//! would: `instutils VerifyRealOsVersion 6 1 0` pushes the arguments, invokes
//! the call and prints the resulting stack, top first.

use anyhow::{Context, Result};
use instutils::{
    config::ConfigManager,
    host::{self, HostStack},
    utils,
    version::{self, VersionDetector},
};
use tracing::{error, info, warn};

fn main() -> Result<()> {
    utils::init_logging().context("Failed to initialize logging system")?;

    info!("instutils v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = ConfigManager::load().context("Failed to load configuration")?;
    utils::set_verbose(config.verbose);

    let detector = VersionDetector::system().with_initial_build_step(config.initial_build_step);
    info!("Using version source: {}", detector.source_name());
    if version::detector::install(detector).is_err() {
        warn!("Global detector was already installed, keeping the existing one");
    }
    let detector = version::detector::global();

    let mut args = std::env::args().skip(1);
    match args.next() {
        Some(call) => run_call(detector, &call, args.collect()),
        None => {
            log_detection_summary(detector);
            Ok(())
        }
    }
}

/// Runs a single host call with `args` given in parameter order
fn run_call(detector: &VersionDetector, call: &str, args: Vec<String>) -> Result<()> {
    let mut stack = HostStack::new();
    // The first parameter must end up on top
    for arg in args.into_iter().rev() {
        stack.push_str(arg);
    }

    host::invoke_by_name(detector, call, &mut stack);

    let results = stack.drain();
    if results.first().map(String::as_str) == Some(host::ERROR_SENTINEL) {
        error!("{call} failed");
    }
    for value in results {
        println!("{value}");
    }
    Ok(())
}

/// Log and print what the detector finds on this machine
fn log_detection_summary(detector: &VersionDetector) {
    info!("=== Detection Summary ===");

    match detector.real_os_version() {
        Ok(version) => {
            info!(
                "Real version: {} (reported version overridden: {})",
                version.version, version.overridden
            );
            println!("Version:  {}", version.version);
            println!("Shimmed:  {}", version.overridden);
        }
        Err(e) => {
            error!("Version detection failed: {e}");
            println!("Version:  {e}");
        }
    }

    match detector.real_os_build() {
        Ok(build) => {
            info!(
                "Real build: {} (reported build overridden: {})",
                build.build, build.overridden
            );
            println!("Build:    {}", build.build);
        }
        Err(e) => {
            error!("Build detection failed: {e}");
            println!("Build:    {e}");
        }
    }

    if let Ok(name) = detector.real_os_name() {
        info!("Friendly name: {name}");
        println!("Name:     {name}");
    }
    if let Ok(server) = detector.server_edition() {
        let edition = if server { "server" } else { "workstation" };
        info!("Edition: {edition}");
        println!("Edition:  {edition}");
    }

    let stats = detector.stats();
    info!(
        "Cache commits: version={}, build={}, discarded={}",
        stats.version_commits, stats.build_commits, stats.discarded
    );
    info!("=== End Detection Summary ===");
}
