//! GPUVoyeur layer installer.
//!
//! Copies the layer descriptor into place for the host's Vulkan loader and,
//! depending on the OS, patches its library path or registers it in the
//! registry.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use gpuvoyeur_install::{
    find_project_root, ActivationMode, InstallConfig, InstallError, LayerInstaller,
};
use tracing::{debug, error, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "gpuvoyeur-install")]
#[command(about = "Install the GPUVoyeur layer onto your system")]
struct Args {
    /// Layer install type: explicit or implicit (e, exp, i, imp also accepted)
    #[arg(long = "layerMode", visible_alias = "layer-mode", default_value = "explicit")]
    layer_mode: String,

    /// (POSIX only) Layer search path, if in a non-traditional location
    #[arg(long = "layerSearchPath", visible_alias = "layer-search-path")]
    layer_search_path: Option<PathBuf>,

    /// Complete PerfHaus.cfg install path (not used by the layer install)
    #[arg(long = "configInstallPath", visible_alias = "config-install-path")]
    config_install_path: Option<PathBuf>,

    /// Project root holding resources/ and bin/ (defaults to the nearest
    /// ancestor of the executable that has a resources/ directory)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Set up logging; RUST_LOG overrides --debug
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str().to_lowercase()));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            match err.downcast_ref::<InstallError>() {
                Some(install_err) => {
                    if install_err.is_pre_install() {
                        info!("No files were changed");
                    }
                    ExitCode::from(install_err.exit_code())
                }
                None => ExitCode::FAILURE,
            }
        }
    }
}

fn run(args: Args) -> Result<()> {
    let mode = ActivationMode::parse(&args.layer_mode)?;
    let root = resolve_root(args.root)?;
    info!("Project root: {}", root.display());

    let config = InstallConfig::new(&root, mode)
        .with_search_path(args.layer_search_path)
        .with_config_install_path(args.config_install_path);
    debug!("Install config: {:?}", config);

    let report = LayerInstaller::new(config)?.run()?;
    debug!("Install report: {:?}", report);

    if let Some(installed) = &report.installed_descriptor {
        println!("{}", installed.display());
    } else {
        println!("{}", report.bin_descriptor.display());
    }

    Ok(())
}

/// Pick the project root: the explicit flag, else the nearest ancestor of the
/// executable with a `resources/` directory, else the current directory.
fn resolve_root(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(root) = explicit {
        return Ok(root);
    }

    let exe_path = std::env::current_exe().context("Failed to locate the installer executable")?;
    if let Some(root) = exe_path.parent().and_then(find_project_root) {
        return Ok(root);
    }

    std::env::current_dir().context("Failed to read the current directory")
}
