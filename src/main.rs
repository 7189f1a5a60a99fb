//! Command line interface over the packager's build and delete lifecycle.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use asset_packager::config::PackagerConfig;
use asset_packager::manifest::PackageManifest;
use asset_packager::package::AssetKind;
use asset_packager::registry::PackageRegistry;
use asset_packager::store::DiskAssetStore;

/// Merge JavaScript and stylesheet sources into packaged files.
#[derive(Parser)]
#[command(name = "asset-packager", version, about, long_about = None)]
struct Cli {
  /// Project directory containing the manifest and asset root.
  #[arg(short, long, default_value = ".", global = true)]
  project_dir: PathBuf,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Merge every configured package.
  Build,
  /// Delete every packaged file.
  Delete,
  /// Translate source names into packaged target names.
  Targets {
    /// Asset kind to resolve against (`javascripts` or `stylesheets`).
    kind: AssetKind,
    /// Source names to translate.
    names: Vec<String>,
  },
}

fn main() -> ExitCode {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .without_time()
    .init();

  match run() {
    Ok(code) => code,
    Err(err) => {
      eprintln!("error: {err:#}");
      ExitCode::FAILURE
    }
  }
}

fn run() -> Result<ExitCode> {
  let cli = Cli::parse();
  let config = PackagerConfig::discover(&cli.project_dir);

  let manifest = PackageManifest::load(&config.manifest_path(&cli.project_dir))?;
  let mut registry = PackageRegistry::from_manifest(&manifest);
  registry.set_merge_environments(config.merge_environments.clone());
  let store = DiskAssetStore::new(config.asset_root_path(&cli.project_dir));

  match cli.command {
    Commands::Build => {
      let report = registry.build_all(&store);
      for built in &report.built {
        println!(
          "{}/{}_packaged-{}.{}",
          built.kind.dir_name(),
          built.target,
          built.token,
          built.kind.extension()
        );
      }
      for failure in &report.failures {
        eprintln!(
          "failed to build {}/{}: {:#}",
          failure.kind.dir_name(),
          failure.target,
          failure.error
        );
      }
      if report.is_success() {
        Ok(ExitCode::SUCCESS)
      } else {
        Ok(ExitCode::FAILURE)
      }
    }
    Commands::Delete => {
      registry.delete_all(&store)?;
      Ok(ExitCode::SUCCESS)
    }
    Commands::Targets { kind, names } => {
      for name in registry.targets_from_sources(kind, &names) {
        println!("{name}");
      }
      Ok(ExitCode::SUCCESS)
    }
  }
}
