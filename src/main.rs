mod catalog;
mod cli;
mod config;
mod download;
mod error;
mod extract;
mod install;
mod platform;
mod shell;
mod types;
mod version;

use anyhow::Result;
use catalog::{CatalogSource, InstalledVersions, LocalInstalls, RemoteIndex};
use clap::Parser;
use cli::{Cli, Commands};
use config::{get_install_root, load_settings};
use install::Installer;
use platform::get_system_info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(&cli)?;

    let root = get_install_root()?;
    let settings = load_settings(&root)?;

    match cli.command {
        Commands::Version => {
            println!("jdkman v{}", env!("CARGO_PKG_VERSION"));
        }

        Commands::Ls => {
            for version in LocalInstalls::new(&root).installed()? {
                println!("{}", version);
            }
        }

        Commands::LsRemote => {
            let index = RemoteIndex::new(settings.index_url.clone(), get_system_info());
            match index.fetch().await {
                Ok(catalog) => {
                    for version in version::sorted_descending(&catalog) {
                        println!("{}", version);
                    }
                }
                Err(e) => {
                    tracing::error!("{}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Install { selector } => {
            let installed = LocalInstalls::new(&root);
            let index = RemoteIndex::new(settings.index_url.clone(), get_system_info());
            let installer = Installer::new(&root, settings, installed, index);

            match installer.install(&selector).await {
                Ok(version) => println!("{}", version),
                Err(e) => {
                    tracing::error!("Failed to install {}: {}", selector, e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

fn setup_logging(cli: &Cli) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if cli.quiet {
        "error"
    } else if cli.verbose == 0 {
        "warn"
    } else if cli.verbose == 1 {
        "info"
    } else {
        "debug"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    Ok(())
}
