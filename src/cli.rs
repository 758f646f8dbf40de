use clap::{Parser, Subcommand};

fn get_version() -> &'static str {
    const BASE_VERSION: &str = env!("CARGO_PKG_VERSION");

    // Tagged builds report the tag alone
    if let Some(tag) = option_env!("JDKMAN_GIT_TAG") {
        return tag;
    }

    let commit = option_env!("JDKMAN_GIT_COMMIT").unwrap_or("unknown");
    let version = format!("v{}-{}", BASE_VERSION, commit);
    Box::leak(version.into_boxed_str())
}

#[derive(Parser)]
#[command(name = "jdkman")]
#[command(about = "Install JDKs by exact version, semver range or pinned URL")]
#[command(version = get_version(), propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (use multiple times for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Reduce output to errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install a JDK
    #[command(
        after_help = "Examples:\n  jdkman install 1.8.0\n  jdkman install '~1.8'\n  jdkman install 1.8.0=tgz+file:///tmp/jdk-8u202-linux-x64.tar.gz"
    )]
    Install {
        /// Exact version, semver range, or <version>=<archiveType>+<url>
        selector: String,
    },

    /// List installed JDKs
    Ls,

    /// List JDKs available for installation
    LsRemote,

    /// Show the current version
    Version,
}
