//! Trellis CLI - assemble container build contexts for model bundles

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trellis_core::{build::paths::TRELLIS_RUNTIME_DIR_ENV, BuildPaths, ImageBuilder};

/// Trellis - package ML models into container build contexts
#[derive(Parser)]
#[command(
    name = "trellis",
    about = "Assemble a Docker build context from a declaratively configured model bundle",
    version = env!("CARGO_PKG_VERSION"),
    arg_required_else_help = true,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble the build context for a model bundle
    ///
    /// Reads the bundle's config.yaml, prepares the build directory for the
    /// configured serving backend, and prints the resulting path.
    Build {
        /// Path to the model bundle directory (must contain config.yaml)
        bundle_dir: PathBuf,

        /// Where to assemble the build context (created if absent; existing
        /// contents are overwritten file-by-file, never purged)
        #[arg(short, long, value_name = "PATH")]
        output_dir: Option<PathBuf>,

        /// Mount the HF access token as a BuildKit secret instead of
        /// embedding it into the image
        #[arg(long)]
        use_hf_secret: bool,

        /// Runtime assets root holding the server/control/shared code trees
        #[arg(long, value_name = "PATH", env = TRELLIS_RUNTIME_DIR_ENV)]
        runtime_dir: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trellis=info,trellis_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Build {
            bundle_dir,
            output_dir,
            use_hf_secret,
            runtime_dir,
        } => {
            let paths = BuildPaths::resolve(runtime_dir);
            let builder = ImageBuilder::new(&bundle_dir, paths)?;
            let build_dir = builder.prepare_build_dir(output_dir, use_hf_secret)?;
            info!(
                "Build context ready, suggested tag: {}",
                builder.default_tag()
            );
            println!("{}", build_dir.display());
        }
    }
    Ok(())
}
