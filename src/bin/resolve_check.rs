use clap::Parser;
use raptocore::context::ResolutionContext;
use raptocore::error::CoreError;
use raptocore::logger::init_logger;
use raptocore::repository::RepositorySpec;
use raptocore::resolve;
use std::time::{SystemTime, UNIX_EPOCH};

/// CLI tool resolve_check
///
/// Runs the full acquisition-through-verification pipeline against a single
/// repository and a list of requested top-level package names.
#[derive(Parser, Debug)]
struct Args {
    #[command(flatten)]
    repository: RepositorySpec,

    /// Top-level package names to resolve.
    #[arg(required = true)]
    packages: Vec<String>,

    /// Directory downloaded artifacts are written to.
    #[arg(long, default_value_t = String::from("./cache"))]
    cache_dir: String,

    /// Directory diagnostic JSON reports are written to.
    #[arg(long, default_value_t = String::from("./reports"))]
    report_dir: String,

    /// Number of parallel download/verification workers.
    #[arg(short, long, default_value_t = 4)]
    workers: usize,
}

fn main() -> Result<(), CoreError> {
    init_logger(log::LevelFilter::Info);

    let args = Args::parse();
    let descriptor = args.repository.to_descriptor();
    let ctx = ResolutionContext::new(args.workers, args.cache_dir, args.report_dir, false);

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    match resolve(&ctx, &[descriptor], &args.packages, timestamp) {
        Ok(resolution) => {
            log::info!("Resolved {} packages.", resolution.packages.len());
            for name in &resolution.downloaded {
                println!("{name}");
            }
            Ok(())
        }
        Err(CoreError::MissingTopLevel { report_path }) => {
            eprintln!("resolution failed, see {report_path}");
            Err(CoreError::MissingTopLevel { report_path })
        }
        Err(CoreError::MissingDependency { report_path }) => {
            eprintln!("resolution failed, see {report_path}");
            Err(CoreError::MissingDependency { report_path })
        }
        Err(e) => Err(e),
    }
}
