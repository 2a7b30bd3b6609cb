use clap::Parser;
use raptocore::error::CoreError;
use raptocore::index_fetch::fetch_repository;
use raptocore::logger::init_logger;
use raptocore::repository::RepositorySpec;
use std::cmp::min;

/// CLI tool repo_check
///
/// Binds one repository, fetches its release manifest and package indexes,
/// verifies them, and prints a summary of the resulting catalog slice.
fn main() -> Result<(), CoreError> {
    init_logger(log::LevelFilter::Info);

    let spec = RepositorySpec::parse();
    let descriptor = spec.to_descriptor();

    let packages = fetch_repository(&descriptor, false)?;

    log::info!("Found {} packages in repository {}.", packages.len(), descriptor.id);

    let preview = min(10, packages.len());
    for package in &packages[..preview] {
        println!("{} {} ({})", package.name, package.version, package.architecture);
    }

    Ok(())
}
