use thiserror::Error;

/// Crate-wide error type. Variants line up with the failure taxonomy:
/// configuration, network, integrity, parse, resolution and verification.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("network error fetching {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: curl::Error,
    },

    #[error("signature verification failed: {0}")]
    SignatureInvalid(String),

    #[error("digest mismatch for {path}: expected {expected}, got {actual}")]
    DigestMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("malformed dependency field: {0}")]
    DependencyParse(String),

    #[error("missing packages, report written to {report_path}")]
    MissingTopLevel { report_path: String },

    #[error("missing dependencies, report written to {report_path}")]
    MissingDependency { report_path: String },

    #[error("conflicting version requirements for {package}: {demand_a} vs {demand_b}")]
    Conflict {
        package: String,
        demand_a: String,
        demand_b: String,
    },

    #[error("artifact verification failed for {0}")]
    VerificationFailed(String),

    #[error("one or more downloads failed: {0}")]
    FetchFailed(String),

    #[error("report generation failed: {0}")]
    Report(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
