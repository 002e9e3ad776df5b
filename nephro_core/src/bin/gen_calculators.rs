//! Generate CALCULATORS.md from the calculator registry.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin gen-calculators
//! cargo run --bin gen-calculators -- path/to/CALCULATORS.md
//! ```
//!
//! Without an argument the file is written to `nephro_core/CALCULATORS.md`
//! (relative to the workspace root). Set `RUST_LOG=debug` for more detail.

use std::fs;
use std::path::PathBuf;

use nephro_core::registry::{self, generate_calculators_markdown};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let output_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("nephro_core/CALCULATORS.md"));

    info!(calculators = registry::all().len(), "generating calculator reference");
    let markdown = generate_calculators_markdown();

    match fs::write(&output_path, &markdown) {
        Ok(()) => {
            info!(bytes = markdown.len(), path = %output_path.display(), "reference written");
        }
        Err(e) => {
            error!(path = %output_path.display(), error = %e, "failed to write reference");
            std::process::exit(1);
        }
    }
}
