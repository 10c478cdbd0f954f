//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `og_catalog_core` linkage.
//! - Print the backend base URL resolved from the environment.

use og_catalog_core::ClientConfig;

fn main() {
    println!("og_catalog_core ping={}", og_catalog_core::ping());
    println!("og_catalog_core version={}", og_catalog_core::core_version());
    match ClientConfig::from_env() {
        Ok(config) => println!(
            "og_catalog_core api_base={} timeout_secs={}",
            config.base_url,
            config.timeout.as_secs()
        ),
        Err(err) => {
            eprintln!("og_catalog_core config_error={err}");
            std::process::exit(2);
        }
    }
}
