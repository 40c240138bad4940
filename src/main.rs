mod cli;

use aot_checker::api::{self, models::RegistryEntryView, probes::ProcessorProbe, registrations};
use aot_checker::config::Config;
use aot_checker::generics::GenericTypeRegistry;
use aot_checker::observability;
use clap::Parser;
use cli::{Cli, Commands};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    let config = match cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    observability::init(&config.telemetry.log_filter);

    match cli.command {
        Commands::Server(args) => api::run(config, args.address).await?,
        Commands::Registry => print_registry()?,
    }

    Ok(())
}

fn print_registry() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut builder = GenericTypeRegistry::builder();
    registrations::register_all(&mut builder, &Arc::new(ProcessorProbe::new()))?;
    let registry = builder.freeze();

    let rows: Vec<RegistryEntryView> = registry.entries().into_iter().map(Into::into).collect();
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}
