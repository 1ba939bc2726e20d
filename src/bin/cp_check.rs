//! Codeplug check utility
//! Validates codeplug files and reports every invalid or unresolved field

use codeplug_rs::codeplug::{CodeplugConfig, CodeplugRegistry};
use codeplug_rs::drivers::list_models;
use std::env;
use tracing_subscriber::{prelude::*, EnvFilter};

fn main() -> anyhow::Result<()> {
    // Route `log` records from dependencies into tracing
    tracing_log::LogTracer::init()?;
    let filter_layer = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    let subscriber = tracing_subscriber::registry()
        .with(filter_layer)
        .with(tracing_subscriber::fmt::layer());
    tracing::subscriber::set_global_default(subscriber)?;

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <codeplug>... | --models", args[0]);
        std::process::exit(1);
    }

    if args[1] == "--models" {
        println!("Supported models:");
        for model in list_models() {
            let sizes: Vec<String> = model
                .layouts
                .iter()
                .map(|l| format!("{:?} {} bytes", l.kind, l.file_size))
                .collect();
            println!("  {:<12} {}", model.full_name(), sizes.join(", "));
        }
        return Ok(());
    }

    let mut registry = CodeplugRegistry::new();
    let mut failed = 0;
    for path in &args[1..] {
        let (handle, warnings) = registry.open(path, CodeplugConfig::default())?;
        let model = registry
            .get(handle)
            .map(|cp| cp.schema().model.clone())
            .unwrap_or_default();
        if warnings.is_empty() {
            println!("{}: {} OK", path, model);
        } else {
            failed += 1;
            println!("{}: {} has {} warnings", path, model, warnings.len());
            for warning in warnings.iter() {
                println!("  {}", warning);
            }
        }
    }

    if failed > 0 {
        std::process::exit(2);
    }
    Ok(())
}
