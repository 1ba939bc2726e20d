//! Codeplug dump utility
//! Opens a codeplug file and prints its live records with their enabled fields,
//! optionally followed by a hex dump of each record's slot

use codeplug_rs::codeplug::{Codeplug, CodeplugConfig};
use codeplug_rs::core::enable::is_enabled;
use std::env;
use tracing_subscriber::{fmt::format::FmtSpan, prelude::*, EnvFilter};

fn main() -> anyhow::Result<()> {
    // Route `log` records from dependencies into tracing
    tracing_log::LogTracer::init()?;
    let filter_layer = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    let format_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::NONE);
    let subscriber = tracing_subscriber::registry()
        .with(filter_layer)
        .with(format_layer);
    tracing::subscriber::set_global_default(subscriber)?;

    let mut args: Vec<String> = env::args().collect();
    let raw = args.iter().any(|a| a == "--raw");
    args.retain(|a| a != "--raw");
    if args.len() < 2 {
        eprintln!("Usage: {} <codeplug.rdt|codeplug.bin> [record_type] [--raw]", args[0]);
        eprintln!("\nExamples:");
        eprintln!("  {} radio.rdt                  # Show every record type", args[0]);
        eprintln!("  {} radio.rdt Channels         # Show only channels", args[0]);
        eprintln!("  {} radio.rdt Channels --raw   # Also hex dump each channel", args[0]);
        std::process::exit(1);
    }
    let only = args.get(2).map(|s| s.as_str());

    let (mut codeplug, warnings) = Codeplug::open(&args[1], CodeplugConfig::default())?;
    if raw {
        // Packs live records into the leading slots
        codeplug.store()?;
    }
    let schema = codeplug.schema().clone();
    println!("Radio: {} {}", schema.vendor, schema.model);
    println!("Image size: {} bytes\n", codeplug.buffer().len());

    for rt in &schema.record_types {
        if only.is_some_and(|name| name != rt.name) {
            continue;
        }
        let records = codeplug.records(&rt.name)?;
        println!("{} ({} of {})", rt.name, records.len(), rt.max);
        println!("{}", "=".repeat(40));
        for record in records {
            println!("[{}] {}", record.index + 1, record.name(rt));
            for (fi, ft) in rt.fields.iter().enumerate() {
                if Some(fi) == rt.name_field_index() || !is_enabled(rt, &record.fields, fi) {
                    continue;
                }
                let shown: Vec<String> = record.fields[fi].iter().map(|f| f.display(ft)).collect();
                if shown.is_empty() {
                    continue;
                }
                println!("    {:<22} {}", ft.name, shown.join(", "));
            }
            if raw {
                println!("{}", codeplug.buffer().printable(rt.slot_offset(record.index), rt.size)?);
            }
        }
        println!();
    }

    if !warnings.is_empty() {
        println!("{} warnings:\n{}", warnings.len(), warnings);
    }
    Ok(())
}
