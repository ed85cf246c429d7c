//! Convert Command

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use testbridge_core::{detect_framework, ConversionResult, Converter, Framework};
use tracing::{debug, info};

use crate::commands::Outcome;
use crate::config::Config;
use crate::output::{print_error, print_success, print_warning, OutputFormat};

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Source file to convert
    pub file: PathBuf,

    /// Source framework (detected from the file when omitted)
    #[arg(long)]
    pub from: Option<Framework>,

    /// Target framework (configured default when omitted)
    #[arg(long)]
    pub to: Option<Framework>,

    /// Replace the source file with the converted code
    #[arg(long, conflicts_with = "output")]
    pub in_place: bool,

    /// Write the converted code to this path
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl ConvertArgs {
    fn destination(&self) -> Option<&PathBuf> {
        if self.in_place {
            Some(&self.file)
        } else {
            self.output.as_ref()
        }
    }
}

/// Pick the source framework: flag, then detection, then config.
fn resolve_source(args: &ConvertArgs, text: &str, config: &Config) -> Result<Framework> {
    if let Some(from) = args.from {
        return Ok(from);
    }
    if let Some(detected) = detect_framework(text) {
        debug!(framework = %detected, "detected source framework");
        return Ok(detected);
    }
    config.frameworks.default_source.with_context(|| {
        format!(
            "Could not detect the framework of {}; pass --from",
            args.file.display()
        )
    })
}

/// Run a conversion and write its code to the destination on success.
///
/// A failed conversion never touches the destination.
pub fn run(args: &ConvertArgs, config: &Config) -> Result<ConversionResult> {
    let text = fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let from = resolve_source(args, &text, config)?;
    let to = args.to.unwrap_or(config.frameworks.default_target);
    let style = config.code_style.style_options()?;

    info!(file = %args.file.display(), %from, %to, "converting");
    let result = match Converter::new(from, to) {
        Ok(converter) => converter.with_style(style).convert(&text),
        Err(e) => ConversionResult::failure(e),
    };

    if result.success {
        if let Some(dest) = args.destination() {
            if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            fs::write(dest, &result.converted_code)
                .with_context(|| format!("Failed to write {}", dest.display()))?;
        }
    }
    Ok(result)
}

pub fn execute(args: ConvertArgs, config: &Config, format: OutputFormat) -> Result<Outcome> {
    let result = run(&args, config)?;

    if format == OutputFormat::Json {
        println!("{}", result.to_json()?);
    } else {
        for warning in &result.warnings {
            print_warning(warning);
        }
        if !result.success {
            let message = result.errors.first().map(String::as_str).unwrap_or("conversion failed");
            print_error(message);
        } else if let Some(dest) = args.destination() {
            print_success(&format!("Converted {} -> {}", args.file.display(), dest.display()));
        } else {
            print!("{}", result.converted_code);
        }
    }

    Ok(if result.success {
        Outcome::Success
    } else {
        Outcome::Failed
    })
}
