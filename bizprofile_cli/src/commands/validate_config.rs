use std::path::PathBuf;

use anyhow::{Context, Result};
use bizprofile_lib::{ProfileContext, SeedPaths};
use clap::Args;
use serde::Serialize;

use crate::output::{build_warning_rows, print_rows, OutputFormat};

#[derive(Args)]
pub struct ValidateConfigArgs {
    /// Profile configuration YAML (defaults to the built-in copy)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Field mapping YAML (defaults to the built-in copy)
    #[arg(long)]
    pub mapping: Option<PathBuf>,

    /// Save routes YAML (defaults to the built-in copy)
    #[arg(long)]
    pub routes: Option<PathBuf>,
}

#[derive(Serialize)]
struct ValidationSummary<'a> {
    sections: usize,
    fields: usize,
    mapped_fields: usize,
    save_routes: usize,
    warnings: &'a [String],
}

pub fn run(args: &ValidateConfigArgs, format: &OutputFormat) -> Result<()> {
    let paths = SeedPaths {
        config: args.config.as_deref(),
        mapping: args.mapping.as_deref(),
        routes: args.routes.as_deref(),
    };
    let ctx = ProfileContext::load(paths).context("configuration is invalid")?;
    let warnings = ctx.warnings();

    let summary = ValidationSummary {
        sections: ctx.config.tabs.len(),
        fields: ctx.config.all_fields().count(),
        mapped_fields: ctx.mapping.len(),
        save_routes: ctx.routes.len(),
        warnings: &warnings,
    };

    eprintln!(
        "Configuration OK: {} sections, {} fields, {} mapped, {} save routes, {} warnings",
        summary.sections,
        summary.fields,
        summary.mapped_fields,
        summary.save_routes,
        warnings.len()
    );

    if warnings.is_empty() && *format != OutputFormat::Json {
        return Ok(());
    }
    print_rows(build_warning_rows(&warnings), &summary, format)
}
