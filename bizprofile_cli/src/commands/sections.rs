use anyhow::Result;
use bizprofile_lib::config::suggest;
use bizprofile_lib::ProfileContext;
use clap::Args;

use crate::output::{build_section_rows, print_rows, OutputFormat};

#[derive(Args)]
pub struct SectionsArgs {
    /// Company stage used to count mandatory fields (defaults to the configured default stage)
    #[arg(long)]
    pub stage: Option<String>,
}

pub fn run(args: &SectionsArgs, format: &OutputFormat) -> Result<()> {
    let ctx = ProfileContext::embedded()?;
    let stage = args
        .stage
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_else(|| ctx.config.default_stage.clone());

    if !ctx.config.is_known_stage(&stage) {
        let known = ctx.config.company_stages.iter().map(|s| s.id.as_str());
        match suggest(&stage, known) {
            Some(hint) => eprintln!("Unknown stage '{}' (did you mean '{}'?)", stage, hint),
            None => eprintln!("Unknown stage '{}'", stage),
        }
    }

    let label = ctx
        .config
        .stage(&stage)
        .map(|s| s.label.clone())
        .unwrap_or_else(|| stage.clone());
    eprintln!("Mandatory counts for stage: {}", label);

    let rows = build_section_rows(&ctx, &stage);
    print_rows(rows, &*ctx.config, format)
}
