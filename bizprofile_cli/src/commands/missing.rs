use anyhow::Result;
use bizprofile_lib::{ProfileContext, ProfileStrings};
use clap::Args;

use crate::commands::source::{self, ProfileArgs};
use crate::output::{build_missing_rows, print_rows, OutputFormat};

#[derive(Args)]
pub struct MissingArgs {
    #[command(flatten)]
    pub profile: ProfileArgs,
}

pub async fn run(args: &MissingArgs, format: &OutputFormat) -> Result<()> {
    let ctx = ProfileContext::embedded()?;
    let strings = ProfileStrings::embedded()?;
    let loaded = source::load(&args.profile, &ctx, &strings).await?;
    let mandatory = &loaded.report.mandatory;

    eprintln!(
        "{}",
        strings.format(
            "profile.mandatory",
            &[
                ("completed", mandatory.completed.to_string().as_str()),
                ("total", mandatory.total.to_string().as_str()),
            ]
        )
    );
    if mandatory.is_complete() && *format != OutputFormat::Json {
        return Ok(());
    }
    eprintln!(
        "{}",
        strings.format("profile.missing", &[("count", &mandatory.missing.len().to_string())])
    );
    print_rows(build_missing_rows(&mandatory.missing), &mandatory.missing, format)
}
