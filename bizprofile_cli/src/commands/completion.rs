use anyhow::Result;
use bizprofile_lib::{CompletionReport, ProfileContext, ProfileSource, ProfileStrings};
use clap::Args;
use serde::Serialize;

use crate::commands::source::{self, ProfileArgs};
use crate::output::{build_completion_rows, print_rows, OutputFormat};

#[derive(Args)]
pub struct CompletionArgs {
    #[command(flatten)]
    pub profile: ProfileArgs,
}

#[derive(Serialize)]
struct CompletionOutput<'a> {
    company: &'a str,
    source: &'a ProfileSource,
    #[serde(flatten)]
    report: &'a CompletionReport,
}

pub async fn run(args: &CompletionArgs, format: &OutputFormat) -> Result<()> {
    let ctx = ProfileContext::embedded()?;
    let strings = ProfileStrings::embedded()?;
    let loaded = source::load(&args.profile, &ctx, &strings).await?;
    let report = &loaded.report;

    let stage_label = ctx
        .config
        .stage(&report.stage)
        .map(|s| s.label.as_str())
        .unwrap_or(report.stage.as_str());
    eprintln!("{}: {}", strings.get("profile.title"), loaded.profile.name);
    eprintln!("{}", strings.format("profile.stage", &[("stage", stage_label)]));
    eprintln!(
        "{}",
        strings.format(
            "profile.completion",
            &[("percent", report.overall.percentage.to_string().as_str())]
        )
    );
    eprintln!(
        "{}",
        strings.format(
            "profile.mandatory",
            &[
                ("completed", report.mandatory.completed.to_string().as_str()),
                ("total", report.mandatory.total.to_string().as_str()),
            ]
        )
    );

    let output = CompletionOutput {
        company: &loaded.profile.name,
        source: &loaded.source,
        report,
    };
    print_rows(build_completion_rows(report), &output, format)
}
