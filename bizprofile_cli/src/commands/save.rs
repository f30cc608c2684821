use std::path::PathBuf;

use anyhow::{Context, Result};
use bizprofile_lib::validation;
use bizprofile_lib::{FieldValues, ProfileContext, ProfileStrings, SaveError};
use clap::Args;

use crate::commands::source::{self, spinner};
use crate::output::{build_field_error_rows, build_save_rows, print_rows, OutputFormat};

#[derive(Args)]
pub struct SaveArgs {
    /// Email of the signed-in portal user
    #[arg(long)]
    pub email: String,

    /// Azure AD object id of the portal user
    #[arg(long)]
    pub azure_id: String,

    /// Section id (e.g. basic, products, Sales)
    #[arg(long)]
    pub section: String,

    /// Zero-based index of the group within the section
    #[arg(long, default_value = "0")]
    pub group: usize,

    /// JSON object of field name to edited value
    #[arg(long)]
    pub data: PathBuf,

    /// SQLite file holding the profile mirror
    #[arg(long)]
    pub mirror: Option<PathBuf>,
}

/// Reads the edited values for one group.
pub fn read_edit(path: &std::path::Path) -> Result<FieldValues> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading edit data {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    match value {
        serde_json::Value::Object(map) => Ok(map),
        _ => anyhow::bail!("{} must contain a JSON object of field values", path.display()),
    }
}

pub async fn run(args: &SaveArgs, format: &OutputFormat) -> Result<()> {
    let ctx = ProfileContext::embedded()?;
    let strings = ProfileStrings::embedded()?;
    let section_id = validation::validate_section_id(&args.section, &ctx.config)?;
    let editing = read_edit(&args.data)?;
    let identity = source::identity(&args.email, &args.azure_id)?;
    let mirror = source::open_mirror(args.mirror.as_deref())?;

    let mut session = source::open_live_session(identity, &ctx, mirror)
        .await
        .with_context(|| strings.get("load.failed").to_string())?;

    let pb = spinner(&format!("Saving {} group {}...", section_id, args.group))?;
    let result = session.save_group(&section_id, args.group, editing).await;
    pb.finish_and_clear();

    match result {
        Ok(outcome) => {
            eprintln!("{}", strings.get("save.success"));
            print_rows(build_save_rows(&outcome), &outcome, format)
        }
        Err(SaveError::Validation(errors)) => {
            print_rows(build_field_error_rows(&errors.0), &errors.0, format)?;
            anyhow::bail!("{} field(s) failed validation; nothing was saved", errors.0.len())
        }
        Err(SaveError::MissingAccountId) => anyhow::bail!("{}", strings.get("save.missing_account")),
        Err(SaveError::UnhandledSection(section)) => anyhow::bail!(
            "{}",
            strings.format("save.unhandled_section", &[("section", section.as_str())])
        ),
        Err(e @ SaveError::Remote(_)) => {
            Err(anyhow::Error::new(e).context(strings.get("save.failed").to_string()))
        }
        Err(e) => Err(e.into()),
    }
}
