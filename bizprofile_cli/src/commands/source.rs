//! Shared flags and loading for commands that read one user's profile.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use bizprofile_lib::validation;
use bizprofile_lib::{
    ClientSettings, CompletionReport, OfflineStore, ProfileClient, ProfileContext, ProfileData,
    ProfileMirror, ProfileSession, ProfileSource, ProfileStore, ProfileStrings, RemoteRecord,
    UserIdentity,
};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Args)]
pub struct ProfileArgs {
    /// Email of the signed-in portal user
    #[arg(long, requires = "azure_id", required_unless_present = "record")]
    pub email: Option<String>,

    /// Azure AD object id of the portal user
    #[arg(long, requires = "email")]
    pub azure_id: Option<String>,

    /// Read a flat CRM record from a JSON file instead of the proxy
    #[arg(long, conflicts_with_all = ["email", "azure_id", "offline"])]
    pub record: Option<PathBuf>,

    /// Use the last mirrored copy instead of contacting the proxy
    #[arg(long, requires = "mirror")]
    pub offline: bool,

    /// SQLite file holding the profile mirror
    #[arg(long)]
    pub mirror: Option<PathBuf>,
}

/// A profile with its completion figures and where it came from.
pub struct LoadedProfile {
    pub profile: ProfileData,
    pub report: CompletionReport,
    pub source: ProfileSource,
}

impl<S: ProfileStore> From<&ProfileSession<S>> for LoadedProfile {
    fn from(session: &ProfileSession<S>) -> Self {
        Self {
            profile: session.profile().clone(),
            report: session.report().clone(),
            source: session.source().clone(),
        }
    }
}

pub fn identity(email: &str, azure_id: &str) -> Result<UserIdentity> {
    let email = validation::validate_email(email)?;
    let azure_id = validation::validate_identifier(azure_id)?;
    Ok(UserIdentity::new(email, azure_id))
}

pub fn spinner(message: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner:.cyan} {msg}")?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

pub fn open_mirror(path: Option<&Path>) -> Result<Option<ProfileMirror>> {
    path.map(|p| {
        ProfileMirror::open(p).with_context(|| format!("opening mirror {}", p.display()))
    })
    .transpose()
}

pub fn read_record(path: &Path) -> Result<RemoteRecord> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading record {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("{} is not a JSON object", path.display()))
}

/// Opens a live session against the CRM proxy configured in the environment.
pub async fn open_live_session(
    identity: UserIdentity,
    ctx: &ProfileContext,
    mirror: Option<ProfileMirror>,
) -> Result<ProfileSession<ProfileClient>> {
    let settings = ClientSettings::from_env()?;
    let client = ProfileClient::new(&settings)?;
    let pb = spinner(&format!("Loading profile for {}...", identity.email))?;
    let session = ProfileSession::open(client, identity, ctx.clone(), mirror).await;
    pb.finish_and_clear();
    Ok(session?)
}

pub async fn load(
    args: &ProfileArgs,
    ctx: &ProfileContext,
    strings: &ProfileStrings,
) -> Result<LoadedProfile> {
    if let Some(ref path) = args.record {
        let record = read_record(path)?;
        let profile = ProfileData::from_remote(&record, &ctx.mapping, &ctx.config);
        let report = CompletionReport::compute(&profile, &ctx.config);
        return Ok(LoadedProfile {
            profile,
            report,
            source: ProfileSource::Record,
        });
    }

    let (Some(email), Some(azure_id)) = (args.email.as_deref(), args.azure_id.as_deref()) else {
        anyhow::bail!("either --record or both --email and --azure-id are required");
    };
    let identity = identity(email, azure_id)?;
    let mirror = open_mirror(args.mirror.as_deref())?;

    if args.offline {
        let mirror = mirror.context("--offline needs --mirror")?;
        let session = ProfileSession::open_offline(OfflineStore, identity, ctx.clone(), mirror)?;
        if let ProfileSource::Mirror { saved_at } = session.source() {
            eprintln!(
                "{}",
                strings.format("load.offline", &[("saved_at", saved_at.to_rfc3339().as_str())])
            );
        }
        return Ok(LoadedProfile::from(&session));
    }

    let session = open_live_session(identity, ctx, mirror)
        .await
        .with_context(|| strings.get("load.failed").to_string())?;
    Ok(LoadedProfile::from(&session))
}
