//! A signed-in user's profile: load, edit a group, save, recompute.

use std::future::Future;
use std::sync::Arc;

use bizprofile_api::{RemoteRecord, UserIdentity};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::completion::{CompletionReport, MandatoryCompletion};
use crate::context::ProfileContext;
use crate::error::ProfileError;
use crate::mapping::{normalize_edit_for_save, NormalizedPatch};
use crate::mirror::{MirrorError, ProfileMirror};
use crate::profile::{FieldValues, ProfileData};
use crate::validation::{validate_group_edit, ValidationErrors};

/// Remote storage for profile records.
///
/// Implemented by [`crate::ProfileClient`] for the CRM proxy.
pub trait ProfileStore {
    /// Reads the flat CRM record for `identity`.
    fn load_profile(
        &self,
        identity: &UserIdentity,
    ) -> impl Future<Output = Result<RemoteRecord, ProfileError>> + Send;

    /// Sends one section's payload to `endpoint`. Called at most once per save.
    fn save_section(
        &self,
        identity: &UserIdentity,
        endpoint: &str,
        account_id: &str,
        payload: &NormalizedPatch,
    ) -> impl Future<Output = Result<(), ProfileError>> + Send;
}

/// Store for sessions opened from the mirror. Every call fails with
/// [`ProfileError::Offline`].
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineStore;

impl ProfileStore for OfflineStore {
    async fn load_profile(&self, _identity: &UserIdentity) -> Result<RemoteRecord, ProfileError> {
        Err(ProfileError::Offline)
    }

    async fn save_section(
        &self,
        _identity: &UserIdentity,
        _endpoint: &str,
        _account_id: &str,
        _payload: &NormalizedPatch,
    ) -> Result<(), ProfileError> {
        Err(ProfileError::Offline)
    }
}

/// Where the session's current profile came from.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ProfileSource {
    /// A fresh read from the remote store.
    Live,
    /// The local mirror, as written at `saved_at`.
    Mirror { saved_at: DateTime<Utc> },
    /// A record supplied by the caller.
    Record,
}

#[derive(thiserror::Error, Debug)]
pub enum SaveError {
    #[error("unknown section {0}")]
    UnknownSection(String),
    #[error("section {section} has no group at index {index}")]
    UnknownGroup { section: String, index: usize },
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("account information is missing; the profile cannot be saved")]
    MissingAccountId,
    #[error("no save route for section {0}")]
    UnhandledSection(String),
    #[error("save failed: {0}")]
    Remote(#[source] ProfileError),
}

/// Result of a successful group save.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    pub section_id: String,
    pub group_name: String,
    pub endpoint: String,
    pub fields_saved: Vec<String>,
    pub section_percentage: u8,
    pub mandatory: MandatoryCompletion,
    pub missing_mandatory: usize,
}

/// Owns one user's profile and its completion report.
///
/// Saves take `&mut self`, so saves on one session never overlap. Share a
/// session between tasks through `tokio::sync::Mutex` to queue saves.
pub struct ProfileSession<S> {
    store: S,
    identity: UserIdentity,
    ctx: ProfileContext,
    profile: ProfileData,
    report: CompletionReport,
    source: ProfileSource,
    mirror: Option<ProfileMirror>,
}

impl<S: ProfileStore> ProfileSession<S> {
    fn build(
        store: S,
        identity: UserIdentity,
        ctx: ProfileContext,
        profile: ProfileData,
        source: ProfileSource,
        mirror: Option<ProfileMirror>,
    ) -> Self {
        let report = CompletionReport::compute(&profile, &ctx.config);
        Self {
            store,
            identity,
            ctx,
            profile,
            report,
            source,
            mirror,
        }
    }

    /// Reads the profile from the store. A successful read overwrites the
    /// mirror, when one is attached.
    pub async fn open(
        store: S,
        identity: UserIdentity,
        ctx: ProfileContext,
        mirror: Option<ProfileMirror>,
    ) -> Result<Self, ProfileError> {
        let record = store.load_profile(&identity).await?;
        let profile = ProfileData::from_remote(&record, &ctx.mapping, &ctx.config);
        let session = Self::build(store, identity, ctx, profile, ProfileSource::Live, mirror);
        tracing::info!(
            "Loaded profile for {} (stage {}, {}% complete)",
            session.identity.email,
            session.profile.company_stage,
            session.report.overall.percentage
        );
        session.write_mirror();
        Ok(session)
    }

    /// Builds the session from the mirror only; the store is not contacted.
    pub fn open_offline(
        store: S,
        identity: UserIdentity,
        ctx: ProfileContext,
        mirror: ProfileMirror,
    ) -> Result<Self, ProfileError> {
        let key = identity.cache_key();
        let snapshot = mirror
            .load(&key)?
            .ok_or_else(|| MirrorError::NotFound(key.clone()))?;
        tracing::info!("Using mirrored profile saved at {}", snapshot.saved_at);
        Ok(Self::build(
            store,
            identity,
            ctx,
            snapshot.profile,
            ProfileSource::Mirror {
                saved_at: snapshot.saved_at,
            },
            Some(mirror),
        ))
    }

    pub fn profile(&self) -> &ProfileData {
        &self.profile
    }

    pub fn report(&self) -> &CompletionReport {
        &self.report
    }

    pub fn source(&self) -> &ProfileSource {
        &self.source
    }

    pub fn identity(&self) -> &UserIdentity {
        &self.identity
    }

    pub fn context(&self) -> &ProfileContext {
        &self.ctx
    }

    pub fn mirror(&self) -> Option<&ProfileMirror> {
        self.mirror.as_ref()
    }

    /// Validates, normalizes and saves one group, then applies the edit.
    ///
    /// Nothing in the session changes unless the store call succeeds. If the
    /// returned future is dropped before then, the session is untouched.
    pub async fn save_group(
        &mut self,
        section_id: &str,
        group_index: usize,
        editing: FieldValues,
    ) -> Result<SaveOutcome, SaveError> {
        let config = Arc::clone(&self.ctx.config);
        let section = config
            .section(section_id)
            .ok_or_else(|| SaveError::UnknownSection(section_id.to_string()))?;
        let group = section
            .groups
            .get(group_index)
            .ok_or_else(|| SaveError::UnknownGroup {
                section: section_id.to_string(),
                index: group_index,
            })?;

        let mut errors = match validate_group_edit(&editing, group) {
            Ok(()) => ValidationErrors::default(),
            Err(e) => e,
        };
        let patch = match normalize_edit_for_save(&editing, group) {
            Ok(patch) => Some(patch),
            Err(e) => {
                errors.extend(e);
                None
            }
        };
        let patch = match patch {
            Some(patch) if errors.is_empty() => patch,
            _ => return Err(SaveError::Validation(errors)),
        };

        let account_id = self
            .profile
            .account_id
            .clone()
            .ok_or(SaveError::MissingAccountId)?;
        let routes = Arc::clone(&self.ctx.routes);
        let route = routes
            .get(section_id)
            .ok_or_else(|| SaveError::UnhandledSection(section_id.to_string()))?;

        let (section_pct, mandatory_pct) = self
            .report
            .section(section_id)
            .map(|s| (s.percentage, s.mandatory.percentage))
            .unwrap_or((0, 0));
        let fields_saved: Vec<String> = patch.keys().cloned().collect();
        let payload = route.build_payload(patch, section_pct, mandatory_pct);

        tracing::debug!(
            "Saving {} fields of {}/{} to {}",
            fields_saved.len(),
            section_id,
            group.group_name,
            route.endpoint
        );
        self.store
            .save_section(&self.identity, &route.endpoint, &account_id, &payload)
            .await
            .map_err(|e| {
                tracing::error!("Save of {}/{} failed: {}", section_id, group.group_name, e);
                SaveError::Remote(e)
            })?;

        let applied: FieldValues = editing
            .into_iter()
            .filter(|(name, _)| group.fields.iter().any(|f| &f.field_name == name))
            .collect();
        self.profile.section_mut(section_id).merge(applied);
        self.recompute();
        self.write_mirror();

        let section_report = self.report.section(section_id);
        let outcome = SaveOutcome {
            section_id: section_id.to_string(),
            group_name: group.group_name.clone(),
            endpoint: route.endpoint.clone(),
            fields_saved,
            section_percentage: section_report.map(|s| s.percentage).unwrap_or(0),
            mandatory: section_report.map(|s| s.mandatory).unwrap_or_default(),
            missing_mandatory: self.report.mandatory.missing.len(),
        };
        tracing::info!(
            "Saved {}/{}: section {}% complete, {} mandatory fields missing",
            section_id,
            outcome.group_name,
            outcome.section_percentage,
            outcome.missing_mandatory
        );
        Ok(outcome)
    }

    fn recompute(&mut self) {
        self.report = CompletionReport::compute(&self.profile, &self.ctx.config);
    }

    fn write_mirror(&self) {
        let Some(mirror) = &self.mirror else {
            return;
        };
        if let Err(e) = mirror.save(&self.identity.cache_key(), &self.profile) {
            tracing::warn!("Failed to update profile mirror: {}", e);
        }
    }
}
