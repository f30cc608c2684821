//! Library layer for the business profile: seed configuration, CRM field
//! mapping, completion scoring and the load/edit/save session.
//!
//! Wraps the `bizprofile_api` crate with an in-memory TTL cache, read
//! retries, input validation and a local SQLite mirror.

pub mod cache;
pub mod client;
pub mod completion;
pub mod config;
pub mod context;
pub mod dedup;
pub mod error;
pub mod field_mapping;
pub mod mapping;
pub mod mirror;
pub mod profile;
pub mod routes;
pub mod session;
pub mod settings;
pub mod strings;
pub mod validation;

pub use bizprofile_api;
pub use bizprofile_api::{RemoteRecord, UserIdentity};

pub use client::ProfileClient;
pub use completion::{
    calculate_mandatory_completion, calculate_overall_completion, calculate_section_completion,
    check_mandatory_fields_completion, Completion, CompletionReport, MandatoryCheck,
    MandatoryCompletion, MissingField, SectionReport,
};
pub use config::{ConfigError, FieldConfig, FieldType, GroupConfig, ProfileConfig, SectionConfig};
pub use context::{ProfileContext, SeedPaths};
pub use error::ProfileError;
pub use field_mapping::FieldMapping;
pub use mapping::{map_remote_to_section, normalize_edit_for_save, NormalizedPatch};
pub use mirror::{MirrorError, ProfileMirror};
pub use profile::{FieldValues, ProfileData, SectionData};
pub use routes::{SaveRegistry, SaveRoute};
pub use session::{
    OfflineStore, ProfileSession, ProfileSource, ProfileStore, SaveError, SaveOutcome,
};
pub use settings::{ClientSettings, RetryConfig};
pub use strings::ProfileStrings;
pub use validation::{FieldError, ValidationErrors};
