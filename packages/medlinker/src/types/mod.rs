//! Data model shared by every pipeline stage.

pub mod capability;
pub mod config;
pub mod evidence;
pub mod facility;
pub mod region;

pub use capability::{CapabilitySet, EmergencyCapability, Hours, ReferralCapacity};
pub use config::{CollaboratorTimeout, ExtractConfig, PipelineConfig, QaConfig, VerifyConfig};
pub use evidence::{distinct_cited_fields, Citation, CAPABILITY_FIELDS, REGION_SUMMARY_FIELD};
pub use facility::{Confidence, FacilityDoc, FacilityRecord, SourceType, VerificationStatus};
pub use region::RegionSummary;
