//! pidify-resolver - identifier resolution and scoring engine
//!
//! Takes a structured draft record extracted from a data-management plan,
//! queries the public person/organization/funding registries, scores the
//! returned candidates against the draft values, and decides per field
//! whether a match is accepted, ambiguous, or absent.

pub mod matcher;
pub mod models;
pub mod normalize;
pub mod orchestrator;
pub mod policy;
pub mod registries;
pub mod resilience;

pub use models::{
    CandidateMatch, DraftRecord, FieldKind, PidifiedRecord, RegistrySource, ResolutionStatus,
    ResolvedField,
};
pub use orchestrator::ResolutionOrchestrator;
