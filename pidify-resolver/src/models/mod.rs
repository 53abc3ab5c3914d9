//! Data model for draft records and resolution outcomes

pub mod draft;
pub mod resolution;

pub use draft::DraftRecord;
pub use resolution::{
    CandidateMatch, FieldKind, PidifiedRecord, RegistrySource, ResolutionStatus, ResolvedField,
};
