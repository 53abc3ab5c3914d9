//! Resolution orchestrator
//!
//! Drives one resolution task per resolvable field of the draft record.
//! Fields are independent and run concurrently; a global deadline cancels
//! stragglers cooperatively (a cancelled task resolves to ERROR, the run
//! still produces a record from whatever completed). The funding
//! corroboration runs as a post-pass after every task settles, so it never
//! blocks the deadline. Assembly order is fixed regardless of completion
//! order.

use crate::matcher;
use crate::models::{
    CandidateMatch, DraftRecord, FieldKind, PidifiedRecord, RegistrySource, ResolvedField,
};
use crate::normalize;
use crate::policy::ResolutionPolicy;
use crate::registries::{
    orcid, CrossrefClient, OrcidClient, RegistryClient, RorClient, SearchQuery,
};
use crate::resilience::{QueryCache, RegistryGateway};
use pidify_common::{Error, ResolverConfig, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Drives the per-field pipeline (query → score → decide) and assembles the
/// output record.
///
/// Cache and rate-limiter state live inside the orchestrator and die with
/// it: runs stay isolated from one another.
pub struct ResolutionOrchestrator {
    deadline: Duration,
    policy: Arc<ResolutionPolicy>,
    person: Arc<RegistryGateway>,
    organization: Arc<RegistryGateway>,
    funding: Arc<RegistryGateway>,
}

impl ResolutionOrchestrator {
    /// Build an orchestrator backed by the real public registries.
    pub fn new(config: ResolverConfig) -> Result<Self> {
        let person = OrcidClient::new().map_err(|e| Error::Internal(e.to_string()))?;
        let organization = RorClient::new().map_err(|e| Error::Internal(e.to_string()))?;
        let funding = CrossrefClient::new().map_err(|e| Error::Internal(e.to_string()))?;

        Self::with_clients(
            config,
            Arc::new(person),
            Arc::new(organization),
            Arc::new(funding),
        )
    }

    /// Build an orchestrator over arbitrary registry clients.
    ///
    /// This is the seam tests use to substitute deterministic registries.
    pub fn with_clients(
        config: ResolverConfig,
        person: Arc<dyn RegistryClient>,
        organization: Arc<dyn RegistryClient>,
        funding: Arc<dyn RegistryClient>,
    ) -> Result<Self> {
        config.validate()?;

        let cache = Arc::new(QueryCache::new(Duration::from_secs(config.cache_ttl_secs)));
        let person = Arc::new(RegistryGateway::new(
            person,
            cache.clone(),
            config.rate_limits.person_per_sec,
            config.retry.clone(),
        ));
        let organization = Arc::new(RegistryGateway::new(
            organization,
            cache.clone(),
            config.rate_limits.organization_per_sec,
            config.retry.clone(),
        ));
        let funding = Arc::new(RegistryGateway::new(
            funding,
            cache,
            config.rate_limits.funding_per_sec,
            config.retry.clone(),
        ));

        Ok(Self {
            deadline: Duration::from_secs(config.deadline_secs),
            policy: Arc::new(ResolutionPolicy::new(&config)),
            person,
            organization,
            funding,
        })
    }

    /// Resolve every field of a draft record into persistent identifiers.
    ///
    /// Never fails as a whole: per-field outcomes (UNRESOLVED, AMBIGUOUS,
    /// ERROR) are captured in the record, and a single field's failure never
    /// prevents the others from resolving.
    pub async fn resolve(&self, draft: &DraftRecord) -> PidifiedRecord {
        let run_id = Uuid::new_v4();
        tracing::info!(run_id = %run_id, dmp_id = %draft.dmp_id, "Starting resolution run");

        let cancel = CancellationToken::new();
        let watcher = {
            let cancel = cancel.clone();
            let deadline = self.deadline;
            tokio::spawn(async move {
                tokio::time::sleep(deadline).await;
                tracing::warn!("Global resolution deadline reached, cancelling field tasks");
                cancel.cancel();
            })
        };

        let pi_task = self.spawn_pi_task(draft, cancel.clone());
        let affiliation_task = self.spawn_affiliation_task(draft, cancel.clone());
        let funding_task = self.spawn_funding_task(draft, cancel.clone());

        let pi = join_field(pi_task, FieldKind::Pi).await;
        let affiliation = join_field(affiliation_task, FieldKind::Affiliation).await;
        let mut funding = join_field(funding_task, FieldKind::Funding).await;

        watcher.abort();

        // Best-effort post-pass: reads the finalized organization field,
        // adjusts funding confidence only
        self.policy.corroborate(&mut funding, &affiliation);

        tracing::info!(
            run_id = %run_id,
            pi = ?pi.status,
            affiliation = ?affiliation.status,
            funding = ?funding.status,
            "Resolution run complete"
        );

        PidifiedRecord {
            dmp_id: draft.dmp_id.clone(),
            pi,
            affiliation,
            funding,
        }
    }

    fn spawn_pi_task(
        &self,
        draft: &DraftRecord,
        cancel: CancellationToken,
    ) -> JoinHandle<ResolvedField> {
        let gateway = self.person.clone();
        let policy = self.policy.clone();
        let pi_name = draft.pi_name.clone();
        let pi_orcid = draft.pi_orcid.clone();
        let affiliation = draft.affiliation_name.clone();

        tokio::spawn(async move {
            // An iD printed in the source document short-circuits the search
            if let Some(supplied) = &pi_orcid {
                if orcid::is_valid_orcid(supplied) {
                    let chosen = CandidateMatch {
                        source: RegistrySource::Person,
                        identifier: supplied.clone(),
                        display_label: pi_name.clone(),
                        alt_labels: Vec::new(),
                        raw_payload: serde_json::json!({ "supplied-orcid": supplied }),
                        score: 1.0,
                    };
                    return ResolvedField::accepted(
                        FieldKind::Pi,
                        chosen,
                        Vec::new(),
                        "ORCID iD supplied in source document",
                    );
                }
                tracing::warn!(supplied = %supplied, "Supplied ORCID iD failed validation, falling back to search");
            }

            let mut query = SearchQuery::new(normalize::normalize(&pi_name));
            let affiliation_norm = normalize::normalize(&affiliation);
            if !affiliation_norm.is_empty() {
                query = query.with_affiliation(affiliation_norm);
            }

            run_field(FieldKind::Pi, pi_name, query, gateway, policy, cancel).await
        })
    }

    fn spawn_affiliation_task(
        &self,
        draft: &DraftRecord,
        cancel: CancellationToken,
    ) -> JoinHandle<ResolvedField> {
        let gateway = self.organization.clone();
        let policy = self.policy.clone();
        let affiliation = draft.affiliation_name.clone();

        tokio::spawn(async move {
            let query = SearchQuery::new(normalize::normalize(&affiliation));
            run_field(
                FieldKind::Affiliation,
                affiliation,
                query,
                gateway,
                policy,
                cancel,
            )
            .await
        })
    }

    fn spawn_funding_task(
        &self,
        draft: &DraftRecord,
        cancel: CancellationToken,
    ) -> JoinHandle<ResolvedField> {
        let gateway = self.funding.clone();
        let policy = self.policy.clone();
        // The award title is the strongest scoring target; the funder name
        // stands in when the draft has no title
        let draft_value = draft
            .award_title
            .clone()
            .unwrap_or_else(|| draft.funder_name.clone());
        let award_number = draft.funding_opportunity_number.clone();

        tokio::spawn(async move {
            let mut query = SearchQuery::new(normalize::normalize(&draft_value));
            if let Some(award) = award_number {
                query = query.with_award_number(award);
            }

            run_field(FieldKind::Funding, draft_value, query, gateway, policy, cancel).await
        })
    }
}

/// One field pipeline: fetch candidates, rank, decide. Cancellation at the
/// deadline resolves the field to ERROR without touching cache or limiter
/// state (in-flight requests are simply dropped).
async fn run_field(
    field: FieldKind,
    draft_value: String,
    query: SearchQuery,
    gateway: Arc<RegistryGateway>,
    policy: Arc<ResolutionPolicy>,
    cancel: CancellationToken,
) -> ResolvedField {
    if query.term.is_empty() {
        return ResolvedField::unresolved(field, Vec::new(), "draft field is empty");
    }

    let work = async {
        match gateway.fetch(&query).await {
            Ok(raw) => {
                let ranked = matcher::rank(&draft_value, field.source(), raw);
                policy.decide(field, ranked)
            }
            Err(err) => ResolvedField::error(
                field,
                format!("registry call failed after retries: {}", err),
            ),
        }
    };

    tokio::select! {
        _ = cancel.cancelled() => ResolvedField::error(field, "timed out"),
        resolved = work => resolved,
    }
}

async fn join_field(task: JoinHandle<ResolvedField>, field: FieldKind) -> ResolvedField {
    match task.await {
        Ok(resolved) => resolved,
        Err(err) => {
            tracing::error!(field = field.as_str(), error = %err, "Field resolution task failed");
            ResolvedField::error(field, "resolution task failed")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResolutionStatus;
    use crate::registries::{QueryError, RawCandidate};
    use async_trait::async_trait;

    struct EmptyRegistry(RegistrySource);

    #[async_trait]
    impl RegistryClient for EmptyRegistry {
        fn source(&self) -> RegistrySource {
            self.0
        }

        async fn search(
            &self,
            _query: &SearchQuery,
        ) -> std::result::Result<Vec<RawCandidate>, QueryError> {
            Ok(vec![])
        }
    }

    fn orchestrator() -> ResolutionOrchestrator {
        ResolutionOrchestrator::with_clients(
            ResolverConfig::default(),
            Arc::new(EmptyRegistry(RegistrySource::Person)),
            Arc::new(EmptyRegistry(RegistrySource::Organization)),
            Arc::new(EmptyRegistry(RegistrySource::Funding)),
        )
        .unwrap()
    }

    fn draft() -> DraftRecord {
        DraftRecord {
            dmp_id: "https://doi.org/10.48321/D1234".to_string(),
            pi_name: "Jane Smith".to_string(),
            pi_orcid: None,
            affiliation_name: "University of Example".to_string(),
            funder_name: "National Science Foundation".to_string(),
            funding_opportunity_number: None,
            award_title: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn supplied_valid_orcid_short_circuits() {
        let mut record = draft();
        record.pi_orcid = Some("0000-0002-1825-0097".to_string());

        let resolved = orchestrator().resolve(&record).await;
        assert_eq!(resolved.pi.status, ResolutionStatus::Accepted);
        assert_eq!(resolved.pi.confidence, 1.0);
        assert_eq!(
            resolved.pi.chosen.as_ref().unwrap().identifier,
            "0000-0002-1825-0097"
        );
        assert!(resolved.pi.reason.contains("supplied"));
    }

    #[tokio::test(start_paused = true)]
    async fn supplied_invalid_orcid_falls_back_to_search() {
        let mut record = draft();
        // Bad check digit
        record.pi_orcid = Some("0000-0002-1825-0098".to_string());

        let resolved = orchestrator().resolve(&record).await;
        // The empty mock registry yields UNRESOLVED, proving a search ran
        assert_eq!(resolved.pi.status, ResolutionStatus::Unresolved);
        assert_eq!(resolved.pi.reason, "no candidates returned");
    }

    #[tokio::test(start_paused = true)]
    async fn empty_draft_field_is_unresolved_without_lookup() {
        let mut record = draft();
        record.affiliation_name = "  ".to_string();

        let resolved = orchestrator().resolve(&record).await;
        assert_eq!(resolved.affiliation.status, ResolutionStatus::Unresolved);
        assert_eq!(resolved.affiliation.reason, "draft field is empty");
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_config_is_rejected_before_any_resolution() {
        let mut config = ResolverConfig::default();
        config.epsilon = -0.5;

        let result = ResolutionOrchestrator::with_clients(
            config,
            Arc::new(EmptyRegistry(RegistrySource::Person)),
            Arc::new(EmptyRegistry(RegistrySource::Organization)),
            Arc::new(EmptyRegistry(RegistrySource::Funding)),
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
