use std::sync::Arc;
use std::time::Duration;

use accessmgmt_core::{AppError, AppResult};
use accessmgmt_domain::{Relation, RelationFilter};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{ReferenceSnapshotSource, RelationSupplementRepository};

mod overlay;
mod pipeline;
mod relation_set;


pub use overlay::derive_relations_with_packages;
pub use pipeline::derive_relations;
pub use relation_set::RelationSet;

/// Runtime limits for relation resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Deadline for a single resolution call. Derivation already running on the blocking pool
    /// is not interrupted when it passes.
    pub timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResolutionMode {
    Relations,
    WithPackages,
}

/// Application service computing effective relations with provenance.
///
/// Each call loads a reference snapshot, runs the bounded Direct/Parent/Delegation, Map, Key
/// pipeline over it and unions the precomputed supplement. Calls share no mutable state.
#[derive(Clone)]
pub struct RelationResolver {
    snapshots: Arc<dyn ReferenceSnapshotSource>,
    supplement: Arc<dyn RelationSupplementRepository>,
    config: ResolverConfig,
}

impl RelationResolver {
    /// Creates a resolver over a snapshot source and a supplement source.
    #[must_use]
    pub fn new(
        snapshots: Arc<dyn ReferenceSnapshotSource>,
        supplement: Arc<dyn RelationSupplementRepository>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            snapshots,
            supplement,
            config,
        }
    }

    /// Resolves relations matching the endpoint, role and facilitator predicates.
    ///
    /// Package and resource predicates are ignored; use
    /// [`RelationResolver::resolve_relations_with_packages`] for the overlay.
    pub async fn resolve_relations(&self, filter: RelationFilter) -> AppResult<RelationSet> {
        self.resolve(filter.without_overlay(), ResolutionMode::Relations, None)
            .await
    }

    /// Resolves relations and overlays package and resource grants.
    pub async fn resolve_relations_with_packages(
        &self,
        filter: RelationFilter,
    ) -> AppResult<RelationSet> {
        self.resolve(filter, ResolutionMode::WithPackages, None)
            .await
    }

    /// Same as [`RelationResolver::resolve_relations`], abandoned when `cancellation` fires.
    pub async fn resolve_relations_cancellable(
        &self,
        filter: RelationFilter,
        cancellation: &CancellationToken,
    ) -> AppResult<RelationSet> {
        self.resolve(
            filter.without_overlay(),
            ResolutionMode::Relations,
            Some(cancellation),
        )
        .await
    }

    /// Same as [`RelationResolver::resolve_relations_with_packages`], abandoned when
    /// `cancellation` fires.
    pub async fn resolve_relations_with_packages_cancellable(
        &self,
        filter: RelationFilter,
        cancellation: &CancellationToken,
    ) -> AppResult<RelationSet> {
        self.resolve(filter, ResolutionMode::WithPackages, Some(cancellation))
            .await
    }

    /// Runs [`RelationResolver::compute`] under the configured deadline and optional token.
    ///
    /// The caller gets `Unavailable` as soon as either fires. Derivation itself runs on the
    /// blocking pool and is not interrupted: it finishes in the background and its result is
    /// dropped.
    async fn resolve(
        &self,
        filter: RelationFilter,
        mode: ResolutionMode,
        cancellation: Option<&CancellationToken>,
    ) -> AppResult<RelationSet> {
        let bounded = tokio::time::timeout(self.config.timeout, self.compute(filter, mode));

        let outcome = match cancellation {
            Some(token) => tokio::select! {
                biased;
                () = token.cancelled() => {
                    return Err(AppError::Unavailable(
                        "relation resolution was cancelled".to_owned(),
                    ));
                }
                outcome = bounded => outcome,
            },
            None => bounded.await,
        };

        outcome.map_err(|_| {
            AppError::Unavailable(format!(
                "relation resolution exceeded {} ms",
                self.config.timeout.as_millis()
            ))
        })?
    }

    async fn compute(&self, filter: RelationFilter, mode: ResolutionMode) -> AppResult<RelationSet> {
        let (snapshot, supplement) = tokio::try_join!(
            self.snapshots.load_snapshot(),
            self.supplement.list_supplement_relations(&filter),
        )?;

        let predicates = filter.predicates().len();
        let mut relations = tokio::task::spawn_blocking(move || match mode {
            ResolutionMode::Relations => derive_relations(&snapshot, &filter),
            ResolutionMode::WithPackages => derive_relations_with_packages(&snapshot, &filter),
        })
        .await
        .map_err(|error| AppError::Internal(format!("relation derivation failed: {error}")))?;

        let derived = relations.len();
        match mode {
            ResolutionMode::Relations => {
                relations.extend(supplement.into_iter().map(without_overlay));
            }
            ResolutionMode::WithPackages => relations.extend(supplement),
        }

        debug!(
            predicates,
            derived,
            total = relations.len(),
            with_packages = mode == ResolutionMode::WithPackages,
            "resolved relations"
        );

        Ok(relations)
    }
}

/// Strips package and resource grants from a supplement row for bare relation output.
fn without_overlay(relation: Relation) -> Relation {
    Relation {
        package_id: None,
        resource_id: None,
        package_source: None,
        ..relation
    }
}
