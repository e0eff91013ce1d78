use std::collections::HashSet;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{AuthorCandidate, ResolvedAuthor},
    services::{
        catalog::{bare_key, Catalog},
        fan_out::bounded_fan_out,
    },
};

/// Maps free-text author names to catalog identities
#[derive(Clone)]
pub struct AuthorResolver {
    catalog: Arc<dyn Catalog>,
    concurrency: usize,
}

impl AuthorResolver {
    pub fn new(catalog: Arc<dyn Catalog>, concurrency: usize) -> Self {
        Self {
            catalog,
            concurrency,
        }
    }

    /// Resolves each name independently and concurrently.
    ///
    /// Names with no catalog match, or whose lookup fails, are dropped, so the
    /// result may be smaller than the input (or empty). Entries are unique by
    /// catalog key and follow the input order. Fails with `ExternalApi` only
    /// when every lookup errored.
    pub async fn resolve(&self, names: &[String]) -> AppResult<Vec<ResolvedAuthor>> {
        let mut seen_names = HashSet::new();
        let queries: Vec<String> = names
            .iter()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty() && seen_names.insert(name.to_lowercase()))
            .collect();

        let outcome = bounded_fan_out("resolve_authors", queries, self.concurrency, |name| {
            let catalog = self.catalog.clone();
            async move {
                let candidates = catalog.search_authors(&name).await?;
                let best = select_best_candidate(&name, candidates);
                if best.is_none() {
                    tracing::debug!(author = %name, "No catalog match");
                }
                Ok::<_, AppError>(best)
            }
        })
        .await;

        if outcome.all_failed() {
            return Err(AppError::ExternalApi(format!(
                "Catalog unavailable: all {} author lookups failed",
                outcome.failed
            )));
        }

        let mut seen_keys = HashSet::new();
        let resolved: Vec<ResolvedAuthor> = outcome
            .succeeded
            .into_iter()
            .flatten()
            .filter(|author| seen_keys.insert(author.catalog_key.clone()))
            .collect();

        tracing::info!(
            requested = names.len(),
            resolved = resolved.len(),
            dropped = outcome.failed,
            catalog = self.catalog.name(),
            "Authors resolved"
        );

        Ok(resolved)
    }
}

/// Picks the candidate with the strictly greatest work count; ties keep the
/// first one in the catalog's order
pub fn select_best_candidate(
    query: &str,
    candidates: Vec<AuthorCandidate>,
) -> Option<ResolvedAuthor> {
    let mut best: Option<AuthorCandidate> = None;
    for candidate in candidates {
        if bare_key(&candidate.key).is_empty() {
            continue;
        }
        let improves = best
            .as_ref()
            .map_or(true, |current| candidate.work_count > current.work_count);
        if improves {
            best = Some(candidate);
        }
    }

    best.map(|candidate| {
        let name = if candidate.name.trim().is_empty() {
            query.to_string()
        } else {
            candidate.name
        };
        ResolvedAuthor::new(name, bare_key(&candidate.key), candidate.work_count)
    })
}
