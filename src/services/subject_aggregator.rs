use std::collections::BTreeSet;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{normalize_subject, AuthorWork, ResolvedAuthor, SubjectProfile},
    services::{catalog::Catalog, fan_out::bounded_fan_out},
};

/// Builds a reader's weighted subject set from their resolved authors
#[derive(Clone)]
pub struct SubjectAggregator {
    catalog: Arc<dyn Catalog>,
    concurrency: usize,
    works_limit: usize,
}

impl SubjectAggregator {
    pub fn new(catalog: Arc<dyn Catalog>, concurrency: usize, works_limit: usize) -> Self {
        Self {
            catalog,
            concurrency,
            works_limit,
        }
    }

    /// Fetches each author's sampled works and counts, per subject, how many
    /// distinct authors carry it.
    ///
    /// Authors whose works cannot be fetched contribute nothing. The profile may
    /// come back empty; deciding whether that is an error is up to the caller.
    /// Fails with `ExternalApi` only when every author's fetch errored.
    pub async fn aggregate(&self, authors: &[ResolvedAuthor]) -> AppResult<SubjectProfile> {
        let works_limit = self.works_limit;
        let outcome = bounded_fan_out(
            "aggregate_subjects",
            authors.to_vec(),
            self.concurrency,
            |author| {
                let catalog = self.catalog.clone();
                async move {
                    let works = catalog
                        .author_works(&author.catalog_key, works_limit)
                        .await?;
                    let subjects = author_subjects(&works);

                    tracing::debug!(
                        author = %author.name,
                        works = works.len(),
                        subjects = subjects.len(),
                        "Author works sampled"
                    );

                    Ok::<_, AppError>((author.name, subjects))
                }
            },
        )
        .await;

        if outcome.all_failed() {
            return Err(AppError::ExternalApi(format!(
                "Catalog unavailable: works lookups failed for all {} authors",
                outcome.failed
            )));
        }

        let mut profile = SubjectProfile::default();
        for (name, subjects) in outcome.succeeded {
            profile.weights.add_author(&subjects);
            profile.per_author.entry(name).or_default().extend(subjects);
        }

        tracing::info!(
            authors = authors.len(),
            contributing = profile.per_author.len(),
            dropped = outcome.failed,
            subjects = profile.weights.len(),
            "Subjects aggregated"
        );

        Ok(profile)
    }
}

/// Union of normalized subjects across one author's works
pub fn author_subjects(works: &[AuthorWork]) -> BTreeSet<String> {
    works
        .iter()
        .flat_map(|work| work.subjects.iter())
        .map(|subject| normalize_subject(subject))
        .filter(|subject| !subject.is_empty())
        .collect()
}
