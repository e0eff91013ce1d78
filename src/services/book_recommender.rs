use std::sync::Arc;

use chrono::{Datelike, Utc};

use crate::{
    error::{AppError, AppResult},
    models::{most_recent_in_window, Edition, RecommendedWork, SubjectWork},
    services::{catalog::Catalog, fan_out::bounded_fan_out},
};

/// Sampling and ranking knobs for [`BookRecommender`]
#[derive(Debug, Clone, Copy)]
pub struct RecommenderLimits {
    pub concurrency: usize,
    pub subject_works_limit: usize,
    pub editions_limit: usize,
    pub max_results: usize,
    pub window_years: i32,
}

impl Default for RecommenderLimits {
    fn default() -> Self {
        Self {
            concurrency: 10,
            subject_works_limit: 50,
            editions_limit: 50,
            max_results: 3,
            window_years: 2,
        }
    }
}

/// Turns a subject into a short list of recent, still-in-print works
#[derive(Clone)]
pub struct BookRecommender {
    catalog: Arc<dyn Catalog>,
    limits: RecommenderLimits,
}

impl BookRecommender {
    pub fn new(catalog: Arc<dyn Catalog>, limits: RecommenderLimits) -> Self {
        Self { catalog, limits }
    }

    /// Recommends works for `subject` as of the current calendar year
    pub async fn recommend(&self, subject: &str) -> AppResult<Vec<RecommendedWork>> {
        self.recommend_as_of(subject, Utc::now().year()).await
    }

    /// Recommends works for `subject`, treating `current_year` as "now".
    ///
    /// 1. Fetch the newest works tagged with the subject
    /// 2. Keep works with an edition year in `[current_year - window, current_year]`
    /// 3. Fetch descriptions for the survivors
    /// 4. Rank by that year, newest first, and truncate
    ///
    /// Failing to list the subject's works fails the call, as does every candidate
    /// erroring. Otherwise per-work failures only drop that work (or its
    /// description), and no survivors is `NotFound`.
    pub async fn recommend_as_of(
        &self,
        subject: &str,
        current_year: i32,
    ) -> AppResult<Vec<RecommendedWork>> {
        let candidates = self
            .catalog
            .subject_works(subject, self.limits.subject_works_limit)
            .await?;

        tracing::info!(
            subject = %subject,
            candidates = candidates.len(),
            current_year,
            "Evaluating candidate works"
        );

        let limits = self.limits;
        let outcome = bounded_fan_out(
            "recommend_books",
            candidates,
            limits.concurrency,
            |work| {
                let catalog = self.catalog.clone();
                async move { evaluate_candidate(catalog, work, limits, current_year).await }
            },
        )
        .await;

        if outcome.all_failed() {
            return Err(AppError::ExternalApi(format!(
                "Catalog unavailable: could not date any of {} works for subject '{}'",
                outcome.failed, subject
            )));
        }

        let mut recommendations: Vec<RecommendedWork> =
            outcome.succeeded.into_iter().flatten().collect();

        if recommendations.is_empty() {
            return Err(AppError::NotFound(format!(
                "No recent books found for subject '{}'",
                subject
            )));
        }

        // Stable sort: equal years keep the catalog's newest-first order
        recommendations.sort_by(|a, b| b.most_recent_in_print_year.cmp(&a.most_recent_in_print_year));
        recommendations.truncate(limits.max_results);

        tracing::info!(
            subject = %subject,
            qualifying = recommendations.len(),
            dropped = outcome.failed,
            "Books recommended"
        );

        Ok(recommendations)
    }
}

/// Decides whether one candidate is in print and, if so, builds its recommendation.
///
/// `Ok(None)` means the work is simply not recent enough. An error means its
/// in-print status could not be determined.
async fn evaluate_candidate(
    catalog: Arc<dyn Catalog>,
    work: SubjectWork,
    limits: RecommenderLimits,
    current_year: i32,
) -> AppResult<Option<RecommendedWork>> {
    let mut years = work.own_years();

    match catalog.work_editions(&work.key, limits.editions_limit).await {
        Ok(editions) => years.extend(editions.iter().filter_map(Edition::year)),
        Err(e) if years.is_empty() => return Err(e),
        Err(e) => {
            tracing::warn!(
                work = %work.title,
                error = %e,
                "Editions unavailable, using listing dates"
            );
        }
    }

    let Some(year) = most_recent_in_window(years.iter().copied(), current_year, limits.window_years)
    else {
        if years.iter().any(|year| *year > current_year) {
            tracing::debug!(work = %work.title, years = ?years, "Excluded work with future publish year");
        }
        return Ok(None);
    };

    let description = match catalog.work_detail(&work.key).await {
        Ok(detail) => detail.description().into_option(),
        Err(e) => {
            tracing::warn!(work = %work.title, error = %e, "Description unavailable");
            None
        }
    };

    Ok(Some(RecommendedWork {
        authors: work.author_names(),
        title: work.title,
        description,
        most_recent_in_print_year: year,
    }))
}
