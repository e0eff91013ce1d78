use std::fmt::Display;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::{
    config::Config,
    db::UserProfileStore,
    error::{AppError, AppResult},
    models::{ReaderProfile, RecommendedWork},
    services::{
        author_resolver::AuthorResolver,
        book_recommender::{BookRecommender, RecommenderLimits},
        catalog::Catalog,
        subject_aggregator::SubjectAggregator,
        subject_selector::select_shared_subject,
    },
};

/// Stages a recommendation request moves through, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum PipelineStage {
    #[default]
    Started,
    AuthorsFetched,
    AuthorsResolved,
    SubjectsAggregated,
    SubjectSelected,
    BooksFetched,
    Completed,
}

impl Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineStage::Started => "started",
            PipelineStage::AuthorsFetched => "authors_fetched",
            PipelineStage::AuthorsResolved => "authors_resolved",
            PipelineStage::SubjectsAggregated => "subjects_aggregated",
            PipelineStage::SubjectSelected => "subject_selected",
            PipelineStage::BooksFetched => "books_fetched",
            PipelineStage::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Furthest stage a request has reached; both reader halves report into it
#[derive(Debug, Default)]
pub struct StageTracker {
    stage: Mutex<PipelineStage>,
}

impl StageTracker {
    pub fn advance(&self, stage: PipelineStage) {
        if let Ok(mut current) = self.stage.lock() {
            if stage > *current {
                tracing::debug!(from = %*current, to = %stage, "Pipeline stage advanced");
                *current = stage;
            }
        }
    }

    pub fn current(&self) -> PipelineStage {
        self.stage
            .lock()
            .map(|stage| *stage)
            .unwrap_or_default()
    }
}

/// Runs the whole recommendation flow for a pair of readers
pub struct RecommendationPipeline {
    profiles: Arc<dyn UserProfileStore>,
    resolver: AuthorResolver,
    aggregator: SubjectAggregator,
    recommender: BookRecommender,
    deadline: Duration,
}

impl RecommendationPipeline {
    pub fn new(
        profiles: Arc<dyn UserProfileStore>,
        resolver: AuthorResolver,
        aggregator: SubjectAggregator,
        recommender: BookRecommender,
        deadline: Duration,
    ) -> Self {
        Self {
            profiles,
            resolver,
            aggregator,
            recommender,
            deadline,
        }
    }

    /// Wires every stage to the same catalog using the configured limits
    pub fn from_config(
        profiles: Arc<dyn UserProfileStore>,
        catalog: Arc<dyn Catalog>,
        config: &Config,
    ) -> Self {
        let resolver = AuthorResolver::new(catalog.clone(), config.author_concurrency);
        let aggregator = SubjectAggregator::new(
            catalog.clone(),
            config.subject_concurrency,
            config.author_works_limit,
        );
        let recommender = BookRecommender::new(
            catalog,
            RecommenderLimits {
                concurrency: config.book_concurrency,
                subject_works_limit: config.subject_works_limit,
                editions_limit: config.editions_limit,
                max_results: config.max_recommendations,
                window_years: config.recency_window_years,
            },
        );

        Self::new(
            profiles,
            resolver,
            aggregator,
            recommender,
            config.request_deadline(),
        )
    }

    /// Recommends books both readers should enjoy, all-or-nothing, under the
    /// shared request deadline
    pub async fn recommend(
        &self,
        first_reader: i64,
        second_reader: i64,
    ) -> AppResult<Vec<RecommendedWork>> {
        self.recommend_since(first_reader, second_reader, Instant::now())
            .await
    }

    /// Like [`Self::recommend`], with the deadline counted from `accepted`
    pub async fn recommend_since(
        &self,
        first_reader: i64,
        second_reader: i64,
        accepted: Instant,
    ) -> AppResult<Vec<RecommendedWork>> {
        let tracker = StageTracker::default();

        let result = self
            .with_deadline(
                accepted,
                &tracker,
                self.run(first_reader, second_reader, &tracker),
            )
            .await;

        match &result {
            Ok(books) => tracing::info!(
                first_reader,
                second_reader,
                books = books.len(),
                processing_time_ms = accepted.elapsed().as_millis(),
                "Recommendation completed"
            ),
            Err(e) => tracing::warn!(
                first_reader,
                second_reader,
                stage = %tracker.current(),
                error = %e,
                "Recommendation failed"
            ),
        }

        result
    }

    /// One reader's half of the pipeline on its own, for diagnostics
    pub async fn reader_profile(&self, reader_id: i64) -> AppResult<ReaderProfile> {
        self.reader_profile_since(reader_id, Instant::now()).await
    }

    pub async fn reader_profile_since(
        &self,
        reader_id: i64,
        accepted: Instant,
    ) -> AppResult<ReaderProfile> {
        let tracker = StageTracker::default();
        self.with_deadline(
            accepted,
            &tracker,
            self.profile_reader(reader_id, &tracker),
        )
        .await
    }

    async fn with_deadline<T>(
        &self,
        accepted: Instant,
        tracker: &StageTracker,
        work: impl std::future::Future<Output = AppResult<T>>,
    ) -> AppResult<T> {
        // A deadline too far out to represent is no deadline
        let Some(deadline) = accepted.checked_add(self.deadline) else {
            return work.await;
        };
        match tokio::time::timeout_at(deadline.into(), work).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout(format!(
                "Deadline of {}s elapsed at stage {}",
                self.deadline.as_secs_f32(),
                tracker.current()
            ))),
        }
    }

    async fn run(
        &self,
        first_reader: i64,
        second_reader: i64,
        tracker: &StageTracker,
    ) -> AppResult<Vec<RecommendedWork>> {
        // Both halves are always awaited; when both fail the first reader's error wins
        let (first, second) = tokio::join!(
            self.profile_reader(first_reader, tracker),
            self.profile_reader(second_reader, tracker),
        );
        let (first, second) = (first?, second?);

        let shared = select_shared_subject(&first.subjects.weights, &second.subjects.weights)?;
        tracker.advance(PipelineStage::SubjectSelected);
        tracing::info!(
            subject = %shared.name,
            combined_weight = shared.combined_weight,
            "Common subject selected"
        );

        let books = self.recommender.recommend(&shared.name).await?;
        tracker.advance(PipelineStage::BooksFetched);
        tracker.advance(PipelineStage::Completed);

        Ok(books)
    }

    /// Favorite authors → resolved authors → subject weights for one reader
    async fn profile_reader(
        &self,
        reader_id: i64,
        tracker: &StageTracker,
    ) -> AppResult<ReaderProfile> {
        let names = self.profiles.favorite_authors(reader_id).await?;
        if names.is_empty() {
            return Err(AppError::NotFound(format!(
                "No favorite authors found for user ID {}",
                reader_id
            )));
        }
        tracker.advance(PipelineStage::AuthorsFetched);

        let authors = self.resolver.resolve(&names).await?;
        if authors.is_empty() {
            return Err(AppError::NotFound(format!(
                "None of the favorite authors of user ID {} were found in the catalog",
                reader_id
            )));
        }
        tracker.advance(PipelineStage::AuthorsResolved);

        let subjects = self.aggregator.aggregate(&authors).await?;
        if subjects.weights.is_empty() {
            return Err(AppError::NotFound(format!(
                "No subjects found for the favorite authors of user ID {}",
                reader_id
            )));
        }
        tracker.advance(PipelineStage::SubjectsAggregated);

        for (author, author_subjects) in &subjects.per_author {
            tracing::debug!(
                reader_id,
                author = %author,
                subjects = ?author_subjects,
                "Author subjects"
            );
        }

        Ok(ReaderProfile {
            reader_id,
            authors,
            subjects,
        })
    }
}
