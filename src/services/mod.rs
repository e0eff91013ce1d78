pub mod author_resolver;
pub mod book_recommender;
pub mod catalog;
pub mod fan_out;
pub mod pipeline;
pub mod subject_aggregator;
pub mod subject_selector;

pub use author_resolver::AuthorResolver;
pub use book_recommender::{BookRecommender, RecommenderLimits};
pub use catalog::{Catalog, OpenLibraryCatalog};
pub use pipeline::{PipelineStage, RecommendationPipeline};
pub use subject_aggregator::SubjectAggregator;
pub use subject_selector::select_shared_subject;
