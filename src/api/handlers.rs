use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::time::Instant;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{ReaderProfile, RecommendedWork, ResolvedAuthor},
};

use super::AppState;

// Request/Response types

/// Raw query string; ids stay text so malformed values map to our own 400
#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub user1: Option<String>,
    pub user2: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BookResponse {
    pub title: String,
    pub authors: Vec<String>,
    pub description: Option<String>,
}

impl From<RecommendedWork> for BookResponse {
    fn from(work: RecommendedWork) -> Self {
        Self {
            title: work.title,
            authors: work.authors,
            description: work.description,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub recommendations: Vec<BookResponse>,
}

#[derive(Debug, Serialize)]
pub struct ReaderSubjectsResponse {
    pub reader_id: i64,
    pub authors: Vec<ResolvedAuthor>,
    pub subjects: BTreeMap<String, u32>,
    pub per_author: BTreeMap<String, BTreeSet<String>>,
}

impl From<ReaderProfile> for ReaderSubjectsResponse {
    fn from(profile: ReaderProfile) -> Self {
        Self {
            reader_id: profile.reader_id,
            authors: profile.authors,
            subjects: profile
                .subjects
                .weights
                .iter()
                .map(|(subject, weight)| (subject.to_string(), weight))
                .collect(),
            per_author: profile.subjects.per_author,
        }
    }
}

fn parse_reader_id(name: &str, raw: Option<&str>) -> AppResult<i64> {
    let raw = raw
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::InvalidInput(format!("Missing query parameter '{}'", name)))?;

    raw.parse::<i64>().map_err(|_| {
        AppError::InvalidInput(format!(
            "Query parameter '{}' must be an integer, got '{}'",
            name, raw
        ))
    })
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Books both readers should enjoy
pub async fn recommendations(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(query): Query<RecommendationQuery>,
) -> AppResult<Json<RecommendationsResponse>> {
    let accepted = Instant::now();
    let first_reader = parse_reader_id("user1", query.user1.as_deref())?;
    let second_reader = parse_reader_id("user2", query.user2.as_deref())?;

    tracing::info!(
        request_id = %request_id,
        first_reader,
        second_reader,
        "Recommendation requested"
    );

    let books = state
        .pipeline
        .recommend_since(first_reader, second_reader, accepted)
        .await?;

    Ok(Json(RecommendationsResponse {
        recommendations: books.into_iter().map(BookResponse::from).collect(),
    }))
}

/// One reader's resolved authors and subject weights
pub async fn reader_subjects(
    State(state): State<AppState>,
    Path(reader_id): Path<String>,
) -> AppResult<Json<ReaderSubjectsResponse>> {
    let accepted = Instant::now();
    let reader_id = parse_reader_id("id", Some(&reader_id))?;
    let profile = state
        .pipeline
        .reader_profile_since(reader_id, accepted)
        .await?;
    Ok(Json(profile.into()))
}
