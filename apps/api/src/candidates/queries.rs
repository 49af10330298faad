use std::collections::BTreeMap;

use serde::Serialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::filters::CandidateFilters;
use crate::models::candidate::CandidateListing;

/// Each candidate is created from exactly one resume, so the join is 1:1.
const LISTING_SELECT: &str = "SELECT c.*, r.id AS resume_id, r.source_filename, \
     r.parsed_model, r.parsed_confidence \
     FROM candidates c LEFT JOIN resumes r ON r.candidate_id = c.id";

pub fn listing_query(filters: &CandidateFilters) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(LISTING_SELECT);
    filters.push_where(&mut qb);
    qb.push(" ORDER BY c.processing_date DESC, c.full_name");
    qb
}

pub async fn list_candidates(
    db: &PgPool,
    filters: &CandidateFilters,
) -> Result<Vec<CandidateListing>, sqlx::Error> {
    listing_query(filters)
        .build_query_as::<CandidateListing>()
        .fetch_all(db)
        .await
}

pub async fn get_candidate(db: &PgPool, id: Uuid) -> Result<Option<CandidateListing>, sqlx::Error> {
    let mut qb = QueryBuilder::new(LISTING_SELECT);
    qb.push(" WHERE c.id = ").push_bind(id).push(" LIMIT 1");
    qb.build_query_as::<CandidateListing>()
        .fetch_optional(db)
        .await
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceStats {
    pub total_resumes: i64,
    pub total_candidates: i64,
    pub resumes_by_status: BTreeMap<String, i64>,
    pub resumes_by_model: BTreeMap<String, i64>,
    pub average_confidence: Option<f64>,
}

pub async fn service_stats(db: &PgPool) -> Result<ServiceStats, sqlx::Error> {
    let total_resumes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM resumes")
        .fetch_one(db)
        .await?;
    let total_candidates: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM candidates")
        .fetch_one(db)
        .await?;

    let by_status: Vec<(String, i64)> = sqlx::query_as(
        "SELECT processing_status, COUNT(*) FROM resumes GROUP BY processing_status",
    )
    .fetch_all(db)
    .await?;

    let by_model: Vec<(String, i64)> = sqlx::query_as(
        "SELECT parsed_model, COUNT(*) FROM resumes \
         WHERE parsed_model IS NOT NULL GROUP BY parsed_model",
    )
    .fetch_all(db)
    .await?;

    let average_confidence: Option<f64> = sqlx::query_scalar(
        "SELECT AVG(parsed_confidence) FROM resumes WHERE parsed_confidence IS NOT NULL",
    )
    .fetch_one(db)
    .await?;

    Ok(ServiceStats {
        total_resumes,
        total_candidates,
        resumes_by_status: by_status.into_iter().collect(),
        resumes_by_model: by_model.into_iter().collect(),
        average_confidence: average_confidence.map(|c| (c * 10.0).round() / 10.0),
    })
}
