use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::parsing::models::{EducationEntry, ExperienceEntry};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CandidateRow {
    pub id: Uuid,
    pub full_name: String,
    pub emails: Vec<String>,
    pub phones: Vec<String>,
    pub location: Option<String>,
    pub linkedin_url: Option<String>,
    #[serde(rename = "current_role")]
    pub current_title: Option<String>,
    pub current_employer: Option<String>,
    pub total_experience_years: Option<f64>,
    pub current_salary: Option<String>,
    pub expected_salary: Option<String>,
    pub notice_period: Option<String>,
    pub skills: Vec<String>,
    pub languages: Vec<String>,
    pub education: Json<Vec<EducationEntry>>,
    pub experience: Json<Vec<ExperienceEntry>>,
    pub status: String,
    pub processing_date: DateTime<Utc>,
}

/// A candidate with the resume it was parsed from, as shown in listings
/// and exports.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CandidateListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub candidate: CandidateRow,
    pub resume_id: Option<Uuid>,
    pub source_filename: Option<String>,
    pub parsed_model: Option<String>,
    pub parsed_confidence: Option<f64>,
}

#[cfg(test)]
impl CandidateListing {
    /// A fully populated listing for rendering tests.
    pub fn sample(full_name: &str, skills: &[&str]) -> Self {
        use chrono::TimeZone;

        CandidateListing {
            candidate: CandidateRow {
                id: Uuid::nil(),
                full_name: full_name.to_string(),
                emails: vec!["asha@example.com".to_string()],
                phones: vec!["+91 98765 43210".to_string()],
                location: Some("Bengaluru".to_string()),
                linkedin_url: None,
                current_title: Some("Backend Engineer".to_string()),
                current_employer: Some("Acme Corp".to_string()),
                total_experience_years: Some(6.5),
                current_salary: None,
                expected_salary: None,
                notice_period: Some("30 days".to_string()),
                skills: skills.iter().map(|s| s.to_string()).collect(),
                languages: vec!["English".to_string()],
                education: Json(vec![EducationEntry {
                    degree: Some("B.Tech".to_string()),
                    institution: Some("IIT Madras".to_string()),
                    major: Some("Computer Science".to_string()),
                    graduation_year: Some(2016),
                }]),
                experience: Json(vec![ExperienceEntry {
                    job_title: Some("Backend Engineer".to_string()),
                    organization: Some("Acme Corp".to_string()),
                    start_date: Some("2019-04".to_string()),
                    roles_responsibilities: Some("Payments APIs".to_string()),
                    ..Default::default()
                }]),
                status: "active".to_string(),
                processing_date: Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 0).unwrap(),
            },
            resume_id: Some(Uuid::nil()),
            source_filename: Some("asha.pdf".to_string()),
            parsed_model: Some("Groq:llama-3.1-8b-instant".to_string()),
            parsed_confidence: Some(88.0),
        }
    }
}
