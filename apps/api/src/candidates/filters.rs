use std::fmt;
use std::str::FromStr;

use chrono::{Days, NaiveDate};
use serde::{de, Deserialize, Deserializer};
use sqlx::{Postgres, QueryBuilder};

use crate::errors::AppError;

/// Listing filters shared by the JSON API, the HTML table and the export.
/// Every field is optional; blank query values are treated as absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateFilters {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub date_from: Option<NaiveDate>,
    /// Inclusive: candidates processed at any time on this day match.
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub date_to: Option<NaiveDate>,
    /// Comma separated; each term must appear in some skill.
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub skills: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub experience_min: Option<f64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub experience_max: Option<f64>,
}

fn empty_string_as_none<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let opt = Option::<String>::deserialize(de)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => FromStr::from_str(s).map_err(de::Error::custom).map(Some),
    }
}

/// Escapes `ILIKE` wildcards so terms match literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn clause<'q, 'args>(
    qb: &'q mut QueryBuilder<'args, Postgres>,
    first: &mut bool,
) -> &'q mut QueryBuilder<'args, Postgres> {
    qb.push(if *first { " WHERE " } else { " AND " });
    *first = false;
    qb
}

impl CandidateFilters {
    pub fn skill_terms(&self) -> Vec<String> {
        self.skills
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.date_from.is_none()
            && self.date_to.is_none()
            && self.skill_terms().is_empty()
            && self.experience_min.is_none()
            && self.experience_max.is_none()
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if let (Some(from), Some(to)) = (self.date_from, self.date_to) {
            if from > to {
                return Err(AppError::Validation(
                    "date_from must not be after date_to".to_string(),
                ));
            }
        }
        if let (Some(min), Some(max)) = (self.experience_min, self.experience_max) {
            if min > max {
                return Err(AppError::Validation(
                    "experience_min must not exceed experience_max".to_string(),
                ));
            }
        }
        for value in [self.experience_min, self.experience_max].into_iter().flatten() {
            if !value.is_finite() || value < 0.0 {
                return Err(AppError::Validation(
                    "experience bounds must be non-negative numbers".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Appends a `WHERE` clause over the `c` (candidates) alias. Pushes
    /// nothing when no filter is set.
    pub fn push_where(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        let mut first = true;

        if let Some(from) = self.date_from {
            clause(qb, &mut first)
                .push("c.processing_date >= ")
                .push_bind(from.and_hms_opt(0, 0, 0).map(|d| d.and_utc()));
        }
        if let Some(to) = self.date_to {
            // Half-open upper bound at the start of the following day.
            clause(qb, &mut first).push("c.processing_date < ").push_bind(
                to.checked_add_days(Days::new(1))
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(|d| d.and_utc()),
            );
        }
        for term in self.skill_terms() {
            clause(qb, &mut first)
                .push("EXISTS (SELECT 1 FROM unnest(c.skills) AS skill WHERE skill ILIKE ")
                .push_bind(like_pattern(&term))
                .push(")");
        }
        if let Some(min) = self.experience_min {
            clause(qb, &mut first)
                .push("c.total_experience_years >= ")
                .push_bind(min);
        }
        if let Some(max) = self.experience_max {
            clause(qb, &mut first)
                .push("c.total_experience_years <= ")
                .push_bind(max);
        }
    }

    /// Human-readable summary, used in the export metadata sheet.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(from) = self.date_from {
            parts.push(format!("from {from}"));
        }
        if let Some(to) = self.date_to {
            parts.push(format!("to {to}"));
        }
        let terms = self.skill_terms();
        if !terms.is_empty() {
            parts.push(format!("skills: {}", terms.join(", ")));
        }
        match (self.experience_min, self.experience_max) {
            (Some(min), Some(max)) => parts.push(format!("experience {min}-{max} years")),
            (Some(min), None) => parts.push(format!("experience >= {min} years")),
            (None, Some(max)) => parts.push(format!("experience <= {max} years")),
            (None, None) => {}
        }
        if parts.is_empty() {
            "none".to_string()
        } else {
            parts.join("; ")
        }
    }
}
