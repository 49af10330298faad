use askama::Template;

use crate::candidates::filters::CandidateFilters;
use crate::models::candidate::CandidateListing;

pub struct Notice {
    pub kind: &'static str,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: "success",
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: "error",
            message: message.into(),
        }
    }
}

#[derive(Template)]
#[template(path = "upload.html")]
pub struct UploadPage {
    pub notice: Option<Notice>,
}

/// Filter values echoed back into the form inputs.
#[derive(Default)]
pub struct FilterForm {
    pub date_from: String,
    pub date_to: String,
    pub skills: String,
    pub experience_min: String,
    pub experience_max: String,
    /// Same filters, URL-encoded, for the export link.
    pub query_string: String,
}

impl From<&CandidateFilters> for FilterForm {
    fn from(filters: &CandidateFilters) -> Self {
        let fmt = |v: Option<String>| v.unwrap_or_default();
        let form = FilterForm {
            date_from: fmt(filters.date_from.map(|d| d.to_string())),
            date_to: fmt(filters.date_to.map(|d| d.to_string())),
            skills: fmt(filters.skills.clone()),
            experience_min: fmt(filters.experience_min.map(|v| v.to_string())),
            experience_max: fmt(filters.experience_max.map(|v| v.to_string())),
            query_string: String::new(),
        };
        FilterForm {
            query_string: encode_query(&form),
            ..form
        }
    }
}

fn encode_query(form: &FilterForm) -> String {
    let pairs = [
        ("date_from", &form.date_from),
        ("date_to", &form.date_to),
        ("skills", &form.skills),
        ("experience_min", &form.experience_min),
        ("experience_max", &form.experience_max),
    ];
    let Ok(mut url) = reqwest::Url::parse("http://localhost/") else {
        return String::new();
    };
    url.query_pairs_mut()
        .extend_pairs(pairs.into_iter().filter(|(_, v)| !v.is_empty()));
    url.query().unwrap_or_default().to_string()
}

pub struct CandidateRowView {
    pub name: String,
    pub experience: String,
    pub skills: String,
    pub model: String,
    pub confidence: String,
    pub download_url: Option<String>,
}

impl From<&CandidateListing> for CandidateRowView {
    fn from(listing: &CandidateListing) -> Self {
        let c = &listing.candidate;
        CandidateRowView {
            name: c.full_name.clone(),
            experience: c
                .total_experience_years
                .map(|y| y.to_string())
                .unwrap_or_else(|| "-".to_string()),
            skills: c.skills.join(", "),
            model: listing.parsed_model.clone().unwrap_or_else(|| "-".to_string()),
            confidence: listing
                .parsed_confidence
                .map(|v| format!("{v:.1}"))
                .unwrap_or_else(|| "-".to_string()),
            download_url: listing.resume_id.map(|id| format!("/download/{id}")),
        }
    }
}

#[derive(Template)]
#[template(path = "candidates.html")]
pub struct CandidatesPage {
    pub form: FilterForm,
    pub error: Option<String>,
    pub rows: Vec<CandidateRowView>,
}
