//! Structured resume fields as returned by the model.
//!
//! Models are inconsistent about types: years arrive as `"7"`, `7` or `""`,
//! lists arrive as `null` or a comma separated string. Decoding normalizes
//! all of that so downstream code sees `Option`s and clean `Vec`s.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    #[serde(default, deserialize_with = "lenient_string")]
    pub degree: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub institution: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub major: Option<String>,
    #[serde(default, deserialize_with = "lenient_i32")]
    pub graduation_year: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    #[serde(default, deserialize_with = "lenient_string")]
    pub job_title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub organization: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub reporting_to: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub start_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub end_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub roles_responsibilities: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub achievements: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedResume {
    #[serde(default, deserialize_with = "lenient_string")]
    pub full_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub emails: Vec<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub phones: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub linkedin_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub current_role: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub current_employer: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_experience_years: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub current_salary: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub expected_salary: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub notice_period: Option<String>,
    #[serde(default, deserialize_with = "lenient_records")]
    pub education: Vec<EducationEntry>,
    #[serde(default, deserialize_with = "lenient_records")]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub languages: Vec<String>,
    /// Self-reported by some models, 0–100.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub confidence: Option<f64>,
}

impl ParsedResume {
    /// The only field the database requires.
    pub fn name(&self) -> Option<&str> {
        self.full_name.as_deref()
    }
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(scalar_to_string(Value::deserialize(d)?))
}

/// Accepts `7`, `7.5`, `"7.5"`, `"7+ years"`; anything else becomes `None`.
fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => leading_number(&s),
        _ => None,
    }
    .filter(|v| v.is_finite()))
}

fn lenient_i32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i32>, D::Error> {
    Ok(lenient_f64(d)?.map(|v| v as i32))
}

fn leading_number(s: &str) -> Option<f64> {
    let s = s.trim();
    let end = s
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || *c == '.'))
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    s[..end].parse().ok()
}

fn lenient_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    let items = match Value::deserialize(d)? {
        Value::Array(values) => values.into_iter().filter_map(scalar_to_string).collect(),
        Value::String(s) => s
            .split([',', ';'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    };
    let mut seen = std::collections::HashSet::new();
    Ok(items
        .into_iter()
        .filter(|item| seen.insert(item.to_lowercase()))
        .collect())
}

/// Lists of objects; entries that are not objects, or decode to nothing but
/// defaults, are dropped.
fn lenient_records<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned + Default + PartialEq,
{
    let Value::Array(values) = Value::deserialize(d)? else {
        return Ok(Vec::new());
    };
    Ok(values
        .into_iter()
        .filter(|v| v.is_object())
        .filter_map(|v| serde_json::from_value::<T>(v).ok())
        .filter(|record| *record != T::default())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blank_strings_become_none() {
        let parsed: ParsedResume = serde_json::from_value(json!({
            "full_name": "Asha Rao",
            "location": "",
            "notice_period": "   "
        }))
        .unwrap();
        assert_eq!(parsed.name(), Some("Asha Rao"));
        assert!(parsed.location.is_none());
        assert!(parsed.notice_period.is_none());
    }

    #[test]
    fn test_experience_years_from_strings() {
        let parsed: ParsedResume =
            serde_json::from_value(json!({"total_experience_years": "7.5 years"})).unwrap();
        assert_eq!(parsed.total_experience_years, Some(7.5));

        let parsed: ParsedResume =
            serde_json::from_value(json!({"total_experience_years": 3})).unwrap();
        assert_eq!(parsed.total_experience_years, Some(3.0));

        let parsed: ParsedResume =
            serde_json::from_value(json!({"total_experience_years": ""})).unwrap();
        assert_eq!(parsed.total_experience_years, None);
    }

    #[test]
    fn test_lists_accept_null_and_comma_strings() {
        let parsed: ParsedResume = serde_json::from_value(json!({
            "skills": "Rust, SQL; rust , Kafka",
            "languages": null,
            "emails": ["a@example.com", "", 42]
        }))
        .unwrap();
        assert_eq!(parsed.skills, vec!["Rust", "SQL", "Kafka"]);
        assert!(parsed.languages.is_empty());
        assert_eq!(parsed.emails, vec!["a@example.com", "42"]);
    }

    #[test]
    fn test_empty_records_dropped() {
        let parsed: ParsedResume = serde_json::from_value(json!({
            "education": [
                {"degree": "", "institution": "", "major": "", "graduation_year": ""},
                {"degree": "B.Tech", "institution": "IIT Madras", "graduation_year": "2016"},
                "garbage"
            ]
        }))
        .unwrap();
        assert_eq!(parsed.education.len(), 1);
        assert_eq!(parsed.education[0].graduation_year, Some(2016));
    }
}
