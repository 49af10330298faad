use super::models::ParsedResume;

/// Field weights for the completeness score used when the model does not
/// report its own confidence. Weights sum to 1.0.
const FIELD_WEIGHTS: &[(&str, f64)] = &[
    ("full_name", 0.20),
    ("contact", 0.15),
    ("experience", 0.20),
    ("education", 0.10),
    ("skills", 0.15),
    ("current_role", 0.05),
    ("total_experience_years", 0.05),
    ("location", 0.05),
    ("languages", 0.05),
];

fn field_present(resume: &ParsedResume, field: &str) -> bool {
    match field {
        "full_name" => resume.full_name.is_some(),
        "contact" => !resume.emails.is_empty() || !resume.phones.is_empty(),
        "experience" => !resume.experience.is_empty(),
        "education" => !resume.education.is_empty(),
        "skills" => !resume.skills.is_empty(),
        "current_role" => resume.current_role.is_some(),
        "total_experience_years" => resume.total_experience_years.is_some(),
        "location" => resume.location.is_some(),
        "languages" => !resume.languages.is_empty(),
        _ => false,
    }
}

/// Weighted share of populated fields, 0–100.
pub fn completeness_score(resume: &ParsedResume) -> f64 {
    let total: f64 = FIELD_WEIGHTS.iter().map(|(_, w)| w).sum();
    let present: f64 = FIELD_WEIGHTS
        .iter()
        .filter(|(field, _)| field_present(resume, field))
        .map(|(_, w)| w)
        .sum();
    ((present / total) * 100.0).clamp(0.0, 100.0)
}

/// Model-reported confidence when present (clamped to 0–100), otherwise
/// the completeness score. Rounded to one decimal.
pub fn confidence_for(resume: &ParsedResume) -> f64 {
    let raw = match resume.confidence {
        Some(c) => c.clamp(0.0, 100.0),
        None => completeness_score(resume),
    };
    (raw * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_sum_to_one() {
        let total: f64 = FIELD_WEIGHTS.iter().map(|(_, w)| w).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_resume_scores_zero() {
        assert_eq!(completeness_score(&ParsedResume::default()), 0.0);
    }

    #[test]
    fn test_partial_resume_score() {
        let resume = ParsedResume {
            full_name: Some("Asha Rao".into()),
            emails: vec!["asha@example.com".into()],
            skills: vec!["Rust".into()],
            ..Default::default()
        };
        assert_eq!(confidence_for(&resume), 50.0);
    }

    #[test]
    fn test_model_confidence_wins_and_is_clamped() {
        let resume = ParsedResume {
            confidence: Some(140.0),
            ..Default::default()
        };
        assert_eq!(confidence_for(&resume), 100.0);

        let resume = ParsedResume {
            confidence: Some(87.25),
            ..Default::default()
        };
        assert_eq!(confidence_for(&resume), 87.3);
    }
}
