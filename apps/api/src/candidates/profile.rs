//! Standardized candidate profile documents (Markdown).

use std::fmt::Write;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::models::candidate::CandidateListing;
use crate::parsing::models::ExperienceEntry;

pub const PROFILE_PREFIX: &str = "generated_templates";
pub const PROFILE_CONTENT_TYPE: &str = "text/markdown; charset=utf-8";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TemplateStyle {
    #[default]
    Standard,
    /// Header, contact, skills and the most recent role only.
    Compact,
}

impl FromStr for TemplateStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "standard" => Ok(TemplateStyle::Standard),
            "compact" => Ok(TemplateStyle::Compact),
            other => Err(format!(
                "Unknown template '{other}'; expected 'standard' or 'compact'"
            )),
        }
    }
}

/// Keeps alphanumerics, `-` and `_`; spaces become `_`.
pub fn safe_name(full_name: &str) -> String {
    let kept: String = full_name
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    let joined = kept.split_whitespace().collect::<Vec<_>>().join("_");
    if joined.is_empty() {
        "Candidate".to_string()
    } else {
        joined
    }
}

pub fn profile_filename(full_name: &str, now: DateTime<Utc>) -> String {
    format!(
        "{}_StandardizedResume_{}.md",
        safe_name(full_name),
        now.format("%Y%m%d_%H%M%S")
    )
}

pub fn profile_key(filename: &str) -> String {
    format!("{PROFILE_PREFIX}/{filename}")
}

fn or_dash(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("-")
}

fn period(entry: &ExperienceEntry) -> Option<String> {
    let start = entry.start_date.as_deref()?;
    Some(format!(
        "{start} - {}",
        entry.end_date.as_deref().unwrap_or("Present")
    ))
}

fn write_experience(out: &mut String, entry: &ExperienceEntry) {
    let _ = writeln!(
        out,
        "### {} at {}",
        or_dash(entry.job_title.as_deref()),
        or_dash(entry.organization.as_deref())
    );
    if let Some(period) = period(entry) {
        let _ = writeln!(out, "*{period}*");
    }
    if let Some(location) = &entry.location {
        let _ = writeln!(out, "- Location: {location}");
    }
    if let Some(manager) = &entry.reporting_to {
        let _ = writeln!(out, "- Reporting to: {manager}");
    }
    if let Some(duties) = &entry.roles_responsibilities {
        let _ = writeln!(out, "- Responsibilities: {duties}");
    }
    if let Some(achievements) = &entry.achievements {
        let _ = writeln!(out, "- Achievements: {achievements}");
    }
    out.push('\n');
}

pub fn render_profile(
    listing: &CandidateListing,
    style: TemplateStyle,
    generated_at: DateTime<Utc>,
) -> String {
    let c = &listing.candidate;
    let mut out = String::new();

    let _ = writeln!(out, "# {}\n", c.full_name);
    let _ = writeln!(
        out,
        "**{}** at **{}**\n",
        or_dash(c.current_title.as_deref()),
        or_dash(c.current_employer.as_deref())
    );

    out.push_str("## Contact\n\n");
    let _ = writeln!(out, "- Email: {}", or_dash(Some(c.emails.join("; ").as_str())));
    let _ = writeln!(out, "- Phone: {}", or_dash(Some(c.phones.join("; ").as_str())));
    let _ = writeln!(out, "- Location: {}", or_dash(c.location.as_deref()));
    let _ = writeln!(out, "- LinkedIn: {}\n", or_dash(c.linkedin_url.as_deref()));

    out.push_str("## Summary\n\n");
    let experience = c
        .total_experience_years
        .map(|y| format!("{y} years"))
        .unwrap_or_else(|| "-".to_string());
    let _ = writeln!(out, "- Total experience: {experience}");
    let _ = writeln!(out, "- Notice period: {}", or_dash(c.notice_period.as_deref()));
    if style == TemplateStyle::Standard {
        let _ = writeln!(out, "- Current salary: {}", or_dash(c.current_salary.as_deref()));
        let _ = writeln!(out, "- Expected salary: {}", or_dash(c.expected_salary.as_deref()));
    }
    out.push('\n');

    out.push_str("## Skills\n\n");
    let _ = writeln!(out, "{}\n", or_dash(Some(c.skills.join(", ").as_str())));

    out.push_str("## Experience\n\n");
    match style {
        TemplateStyle::Standard => c.experience.iter().for_each(|e| write_experience(&mut out, e)),
        TemplateStyle::Compact => {
            if let Some(latest) = c.experience.first() {
                write_experience(&mut out, latest);
            }
        }
    }
    if c.experience.is_empty() {
        out.push_str("-\n\n");
    }

    if style == TemplateStyle::Standard {
        out.push_str("## Education\n\n");
        for e in c.education.iter() {
            let mut line = or_dash(e.degree.as_deref()).to_string();
            if let Some(institution) = &e.institution {
                let _ = write!(line, ", {institution}");
            }
            if let Some(major) = &e.major {
                let _ = write!(line, " ({major})");
            }
            if let Some(year) = e.graduation_year {
                let _ = write!(line, ", {year}");
            }
            let _ = writeln!(out, "- {line}");
        }
        if c.education.is_empty() {
            out.push_str("-\n");
        }
        out.push('\n');

        out.push_str("## Languages\n\n");
        let _ = writeln!(out, "{}\n", or_dash(Some(c.languages.join(", ").as_str())));
    }

    out.push_str("---\n\n");
    let _ = writeln!(
        out,
        "Generated {} from {} (model: {}, confidence: {})",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        or_dash(listing.source_filename.as_deref()),
        or_dash(listing.parsed_model.as_deref()),
        listing
            .parsed_confidence
            .map(|c| format!("{c:.1}"))
            .unwrap_or_else(|| "N/A".to_string())
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 30, 12, 0, 1).unwrap()
    }

    #[test]
    fn test_template_style_from_str() {
        assert_eq!("".parse::<TemplateStyle>(), Ok(TemplateStyle::Standard));
        assert_eq!(" Compact ".parse::<TemplateStyle>(), Ok(TemplateStyle::Compact));
        assert!("fancy".parse::<TemplateStyle>().unwrap_err().contains("fancy"));
    }

    #[test]
    fn test_safe_name() {
        assert_eq!(safe_name("Asha  Rao"), "Asha_Rao");
        assert_eq!(safe_name("O'Brien, Jean-Luc "), "OBrien_Jean-Luc");
        assert_eq!(safe_name("!!!"), "Candidate");
    }

    #[test]
    fn test_profile_filename_and_key() {
        let filename = profile_filename("Asha Rao", now());
        assert_eq!(filename, "Asha_Rao_StandardizedResume_20250630_120001.md");
        assert_eq!(
            profile_key(&filename),
            "generated_templates/Asha_Rao_StandardizedResume_20250630_120001.md"
        );
    }

    #[test]
    fn test_standard_profile_sections() {
        let listing = CandidateListing::sample("Asha Rao", &["Rust", "Kafka"]);
        let doc = render_profile(&listing, TemplateStyle::Standard, now());

        assert!(doc.starts_with("# Asha Rao\n"));
        assert!(doc.contains("**Backend Engineer** at **Acme Corp**"));
        assert!(doc.contains("- Total experience: 6.5 years"));
        assert!(doc.contains("Rust, Kafka"));
        assert!(doc.contains("### Backend Engineer at Acme Corp\n*2019-04 - Present*"));
        assert!(doc.contains("- B.Tech, IIT Madras (Computer Science), 2016"));
        assert!(doc.contains("- LinkedIn: -"));
        assert!(doc.contains("confidence: 88.0"));
    }

    #[test]
    fn test_compact_profile_omits_details() {
        let listing = CandidateListing::sample("Asha Rao", &["Rust"]);
        let doc = render_profile(&listing, TemplateStyle::Compact, now());

        assert!(doc.contains("## Experience"));
        assert!(!doc.contains("## Education"));
        assert!(!doc.contains("Expected salary"));
    }
}
