//! Excel export of candidate listings.

use std::collections::HashMap;

use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_xlsxwriter::{Format, Workbook, Worksheet};

use super::filters::CandidateFilters;
use crate::models::candidate::CandidateListing;
use crate::parsing::models::EducationEntry;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const CANDIDATE_COLUMNS: &[(&str, f64)] = &[
    ("Full Name", 24.0),
    ("Emails", 30.0),
    ("Phones", 20.0),
    ("Location", 18.0),
    ("Current Role", 24.0),
    ("Current Employer", 24.0),
    ("Experience (Years)", 12.0),
    ("Skills", 40.0),
    ("Languages", 18.0),
    ("Education", 40.0),
    ("Notice Period", 14.0),
    ("Current Salary", 14.0),
    ("Expected Salary", 14.0),
    ("LinkedIn", 30.0),
    ("Parsing Model", 28.0),
    ("Confidence", 12.0),
    ("Processed At", 20.0),
    ("Source File", 28.0),
];

pub fn export_filename(now: DateTime<Utc>) -> String {
    format!("candidates_export_{}.xlsx", now.format("%Y%m%d_%H%M%S"))
}

/// Skill frequency across candidates, case-insensitive; the first spelling
/// seen is kept. Most frequent first, then alphabetical.
pub fn skill_frequency(candidates: &[CandidateListing]) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, (String, usize)> = HashMap::new();
    for listing in candidates {
        for skill in &listing.candidate.skills {
            let entry = counts
                .entry(skill.to_lowercase())
                .or_insert_with(|| (skill.clone(), 0));
            entry.1 += 1;
        }
    }
    let mut frequency: Vec<(String, usize)> = counts.into_values().collect();
    frequency.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.to_lowercase().cmp(&b.0.to_lowercase())));
    frequency
}

fn education_summary(education: &[EducationEntry]) -> String {
    education
        .iter()
        .map(|e| {
            let mut text = e.degree.clone().unwrap_or_default();
            if let Some(institution) = &e.institution {
                text.push_str(&format!(" - {institution}"));
            }
            if let Some(year) = e.graduation_year {
                text.push_str(&format!(" ({year})"));
            }
            text.trim_start_matches(" - ").to_string()
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn write_header(sheet: &mut Worksheet, columns: &[(&str, f64)], format: &Format) -> Result<()> {
    for (col, (title, width)) in columns.iter().enumerate() {
        let col = col as u16;
        sheet.write_string_with_format(0, col, *title, format)?;
        sheet.set_column_width(col, *width)?;
    }
    sheet.set_freeze_panes(1, 0)?;
    Ok(())
}

fn write_candidates_sheet(
    sheet: &mut Worksheet,
    candidates: &[CandidateListing],
    header: &Format,
) -> Result<()> {
    sheet.set_name("Candidates")?;
    write_header(sheet, CANDIDATE_COLUMNS, header)?;

    for (index, listing) in candidates.iter().enumerate() {
        let row = index as u32 + 1;
        let c = &listing.candidate;
        let text_cells = [
            (0, c.full_name.clone()),
            (1, c.emails.join("; ")),
            (2, c.phones.join("; ")),
            (3, c.location.clone().unwrap_or_default()),
            (4, c.current_title.clone().unwrap_or_default()),
            (5, c.current_employer.clone().unwrap_or_default()),
            (7, c.skills.join(", ")),
            (8, c.languages.join(", ")),
            (9, education_summary(&c.education)),
            (10, c.notice_period.clone().unwrap_or_default()),
            (11, c.current_salary.clone().unwrap_or_default()),
            (12, c.expected_salary.clone().unwrap_or_default()),
            (13, c.linkedin_url.clone().unwrap_or_default()),
            (14, listing.parsed_model.clone().unwrap_or_default()),
            (16, c.processing_date.format("%Y-%m-%d %H:%M:%S").to_string()),
            (17, listing.source_filename.clone().unwrap_or_default()),
        ];
        for (col, value) in text_cells {
            sheet.write_string(row, col, value)?;
        }
        if let Some(years) = c.total_experience_years {
            sheet.write_number(row, 6, years)?;
        }
        if let Some(confidence) = listing.parsed_confidence {
            sheet.write_number(row, 15, confidence)?;
        }
    }
    Ok(())
}

fn write_skills_sheet(
    sheet: &mut Worksheet,
    candidates: &[CandidateListing],
    header: &Format,
) -> Result<()> {
    sheet.set_name("Skills Summary")?;
    write_header(sheet, &[("Skill", 32.0), ("Candidates", 12.0)], header)?;
    for (index, (skill, count)) in skill_frequency(candidates).into_iter().enumerate() {
        let row = index as u32 + 1;
        sheet.write_string(row, 0, skill)?;
        sheet.write_number(row, 1, count as f64)?;
    }
    Ok(())
}

fn write_metadata_sheet(
    sheet: &mut Worksheet,
    candidates: &[CandidateListing],
    filters: &CandidateFilters,
    now: DateTime<Utc>,
    header: &Format,
) -> Result<()> {
    sheet.set_name("Export Metadata")?;
    write_header(sheet, &[("Field", 24.0), ("Value", 48.0)], header)?;
    let rows = [
        ("Exported At", now.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
        ("Total Candidates", candidates.len().to_string()),
        ("Filters", filters.describe()),
        (
            "Generated By",
            format!("{} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        ),
    ];
    for (index, (field, value)) in rows.into_iter().enumerate() {
        let row = index as u32 + 1;
        sheet.write_string(row, 0, field)?;
        sheet.write_string(row, 1, value)?;
    }
    Ok(())
}

/// Builds the workbook in memory and returns the `.xlsx` bytes.
pub fn build_workbook(
    candidates: &[CandidateListing],
    filters: &CandidateFilters,
    now: DateTime<Utc>,
) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    write_candidates_sheet(workbook.add_worksheet(), candidates, &header)?;
    write_skills_sheet(workbook.add_worksheet(), candidates, &header)?;
    write_metadata_sheet(workbook.add_worksheet(), candidates, filters, now, &header)?;

    Ok(workbook.save_to_buffer()?)
}
