use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::resume::{NewResume, ProcessingStatus, ResumeRow};
use crate::parsing::ParseOutcome;

pub async fn insert_resume(db: &PgPool, resume: &NewResume) -> Result<ResumeRow, sqlx::Error> {
    sqlx::query_as(
        r#"
        INSERT INTO resumes (id, source_filename, storage_key, content_type, size_bytes, processing_status)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(resume.id)
    .bind(&resume.source_filename)
    .bind(&resume.storage_key)
    .bind(&resume.content_type)
    .bind(resume.size_bytes)
    .bind(ProcessingStatus::Pending.as_str())
    .fetch_one(db)
    .await
}

pub async fn get_resume(db: &PgPool, id: Uuid) -> Result<Option<ResumeRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM resumes WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn set_status(
    db: &PgPool,
    id: Uuid,
    status: ProcessingStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE resumes SET processing_status = $1 WHERE id = $2")
        .bind(status.as_str())
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn mark_failed(db: &PgPool, id: Uuid, message: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE resumes SET processing_status = $1, error_message = $2 WHERE id = $3")
        .bind(ProcessingStatus::Failed.as_str())
        .bind(message)
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

/// Inserts the candidate and links it to the resume in one transaction, so a
/// completed resume always has exactly one candidate.
pub async fn persist_parsed(
    db: &PgPool,
    resume_id: Uuid,
    outcome: &ParseOutcome,
) -> Result<Uuid, sqlx::Error> {
    let parsed = &outcome.resume;
    let candidate_id = Uuid::new_v4();

    let mut tx = db.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO candidates
            (id, full_name, emails, phones, location, linkedin_url, current_title,
             current_employer, total_experience_years, current_salary, expected_salary,
             notice_period, skills, languages, education, experience, raw_json)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
        "#,
    )
    .bind(candidate_id)
    .bind(parsed.name().unwrap_or_default())
    .bind(&parsed.emails)
    .bind(&parsed.phones)
    .bind(&parsed.location)
    .bind(&parsed.linkedin_url)
    .bind(&parsed.current_role)
    .bind(&parsed.current_employer)
    .bind(parsed.total_experience_years)
    .bind(&parsed.current_salary)
    .bind(&parsed.expected_salary)
    .bind(&parsed.notice_period)
    .bind(&parsed.skills)
    .bind(&parsed.languages)
    .bind(Json(&parsed.education))
    .bind(Json(&parsed.experience))
    .bind(&outcome.raw)
    .execute(&mut *tx)
    .await?;

    let linked = sqlx::query(
        r#"
        UPDATE resumes
        SET candidate_id = $1, processing_status = $2, parsed_confidence = $3,
            parsed_model = $4, error_message = NULL
        WHERE id = $5
        "#,
    )
    .bind(candidate_id)
    .bind(ProcessingStatus::Completed.as_str())
    .bind(outcome.confidence)
    .bind(&outcome.model)
    .bind(resume_id)
    .execute(&mut *tx)
    .await?;
    if linked.rows_affected() == 0 {
        // Dropping the transaction rolls back the candidate insert.
        return Err(sqlx::Error::RowNotFound);
    }

    tx.commit().await?;
    Ok(candidate_id)
}

/// Inserts a resume row and persists `model_json` as its parsed candidate.
#[cfg(test)]
pub async fn seed_candidate(db: &PgPool, model_json: &str) -> (Uuid, Uuid) {
    let resume_id = Uuid::new_v4();
    insert_resume(
        db,
        &NewResume {
            id: resume_id,
            source_filename: "resume.txt".to_string(),
            storage_key: format!("resumes/{resume_id}/resume.txt"),
            content_type: Some("text/plain".to_string()),
            size_bytes: 512,
        },
    )
    .await
    .unwrap();

    let (resume, raw) = crate::parsing::decode_resume(model_json).unwrap();
    let outcome = ParseOutcome {
        confidence: crate::parsing::confidence::confidence_for(&resume),
        resume,
        raw,
        model: "Groq:llama-3.1-8b-instant".to_string(),
        attempts: 1,
    };
    let candidate_id = persist_parsed(db, resume_id, &outcome).await.unwrap();
    (resume_id, candidate_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    #[ignore = "requires DATABASE_URL pointing at a disposable Postgres"]
    async fn test_persist_links_exactly_one_candidate() {
        let Some(db) = test_pool().await else {
            return;
        };

        let (resume_id, candidate_id) = seed_candidate(
            &db,
            r#"{"full_name": "Asha Rao", "skills": ["Rust"], "github": "asha-r"}"#,
        )
        .await;

        let resume = get_resume(&db, resume_id).await.unwrap().unwrap();
        assert_eq!(resume.candidate_id, Some(candidate_id));
        assert_eq!(resume.processing_status, "completed");
        assert_eq!(resume.parsed_model.as_deref(), Some("Groq:llama-3.1-8b-instant"));
        assert!(resume.parsed_confidence.is_some());

        let linked: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM candidates c JOIN resumes r ON r.candidate_id = c.id \
             WHERE r.id = $1",
        )
        .bind(resume_id)
        .fetch_one(&db)
        .await
        .unwrap();
        assert_eq!(linked, 1);

        let raw: serde_json::Value =
            sqlx::query_scalar("SELECT raw_json FROM candidates WHERE id = $1")
                .bind(candidate_id)
                .fetch_one(&db)
                .await
                .unwrap();
        assert_eq!(raw["github"], "asha-r");
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL pointing at a disposable Postgres"]
    async fn test_persist_for_unknown_resume_rolls_back() {
        let Some(db) = test_pool().await else {
            return;
        };
        let name = format!("Orphan {}", Uuid::new_v4().simple());
        let (resume, raw) =
            crate::parsing::decode_resume(&format!(r#"{{"full_name": "{name}"}}"#)).unwrap();
        let outcome = ParseOutcome {
            resume,
            raw,
            model: "OpenAI:gpt-4o-mini".to_string(),
            confidence: 10.0,
            attempts: 3,
        };

        let err = persist_parsed(&db, Uuid::new_v4(), &outcome).await.unwrap_err();
        assert!(matches!(err, sqlx::Error::RowNotFound));

        let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM candidates WHERE full_name = $1")
            .bind(&name)
            .fetch_one(&db)
            .await
            .unwrap();
        assert_eq!(orphans, 0);
    }
}
