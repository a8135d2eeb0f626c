use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::{Config, Pool, Runtime};
use log::{error, info};
use tokio_postgres::types::Json;
use tokio_postgres::{NoTls, Row};
use uuid::Uuid;

use super::models::*;
use super::{AssessmentStore, DatabaseError, Result};
use crate::config::Settings;
use crate::scoring::{DimensionScores, Insights};

pub const TABLES: [&str; 3] = ["survey_results", "survey_responses", "leadership_analysis"];

const SURVEY_COLUMNS: &str = r#"
    id, user_id, name, email, organization, department, position,
    completion_time_seconds, consistency, warnings, answer_pattern, created_at
"#;

const ANALYSIS_COLUMNS: &str = r#"
    id, survey_id, user_id,
    blake_mouton_people, blake_mouton_production, feedback_care, feedback_challenge, lmx_score,
    influence_machiavellianism, influence_narcissism, influence_psychopathy,
    leadership_style, candor_quadrant, lmx_level, overall_risk_level,
    insights, ai_insights, created_at, updated_at
"#;

#[derive(Debug)]
pub struct DatabaseManager {
    pool: Pool,
}

impl DatabaseManager {
    pub async fn new(settings: &Settings) -> Result<Self> {
        info!(
            "Connecting to database: {}@{}:{}/{}",
            settings.db_user, settings.db_host, settings.db_port, settings.db_name
        );

        let mut cfg = Config::new();
        cfg.url = Some(settings.database_url());
        cfg.manager = Some(deadpool_postgres::ManagerConfig {
            recycling_method: deadpool_postgres::RecyclingMethod::Fast,
        });

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| DatabaseError::ConnectionFailed(format!("Pool creation failed: {}", e)))?;

        // Test connection
        let _client = pool
            .get()
            .await
            .map_err(|e| DatabaseError::ConnectionFailed(format!("Connection test failed: {}", e)))?;

        info!("Database connection established successfully");

        Ok(DatabaseManager { pool })
    }

    async fn client(&self) -> Result<deadpool_postgres::Object> {
        self.pool
            .get()
            .await
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))
    }

    /// Row counts per table; `None` when a table is missing.
    pub async fn table_counts(&self) -> Result<Vec<(String, Option<i64>)>> {
        let client = self.client().await?;
        let mut counts = Vec::with_capacity(TABLES.len());

        for table in TABLES {
            let exists: bool = client
                .query_one(
                    r#"
                    SELECT EXISTS (
                        SELECT 1 FROM information_schema.tables
                        WHERE table_schema = 'public' AND table_name = $1
                    )
                    "#,
                    &[&table],
                )
                .await
                .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?
                .get(0);

            let count = if exists {
                let sql = format!("SELECT COUNT(*) FROM {}", table);
                let row = client
                    .query_one(sql.as_str(), &[])
                    .await
                    .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
                Some(row.get::<_, i64>(0))
            } else {
                None
            };
            counts.push((table.to_string(), count));
        }

        Ok(counts)
    }

    fn row_to_survey(row: &Row) -> Result<SurveyRecord> {
        let invalid = |e: &dyn std::fmt::Display| DatabaseError::InvalidRecord(e.to_string());
        let warnings: Json<Vec<String>> = row.try_get("warnings").map_err(|e| invalid(&e))?;

        Ok(SurveyRecord {
            id: row.try_get("id").map_err(|e| invalid(&e))?,
            user_id: row.try_get("user_id").map_err(|e| invalid(&e))?,
            name: row.try_get("name").map_err(|e| invalid(&e))?,
            email: row.try_get("email").map_err(|e| invalid(&e))?,
            organization: row.try_get("organization").map_err(|e| invalid(&e))?,
            department: row.try_get("department").map_err(|e| invalid(&e))?,
            position: row.try_get("position").map_err(|e| invalid(&e))?,
            completion_time_seconds: row.try_get("completion_time_seconds").map_err(|e| invalid(&e))?,
            consistency: row.try_get("consistency").map_err(|e| invalid(&e))?,
            warnings: warnings.0,
            answer_pattern: row.try_get("answer_pattern").map_err(|e| invalid(&e))?,
            created_at: row.try_get("created_at").map_err(|e| invalid(&e))?,
        })
    }

    fn row_to_analysis(row: &Row) -> Result<AnalysisRecord> {
        let invalid = |e: &dyn std::fmt::Display| DatabaseError::InvalidRecord(e.to_string());

        let style: String = row.try_get("leadership_style").map_err(|e| invalid(&e))?;
        let candor: String = row.try_get("candor_quadrant").map_err(|e| invalid(&e))?;
        let lmx: String = row.try_get("lmx_level").map_err(|e| invalid(&e))?;
        let risk: String = row.try_get("overall_risk_level").map_err(|e| invalid(&e))?;
        let insights: Json<Insights> = row.try_get("insights").map_err(|e| invalid(&e))?;
        let ai_insights: Json<Vec<AiInsightEntry>> =
            row.try_get("ai_insights").map_err(|e| invalid(&e))?;
        let score = |column: &str| row.try_get::<_, f64>(column).map_err(|e| invalid(&e));

        Ok(AnalysisRecord {
            id: row.try_get("id").map_err(|e| invalid(&e))?,
            survey_id: row.try_get("survey_id").map_err(|e| invalid(&e))?,
            user_id: row.try_get("user_id").map_err(|e| invalid(&e))?,
            scores: DimensionScores {
                people: score("blake_mouton_people")?,
                production: score("blake_mouton_production")?,
                care: score("feedback_care")?,
                challenge: score("feedback_challenge")?,
                lmx: score("lmx_score")?,
                machiavellianism: score("influence_machiavellianism")?,
                narcissism: score("influence_narcissism")?,
                psychopathy: score("influence_psychopathy")?,
            },
            blake_mouton_style: style.parse().map_err(|e| invalid(&e))?,
            candor_quadrant: candor.parse().map_err(|e| invalid(&e))?,
            lmx_level: lmx.parse().map_err(|e| invalid(&e))?,
            risk_level: risk.parse().map_err(|e| invalid(&e))?,
            insights: insights.0,
            ai_insights: ai_insights.0,
            created_at: row.try_get("created_at").map_err(|e| invalid(&e))?,
            updated_at: row.try_get("updated_at").map_err(|e| invalid(&e))?,
        })
    }
}

#[async_trait]
impl AssessmentStore for DatabaseManager {
    async fn save_submission(&self, submission: &Submission) -> Result<()> {
        let mut client = self.client().await?;
        let tx = client
            .transaction()
            .await
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let survey = &submission.survey;
        let analysis = &submission.analysis;

        tx.execute(
            r#"
            INSERT INTO survey_results (
                id, user_id, name, email, organization, department, position,
                completion_time_seconds, consistency, warnings, answer_pattern, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
            &[
                &survey.id,
                &survey.user_id,
                &survey.name,
                &survey.email,
                &survey.organization,
                &survey.department,
                &survey.position,
                &survey.completion_time_seconds,
                &survey.consistency,
                &Json(&survey.warnings),
                &survey.answer_pattern,
                &survey.created_at,
            ],
        )
        .await
        .map_err(|e| {
            error!("Failed to insert survey {}: {}", survey.id, e);
            DatabaseError::QueryFailed(e.to_string())
        })?;

        let insert_response = tx
            .prepare(
                r#"
                INSERT INTO survey_responses (survey_id, question_id, value)
                VALUES ($1, $2, $3)
                "#,
            )
            .await
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        for response in &submission.responses {
            tx.execute(
                &insert_response,
                &[&survey.id, &response.question_id, &i16::from(response.value)],
            )
            .await
            .map_err(|e| {
                error!("Failed to insert response {} for survey {}: {}", response.question_id, survey.id, e);
                DatabaseError::QueryFailed(e.to_string())
            })?;
        }

        let scores = &analysis.scores;
        let insert_analysis = format!(
            "INSERT INTO leadership_analysis ({}) VALUES \
             ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)",
            ANALYSIS_COLUMNS
        );
        tx.execute(
            insert_analysis.as_str(),
            &[
                &analysis.id,
                &analysis.survey_id,
                &analysis.user_id,
                &scores.people,
                &scores.production,
                &scores.care,
                &scores.challenge,
                &scores.lmx,
                &scores.machiavellianism,
                &scores.narcissism,
                &scores.psychopathy,
                &analysis.blake_mouton_style.as_str(),
                &analysis.candor_quadrant.as_str(),
                &analysis.lmx_level.as_str(),
                &analysis.risk_level.as_str(),
                &Json(&analysis.insights),
                &Json(&analysis.ai_insights),
                &analysis.created_at,
                &analysis.updated_at,
            ],
        )
        .await
        .map_err(|e| {
            error!("Failed to insert analysis {}: {}", analysis.id, e);
            DatabaseError::QueryFailed(e.to_string())
        })?;

        tx.commit()
            .await
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        info!(
            "✅ Stored survey {} with {} responses and analysis {}",
            survey.id,
            submission.responses.len(),
            analysis.id
        );
        Ok(())
    }

    async fn get_analysis(&self, id: Uuid) -> Result<Option<AnalysisRecord>> {
        let client = self.client().await?;
        let sql = format!("SELECT {} FROM leadership_analysis WHERE id = $1", ANALYSIS_COLUMNS);
        let row = client
            .query_opt(sql.as_str(), &[&id])
            .await
            .map_err(|e| {
                error!("Failed to fetch analysis {}: {}", id, e);
                DatabaseError::QueryFailed(e.to_string())
            })?;

        row.as_ref().map(Self::row_to_analysis).transpose()
    }

    async fn list_analyses_for_user(&self, user_id: &str) -> Result<Vec<AnalysisRecord>> {
        let client = self.client().await?;
        let sql = format!(
            "SELECT {} FROM leadership_analysis WHERE user_id = $1 ORDER BY created_at DESC",
            ANALYSIS_COLUMNS
        );
        let rows = client
            .query(sql.as_str(), &[&user_id])
            .await
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        rows.iter().map(Self::row_to_analysis).collect()
    }

    async fn list_analyses(&self, limit: usize) -> Result<Vec<AnalysisRecord>> {
        let client = self.client().await?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let sql = format!(
            "SELECT {} FROM leadership_analysis ORDER BY created_at DESC LIMIT $1",
            ANALYSIS_COLUMNS
        );
        let rows = client
            .query(sql.as_str(), &[&limit])
            .await
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        rows.iter().map(Self::row_to_analysis).collect()
    }

    async fn append_ai_insight(&self, id: Uuid, entry: &AiInsightEntry) -> Result<()> {
        let client = self.client().await?;
        let rows_affected = client
            .execute(
                r#"
                UPDATE leadership_analysis
                SET ai_insights = ai_insights || jsonb_build_array($1::jsonb),
                    updated_at = $2
                WHERE id = $3
                "#,
                &[&Json(entry), &entry.created_at, &id],
            )
            .await
            .map_err(|e| {
                error!("Failed to append AI insight to {}: {}", id, e);
                DatabaseError::QueryFailed(e.to_string())
            })?;

        if rows_affected == 0 {
            return Err(DatabaseError::NotFound(id));
        }

        info!("Appended {} insight to analysis {}", entry.insight.provider, id);
        Ok(())
    }

    async fn recent_surveys(&self, email: &str, since: DateTime<Utc>) -> Result<Vec<SurveyRecord>> {
        let client = self.client().await?;
        let sql = format!(
            "SELECT {} FROM survey_results \
             WHERE LOWER(email) = LOWER($1) AND created_at >= $2 \
             ORDER BY created_at DESC",
            SURVEY_COLUMNS
        );
        let rows = client
            .query(sql.as_str(), &[&email.trim(), &since])
            .await
            .map_err(|e| {
                error!("Failed to look up recent surveys: {}", e);
                DatabaseError::QueryFailed(e.to_string())
            })?;

        rows.iter().map(Self::row_to_survey).collect()
    }

    async fn team_analyses(&self, organization: &str, department: Option<&str>) -> Result<Vec<AnalysisRecord>> {
        let client = self.client().await?;
        let columns: Vec<String> = ANALYSIS_COLUMNS
            .split(',')
            .map(|c| format!("a.{}", c.trim()))
            .collect();
        let sql = format!(
            "SELECT {} FROM leadership_analysis a \
             JOIN survey_results s ON s.id = a.survey_id \
             WHERE s.organization = $1 AND ($2::text IS NULL OR s.department = $2) \
             ORDER BY a.created_at DESC",
            columns.join(", ")
        );
        let rows = client
            .query(sql.as_str(), &[&organization, &department])
            .await
            .map_err(|e| {
                error!("Failed to load team analyses for {}: {}", organization, e);
                DatabaseError::QueryFailed(e.to_string())
            })?;

        rows.iter().map(Self::row_to_analysis).collect()
    }

    async fn stats(&self) -> Result<SurveyStats> {
        let client = self.client().await?;

        let row = client
            .query_one(
                r#"
                SELECT COUNT(*), AVG(completion_time_seconds)::float8, MAX(created_at)
                FROM survey_results
                "#,
                &[],
            )
            .await
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let total: i64 = row.get(0);
        let average: Option<f64> = row.get(1);
        let last: Option<DateTime<Utc>> = row.get(2);

        let distribution: BTreeMap<String, u64> = client
            .query(
                r#"
                SELECT leadership_style, COUNT(*)
                FROM leadership_analysis
                GROUP BY leadership_style
                "#,
                &[],
            )
            .await
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?
            .iter()
            .map(|row| (row.get::<_, String>(0), row.get::<_, i64>(1).max(0) as u64))
            .collect();

        Ok(SurveyStats {
            total_responses: total.max(0) as u64,
            average_completion_seconds: average,
            last_response_at: last,
            style_distribution: distribution,
        })
    }

    async fn ping(&self) -> Result<()> {
        let client = self.client().await?;
        client
            .query_one("SELECT 1", &[])
            .await
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        Ok(())
    }
}
