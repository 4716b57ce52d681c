use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Visit, VisitsQuery};

pub const MAX_VISIT_AHEAD_DAYS: i64 = 60;

pub fn validate_visit_date(date_time: DateTime<Utc>, now: DateTime<Utc>) -> AppResult<()> {
    if date_time < now {
        return Err(AppError::Validation(
            "date_time: visit date must be in the future".to_string(),
        ));
    }
    if date_time > now + Duration::days(MAX_VISIT_AHEAD_DAYS) {
        return Err(AppError::Validation(format!(
            "date_time: visit date cannot be more than {} days from now",
            MAX_VISIT_AHEAD_DAYS
        )));
    }
    Ok(())
}

/// Порядок проверок: повторная запись, затем дата, затем запись на собственную квартиру.
pub fn check_visit_request(
    already_booked: bool,
    owner_id: Uuid,
    tenant_id: Uuid,
    date_time: DateTime<Utc>,
    now: DateTime<Utc>,
) -> AppResult<()> {
    if already_booked {
        return Err(AppError::Conflict(
            "Visit for this apartment already exists".to_string(),
        ));
    }

    validate_visit_date(date_time, now)?;

    if owner_id == tenant_id {
        tracing::debug!(tenant_id = %tenant_id, "Owner tried to book own apartment");
        return Err(AppError::Forbidden);
    }

    Ok(())
}

pub struct VisitService;

impl VisitService {
    pub async fn schedule(
        pool: &PgPool,
        apartment_id: Uuid,
        tenant_id: Uuid,
        date_time: DateTime<Utc>,
    ) -> AppResult<Visit> {
        let (owner_id,): (Uuid,) = sqlx::query_as("SELECT owner_id FROM apartments WHERE id = $1")
            .bind(apartment_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Apartment not found".to_string()))?;

        let (already_booked,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM visits WHERE apartment_id = $1 AND tenant_id = $2)",
        )
        .bind(apartment_id)
        .bind(tenant_id)
        .fetch_one(pool)
        .await?;

        check_visit_request(already_booked, owner_id, tenant_id, date_time, Utc::now())?;

        // Гонку между проверкой и вставкой закрывает уникальный индекс (apartment_id, tenant_id)
        let visit = sqlx::query_as::<_, Visit>(
            r#"
            INSERT INTO visits (apartment_id, tenant_id, date_time)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(apartment_id)
        .bind(tenant_id)
        .bind(date_time)
        .fetch_one(pool)
        .await?;

        tracing::info!(
            visit_id = %visit.id,
            apartment_id = %apartment_id,
            tenant_id = %tenant_id,
            "Visit scheduled"
        );

        Ok(visit)
    }

    pub async fn list_for_owner(
        pool: &PgPool,
        owner_id: Uuid,
        query: &VisitsQuery,
    ) -> AppResult<Vec<Visit>> {
        let visits = sqlx::query_as::<_, Visit>(
            r#"
            SELECT v.* FROM visits v
            JOIN apartments a ON a.id = v.apartment_id
            WHERE a.owner_id = $1
              AND ($2::timestamptz IS NULL OR v.date_time >= $2)
              AND ($3::timestamptz IS NULL OR v.date_time <= $3)
              AND ($4::uuid IS NULL OR v.apartment_id = $4)
              AND ($5::visit_state IS NULL OR v.state = $5)
            ORDER BY v.date_time, v.id
            "#,
        )
        .bind(owner_id)
        .bind(query.date_time_gte)
        .bind(query.date_time_lte)
        .bind(query.apartment)
        .bind(query.state)
        .fetch_all(pool)
        .await?;

        Ok(visits)
    }

    pub async fn list_for_tenant(
        pool: &PgPool,
        tenant_id: Uuid,
        query: &VisitsQuery,
    ) -> AppResult<Vec<Visit>> {
        let visits = sqlx::query_as::<_, Visit>(
            r#"
            SELECT * FROM visits
            WHERE tenant_id = $1
              AND ($2::timestamptz IS NULL OR date_time >= $2)
              AND ($3::timestamptz IS NULL OR date_time <= $3)
              AND ($4::uuid IS NULL OR apartment_id = $4)
              AND ($5::visit_state IS NULL OR state = $5)
            ORDER BY date_time, id
            "#,
        )
        .bind(tenant_id)
        .bind(query.date_time_gte)
        .bind(query.date_time_lte)
        .bind(query.apartment)
        .bind(query.state)
        .fetch_all(pool)
        .await?;

        Ok(visits)
    }
}
