use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Состояние визита. Пока известно только начальное состояние,
/// переходы появятся вместе с подтверждением визитов владельцем.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "visit_state", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
#[non_exhaustive]
pub enum VisitState {
    Pending,
}

impl Default for VisitState {
    fn default() -> Self {
        Self::Pending
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Visit {
    pub id: Uuid,
    pub apartment_id: Uuid,
    pub tenant_id: Uuid,
    pub date_time: DateTime<Utc>,
    pub state: VisitState,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VisitResponse {
    pub id: Uuid,
    pub apartment: Uuid,
    pub tenant: Uuid,
    pub date_time: DateTime<Utc>,
    pub state: VisitState,
}

impl From<Visit> for VisitResponse {
    fn from(visit: Visit) -> Self {
        Self {
            id: visit.id,
            apartment: visit.apartment_id,
            tenant: visit.tenant_id,
            date_time: visit.date_time,
            state: visit.state,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateVisitRequest {
    pub date_time: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VisitsQuery {
    #[serde(rename = "date_time__gte")]
    pub date_time_gte: Option<DateTime<Utc>>,
    #[serde(rename = "date_time__lte")]
    pub date_time_lte: Option<DateTime<Utc>>,
    pub apartment: Option<Uuid>,
    pub state: Option<VisitState>,
}
