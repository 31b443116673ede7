//! Raw table rows and their conversion into domain models
//!
//! Enum columns are stored as their Spanish labels and parsed back here.

use super::parse_label;
use chrono::{DateTime, NaiveDate, Utc};
use quality_service::*;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, FromRow)]
pub struct DocumentRow {
    pub id: i64,
    pub code: String,
    pub title: String,
    pub category: String,
    pub process: String,
    pub file_name: String,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DocumentRow> for Document {
    type Error = QualityError;

    fn try_from(row: DocumentRow) -> QualityResult<Self> {
        Ok(Document {
            id: row.id,
            code: row.code,
            title: row.title,
            category: parse_label(&row.category)?,
            process: row.process,
            file_name: row.file_name,
            created_by: row.created_by,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct VersionRow {
    pub id: i64,
    pub document_id: i64,
    pub revision: i32,
    pub file_url: String,
    pub status: String,
    pub description: String,
    pub uploaded_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<VersionRow> for DocumentVersion {
    type Error = QualityError;

    fn try_from(row: VersionRow) -> QualityResult<Self> {
        Ok(DocumentVersion {
            id: row.id,
            document_id: row.document_id,
            revision: row.revision,
            file_url: row.file_url,
            status: parse_label(&row.status)?,
            description: row.description,
            uploaded_by: row.uploaded_by,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct IndicatorRow {
    pub id: i64,
    pub name: String,
    pub process_id: Option<i64>,
    pub process: String,
    pub objective: String,
    pub target_value: f64,
    pub current_value: f64,
    pub unit: String,
    pub input_1: String,
    pub input_2: String,
    pub formula: String,
    pub calculation_info: String,
    pub frequency: String,
    pub responsible: String,
    pub status: String,
    pub trend: String,
    pub last_period_value: Option<f64>,
    pub period_start_date: Option<NaiveDate>,
    pub last_update: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<IndicatorRow> for Indicator {
    type Error = QualityError;

    fn try_from(row: IndicatorRow) -> QualityResult<Self> {
        Ok(Indicator {
            id: row.id,
            name: row.name,
            process_id: row.process_id,
            process: row.process,
            objective: row.objective,
            target_value: row.target_value,
            current_value: row.current_value,
            unit: row.unit,
            input_1: row.input_1,
            input_2: row.input_2,
            formula: row.formula,
            calculation_info: row.calculation_info,
            frequency: parse_label(&row.frequency)?,
            responsible: row.responsible,
            status: parse_label(&row.status)?,
            trend: parse_label(&row.trend)?,
            last_period_value: row.last_period_value,
            period_start_date: row.period_start_date,
            last_update: row.last_update,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct HistoryRow {
    pub id: i64,
    pub indicator_id: i64,
    pub value_1: f64,
    pub value_2: f64,
    pub result: f64,
    pub period_date: NaiveDate,
    pub observations: String,
    pub created_at: DateTime<Utc>,
}

impl From<HistoryRow> for IndicatorHistory {
    fn from(row: HistoryRow) -> Self {
        IndicatorHistory {
            id: row.id,
            indicator_id: row.indicator_id,
            value_1: row.value_1,
            value_2: row.value_2,
            result: row.result,
            period_date: row.period_date,
            observations: row.observations,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct ProcessRow {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub process_type: String,
    pub responsibles: String,
    pub subprocesses: Vec<String>,
    pub owner_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ProcessRow> for Process {
    type Error = QualityError;

    fn try_from(row: ProcessRow) -> QualityResult<Self> {
        Ok(Process {
            id: row.id,
            code: row.code,
            name: row.name,
            process_type: parse_label(&row.process_type)?,
            responsibles: row.responsibles,
            subprocesses: row.subprocesses,
            owner_id: row.owner_id,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct AuditRow {
    pub id: i64,
    pub title: String,
    pub scheduled_date: Option<NaiveDate>,
    pub auditor: String,
    pub audit_type: String,
    pub scope: Vec<String>,
    pub progress: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<AuditRow> for Audit {
    type Error = QualityError;

    fn try_from(row: AuditRow) -> QualityResult<Self> {
        Ok(Audit {
            id: row.id,
            title: row.title,
            scheduled_date: row.scheduled_date,
            auditor: row.auditor,
            audit_type: parse_label(&row.audit_type)?,
            scope: row.scope,
            progress: row.progress,
            status: parse_label(&row.status)?,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct FindingRow {
    pub id: i64,
    pub audit_id: i64,
    pub finding_type: String,
    pub description: String,
    pub process: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<FindingRow> for AuditFinding {
    type Error = QualityError;

    fn try_from(row: FindingRow) -> QualityResult<Self> {
        Ok(AuditFinding {
            id: row.id,
            audit_id: row.audit_id,
            finding_type: parse_label(&row.finding_type)?,
            description: row.description,
            process: row.process,
            status: parse_label(&row.status)?,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub auth_id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub role: String,
    pub last_access: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = QualityError;

    fn try_from(row: UserRow) -> QualityResult<Self> {
        Ok(User {
            id: row.id,
            auth_id: row.auth_id,
            email: row.email,
            full_name: row.full_name.unwrap_or_default(),
            role: parse_label(&row.role)?,
            last_access: row.last_access,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct CredentialRow {
    pub auth_id: Uuid,
    pub email: String,
    pub password_hash: String,
}

impl From<CredentialRow> for Credential {
    fn from(row: CredentialRow) -> Self {
        Credential {
            auth_id: row.auth_id,
            email: row.email,
            password_hash: row.password_hash,
        }
    }
}

/// Convert a batch of rows, failing on the first bad value
pub fn convert_all<R, T>(rows: Vec<R>) -> QualityResult<Vec<T>>
where
    T: TryFrom<R, Error = QualityError>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_label_in_row_is_a_database_error() {
        let row = FindingRow {
            id: 1,
            audit_id: 1,
            finding_type: "crítica".to_string(),
            description: "x".to_string(),
            process: String::new(),
            status: "abierta".to_string(),
            created_at: Utc::now(),
        };
        assert!(matches!(AuditFinding::try_from(row), Err(QualityError::Database(_))));
    }

    #[test]
    fn test_user_row_without_name() {
        let row = UserRow {
            id: 3,
            auth_id: Uuid::new_v4(),
            email: "ana@empresa.com".to_string(),
            full_name: None,
            role: "lector".to_string(),
            last_access: None,
            created_at: Utc::now(),
        };
        let user = User::try_from(row).unwrap();
        assert_eq!(user.full_name, "");
        assert_eq!(user.role, UserRole::Lector);
    }
}
