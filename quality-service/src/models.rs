use crate::error::QualityError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Enum stored and transmitted by its Spanish label
macro_rules! labelled_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = QualityError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($label => Ok($name::$variant),)+
                    other => Err(QualityError::Validation(format!(
                        "Valor no válido para {}: '{}'",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }
    };
}

labelled_enum! {
    /// Document category, drives the code prefix
    pub enum DocumentCategory {
        Manual => "manual",
        ProcedimientoGeneral => "procedimiento_general",
        ProcedimientoOperativo => "procedimiento_operativo",
        Registro => "registro",
        Documento => "documento",
        DocumentoExterno => "documento_externo",
        Instructivo => "instructivo",
    }
}

impl DocumentCategory {
    pub fn prefix(&self) -> &'static str {
        match self {
            DocumentCategory::Manual => "MA",
            DocumentCategory::ProcedimientoGeneral => "PG",
            DocumentCategory::ProcedimientoOperativo => "PO",
            DocumentCategory::Registro => "RE",
            DocumentCategory::Documento => "DC",
            DocumentCategory::DocumentoExterno => "DE",
            DocumentCategory::Instructivo => "IN",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            DocumentCategory::Manual => "Manual",
            DocumentCategory::ProcedimientoGeneral => "Procedimiento General",
            DocumentCategory::ProcedimientoOperativo => "Procedimiento Operativo",
            DocumentCategory::Registro => "Registro",
            DocumentCategory::Documento => "Documento",
            DocumentCategory::DocumentoExterno => "Documento Externo",
            DocumentCategory::Instructivo => "Instructivo",
        }
    }
}

labelled_enum! {
    /// Status of a document version
    pub enum DocumentStatus {
        Vigente => "vigente",
        EnRevision => "en revision",
        EnAprobacion => "en aprobacion",
        NoAprobado => "no aprobado",
        Obsoleto => "obsoleto",
    }
}

impl Default for DocumentStatus {
    fn default() -> Self {
        DocumentStatus::EnRevision
    }
}

labelled_enum! {
    /// Measurement frequency of an indicator
    pub enum Frequency {
        Mensual => "Mensual",
        Trimestral => "Trimestral",
        Semestral => "Semestral",
        Anual => "Anual",
    }
}

impl Default for Frequency {
    fn default() -> Self {
        Frequency::Trimestral
    }
}

labelled_enum! {
    pub enum IndicatorStatus {
        Cumple => "cumple",
        NoCumple => "no cumple",
        EnProceso => "en proceso",
    }
}

labelled_enum! {
    pub enum Trend {
        Up => "up",
        Down => "down",
        Stable => "stable",
    }
}

labelled_enum! {
    pub enum ProcessType {
        Estrategico => "estratégico",
        Operativo => "operativo",
        Apoyo => "apoyo",
    }
}

labelled_enum! {
    pub enum AuditType {
        Interna => "interna",
        Externa => "externa",
        Revision => "revisión",
    }
}

labelled_enum! {
    /// Derived from progress, see [`AuditStatus::from_progress`]
    pub enum AuditStatus {
        Programada => "programada",
        EnCurso => "en curso",
        Completada => "completada",
    }
}

labelled_enum! {
    pub enum FindingType {
        Mayor => "mayor",
        Menor => "menor",
        Observacion => "observación",
    }
}

labelled_enum! {
    pub enum FindingStatus {
        Abierta => "abierta",
        Cerrada => "cerrada",
    }
}

labelled_enum! {
    pub enum UserRole {
        Editor => "editor",
        Lector => "lector",
    }
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// Document master row
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Document {
    pub id: i64,
    pub code: String,
    pub title: String,
    pub category: DocumentCategory,
    pub process: String,
    /// Original name of the most recently uploaded file
    pub file_name: String,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DocumentVersion {
    pub id: i64,
    pub document_id: i64,
    pub revision: i32,
    pub file_url: String,
    pub status: DocumentStatus,
    pub description: String,
    pub uploaded_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// A document joined with its current version
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DocumentRecord {
    pub doc_id: i64,
    pub version_id: Option<i64>,
    pub code: String,
    pub title: String,
    pub category: DocumentCategory,
    pub process: String,
    pub file_name: String,
    pub revision: Option<i32>,
    pub status: Option<DocumentStatus>,
    pub description: String,
    pub file_url: Option<String>,
    pub uploaded_by: Option<i64>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewDocument {
    pub code: String,
    pub title: String,
    pub category: DocumentCategory,
    pub process: String,
    pub file_name: String,
    pub created_by: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewDocumentVersion {
    pub revision: i32,
    pub file_url: String,
    pub status: DocumentStatus,
    pub description: String,
    pub uploaded_by: Option<i64>,
}

/// A new revision of an existing document; the store assigns its number
/// and publishes it `vigente`
#[derive(Debug, Clone)]
pub struct NewRevision {
    pub file_url: String,
    pub description: Option<String>,
    pub uploaded_by: Option<i64>,
}

/// Metadata of a new document; the file travels separately
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DocumentInput {
    pub category: DocumentCategory,
    /// Sequence number inside the category, padded to three digits
    pub number: String,
    pub title: String,
    #[serde(default)]
    pub process: String,
    pub revision: Option<i32>,
    pub status: Option<DocumentStatus>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DocumentUpdate {
    pub title: String,
    pub category: DocumentCategory,
    #[serde(default)]
    pub process: String,
    /// Applied to the current version only when it differs
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CategoryCount {
    pub category: DocumentCategory,
    pub prefix: String,
    pub name: String,
    pub count: usize,
}

// ---------------------------------------------------------------------------
// Indicators
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Indicator {
    pub id: i64,
    pub name: String,
    pub process_id: Option<i64>,
    pub process: String,
    pub objective: String,
    pub target_value: f64,
    pub current_value: f64,
    pub unit: String,
    /// Label of formula input A
    pub input_1: String,
    /// Label of formula input B
    pub input_2: String,
    pub formula: String,
    pub calculation_info: String,
    pub frequency: Frequency,
    pub responsible: String,
    pub status: IndicatorStatus,
    pub trend: Trend,
    pub last_period_value: Option<f64>,
    pub period_start_date: Option<NaiveDate>,
    pub last_update: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// Editable indicator fields, shared by create and update
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct IndicatorInput {
    pub name: String,
    pub process_id: Option<i64>,
    #[serde(default)]
    pub objective: String,
    #[serde(default)]
    pub target_value: Option<f64>,
    #[serde(default)]
    pub current_value: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub input_1: String,
    #[serde(default)]
    pub input_2: String,
    #[serde(default)]
    pub formula: String,
    #[serde(default)]
    pub calculation_info: String,
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default)]
    pub responsible: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IndicatorHistory {
    pub id: i64,
    pub indicator_id: i64,
    pub value_1: f64,
    pub value_2: f64,
    pub result: f64,
    pub period_date: NaiveDate,
    pub observations: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewIndicatorHistory {
    pub indicator_id: i64,
    pub value_1: f64,
    pub value_2: f64,
    pub result: f64,
    pub period_date: NaiveDate,
    pub observations: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MeasurementInput {
    pub value_1: f64,
    pub value_2: f64,
    /// `YYYY-MM`; empty means the current month
    #[serde(default)]
    pub period: String,
    #[serde(default)]
    pub observations: String,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct IndicatorSummary {
    pub total: usize,
    pub on_target: usize,
    pub off_target: usize,
    pub in_progress: usize,
}

// ---------------------------------------------------------------------------
// Processes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Process {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub process_type: ProcessType,
    pub responsibles: String,
    pub subprocesses: Vec<String>,
    pub owner_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProcessInput {
    pub code: String,
    pub name: String,
    pub process_type: ProcessType,
    #[serde(default)]
    pub responsibles: String,
    /// Comma separated subprocess names
    #[serde(default)]
    pub subprocesses: String,
}

#[derive(Debug, Clone)]
pub struct NewProcess {
    pub code: String,
    pub name: String,
    pub process_type: ProcessType,
    pub responsibles: String,
    pub subprocesses: Vec<String>,
    pub owner_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProcessGroup {
    pub process_type: ProcessType,
    pub processes: Vec<Process>,
}

// ---------------------------------------------------------------------------
// Audits
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Audit {
    pub id: i64,
    pub title: String,
    pub scheduled_date: Option<NaiveDate>,
    pub auditor: String,
    pub audit_type: AuditType,
    /// Names of the audited processes
    pub scope: Vec<String>,
    pub progress: i32,
    pub status: AuditStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditInput {
    pub title: String,
    pub scheduled_date: Option<NaiveDate>,
    #[serde(default)]
    pub auditor: String,
    pub audit_type: AuditType,
    #[serde(default)]
    pub scope: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct NewAudit {
    pub title: String,
    pub scheduled_date: Option<NaiveDate>,
    pub auditor: String,
    pub audit_type: AuditType,
    pub scope: Vec<String>,
    pub progress: i32,
    pub status: AuditStatus,
}

/// Audit with its linked process ids and findings
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuditDetail {
    #[serde(flatten)]
    pub audit: Audit,
    pub process_ids: Vec<i64>,
    pub findings: Vec<AuditFinding>,
    pub findings_summary: FindingSummary,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct AuditStats {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub scheduled: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditFinding {
    pub id: i64,
    pub audit_id: i64,
    pub finding_type: FindingType,
    pub description: String,
    pub process: String,
    pub status: FindingStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FindingInput {
    pub finding_type: FindingType,
    pub description: String,
    #[serde(default)]
    pub process: String,
}

#[derive(Debug, Clone)]
pub struct NewFinding {
    pub audit_id: i64,
    pub finding_type: FindingType,
    pub description: String,
    pub process: String,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct FindingSummary {
    pub major: usize,
    pub minor: usize,
    pub observations: usize,
    pub open: usize,
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: i64,
    pub auth_id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    pub last_access: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_editor(&self) -> bool {
        self.role == UserRole::Editor
    }
}

/// Login credential, never serialized to clients
#[derive(Debug, Clone)]
pub struct Credential {
    pub auth_id: Uuid,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct UserStats {
    pub total: usize,
    pub editors: usize,
    pub readers: usize,
}

// ---------------------------------------------------------------------------
// Uploads
// ---------------------------------------------------------------------------

/// File received from a client
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub data: Vec<u8>,
}
