use crate::error::{QualityError, QualityResult};
use crate::models::{
    CategoryCount, Document, DocumentCategory, DocumentRecord, DocumentStatus, DocumentVersion,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

/// `{prefix}-{number}` with the number left-padded to three digits
pub fn generate_code(category: DocumentCategory, number: &str) -> QualityResult<String> {
    let number = number.trim();
    if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
        return Err(QualityError::validation(
            "El número de documento debe contener solo dígitos",
        ));
    }
    Ok(format!("{}-{:0>3}", category.prefix(), number))
}

impl DocumentStatus {
    /// Approval workflow; `obsoleto` is terminal
    pub fn can_transition_to(&self, next: DocumentStatus) -> bool {
        use DocumentStatus::*;
        matches!(
            (self, next),
            (EnRevision, EnAprobacion)
                | (EnAprobacion, Vigente)
                | (EnAprobacion, NoAprobado)
                | (NoAprobado, EnRevision)
                | (Vigente, Obsoleto)
        )
    }
}

/// The version a document currently shows: newest non-obsolete, else newest
pub fn current_version<'a>(versions: &'a [DocumentVersion]) -> Option<&'a DocumentVersion> {
    let newest = |a: &&DocumentVersion, b: &&DocumentVersion| {
        (a.revision, a.created_at, a.id).cmp(&(b.revision, b.created_at, b.id))
    };
    versions
        .iter()
        .filter(|v| v.status != DocumentStatus::Obsoleto)
        .max_by(newest)
        .or_else(|| versions.iter().max_by(newest))
}

pub fn build_record(document: &Document, versions: &[DocumentVersion]) -> DocumentRecord {
    let current = current_version(versions);
    DocumentRecord {
        doc_id: document.id,
        version_id: current.map(|v| v.id),
        code: document.code.clone(),
        title: document.title.clone(),
        category: document.category,
        process: document.process.clone(),
        file_name: document.file_name.clone(),
        revision: current.map(|v| v.revision),
        status: current.map(|v| v.status),
        description: current.map(|v| v.description.clone()).unwrap_or_default(),
        file_url: current.map(|v| v.file_url.clone()),
        uploaded_by: current.and_then(|v| v.uploaded_by),
        updated_at: current.map(|v| v.created_at).unwrap_or(document.created_at),
    }
}

/// Join every document with its versions, newest update first
pub fn build_records(documents: &[Document], versions: &[DocumentVersion]) -> Vec<DocumentRecord> {
    let mut records: Vec<DocumentRecord> = documents
        .iter()
        .map(|doc| {
            let own: Vec<DocumentVersion> = versions
                .iter()
                .filter(|v| v.document_id == doc.id)
                .cloned()
                .collect();
            build_record(doc, &own)
        })
        .collect();
    records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    records
}

/// List filters for `/documents`
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct DocumentFilter {
    pub category: Option<DocumentCategory>,
    pub status: Option<DocumentStatus>,
    /// Case-insensitive match on title or code
    pub search: Option<String>,
}

impl DocumentFilter {
    pub fn matches(&self, record: &DocumentRecord) -> bool {
        if let Some(category) = self.category {
            if record.category != category {
                return false;
            }
        }
        if let Some(status) = self.status {
            if record.status != Some(status) {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                let term = term.to_lowercase();
                record.title.to_lowercase().contains(&term)
                    || record.code.to_lowercase().contains(&term)
            }
            _ => true,
        }
    }
}

pub fn category_counts(documents: &[Document]) -> Vec<CategoryCount> {
    DocumentCategory::ALL
        .iter()
        .map(|category| CategoryCount {
            category: *category,
            prefix: category.prefix().to_string(),
            name: category.display_name().to_string(),
            count: documents.iter().filter(|d| d.category == *category).count(),
        })
        .collect()
}

pub fn default_version_description(revision: i32) -> String {
    format!("Actualización a Rev {}", revision)
}

/// Highest revision number a document can reach
pub const MAX_REVISION: i32 = 9999;

pub fn validate_revision(revision: i32) -> QualityResult<()> {
    if revision < 0 {
        return Err(QualityError::validation("La revisión no puede ser negativa"));
    }
    if revision > MAX_REVISION {
        return Err(QualityError::validation(format!(
            "La revisión no puede superar {}",
            MAX_REVISION
        )));
    }
    Ok(())
}

/// Revision that follows the highest stored one, `0` when there is none
pub fn next_revision(latest: Option<i32>) -> QualityResult<i32> {
    match latest {
        None => Ok(0),
        Some(revision) if revision >= MAX_REVISION => Err(QualityError::validation(format!(
            "El documento alcanzó la revisión máxima ({})",
            MAX_REVISION
        ))),
        Some(revision) => Ok(revision + 1),
    }
}

/// Blank descriptions fall back to the default for `revision`
pub fn version_description(description: Option<String>, revision: i32) -> String {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| default_version_description(revision))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn version(id: i64, revision: i32, status: DocumentStatus) -> DocumentVersion {
        DocumentVersion {
            id,
            document_id: 1,
            revision,
            file_url: format!("http://localhost/files/documents/{}.pdf", id),
            status,
            description: format!("rev {}", revision),
            uploaded_by: Some(1),
            created_at: Utc::now() + Duration::seconds(id),
        }
    }

    fn document(id: i64, code: &str, title: &str, category: DocumentCategory) -> Document {
        Document {
            id,
            code: code.to_string(),
            title: title.to_string(),
            category,
            process: "Gestión de Calidad".to_string(),
            file_name: "archivo.pdf".to_string(),
            created_by: Some(1),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_revision_bounds() {
        assert!(validate_revision(0).is_ok());
        assert!(validate_revision(MAX_REVISION).is_ok());
        assert!(validate_revision(-1).is_err());
        assert!(validate_revision(i32::MAX).is_err());

        assert_eq!(next_revision(None).unwrap(), 0);
        assert_eq!(next_revision(Some(0)).unwrap(), 1);
        assert_eq!(next_revision(Some(MAX_REVISION - 1)).unwrap(), MAX_REVISION);
        assert!(matches!(next_revision(Some(MAX_REVISION)), Err(QualityError::Validation(_))));
        assert!(matches!(next_revision(Some(i32::MAX)), Err(QualityError::Validation(_))));
    }

    #[test]
    fn test_version_description_defaults_when_blank() {
        assert_eq!(version_description(None, 2), "Actualización a Rev 2");
        assert_eq!(version_description(Some("   ".to_string()), 3), "Actualización a Rev 3");
        assert_eq!(version_description(Some(" Cambio de alcance ".to_string()), 3), "Cambio de alcance");
    }

    #[test]
    fn test_generate_code() {
        assert_eq!(generate_code(DocumentCategory::ProcedimientoGeneral, "7").unwrap(), "PG-007");
        assert_eq!(generate_code(DocumentCategory::Manual, "123").unwrap(), "MA-123");
        assert_eq!(generate_code(DocumentCategory::Instructivo, "1234").unwrap(), "IN-1234");
        assert!(generate_code(DocumentCategory::Registro, "").is_err());
        assert!(generate_code(DocumentCategory::Registro, "1a").is_err());
    }

    #[test]
    fn test_status_workflow() {
        use DocumentStatus::*;
        assert!(EnRevision.can_transition_to(EnAprobacion));
        assert!(EnAprobacion.can_transition_to(Vigente));
        assert!(EnAprobacion.can_transition_to(NoAprobado));
        assert!(NoAprobado.can_transition_to(EnRevision));
        assert!(!EnRevision.can_transition_to(Vigente));
        for next in DocumentStatus::ALL {
            assert!(!Obsoleto.can_transition_to(*next));
        }
    }

    #[test]
    fn test_current_version_skips_obsolete() {
        let versions = vec![
            version(1, 0, DocumentStatus::Obsoleto),
            version(2, 1, DocumentStatus::Vigente),
            version(3, 2, DocumentStatus::Obsoleto),
        ];
        assert_eq!(current_version(&versions).unwrap().id, 2);

        let all_obsolete = vec![
            version(1, 0, DocumentStatus::Obsoleto),
            version(3, 2, DocumentStatus::Obsoleto),
        ];
        assert_eq!(current_version(&all_obsolete).unwrap().id, 3);
        assert!(current_version(&[]).is_none());
    }

    #[test]
    fn test_filter_matches_search_case_insensitively() {
        let doc = document(1, "PG-001", "Control de Documentos", DocumentCategory::ProcedimientoGeneral);
        let record = build_record(&doc, &[version(1, 0, DocumentStatus::Vigente)]);

        let by_title = DocumentFilter {
            search: Some("control".to_string()),
            ..Default::default()
        };
        let by_code = DocumentFilter {
            search: Some("pg-0".to_string()),
            ..Default::default()
        };
        let wrong_status = DocumentFilter {
            status: Some(DocumentStatus::Obsoleto),
            ..Default::default()
        };
        let wrong_category = DocumentFilter {
            category: Some(DocumentCategory::Manual),
            ..Default::default()
        };

        assert!(by_title.matches(&record));
        assert!(by_code.matches(&record));
        assert!(!wrong_status.matches(&record));
        assert!(!wrong_category.matches(&record));
    }

    #[test]
    fn test_category_counts_cover_every_category() {
        let docs = vec![
            document(1, "MA-001", "Manual", DocumentCategory::Manual),
            document(2, "RE-001", "Registro", DocumentCategory::Registro),
            document(3, "RE-002", "Registro 2", DocumentCategory::Registro),
        ];
        let counts = category_counts(&docs);
        assert_eq!(counts.len(), 7);
        let registro = counts
            .iter()
            .find(|c| c.category == DocumentCategory::Registro)
            .unwrap();
        assert_eq!(registro.count, 2);
        assert_eq!(registro.prefix, "RE");
    }

    #[test]
    fn test_default_version_description() {
        assert_eq!(default_version_description(3), "Actualización a Rev 3");
    }
}
