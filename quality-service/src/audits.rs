use crate::error::{QualityError, QualityResult};
use crate::models::{
    Audit, AuditFinding, AuditStats, AuditStatus, FindingStatus, FindingSummary, FindingType,
    Process,
};
use chrono::NaiveDate;

impl AuditStatus {
    pub fn from_progress(progress: i32) -> Self {
        if progress == 100 {
            AuditStatus::Completada
        } else if progress > 0 {
            AuditStatus::EnCurso
        } else {
            AuditStatus::Programada
        }
    }
}

pub fn validate_progress(progress: i32) -> QualityResult<i32> {
    if (0..=100).contains(&progress) {
        Ok(progress)
    } else {
        Err(QualityError::validation("El progreso debe estar entre 0 y 100"))
    }
}

/// Ids of the known processes named in an audit scope
pub fn scoped_process_ids(scope: &[String], processes: &[Process]) -> Vec<i64> {
    processes
        .iter()
        .filter(|p| scope.iter().any(|name| name == &p.name))
        .map(|p| p.id)
        .collect()
}

pub fn audit_stats(audits: &[Audit]) -> AuditStats {
    let mut stats = AuditStats {
        total: audits.len(),
        ..Default::default()
    };
    for audit in audits {
        match audit.status {
            AuditStatus::Completada => stats.completed += 1,
            AuditStatus::EnCurso => stats.in_progress += 1,
            AuditStatus::Programada => stats.scheduled += 1,
        }
    }
    stats
}

pub fn finding_summary(findings: &[AuditFinding]) -> FindingSummary {
    let mut summary = FindingSummary::default();
    for finding in findings {
        match finding.finding_type {
            FindingType::Mayor => summary.major += 1,
            FindingType::Menor => summary.minor += 1,
            FindingType::Observacion => summary.observations += 1,
        }
        if finding.status == FindingStatus::Abierta {
            summary.open += 1;
        }
    }
    summary
}

/// Major or minor findings that are not closed yet
pub fn is_open_nonconformity(finding: &AuditFinding) -> bool {
    matches!(finding.finding_type, FindingType::Mayor | FindingType::Menor)
        && finding.status != FindingStatus::Cerrada
}

/// Audits scheduled today or later that are not completed, soonest first
pub fn upcoming(audits: &[Audit], today: NaiveDate, limit: usize) -> Vec<Audit> {
    let mut upcoming: Vec<Audit> = audits
        .iter()
        .filter(|a| a.status != AuditStatus::Completada)
        .filter(|a| a.scheduled_date.map_or(false, |d| d >= today))
        .cloned()
        .collect();
    upcoming.sort_by_key(|a| a.scheduled_date);
    upcoming.truncate(limit);
    upcoming
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuditType, ProcessType};
    use chrono::Utc;

    fn audit(id: i64, date: Option<NaiveDate>, progress: i32) -> Audit {
        Audit {
            id,
            title: format!("Auditoría {}", id),
            scheduled_date: date,
            auditor: "Ana".to_string(),
            audit_type: AuditType::Interna,
            scope: vec![],
            progress,
            status: AuditStatus::from_progress(progress),
            created_at: Utc::now(),
        }
    }

    fn finding(finding_type: FindingType, status: FindingStatus) -> AuditFinding {
        AuditFinding {
            id: 1,
            audit_id: 1,
            finding_type,
            description: "Registro incompleto".to_string(),
            process: String::new(),
            status,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_from_progress() {
        assert_eq!(AuditStatus::from_progress(0), AuditStatus::Programada);
        assert_eq!(AuditStatus::from_progress(1), AuditStatus::EnCurso);
        assert_eq!(AuditStatus::from_progress(99), AuditStatus::EnCurso);
        assert_eq!(AuditStatus::from_progress(100), AuditStatus::Completada);
    }

    #[test]
    fn test_validate_progress() {
        assert!(validate_progress(0).is_ok());
        assert!(validate_progress(100).is_ok());
        assert!(validate_progress(-1).is_err());
        assert!(validate_progress(101).is_err());
    }

    #[test]
    fn test_scoped_process_ids() {
        let process = |id: i64, name: &str| Process {
            id,
            code: format!("P-{}", id),
            name: name.to_string(),
            process_type: ProcessType::Operativo,
            responsibles: String::new(),
            subprocesses: vec![],
            owner_id: None,
            created_at: Utc::now(),
        };
        let processes = vec![process(1, "Compras"), process(2, "Ventas"), process(3, "RRHH")];
        let scope = vec!["Ventas".to_string(), "Compras".to_string(), "Logística".to_string()];

        assert_eq!(scoped_process_ids(&scope, &processes), vec![1, 2]);
    }

    #[test]
    fn test_stats_and_findings() {
        let audits = vec![audit(1, None, 0), audit(2, None, 50), audit(3, None, 100)];
        let stats = audit_stats(&audits);
        assert_eq!((stats.total, stats.completed, stats.in_progress, stats.scheduled), (3, 1, 1, 1));

        let findings = vec![
            finding(FindingType::Mayor, FindingStatus::Abierta),
            finding(FindingType::Menor, FindingStatus::Cerrada),
            finding(FindingType::Observacion, FindingStatus::Abierta),
        ];
        let summary = finding_summary(&findings);
        assert_eq!((summary.major, summary.minor, summary.observations, summary.open), (1, 1, 1, 2));
        assert_eq!(findings.iter().filter(|f| is_open_nonconformity(f)).count(), 1);
    }

    #[test]
    fn test_upcoming_audits() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let day = |d: u32| NaiveDate::from_ymd_opt(2024, 6, d);
        let audits = vec![
            audit(1, day(20), 0),
            audit(2, NaiveDate::from_ymd_opt(2024, 5, 1), 0),
            audit(3, day(1), 30),
            audit(4, day(10), 100),
            audit(5, day(5), 0),
            audit(6, day(25), 0),
            audit(7, None, 0),
        ];
        let ids: Vec<i64> = upcoming(&audits, today, 3).iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![3, 5, 1]);
    }
}
