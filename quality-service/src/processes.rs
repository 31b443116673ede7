use crate::models::{Process, ProcessGroup, ProcessType};

/// Split a comma separated subprocess list, dropping empty names
pub fn parse_subprocesses(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect()
}

/// Processes grouped by type, strategic first
pub fn process_map(processes: &[Process]) -> Vec<ProcessGroup> {
    ProcessType::ALL
        .iter()
        .map(|process_type| ProcessGroup {
            process_type: *process_type,
            processes: processes
                .iter()
                .filter(|p| p.process_type == *process_type)
                .cloned()
                .collect(),
        })
        .collect()
}

/// Badge variant for a compliance percentage
pub fn compliance_band(compliance: f64) -> &'static str {
    if compliance >= 90.0 {
        "success"
    } else if compliance >= 75.0 {
        "warning"
    } else {
        "destructive"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_parse_subprocesses() {
        assert_eq!(
            parse_subprocesses(" Compras, ,Recepción ,, Almacén"),
            vec!["Compras", "Recepción", "Almacén"]
        );
        assert!(parse_subprocesses("  ").is_empty());
    }

    #[test]
    fn test_compliance_band() {
        assert_eq!(compliance_band(95.0), "success");
        assert_eq!(compliance_band(90.0), "success");
        assert_eq!(compliance_band(75.0), "warning");
        assert_eq!(compliance_band(74.9), "destructive");
    }

    #[test]
    fn test_process_map_groups_by_type() {
        let process = |id: i64, process_type: ProcessType| Process {
            id,
            code: format!("PR-{}", id),
            name: format!("Proceso {}", id),
            process_type,
            responsibles: String::new(),
            subprocesses: vec![],
            owner_id: None,
            created_at: Utc::now(),
        };
        let map = process_map(&[
            process(1, ProcessType::Apoyo),
            process(2, ProcessType::Estrategico),
            process(3, ProcessType::Apoyo),
        ]);

        assert_eq!(map.len(), 3);
        assert_eq!(map[0].process_type, ProcessType::Estrategico);
        assert_eq!(map[0].processes.len(), 1);
        assert!(map[1].processes.is_empty());
        assert_eq!(map[2].processes.len(), 2);
    }
}
