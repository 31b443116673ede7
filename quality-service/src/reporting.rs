//! Dashboard aggregation and PDF indicator report

use crate::audits::{is_open_nonconformity, upcoming};
use crate::documents::build_records;
use crate::error::{QualityError, QualityResult};
use crate::indicators::{month_start, progress};
use crate::models::*;
use crate::processes::compliance_band;
use chrono::NaiveDate;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document as PdfDocument, Object, Stream, StringFormat};
use serde::Serialize;
use utoipa::ToSchema;

pub const RECENT_DOCUMENTS: usize = 5;
pub const UPCOMING_AUDITS: usize = 3;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IndicatorProgress {
    pub id: i64,
    pub name: String,
    pub current_value: f64,
    pub target_value: f64,
    pub unit: String,
    pub progress: f64,
    /// `success`, `warning` or `destructive`
    pub band: String,
    pub status: IndicatorStatus,
    pub trend: Trend,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Dashboard {
    pub active_documents: usize,
    pub versions_this_month: usize,
    pub indicators_total: usize,
    pub indicators_on_target: usize,
    pub audits_completed: usize,
    pub audits_total: usize,
    pub open_nonconformities: usize,
    pub open_major: usize,
    pub open_minor: usize,
    pub recent_documents: Vec<DocumentRecord>,
    pub indicator_progress: Vec<IndicatorProgress>,
    pub upcoming_audits: Vec<Audit>,
}

/// Raw rows the dashboard is computed from
pub struct DashboardInput<'a> {
    pub documents: &'a [Document],
    pub versions: &'a [DocumentVersion],
    pub indicators: &'a [Indicator],
    pub audits: &'a [Audit],
    pub findings: &'a [AuditFinding],
}

pub fn build_dashboard(input: DashboardInput<'_>, today: NaiveDate) -> Dashboard {
    let records = build_records(input.documents, input.versions);
    let month = month_start(today);

    let open: Vec<&AuditFinding> = input
        .findings
        .iter()
        .filter(|f| is_open_nonconformity(f))
        .collect();

    Dashboard {
        active_documents: records
            .iter()
            .filter(|r| r.status == Some(DocumentStatus::Vigente))
            .count(),
        versions_this_month: input
            .versions
            .iter()
            .filter(|v| v.created_at.date_naive() >= month)
            .count(),
        indicators_total: input.indicators.len(),
        indicators_on_target: input
            .indicators
            .iter()
            .filter(|i| i.status == IndicatorStatus::Cumple)
            .count(),
        audits_completed: input
            .audits
            .iter()
            .filter(|a| a.status == AuditStatus::Completada)
            .count(),
        audits_total: input.audits.len(),
        open_nonconformities: open.len(),
        open_major: open.iter().filter(|f| f.finding_type == FindingType::Mayor).count(),
        open_minor: open.iter().filter(|f| f.finding_type == FindingType::Menor).count(),
        recent_documents: records.into_iter().take(RECENT_DOCUMENTS).collect(),
        indicator_progress: input.indicators.iter().map(indicator_progress).collect(),
        upcoming_audits: upcoming(input.audits, today, UPCOMING_AUDITS),
    }
}

pub fn indicator_progress(indicator: &Indicator) -> IndicatorProgress {
    let completion = progress(indicator.current_value, indicator.target_value, &indicator.unit);
    IndicatorProgress {
        id: indicator.id,
        name: indicator.name.clone(),
        current_value: indicator.current_value,
        target_value: indicator.target_value,
        unit: indicator.unit.clone(),
        progress: completion,
        band: compliance_band(completion).to_string(),
        status: indicator.status,
        trend: indicator.trend,
    }
}

// ---------------------------------------------------------------------------
// PDF
// ---------------------------------------------------------------------------

const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 40;
const ROW_HEIGHT: i64 = 18;
const TABLE_TOP: i64 = 750;
const FONT_SIZE: i64 = 9;

/// (header, x offset, max characters)
const COLUMNS: [(&str, i64, usize); 7] = [
    ("Indicador", 0, 30),
    ("Proceso", 160, 18),
    ("Meta", 260, 8),
    ("Actual", 310, 8),
    ("Unidad", 360, 8),
    ("Estado", 410, 12),
    ("Tendencia", 475, 10),
];

fn rows_per_page() -> usize {
    ((TABLE_TOP - ROW_HEIGHT - MARGIN) / ROW_HEIGHT) as usize
}

/// PDF text strings are WinAnsi; unmapped characters become `?`
fn win_ansi(text: &str) -> Object {
    let bytes = text
        .chars()
        .map(|c| match c {
            '€' => 0x80,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            c if (c as u32) <= 0xFF => c as u32 as u8,
            _ => b'?',
        })
        .collect();
    Object::String(bytes, StringFormat::Literal)
}

fn fit(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}

fn text(ops: &mut Vec<Operation>, font: &str, size: i64, x: i64, y: i64, value: &str) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("Tf", vec![font.into(), size.into()]));
    ops.push(Operation::new("Td", vec![x.into(), y.into()]));
    ops.push(Operation::new("Tj", vec![win_ansi(value)]));
    ops.push(Operation::new("ET", vec![]));
}

fn rule(ops: &mut Vec<Operation>, y: i64) {
    ops.push(Operation::new("w", vec![Object::Real(0.5)]));
    ops.push(Operation::new("m", vec![MARGIN.into(), y.into()]));
    ops.push(Operation::new("l", vec![(PAGE_WIDTH - MARGIN).into(), y.into()]));
    ops.push(Operation::new("S", vec![]));
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

fn trend_label(trend: Trend) -> &'static str {
    match trend {
        Trend::Up => "Sube",
        Trend::Down => "Baja",
        Trend::Stable => "Estable",
    }
}

fn page_operations(
    rows: &[Indicator],
    generated_on: NaiveDate,
    page: usize,
    pages: usize,
) -> Vec<Operation> {
    let mut ops = Vec::new();

    text(&mut ops, "F2", 16, MARGIN, PAGE_HEIGHT - 50, "Reporte de Indicadores de Calidad");
    text(
        &mut ops,
        "F1",
        10,
        MARGIN,
        PAGE_HEIGHT - 68,
        &format!(
            "Generado el {} - Página {} de {}",
            generated_on.format("%d/%m/%Y"),
            page,
            pages
        ),
    );

    for (header, offset, _) in COLUMNS {
        text(&mut ops, "F2", FONT_SIZE, MARGIN + offset, TABLE_TOP, header);
    }
    rule(&mut ops, TABLE_TOP - 5);

    let mut y = TABLE_TOP - ROW_HEIGHT;
    for indicator in rows {
        let cells = [
            indicator.name.clone(),
            indicator.process.clone(),
            format_number(indicator.target_value),
            format_number(indicator.current_value),
            indicator.unit.clone(),
            indicator.status.as_str().to_string(),
            trend_label(indicator.trend).to_string(),
        ];
        for ((_, offset, max), cell) in COLUMNS.iter().zip(cells.iter()) {
            text(&mut ops, "F1", FONT_SIZE, MARGIN + offset, y, &fit(cell, *max));
        }
        y -= ROW_HEIGHT;
    }

    ops
}

/// A4 report with one table row per indicator, paginated
pub fn indicator_report_pdf(indicators: &[Indicator], generated_on: NaiveDate) -> QualityResult<Vec<u8>> {
    let mut doc = PdfDocument::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular_id,
            "F2" => bold_id,
        },
    });

    let chunks: Vec<&[Indicator]> = if indicators.is_empty() {
        vec![indicators]
    } else {
        indicators.chunks(rows_per_page()).collect()
    };
    let total = chunks.len();

    let mut kids: Vec<Object> = Vec::with_capacity(total);
    for (index, rows) in chunks.into_iter().enumerate() {
        let content = Content {
            operations: page_operations(rows, generated_on, index + 1, total),
        };
        let encoded = content
            .encode()
            .map_err(|e| QualityError::Report(format!("Failed to encode page content: {}", e)))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => total as i64,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| QualityError::Report(format!("Failed to write PDF: {}", e)))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn indicator(id: i64, status: IndicatorStatus) -> Indicator {
        Indicator {
            id,
            name: format!("Indicador de satisfacción {}", id),
            process_id: None,
            process: "Atención al cliente".to_string(),
            objective: String::new(),
            target_value: 90.0,
            current_value: 45.0,
            unit: "%".to_string(),
            input_1: String::new(),
            input_2: String::new(),
            formula: String::new(),
            calculation_info: String::new(),
            frequency: Frequency::Mensual,
            responsible: String::new(),
            status,
            trend: Trend::Up,
            last_period_value: None,
            period_start_date: None,
            last_update: None,
            created_at: Utc::now(),
        }
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    #[test]
    fn test_report_is_valid_pdf() {
        let indicators = vec![indicator(1, IndicatorStatus::Cumple), indicator(2, IndicatorStatus::NoCumple)];
        let bytes = indicator_report_pdf(&indicators, today()).unwrap();

        assert!(bytes.starts_with(b"%PDF-1.5"));
        let parsed = PdfDocument::load_mem(&bytes).unwrap();
        assert_eq!(parsed.get_pages().len(), 1);
    }

    #[test]
    fn test_report_paginates() {
        let indicators: Vec<Indicator> = (0..(rows_per_page() as i64 * 2 + 1))
            .map(|id| indicator(id, IndicatorStatus::EnProceso))
            .collect();
        let bytes = indicator_report_pdf(&indicators, today()).unwrap();
        let parsed = PdfDocument::load_mem(&bytes).unwrap();
        assert_eq!(parsed.get_pages().len(), 3);
    }

    #[test]
    fn test_empty_report_has_one_page() {
        let bytes = indicator_report_pdf(&[], today()).unwrap();
        let parsed = PdfDocument::load_mem(&bytes).unwrap();
        assert_eq!(parsed.get_pages().len(), 1);
    }

    #[test]
    fn test_win_ansi_encoding() {
        match win_ansi("Auditoría ñ ✓") {
            Object::String(bytes, _) => {
                assert_eq!(bytes[7], 0xED);
                assert_eq!(bytes[10], 0xF1);
                assert_eq!(*bytes.last().unwrap(), b'?');
            }
            other => panic!("unexpected object {:?}", other),
        }
    }

    #[test]
    fn test_fit_truncates_by_characters() {
        assert_eq!(fit("Gestión", 10), "Gestión");
        assert_eq!(fit("Planificación estratégica", 6), "Plani…");
    }

    #[test]
    fn test_dashboard_counts() {
        let now = Utc::now();
        let documents: Vec<Document> = (1..=7)
            .map(|id| Document {
                id,
                code: format!("PG-{:03}", id),
                title: format!("Procedimiento {}", id),
                category: DocumentCategory::ProcedimientoGeneral,
                process: String::new(),
                file_name: "p.pdf".to_string(),
                created_by: None,
                created_at: now - Duration::days(400),
            })
            .collect();
        let versions: Vec<DocumentVersion> = documents
            .iter()
            .map(|d| DocumentVersion {
                id: 100 + d.id,
                document_id: d.id,
                revision: 0,
                file_url: String::new(),
                status: if d.id % 2 == 0 { DocumentStatus::Vigente } else { DocumentStatus::EnRevision },
                description: String::new(),
                uploaded_by: None,
                created_at: if d.id == 1 { now } else { now - Duration::days(400) },
            })
            .collect();
        let indicators = vec![indicator(1, IndicatorStatus::Cumple), indicator(2, IndicatorStatus::NoCumple)];
        let audit = |id: i64, progress: i32, days_ahead: i64| Audit {
            id,
            title: format!("Auditoría {}", id),
            scheduled_date: Some(today() + Duration::days(days_ahead)),
            auditor: String::new(),
            audit_type: AuditType::Interna,
            scope: vec![],
            progress,
            status: AuditStatus::from_progress(progress),
            created_at: now,
        };
        let audits = vec![audit(1, 100, 1), audit(2, 0, 5), audit(3, 20, 2), audit(4, 0, -3)];
        let finding = |id: i64, finding_type: FindingType, status: FindingStatus| AuditFinding {
            id,
            audit_id: 1,
            finding_type,
            description: String::new(),
            process: String::new(),
            status,
            created_at: now,
        };
        let findings = vec![
            finding(1, FindingType::Mayor, FindingStatus::Abierta),
            finding(2, FindingType::Menor, FindingStatus::Abierta),
            finding(3, FindingType::Menor, FindingStatus::Cerrada),
            finding(4, FindingType::Observacion, FindingStatus::Abierta),
        ];

        let dashboard = build_dashboard(
            DashboardInput {
                documents: &documents,
                versions: &versions,
                indicators: &indicators,
                audits: &audits,
                findings: &findings,
            },
            today(),
        );

        assert_eq!(dashboard.active_documents, 3);
        assert_eq!(dashboard.versions_this_month, 1);
        assert_eq!(dashboard.indicators_total, 2);
        assert_eq!(dashboard.indicators_on_target, 1);
        assert_eq!((dashboard.audits_completed, dashboard.audits_total), (1, 4));
        assert_eq!(dashboard.open_nonconformities, 2);
        assert_eq!((dashboard.open_major, dashboard.open_minor), (1, 1));
        assert_eq!(dashboard.recent_documents.len(), RECENT_DOCUMENTS);
        assert_eq!(dashboard.recent_documents[0].doc_id, 1);
        assert_eq!(dashboard.indicator_progress[0].progress, 50.0);
        let upcoming: Vec<i64> = dashboard.upcoming_audits.iter().map(|a| a.id).collect();
        assert_eq!(upcoming, vec![3, 2]);
    }
}
