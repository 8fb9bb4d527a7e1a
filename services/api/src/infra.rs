use chrono::{Duration, NaiveDate};
use fire_inspection::workflows::inspection::{
    ChecklistItem, ChecklistItemId, Establishment, EstablishmentId, EvidenceUpload,
    InspectionFrequency, MemoryInspectionStore, RepositoryError, RiskLevel,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

/// Standard checklist used when the service starts without an external catalog.
const STANDARD_CHECKLIST: &[(&str, &str, &str, &str)] = &[
    (
        "FE-01",
        "Portable extinguishers present, charged, and tagged",
        "fire_extinguishers",
        "RA 9514 Sec. 10.2.6.8",
    ),
    (
        "FE-02",
        "Extinguishers mounted and unobstructed",
        "fire_extinguishers",
        "RA 9514 Sec. 10.2.6.8",
    ),
    (
        "EX-01",
        "Exit doors unlocked and swing in the direction of travel",
        "means_of_egress",
        "RA 9514 Sec. 10.2.5.2",
    ),
    (
        "EX-02",
        "Exit signs illuminated",
        "means_of_egress",
        "RA 9514 Sec. 10.2.5.12",
    ),
    (
        "EL-01",
        "Emergency lighting operational",
        "emergency_lighting",
        "RA 9514 Sec. 10.2.5.13",
    ),
    (
        "AL-01",
        "Fire alarm system tested within the last year",
        "fire_alarm",
        "RA 9514 Sec. 10.2.6.4",
    ),
    (
        "EW-01",
        "No exposed or overloaded electrical wiring",
        "electrical",
        "RA 9514 Sec. 10.2.20",
    ),
    (
        "HK-01",
        "Combustibles stored away from ignition sources",
        "housekeeping",
        "RA 9514 Sec. 10.2.9",
    ),
];

/// Sample establishments and the standard checklist, scheduled relative to `today`.
pub(crate) fn seed_store(
    store: &MemoryInspectionStore,
    today: NaiveDate,
) -> Result<(), RepositoryError> {
    for (index, (code, description, category, standard)) in STANDARD_CHECKLIST.iter().enumerate() {
        store.put_checklist_item(ChecklistItem {
            id: ChecklistItemId(index as u64 + 1),
            code: (*code).to_string(),
            description: (*description).to_string(),
            category: (*category).to_string(),
            compliance_standard: Some((*standard).to_string()),
            active: true,
        })?;
    }

    let establishments = [
        (
            "Panaderia de San Jose",
            "food_service",
            "San Jose",
            InspectionFrequency::Annual,
            Some(today - Duration::days(12)),
            Some(RiskLevel::Medium),
        ),
        (
            "Northside Cold Storage",
            "warehouse",
            "Poblacion",
            InspectionFrequency::Quarterly,
            Some(today + Duration::days(4)),
            Some(RiskLevel::High),
        ),
        (
            "Bayview Learning Center",
            "educational",
            "Bayview",
            InspectionFrequency::SemiAnnual,
            Some(today + Duration::days(60)),
            Some(RiskLevel::Low),
        ),
        (
            "Lakeside Hardware",
            "mercantile",
            "Poblacion",
            InspectionFrequency::Monthly,
            None,
            None,
        ),
    ];

    for (index, (name, category, barangay, frequency, next, risk)) in
        establishments.into_iter().enumerate()
    {
        let id = index as u64 + 1;
        store.put_establishment(Establishment {
            id: EstablishmentId(id),
            name: name.to_string(),
            category: category.to_string(),
            address: format!("{} National Highway", id * 100),
            barangay: barangay.to_string(),
            owner_name: format!("{name} Holdings"),
            owner_contact: None,
            inspection_frequency: frequency,
            last_inspection_date: None,
            next_scheduled_inspection: next,
            compliance_rating: None,
            overall_risk_level: risk,
            active: true,
        })?;
    }
    Ok(())
}

/// Read a photo or document from disk, guessing its content type from the extension.
pub(crate) fn evidence_from_path(path: &Path) -> std::io::Result<EvidenceUpload> {
    let bytes = std::fs::read(path)?;
    let content_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(EvidenceUpload {
        file_name,
        content_type,
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fire_inspection::workflows::inspection::InspectionRepository;

    #[test]
    fn seeded_store_has_checklist_and_schedule() {
        let today = parse_date("2024-05-10").expect("valid date");
        let store = MemoryInspectionStore::new();
        seed_store(&store, today).expect("seed succeeds");

        let items = store.checklist_items().expect("items readable");
        assert_eq!(items.len(), STANDARD_CHECKLIST.len());
        let establishments = store.establishments().expect("establishments readable");
        assert_eq!(establishments.len(), 4);
        assert!(establishments
            .iter()
            .any(|establishment| establishment.next_scheduled_inspection.is_none()));
    }

    #[test]
    fn evidence_type_follows_extension() {
        let path = std::env::temp_dir().join("fire-inspection-evidence-test.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).expect("temp file written");

        let upload = evidence_from_path(&path).expect("file readable");
        assert_eq!(upload.content_type, "image/png");
        assert_eq!(upload.file_name, "fire-inspection-evidence-test.png");
        assert_eq!(upload.bytes.len(), 4);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn parse_date_reports_bad_input() {
        let err = parse_date("tomorrow").expect_err("not a date");
        assert!(err.contains("tomorrow"));
    }
}
