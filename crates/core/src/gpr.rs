//! Work-schedule (GPR) progress arithmetic, the work-type catalogue and
//! weekly report aggregation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// One entry of the fixed work-type catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkType {
    /// Code stored in `gpr_records.work_type`.
    pub code: &'static str,
    /// Name of the material consumed by this work, as seeded in `materials`.
    pub material_name: &'static str,
    /// Material units consumed per unit of work volume.
    pub quantity_per_unit: i32,
}

/// Known work types, in report order.
pub const WORK_TYPES: [WorkType; 8] = [
    WorkType { code: "kraska_b", material_name: "Краска б", quantity_per_unit: 1 },
    WorkType { code: "kraska_ch", material_name: "Краска ч", quantity_per_unit: 1 },
    WorkType { code: "vremyanka", material_name: "Времянка", quantity_per_unit: 1 },
    WorkType { code: "kraska_j", material_name: "Краска ж", quantity_per_unit: 1 },
    WorkType { code: "hp", material_name: "ХП", quantity_per_unit: 1 },
    WorkType { code: "hpj", material_name: "ХПж", quantity_per_unit: 1 },
    WorkType { code: "tp", material_name: "ТП", quantity_per_unit: 1 },
    WorkType { code: "demarkirovka", material_name: "Демаркировка", quantity_per_unit: 1 },
];

/// Look up a work type by its code.
pub fn find_work_type(code: &str) -> Option<&'static WorkType> {
    WORK_TYPES.iter().find(|w| w.code == code)
}

impl WorkType {
    /// Whole material units needed for `volume` units of work, rounded up.
    pub fn material_units(&self, volume: f64) -> i32 {
        if volume <= 0.0 {
            return 0;
        }
        (volume * f64::from(self.quantity_per_unit)).ceil() as i32
    }
}

/// Section identifier used for material requests raised by a GPR record.
pub fn section_id(record_id: i64) -> String {
    format!("gpr_{record_id}")
}

/// Remaining volume: `plan - fact`.
pub fn remainder(plan: f64, fact: f64) -> f64 {
    plan - fact
}

/// Completion percentage rounded to two decimals; zero when nothing is planned.
pub fn progress_percent(plan: f64, fact: f64) -> f64 {
    if plan <= 0.0 {
        return 0.0;
    }
    round2(fact / plan * 100.0)
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Reject negative volumes.
pub fn validate_volumes(plan: f64, fact: f64) -> Result<(), CoreError> {
    if plan < 0.0 || fact < 0.0 || !plan.is_finite() || !fact.is_finite() {
        return Err(CoreError::Validation(
            "Planned and actual volumes must be non-negative numbers".into(),
        ));
    }
    Ok(())
}

/// Parse a `YYYY-MM-DD` week start date.
pub fn parse_week_start(raw: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        CoreError::Validation(format!("Invalid date '{raw}'. Use the YYYY-MM-DD format"))
    })
}

/// One row of a weekly report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyReportLine {
    pub material: String,
    pub plan: f64,
    pub fact: f64,
}

/// Sum planned and actual volumes per catalogue work type.
///
/// `records` yields `(work_type, plan, fact)`; unknown work types are skipped
/// and every catalogue entry appears in the output, zero when unused.
pub fn aggregate_weekly<'a, I>(records: I) -> Vec<WeeklyReportLine>
where
    I: IntoIterator<Item = (&'a str, f64, f64)>,
{
    let mut lines: Vec<WeeklyReportLine> = WORK_TYPES
        .iter()
        .map(|w| WeeklyReportLine {
            material: w.code.to_string(),
            plan: 0.0,
            fact: 0.0,
        })
        .collect();
    for (work_type, plan, fact) in records {
        if let Some(line) = lines.iter_mut().find(|l| l.material == work_type) {
            line.plan += plan;
            line.fact += fact;
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn progress_is_rounded_and_safe_on_zero_plan() {
        assert_eq!(progress_percent(3.0, 1.0), 33.33);
        assert_eq!(progress_percent(200.0, 50.0), 25.0);
        assert_eq!(progress_percent(0.0, 5.0), 0.0);
        assert_eq!(remainder(10.0, 4.5), 5.5);
    }

    #[test]
    fn catalogue_lookup() {
        let hp = find_work_type("hp").unwrap();
        assert_eq!(hp.material_name, "ХП");
        assert!(find_work_type("plaster").is_none());
        assert_eq!(WORK_TYPES.len(), 8);
    }

    #[test]
    fn material_units_round_up() {
        let w = find_work_type("tp").unwrap();
        assert_eq!(w.material_units(2.1), 3);
        assert_eq!(w.material_units(4.0), 4);
        assert_eq!(w.material_units(0.0), 0);
    }

    #[test]
    fn week_start_parsing() {
        assert_eq!(
            parse_week_start("2024-03-04").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
        );
        assert_matches!(parse_week_start("04.03.2024"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn weekly_aggregation_covers_catalogue() {
        let lines = aggregate_weekly([
            ("hp", 10.0, 4.0),
            ("hp", 5.0, 1.0),
            ("tp", 2.0, 2.0),
            ("unknown", 100.0, 100.0),
        ]);
        assert_eq!(lines.len(), 8);
        let hp = lines.iter().find(|l| l.material == "hp").unwrap();
        assert_eq!((hp.plan, hp.fact), (15.0, 5.0));
        let kb = lines.iter().find(|l| l.material == "kraska_b").unwrap();
        assert_eq!((kb.plan, kb.fact), (0.0, 0.0));
    }

    #[test]
    fn negative_volumes_rejected() {
        assert!(validate_volumes(1.0, 0.0).is_ok());
        assert_matches!(validate_volumes(-1.0, 0.0), Err(CoreError::Validation(_)));
    }
}
