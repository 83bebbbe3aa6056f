//! Static metadata for the Part C / Part D star measures.
//!
//! Used to fill in polarity, format, weight, and domain for measure sources that
//! only supply codes and values.

use crate::domain::{FormatType, Part};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasureSpec {
    pub code: &'static str,
    pub name: &'static str,
    pub format_type: FormatType,
    pub is_inverse: bool,
    pub domain: &'static str,
    pub part: Part,
    /// `0.0` marks a measure whose weight is carried by its Part C twin.
    pub weight: f64,
}

const fn spec(
    code: &'static str,
    name: &'static str,
    format_type: FormatType,
    is_inverse: bool,
    domain: &'static str,
    part: Part,
    weight: f64,
) -> MeasureSpec {
    MeasureSpec {
        code,
        name,
        format_type,
        is_inverse,
        domain,
        part,
        weight,
    }
}

use FormatType::{Decimal as DEC, Integer as INT, NoNumeric as NONE, Percentage as PCT};
use Part::{C, D};

pub static MEASURES: [MeasureSpec; 45] = [
    spec("C01", "Breast Cancer Screening", PCT, false, "HD1", C, 1.0),
    spec("C02", "Colorectal Cancer Screening", PCT, false, "HD1", C, 1.0),
    spec("C03", "Annual Flu Vaccine", PCT, false, "HD1", C, 1.0),
    spec("C04", "Improving or Maintaining Physical Health", PCT, false, "HD1", C, 1.0),
    spec("C05", "Improving or Maintaining Mental Health", PCT, false, "HD1", C, 1.0),
    spec("C06", "Monitoring Physical Activity", PCT, false, "HD1", C, 1.0),
    spec("C07", "Special Needs Plan (SNP) Care Management", PCT, false, "HD2", C, 1.0),
    spec("C08", "Care for Older Adults – Medication Review", PCT, false, "HD2", C, 1.0),
    spec("C09", "Care for Older Adults – Pain Assessment", PCT, false, "HD2", C, 1.0),
    spec("C10", "Osteoporosis Management in Women who had a Fracture", PCT, false, "HD2", C, 1.0),
    spec("C11", "Diabetes Care – Eye Exam", PCT, false, "HD2", C, 1.0),
    spec("C12", "Diabetes Care – Blood Sugar Controlled", PCT, false, "HD2", C, 3.0),
    spec("C13", "Kidney Health Evaluation for Patients with Diabetes", PCT, false, "HD2", C, 1.0),
    spec("C14", "Controlling High Blood Pressure", PCT, false, "HD2", C, 3.0),
    spec("C15", "Reducing the Risk of Falling", PCT, false, "HD2", C, 1.0),
    spec("C16", "Improving Bladder Control", PCT, false, "HD2", C, 1.0),
    spec("C17", "Medication Reconciliation Post-Discharge", PCT, false, "HD2", C, 1.0),
    spec("C18", "Plan All-Cause Readmissions", PCT, true, "HD2", C, 3.0),
    spec("C19", "Statin Therapy for Patients with Cardiovascular Disease", PCT, false, "HD2", C, 1.0),
    spec("C20", "Transitions of Care", PCT, false, "HD2", C, 1.0),
    spec(
        "C21",
        "Follow-up after Emergency Department Visit for People with Multiple High-Risk Chronic Conditions",
        PCT,
        false,
        "HD2",
        C,
        1.0,
    ),
    spec("C22", "Getting Needed Care", INT, false, "HD3", C, 2.0),
    spec("C23", "Getting Appointments and Care Quickly", INT, false, "HD3", C, 2.0),
    spec("C24", "Customer Service", INT, false, "HD3", C, 2.0),
    spec("C25", "Rating of Health Care Quality", INT, false, "HD3", C, 2.0),
    spec("C26", "Rating of Health Plan", INT, false, "HD3", C, 2.0),
    spec("C27", "Care Coordination", INT, false, "HD3", C, 2.0),
    spec("C28", "Complaints about the Health Plan", DEC, true, "HD4", C, 2.0),
    spec("C29", "Members Choosing to Leave the Plan", PCT, true, "HD4", C, 2.0),
    spec("C30", "Health Plan Quality Improvement", NONE, false, "HD4", C, 5.0),
    spec("C31", "Plan Makes Timely Decisions about Appeals", PCT, false, "HD5", C, 2.0),
    spec("C32", "Reviewing Appeals Decisions", PCT, false, "HD5", C, 2.0),
    spec("C33", "Call Center – Foreign Language Interpreter and TTY Availability", PCT, false, "HD5", C, 2.0),
    spec("D01", "Call Center – Foreign Language Interpreter and TTY Availability", PCT, false, "DD1", D, 2.0),
    spec("D02", "Complaints about the Drug Plan", DEC, true, "DD2", D, 0.0),
    spec("D03", "Members Choosing to Leave the Plan", PCT, true, "DD2", D, 0.0),
    spec("D04", "Drug Plan Quality Improvement", NONE, false, "DD2", D, 5.0),
    spec("D05", "Rating of Drug Plan", INT, false, "DD3", D, 2.0),
    spec("D06", "Getting Needed Prescription Drugs", INT, false, "DD3", D, 2.0),
    spec("D07", "MPF Price Accuracy", INT, false, "DD4", D, 1.0),
    spec("D08", "Medication Adherence for Diabetes Medications", PCT, false, "DD4", D, 3.0),
    spec("D09", "Medication Adherence for Hypertension (RAS antagonists)", PCT, false, "DD4", D, 3.0),
    spec("D10", "Medication Adherence for Cholesterol (Statins)", PCT, false, "DD4", D, 3.0),
    spec("D11", "MTM Program Completion Rate for CMR", PCT, false, "DD4", D, 1.0),
    spec("D12", "Statin Use in Persons with Diabetes (SUPD)", PCT, false, "DD4", D, 1.0),
];

/// Domain codes in report order.
pub const DOMAIN_ORDER: [&str; 9] = ["HD1", "HD2", "HD3", "HD4", "HD5", "DD1", "DD2", "DD3", "DD4"];

pub fn lookup(code: &str) -> Option<&'static MeasureSpec> {
    let code = code.trim();
    MEASURES.iter().find(|m| m.code.eq_ignore_ascii_case(code))
}

pub fn domain_name(domain: &str) -> Option<&'static str> {
    match domain {
        "HD1" => Some("Staying Healthy: Screenings, Tests and Vaccines"),
        "HD2" => Some("Managing Chronic (Long Term) Conditions"),
        "HD3" => Some("Member Experience with Health Plan"),
        "HD4" => Some("Member Complaints and Changes in Health Plan Performance"),
        "HD5" => Some("Health Plan Customer Service"),
        "DD1" => Some("Drug Plan Customer Service"),
        "DD2" => Some("Member Complaints and Changes in Drug Plan Performance"),
        "DD3" => Some("Member Experience with the Drug Plan"),
        "DD4" => Some("Drug Safety and Accuracy of Drug Pricing"),
        _ => None,
    }
}

/// Part of a measure code: from the catalog, else from its `C`/`D` prefix.
pub fn part_of(code: &str) -> Option<Part> {
    if let Some(spec) = lookup(code) {
        return Some(spec.part);
    }
    match code.trim().chars().next().map(|c| c.to_ascii_uppercase()) {
        Some('C') => Some(Part::C),
        Some('D') => Some(Part::D),
        _ => None,
    }
}
