//! Static reference tables the generators draw from.
//!
//! Description lookups return `Option` instead of failing: descriptions are
//! only ever written out next to their codes and never feed the outcome model.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A coded value with its human readable description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Code {
    pub code: &'static str,
    pub description: &'static str,
}

const fn code(code: &'static str, description: &'static str) -> Code {
    Code { code, description }
}

/// ICD-10 diagnosis codes.
pub static DIAGNOSES: &[Code] = &[
    code("E11.9", "Type 2 diabetes mellitus without complications"),
    code("I10", "Essential (primary) hypertension"),
    code("J45.909", "Unspecified asthma, uncomplicated"),
    code("M54.5", "Low back pain"),
    code("F41.9", "Anxiety disorder, unspecified"),
    code("F32.9", "Major depressive disorder, single episode, unspecified"),
    code("K21.9", "Gastro-esophageal reflux disease without esophagitis"),
    code("M17.9", "Osteoarthritis of knee, unspecified"),
    code("J40", "Bronchitis, not specified as acute or chronic"),
    code("N39.0", "Urinary tract infection, site not specified"),
    code("H40.9", "Unspecified glaucoma"),
    code("E78.5", "Hyperlipidemia, unspecified"),
    code("I25.10", "Atherosclerotic heart disease of native coronary artery without angina pectoris"),
    code("G47.00", "Insomnia, unspecified"),
    code("G43.909", "Migraine, unspecified, not intractable, without status migrainosus"),
    code("J02.9", "Acute pharyngitis, unspecified"),
    code("J01.90", "Acute sinusitis, unspecified"),
    code("M25.511", "Pain in right shoulder"),
    code("M25.512", "Pain in left shoulder"),
    code("M79.604", "Pain in right leg"),
    code("M79.605", "Pain in left leg"),
    code("M79.621", "Pain in right upper arm"),
    code("M79.622", "Pain in left upper arm"),
    code("R10.9", "Unspecified abdominal pain"),
    code("R07.9", "Chest pain, unspecified"),
    code("R51", "Headache"),
    code("Z00.00", "Encounter for general adult medical examination without abnormal findings"),
    code("Z00.129", "Encounter for routine child health examination without abnormal findings"),
    code("Z23", "Encounter for immunization"),
    code("Z12.11", "Encounter for screening for malignant neoplasm of colon"),
    code("Z12.31", "Encounter for screening mammogram for malignant neoplasm of breast"),
];

/// CPT procedure codes.
pub static PROCEDURES: &[Code] = &[
    code("99213", "Office/outpatient visit est (15 min)"),
    code("99214", "Office/outpatient visit est (25 min)"),
    code("99203", "Office/outpatient visit new (30 min)"),
    code("99204", "Office/outpatient visit new (45 min)"),
    code("80053", "Comprehensive metabolic panel"),
    code("85025", "Complete blood count (CBC)"),
    code("82607", "Vitamin B-12 blood test"),
    code("80061", "Lipid panel"),
    code("71045", "X-ray examination of chest, single view"),
    code("71046", "X-ray examination of chest, 2 views"),
    code("72100", "X-ray examination of lower spine, 2-3 views"),
    code("70450", "CT scan of head/brain without contrast"),
    code("93000", "Electrocardiogram, routine"),
    code("94640", "Inhalation treatment for airway obstruction"),
    code("97110", "Therapeutic exercises"),
    code("99385", "Preventive visit new, age 18-39"),
    code("99386", "Preventive visit new, age 40-64"),
    code("99395", "Preventive visit est, age 18-39"),
    code("99396", "Preventive visit est, age 40-64"),
    code("90471", "Immunization administration"),
    code("90686", "Influenza vaccine, quadrivalent (IIV4), 0.5 mL dosage"),
    code("90715", "Tdap vaccine, intramuscular"),
    code("99243", "Office consultation, 40 min"),
    code("99244", "Office consultation, 60 min"),
    code("96372", "Therapeutic, prophylactic, or diagnostic injection"),
    code("99283", "Emergency dept visit, moderate severity"),
    code("99284", "Emergency dept visit, high severity"),
    code("99285", "Emergency dept visit, high severity with threat"),
    code("29125", "Application of short arm splint"),
    code("29515", "Application of short leg splint"),
    code("45378", "Colonoscopy, diagnostic"),
    code("45380", "Colonoscopy with biopsy"),
    code("77067", "Screening mammography, bilateral"),
    code("77066", "Diagnostic mammography, bilateral"),
];

/// UB-04 revenue codes.
pub static REVENUE_CODES: &[Code] = &[
    code("0120", "Room & Board - Semi-Private"),
    code("0250", "Pharmacy - General"),
    code("0270", "Medical/Surgical Supplies"),
    code("0300", "Laboratory - General"),
    code("0320", "Radiology - Diagnostic"),
    code("0370", "Anesthesia"),
    code("0420", "Physical Therapy"),
    code("0450", "Emergency Room"),
    code("0510", "Clinic - General"),
    code("0636", "Drugs requiring detailed coding"),
    code("0260", "IV Therapy - General"),
    code("0410", "Respiratory Services - General"),
    code("0610", "Magnetic Resonance Technology - General"),
    code("0730", "EKG/ECG - General"),
    code("0921", "Peripheral Vascular Lab"),
];

/// CMS place-of-service codes.
pub static PLACES_OF_SERVICE: &[Code] = &[
    code("11", "Office"),
    code("21", "Inpatient Hospital"),
    code("22", "Outpatient Hospital"),
    code("23", "Emergency Room - Hospital"),
    code("24", "Ambulatory Surgical Center"),
    code("31", "Skilled Nursing Facility"),
    code("32", "Nursing Facility"),
    code("33", "Custodial Care Facility"),
    code("41", "Ambulance - Land"),
    code("50", "Federally Qualified Health Center"),
    code("65", "End-Stage Renal Disease Treatment Facility"),
    code("71", "State or Local Public Health Clinic"),
    code("72", "Rural Health Clinic"),
    code("20", "Urgent Care Facility"),
    code("12", "Home"),
    code("81", "Independent Laboratory"),
];

/// Places of service billed at hospital rates (inpatient, ER).
pub static HOSPITAL_PLACES_OF_SERVICE: &[&str] = &["21", "23"];

/// Procedures that payers deny noticeably more often.
pub static HIGH_DENIAL_PROCEDURES: &[&str] = &[
    "70450", "93000", "45378", "77067", "96372", "97110", "99284", "99244", "45380", "77066",
];

/// Root cause grouping of denial reason codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialCategory {
    Administrative,
    ExcludedService,
    NoPriorAuth,
    NotMedicallyNecessary,
    Other,
    Remaining,
}

impl DenialCategory {
    pub const ALL: [DenialCategory; 6] = [
        DenialCategory::Administrative,
        DenialCategory::ExcludedService,
        DenialCategory::NoPriorAuth,
        DenialCategory::NotMedicallyNecessary,
        DenialCategory::Other,
        DenialCategory::Remaining,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DenialCategory::Administrative => "administrative",
            DenialCategory::ExcludedService => "excluded_service",
            DenialCategory::NoPriorAuth => "no_prior_auth",
            DenialCategory::NotMedicallyNecessary => "not_medically_necessary",
            DenialCategory::Other => "other",
            DenialCategory::Remaining => "remaining",
        }
    }

    pub fn parse(name: &str) -> Option<DenialCategory> {
        DenialCategory::ALL.into_iter().find(|c| c.as_str() == name)
    }

    /// Reason codes belonging to this category, in catalog order.
    pub fn reasons(self) -> impl Iterator<Item = &'static DenialReason> {
        DENIAL_REASONS.iter().filter(move |r| r.category == self)
    }
}

impl fmt::Display for DenialCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct DenialReason {
    pub code: &'static str,
    pub description: &'static str,
    pub category: DenialCategory,
}

const fn reason(code: &'static str, category: DenialCategory, description: &'static str) -> DenialReason {
    DenialReason { code, description, category }
}

pub static DENIAL_REASONS: &[DenialReason] = &[
    reason("A1", DenialCategory::Administrative, "Missing or invalid subscriber/insured ID number"),
    reason("A2", DenialCategory::Administrative, "Claim lacks required information"),
    reason("A3", DenialCategory::Administrative, "Duplicate claim submission"),
    reason("A4", DenialCategory::Administrative, "Claim filed after filing deadline"),
    reason("A5", DenialCategory::Administrative, "Claim form incomplete or invalid"),
    reason("A6", DenialCategory::Administrative, "Missing or invalid provider information"),
    reason("A7", DenialCategory::Administrative, "Invalid place of service for procedure"),
    reason("A8", DenialCategory::Administrative, "Incorrect provider specialty for service"),
    reason("B1", DenialCategory::ExcludedService, "Service specifically excluded from coverage"),
    reason("B2", DenialCategory::ExcludedService, "Service not covered under patient's plan"),
    reason("B3", DenialCategory::ExcludedService, "Cosmetic procedure not covered"),
    reason("B4", DenialCategory::ExcludedService, "Routine service not covered"),
    reason("B5", DenialCategory::ExcludedService, "Non-emergency service performed out of network"),
    reason("B6", DenialCategory::ExcludedService, "Annual benefit maximum met"),
    reason("B7", DenialCategory::ExcludedService, "Service considered experimental/investigational"),
    reason("B8", DenialCategory::ExcludedService, "Frequency limitation exceeded"),
    reason("C1", DenialCategory::NoPriorAuth, "Prior authorization/precertification required but not obtained"),
    reason("C2", DenialCategory::NoPriorAuth, "Prior authorization number invalid"),
    reason("C3", DenialCategory::NoPriorAuth, "Service differs from authorized service"),
    reason("C4", DenialCategory::NoPriorAuth, "Authorization expired or date of service outside approval range"),
    reason("D1", DenialCategory::NotMedicallyNecessary, "Service not medically necessary based on diagnosis"),
    reason("D2", DenialCategory::NotMedicallyNecessary, "Upcoding detected - service level not supported by documentation"),
    reason("D3", DenialCategory::NotMedicallyNecessary, "Unbundling detected - services should be billed as single procedure"),
    reason("D4", DenialCategory::NotMedicallyNecessary, "Diagnosis does not support medical necessity for procedure"),
    reason("E1", DenialCategory::Other, "Patient not eligible on date of service"),
    reason("E2", DenialCategory::Other, "Coverage terminated prior to service date"),
    reason("E3", DenialCategory::Other, "Patient has primary insurance with another carrier"),
    reason("E4", DenialCategory::Other, "Preexisting condition limitations apply"),
    reason("E5", DenialCategory::Other, "Service processed under different procedure code"),
    reason("E6", DenialCategory::Other, "Claim pending for additional information"),
    reason("E7", DenialCategory::Other, "Modifier inappropriate or missing"),
    reason("E8", DenialCategory::Other, "Coordination of benefits information required"),
    reason("E9", DenialCategory::Other, "Provider not in-network for this service"),
    reason("E10", DenialCategory::Other, "Claim requires manual review"),
    reason("E11", DenialCategory::Other, "Invalid diagnosis code"),
    reason("E12", DenialCategory::Other, "Invalid procedure code"),
    reason("E13", DenialCategory::Other, "Patient responsibility (deductible/copay/coinsurance)"),
    reason("E14", DenialCategory::Other, "Billed amount exceeds fee schedule allowance"),
    reason("E15", DenialCategory::Other, "Charges included in global procedure payment"),
    reason("F1", DenialCategory::Remaining, "Service previously adjudicated"),
    reason("F2", DenialCategory::Remaining, "Refund or reversal of previous claim payment"),
    reason("F3", DenialCategory::Remaining, "Services properly billed to facility"),
    reason("F4", DenialCategory::Remaining, "Claim awaiting medical records review"),
    reason("F5", DenialCategory::Remaining, "Waiting for response to payer initiated correspondence"),
    reason("F6", DenialCategory::Remaining, "Coding inconsistent with national standards"),
    reason("F7", DenialCategory::Remaining, "Claim requires specialized handling"),
    reason("F8", DenialCategory::Remaining, "Non-covered provider specialty"),
];

#[derive(Debug, PartialEq)]
pub struct Specialty {
    pub name: &'static str,
    pub denial_multiplier: f64,
}

const fn specialty(name: &'static str, denial_multiplier: f64) -> Specialty {
    Specialty { name, denial_multiplier }
}

pub static SPECIALTIES: &[Specialty] = &[
    specialty("Family Medicine", 0.9),
    specialty("Internal Medicine", 1.0),
    specialty("Cardiology", 1.2),
    specialty("Dermatology", 1.1),
    specialty("Orthopedics", 1.3),
    specialty("Neurology", 1.2),
    specialty("Pediatrics", 0.8),
    specialty("Obstetrics", 1.2),
    specialty("Gynecology", 1.0),
    specialty("Psychiatry", 1.1),
    specialty("Oncology", 1.3),
    specialty("Radiology", 1.1),
    specialty("Urology", 1.0),
    specialty("Gastroenterology", 1.1),
    specialty("Endocrinology", 1.0),
    specialty("Nephrology", 1.2),
    specialty("Pulmonology", 1.1),
    specialty("Rheumatology", 1.2),
    specialty("Allergy & Immunology", 0.9),
    specialty("Emergency Medicine", 1.0),
    specialty("Physical Medicine & Rehabilitation", 1.3),
    specialty("Infectious Disease", 1.0),
    specialty("General Surgery", 1.2),
    specialty("Vascular Surgery", 1.3),
    specialty("Plastic Surgery", 1.4),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayerType {
    Commercial,
    Medicare,
    Medicaid,
    SelfPay,
    WorkersComp,
}

impl PayerType {
    pub fn as_str(self) -> &'static str {
        match self {
            PayerType::Commercial => "Commercial",
            PayerType::Medicare => "Medicare",
            PayerType::Medicaid => "Medicaid",
            PayerType::SelfPay => "Self-Pay",
            PayerType::WorkersComp => "Workers Comp",
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct PayerProfile {
    pub name: &'static str,
    pub payer_type: PayerType,
    pub denial_multiplier: f64,
}

const fn profile(name: &'static str, payer_type: PayerType, denial_multiplier: f64) -> PayerProfile {
    PayerProfile { name, payer_type, denial_multiplier }
}

pub static PAYER_PROFILES: &[PayerProfile] = &[
    profile("Blue Cross Blue Shield", PayerType::Commercial, 1.0),
    profile("UnitedHealthcare", PayerType::Commercial, 1.2),
    profile("Aetna", PayerType::Commercial, 1.1),
    profile("Cigna", PayerType::Commercial, 1.3),
    profile("Humana", PayerType::Commercial, 1.0),
    profile("Kaiser Permanente", PayerType::Commercial, 0.9),
    profile("Medicare", PayerType::Medicare, 0.8),
    profile("Medicare Advantage", PayerType::Medicare, 1.1),
    profile("Medicaid", PayerType::Medicaid, 1.2),
    profile("Centene", PayerType::Commercial, 1.1),
    profile("Molina Healthcare", PayerType::Commercial, 1.2),
    profile("Anthem", PayerType::Commercial, 1.0),
    profile("Health Net", PayerType::Commercial, 1.1),
    profile("CareFirst", PayerType::Commercial, 0.9),
    profile("Wellcare", PayerType::Commercial, 1.0),
    profile("Tricare", PayerType::Commercial, 0.9),
    profile("Optum", PayerType::Commercial, 1.1),
    profile("CVS Caremark", PayerType::Commercial, 1.0),
    profile("Self-Pay", PayerType::SelfPay, 0.7),
    profile("Workers Compensation", PayerType::WorkersComp, 1.2),
];

pub static CREDENTIALS: &[&str] = &["MD", "DO", "NP", "PA"];

/// Number of facilities in the `ANEC Medical Center N` pool.
pub const FACILITY_COUNT: u32 = 25;

pub static TIMELY_FILING_LIMITS_DAYS: &[u32] = &[30, 60, 90, 120, 180, 365];

pub static APPEAL_WINDOWS_DAYS: &[u16] = &[30, 45, 60, 90];

pub static MALE_FIRST_NAMES: &[&str] = &[
    "James", "Robert", "John", "Michael", "David", "William", "Richard", "Joseph", "Thomas",
    "Christopher", "Charles", "Daniel", "Matthew", "Anthony", "Mark", "Donald", "Steven", "Andrew",
    "Paul", "Joshua", "Kenneth", "Kevin", "Brian", "George", "Timothy", "Ronald", "Jason", "Edward",
    "Jeffrey", "Ryan", "Jacob", "Gary", "Nicholas", "Eric", "Jonathan", "Stephen", "Larry", "Justin",
];

pub static FEMALE_FIRST_NAMES: &[&str] = &[
    "Mary", "Patricia", "Jennifer", "Linda", "Elizabeth", "Barbara", "Susan", "Jessica", "Sarah",
    "Karen", "Lisa", "Nancy", "Betty", "Sandra", "Margaret", "Ashley", "Kimberly", "Emily", "Donna",
    "Michelle", "Carol", "Amanda", "Melissa", "Deborah", "Stephanie", "Dorothy", "Rebecca", "Sharon",
    "Laura", "Cynthia", "Amy", "Kathleen", "Angela", "Shirley", "Brenda", "Emma", "Anna", "Pamela",
];

fn describe(table: &[Code], code: &str) -> Option<&'static str> {
    table.iter().find(|c| c.code == code).map(|c| c.description)
}

pub fn diagnosis_description(code: &str) -> Option<&'static str> {
    describe(DIAGNOSES, code)
}

pub fn procedure_description(code: &str) -> Option<&'static str> {
    describe(PROCEDURES, code)
}

pub fn revenue_description(code: &str) -> Option<&'static str> {
    describe(REVENUE_CODES, code)
}

pub fn place_of_service_description(code: &str) -> Option<&'static str> {
    describe(PLACES_OF_SERVICE, code)
}

pub fn denial_reason(code: &str) -> Option<&'static DenialReason> {
    DENIAL_REASONS.iter().find(|r| r.code == code)
}

pub fn is_high_denial_procedure(code: &str) -> bool {
    HIGH_DENIAL_PROCEDURES.contains(&code)
}

pub fn is_hospital_place_of_service(code: &str) -> bool {
    HOSPITAL_PLACES_OF_SERVICE.contains(&code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_codes_are_unique() {
        for table in [DIAGNOSES, PROCEDURES, REVENUE_CODES, PLACES_OF_SERVICE] {
            let codes: HashSet<_> = table.iter().map(|c| c.code).collect();
            assert_eq!(codes.len(), table.len());
        }
        let reasons: HashSet<_> = DENIAL_REASONS.iter().map(|r| r.code).collect();
        assert_eq!(reasons.len(), DENIAL_REASONS.len());
    }

    #[test]
    fn test_every_category_has_reasons() {
        for category in DenialCategory::ALL {
            assert!(category.reasons().count() > 0, "{category} has no reason codes");
        }
        assert_eq!(DenialCategory::NoPriorAuth.reasons().count(), 4);
        assert_eq!(DenialCategory::Other.reasons().count(), 15);
    }

    #[test]
    fn test_high_denial_procedures_are_in_catalog() {
        for code in HIGH_DENIAL_PROCEDURES {
            assert!(procedure_description(code).is_some(), "{code} missing from procedures");
        }
        for code in HOSPITAL_PLACES_OF_SERVICE {
            assert!(place_of_service_description(code).is_some());
        }
    }

    #[test]
    fn test_lookup_miss_is_none() {
        assert_eq!(diagnosis_description("ZZZ"), None);
        assert_eq!(denial_reason("H1"), None);
        assert_eq!(revenue_description("0450"), Some("Emergency Room"));
        assert_eq!(denial_reason("C1").map(|r| r.category), Some(DenialCategory::NoPriorAuth));
    }

    #[test]
    fn test_category_names_round_trip() {
        for category in DenialCategory::ALL {
            assert_eq!(DenialCategory::parse(category.as_str()), Some(category));
        }
        assert_eq!(DenialCategory::parse("bogus"), None);
    }
}
