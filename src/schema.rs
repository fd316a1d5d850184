use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::catalog::{DenialReason, PayerType, Specialty};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(self) -> &'static str {
        match self {
            Sex::Male => "M",
            Sex::Female => "F",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStatus {
    InNetwork,
    OutOfNetwork,
}

impl NetworkStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            NetworkStatus::InNetwork => "In-Network",
            NetworkStatus::OutOfNetwork => "Out-of-Network",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Patient {
    pub patient_id: String,
    pub first_name: String,
    pub last_name: String,
    pub dob: NaiveDate,
    pub gender: Sex,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub phone: String,
    pub email: String,
    pub insurance_id: String,
    pub membership_id: String,
    pub chronic_conditions: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Provider {
    pub provider_id: String,
    pub provider_name: String,
    pub npi: String,
    pub specialty: &'static Specialty,
    pub facility_name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub phone: String,
    pub network_status: NetworkStatus,
    pub years_experience: u16,
    pub credentials: &'static str,
    pub average_patients_per_day: u16,
}

impl Provider {
    pub fn specialty_multiplier(&self) -> f64 {
        self.specialty.denial_multiplier
    }

    pub fn is_out_of_network(&self) -> bool {
        self.network_status == NetworkStatus::OutOfNetwork
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Payer {
    pub payer_id: String,
    pub payer_name: &'static str,
    pub payer_type: PayerType,
    pub denial_multiplier: f64,
    pub average_processing_days: u16,
    pub electronic_claim_submission: bool,
    pub prior_auth_procedures: BTreeSet<&'static str>,
    pub base_denial_rate: f64,
    pub average_reimbursement_rate: f64,
    pub timely_filing_limit_days: u16,
    pub appeal_timeframe_days: u16,
    pub contact_phone: String,
    pub website: String,
}

impl Payer {
    pub fn requires_prior_auth(&self, procedure_code: &str) -> bool {
        self.prior_auth_procedures.contains(procedure_code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimStatus {
    Approved,
    Denied,
}

/// Claim frequency type code: original, adjustment of, replacement of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimFrequency {
    Original = 1,
    Adjustment = 2,
    Replacement = 3,
}

/// Result of adjudicating a claim. Approved claims carry a payment, denied
/// claims a reason; never both.
#[derive(Debug, Clone, PartialEq)]
pub enum Adjudication {
    Approved {
        payment_amount: f64,
        days_to_payment: i64,
    },
    Denied {
        reason: &'static DenialReason,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Claim {
    pub claim_id: String,
    pub patient_id: String,
    pub provider_id: String,
    pub payer_id: String,
    pub service_date: NaiveDate,
    pub submission_date: NaiveDate,
    pub processing_date: NaiveDate,
    pub primary_diagnosis_code: &'static str,
    pub secondary_diagnosis_code: Option<&'static str>,
    pub procedure_code: &'static str,
    pub revenue_code: Option<&'static str>,
    pub place_of_service_code: &'static str,
    pub prior_auth_required: bool,
    pub prior_auth_obtained: bool,
    pub charge_amount: f64,
    pub adjudication: Adjudication,
    pub patient_responsibility: f64,
    pub claim_frequency: ClaimFrequency,
}

impl Claim {
    pub fn status(&self) -> ClaimStatus {
        match self.adjudication {
            Adjudication::Approved { .. } => ClaimStatus::Approved,
            Adjudication::Denied { .. } => ClaimStatus::Denied,
        }
    }

    pub fn is_denied(&self) -> bool {
        self.status() == ClaimStatus::Denied
    }

    pub fn payment_amount(&self) -> Option<f64> {
        match self.adjudication {
            Adjudication::Approved { payment_amount, .. } => Some(payment_amount),
            Adjudication::Denied { .. } => None,
        }
    }

    pub fn days_to_payment(&self) -> Option<i64> {
        match self.adjudication {
            Adjudication::Approved { days_to_payment, .. } => Some(days_to_payment),
            Adjudication::Denied { .. } => None,
        }
    }

    pub fn denial_reason(&self) -> Option<&'static DenialReason> {
        match self.adjudication {
            Adjudication::Approved { .. } => None,
            Adjudication::Denied { reason } => Some(reason),
        }
    }
}

pub fn patient_id(index: u64) -> String {
    format!("P{:08}", index + 1)
}

pub fn provider_id(index: u64) -> String {
    format!("DR{:07}", index + 1)
}

pub fn payer_id(index: u64) -> String {
    format!("INS{:03}", index + 1)
}

pub fn claim_id(index: u64) -> String {
    format!("CLM{:010}", index + 1)
}

/// Mock claim for testing
#[cfg(test)]
pub fn mock_claim() -> Claim {
    Claim {
        claim_id: claim_id(0),
        patient_id: patient_id(0),
        provider_id: provider_id(0),
        payer_id: payer_id(0),
        service_date: NaiveDate::from_ymd_opt(2023, 3, 1).unwrap(),
        submission_date: NaiveDate::from_ymd_opt(2023, 3, 4).unwrap(),
        processing_date: NaiveDate::from_ymd_opt(2023, 3, 20).unwrap(),
        primary_diagnosis_code: "I10",
        secondary_diagnosis_code: None,
        procedure_code: "99213",
        revenue_code: Some("0510"),
        place_of_service_code: "11",
        prior_auth_required: false,
        prior_auth_obtained: false,
        charge_amount: 150.0,
        adjudication: Adjudication::Approved {
            payment_amount: 120.0,
            days_to_payment: 16,
        },
        patient_responsibility: 30.0,
        claim_frequency: ClaimFrequency::Original,
    }
}
