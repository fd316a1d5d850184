use chrono::NaiveDate;
use rand::Rng;

use crate::catalog::DenialReason;
use crate::random::round_cents;
use crate::schema::{Adjudication, Claim};

const MIN_REIMBURSEMENT_RATE: f64 = 0.50;
const MAX_REIMBURSEMENT_RATE: f64 = 0.95;

/// How a claim's charge is split between payer and patient.
#[derive(Debug, Clone, PartialEq)]
pub struct Remittance {
    pub adjudication: Adjudication,
    pub patient_responsibility: f64,
}

impl Remittance {
    /// Approved claims are paid a random share of the charge and the patient
    /// owes the rest; denied claims leave the full charge with the patient.
    pub fn settle<R: Rng + ?Sized>(
        charge_amount: f64,
        denial: Option<&'static DenialReason>,
        submission_date: NaiveDate,
        processing_date: NaiveDate,
        rng: &mut R,
    ) -> Remittance {
        match denial {
            Some(reason) => Remittance {
                adjudication: Adjudication::Denied { reason },
                patient_responsibility: charge_amount,
            },
            None => {
                let rate = rng.random_range(MIN_REIMBURSEMENT_RATE..MAX_REIMBURSEMENT_RATE);
                let payment_amount = round_cents(charge_amount * rate);
                Remittance {
                    adjudication: Adjudication::Approved {
                        payment_amount,
                        days_to_payment: (processing_date - submission_date).num_days(),
                    },
                    patient_responsibility: round_cents(charge_amount - payment_amount),
                }
            }
        }
    }
}

/// Validates that payment and patient responsibility add up to the charge.
pub fn validate_against_claim(claim: &Claim) -> Result<(), String> {
    if claim.charge_amount <= 0.0 {
        return Err(format!(
            "Claim {}: charge amount {:.2} is not positive",
            claim.claim_id, claim.charge_amount
        ));
    }

    match claim.adjudication {
        Adjudication::Approved { payment_amount, .. } => {
            if payment_amount > claim.charge_amount {
                return Err(format!(
                    "Claim {}: payment {:.2} exceeds charge {:.2}",
                    claim.claim_id, payment_amount, claim.charge_amount
                ));
            }
            let sum = payment_amount + claim.patient_responsibility;
            // Allow for rounding to cents
            if (sum - claim.charge_amount).abs() > 1e-2 {
                return Err(format!(
                    "Claim {}: payment plus responsibility {:.2} does not match charge {:.2}",
                    claim.claim_id, sum, claim.charge_amount
                ));
            }
        }
        Adjudication::Denied { .. } => {
            if (claim.patient_responsibility - claim.charge_amount).abs() > 1e-9 {
                return Err(format!(
                    "Claim {}: denied claim leaves {:.2} with patient, expected full charge {:.2}",
                    claim.claim_id, claim.patient_responsibility, claim.charge_amount
                ));
            }
        }
    }
    Ok(())
}
