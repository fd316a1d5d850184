use fake::Fake;
use fake::faker::phone_number::en::PhoneNumber;
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::catalog::{APPEAL_WINDOWS_DAYS, PAYER_PROFILES, PROCEDURES, TIMELY_FILING_LIMITS_DAYS};
use crate::config::Config;
use crate::random::{pick, round_cents};
use crate::schema::{self, Payer};

const MIN_PRIOR_AUTH_PROCEDURES: usize = 5;
const MAX_PRIOR_AUTH_PROCEDURES: usize = 15;

/// Generate `config.num_payers` payers from distinct payer profiles.
///
/// The base denial rate starts as `target_denial_rate * multiplier`; the
/// outcome model may rescale it afterwards (see `DenialModel::calibrate_payers`).
/// Callers validate the config first, so the profile table is large enough.
pub fn generate_payers<R: Rng + ?Sized>(config: &Config, rng: &mut R) -> Vec<Payer> {
    let profiles: Vec<_> = PAYER_PROFILES.choose_multiple(rng, config.num_payers).collect();

    profiles
        .into_iter()
        .enumerate()
        .map(|(index, profile)| {
            let prior_auth_count =
                rng.random_range(MIN_PRIOR_AUTH_PROCEDURES..=MAX_PRIOR_AUTH_PROCEDURES);
            let prior_auth_procedures = PROCEDURES
                .choose_multiple(rng, prior_auth_count)
                .map(|p| p.code)
                .collect();
            let contact_phone: String = PhoneNumber().fake_with_rng(rng);

            Payer {
                payer_id: schema::payer_id(index as u64),
                payer_name: profile.name,
                payer_type: profile.payer_type,
                denial_multiplier: profile.denial_multiplier,
                average_processing_days: rng.random_range(7..=45),
                electronic_claim_submission: rng.random_bool(0.5),
                prior_auth_procedures,
                base_denial_rate: round_rate(config.target_denial_rate * profile.denial_multiplier),
                average_reimbursement_rate: round_cents(rng.random_range(0.50..=0.95)),
                timely_filing_limit_days: *pick(TIMELY_FILING_LIMITS_DAYS, rng) as u16,
                appeal_timeframe_days: *pick(APPEAL_WINDOWS_DAYS, rng),
                contact_phone,
                website: format!("www.{}.com", profile.name.to_lowercase().replace(' ', "")),
            }
        })
        .collect()
}

pub(crate) fn round_rate(rate: f64) -> f64 {
    (rate * 10_000.0).round() / 10_000.0
}
