//! Per-claim synthesis: entity selection, timing, clinical content, prior
//! authorization, charge, outcome and payment.

use std::ops::Range;

use chrono::{Duration, NaiveDate};
use rand::Rng;

use crate::catalog::{self, DIAGNOSES, PLACES_OF_SERVICE, PROCEDURES, REVENUE_CODES};
use crate::config::Config;
use crate::denial::{DenialModel, RiskFactors};
use crate::error::ConfigError;
use crate::payer::generate_payers;
use crate::provider::{ProviderExposure, generate_providers};
use crate::random::{Discrete, Domain, SeedSequence, pick, round_cents};
use crate::remittance::Remittance;
use crate::schema::{self, Claim, ClaimFrequency, Payer, Provider};

/// Days between service and submission, front-loaded toward prompt billing.
pub const SUBMISSION_LAG_WEIGHTS: &[(u32, f64)] = &[
    (1, 0.15),
    (2, 0.15),
    (3, 0.15),
    (5, 0.10),
    (7, 0.10),
    (10, 0.10),
    (14, 0.05),
    (21, 0.05),
    (30, 0.05),
    (45, 0.05),
    (60, 0.03),
    (90, 0.02),
];

const CLAIM_FREQUENCY_WEIGHTS: [(ClaimFrequency, f64); 3] = [
    (ClaimFrequency::Original, 0.85),
    (ClaimFrequency::Adjustment, 0.10),
    (ClaimFrequency::Replacement, 0.05),
];

const MIN_PROCESSING_DAYS: i64 = 3;
const MAX_PROCESSING_DAYS: i64 = 30;
const MIN_BASE_CHARGE: f64 = 50.0;
const MAX_BASE_CHARGE: f64 = 5000.0;
const MIN_HOSPITAL_MARKUP: f64 = 1.5;
const MAX_HOSPITAL_MARKUP: f64 = 3.0;

/// Produces claims against fixed, read-only provider and payer pools.
///
/// Claims are independent of each other; a synthesizer can be shared across
/// threads and driven by a separate random stream per chunk.
pub struct ClaimSynthesizer {
    start_date: NaiveDate,
    end_date: NaiveDate,
    days_in_range: i64,
    num_patients: u64,
    providers: Vec<Provider>,
    payers: Vec<Payer>,
    model: DenialModel,
    submission_lags: Discrete<u32>,
    claim_frequencies: Discrete<ClaimFrequency>,
}

impl ClaimSynthesizer {
    /// Generates the provider and payer pools from the run seed and calibrates
    /// payer base rates against them.
    pub fn from_seed(config: &Config, seeds: SeedSequence) -> Result<Self, ConfigError> {
        config.validate()?;
        let providers =
            generate_providers(config.num_providers, &mut seeds.rng(Domain::Providers, 0));
        let mut payers = generate_payers(config, &mut seeds.rng(Domain::Payers, 0));
        let model = DenialModel::new(config)?;
        model.calibrate_payers(&mut payers, &ProviderExposure::of(&providers));
        Self::with_model(config, providers, payers, model)
    }

    /// Uses the given pools exactly as they are.
    pub fn new(
        config: &Config,
        providers: Vec<Provider>,
        payers: Vec<Payer>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Self::with_model(config, providers, payers, DenialModel::new(config)?)
    }

    /// Expects a validated `config`.
    fn with_model(
        config: &Config,
        providers: Vec<Provider>,
        payers: Vec<Payer>,
        model: DenialModel,
    ) -> Result<Self, ConfigError> {
        for (field, len) in [
            ("providers", providers.len()),
            ("payers", payers.len()),
        ] {
            if len == 0 {
                return Err(ConfigError::NonPositive { field });
            }
        }

        Ok(Self {
            start_date: config.start_date,
            end_date: config.end_date,
            days_in_range: (config.end_date - config.start_date).num_days(),
            num_patients: config.num_patients as u64,
            providers,
            payers,
            model,
            submission_lags: Discrete::new("submission lag", SUBMISSION_LAG_WEIGHTS.iter().copied())?,
            claim_frequencies: Discrete::new("claim frequency", CLAIM_FREQUENCY_WEIGHTS)?,
        })
    }

    pub fn providers(&self) -> &[Provider] {
        &self.providers
    }

    pub fn payers(&self) -> &[Payer] {
        &self.payers
    }

    pub fn model(&self) -> &DenialModel {
        &self.model
    }

    pub fn synthesize_chunk<R: Rng + ?Sized>(&self, range: Range<u64>, rng: &mut R) -> Vec<Claim> {
        range.map(|index| self.synthesize(index, rng)).collect()
    }

    /// Builds claim number `index`. The order of random draws is fixed; any
    /// change to it changes every dataset produced from a given seed.
    pub fn synthesize<R: Rng + ?Sized>(&self, index: u64, rng: &mut R) -> Claim {
        let params = self.model.params();

        let patient_index = rng.random_range(0..self.num_patients);
        let provider = pick(&self.providers, rng);
        let payer = pick(&self.payers, rng);

        let service_date = self.start_date + Duration::days(rng.random_range(0..=self.days_in_range));
        let submission_lag_days = *self.submission_lags.sample(rng);
        let submission_date =
            (service_date + Duration::days(i64::from(submission_lag_days))).min(self.end_date);
        let processing_days = rng.random_range(MIN_PROCESSING_DAYS..=MAX_PROCESSING_DAYS);
        let processing_date = (submission_date + Duration::days(processing_days)).min(self.end_date);

        let primary_diagnosis_code = pick(DIAGNOSES, rng).code;
        let secondary_diagnosis_code = rng
            .random_bool(params.secondary_diagnosis_rate)
            .then(|| pick(DIAGNOSES, rng).code);
        let procedure_code = pick(PROCEDURES, rng).code;
        let place_of_service_code = pick(PLACES_OF_SERVICE, rng).code;
        let revenue_code = rng
            .random_bool(params.revenue_code_rate)
            .then(|| pick(REVENUE_CODES, rng).code);

        let prior_auth_required = payer.requires_prior_auth(procedure_code);
        let prior_auth_obtained =
            prior_auth_required && rng.random_bool(params.prior_auth_compliance);

        let mut charge = rng.random_range(MIN_BASE_CHARGE..=MAX_BASE_CHARGE);
        if catalog::is_hospital_place_of_service(place_of_service_code) {
            charge *= rng.random_range(MIN_HOSPITAL_MARKUP..=MAX_HOSPITAL_MARKUP);
        }
        let charge_amount = round_cents(charge);

        let factors = RiskFactors {
            base_rate: payer.base_denial_rate,
            specialty_multiplier: provider.specialty_multiplier(),
            prior_auth_missing: prior_auth_required && !prior_auth_obtained,
            out_of_network: provider.is_out_of_network(),
            high_risk_procedure: catalog::is_high_denial_procedure(procedure_code),
            submission_lag_days,
            timely_filing_limit_days: self.model.sample_filing_limit(rng),
        };
        let denial = self.model.adjudicate(&factors, rng);

        let remittance =
            Remittance::settle(charge_amount, denial, submission_date, processing_date, rng);
        let claim_frequency = *self.claim_frequencies.sample(rng);

        Claim {
            claim_id: schema::claim_id(index),
            patient_id: schema::patient_id(patient_index),
            provider_id: provider.provider_id.clone(),
            payer_id: payer.payer_id.clone(),
            service_date,
            submission_date,
            processing_date,
            primary_diagnosis_code,
            secondary_diagnosis_code,
            procedure_code,
            revenue_code,
            place_of_service_code,
            prior_auth_required,
            prior_auth_obtained,
            charge_amount,
            adjudication: remittance.adjudication,
            patient_responsibility: remittance.patient_responsibility,
            claim_frequency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remittance::validate_against_claim;
    use std::collections::HashSet;

    fn small_config() -> Config {
        Config {
            num_patients: 1000,
            num_providers: 200,
            num_payers: 5,
            total_claims: Some(20_000),
            ..Config::default()
        }
    }

    #[test]
    fn test_claim_invariants() {
        let config = small_config();
        let seeds = SeedSequence::new(42);
        let synthesizer = ClaimSynthesizer::from_seed(&config, seeds).unwrap();
        let claims = synthesizer.synthesize_chunk(0..20_000, &mut seeds.rng(Domain::Claims, 0));

        let provider_ids: HashSet<_> = synthesizer.providers().iter().map(|p| &p.provider_id).collect();
        let payer_ids: HashSet<_> = synthesizer.payers().iter().map(|p| &p.payer_id).collect();

        for claim in &claims {
            assert!(claim.submission_date >= claim.service_date);
            assert!(claim.processing_date >= claim.submission_date);
            assert!(claim.processing_date <= config.end_date);
            assert!(claim.service_date >= config.start_date);
            assert!(claim.payment_amount().is_some() ^ claim.denial_reason().is_some());
            assert!(provider_ids.contains(&claim.provider_id));
            assert!(payer_ids.contains(&claim.payer_id));
            assert!(claim.patient_id.as_str() >= "P00000001" && claim.patient_id.as_str() <= "P00001000");
            if !claim.prior_auth_required {
                assert!(!claim.prior_auth_obtained);
            }
            validate_against_claim(claim).unwrap();
        }
    }

    #[test]
    fn test_optional_fields_occurrence() {
        let config = small_config();
        let seeds = SeedSequence::new(8);
        let synthesizer = ClaimSynthesizer::from_seed(&config, seeds).unwrap();
        let claims = synthesizer.synthesize_chunk(0..20_000, &mut seeds.rng(Domain::Claims, 0));
        let n = claims.len() as f64;

        let secondary = claims.iter().filter(|c| c.secondary_diagnosis_code.is_some()).count() as f64 / n;
        let revenue = claims.iter().filter(|c| c.revenue_code.is_some()).count() as f64 / n;
        let originals = claims
            .iter()
            .filter(|c| c.claim_frequency == ClaimFrequency::Original)
            .count() as f64
            / n;
        assert!((secondary - 0.4).abs() < 0.02, "secondary share {secondary}");
        assert!((revenue - 0.7).abs() < 0.02, "revenue share {revenue}");
        assert!((originals - 0.85).abs() < 0.02, "original share {originals}");
    }

    #[test]
    fn test_hospital_charges_are_inflated() {
        let config = small_config();
        let seeds = SeedSequence::new(3);
        let synthesizer = ClaimSynthesizer::from_seed(&config, seeds).unwrap();
        let claims = synthesizer.synthesize_chunk(0..20_000, &mut seeds.rng(Domain::Claims, 0));

        let mut max_office: f64 = 0.0;
        let mut max_hospital: f64 = 0.0;
        for claim in &claims {
            assert!(claim.charge_amount >= MIN_BASE_CHARGE);
            if catalog::is_hospital_place_of_service(claim.place_of_service_code) {
                max_hospital = max_hospital.max(claim.charge_amount);
            } else {
                max_office = max_office.max(claim.charge_amount);
            }
        }
        assert!(max_office <= MAX_BASE_CHARGE);
        assert!(max_hospital > MAX_BASE_CHARGE);
    }

    #[test]
    fn test_same_stream_same_claims() {
        let config = small_config();
        let seeds = SeedSequence::new(42);
        let first = ClaimSynthesizer::from_seed(&config, seeds).unwrap();
        let second = ClaimSynthesizer::from_seed(&config, seeds).unwrap();
        let a = first.synthesize_chunk(500..700, &mut seeds.rng(Domain::Claims, 3));
        let b = second.synthesize_chunk(500..700, &mut seeds.rng(Domain::Claims, 3));
        assert_eq!(a, b);
        assert_eq!(a[0].claim_id, "CLM0000000501");
    }

    #[test]
    fn test_empty_pools_rejected() {
        let config = small_config();
        let err = ClaimSynthesizer::new(&config, Vec::new(), Vec::new()).err();
        assert_eq!(err, Some(ConfigError::NonPositive { field: "providers" }));
    }

    #[test]
    fn test_out_of_range_rates_rejected() {
        let mut config = small_config();
        config.model.secondary_diagnosis_rate = 1.5;
        let seeds = SeedSequence::new(42);
        let err = ClaimSynthesizer::from_seed(&config, seeds).err();
        assert_eq!(
            err,
            Some(ConfigError::ProbabilityOutOfRange {
                field: "secondary_diagnosis_rate",
                value: 1.5
            })
        );

        let mut config = small_config();
        config.model.prior_auth_compliance = -0.1;
        let providers = generate_providers(10, &mut seeds.rng(Domain::Providers, 0));
        let payers = generate_payers(&small_config(), &mut seeds.rng(Domain::Payers, 0));
        let err = ClaimSynthesizer::new(&config, providers, payers).err();
        assert!(matches!(
            err,
            Some(ConfigError::ProbabilityOutOfRange { field: "prior_auth_compliance", .. })
        ));
    }
}
