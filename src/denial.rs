//! Claim outcome model: denial probability composition, reason attribution
//! and payer base-rate calibration.

use rand::Rng;
use tracing::{info, warn};

use crate::catalog::{self, DENIAL_REASONS, DenialCategory, DenialReason, PROCEDURES, TIMELY_FILING_LIMITS_DAYS};
use crate::config::{Config, ModelConfig};
use crate::error::ConfigError;
use crate::payer::round_rate;
use crate::provider::ProviderExposure;
use crate::random::{Discrete, pick};
use crate::schema::Payer;
use crate::synthesizer::SUBMISSION_LAG_WEIGHTS;

/// Everything about one claim that moves its denial probability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskFactors {
    pub base_rate: f64,
    pub specialty_multiplier: f64,
    pub prior_auth_missing: bool,
    pub out_of_network: bool,
    pub high_risk_procedure: bool,
    pub submission_lag_days: u32,
    pub timely_filing_limit_days: u32,
}

impl RiskFactors {
    fn near_filing_limit(&self, threshold: f64) -> bool {
        f64::from(self.submission_lag_days) > f64::from(self.timely_filing_limit_days) * threshold
    }

    fn past_filing_limit(&self) -> bool {
        self.submission_lag_days > self.timely_filing_limit_days
    }
}

pub struct DenialModel {
    params: ModelConfig,
    target_rate: f64,
    prior_auth_reasons: Vec<&'static DenialReason>,
    excluded_service_reasons: Vec<&'static DenialReason>,
    timely_filing_reasons: Vec<&'static DenialReason>,
    weighted_reasons: Discrete<&'static DenialReason>,
}

impl DenialModel {
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let timely_filing_reasons = config
            .model
            .timely_filing_fallback_codes
            .iter()
            .map(|code| {
                catalog::denial_reason(code)
                    .ok_or_else(|| ConfigError::UnknownReasonCode(code.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if timely_filing_reasons.is_empty() {
            return Err(ConfigError::EmptyFallbackCodes);
        }

        // Each category's share is split evenly across its codes.
        let weighted_reasons = Discrete::new(
            "denial reasons",
            DENIAL_REASONS.iter().map(|reason| {
                let share = config
                    .denial_reason_distribution
                    .get(&reason.category)
                    .copied()
                    .unwrap_or(0.0);
                (reason, share / reason.category.reasons().count() as f64)
            }),
        )?;

        Ok(Self {
            params: config.model.clone(),
            target_rate: config.target_denial_rate,
            prior_auth_reasons: DenialCategory::NoPriorAuth.reasons().collect(),
            excluded_service_reasons: DenialCategory::ExcludedService.reasons().collect(),
            timely_filing_reasons,
            weighted_reasons,
        })
    }

    pub fn params(&self) -> &ModelConfig {
        &self.params
    }

    /// Draws the per-claim timely filing limit the lag is judged against.
    pub fn sample_filing_limit<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        *pick(TIMELY_FILING_LIMITS_DAYS, rng)
    }

    /// Composes the denial probability. Terms are applied in a fixed order:
    /// payer base times specialty, then each additive penalty, then the clamp.
    pub fn probability(&self, factors: &RiskFactors) -> f64 {
        let p = &self.params;
        let mut probability = factors.base_rate * factors.specialty_multiplier;
        if factors.prior_auth_missing {
            probability += p.prior_auth_penalty;
        }
        if factors.out_of_network {
            probability += p.out_of_network_penalty;
        }
        if factors.high_risk_procedure {
            probability += p.high_risk_procedure_penalty;
        }
        if factors.near_filing_limit(p.timely_filing_threshold) {
            probability += p.timely_filing_penalty;
        }
        probability.clamp(p.min_probability, p.max_probability)
    }

    /// Bernoulli draw on the composed probability. Returns the attributed
    /// reason for denied claims, `None` for approved ones.
    pub fn adjudicate<R: Rng + ?Sized>(
        &self,
        factors: &RiskFactors,
        rng: &mut R,
    ) -> Option<&'static DenialReason> {
        let probability = self.probability(factors);
        if rng.random::<f64>() < probability {
            Some(self.attribute_reason(factors, rng))
        } else {
            None
        }
    }

    /// Picks the reason recorded on a denied claim. The first matching rule
    /// wins, so the reason tracks the factor that drove the denial.
    pub fn attribute_reason<R: Rng + ?Sized>(
        &self,
        factors: &RiskFactors,
        rng: &mut R,
    ) -> &'static DenialReason {
        if factors.prior_auth_missing {
            return *pick(&self.prior_auth_reasons, rng);
        }
        if factors.out_of_network && rng.random_bool(self.params.out_of_network_excluded_share) {
            return *pick(&self.excluded_service_reasons, rng);
        }
        if factors.past_filing_limit() {
            return *pick(&self.timely_filing_reasons, rng);
        }
        *self.weighted_reasons.sample(rng)
    }

    /// Expected probability mass contributed by the additive penalties, given
    /// the payer and provider pools claims are drawn from.
    pub fn expected_additive(&self, payers: &[Payer], providers: &ProviderExposure) -> f64 {
        let p = &self.params;
        let procedures = PROCEDURES.len() as f64;

        let prior_auth_share = if payers.is_empty() {
            0.0
        } else {
            payers
                .iter()
                .map(|payer| payer.prior_auth_procedures.len() as f64 / procedures)
                .sum::<f64>()
                / payers.len() as f64
        };
        let high_risk_share = PROCEDURES
            .iter()
            .filter(|proc| catalog::is_high_denial_procedure(proc.code))
            .count() as f64
            / procedures;

        let total_weight: f64 = SUBMISSION_LAG_WEIGHTS.iter().map(|(_, w)| w).sum();
        let near_limit_share = SUBMISSION_LAG_WEIGHTS
            .iter()
            .map(|&(lag, weight)| {
                let exceeded = TIMELY_FILING_LIMITS_DAYS
                    .iter()
                    .filter(|&&limit| f64::from(lag) > f64::from(limit) * p.timely_filing_threshold)
                    .count() as f64;
                weight * exceeded / TIMELY_FILING_LIMITS_DAYS.len() as f64
            })
            .sum::<f64>()
            / total_weight;

        p.prior_auth_penalty * (1.0 - p.prior_auth_compliance) * prior_auth_share
            + p.out_of_network_penalty * providers.out_of_network_share
            + p.high_risk_procedure_penalty * high_risk_share
            + p.timely_filing_penalty * near_limit_share
    }

    /// Rescales payer base rates so the expected denial rate over the given
    /// pools equals the configured target. No-op when calibration is off.
    pub fn calibrate_payers(&self, payers: &mut [Payer], providers: &ProviderExposure) {
        if !self.params.calibrate_base_rate || payers.is_empty() {
            return;
        }

        let additive = self.expected_additive(payers, providers);
        let mean_payer_multiplier =
            payers.iter().map(|p| p.denial_multiplier).sum::<f64>() / payers.len() as f64;
        let scale = mean_payer_multiplier * providers.mean_specialty_multiplier;
        let baseline = if scale > 0.0 {
            ((self.target_rate - additive) / scale).max(0.0)
        } else {
            0.0
        };

        if additive >= self.target_rate {
            warn!(
                additive,
                target = self.target_rate,
                "Risk penalties alone exceed the target denial rate; payer base rates set to zero"
            );
        }
        info!(baseline, additive, "Calibrated payer base denial rates");

        for payer in payers.iter_mut() {
            payer.base_denial_rate = round_rate(baseline * payer.denial_multiplier);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_denial_reason_distribution;
    use crate::payer::generate_payers;
    use crate::random::{Domain, SeedSequence};
    use std::collections::BTreeMap;

    fn neutral() -> RiskFactors {
        RiskFactors {
            base_rate: 0.19,
            specialty_multiplier: 1.0,
            prior_auth_missing: false,
            out_of_network: false,
            high_risk_procedure: false,
            submission_lag_days: 3,
            timely_filing_limit_days: 90,
        }
    }

    fn model() -> DenialModel {
        DenialModel::new(&Config::default()).unwrap()
    }

    #[test]
    fn test_probability_composition() {
        let model = model();
        let mut factors = neutral();
        factors.specialty_multiplier = 1.2;
        assert!((model.probability(&factors) - 0.228).abs() < 1e-9);

        factors.out_of_network = true;
        assert!((model.probability(&factors) - 0.428).abs() < 1e-9);

        factors.high_risk_procedure = true;
        assert!((model.probability(&factors) - 0.578).abs() < 1e-9);
    }

    #[test]
    fn test_filing_limit_threshold() {
        let model = model();
        let mut factors = neutral();
        factors.submission_lag_days = 24;
        factors.timely_filing_limit_days = 30;
        assert!((model.probability(&factors) - 0.19).abs() < 1e-9);

        factors.submission_lag_days = 25;
        assert!((model.probability(&factors) - 0.49).abs() < 1e-9);
    }

    #[test]
    fn test_probability_is_clamped() {
        let model = model();
        let factors = RiskFactors {
            prior_auth_missing: true,
            out_of_network: true,
            high_risk_procedure: true,
            ..neutral()
        };
        assert_eq!(model.probability(&factors), 0.95);

        let mut config = Config::default();
        config.model.min_probability = 0.01;
        let floored = DenialModel::new(&config).unwrap();
        let factors = RiskFactors {
            base_rate: 0.0,
            ..neutral()
        };
        assert_eq!(floored.probability(&factors), 0.01);
    }

    #[test]
    fn test_zero_ceiling_never_denies() {
        let mut config = Config::default();
        config.model.max_probability = 0.0;
        let model = DenialModel::new(&config).unwrap();
        let mut rng = SeedSequence::new(42).rng(Domain::Claims, 0);
        let factors = RiskFactors {
            prior_auth_missing: true,
            ..neutral()
        };
        for _ in 0..10_000 {
            assert!(model.adjudicate(&factors, &mut rng).is_none());
        }
    }

    #[test]
    fn test_missing_prior_auth_always_attributed() {
        let model = model();
        let mut rng = SeedSequence::new(42).rng(Domain::Claims, 0);
        let factors = RiskFactors {
            prior_auth_missing: true,
            out_of_network: true,
            submission_lag_days: 90,
            timely_filing_limit_days: 30,
            ..neutral()
        };
        for _ in 0..1000 {
            let reason = model.attribute_reason(&factors, &mut rng);
            assert_eq!(reason.category, DenialCategory::NoPriorAuth);
        }
    }

    #[test]
    fn test_out_of_network_splits_excluded_service() {
        let model = model();
        let mut rng = SeedSequence::new(42).rng(Domain::Claims, 0);
        let factors = RiskFactors {
            out_of_network: true,
            ..neutral()
        };
        let n = 20_000;
        let excluded = (0..n)
            .filter(|_| {
                model.attribute_reason(&factors, &mut rng).category
                    == DenialCategory::ExcludedService
            })
            .count();
        // half forced, plus the weighted share of the other half
        let expected = 0.5 + 0.5 * 0.16;
        let share = excluded as f64 / n as f64;
        assert!((share - expected).abs() < 0.02, "share was {share}");
    }

    #[test]
    fn test_late_filing_uses_fallback_codes() {
        let model = model();
        let mut rng = SeedSequence::new(42).rng(Domain::Claims, 0);
        let factors = RiskFactors {
            submission_lag_days: 90,
            timely_filing_limit_days: 60,
            ..neutral()
        };
        for _ in 0..200 {
            assert_eq!(model.attribute_reason(&factors, &mut rng).code, "A4");
        }
    }

    #[test]
    fn test_weighted_reasons_follow_shares() {
        let model = model();
        let mut rng = SeedSequence::new(42).rng(Domain::Claims, 0);
        let factors = neutral();
        let n = 100_000;
        let mut counts: BTreeMap<DenialCategory, usize> = BTreeMap::new();
        for _ in 0..n {
            let reason = model.attribute_reason(&factors, &mut rng);
            *counts.entry(reason.category).or_default() += 1;
        }
        for (category, share) in default_denial_reason_distribution() {
            let realized = counts.get(&category).copied().unwrap_or(0) as f64 / n as f64;
            assert!((realized - share).abs() < 0.01, "{category}: {realized} vs {share}");
        }
    }

    #[test]
    fn test_calibration_hits_target_in_expectation() {
        let config = Config::default();
        let model = DenialModel::new(&config).unwrap();
        let mut payers = generate_payers(&config, &mut SeedSequence::new(42).rng(Domain::Payers, 0));
        let exposure = ProviderExposure {
            mean_specialty_multiplier: 1.1,
            out_of_network_share: 0.5,
        };
        model.calibrate_payers(&mut payers, &exposure);

        let additive = model.expected_additive(&payers, &exposure);
        let expected_base = payers
            .iter()
            .map(|p| p.base_denial_rate * exposure.mean_specialty_multiplier)
            .sum::<f64>()
            / payers.len() as f64;
        assert!((expected_base + additive - 0.19).abs() < 1e-3);
        assert!(payers.iter().all(|p| p.base_denial_rate >= 0.0));
    }

    #[test]
    fn test_calibration_disabled_keeps_literal_rates() {
        let mut config = Config::default();
        config.model.calibrate_base_rate = false;
        let model = DenialModel::new(&config).unwrap();
        let mut payers = generate_payers(&config, &mut SeedSequence::new(42).rng(Domain::Payers, 0));
        let before: Vec<f64> = payers.iter().map(|p| p.base_denial_rate).collect();
        model.calibrate_payers(
            &mut payers,
            &ProviderExposure {
                mean_specialty_multiplier: 1.0,
                out_of_network_share: 0.5,
            },
        );
        let after: Vec<f64> = payers.iter().map(|p| p.base_denial_rate).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_calibration_floors_at_zero() {
        let mut config = Config::default();
        config.target_denial_rate = 0.05;
        let model = DenialModel::new(&config).unwrap();
        let mut payers = generate_payers(&config, &mut SeedSequence::new(42).rng(Domain::Payers, 0));
        model.calibrate_payers(
            &mut payers,
            &ProviderExposure {
                mean_specialty_multiplier: 1.0,
                out_of_network_share: 0.5,
            },
        );
        assert!(payers.iter().all(|p| p.base_denial_rate == 0.0));
    }
}
