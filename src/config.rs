use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{Datelike, NaiveDate};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::catalog::{self, DenialCategory, PAYER_PROFILES};
use crate::error::ConfigError;

/// How the claim outcome column is encoded in the output files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StatusFormat {
    /// 0 = approved, 1 = denied
    #[default]
    Numeric,
    /// false = approved, true = denied
    Boolean,
    /// APPROVED / DENIED
    #[serde(rename = "string")]
    #[value(name = "string")]
    Text,
}

impl StatusFormat {
    /// Whether a status cell, rendered as text, denotes a denied claim.
    pub fn is_denied_token(self, token: &str) -> bool {
        match self {
            StatusFormat::Numeric => token == "1",
            StatusFormat::Boolean => token == "true",
            StatusFormat::Text => token == "DENIED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Parquet,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
        }
    }
}

/// Magnitudes and probabilities of the claim outcome model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub prior_auth_penalty: f64,
    pub out_of_network_penalty: f64,
    pub high_risk_procedure_penalty: f64,
    pub timely_filing_penalty: f64,
    /// Fraction of the timely filing limit after which the penalty applies.
    pub timely_filing_threshold: f64,
    pub min_probability: f64,
    pub max_probability: f64,
    pub prior_auth_compliance: f64,
    /// Chance that an out-of-network denial is attributed to an excluded service.
    pub out_of_network_excluded_share: f64,
    pub timely_filing_fallback_codes: Vec<String>,
    pub secondary_diagnosis_rate: f64,
    pub revenue_code_rate: f64,
    /// Rescale payer base rates so the realized denial rate lands on target.
    pub calibrate_base_rate: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            prior_auth_penalty: 0.60,
            out_of_network_penalty: 0.20,
            high_risk_procedure_penalty: 0.15,
            timely_filing_penalty: 0.30,
            timely_filing_threshold: 0.8,
            min_probability: 0.0,
            max_probability: 0.95,
            prior_auth_compliance: 0.85,
            out_of_network_excluded_share: 0.5,
            timely_filing_fallback_codes: vec!["A4".to_string()],
            secondary_diagnosis_rate: 0.4,
            revenue_code_rate: 0.7,
            calibrate_base_rate: true,
        }
    }
}

/// Full description of one generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub num_patients: usize,
    pub num_providers: usize,
    pub num_payers: usize,
    pub claims_per_year: usize,
    /// Overrides the claim count derived from `claims_per_year`.
    pub total_claims: Option<usize>,
    pub target_denial_rate: f64,
    pub denial_reason_distribution: BTreeMap<DenialCategory, f64>,
    pub model: ModelConfig,
    pub min_patient_age: u32,
    pub max_patient_age: u32,
    pub status_format: StatusFormat,
    pub output_dir: PathBuf,
    pub output_formats: Vec<OutputFormat>,
    pub seed: u64,
    pub chunk_size: usize,
    pub workers: usize,
}

pub fn default_denial_reason_distribution() -> BTreeMap<DenialCategory, f64> {
    BTreeMap::from([
        (DenialCategory::Other, 0.34),
        (DenialCategory::Administrative, 0.18),
        (DenialCategory::ExcludedService, 0.16),
        (DenialCategory::NoPriorAuth, 0.09),
        (DenialCategory::NotMedicallyNecessary, 0.06),
        (DenialCategory::Remaining, 0.17),
    ])
}

impl Default for Config {
    fn default() -> Self {
        Self {
            start_date: NaiveDate::from_ymd_opt(2022, 1, 1).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or_default(),
            num_patients: 2_000_000,
            num_providers: 65_000,
            num_payers: 20,
            claims_per_year: 500_000,
            total_claims: None,
            target_denial_rate: 0.19,
            denial_reason_distribution: default_denial_reason_distribution(),
            model: ModelConfig::default(),
            min_patient_age: 1,
            max_patient_age: 95,
            status_format: StatusFormat::Numeric,
            output_dir: PathBuf::from("./output"),
            output_formats: vec![OutputFormat::Csv, OutputFormat::Parquet],
            seed: 42,
            chunk_size: 100_000,
            workers: 4,
        }
    }
}

impl Config {
    pub fn from_json_file(path: &Path) -> anyhow::Result<Config> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed reading config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed parsing config file {}", path.display()))
    }

    /// Whole calendar years covered, counting a partial final year.
    pub fn years_span(&self) -> usize {
        let years = (self.end_date.year() - self.start_date.year()).max(0) as usize;
        if self.start_date.month() <= self.end_date.month() {
            years + 1
        } else {
            years
        }
    }

    pub fn total_claims(&self) -> usize {
        self.total_claims
            .unwrap_or(self.claims_per_year * self.years_span())
    }

    /// Rejects configurations that could not produce a consistent dataset.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("num_patients", self.num_patients),
            ("num_providers", self.num_providers),
            ("num_payers", self.num_payers),
            ("total_claims", self.total_claims()),
            ("chunk_size", self.chunk_size),
            ("workers", self.workers),
        ] {
            if value == 0 {
                return Err(ConfigError::NonPositive { field });
            }
        }

        if self.start_date >= self.end_date {
            return Err(ConfigError::InvertedDateRange {
                start: self.start_date,
                end: self.end_date,
            });
        }

        if self.min_patient_age > self.max_patient_age || self.max_patient_age > 150 {
            return Err(ConfigError::InvalidAgeRange {
                min: self.min_patient_age,
                max: self.max_patient_age,
            });
        }

        if self.num_payers > PAYER_PROFILES.len() {
            return Err(ConfigError::TooManyPayers {
                requested: self.num_payers,
                available: PAYER_PROFILES.len(),
            });
        }

        check_probability("target_denial_rate", self.target_denial_rate)?;

        for share in self.denial_reason_distribution.values() {
            check_probability("denial_reason_distribution", *share)?;
        }
        let sum: f64 = self.denial_reason_distribution.values().sum();
        if (sum - 1.0).abs() > 1e-3 {
            return Err(ConfigError::SharesNotNormalized { sum });
        }

        let model = &self.model;
        for (field, value) in [
            ("prior_auth_penalty", model.prior_auth_penalty),
            ("out_of_network_penalty", model.out_of_network_penalty),
            ("high_risk_procedure_penalty", model.high_risk_procedure_penalty),
            ("timely_filing_penalty", model.timely_filing_penalty),
            ("timely_filing_threshold", model.timely_filing_threshold),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidMagnitude { field, value });
            }
        }
        for (field, value) in [
            ("min_probability", model.min_probability),
            ("max_probability", model.max_probability),
            ("prior_auth_compliance", model.prior_auth_compliance),
            ("out_of_network_excluded_share", model.out_of_network_excluded_share),
            ("secondary_diagnosis_rate", model.secondary_diagnosis_rate),
            ("revenue_code_rate", model.revenue_code_rate),
        ] {
            check_probability(field, value)?;
        }
        if model.min_probability > model.max_probability {
            return Err(ConfigError::InvertedClamp {
                min: model.min_probability,
                max: model.max_probability,
            });
        }

        if model.timely_filing_fallback_codes.is_empty() {
            return Err(ConfigError::EmptyFallbackCodes);
        }
        if let Some(unknown) = model
            .timely_filing_fallback_codes
            .iter()
            .find(|code| catalog::denial_reason(code).is_none())
        {
            return Err(ConfigError::UnknownReasonCode(unknown.clone()));
        }

        if self.output_formats.is_empty() {
            return Err(ConfigError::NoOutputFormats);
        }

        Ok(())
    }
}

fn check_probability(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::ProbabilityOutOfRange { field, value });
    }
    Ok(())
}

/// Synthetic health insurance claims dataset generator
#[derive(Debug, Default, Parser)]
#[command(name = "claimsynth", version, about)]
pub struct Cli {
    /// JSON file with a full or partial configuration
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long)]
    pub patients: Option<usize>,

    #[arg(long)]
    pub providers: Option<usize>,

    #[arg(long)]
    pub payers: Option<usize>,

    /// Total claims, instead of claims_per_year times the year span
    #[arg(long)]
    pub claims: Option<usize>,

    #[arg(long, value_enum, value_delimiter = ',')]
    pub formats: Vec<OutputFormat>,

    #[arg(long, value_enum)]
    pub status_format: Option<StatusFormat>,

    #[arg(long)]
    pub chunk_size: Option<usize>,

    #[arg(long)]
    pub workers: Option<usize>,

    /// Re-read the written claims file and report its denial summary.
    /// Needs parquet among the output formats; CSV-only runs cannot be verified
    #[arg(long)]
    pub verify: bool,

    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Builds the run configuration: defaults, then the config file, then flags.
    pub fn resolve(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_json_file(path)?,
            None => Config::default(),
        };

        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(n) = self.patients {
            config.num_patients = n;
        }
        if let Some(n) = self.providers {
            config.num_providers = n;
        }
        if let Some(n) = self.payers {
            config.num_payers = n;
        }
        if let Some(n) = self.claims {
            config.total_claims = Some(n);
        }
        if !self.formats.is_empty() {
            config.output_formats = self.formats.clone();
        }
        if let Some(format) = self.status_format {
            config.status_format = format;
        }
        if let Some(n) = self.chunk_size {
            config.chunk_size = n;
        }
        if let Some(n) = self.workers {
            config.workers = n;
        }

        config.validate()?;
        Ok(config)
    }
}
