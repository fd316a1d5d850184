//! Patient generation. Patients are produced one id range at a time so the
//! population never has to be held in memory at once.

use std::ops::Range;

use anyhow::anyhow;
use chrono::{Duration, Months, NaiveDate};
use fake::Fake;
use fake::faker::address::en::{BuildingNumber, CityName, StateAbbr, StreetName, ZipCode};
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::LastName;
use fake::faker::number::en::NumberWithFormat;
use fake::faker::phone_number::en::PhoneNumber;
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::catalog::{DIAGNOSES, FEMALE_FIRST_NAMES, MALE_FIRST_NAMES};
use crate::config::Config;
use crate::random::{Discrete, pick};
use crate::schema::{self, Patient, Sex};

/// Generates patients for a contiguous range of patient indices.
pub struct PatientGenerator {
    earliest_dob: NaiveDate,
    dob_span_days: i64,
    num_payers: u64,
    chronic_counts: Discrete<usize>,
}

impl PatientGenerator {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let latest_dob = config
            .end_date
            .checked_sub_months(Months::new(config.min_patient_age * 12))
            .ok_or_else(|| anyhow!("minimum patient age reaches before the calendar start"))?;
        let earliest_dob = config
            .end_date
            .checked_sub_months(Months::new(config.max_patient_age * 12))
            .ok_or_else(|| anyhow!("maximum patient age reaches before the calendar start"))?;

        let chronic_counts: Discrete<usize> = Discrete::new(
            "chronic condition count",
            [(0, 0.60), (1, 0.20), (2, 0.10), (3, 0.07), (4, 0.03)],
        )?;

        Ok(Self {
            earliest_dob,
            dob_span_days: (latest_dob - earliest_dob).num_days(),
            num_payers: config.num_payers as u64,
            chronic_counts,
        })
    }

    pub fn generate_chunk<R: Rng + ?Sized>(&self, range: Range<u64>, rng: &mut R) -> Vec<Patient> {
        range.map(|index| self.generate(index, rng)).collect()
    }

    fn generate<R: Rng + ?Sized>(&self, index: u64, rng: &mut R) -> Patient {
        let gender = if rng.random_bool(0.5) { Sex::Male } else { Sex::Female };
        let first_name = match gender {
            Sex::Male => pick(MALE_FIRST_NAMES, rng),
            Sex::Female => pick(FEMALE_FIRST_NAMES, rng),
        }
        .to_string();
        let last_name: String = LastName().fake_with_rng(rng);
        let dob = self.earliest_dob + Duration::days(rng.random_range(0..=self.dob_span_days));

        let building: String = BuildingNumber().fake_with_rng(rng);
        let street: String = StreetName().fake_with_rng(rng);
        let city: String = CityName().fake_with_rng(rng);
        let state: String = StateAbbr().fake_with_rng(rng);
        let zip: String = ZipCode().fake_with_rng(rng);
        let phone: String = PhoneNumber().fake_with_rng(rng);
        let email: String = SafeEmail().fake_with_rng(rng);

        let insurance_id = schema::payer_id(rng.random_range(0..self.num_payers));
        let member_digits: String = NumberWithFormat("##########").fake_with_rng(rng);

        let condition_count = *self.chronic_counts.sample(rng);
        let chronic_conditions = DIAGNOSES
            .choose_multiple(rng, condition_count)
            .map(|d| d.code)
            .collect();

        Patient {
            patient_id: schema::patient_id(index),
            first_name,
            last_name,
            dob,
            gender,
            address: format!("{building} {street}"),
            city,
            state,
            zip,
            phone,
            email,
            insurance_id,
            membership_id: format!("MEM{member_digits}"),
            chronic_conditions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{Domain, SeedSequence};
    use std::collections::HashSet;

    fn small_config() -> Config {
        Config {
            num_patients: 500,
            num_payers: 5,
            ..Config::default()
        }
    }

    #[test]
    fn test_generate_chunk_ids_and_payers() {
        let config = small_config();
        let generator = PatientGenerator::new(&config).unwrap();
        let mut rng = SeedSequence::new(42).rng(Domain::Patients, 0);
        let patients = generator.generate_chunk(100..250, &mut rng);

        assert_eq!(patients.len(), 150);
        assert_eq!(patients[0].patient_id, "P00000101");
        assert_eq!(patients[149].patient_id, "P00000250");
        let payer_ids: HashSet<String> = (0..5).map(schema::payer_id).collect();
        for patient in &patients {
            assert!(payer_ids.contains(&patient.insurance_id));
            assert!(patient.membership_id.starts_with("MEM"));
            assert_eq!(patient.membership_id.len(), 13);
        }
    }

    #[test]
    fn test_dob_within_age_bounds() {
        let config = small_config();
        let generator = PatientGenerator::new(&config).unwrap();
        let mut rng = SeedSequence::new(1).rng(Domain::Patients, 0);
        let earliest = NaiveDate::from_ymd_opt(1929, 12, 31).unwrap();
        let latest = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        for patient in generator.generate_chunk(0..500, &mut rng) {
            assert!(patient.dob >= earliest && patient.dob <= latest, "{}", patient.dob);
        }
    }

    #[test]
    fn test_first_names_follow_sex() {
        let config = small_config();
        let generator = PatientGenerator::new(&config).unwrap();
        let mut rng = SeedSequence::new(3).rng(Domain::Patients, 0);
        for patient in generator.generate_chunk(0..300, &mut rng) {
            let names = match patient.gender {
                Sex::Male => MALE_FIRST_NAMES,
                Sex::Female => FEMALE_FIRST_NAMES,
            };
            assert!(names.contains(&patient.first_name.as_str()));
        }
    }

    #[test]
    fn test_chronic_conditions_distinct_and_bounded() {
        let config = small_config();
        let generator = PatientGenerator::new(&config).unwrap();
        let mut rng = SeedSequence::new(9).rng(Domain::Patients, 0);
        let patients = generator.generate_chunk(0..2000, &mut rng);
        let mut without = 0;
        for patient in &patients {
            let unique: HashSet<_> = patient.chronic_conditions.iter().collect();
            assert_eq!(unique.len(), patient.chronic_conditions.len());
            assert!(patient.chronic_conditions.len() <= 4);
            if patient.chronic_conditions.is_empty() {
                without += 1;
            }
        }
        let share = without as f64 / patients.len() as f64;
        assert!((share - 0.60).abs() < 0.05, "share without conditions was {share}");
    }

    #[test]
    fn test_same_stream_same_patients() {
        let config = small_config();
        let generator = PatientGenerator::new(&config).unwrap();
        let seeds = SeedSequence::new(42);
        let a = generator.generate_chunk(0..20, &mut seeds.rng(Domain::Patients, 0));
        let b = generator.generate_chunk(0..20, &mut seeds.rng(Domain::Patients, 0));
        assert_eq!(a, b);
    }
}
