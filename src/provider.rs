use fake::Fake;
use fake::faker::address::en::{BuildingNumber, CityName, StateAbbr, StreetName, ZipCode};
use fake::faker::name::en::LastName;
use fake::faker::number::en::NumberWithFormat;
use fake::faker::phone_number::en::PhoneNumber;
use rand::Rng;

use crate::catalog::{CREDENTIALS, FACILITY_COUNT, SPECIALTIES};
use crate::random::pick;
use crate::schema::{self, NetworkStatus, Provider};

/// Generate the provider pool. Each provider carries the specialty multiplier
/// and network status the outcome model reads.
pub fn generate_providers<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<Provider> {
    (0..count as u64)
        .map(|index| generate_provider(index, rng))
        .collect()
}

fn generate_provider<R: Rng + ?Sized>(index: u64, rng: &mut R) -> Provider {
    let last_name: String = LastName().fake_with_rng(rng);
    let npi: String = NumberWithFormat("##########").fake_with_rng(rng);
    let specialty = pick(SPECIALTIES, rng);
    let facility = rng.random_range(1..=FACILITY_COUNT);
    let building: String = BuildingNumber().fake_with_rng(rng);
    let street: String = StreetName().fake_with_rng(rng);
    let city: String = CityName().fake_with_rng(rng);
    let state: String = StateAbbr().fake_with_rng(rng);
    let zip: String = ZipCode().fake_with_rng(rng);
    let phone: String = PhoneNumber().fake_with_rng(rng);
    let network_status = if rng.random_bool(0.5) {
        NetworkStatus::InNetwork
    } else {
        NetworkStatus::OutOfNetwork
    };

    Provider {
        provider_id: schema::provider_id(index),
        provider_name: format!("Dr. {last_name}"),
        npi,
        specialty,
        facility_name: format!("ANEC Medical Center {facility}"),
        address: format!("{building} {street}"),
        city,
        state,
        zip,
        phone,
        network_status,
        years_experience: rng.random_range(1..=40),
        credentials: *pick(CREDENTIALS, rng),
        average_patients_per_day: rng.random_range(5..=40),
    }
}

/// Pool-level exposure figures the denial model calibrates against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProviderExposure {
    pub mean_specialty_multiplier: f64,
    pub out_of_network_share: f64,
}

impl ProviderExposure {
    pub fn of(providers: &[Provider]) -> Self {
        if providers.is_empty() {
            return Self {
                mean_specialty_multiplier: 1.0,
                out_of_network_share: 0.0,
            };
        }
        let n = providers.len() as f64;
        Self {
            mean_specialty_multiplier: providers
                .iter()
                .map(Provider::specialty_multiplier)
                .sum::<f64>()
                / n,
            out_of_network_share: providers.iter().filter(|p| p.is_out_of_network()).count()
                as f64
                / n,
        }
    }
}
