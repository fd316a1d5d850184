//! Arrow layouts of the four output tables.
//!
//! Identifiers and free text are `Utf8`; values drawn from small catalogs
//! are dictionary encoded; dates are `Date32`.

use std::sync::Arc;

use arrow::array::{
    ArrayRef, BooleanArray, Date32Array, DictionaryArray, Float64Array, Int8Array, Int16Array,
    StringArray, UInt16Array,
};
use arrow::datatypes::{DataType, Date32Type, Field, Int32Type, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;

use crate::catalog;
use crate::config::StatusFormat;
use crate::schema::{Claim, ClaimStatus, Patient, Payer, Provider};

/// A record type that can be written as one output table.
pub trait Tabular: Sized + Send + 'static {
    /// Base name of the output files, `synthetic_<TABLE>.<ext>`.
    const TABLE: &'static str;

    fn schema(status: StatusFormat) -> SchemaRef;

    fn to_batch(rows: &[Self], status: StatusFormat) -> anyhow::Result<RecordBatch>;
}

fn category_type() -> DataType {
    DataType::Dictionary(Box::new(DataType::Int32), Box::new(DataType::Utf8))
}

fn text<T>(rows: &[T], value: impl Fn(&T) -> &str) -> ArrayRef {
    Arc::new(StringArray::from_iter_values(rows.iter().map(value)))
}

fn nullable_text<T>(rows: &[T], value: impl Fn(&T) -> Option<String>) -> ArrayRef {
    Arc::new(rows.iter().map(value).collect::<StringArray>())
}

fn category<T>(rows: &[T], value: impl Fn(&T) -> &str) -> ArrayRef {
    Arc::new(rows.iter().map(value).collect::<DictionaryArray<Int32Type>>())
}

fn nullable_category<T>(rows: &[T], value: impl Fn(&T) -> Option<&str>) -> ArrayRef {
    Arc::new(rows.iter().map(value).collect::<DictionaryArray<Int32Type>>())
}

fn dates<T>(rows: &[T], value: impl Fn(&T) -> NaiveDate) -> ArrayRef {
    Arc::new(Date32Array::from_iter_values(
        rows.iter().map(|row| Date32Type::from_naive_date(value(row))),
    ))
}

fn flags<T>(rows: &[T], value: impl Fn(&T) -> bool) -> ArrayRef {
    Arc::new(BooleanArray::from(rows.iter().map(value).collect::<Vec<_>>()))
}

fn amounts<T>(rows: &[T], value: impl Fn(&T) -> f64) -> ArrayRef {
    Arc::new(Float64Array::from_iter_values(rows.iter().map(value)))
}

fn nullable_amounts<T>(rows: &[T], value: impl Fn(&T) -> Option<f64>) -> ArrayRef {
    Arc::new(rows.iter().map(value).collect::<Float64Array>())
}

fn codes<T>(rows: &[T], value: impl Fn(&T) -> i8) -> ArrayRef {
    Arc::new(Int8Array::from_iter_values(rows.iter().map(value)))
}

fn small_counts<T>(rows: &[T], value: impl Fn(&T) -> u16) -> ArrayRef {
    Arc::new(UInt16Array::from_iter_values(rows.iter().map(value)))
}

/// Comma-joined list, or null when empty.
fn joined<'a>(codes: impl IntoIterator<Item = &'a &'static str>) -> Option<String> {
    let joined = codes.into_iter().copied().collect::<Vec<_>>().join(",");
    (!joined.is_empty()).then_some(joined)
}

impl Tabular for Patient {
    const TABLE: &'static str = "patients";

    fn schema(_status: StatusFormat) -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("patient_id", DataType::Utf8, false),
            Field::new("first_name", category_type(), false),
            Field::new("last_name", DataType::Utf8, false),
            Field::new("dob", DataType::Date32, false),
            Field::new("gender", category_type(), false),
            Field::new("address", DataType::Utf8, false),
            Field::new("city", DataType::Utf8, false),
            Field::new("state", category_type(), false),
            Field::new("zip", DataType::Utf8, false),
            Field::new("phone", DataType::Utf8, false),
            Field::new("email", DataType::Utf8, false),
            Field::new("insurance_id", category_type(), false),
            Field::new("membership_id", DataType::Utf8, false),
            Field::new("chronic_conditions", DataType::Utf8, true),
        ]))
    }

    fn to_batch(rows: &[Self], status: StatusFormat) -> anyhow::Result<RecordBatch> {
        let columns = vec![
            text(rows, |p| p.patient_id.as_str()),
            category(rows, |p| p.first_name.as_str()),
            text(rows, |p| p.last_name.as_str()),
            dates(rows, |p| p.dob),
            category(rows, |p| p.gender.as_str()),
            text(rows, |p| p.address.as_str()),
            text(rows, |p| p.city.as_str()),
            category(rows, |p| p.state.as_str()),
            text(rows, |p| p.zip.as_str()),
            text(rows, |p| p.phone.as_str()),
            text(rows, |p| p.email.as_str()),
            category(rows, |p| p.insurance_id.as_str()),
            text(rows, |p| p.membership_id.as_str()),
            nullable_text(rows, |p| joined(&p.chronic_conditions)),
        ];
        Ok(RecordBatch::try_new(Self::schema(status), columns)?)
    }
}

impl Tabular for Provider {
    const TABLE: &'static str = "providers";

    fn schema(_status: StatusFormat) -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("provider_id", DataType::Utf8, false),
            Field::new("provider_name", DataType::Utf8, false),
            Field::new("npi", DataType::Utf8, false),
            Field::new("specialty", category_type(), false),
            Field::new("specialty_denial_modifier", DataType::Float64, false),
            Field::new("facility_name", category_type(), false),
            Field::new("address", DataType::Utf8, false),
            Field::new("city", DataType::Utf8, false),
            Field::new("state", category_type(), false),
            Field::new("zip", DataType::Utf8, false),
            Field::new("phone", DataType::Utf8, false),
            Field::new("network_status", category_type(), false),
            Field::new("years_experience", DataType::UInt16, false),
            Field::new("credentials", category_type(), false),
            Field::new("average_patients_per_day", DataType::UInt16, false),
        ]))
    }

    fn to_batch(rows: &[Self], status: StatusFormat) -> anyhow::Result<RecordBatch> {
        let columns = vec![
            text(rows, |p| p.provider_id.as_str()),
            text(rows, |p| p.provider_name.as_str()),
            text(rows, |p| p.npi.as_str()),
            category(rows, |p| p.specialty.name),
            amounts(rows, Provider::specialty_multiplier),
            category(rows, |p| p.facility_name.as_str()),
            text(rows, |p| p.address.as_str()),
            text(rows, |p| p.city.as_str()),
            category(rows, |p| p.state.as_str()),
            text(rows, |p| p.zip.as_str()),
            text(rows, |p| p.phone.as_str()),
            category(rows, |p| p.network_status.as_str()),
            small_counts(rows, |p| p.years_experience),
            category(rows, |p| p.credentials),
            small_counts(rows, |p| p.average_patients_per_day),
        ];
        Ok(RecordBatch::try_new(Self::schema(status), columns)?)
    }
}

impl Tabular for Payer {
    const TABLE: &'static str = "payers";

    fn schema(_status: StatusFormat) -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("payer_id", DataType::Utf8, false),
            Field::new("payer_name", DataType::Utf8, false),
            Field::new("payer_type", category_type(), false),
            Field::new("payer_denial_modifier", DataType::Float64, false),
            Field::new("average_processing_days", DataType::UInt16, false),
            Field::new("electronic_claim_submission", DataType::Boolean, false),
            Field::new("prior_auth_required_procedures", DataType::Utf8, true),
            Field::new("base_denial_rate", DataType::Float64, false),
            Field::new("average_reimbursement_rate", DataType::Float64, false),
            Field::new("timely_filing_limit_days", DataType::UInt16, false),
            Field::new("appeal_timeframe_days", DataType::UInt16, false),
            Field::new("contact_phone", DataType::Utf8, false),
            Field::new("website", DataType::Utf8, false),
        ]))
    }

    fn to_batch(rows: &[Self], status: StatusFormat) -> anyhow::Result<RecordBatch> {
        let columns = vec![
            text(rows, |p| p.payer_id.as_str()),
            text(rows, |p| p.payer_name),
            category(rows, |p| p.payer_type.as_str()),
            amounts(rows, |p| p.denial_multiplier),
            small_counts(rows, |p| p.average_processing_days),
            flags(rows, |p| p.electronic_claim_submission),
            nullable_text(rows, |p| joined(&p.prior_auth_procedures)),
            amounts(rows, |p| p.base_denial_rate),
            amounts(rows, |p| p.average_reimbursement_rate),
            small_counts(rows, |p| p.timely_filing_limit_days),
            small_counts(rows, |p| p.appeal_timeframe_days),
            text(rows, |p| p.contact_phone.as_str()),
            text(rows, |p| p.website.as_str()),
        ];
        Ok(RecordBatch::try_new(Self::schema(status), columns)?)
    }
}

fn status_type(status: StatusFormat) -> DataType {
    match status {
        StatusFormat::Numeric => DataType::Int8,
        StatusFormat::Boolean => DataType::Boolean,
        StatusFormat::Text => DataType::Utf8,
    }
}

fn status_column(claims: &[Claim], status: StatusFormat) -> ArrayRef {
    match status {
        StatusFormat::Numeric => codes(claims, |c| i8::from(c.is_denied())),
        StatusFormat::Boolean => flags(claims, Claim::is_denied),
        StatusFormat::Text => text(claims, |c| match c.status() {
            ClaimStatus::Approved => "APPROVED",
            ClaimStatus::Denied => "DENIED",
        }),
    }
}

impl Tabular for Claim {
    const TABLE: &'static str = "claims";

    fn schema(status: StatusFormat) -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("claim_id", DataType::Utf8, false),
            Field::new("patient_id", DataType::Utf8, false),
            Field::new("provider_id", DataType::Utf8, false),
            Field::new("payer_id", category_type(), false),
            Field::new("service_date", DataType::Date32, false),
            Field::new("submission_date", DataType::Date32, false),
            Field::new("processing_date", DataType::Date32, false),
            Field::new("primary_diagnosis_code", category_type(), false),
            Field::new("primary_diagnosis_description", category_type(), true),
            Field::new("secondary_diagnosis_code", category_type(), true),
            Field::new("secondary_diagnosis_description", category_type(), true),
            Field::new("procedure_code", category_type(), false),
            Field::new("procedure_description", category_type(), true),
            Field::new("revenue_code", category_type(), true),
            Field::new("revenue_description", category_type(), true),
            Field::new("place_of_service_code", category_type(), false),
            Field::new("place_of_service_description", category_type(), true),
            Field::new("prior_auth_required", DataType::Boolean, false),
            Field::new("prior_auth_obtained", DataType::Boolean, false),
            Field::new("charge_amount", DataType::Float64, false),
            Field::new("claim_status", status_type(status), false),
            Field::new("denial_reason_code", category_type(), true),
            Field::new("denial_reason_description", category_type(), true),
            Field::new("denial_reason_category", category_type(), true),
            Field::new("payment_amount", DataType::Float64, true),
            Field::new("patient_responsibility", DataType::Float64, false),
            Field::new("claim_frequency", DataType::Int8, false),
            Field::new("days_to_payment", DataType::Int16, true),
        ]))
    }

    fn to_batch(rows: &[Self], status: StatusFormat) -> anyhow::Result<RecordBatch> {
        let days_to_payment = rows
            .iter()
            .map(|c| c.days_to_payment().map(i16::try_from).transpose())
            .collect::<Result<Int16Array, _>>()?;

        let columns = vec![
            text(rows, |c| c.claim_id.as_str()),
            text(rows, |c| c.patient_id.as_str()),
            text(rows, |c| c.provider_id.as_str()),
            category(rows, |c| c.payer_id.as_str()),
            dates(rows, |c| c.service_date),
            dates(rows, |c| c.submission_date),
            dates(rows, |c| c.processing_date),
            category(rows, |c| c.primary_diagnosis_code),
            nullable_category(rows, |c| catalog::diagnosis_description(c.primary_diagnosis_code)),
            nullable_category(rows, |c| c.secondary_diagnosis_code),
            nullable_category(rows, |c| {
                c.secondary_diagnosis_code
                    .and_then(catalog::diagnosis_description)
            }),
            category(rows, |c| c.procedure_code),
            nullable_category(rows, |c| catalog::procedure_description(c.procedure_code)),
            nullable_category(rows, |c| c.revenue_code),
            nullable_category(rows, |c| c.revenue_code.and_then(catalog::revenue_description)),
            category(rows, |c| c.place_of_service_code),
            nullable_category(rows, |c| {
                catalog::place_of_service_description(c.place_of_service_code)
            }),
            flags(rows, |c| c.prior_auth_required),
            flags(rows, |c| c.prior_auth_obtained),
            amounts(rows, |c| c.charge_amount),
            status_column(rows, status),
            nullable_category(rows, |c| c.denial_reason().map(|r| r.code)),
            nullable_category(rows, |c| c.denial_reason().map(|r| r.description)),
            nullable_category(rows, |c| c.denial_reason().map(|r| r.category.as_str())),
            nullable_amounts(rows, Claim::payment_amount),
            amounts(rows, |c| c.patient_responsibility),
            codes(rows, |c| c.claim_frequency as i8),
            Arc::new(days_to_payment) as ArrayRef,
        ];
        Ok(RecordBatch::try_new(Self::schema(status), columns)?)
    }
}
