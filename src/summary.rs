use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use anyhow::{Context, anyhow};
use arrow::array::{Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::catalog::DenialCategory;
use crate::config::StatusFormat;
use crate::schema::Claim;

/// Denial counts over a set of claims.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DenialSummary {
    pub total: u64,
    pub denied: u64,
    pub by_category: BTreeMap<DenialCategory, u64>,
}

impl DenialSummary {
    pub fn observe(&mut self, claim: &Claim) {
        self.total += 1;
        if let Some(reason) = claim.denial_reason() {
            self.denied += 1;
            *self.by_category.entry(reason.category).or_default() += 1;
        }
    }

    pub fn observe_all(&mut self, claims: &[Claim]) {
        claims.iter().for_each(|claim| self.observe(claim));
    }

    pub fn denial_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.denied as f64 / self.total as f64
    }

    /// Share of denied claims per category; every category is present.
    pub fn category_shares(&self) -> BTreeMap<DenialCategory, f64> {
        DenialCategory::ALL
            .into_iter()
            .map(|category| {
                let count = self.by_category.get(&category).copied().unwrap_or(0);
                let share = if self.denied == 0 {
                    0.0
                } else {
                    count as f64 / self.denied as f64
                };
                (category, share)
            })
            .collect()
    }

    /// Recomputes the summary from a written claims parquet file.
    pub fn scan_parquet(path: &Path, status: StatusFormat) -> anyhow::Result<Self> {
        let file =
            File::open(path).with_context(|| format!("Failed opening {}", path.display()))?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)
            .with_context(|| format!("Failed reading parquet metadata of {}", path.display()))?
            .build()?;

        let mut summary = Self::default();
        for batch in reader {
            let batch = batch.with_context(|| format!("Failed reading {}", path.display()))?;
            let statuses = text_column(&batch, "claim_status")?;
            let categories = text_column(&batch, "denial_reason_category")?;
            let statuses = as_strings(&statuses, "claim_status")?;
            let categories = as_strings(&categories, "denial_reason_category")?;

            for row in 0..batch.num_rows() {
                summary.total += 1;
                if statuses.is_null(row) || !status.is_denied_token(statuses.value(row)) {
                    continue;
                }
                summary.denied += 1;
                if categories.is_valid(row) {
                    let category = DenialCategory::parse(categories.value(row)).ok_or_else(|| {
                        anyhow!("unknown denial category `{}`", categories.value(row))
                    })?;
                    *summary.by_category.entry(category).or_default() += 1;
                }
            }
        }
        Ok(summary)
    }
}

/// The named column rendered as text, whatever its stored encoding.
fn text_column(batch: &RecordBatch, name: &str) -> anyhow::Result<arrow::array::ArrayRef> {
    let column = batch
        .column_by_name(name)
        .ok_or_else(|| anyhow!("column `{name}` is missing"))?;
    Ok(cast(column, &DataType::Utf8)?)
}

fn as_strings<'a>(column: &'a arrow::array::ArrayRef, name: &str) -> anyhow::Result<&'a StringArray> {
    column
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| anyhow!("column `{name}` did not cast to text"))
}
