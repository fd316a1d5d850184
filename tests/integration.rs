use arrow::array::AsArray;
use arrow::compute::{cast, concat_batches};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use claimsynth::config::{Config, OutputFormat, StatusFormat};
use claimsynth::error::ConfigError;
use claimsynth::pipeline::{run, verify_claims};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::collections::HashSet;
use std::fs::{self, File};
use std::path::Path;
use tempfile::tempdir;

const TABLES: [&str; 4] = ["providers", "payers", "patients", "claims"];

fn small_config(output_dir: &Path) -> Config {
    Config {
        num_patients: 300,
        num_providers: 60,
        num_payers: 6,
        total_claims: Some(2_500),
        chunk_size: 128,
        workers: 3,
        output_dir: output_dir.to_path_buf(),
        ..Config::default()
    }
}

fn read_parquet(path: &Path) -> RecordBatch {
    let file = File::open(path).expect("Failed to open parquet file");
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .unwrap()
        .build()
        .unwrap();
    let batches: Vec<RecordBatch> = reader.map(|b| b.unwrap()).collect();
    concat_batches(&batches[0].schema(), &batches).unwrap()
}

fn strings(batch: &RecordBatch, name: &str) -> Vec<Option<String>> {
    let column = cast(batch.column_by_name(name).unwrap(), &DataType::Utf8).unwrap();
    column
        .as_string::<i32>()
        .iter()
        .map(|v| v.map(str::to_string))
        .collect()
}

fn csv_header(path: &Path) -> Vec<String> {
    let contents = fs::read_to_string(path).unwrap();
    contents
        .lines()
        .next()
        .unwrap()
        .split(',')
        .map(str::to_string)
        .collect()
}

/// Every table lands in both formats, with the requested row counts.
#[tokio::test]
async fn test_run_writes_every_table() {
    let dir = tempdir().unwrap();
    let config = small_config(dir.path());
    let report = run(config.clone()).await.expect("run failed");

    let rows: Vec<(&str, usize)> = report.tables.iter().map(|t| (t.name, t.rows)).collect();
    assert_eq!(
        rows,
        vec![("providers", 60), ("payers", 6), ("patients", 300), ("claims", 2_500)]
    );
    for table in TABLES {
        assert!(dir.path().join(format!("synthetic_{table}.csv")).exists());
        assert!(dir.path().join(format!("synthetic_{table}.parquet")).exists());
    }
    assert_eq!(report.summary.total, 2_500);
}

/// The parquet and CSV files of a table have the same rows and columns.
#[tokio::test]
async fn test_parquet_matches_csv() {
    let dir = tempdir().unwrap();
    let config = small_config(dir.path());
    let report = run(config).await.unwrap();

    for table in &report.tables {
        let csv_path = dir.path().join(format!("synthetic_{}.csv", table.name));
        let parquet = read_parquet(&dir.path().join(format!("synthetic_{}.parquet", table.name)));

        let csv_rows = fs::read_to_string(&csv_path).unwrap().lines().count() - 1;
        assert_eq!(csv_rows, table.rows, "{} csv rows", table.name);
        assert_eq!(parquet.num_rows(), table.rows, "{} parquet rows", table.name);

        let parquet_columns: Vec<String> = parquet
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();
        assert_eq!(csv_header(&csv_path), parquet_columns, "{} columns", table.name);
    }
}

/// Two runs with the same seed write identical files, regardless of worker count.
#[tokio::test]
async fn test_output_is_reproducible_across_worker_counts() {
    let first = tempdir().unwrap();
    let second = tempdir().unwrap();
    let other_seed = tempdir().unwrap();

    run(Config {
        workers: 1,
        ..small_config(first.path())
    })
    .await
    .unwrap();
    run(Config {
        workers: 4,
        ..small_config(second.path())
    })
    .await
    .unwrap();
    run(Config {
        seed: 43,
        ..small_config(other_seed.path())
    })
    .await
    .unwrap();

    for table in TABLES {
        for extension in ["csv", "parquet"] {
            let name = format!("synthetic_{table}.{extension}");
            let a = fs::read(first.path().join(&name)).unwrap();
            let b = fs::read(second.path().join(&name)).unwrap();
            assert!(a == b, "{name} differs between worker counts");
        }
    }
    let a = fs::read(first.path().join("synthetic_claims.csv")).unwrap();
    let c = fs::read(other_seed.path().join("synthetic_claims.csv")).unwrap();
    assert!(a != c, "a different seed should change the claims");
}

/// Claims only reference entities written in the same run.
#[tokio::test]
async fn test_foreign_keys_resolve() {
    let dir = tempdir().unwrap();
    run(small_config(dir.path())).await.unwrap();

    let ids = |table: &str, column: &str| -> HashSet<String> {
        let batch = read_parquet(&dir.path().join(format!("synthetic_{table}.parquet")));
        strings(&batch, column).into_iter().flatten().collect()
    };
    let patients = ids("patients", "patient_id");
    let providers = ids("providers", "provider_id");
    let payers = ids("payers", "payer_id");
    assert_eq!(patients.len(), 300);
    assert_eq!(providers.len(), 60);
    assert_eq!(payers.len(), 6);

    assert!(ids("patients", "insurance_id").is_subset(&payers));
    assert!(ids("claims", "patient_id").is_subset(&patients));
    assert!(ids("claims", "provider_id").is_subset(&providers));
    assert!(ids("claims", "payer_id").is_subset(&payers));
    assert_eq!(ids("claims", "claim_id").len(), 2_500);
}

/// Re-reading the claims file yields the summary computed during the run.
#[tokio::test]
async fn test_verify_matches_run_summary() {
    for status_format in [StatusFormat::Numeric, StatusFormat::Boolean, StatusFormat::Text] {
        let dir = tempdir().unwrap();
        let config = Config {
            status_format,
            ..small_config(dir.path())
        };
        let report = run(config.clone()).await.unwrap();
        let scanned = verify_claims(&config, &report.summary).unwrap();
        assert_eq!(scanned, report.summary);
        assert!(scanned.denied > 0);
    }
}

#[tokio::test]
async fn test_string_status_in_csv() {
    let dir = tempdir().unwrap();
    let config = Config {
        status_format: StatusFormat::Text,
        output_formats: vec![OutputFormat::Csv],
        ..small_config(dir.path())
    };
    let report = run(config.clone()).await.unwrap();
    assert!(!dir.path().join("synthetic_claims.parquet").exists());
    assert!(verify_claims(&config, &report.summary).is_err());

    let contents = fs::read_to_string(dir.path().join("synthetic_claims.csv")).unwrap();
    let denied = contents.lines().filter(|l| l.contains(",DENIED,")).count();
    let approved = contents.lines().filter(|l| l.contains(",APPROVED,")).count();
    assert_eq!(denied + approved, 2_500);
    assert_eq!(denied as u64, report.summary.denied);
}

/// Invalid configurations fail before anything is written.
#[tokio::test]
async fn test_invalid_config_writes_nothing() {
    let dir = tempdir().unwrap();
    let output_dir = dir.path().join("out");
    let config = Config {
        num_payers: 30,
        ..small_config(&output_dir)
    };
    let err = run(config).await.unwrap_err();
    assert_eq!(
        err.downcast_ref::<ConfigError>(),
        Some(&ConfigError::TooManyPayers {
            requested: 30,
            available: 20
        })
    );
    assert!(!output_dir.exists());
}
