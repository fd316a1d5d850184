//! Run orchestration: reference entities first, then patients and claims
//! streamed chunk by chunk to the sinks.
//!
//! Chunks are generated on the blocking pool, at most `workers` at a time,
//! and handed to a single writer task in chunk order over a bounded channel.
//! Each chunk draws from its own random stream, so the written files depend on
//! the seed and chunk size only.

use std::ops::Range;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, bail};
use futures::{StreamExt, stream};
use rand_chacha::ChaCha8Rng;
use tokio::sync::mpsc;
use tokio::task;
use tracing::info;

use crate::config::{Config, OutputFormat};
use crate::logging::log_chunk_event;
use crate::patient::PatientGenerator;
use crate::random::{Domain, SeedSequence};
use crate::schema::Claim;
use crate::sink::{TableSink, WrittenTable, table_path, write_table};
use crate::summary::DenialSummary;
use crate::synthesizer::ClaimSynthesizer;
use crate::table::Tabular;

/// Sees every chunk on its way to the sink, in order.
pub trait ChunkObserver<T>: Send + 'static {
    fn observe(&mut self, rows: &[T]);
}

impl<T> ChunkObserver<T> for () {
    fn observe(&mut self, _rows: &[T]) {}
}

impl ChunkObserver<Claim> for DenialSummary {
    fn observe(&mut self, rows: &[Claim]) {
        self.observe_all(rows);
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub tables: Vec<WrittenTable>,
    pub summary: DenialSummary,
    pub target_denial_rate: f64,
    pub elapsed: Duration,
}

pub async fn run(config: Config) -> anyhow::Result<RunReport> {
    config.validate()?;
    let started = Instant::now();
    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .with_context(|| format!("Failed creating {}", config.output_dir.display()))?;

    let config = Arc::new(config);
    let seeds = SeedSequence::new(config.seed);

    info!(
        providers = config.num_providers,
        payers = config.num_payers,
        "Generating providers and payers"
    );
    let synthesizer = {
        let config = config.clone();
        task::spawn_blocking(move || ClaimSynthesizer::from_seed(&config, seeds))
            .await
            .context("reference generation task panicked")??
    };
    let synthesizer = Arc::new(synthesizer);

    let mut tables = Vec::with_capacity(4);
    {
        let config = config.clone();
        let synthesizer = synthesizer.clone();
        let written = task::spawn_blocking(move || -> anyhow::Result<Vec<WrittenTable>> {
            Ok(vec![
                write_reference(&config, synthesizer.providers())?,
                write_reference(&config, synthesizer.payers())?,
            ])
        })
        .await
        .context("reference writer task panicked")??;
        tables.extend(written);
    }

    info!(patients = config.num_patients, "Generating patients");
    let patients = PatientGenerator::new(&config)?;
    let (written, ()) = stream_table(
        config.clone(),
        config.num_patients as u64,
        Domain::Patients,
        move |range, rng| patients.generate_chunk(range, rng),
        (),
    )
    .await?;
    tables.push(written);

    info!(claims = config.total_claims(), "Generating claims");
    let claims = synthesizer.clone();
    let (written, summary) = stream_table(
        config.clone(),
        config.total_claims() as u64,
        Domain::Claims,
        move |range, rng| claims.synthesize_chunk(range, rng),
        DenialSummary::default(),
    )
    .await?;
    tables.push(written);

    info!(
        denied = summary.denied,
        total = summary.total,
        rate = summary.denial_rate(),
        "Claims written"
    );

    Ok(RunReport {
        tables,
        summary,
        target_denial_rate: config.target_denial_rate,
        elapsed: started.elapsed(),
    })
}

fn write_reference<T: Tabular>(config: &Config, rows: &[T]) -> anyhow::Result<WrittenTable> {
    let written = write_table(
        rows,
        &config.output_dir,
        &config.output_formats,
        config.status_format,
        config.chunk_size,
    )?;
    info!(table = written.name, rows = written.rows, "Table written");
    Ok(written)
}

/// Generates `total` rows in chunks and writes them to the table's sink.
/// Returns the written table and the observer after it has seen every row.
async fn stream_table<T, F, O>(
    config: Arc<Config>,
    total: u64,
    domain: Domain,
    make: F,
    mut observer: O,
) -> anyhow::Result<(WrittenTable, O)>
where
    T: Tabular,
    F: Fn(Range<u64>, &mut ChaCha8Rng) -> Vec<T> + Send + Sync + 'static,
    O: ChunkObserver<T>,
{
    let seeds = SeedSequence::new(config.seed);
    let chunk_size = config.chunk_size as u64;
    let chunk_count = total.div_ceil(chunk_size);
    let make = Arc::new(make);

    let (tx, mut rx) = mpsc::channel::<(u64, Vec<T>)>(config.workers);

    let writer_config = config.clone();
    let writer = task::spawn_blocking(move || -> anyhow::Result<(WrittenTable, O)> {
        let mut sink = TableSink::<T>::create(
            &writer_config.output_dir,
            &writer_config.output_formats,
            writer_config.status_format,
        )?;
        while let Some((chunk, rows)) = rx.blocking_recv() {
            observer.observe(&rows);
            sink.append(&rows)?;
            log_chunk_event(T::TABLE, chunk, "written", &format!("{} rows", rows.len()));
        }
        let written = sink.finish()?;
        info!(table = written.name, rows = written.rows, "Table written");
        Ok((written, observer))
    });

    let mut chunks = stream::iter(0..chunk_count)
        .map(|chunk| {
            let make = make.clone();
            let start = chunk * chunk_size;
            let end = (start + chunk_size).min(total);
            task::spawn_blocking(move || {
                let mut rng = seeds.rng(domain, chunk);
                let rows = make(start..end, &mut rng);
                log_chunk_event(T::TABLE, chunk, "generated", &format!("rows {start}..{end}"));
                (chunk, rows)
            })
        })
        .buffered(config.workers);

    while let Some(generated) = chunks.next().await {
        let generated = generated.context("chunk generation task panicked")?;
        if tx.send(generated).await.is_err() {
            // The writer stopped early; its error is reported below.
            break;
        }
    }
    drop(tx);

    writer.await.context("writer task panicked")?
}

/// Re-reads the written claims parquet file and checks it against the
/// summary accumulated during the run.
pub fn verify_claims(config: &Config, expected: &DenialSummary) -> anyhow::Result<DenialSummary> {
    if !config.output_formats.contains(&OutputFormat::Parquet) {
        bail!("verification reads the parquet claims file; add parquet to the output formats");
    }
    let path = table_path(&config.output_dir, Claim::TABLE, OutputFormat::Parquet);
    let scanned = DenialSummary::scan_parquet(&path, config.status_format)?;
    if &scanned != expected {
        bail!(
            "{} disagrees with the run: {} of {} denied on disk, {} of {} during generation",
            path.display(),
            scanned.denied,
            scanned.total,
            expected.denied,
            expected.total
        );
    }
    info!(path = %path.display(), "Claims file verified");
    Ok(scanned)
}
