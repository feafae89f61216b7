use clap::Parser;
use listings_geoprocessor::config::{Cli, Config};
use listings_geoprocessor::db::{Database, InMemorySink, KeyedSink, SqliteSink};
use listings_geoprocessor::errors::PipelineError;
use listings_geoprocessor::geocode::{GeocodeClient, OpenCageGeocoder};
use listings_geoprocessor::logging::init_logging;
use listings_geoprocessor::pipeline::{
    CleanedTable, GeoprocessReport, Geoprocessor, ListingWriter, WriteError, WritePolicy,
    WriteReport,
};
use listings_geoprocessor::source::{JsonFileSource, RawRecordSource};
use tracing::{error, info, warn};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::from_env(cli)?;

    let (geo, written) = run(&config)?;

    println!("\n📊 Results for {}:", config.city);
    println!("   Raw rows:          {}", geo.rows_in);
    println!("   Geocode failures:  {}", geo.geocode_failures);
    for (reason, n) in &geo.dropped {
        println!("   Dropped ({reason}): {n}");
    }
    println!("   Committed:         {}", written.committed());
    println!("   Already stored:    {}", written.skipped_existing());
    println!("   Insert failures:   {}", written.skipped_failed());

    Ok(())
}

/// One full pass: load, geoprocess, write.
fn run(config: &Config) -> Result<(GeoprocessReport, WriteReport), PipelineError> {
    let source = JsonFileSource::new(&config.input);
    let raw = source.load()?;
    info!(rows = raw.len(), input = %source.path().display(), "loaded raw listings");

    let geocoder = OpenCageGeocoder::new(
        &config.geocoder_url,
        config.api_key.clone(),
        config.geocode_timeout,
    )?;
    let mut geoprocessor = Geoprocessor::new(GeocodeClient::new(geocoder, config.min_interval));
    let (table, geo_report) = geoprocessor.run(&raw);
    info!(calls = geoprocessor.client().calls(), "geocoding done");
    if table.is_empty() {
        warn!("no listings survived geoprocessing");
    }

    let policy = WritePolicy {
        abort_on_unavailable: config.abort_on_sink_unavailable,
    };

    let write_report = if config.dry_run {
        let (sink, report) = write(InMemorySink::new(), policy, &table)?;
        info!(rows = sink.len(), "dry run, nothing persisted");
        report
    } else {
        let sink = SqliteSink::new(Database::open(&config.db_path)?, &config.city)?;
        let (sink, report) = write(sink, policy, &table)?;
        let stored = sink.row_count()?;
        info!(table = sink.table(), rows = stored, "listings table updated");
        report
    };

    Ok((geo_report, write_report))
}

fn write<S: KeyedSink>(
    sink: S,
    policy: WritePolicy,
    table: &CleanedTable,
) -> Result<(S, WriteReport), WriteError> {
    let mut writer = ListingWriter::new(sink, policy);

    match writer.write_all(table) {
        Ok(report) => Ok((writer.into_sink(), report)),
        Err(e) => {
            if let WriteError::Aborted { report, .. } = &e {
                error!(
                    committed = report.committed(),
                    not_attempted = report.pending(),
                    "write pass aborted"
                );
            }
            Err(e)
        }
    }
}
