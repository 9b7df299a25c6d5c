use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use url::Url;

use jetstream_ingest::config::IngestionConfig;
use jetstream_ingest::connector::StreamConnector;
use jetstream_ingest::ingestion::Ingestor;
use jetstream_ingest::sink::{DatabaseSink, ParquetSink};
use jetstream_ingest::{shutdown, Error, Result};

/// Ingest the Bluesky Jetstream firehose into local analytics storage.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Database file, output directory or object-store URL, depending on --sink.
    output: String,

    /// Storage backend for completed batches.
    #[arg(long, value_enum, default_value_t = SinkKind::Db)]
    sink: SinkKind,

    /// Number of messages to batch before writing.
    #[arg(long, default_value_t = IngestionConfig::DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Websocket endpoint to subscribe to.
    #[arg(long, default_value = IngestionConfig::DEFAULT_ENDPOINT)]
    endpoint: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum SinkKind {
    /// Embedded SQLite database.
    Db,
    /// One parquet file per batch, locally or on object storage.
    Parquet,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        log::error!("fatal error: {err}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let endpoint = Url::parse(&cli.endpoint)?;
    let mut config = IngestionConfig::new(endpoint);
    config.batch_size = cli.batch_size;

    let cancel = CancellationToken::new();
    shutdown::install_signal_handlers(cancel.clone()).map_err(Error::Signal)?;

    let connector = StreamConnector::new(
        config.endpoint.clone(),
        config.reconnect_delay,
        cancel,
    );
    match cli.sink {
        SinkKind::Db => {
            let sink = DatabaseSink::open(&cli.output)?;
            Ingestor::new(connector, sink, config.batch_size).run().await?;
        }
        SinkKind::Parquet => {
            let sink = ParquetSink::open(&cli.output)?;
            Ingestor::new(connector, sink, config.batch_size).run().await?;
        }
    }
    Ok(())
}
