use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use clinic_records::synth_data::{make_medical_records, make_prescriptions};
use clinic_records::{
    seed_fixtures, ClinicalRecords, DocumentStore, MemoryStore, MongoStore, SeedPolicy, StoreConfig,
    VitalSigns,
};

/// Create the clinic's record collections and indexes, then load
/// the demonstration data
#[derive(Parser, Debug)]
#[command(name = "clinic_seed")]
struct Args {
    /// YAML store configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// MongoDB connection string, overriding the configuration
    #[arg(long, env = "CLINIC_MONGODB_URI")]
    uri: Option<String>,

    /// Database name, overriding the configuration
    #[arg(long)]
    database: Option<String>,

    /// Use an in-memory store instead of MongoDB (dry run)
    #[arg(long)]
    memory: bool,

    /// Insert the fixtures even if the collections already hold documents
    #[arg(long)]
    force: bool,

    /// Number of synthetic prescriptions and medical records to add
    #[arg(long, default_value_t = 0)]
    synthetic: usize,

    /// Seed for the synthetic data generator
    #[arg(long, default_value_t = 0)]
    global_seed: u64,
}

impl Args {
    fn store_config(&self) -> anyhow::Result<StoreConfig> {
        let mut config = match &self.config {
            Some(path) => StoreConfig::from_path(path)
                .with_context(|| format!("failed to read configuration {}", path.display()))?,
            None => StoreConfig::default(),
        };
        if let Some(uri) = &self.uri {
            config.uri = uri.clone();
        }
        if let Some(database) = &self.database {
            config.database = database.clone();
        }
        Ok(config)
    }

    fn seed_policy(&self) -> SeedPolicy {
        if self.force {
            SeedPolicy::Always
        } else {
            SeedPolicy::IfEmpty
        }
    }
}

/// Log the follow-up visits now in the store, with any out of range
/// lab results and the patient's BMI at the visit
async fn log_follow_ups<S: DocumentStore>(records: &ClinicalRecords<S>) -> anyhow::Result<()> {
    let due = records
        .find_records_needing_follow_up(None)
        .await
        .context("failed to list follow-up visits")?;
    let mut with_abnormal_labs = 0;
    for record in &due {
        let abnormal: Vec<&str> = record
            .abnormal_lab_results()
            .map(|lab_result| lab_result.test_name.as_str())
            .collect();
        if !abnormal.is_empty() {
            with_abnormal_labs += 1;
        }
        let bmi = record
            .vital_signs
            .as_ref()
            .and_then(VitalSigns::body_mass_index);
        debug!(
            patient_id = record.patient_id,
            follow_up_date = ?record.follow_up_date,
            ?abnormal,
            ?bmi,
            "follow-up due"
        );
    }
    info!(follow_ups = due.len(), with_abnormal_labs, "follow-up summary");
    Ok(())
}

async fn bootstrap<S: DocumentStore>(
    records: ClinicalRecords<S>,
    config: &StoreConfig,
    args: &Args,
) -> anyhow::Result<()> {
    records
        .ensure_schema(&config.retry)
        .await
        .context("schema bootstrap failed")?;

    let report = seed_fixtures(&records, args.seed_policy())
        .await
        .context("failed to seed fixtures")?;
    info!(
        prescriptions = report.prescriptions,
        medical_records = report.medical_records,
        "fixtures loaded"
    );

    if args.synthetic > 0 {
        let prescriptions = records
            .insert_prescriptions(make_prescriptions(args.global_seed, args.synthetic))
            .await
            .context("failed to insert synthetic prescriptions")?;
        let medical_records = records
            .insert_medical_records(make_medical_records(args.global_seed, args.synthetic))
            .await
            .context("failed to insert synthetic medical records")?;
        info!(
            global_seed = args.global_seed,
            prescriptions = prescriptions.len(),
            medical_records = medical_records.len(),
            "synthetic documents loaded"
        );
    }

    log_follow_ups(&records).await?;

    let (prescriptions, medical_records) = records.collection_sizes().await?;
    info!(prescriptions, medical_records, "database initialised");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = args.store_config()?;

    if args.memory {
        info!("using in-memory store");
        let records = ClinicalRecords::new(MemoryStore::new(), config.collections.clone());
        return bootstrap(records, &config, &args).await;
    }

    let store = MongoStore::connect(&config.uri, &config.database)
        .await
        .with_context(|| format!("invalid MongoDB connection string {}", config.uri))?;
    store
        .ping()
        .await
        .with_context(|| format!("could not reach MongoDB at {}", config.uri))?;
    info!(database = store.database_name(), "connected to MongoDB");

    let records = ClinicalRecords::new(store, config.collections.clone());
    bootstrap(records, &config, &args).await
}
