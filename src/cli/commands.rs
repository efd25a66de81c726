//! CLI command definitions and handlers.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::{load_settings, Credentials, Settings};
use crate::scrapers::client_from_settings;
use crate::services::{harvest_openapi, harvest_portal_pdfs, DownloadEvent};
use crate::session::Session;
use crate::specs::{
    enrich_spec, extract_fields, known_spec, parse_openapi_file, spec_from_pdf_name, EntitySpec,
    PdfTextExtractor, PdftotextExtractor,
};
use crate::storage::LocalStore;
use crate::tools::{ToolDispatcher, RESOURCE_STATUS};

#[derive(Parser)]
#[command(name = "yaizu")]
#[command(about = "Yaizu smart-city API catalog scraper and spec store")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Data directory (overrides config file)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape the API catalog and save it locally
    Scrape,

    /// List saved documents
    List,

    /// Search saved catalog entries by keyword
    Search {
        /// Keyword matched against name, description and category
        keyword: String,
    },

    /// Show a saved document or catalog entry
    Show {
        /// Document name or API name
        name: String,
    },

    /// Query entities from the NGSI data plane
    Query {
        /// Entity type, e.g. Aed
        entity_type: String,
        /// Extra query parameters as a JSON object
        #[arg(short, long)]
        params: Option<String>,
        /// Maximum entities to return (1-1000)
        #[arg(short, long, default_value = "10")]
        limit: u32,
    },

    /// Print usage examples for an entity type
    Command {
        /// Entity type with a saved spec
        entity_type: String,
    },

    /// Download the PDFs linked from the documentation portal
    HarvestPdfs,

    /// Generate entity specs from the PDF links in the OpenAPI YAML files
    HarvestOpenapi {
        /// Write specs without downloading the PDFs
        #[arg(long)]
        no_download: bool,
    },

    /// Write the built-in entity specs that are not saved yet
    KnownSpecs,

    /// Add field hints from a PDF's text to its entity spec
    Enrich {
        /// PDF file; its stem is the entity type
        pdf: PathBuf,
    },

    /// Print the endpoints of an OpenAPI YAML file
    OpenapiSummary {
        /// OpenAPI YAML file
        yaml: PathBuf,
    },

    /// Read a resource (yaizu://api-docs, yaizu://disaster-apis, yaizu://status)
    Resource {
        uri: String,
    },

    /// Show store status
    Status,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = load_settings(cli.config.as_deref()).await?;
    if let Some(data_dir) = cli.data_dir {
        settings.set_data_dir(data_dir);
    }
    settings.ensure_directories()?;

    let credentials = Credentials::from_env();
    let store = LocalStore::open(&settings.specs_dir)?;

    match cli.command {
        Commands::Scrape => cmd_scrape(&settings, &credentials, &store).await,
        Commands::List => print_tool(&settings, &credentials, &store, |t| t.list_saved_documents()),
        Commands::Search { keyword } => {
            print_tool(&settings, &credentials, &store, |t| t.search_documents(&keyword))
        }
        Commands::Show { name } => {
            print_tool(&settings, &credentials, &store, |t| t.get_document_details(&name))
        }
        Commands::Query {
            entity_type,
            params,
            limit,
        } => {
            let params = params.as_deref();
            cmd_query(&settings, &credentials, &store, &entity_type, params, limit).await
        }
        Commands::Command { entity_type } => print_tool(&settings, &credentials, &store, |t| {
            t.generate_api_command(&entity_type)
        }),
        Commands::HarvestPdfs => cmd_harvest_pdfs(&settings, &credentials).await,
        Commands::HarvestOpenapi { no_download } => {
            cmd_harvest_openapi(&settings, &store, !no_download).await
        }
        Commands::KnownSpecs => cmd_known_specs(&store),
        Commands::Enrich { pdf } => cmd_enrich(&store, &pdf).await,
        Commands::OpenapiSummary { yaml } => cmd_openapi_summary(&yaml),
        Commands::Resource { uri } => {
            print_tool(&settings, &credentials, &store, |t| t.resource(&uri))
        }
        Commands::Status => {
            print_tool(&settings, &credentials, &store, |t| t.resource(RESOURCE_STATUS))
        }
    }?;

    store.close();
    Ok(())
}

fn print_tool<F>(
    settings: &Settings,
    credentials: &Credentials,
    store: &LocalStore,
    f: F,
) -> anyhow::Result<()>
where
    F: FnOnce(&ToolDispatcher<'_>) -> String,
{
    let tools = ToolDispatcher::new(store, settings, credentials);
    println!("{}", f(&tools));
    Ok(())
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(template);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message.to_string());
    pb
}

/// Print download events above the spinner until the sender side closes.
fn spawn_event_printer(
    pb: ProgressBar,
) -> (mpsc::UnboundedSender<DownloadEvent>, JoinHandle<()>) {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<DownloadEvent>();
    let handle = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                DownloadEvent::Started { filename, .. } => {
                    pb.set_message(format!("Downloading {}", filename));
                }
                DownloadEvent::Skipped { path, .. } => {
                    pb.println(format!(
                        "{} Already downloaded: {}",
                        style("-").dim(),
                        path.display()
                    ));
                }
                DownloadEvent::Completed { path, size, .. } => {
                    pb.println(format!(
                        "{} {} ({:.1} KB)",
                        style("✓").green(),
                        path.display(),
                        size as f64 / 1024.0
                    ));
                }
                DownloadEvent::NotPdf { url, content_type } => {
                    pb.println(format!(
                        "{} Not a PDF ({}): {}",
                        style("!").yellow(),
                        content_type.as_deref().unwrap_or("unknown"),
                        url
                    ));
                }
                DownloadEvent::Failed { url, error } => {
                    pb.println(format!(
                        "{} Failed to download {}: {}",
                        style("✗").red(),
                        url,
                        error
                    ));
                }
            }
        }
    });
    (event_tx, handle)
}

async fn finish_events(pb: &ProgressBar, handle: JoinHandle<()>) {
    if let Err(e) = handle.await {
        tracing::warn!("Event printer task failed: {}", e);
    }
    pb.finish_and_clear();
}

async fn cmd_scrape(
    settings: &Settings,
    credentials: &Credentials,
    store: &LocalStore,
) -> anyhow::Result<()> {
    let pb = spinner("Scraping the API catalog...");
    let tools = ToolDispatcher::new(store, settings, credentials);
    let output = tools.scrape_catalog().await;
    pb.finish_and_clear();
    println!("{}", output);
    Ok(())
}

async fn cmd_query(
    settings: &Settings,
    credentials: &Credentials,
    store: &LocalStore,
    entity_type: &str,
    params: Option<&str>,
    limit: u32,
) -> anyhow::Result<()> {
    let pb = spinner(&format!("Querying {} entities...", entity_type));
    let tools = ToolDispatcher::new(store, settings, credentials);
    let output = tools.execute_typed_query(entity_type, params, limit).await;
    pb.finish_and_clear();
    println!("{}", output);
    Ok(())
}

async fn cmd_harvest_pdfs(settings: &Settings, credentials: &Credentials) -> anyhow::Result<()> {
    let client = client_from_settings(settings)?;
    let mut session = Session::new(credentials.clone());

    let pb = spinner("Logging in to the documentation portal...");
    let (event_tx, handle) = spawn_event_printer(pb.clone());
    let result = harvest_portal_pdfs(&mut session, &client, settings, Some(event_tx)).await;
    finish_events(&pb, handle).await;
    let report = result?;

    if !report.authenticated {
        println!(
            "{} Documentation portal login failed; check YAIZU_API_EMAIL and YAIZU_API_PASSWORD",
            style("✗").red()
        );
        return Ok(());
    }

    println!(
        "{} Harvested {} APIs: {}/{} documents, {} failed",
        style("✓").green(),
        report.apis.len(),
        report.summary.success,
        report.summary.total,
        report.summary.failed
    );
    println!(
        "  {} files written ({:.1} KB) to {}",
        report.summary.downloaded.len(),
        report.summary.total_size_kb(),
        settings.documentation_dir.display()
    );
    Ok(())
}

async fn cmd_harvest_openapi(
    settings: &Settings,
    store: &LocalStore,
    download: bool,
) -> anyhow::Result<()> {
    let client = client_from_settings(settings)?;

    let pb = spinner("Reading OpenAPI files...");
    let (event_tx, handle) = spawn_event_printer(pb.clone());
    let result = harvest_openapi(settings, &client, store, download, Some(event_tx)).await;
    finish_events(&pb, handle).await;
    let report = result?;

    if report.files.is_empty() {
        println!(
            "{} No OpenAPI YAML files in {}",
            style("!").yellow(),
            settings.openapi_dir.display()
        );
        return Ok(());
    }

    for file in &report.files {
        println!(
            "  {} {}: {}/{} specs",
            style("→").cyan(),
            file.yaml_file,
            file.processed,
            file.links
        );
    }
    if download {
        println!(
            "  Downloads: {}/{} succeeded, {:.1} KB",
            report.downloads.success,
            report.downloads.total,
            report.downloads.total_size_kb()
        );
    }
    println!(
        "{} Generated {} entity specs in {}",
        style("✓").green(),
        report.index.total_models,
        store.dir().display()
    );
    Ok(())
}

fn cmd_known_specs(store: &LocalStore) -> anyhow::Result<()> {
    let (index, written) = crate::specs::write_known_specs(store)?;
    for entity_type in &written {
        println!("  {} {}", style("+").green(), entity_type);
    }
    println!(
        "{} Wrote {} new specs; manifest lists {} models",
        style("✓").green(),
        written.len(),
        index.data_models.len()
    );
    Ok(())
}

/// Saved spec for `entity_type`, else the built-in one, else one inferred
/// from the file name.
fn spec_for_enrichment(store: &LocalStore, entity_type: &str, filename: &str) -> EntitySpec {
    if let Ok(spec) = store.load_as::<EntitySpec>(entity_type) {
        return spec;
    }
    known_spec(entity_type).unwrap_or_else(|| spec_from_pdf_name(entity_type, filename))
}

async fn cmd_enrich(store: &LocalStore, pdf: &Path) -> anyhow::Result<()> {
    let Some(entity_type) = pdf.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
        anyhow::bail!("{} has no file name", pdf.display());
    };
    let filename = pdf
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| entity_type.clone());

    let text = PdftotextExtractor.extract_text(pdf).await?;
    let fields = extract_fields(&text);
    if fields.is_empty() {
        println!(
            "{} No field hints found in {}",
            style("!").yellow(),
            pdf.display()
        );
        return Ok(());
    }

    let mut spec = spec_for_enrichment(store, &entity_type, &filename);
    let added = enrich_spec(&mut spec, &fields);
    store.save_as(&entity_type, &spec)?;
    println!(
        "{} {}: {} fields found, {} added",
        style("✓").green(),
        entity_type,
        fields.len(),
        added
    );
    Ok(())
}

fn cmd_openapi_summary(yaml: &Path) -> anyhow::Result<()> {
    let summary = parse_openapi_file(yaml)?;
    println!(
        "{} (OpenAPI {})",
        style(&summary.title).bold(),
        summary.openapi_version
    );
    println!("Base URL: {}", summary.base_url);
    println!();

    if summary.endpoints.is_empty() {
        println!("No endpoints defined.");
        return Ok(());
    }
    for endpoint in &summary.endpoints {
        println!(
            "  {:<7} {:<40} {}",
            style(&endpoint.method).cyan(),
            endpoint.path,
            endpoint.summary
        );
        let params = &endpoint.parameters;
        if !params.required_params.is_empty() {
            println!("          required: {}", params.required_params.join(", "));
        }
        if !params.optional_params.is_empty() {
            println!("          optional: {}", params.optional_params.join(", "));
        }
    }
    println!();
    println!("{} endpoints", summary.endpoints.len());
    Ok(())
}
