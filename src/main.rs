use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use photo_fields::core::bulk::BulkEditor;
use photo_fields::core::{adapter, catalog, formats};
use photo_fields::models::{FieldEdit, Namespace, OperationSummary, ProgressEvent, SemanticField};
use photo_fields::{MetadataRecord, RawStore, StoreConfig};

#[derive(Parser, Debug)]
#[command(
    name = "photo-fields",
    version,
    about = "Read and edit photo metadata as semantic fields kept consistent across Exif, IPTC and XMP"
)]
struct Cli {
    /// Path to a JSON store config (defaults are used when absent)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Only write the sidecar, never the image itself
    #[arg(long, global = true)]
    no_embed: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print semantic fields of one image
    Get {
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Fields to print (all when omitted)
        #[arg(short, long = "field", value_name = "FIELD")]
        fields: Vec<SemanticField>,
    },
    /// Set a field on images or directories of images
    Set {
        field: SemanticField,
        value: String,
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,
    },
    /// Remove a field from images or directories of images
    Delete {
        field: SemanticField,
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,
    },
    /// Print every raw tag of one image by namespace
    Dump {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
    /// Write the default config to the --config path and exit
    InitConfig,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    if let Command::InitConfig = cli.command {
        let path = cli
            .config
            .as_deref()
            .context("--config is required for init-config")?;
        StoreConfig::default()
            .save(path)
            .context("Failed to write config file")?;
        println!("Default config written to {}", path.display());
        return Ok(());
    }

    let mut config = match cli.config.as_deref() {
        Some(path) => StoreConfig::load(path).context("Failed to load config file")?,
        None => StoreConfig::default(),
    };
    if cli.no_embed {
        config.embed_exif = false;
        config.embed_xmp = false;
    }

    match cli.command {
        Command::Get { path, fields } => print_fields(&path, &fields, config),
        Command::Set { field, value, paths } => {
            let value = field.parse_value(&value)?;
            run_bulk(&paths, &[FieldEdit::set(field, value)], &config)
        }
        Command::Delete { field, paths } => run_bulk(&paths, &[FieldEdit::delete(field)], &config),
        Command::Dump { path } => dump_tags(&path, config),
        Command::InitConfig => Ok(()),
    }
}

fn print_fields(path: &Path, fields: &[SemanticField], config: StoreConfig) -> Result<()> {
    let record = MetadataRecord::open_with_config(path, config)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let all = SemanticField::ALL;
    let fields = if fields.is_empty() {
        &all[..]
    } else {
        fields
    };

    for field in fields {
        match record.get_field(*field) {
            Ok(Some(value)) => println!("{field}: {value}"),
            Ok(None) => {}
            Err(err) => log::error!("{field}: {err}"),
        }
    }
    if record.has_geotag() {
        log::debug!("{} is geotagged", path.display());
    }
    Ok(())
}

fn run_bulk(paths: &[PathBuf], edits: &[FieldEdit], config: &StoreConfig) -> Result<()> {
    let images = formats::collect_images(paths);
    if images.is_empty() {
        anyhow::bail!("No supported image files found in the specified paths.");
    }

    let (progress_tx, progress_rx) = mpsc::channel::<ProgressEvent>();
    let reporter = thread::spawn(move || {
        for event in progress_rx {
            log::info!("{}", progress_line(&event));
        }
    });

    let results = BulkEditor::apply(&images, edits, config, progress_tx);
    let _ = reporter.join();

    for result in results.iter().filter(|result| !result.success) {
        log::error!(
            "{}: {}",
            result.path.display(),
            result.error.as_deref().unwrap_or("unknown error")
        );
    }

    let summary = OperationSummary::from_results(images.len(), &results);
    println!(
        "{} file(s): {} changed, {} unchanged, {} failed",
        summary.total,
        summary.changed,
        summary.succeeded - summary.changed,
        summary.failed
    );

    if summary.failed > 0 {
        anyhow::bail!("{} file(s) could not be edited", summary.failed);
    }
    Ok(())
}

fn progress_line(event: &ProgressEvent) -> String {
    let status = if event.success { "ok" } else { "failed" };
    format!(
        "[{}/{}] {}: {status}",
        event.current, event.total, event.filename
    )
}

fn dump_tags(path: &Path, config: StoreConfig) -> Result<()> {
    let record = MetadataRecord::open_with_config(path, config)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let store = record.store();

    for namespace in Namespace::ALL {
        let tags = store.keys(namespace);
        if tags.is_empty() {
            continue;
        }

        println!("[{namespace}]");
        for tag in tags {
            let value = match adapter::read_tag(store, &tag) {
                Ok(Some(value)) => value.to_string(),
                Ok(None) => continue,
                Err(err) => format!("<{err}>"),
            };
            let fields = catalog::fields_for(&tag)
                .iter()
                .map(|field| field.as_str())
                .collect::<Vec<_>>();
            if fields.is_empty() {
                println!("  {tag} = {value}");
            } else {
                println!("  {tag} = {value}  ({})", fields.join(", "));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_line_reports_position_and_status() {
        let event = ProgressEvent {
            current: 2,
            total: 5,
            filename: String::from("IMG_0002.jpg"),
            success: false,
        };
        assert_eq!(progress_line(&event), "[2/5] IMG_0002.jpg: failed");
    }

    #[test]
    fn reporter_thread_drains_typed_channel() {
        let (tx, rx) = mpsc::channel::<ProgressEvent>();
        let reporter = thread::spawn(move || {
            rx.iter()
                .map(|event| progress_line(&event))
                .collect::<Vec<_>>()
        });

        tx.send(ProgressEvent {
            current: 1,
            total: 1,
            filename: String::from("a.jpg"),
            success: true,
        })
        .expect("reporter should be listening");
        drop(tx);

        let lines = reporter.join().expect("reporter should not panic");
        assert_eq!(lines, vec![String::from("[1/1] a.jpg: ok")]);
    }
}
