use anyhow::{Context, Result};
use clap::Parser;
use cloudimagedirectory::{
    config, filter, logging,
    pipeline::{self, Filter},
    store::{DocumentStore, FsStore},
};
use std::{path::PathBuf, sync::Arc};

#[derive(Parser)]
#[command(
    name = "cloud-image-directory-transformer",
    about = "Normalize raw cloud image listings and generate the directory indexes"
)]
struct Cli {
    /// Raw input file; may be repeated. Defaults to every JSON file under the origin path.
    #[arg(short = 'f', long = "file")]
    files: Vec<PathBuf>,
    /// Directory the raw documents are read from.
    #[arg(long, default_value = ".")]
    origin_path: PathBuf,
    /// Directory the generated documents are written to. Defaults to the origin path.
    #[arg(long)]
    destination_path: Option<PathBuf>,
    /// Subdirectory of the destination path that receives the generated documents.
    #[arg(short = 'v', long = "output-subdir")]
    output_subdir: Option<PathBuf>,
    /// Drop images dated before this day (`YYYY-MM-DD`); `none` keeps every image.
    #[arg(long = "filter.until", default_value = "none")]
    filter_until: String,
    /// Drop every image whose key contains this word; may be repeated.
    #[arg(long = "filter-word")]
    filter_words: Vec<String>,
    /// Entries per index page; overrides `INDEX_PAGE_SIZE`.
    #[arg(long)]
    page_size: Option<usize>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    config::init_config().context("failed to load configuration")?;
    logging::init_tracing();

    let mut config = config::get_config().clone();
    if let Some(page_size) = cli.page_size {
        config.index_page_size = page_size;
    }
    tracing::debug!(
        aws_owner_ids = ?config.aws_owner_ids,
        index_page_size = config.index_page_size,
        aws_mapping_policy = %config.aws_mapping_policy,
        azure_mapping_policy = %config.azure_mapping_policy,
        google_mapping_policy = %config.google_mapping_policy,
        "Loaded configuration"
    );

    let destination = output_destination(&cli);
    let store = FsStore::new(&cli.origin_path)
        .with_destination(&destination)
        .with_files(cli.files);
    let store: Arc<dyn DocumentStore> = Arc::new(store);

    let inputs = store.list().with_context(|| {
        format!(
            "failed to list raw documents under {}",
            cli.origin_path.display()
        )
    })?;
    tracing::info!(documents = inputs.len(), "Listed raw documents");

    let cutoff = filter::parse_cutoff(&cli.filter_until)
        .with_context(|| format!("invalid --filter.until value '{}'", cli.filter_until))?;
    let mut filters: Vec<Filter> = cli
        .filter_words
        .into_iter()
        .map(filter::filter_by_key_word)
        .collect();
    filters.extend(cutoff.map(filter::filter_until));
    let mut pipeline = pipeline::defaults::pipeline(Arc::clone(&store), &config, filters);
    let outputs = pipeline.run(inputs).context("pipeline run failed")?;

    let mut written = 0_usize;
    for doc in outputs.iter().filter(|doc| !doc.is_raw()) {
        store
            .put_content(doc)
            .with_context(|| format!("failed to write {}", doc.key()))?;
        written += 1;
    }

    let metrics = pipeline.metrics_snapshot();
    tracing::info!(
        written,
        images = metrics.images,
        filtered = metrics.filtered,
        indexes = metrics.indexes,
        destination = %destination.display(),
        "Transform complete"
    );
    Ok(())
}

/// Destination path joined with the optional output subdirectory.
fn output_destination(cli: &Cli) -> PathBuf {
    let mut destination = cli
        .destination_path
        .clone()
        .unwrap_or_else(|| cli.origin_path.clone());
    if let Some(subdir) = &cli.output_subdir {
        destination.push(subdir);
    }
    destination
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_subdir_nests_under_destination() {
        let cli = Cli::parse_from([
            "cloud-image-directory-transformer",
            "-f",
            "raw/aws/af-south-1.json",
            "--destination-path",
            "/srv/testdata",
            "-v",
            "output",
            "--filter.until=none",
        ]);
        assert_eq!(output_destination(&cli), PathBuf::from("/srv/testdata/output"));
        assert_eq!(cli.filter_until, "none");
    }

    #[test]
    fn destination_defaults_to_origin() {
        let cli = Cli::parse_from(["cloud-image-directory-transformer", "--origin-path", "data"]);
        assert_eq!(output_destination(&cli), PathBuf::from("data"));

        let cli = Cli::parse_from([
            "cloud-image-directory-transformer",
            "--origin-path",
            "data",
            "-v",
            "output",
        ]);
        assert_eq!(output_destination(&cli), PathBuf::from("data/output"));
    }
}
