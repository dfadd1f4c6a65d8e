use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use catalog::{AlgorithmRegistry, SampleCatalog};
use clap::{ArgGroup, Parser, Subcommand};
use layers::LayerSelector;
use session::{ComparisonRequest, ExportOutcome, Workbench};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod http;
mod report;

use config::ClientConfig;
use http::HttpComparisonService;

#[derive(Parser, Debug)]
#[command(author, version, about = "Compare line simplification algorithms side by side")]
struct Args {
    /// Simplification service root (default: SHAPESHIFTER_API_URL or http://localhost:5000/api)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the sample datasets the service can load
    Samples,

    /// List the simplification algorithms
    Algorithms,

    /// Load a dataset, simplify it with one or two algorithms and report the result
    Compare(CompareArgs),
}

#[derive(clap::Args, Debug)]
#[command(group(ArgGroup::new("source").required(true).args(["sample", "upload"])))]
struct CompareArgs {
    /// Sample dataset id (see `samples`)
    #[arg(long)]
    sample: Option<String>,

    /// Zipped shapefile to upload
    #[arg(long)]
    upload: Option<PathBuf>,

    /// Algorithm id; pass once or twice. Pick order decides the slot.
    #[arg(short, long = "algorithm", required = true)]
    algorithms: Vec<String>,

    /// Largest tolerance in the series
    #[arg(long)]
    end: Option<f64>,

    /// Distance between tolerance levels
    #[arg(long)]
    step: Option<f64>,

    /// Tolerance level to show, by index
    #[arg(long, conflicts_with = "tolerance")]
    tolerance_index: Option<usize>,

    /// Tolerance level to show, by value
    #[arg(long)]
    tolerance: Option<f64>,

    /// Compute and print point counts, positional errors and perimeter
    #[arg(long)]
    metrics: bool,

    /// Turn the basemap on
    #[arg(long)]
    basemap: bool,

    /// Turn the attribute panel on
    #[arg(long)]
    attributes: bool,

    /// Export a layer as a zipped shapefile: original, slot1 or slot2
    #[arg(long, value_name = "LAYER")]
    export: Option<LayerSelector>,

    /// Output directory for exports
    #[arg(long, default_value = ".")]
    out: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = ClientConfig::from_env();
    if let Some(url) = args.api_url {
        config.api_url = url.trim_end_matches('/').to_string();
    }
    if let Some(secs) = args.timeout_secs {
        config.timeout = Duration::from_secs(secs);
    }
    config.log_json |= args.log_json;
    init_tracing(config.log_json);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.command {
        Command::Samples => report::write_samples(&mut out, &SampleCatalog::builtin())?,
        Command::Algorithms => report::write_algorithms(&mut out, &AlgorithmRegistry::builtin())?,
        Command::Compare(compare_args) => compare(&config, &compare_args, &mut out).await?,
    }
    out.flush()?;

    Ok(())
}

fn init_tracing(json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn compare(
    config: &ClientConfig,
    args: &CompareArgs,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let service = HttpComparisonService::new(config).context("building HTTP client")?;
    info!("using simplification service at {}", config.api_url);
    let wb = Workbench::new(service).with_max_levels(config.max_levels);

    let result = run_compare(&wb, config, args).await;
    report::write_notifications(&mut io::stderr().lock(), &wb.drain_notifications())?;
    result?;

    report::write_comparison(out, &wb.session())?;
    Ok(())
}

async fn run_compare(
    wb: &Workbench<HttpComparisonService>,
    config: &ClientConfig,
    args: &CompareArgs,
) -> anyhow::Result<()> {
    match (&args.sample, &args.upload) {
        (Some(id), _) => {
            wb.load_sample(id).await?;
        }
        (None, Some(path)) => {
            let bytes =
                std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();
            wb.upload(file_name, bytes).await?;
        }
        (None, None) => bail!("either --sample or --upload is required"),
    }

    let request = ComparisonRequest::new(
        args.end.unwrap_or(config.tolerance_end),
        args.step.unwrap_or(config.tolerance_step),
        args.algorithms.iter().cloned(),
    );
    wb.simplify(&request).await?;

    if let Some(index) = args.tolerance_index {
        wb.set_tolerance_index(index)?;
    } else if let Some(value) = args.tolerance {
        wb.select_tolerance_value(value)?;
    }
    if args.basemap {
        wb.toggle_basemap()?;
    }
    if args.attributes {
        wb.toggle_attribute_panel()?;
    }
    if args.metrics {
        wb.show_metrics().await?;
    }

    if let Some(selector) = args.export {
        if let ExportOutcome::Ready(artifact) = wb.export(selector).await? {
            let path = artifact
                .write_to(&args.out)
                .with_context(|| format!("writing export into {}", args.out.display()))?;
            info!("exported {} to {}", artifact.selector, path.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Args, Command};
    use clap::Parser;
    use layers::LayerSelector;

    #[test]
    fn compare_parses_two_algorithms_in_order() {
        let args = Args::try_parse_from([
            "shapeshifter",
            "compare",
            "--sample",
            "hungary",
            "-a",
            "Lang",
            "--algorithm",
            "Visvaligam-Whyatt",
            "--export",
            "slot2",
        ])
        .expect("parse");
        let Command::Compare(c) = args.command else {
            panic!("expected compare");
        };
        assert_eq!(c.algorithms, vec!["Lang", "Visvaligam-Whyatt"]);
        assert_eq!(c.export, Some(LayerSelector::SLOT2));
    }

    #[test]
    fn compare_requires_exactly_one_source() {
        assert!(Args::try_parse_from(["shapeshifter", "compare", "-a", "Lang"]).is_err());
        assert!(Args::try_parse_from([
            "shapeshifter",
            "compare",
            "--sample",
            "hungary",
            "--upload",
            "roads.zip",
            "-a",
            "Lang",
        ])
        .is_err());
    }

    #[test]
    fn tolerance_index_and_value_conflict() {
        let parsed = Args::try_parse_from([
            "shapeshifter",
            "compare",
            "--sample",
            "hungary",
            "-a",
            "Lang",
            "--tolerance-index",
            "2",
            "--tolerance",
            "0.1",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let args = Args::try_parse_from(["shapeshifter", "samples", "--api-url", "http://x/api"])
            .expect("parse");
        assert_eq!(args.api_url.as_deref(), Some("http://x/api"));
        assert!(matches!(args.command, Command::Samples));
    }
}
