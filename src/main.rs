use anyhow::Result;
use clap::Parser;
use navrcut::cli::{Cli, OutputFormat};
use navrcut::session::Session;
use navrcut::{dataset, export, stats};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Print the human-readable summary for --summary and --format text
fn print_summary(session: &Session) {
    let statistics = session.statistics();

    println!("=== Dataset Summary ===");
    println!("Atlas:           {}", session.atlas_id());
    if let Some(metric) = session.metric() {
        println!("Metric:          {}", metric.as_str());
    }
    println!("Structures:      {}", statistics.total_count);
    println!("Valid values:    {}", statistics.valid_count);
    println!("Absent values:   {}", statistics.suppressed_count);
    println!("Mean Cohen's d:  {:.3}", statistics.mean_valid);
    println!(
        "Thresholded:     {}",
        if session.is_thresholded() { "yes" } else { "no" }
    );

    if let Some(refs) = session.references() {
        let mut loaded = Vec::new();
        if refs.cortical_ok {
            loaded.push("cortical");
        }
        if refs.subcortical_ok {
            loaded.push("subcortical");
        }
        println!(
            "NAVR references: {} structures ({})",
            refs.len(),
            loaded.join(", ")
        );
    } else {
        println!("NAVR references: not loaded");
    }

    if let Some((min, max)) = stats::auto_range(session.store()) {
        println!("Value range:     [{min:.3}, {max:.3}]");
    }
}

/// Write the export to the chosen destination.
///
/// `--output auto` picks the dated default file name; no `--output` writes
/// to stdout.
fn write_export(content: &str, output: Option<&str>, is_thresholded: bool, ext: &str) -> Result<()> {
    match output {
        None => {
            print!("{content}");
            Ok(())
        }
        Some("auto") => {
            let name = export::default_filename(is_thresholded, ext);
            std::fs::write(&name, content)?;
            eprintln!("wrote {name}");
            Ok(())
        }
        Some(path) => {
            std::fs::write(path, content)?;
            eprintln!("wrote {path}");
            Ok(())
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.debug);

    let mut session = Session::new(&args.atlas)?;
    if let Some(metric) = args.metric {
        session.set_metric(metric);
    }

    let rows = dataset::read_rows(&args.input)?;
    let counts = session.ingest_rows(&rows);
    if session.store().is_empty() {
        anyhow::bail!(
            "no usable rows in {} ({} skipped); expected a Structure column and one of Cohen_d, d_icv, Cohen_d_thresholded, d_icv_thresholded",
            args.input.display(),
            counts.skipped
        );
    }
    if counts.skipped > 0 {
        eprintln!(
            "warning: skipped {} of {} rows",
            counts.skipped,
            counts.accepted + counts.skipped
        );
    }

    if args.threshold {
        if args.metric.is_none() {
            anyhow::bail!("--threshold requires --metric to locate the NAVR reference files");
        }
        let (cortical_ok, subcortical_ok) = session
            .load_references(&args.data_dir)
            .await
            .map(|refs| (refs.cortical_ok, refs.subcortical_ok))
            .map_err(|err| {
                let paths = navrcut::navr::reference_paths(
                    &args.data_dir,
                    &args.atlas,
                    args.metric.expect("metric checked above"),
                );
                anyhow::anyhow!(
                    "{err}; expected reference files:\n  {}\n  {}",
                    paths.cortical.display(),
                    paths.subcortical.display()
                )
            })?;
        if !cortical_ok || !subcortical_ok {
            let missing = if cortical_ok { "subcortical" } else { "cortical" };
            eprintln!("warning: {missing} reference file unavailable; thresholding covers the other half only");
        }
        match session.toggle_threshold()? {
            navrcut::session::ThresholdTransition::Applied(count) => {
                eprintln!("threshold applied: {count} values suppressed");
            }
            navrcut::session::ThresholdTransition::Removed => {
                eprintln!("threshold removed");
            }
        }
    }

    let is_thresholded = session.is_thresholded();
    match args.format {
        OutputFormat::Text => print_summary(&session),
        OutputFormat::Csv => {
            let csv = export::to_csv(&session.snapshot(), session.references());
            write_export(&csv, args.output.as_deref(), is_thresholded, "csv")?;
        }
        OutputFormat::Json => {
            let json = export::to_json(
                &session.snapshot(),
                session.references(),
                &session.export_context(),
            )?;
            write_export(&json, args.output.as_deref(), is_thresholded, "json")?;
        }
    }

    if args.summary && !matches!(args.format, OutputFormat::Text) {
        print_summary(&session);
    }

    Ok(())
}
