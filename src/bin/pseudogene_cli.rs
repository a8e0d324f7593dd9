use indicatif::{ProgressBar, ProgressStyle};
use std::error::Error;
use std::fs;
use std::process::ExitCode;

use pseudogene_rs::config::PipelineConfig;
use pseudogene_rs::{
    analyze_stage1, analyze_stage2, extract_representatives_and_pseudogenes, preprocess_proteins, PassSummary,
};

const USAGE: &str = "usage: pseudogene-rs <proteins|annotate|stage1|stage2> [data_dir]";

fn spinner(color: &str, message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
        .template(&format!("{{spinner:.{}}} {{msg}}", color))
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.set_message(message.to_string());
    spinner
}

fn finish_pass(bar: &ProgressBar, what: &str, summary: &PassSummary) {
    bar.finish_with_message(format!(
        "Wrote {} {} from {} strains to {}",
        summary.sequences(),
        what,
        summary.strains(),
        summary.output.display()
    ));
}

/// Writes `(file name, contents)` pairs into the data directory.
fn write_outputs(config: &PipelineConfig, outputs: &[(&str, String)]) -> std::io::Result<()> {
    let bar = spinner("yellow", "Writing output files...");
    for (name, text) in outputs {
        fs::write(config.data_dir.join(name), text)?;
    }
    bar.finish_with_message(format!("{} output files written to {}", outputs.len(), config.data_dir.display()));
    Ok(())
}

fn run(command: &str, config: &PipelineConfig) -> Result<(), Box<dyn Error>> {
    match command {
        "proteins" => {
            let bar = spinner("blue", "Indexing strain proteins...");
            let summary = preprocess_proteins(config)?;
            finish_pass(&bar, "proteins", &summary);
        }
        "annotate" => {
            let bar = spinner("green", "Extracting representatives and pseudogenes...");
            let summary = extract_representatives_and_pseudogenes(config)?;
            finish_pass(&bar, "sequences", &summary);
        }
        "stage1" => {
            let bar = spinner("green", "Analyzing protein clusters...");
            let results = analyze_stage1(config, config.strains_dir.is_dir())?;
            bar.finish_with_message(format!(
                "{} strains, {} clusters, {} core",
                results.total_strains, results.total_clusters, results.total_core_clusters
            ));
            write_outputs(
                config,
                &[
                    ("strain_stats.tsv", results.get_strain_stats_tsv()),
                    ("core_refinement.txt", results.get_core_refinement_text()),
                ],
            )?;
        }
        "stage2" => {
            let bar = spinner("green", "Typing nucleotide clusters...");
            let results = analyze_stage2(config)?;
            bar.finish_with_message(format!(
                "{} clusters typed, {} unresolved links",
                results.typing.typings.len(),
                results.typing.unresolved_count()
            ));
            write_outputs(
                config,
                &[
                    ("cluster_types.txt", results.get_cluster_type_counts_text()),
                    ("cross_links.tsv", results.get_cross_links_tsv()),
                    ("orphan_pseudogenes.tsv", results.get_orphan_pseudogenes_tsv()),
                ],
            )?;
        }
        other => return Err(format!("unknown command `{}`\n{}", other, USAGE).into()),
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let Some(command) = args.next() else {
        eprintln!("{}", USAGE);
        return ExitCode::FAILURE;
    };

    let mut config = PipelineConfig::from_env();
    if let Some(data_dir) = args.next() {
        config = PipelineConfig::with_data_dir(data_dir).workers(config.workers);
    }

    match run(&command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            let mut source = e.source();
            while let Some(cause) = source {
                log::error!("  caused by: {}", cause);
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}
