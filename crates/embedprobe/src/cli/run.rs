//! The `embedprobe run` command: the field × embedding experiment.

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use embedprobe_core::embedding::{EmbeddingModels, TfidfEmbedder};
use embedprobe_core::{
    Config, Dataset, EmbedderKind, Experiment, ExperimentEvent, ExperimentSummary, OutputFormat,
    ResultWriter, RunOptions, TextEmbedder, TextField,
};

use super::report;

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Filtered paper dataset (overrides data.primary)
    #[arg(long)]
    pub primary: Option<PathBuf>,

    /// Unfiltered paper dataset used for the GitHub fields (overrides data.complete)
    #[arg(long)]
    pub complete: Option<PathBuf>,

    /// Only run these fields (repeatable)
    #[arg(long = "field", value_enum)]
    pub fields: Vec<FieldArg>,

    /// Only run these embedders (repeatable)
    #[arg(long = "embedder", value_enum)]
    pub embedders: Vec<EmbedderArg>,

    /// Record failed combinations and continue with the rest
    #[arg(long)]
    pub keep_going: bool,

    /// Also write the structured results to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Format of --output
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: FormatArg,

    /// Number of cross-validation folds (overrides evaluation.n_folds)
    #[arg(long)]
    pub folds: Option<usize>,

    /// Trees per random forest (overrides evaluation.n_trees)
    #[arg(long)]
    pub trees: Option<usize>,

    /// Seed for folds, undersampling and forests (overrides evaluation.seed)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// Text fields selectable on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FieldArg {
    Title,
    Abstract,
    Readme,
    /// SOMEF-extracted repository descriptions
    Somef,
    GithubTitle,
    GithubKeywords,
}

impl From<FieldArg> for TextField {
    fn from(arg: FieldArg) -> Self {
        match arg {
            FieldArg::Title => TextField::Title,
            FieldArg::Abstract => TextField::Abstract,
            FieldArg::Readme => TextField::Readme,
            FieldArg::Somef => TextField::SomefDescription,
            FieldArg::GithubTitle => TextField::GithubTitle,
            FieldArg::GithubKeywords => TextField::GithubKeywords,
        }
    }
}

/// Embedding strategies selectable on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum EmbedderArg {
    Tfidf,
    /// all-MiniLM-L6-v2 sentence transformer
    Sentence,
    /// CLIP ViT-B/32 text tower
    Clip,
}

impl From<EmbedderArg> for EmbedderKind {
    fn from(arg: EmbedderArg) -> Self {
        match arg {
            EmbedderArg::Tfidf => EmbedderKind::Tfidf,
            EmbedderArg::Sentence => EmbedderKind::Sentence,
            EmbedderArg::Clip => EmbedderKind::Clip,
        }
    }
}

/// Supported result file formats.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum FormatArg {
    /// A single pretty-printed JSON array
    Json,
    /// One JSON object per line (newline-delimited)
    Jsonl,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Jsonl => OutputFormat::JsonLines,
        }
    }
}

/// Fold the command-line overrides into `config`.
fn apply_overrides(args: &RunArgs, config: &mut Config) {
    if let Some(path) = &args.primary {
        config.data.primary = path.clone();
    }
    if let Some(path) = &args.complete {
        config.data.complete = path.clone();
    }
    if let Some(folds) = args.folds {
        config.evaluation.n_folds = folds;
    }
    if let Some(trees) = args.trees {
        config.evaluation.n_trees = trees;
    }
    if let Some(seed) = args.seed {
        config.evaluation.seed = seed;
    }
}

fn run_options(args: &RunArgs) -> RunOptions {
    let fields = (!args.fields.is_empty())
        .then(|| args.fields.iter().map(|&f| TextField::from(f)).collect());
    let embedders = (!args.embedders.is_empty())
        .then(|| args.embedders.iter().map(|&e| EmbedderKind::from(e)).collect());
    RunOptions {
        fields,
        embedders,
        keep_going: args.keep_going,
    }
}

fn needs_dense_models(options: &RunOptions) -> bool {
    options.embedders.as_ref().map_or(true, |only| {
        only.iter()
            .any(|k| matches!(k, EmbedderKind::Sentence | EmbedderKind::Clip))
    })
}

/// Execute the run command.
pub async fn execute(args: RunArgs, mut config: Config) -> anyhow::Result<()> {
    apply_overrides(&args, &mut config);
    config.validate()?;

    let options = run_options(&args);
    let show_progress = !args.no_progress;

    let summary =
        tokio::task::spawn_blocking(move || run_experiment(&config, options, show_progress))
            .await??;

    if !summary.results.is_empty() {
        println!();
        print!("{}", report::format_summary_table(&summary.results));
    }

    if let Some(path) = &args.output {
        let mut writer = ResultWriter::create(path, args.format.into())?;
        writer.write_all(&summary.results)?;
        let written = writer.written();
        writer.finish()?;
        tracing::info!("Wrote {} results to {:?}", written, path);
    }

    eprint!("{}", report::format_run_summary(&summary));
    Ok(())
}

/// Load everything and drive the experiment on the current (blocking) thread.
fn run_experiment(
    config: &Config,
    options: RunOptions,
    show_progress: bool,
) -> anyhow::Result<ExperimentSummary> {
    // Encoders first: a missing model should stop the run before dataset work.
    let models = if needs_dense_models(&options) {
        let model_dir = config.model_dir();
        tracing::info!("Loading encoders from {:?}", model_dir);
        Some(EmbeddingModels::load(&config.embedding, &model_dir).map_err(|e| {
            anyhow::anyhow!("{e}\n  Run `embedprobe models download` to fetch the encoders.")
        })?)
    } else {
        None
    };

    let primary = Dataset::load_primary(&config.primary_data_path())?;
    let complete = Dataset::load_complete(&config.complete_data_path())?;
    tracing::info!(
        "Loaded {} primary and {} complete records",
        primary.len(),
        complete.len()
    );

    let tfidf = TfidfEmbedder::new(config.tfidf.clone());
    let mut embedders: Vec<&dyn TextEmbedder> = vec![&tfidf];
    if let Some(models) = &models {
        embedders.push(models.sentence());
        embedders.push(models.clip());
    }

    let experiment = Experiment::new(&primary, &complete, config.evaluation.clone(), options);
    let total = experiment.plan(&embedders).len() as u64;

    let pb = if show_progress {
        create_progress_bar(total)?
    } else {
        indicatif::ProgressBar::hidden()
    };

    let result = experiment.run(&embedders, |event| match event {
        ExperimentEvent::Started {
            field, embedder, ..
        } => {
            pb.set_message(format!("{embedder} / {field}"));
        }
        ExperimentEvent::Finished(result) => {
            pb.suspend(|| {
                println!();
                print!("{}", report::format_combination(result));
            });
            pb.inc(1);
        }
        ExperimentEvent::Failed(_) => {
            pb.inc(1);
        }
    });

    pb.finish_and_clear();
    Ok(result?)
}

/// Create a progress bar over the planned combinations.
fn create_progress_bar(total: u64) -> anyhow::Result<indicatif::ProgressBar> {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
            )?
            .progress_chars("##-"),
    );
    pb.set_message("starting...");
    Ok(pb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        run: RunArgs,
    }

    fn parse(args: &[&str]) -> RunArgs {
        let mut argv = vec!["embedprobe"];
        argv.extend_from_slice(args);
        TestCli::parse_from(argv).run
    }

    #[test]
    fn test_defaults_select_everything() {
        let args = parse(&[]);
        let options = run_options(&args);
        assert!(options.fields.is_none());
        assert!(options.embedders.is_none());
        assert!(!options.keep_going);
        assert!(needs_dense_models(&options));
    }

    #[test]
    fn test_field_and_embedder_filters() {
        let args = parse(&[
            "--field",
            "somef",
            "--field",
            "github-keywords",
            "--embedder",
            "tfidf",
            "--keep-going",
        ]);
        let options = run_options(&args);
        assert_eq!(
            options.fields,
            Some(vec![TextField::SomefDescription, TextField::GithubKeywords])
        );
        assert_eq!(options.embedders, Some(vec![EmbedderKind::Tfidf]));
        assert!(options.keep_going);
        assert!(!needs_dense_models(&options));
    }

    #[test]
    fn test_overrides_reach_config() {
        let args = parse(&[
            "--primary",
            "/data/filtered.json",
            "--folds",
            "3",
            "--trees",
            "10",
            "--seed",
            "7",
        ]);
        let mut config = Config::default();
        apply_overrides(&args, &mut config);
        assert_eq!(config.data.primary, PathBuf::from("/data/filtered.json"));
        assert_eq!(config.evaluation.n_folds, 3);
        assert_eq!(config.evaluation.n_trees, 10);
        assert_eq!(config.evaluation.seed, 7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_single_fold_override_fails_validation() {
        let args = parse(&["--folds", "1"]);
        let mut config = Config::default();
        apply_overrides(&args, &mut config);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_format_mapping() {
        let args = parse(&["-o", "out.jsonl", "-f", "jsonl"]);
        assert_eq!(OutputFormat::from(args.format), OutputFormat::JsonLines);
    }
}
