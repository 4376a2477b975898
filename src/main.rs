//! Resume ranker: rank a batch of resumes against a job description

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use resume_ranker::cli::{self, Cli, Commands, ConfigAction, ModelAction, VocabAction};
use resume_ranker::config::Config;
use resume_ranker::error::{RankerError, Result};
use resume_ranker::input::manager::candidate_ids;
use resume_ranker::input::DocumentLoader;
use resume_ranker::output::formatter::suggest_filename;
use resume_ranker::output::{save_report_to_file, RankingReport, ReportGenerator};
use resume_ranker::processing::embedding_manager::ModelStore;
use resume_ranker::processing::pipeline::RankingEngine;
use resume_ranker::processing::vocabulary::SkillVocabulary;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::process;
use std::time::Instant;

const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md", "markdown", "pdf"];

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config_result = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let config = match config_result {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli.command, config, cli.config).await {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

async fn run_command(command: Commands, config: Config, config_path: Option<PathBuf>) -> Result<()> {
    match command {
        Commands::Rank {
            job,
            resumes,
            output,
            save,
            top,
            detailed,
        } => {
            cli::validate_file_extension(&job, SUPPORTED_EXTENSIONS)?;

            let format = match output {
                Some(name) => cli::parse_output_format(&name)?,
                None => config.output.format,
            };
            let top = top.or(config.output.top);
            let detailed = detailed || config.output.detailed;

            let loader = DocumentLoader::new();
            let job_text = loader.extract_text(&job).await?;
            info!("Job description: {} ({} characters)", job.display(), job_text.len());

            let paths = loader.expand_inputs(&resumes)?;
            if paths.is_empty() {
                return Err(RankerError::InvalidInput(
                    "No resumes found in the given paths".to_string(),
                ));
            }

            let engine = RankingEngine::from_config(&config).await?;
            let start_time = Instant::now();

            let progress = ProgressBar::new(paths.len() as u64);
            progress.set_style(
                ProgressStyle::default_bar()
                    .template("  Loading [{bar:30}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );

            let mut candidates = Vec::with_capacity(paths.len());
            let mut unreadable = BTreeSet::new();
            for (path, candidate_id) in paths.iter().zip(candidate_ids(&paths)) {
                progress.set_message(candidate_id.clone());
                let document = loader.load_candidate(path, candidate_id).await;
                if !document.readable {
                    unreadable.insert(document.candidate_id.clone());
                }
                candidates.push((document.candidate_id, document.text));
                progress.inc(1);
            }
            progress.finish_and_clear();

            if !unreadable.is_empty() {
                warn!("{} of {} resumes could not be read", unreadable.len(), paths.len());
            }

            let outcome = engine.rank_texts(&job_text, &candidates);
            let elapsed_ms = start_time.elapsed().as_millis() as u64;

            let report = RankingReport::new(
                &outcome,
                *engine.weights(),
                job.display().to_string(),
                engine.embedding_source(),
                elapsed_ms,
            )
            .mark_unreadable(&unreadable)
            .limit(top);

            let generator = ReportGenerator::new(config.output.color_output && save.is_none(), detailed);
            let content = generator.generate_report(&report, format)?;

            match save {
                Some(path) => {
                    let path = if path.is_dir() {
                        path.join(suggest_filename(format, &job.to_string_lossy(), true))
                    } else {
                        path
                    };
                    save_report_to_file(&content, &path)?;
                    println!("Report saved to {}", path.display());
                }
                None => println!("{}", content),
            }
        }

        Commands::Models { action } => {
            let mut store = ModelStore::open(config.models_dir().clone()).await?;

            match action {
                ModelAction::List => {
                    println!("Embedding models ({})\n", store.models_dir().display());
                    for model in store.known_models() {
                        let status = if store.is_downloaded(&model.id) { "downloaded" } else { "available" };
                        println!("  {} - {} ({} MB, {} dims) [{}]", model.id, model.name, model.size_mb, model.dimensions, status);
                        println!("    {}", model.description);
                    }

                    let custom: Vec<String> = store
                        .downloaded_models()
                        .into_iter()
                        .filter(|id| store.model_info(id).is_none())
                        .collect();
                    if !custom.is_empty() {
                        println!("\n  Other local models: {}", custom.join(", "));
                    }
                }

                ModelAction::Download { model } => {
                    let model_id = store.resolve_model_id(&model).ok_or_else(|| {
                        RankerError::ModelError(format!("Unknown embedding model: {}", model))
                    })?;
                    let path = store.download(&model_id).await?;
                    println!("Model '{}' ready at {}", model_id, path.display());
                    println!(
                        "Use it by setting [resources.embeddings] kind = \"model2vec\", model = \"{}\"",
                        model_id
                    );
                }

                ModelAction::Info { model } => {
                    let model_id = store.resolve_model_id(&model).ok_or_else(|| {
                        RankerError::ModelError(format!("Unknown embedding model: {}", model))
                    })?;
                    if let Some(info) = store.model_info(&model_id) {
                        println!("Name: {}", info.name);
                        println!("Repository: {}", info.repo_id);
                        println!("Size: {} MB", info.size_mb);
                        println!("Dimensions: {}", info.dimensions);
                        println!("Description: {}", info.description);
                    }
                    match store.model_path(&model_id) {
                        Some(path) => println!("Location: {}", path.display()),
                        None => println!("Not downloaded. Run: resume-ranker models download {}", model_id),
                    }
                }
            }
        }

        Commands::Config { action } => {
            let path = config_path.unwrap_or_else(Config::config_path);

            match action {
                Some(ConfigAction::Show) | None => {
                    let content = toml::to_string_pretty(&config).map_err(|e| {
                        RankerError::Configuration(format!("Failed to serialize config: {}", e))
                    })?;
                    println!("# {}\n{}", path.display(), content);
                }

                Some(ConfigAction::Reset) => {
                    Config::default().save_to(&path)?;
                    println!("Configuration reset: {}", path.display());
                }

                Some(ConfigAction::Path) => println!("{}", path.display()),
            }
        }

        Commands::Vocab { action } => {
            let vocabulary = match &config.resources.vocabulary_path {
                Some(path) => SkillVocabulary::from_file(path)?,
                None => SkillVocabulary::builtin(),
            };

            match action {
                VocabAction::Show { skill: Some(skill) } => match vocabulary.synonyms(&skill) {
                    Some(synonyms) => {
                        let synonyms: Vec<&str> = synonyms.iter().map(String::as_str).collect();
                        println!("{}: {}", skill, synonyms.join(", "));
                    }
                    None => {
                        return Err(RankerError::InvalidInput(format!(
                            "'{}' is not a canonical skill in the vocabulary",
                            skill
                        )))
                    }
                },

                VocabAction::Show { skill: None } => {
                    println!("{} canonical skills\n", vocabulary.len());
                    for canonical in vocabulary.canonical_names() {
                        let synonyms: Vec<&str> = vocabulary
                            .synonyms(canonical)
                            .map(|s| s.iter().map(String::as_str).filter(|s| *s != canonical).collect())
                            .unwrap_or_default();
                        if synonyms.is_empty() {
                            println!("  {}", canonical);
                        } else {
                            println!("  {} ({})", canonical, synonyms.join(", "));
                        }
                    }
                }
            }
        }
    }

    Ok(())
}
