//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `jpstudy_core` linkage.
//! - Annotate one sentence from the command line for quick sanity checks.
//!
//! Usage: `jpstudy_cli [SENTENCE [LEXICON_TSV [SNAPSHOT_TSV]]]`
//!
//! - `SNAPSHOT_TSV` holds `characters<TAB>stage` rows.
//! - `JPSTUDY_CONFIG` names a pipeline config JSON file.
//! - `JPSTUDY_ITEM_API_URL` / `JPSTUDY_ITEM_API_TOKEN` select the item
//!   catalogue when the config file has none.
//! - File logging is enabled when `JPSTUDY_LOG_DIR` names an absolute directory.

use jpstudy_core::service::pipeline::cached_pipeline;
use jpstudy_core::{
    init_logging, open_db, open_db_in_memory, FetchError, HttpItemSource, ItemCache, ItemRecord,
    ItemSource, KnowledgeState, LogLevel, PipelineConfig, ReadingLexicon, SentenceRecord,
    SqliteSubjectIndex, SubjectId, Transliterator, UnknownItemExtractor,
};
use log::info;
use std::error::Error;
use std::path::Path;
use std::process::ExitCode;

const LOG_DIR_ENV: &str = "JPSTUDY_LOG_DIR";
const CONFIG_ENV: &str = "JPSTUDY_CONFIG";

/// Item source for runs without a configured catalogue endpoint.
struct OfflineSource;

impl ItemSource for OfflineSource {
    fn fetch(&self, id: SubjectId) -> Result<ItemRecord, FetchError> {
        Err(FetchError::Transport {
            id,
            message: "no item source configured".to_string(),
        })
    }
}

fn main() -> ExitCode {
    println!("jpstudy_core version={}", jpstudy_core::core_version());
    if let Ok(dir) = std::env::var(LOG_DIR_ENV) {
        if let Err(err) = init_logging(LogLevel::build_default().as_str(), Path::new(&dir)) {
            eprintln!("warning: {err}");
        }
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(sentence) = args.first() else {
        return ExitCode::SUCCESS;
    };

    match annotate_sentence(sentence, args.get(1), args.get(2)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn load_config() -> Result<PipelineConfig, Box<dyn Error>> {
    match std::env::var(CONFIG_ENV) {
        Ok(path) => Ok(PipelineConfig::from_file(path)?),
        Err(_) => Ok(PipelineConfig::default()),
    }
}

fn annotate_sentence(
    sentence: &str,
    lexicon_path: Option<&String>,
    snapshot_path: Option<&String>,
) -> Result<(), Box<dyn Error>> {
    let config = load_config()?;

    let lexicon = match lexicon_path {
        Some(path) => ReadingLexicon::from_tsv(&std::fs::read_to_string(path)?)?,
        None => ReadingLexicon::new(),
    };
    let engine = Transliterator::new(lexicon);
    let knowledge = match snapshot_path {
        Some(path) => KnowledgeState::from_snapshot_tsv(
            &std::fs::read_to_string(path)?,
            config.learned_stage,
        )?,
        None => KnowledgeState::default(),
    };

    let source: Box<dyn ItemSource> = match config.item_source_or_env()? {
        Some(source_config) => Box::new(HttpItemSource::new(&source_config)?),
        None => Box::new(OfflineSource),
    };
    let conn = match &config.cache_path {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    let cache = ItemCache::new(&conn, source.as_ref());
    let pipeline = cached_pipeline(
        &knowledge,
        &engine,
        UnknownItemExtractor::new(config.example_policy),
        &cache,
        SqliteSubjectIndex::new(&conn),
    );

    let report = pipeline.run(&[SentenceRecord::new(sentence, "")]);
    info!(
        "event=cli_annotate module=cli status=ok glosses={} unknown_items={} level_failures={}",
        report.sentences.iter().map(|s| s.glosses.len()).sum::<usize>(),
        report.unknown_items.len(),
        report.resolution.failures.len()
    );
    if let Some(rejected) = report.rejected.first() {
        return Err(Box::new(rejected.error.clone()));
    }
    for annotated in &report.sentences {
        println!("glossed={}", annotated.japanese);
        println!("hiragana={}", annotated.hiragana.trim_end());
        println!("romaji={}", annotated.romaji.trim_end());
    }
    for item in &report.unknown_items {
        println!("unknown={} romaji={}", item.glossed_form, item.romaji);
    }
    for group in &report.unknown_kanji {
        match group.level {
            Some(level) => println!("kanji={} level={level}", group.kanji),
            None => println!("kanji={} level=unresolved", group.kanji),
        }
    }
    Ok(())
}
