//! `chatmine extract` — load a transcript, run the pipeline, emit JSON.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use chatmine_core::{ExtractorConfig, ParsedMessage};
use chatmine_extract::{default_queries, ExtractionOutput, ExtractionPipeline, SemanticInput};
use chatmine_infer::{EmbeddingDispatcher, OpenAiEmbedder};
use tracing::{info, warn};

/// Config file looked up in the working directory when `--config` is absent.
const DEFAULT_CONFIG_FILE: &str = "chatmine.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractArgs {
    pub messages: PathBuf,
    pub config: Option<PathBuf>,
    pub semantic: bool,
}

/// Parse the arguments following `extract`.
pub fn parse_extract_args(args: &[String]) -> anyhow::Result<ExtractArgs> {
    let mut messages = None;
    let mut config = None;
    let mut semantic = false;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--semantic" => semantic = true,
            "--config" => {
                let path = iter.next().context("--config requires a file path")?;
                config = Some(PathBuf::from(path));
            }
            flag if flag.starts_with("--") => bail!("Unknown option: {}", flag),
            path => {
                if messages.is_some() {
                    bail!("Unexpected argument: {}", path);
                }
                messages = Some(PathBuf::from(path));
            }
        }
    }

    Ok(ExtractArgs {
        messages: messages.context("missing <messages.json>")?,
        config,
        semantic,
    })
}

/// Read a JSON array of parsed messages.
pub fn load_messages(path: &Path) -> anyhow::Result<Vec<ParsedMessage>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let messages: Vec<ParsedMessage> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse messages from {}", path.display()))?;

    if messages.windows(2).any(|w| w[0].id >= w[1].id) {
        warn!("Message ids in {} are not strictly ascending", path.display());
    }
    Ok(messages)
}

/// An explicit `--config` must exist; only the implicit `chatmine.json`
/// falls back to defaults when missing.
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<ExtractorConfig> {
    match explicit {
        Some(path) => {
            if !path.is_file() {
                bail!("Config file not found: {}", path.display());
            }
            Ok(ExtractorConfig::load(path)?)
        }
        None => Ok(ExtractorConfig::load(Path::new(DEFAULT_CONFIG_FILE))?),
    }
}

pub async fn extract(args: &ExtractArgs) -> anyhow::Result<ExtractionOutput> {
    let config = load_config(args.config.as_deref())?;
    let options = config.extractor_options()?;
    let pipeline = ExtractionPipeline::new(options, config.batching_options());

    let messages = load_messages(&args.messages)?;
    info!("Loaded {} messages from {}", messages.len(), args.messages.display());

    if !args.semantic {
        return Ok(pipeline.run(&messages, None)?);
    }

    let provider = OpenAiEmbedder::from_config(&config.embedding)?;
    let dispatcher = EmbeddingDispatcher::new(provider, &config.embedding);
    let message_embeddings = dispatcher.embed_messages(&messages).await?;
    let query_embeddings = dispatcher.embed_queries(&default_queries()).await?;

    let input = SemanticInput {
        message_embeddings: &message_embeddings,
        query_embeddings: &query_embeddings,
        config: config.semantic,
    };
    Ok(pipeline.run(&messages, Some(input))?)
}
