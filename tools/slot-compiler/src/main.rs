use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rephrase_lexicon::Lexicon;
use rephrase_order::{persist, DataDriven, FixedTemplate, OrderCache, OrderPolicy};
use rephrase_parser::{conllu, spacy, Decomposer, DecomposerConfig, Decomposition};
use rephrase_protocol::{OrderMapping, Sentence};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Decomposes parsed sentences into slots and learns slot order")]
struct Cli {
    /// JSON decomposer configuration
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log every decomposition decision
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decompose every sentence of a CoNLL-U or spaCy JSON file and print the slot maps
    Decompose {
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Order mappings (.json or binary) used to fill display_order
        #[arg(long, value_name = "FILE")]
        order: Option<PathBuf>,

        #[arg(short, long, default_value = "*")]
        group: String,
    },
    /// Learn the slot order of a verb group and store it
    Train {
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        #[arg(short, long)]
        group: String,

        /// Mapping file; other groups already in it are kept
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },
    /// Print each sentence's slots in resolved order
    Order {
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Learned mappings; without them the built-in template is used
        #[arg(short, long, value_name = "FILE")]
        mappings: Option<PathBuf>,

        #[arg(short, long, default_value = "*")]
        group: String,
    },
}

/// `--config` file: the decomposer settings plus extra closed-class words.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ToolConfig {
    #[serde(flatten)]
    decomposer: DecomposerConfig,
    /// Word class name -> words, e.g. `{"modal": ["gotta"]}`.
    lexicon: BTreeMap<String, Vec<String>>,
}

impl ToolConfig {
    fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let json = fs::read_to_string(path).with_context(|| format!("reading config {:?}", path))?;
        serde_json::from_str(&json).with_context(|| format!("parsing config {:?}", path))
    }

    fn lexicon(&self) -> Result<Lexicon> {
        let mut lexicon = Lexicon::english();
        lexicon.extend(
            self.lexicon
                .iter()
                .flat_map(|(class, words)| words.iter().map(move |word| (class.as_str(), word.as_str()))),
        )?;
        Ok(lexicon)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { tracing::Level::DEBUG } else { tracing::Level::WARN };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    let config = ToolConfig::load(cli.config.as_deref())?;
    let lexicon = config.lexicon()?;
    let decomposer = Decomposer::new(config.decomposer.clone());

    match cli.command {
        Command::Decompose { input, order, group } => {
            let mut decompositions = decompose_file(&decomposer, &input, &lexicon)?;
            if let Some(order) = order {
                let policy = DataDriven::new(load_cache(&order)?);
                for decomposition in &mut decompositions {
                    policy.order(&mut decomposition.slots, &group);
                }
            }
            println!("{}", serde_json::to_string_pretty(&decompositions)?);
        }
        Command::Train { input, group, output } => {
            let decompositions = decompose_file(&decomposer, &input, &lexicon)?;
            let mapping = rephrase_order::train(&group, decomposer.config(), &decompositions);
            info!(group = %group, version = mapping.version, elements = mapping.positions.len(), "trained");

            let mut mappings: Vec<OrderMapping> = if output.exists() {
                persist::load(&output).with_context(|| format!("reading existing mappings {:?}", output))?
            } else {
                Vec::new()
            };
            mappings.retain(|m| m.group != group);
            mappings.push(mapping);
            mappings.sort_by(|a, b| a.group.cmp(&b.group));
            persist::save(&output, &mappings).with_context(|| format!("writing {:?}", output))?;

            println!(
                "Learned order for '{}' from {} sentences, written to {:?}",
                group,
                decompositions.len(),
                output
            );
        }
        Command::Order { input, mappings, group } => {
            let policy: Box<dyn OrderPolicy> = match mappings {
                Some(path) => Box::new(DataDriven::new(load_cache(&path)?)),
                None => Box::new(FixedTemplate::english()),
            };
            for decomposition in decompose_file(&decomposer, &input, &lexicon)? {
                println!("{}", ordered_line(&decomposition, policy.as_ref(), &group));
            }
        }
    }

    Ok(())
}

/// `.json` input is read as spaCy documents, anything else as CoNLL-U.
fn read_sentences(path: &Path, lexicon: &Lexicon) -> Result<Vec<Sentence>> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));
    let sentences = if is_json {
        spacy::parse_docs(&text, lexicon)
    } else {
        conllu::parse_document(&text, lexicon)
    };
    sentences.with_context(|| format!("parsing {:?}", path))
}

fn decompose_file(decomposer: &Decomposer, path: &Path, lexicon: &Lexicon) -> Result<Vec<Decomposition>> {
    let sentences = read_sentences(path, lexicon)?;
    info!(count = sentences.len(), path = ?path, "sentences read");

    sentences
        .iter()
        .map(|sentence| {
            let decomposition = decomposer
                .decompose(sentence)
                .with_context(|| format!("decomposing {:?}", sentence.text))?;
            let uncovered = decomposition.uncovered(decomposer.rules());
            if !uncovered.is_empty() {
                warn!(text = %sentence.text, tokens = ?uncovered, "tokens left outside every slot");
            }
            Ok(decomposition)
        })
        .collect()
}

fn load_cache(path: &Path) -> Result<Arc<OrderCache>> {
    let cache = OrderCache::new();
    for mapping in persist::load(path).with_context(|| format!("reading mappings {:?}", path))? {
        cache.insert(mapping);
    }
    Ok(Arc::new(cache))
}

/// `text<TAB>S=She | V=sings | M2=beautifully`
fn ordered_line(decomposition: &Decomposition, policy: &dyn OrderPolicy, group: &str) -> String {
    let ranking = policy.resolve_order(&decomposition.slots, group);
    let slots: Vec<String> = ranking
        .ordered()
        .into_iter()
        .filter_map(|name| decomposition.slot(name))
        .map(|slot| format!("{}={}", slot.name, slot.text))
        .collect();
    format!("{}\t{}", decomposition.sentence.text, slots.join(" | "))
}
