//! # Ingredient CRF
//!
//! A Rust library for parsing recipe ingredient sentences into structured
//! data using a linear-chain conditional random field.
//!
//! ## Features
//!
//! - Deterministic normalization of free-form ingredient text (unicode
//!   fractions, HTML entities, ranges, quantity/unit splitting)
//! - Sequence labeling with a trained CRF model: quantities, units,
//!   sizes, names, preparation, comments and purpose
//! - Structural post-processing: container-unit amounts ("2 14 ounce
//!   cans"), composite amounts ("1 lb 2 oz", "1 cup plus 1 tablespoon"),
//!   amount flags (approximate, singular, prepared)
//! - Alternative ingredient names split into separate entries
//!   ("beef or chicken stock")
//! - Optional foundation-food resolution against a Food Data Central
//!   catalog via fused BM25, uSIF and fuzzy embedding rankers
//!
//! ## Design Decisions
//!
//! ### Parses never fail on content
//!
//! A constructed parser only returns an error for empty input or a model
//! that emits an unknown label. Tokens that fail quantity resolution stay
//! as raw strings; names with no embedding coverage simply produce no
//! foundation-food match.
//!
//! ### Resources load once, parses share them
//!
//! The CRF model, the embedding table and the foundation-food catalog are
//! read-only after construction. Parsing one sentence is single-threaded
//! and CPU-bound; independent sentences may be parsed in parallel from a
//! shared parser.
//!
//! ### Quantities are a sum type
//!
//! A quantity is a number where the text resolved (`2`, `0.5` from `1/2`,
//! ranges, multipliers) and the raw string otherwise (`1 dozen`). Ranges
//! carry their upper bound in `quantity_max` with the `range` flag set.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use ingredient_crf::{ParserOptions, SentenceParser};
//!
//! let parser = SentenceParser::from_paths(
//!     Path::new("model.en.json.gz"),
//!     Some(Path::new("embeddings.25d.txt.gz")),
//!     Some(Path::new("fdc_ingredients.csv.gz")),
//! )?;
//!
//! let parsed = parser.parse("2 14 ounce cans coconut milk", &ParserOptions::default())?;
//! assert_eq!(parsed.names[0].text, "coconut milk");
//! # Ok::<(), ingredient_crf::error::ParseError>(())
//! ```

use std::path::Path;
use std::sync::Arc;

use once_cell::sync::OnceCell;

#[macro_use]
extern crate serde;

pub mod crf;
pub mod embeddings;
pub mod error;
pub mod features;
pub mod foundation;
pub mod label;
pub mod lexicon;
pub mod normalize;
pub mod output;
pub mod pos;
pub mod postprocess;
pub mod quantity;
pub mod stem;
pub mod structure;
pub mod tokenize;
pub mod unit;

pub use crate::error::{ParseError, ParseResult};
pub use crate::output::ParsedIngredient;
pub use crate::unit::VolumetricUnits;

use crate::crf::CrfModel;
use crate::embeddings::EmbeddingTable;
use crate::features::{FeatureVec, PreprocessedSentence, Token};
use crate::foundation::{FdcCatalog, FoundationFoodResolver};
use crate::label::Label;
use crate::lexicon::SINGULAR_TO_PLURAL;
use crate::postprocess::PostProcessor;

/// Options controlling a single parse.
///
/// ```
/// use ingredient_crf::{ParserOptions, VolumetricUnits};
///
/// let options = ParserOptions::default()
///     .with_foundation_foods(true)
///     .with_volumetric_units(VolumetricUnits::Imperial);
/// assert!(options.foundation_foods);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParserOptions {
    /// Drop name/preparation/comment runs that are a single stop word.
    pub discard_isolated_stop_words: bool,
    /// When no name survives post-processing, fall back to a best-effort
    /// guess from the remaining tokens.
    pub expect_name_in_output: bool,
    /// Keep units as free strings instead of mapping them to the
    /// canonical unit enum.
    pub string_units: bool,
    /// Volume definitions for cup, pint, quart, gallon and fluid ounce.
    pub volumetric_units: VolumetricUnits,
    /// Resolve parsed names against the foundation-food catalog.
    pub foundation_foods: bool,
    /// Return one name per alternative instead of a single joined name.
    pub separate_names: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions {
            discard_isolated_stop_words: true,
            expect_name_in_output: false,
            string_units: false,
            volumetric_units: VolumetricUnits::UsCustomary,
            foundation_foods: false,
            separate_names: true,
        }
    }
}

impl ParserOptions {
    pub fn with_discard_isolated_stop_words(mut self, value: bool) -> Self {
        self.discard_isolated_stop_words = value;
        self
    }

    pub fn with_expect_name_in_output(mut self, value: bool) -> Self {
        self.expect_name_in_output = value;
        self
    }

    pub fn with_string_units(mut self, value: bool) -> Self {
        self.string_units = value;
        self
    }

    pub fn with_volumetric_units(mut self, value: VolumetricUnits) -> Self {
        self.volumetric_units = value;
        self
    }

    pub fn with_foundation_foods(mut self, value: bool) -> Self {
        self.foundation_foods = value;
        self
    }

    pub fn with_separate_names(mut self, value: bool) -> Self {
        self.separate_names = value;
        self
    }
}

/// Intermediate products of one parse, for inspection and debugging.
#[derive(Debug, Clone)]
pub struct ParserDebugInfo {
    /// Original input sentence.
    pub sentence: String,
    /// Sentence after normalization.
    pub normalized: String,
    /// Tokens with their feature spellings and POS tags.
    pub tokens: Vec<Token>,
    /// Feature maps fed to the labeler.
    pub features: Vec<FeatureVec>,
    /// Decoded labels.
    pub labels: Vec<Label>,
    /// Marginal probability of each decoded label.
    pub scores: Vec<f64>,
    /// Full marginal matrix; columns follow `label_set`.
    pub marginals: Vec<Vec<f64>>,
    /// Label strings in model order.
    pub label_set: Vec<String>,
}

/// A parser handle owning the trained model and the optional resources
/// for foundation-food resolution.
pub struct SentenceParser {
    model: CrfModel,
    embeddings: Option<Arc<EmbeddingTable>>,
    resolver: Option<FoundationFoodResolver>,
}

impl SentenceParser {
    /// Create a parser from a loaded model. Foundation-food resolution is
    /// unavailable until embeddings and a catalog are attached.
    pub fn new(model: CrfModel) -> Self {
        SentenceParser {
            model,
            embeddings: None,
            resolver: None,
        }
    }

    /// Attach an embedding table, enabling the embedding features of the
    /// labeler (chainable).
    pub fn with_embeddings(mut self, embeddings: Arc<EmbeddingTable>) -> Self {
        self.embeddings = Some(embeddings);
        self
    }

    /// Attach a foundation-food catalog (chainable). Requires embeddings
    /// to be attached first.
    pub fn with_catalog(mut self, catalog: FdcCatalog) -> ParseResult<Self> {
        let embeddings = self
            .embeddings
            .clone()
            .ok_or_else(|| ParseError::Resource {
                path: "<catalog>".to_string(),
                reason: "foundation-food catalog requires an embedding table".to_string(),
            })?;
        self.resolver = Some(FoundationFoodResolver::new(embeddings, catalog));
        Ok(self)
    }

    /// Load a parser from resource files. The embeddings and catalog
    /// paths are optional; without them the parser labels sentences but
    /// cannot resolve foundation foods.
    pub fn from_paths(
        model: &Path,
        embeddings: Option<&Path>,
        catalog: Option<&Path>,
    ) -> ParseResult<Self> {
        let mut parser = SentenceParser::new(CrfModel::from_path(model)?);
        if let Some(embeddings_path) = embeddings {
            parser = parser.with_embeddings(Arc::new(EmbeddingTable::from_path(embeddings_path)?));
        }
        if let Some(catalog_path) = catalog {
            let embeddings = parser
                .embeddings
                .clone()
                .ok_or_else(|| ParseError::Resource {
                    path: catalog_path.display().to_string(),
                    reason: "foundation-food catalog requires an embedding table".to_string(),
                })?;
            let catalog = FdcCatalog::from_path(catalog_path, &embeddings)?;
            parser = parser.with_catalog(catalog)?;
        }
        Ok(parser)
    }

    /// Parse one ingredient sentence into structured data.
    #[tracing::instrument(name = "parse_ingredient", skip(self, options))]
    pub fn parse(&self, sentence: &str, options: &ParserOptions) -> ParseResult<ParsedIngredient> {
        let (preprocessed, labels, scores, name_mass) = self.label_sentence(sentence)?;

        let tokens = restore_plurals(&preprocessed, &labels);
        let pos_tags = preprocessed.pos_tags();

        let mut processor = PostProcessor::new(
            sentence,
            tokens,
            pos_tags,
            labels,
            scores,
            options,
        )
        .with_name_marginal_mass(name_mass);
        if options.foundation_foods {
            if let Some(resolver) = &self.resolver {
                processor = processor.with_resolver(resolver);
            }
        }

        Ok(processor.parse())
    }

    /// Parse a sentence and return every intermediate product.
    pub fn inspect(&self, sentence: &str, _options: &ParserOptions) -> ParseResult<ParserDebugInfo> {
        if sentence.trim().is_empty() {
            return Err(ParseError::EmptyInput);
        }

        let preprocessed = PreprocessedSentence::new(sentence);
        let features = preprocessed.features(self.embeddings.as_deref());
        let (tagged, marginals) = self.model.tag_with_marginals(&features);
        let labels: Vec<Label> = tagged
            .labels
            .iter()
            .map(|l| l.parse())
            .collect::<ParseResult<_>>()?;

        Ok(ParserDebugInfo {
            sentence: sentence.to_string(),
            normalized: preprocessed.sentence().to_string(),
            tokens: preprocessed.tokens().to_vec(),
            features,
            labels,
            scores: tagged.scores,
            marginals,
            label_set: self.model.labels().to_vec(),
        })
    }

    /// Run normalization, feature extraction and labeling, returning the
    /// preprocessed sentence, decoded labels, their marginals and the
    /// per-token marginal mass over the name label family.
    #[allow(clippy::type_complexity)]
    fn label_sentence(
        &self,
        sentence: &str,
    ) -> ParseResult<(PreprocessedSentence, Vec<Label>, Vec<f64>, Vec<f64>)> {
        if sentence.trim().is_empty() {
            return Err(ParseError::EmptyInput);
        }

        let preprocessed = PreprocessedSentence::new(sentence);
        let features = preprocessed.features(self.embeddings.as_deref());
        let (tagged, marginals) = self.model.tag_with_marginals(&features);

        let labels: Vec<Label> = tagged
            .labels
            .iter()
            .map(|l| l.parse())
            .collect::<ParseResult<_>>()?;

        // Marginal mass over the name labels, used by the name-guess
        // fallback.
        let name_label_columns: Vec<usize> = self
            .model
            .labels()
            .iter()
            .enumerate()
            .filter(|(_, l)| l.parse::<Label>().map(|l| l.is_name()).unwrap_or(false))
            .map(|(i, _)| i)
            .collect();
        let name_mass: Vec<f64> = marginals
            .iter()
            .map(|row| name_label_columns.iter().map(|&c| row[c]).sum())
            .collect();

        Ok((preprocessed, labels, tagged.scores, name_mass))
    }
}

/// Restore plural spellings for singularised tokens whose final label is
/// not UNIT.
fn restore_plurals(preprocessed: &PreprocessedSentence, labels: &[Label]) -> Vec<String> {
    let mut tokens = preprocessed.token_texts();
    for &idx in preprocessed.singularized_indices() {
        if labels.get(idx) != Some(&Label::Unit) {
            if let Some(&plural) = SINGULAR_TO_PLURAL.get(tokens[idx].as_str()) {
                tokens[idx] = plural.to_string();
            }
        }
    }
    tokens
}

static GLOBAL_PARSER: OnceCell<SentenceParser> = OnceCell::new();

/// Environment variables naming the resource files used by
/// [`parse_ingredient`].
pub const MODEL_ENV: &str = "INGREDIENT_CRF_MODEL";
pub const EMBEDDINGS_ENV: &str = "INGREDIENT_CRF_EMBEDDINGS";
pub const CATALOG_ENV: &str = "INGREDIENT_CRF_CATALOG";

/// Install a parser as the process-wide default used by
/// [`parse_ingredient`]. Returns the parser back if one was already
/// installed.
pub fn set_default_parser(parser: SentenceParser) -> Result<(), SentenceParser> {
    GLOBAL_PARSER.set(parser)
}

/// Parse a sentence with the process-wide parser, loading it on first use
/// from the paths in [`MODEL_ENV`], [`EMBEDDINGS_ENV`] and
/// [`CATALOG_ENV`].
///
/// Prefer constructing an [`SentenceParser`] and sharing it; this
/// convenience exists for command-line style use.
pub fn parse_ingredient(sentence: &str, options: &ParserOptions) -> ParseResult<ParsedIngredient> {
    let parser = GLOBAL_PARSER.get_or_try_init(|| {
        let model = std::env::var(MODEL_ENV).map_err(|_| ParseError::Resource {
            path: MODEL_ENV.to_string(),
            reason: "environment variable not set and no default parser installed".to_string(),
        })?;
        let embeddings = std::env::var(EMBEDDINGS_ENV).ok();
        let catalog = std::env::var(CATALOG_ENV).ok();
        SentenceParser::from_paths(
            Path::new(&model),
            embeddings.as_deref().map(Path::new),
            catalog.as_deref().map(Path::new),
        )
    })?;
    parser.parse(sentence, options)
}
