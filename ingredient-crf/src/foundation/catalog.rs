//! The foundation-food catalog.
//!
//! Loaded once from a gzipped CSV with columns
//! `fdc_id, data_type, description, category`. Each description is
//! tokenized, stemmed and weighted at load time; entries with no token in
//! the embedding vocabulary are dropped.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;

use crate::embeddings::EmbeddingTable;
use crate::error::{ParseError, ParseResult};
use crate::output::FdcDataType;
use crate::tokenize::tokenize;

use super::prepare_tokens_uncached;

/// Tokens that negate the rest of their phrase ("no salt added").
/// "ns" is the catalog's shorthand for "not specified".
static NEGATION_TOKENS: &[&str] = &["no", "not", "without", "ns"];

/// Tokens that mark the rest of their phrase as secondary to the main
/// ingredient ("rice with vegetables").
static REDUCED_RELEVANCE_TOKENS: &[&str] = &["with"];

/// One catalog entry with its precomputed tokens and token weights.
#[derive(Debug, Clone, PartialEq)]
pub struct FdcIngredient {
    pub fdc_id: u32,
    pub data_type: FdcDataType,
    pub description: String,
    pub category: String,
    /// Stemmed description tokens, restricted to the embedding vocabulary.
    pub tokens: Vec<String>,
    /// Relevance weight per token.
    pub weights: Vec<f64>,
}

/// The full foundation-food catalog.
#[derive(Debug, Clone, Default)]
pub struct FdcCatalog {
    ingredients: Vec<FdcIngredient>,
}

impl FdcCatalog {
    /// Load from a gzipped CSV file.
    pub fn from_path(path: &Path, embeddings: &EmbeddingTable) -> ParseResult<Self> {
        let file = File::open(path).map_err(|e| ParseError::Resource {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_reader(GzDecoder::new(file), embeddings).map_err(|e| match e {
            ParseError::Resource { reason, .. } => ParseError::Resource {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    /// Load from an uncompressed CSV reader.
    pub fn from_reader(reader: impl Read, embeddings: &EmbeddingTable) -> ParseResult<Self> {
        let resource_error = |reason: String| ParseError::Resource {
            path: "<catalog>".to_string(),
            reason,
        };

        let mut csv_reader = csv::Reader::from_reader(reader);
        let headers = csv_reader
            .headers()
            .map_err(|e| resource_error(e.to_string()))?
            .clone();
        let column = |name: &str| -> ParseResult<usize> {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| resource_error(format!("missing column '{name}'")))
        };
        let fdc_id_col = column("fdc_id")?;
        let data_type_col = column("data_type")?;
        let description_col = column("description")?;
        let category_col = column("category")?;

        let mut ingredients = Vec::new();
        for record in csv_reader.records() {
            let record = record.map_err(|e| resource_error(e.to_string()))?;
            let field = |col: usize| record.get(col).unwrap_or_default();

            let fdc_id: u32 = field(fdc_id_col)
                .parse()
                .map_err(|_| resource_error(format!("bad fdc_id '{}'", field(fdc_id_col))))?;
            let data_type = FdcDataType::parse(field(data_type_col)).ok_or_else(|| {
                resource_error(format!("unknown data_type '{}'", field(data_type_col)))
            })?;
            let description = field(description_col).to_string();
            let category = field(category_col).to_string();

            let tokens_weights = tokenize_fdc_description(&description, embeddings);
            if tokens_weights.is_empty() {
                tracing::debug!(
                    description,
                    "catalog entry has no tokens in embedding vocabulary"
                );
                continue;
            }
            let (tokens, weights) = tokens_weights.into_iter().unzip();

            ingredients.push(FdcIngredient {
                fdc_id,
                data_type,
                description,
                category,
                tokens,
                weights,
            });
        }

        tracing::debug!(count = ingredients.len(), "loaded FDC ingredients");
        Ok(FdcCatalog { ingredients })
    }

    /// Build directly from prepared entries.
    pub fn from_ingredients(ingredients: Vec<FdcIngredient>) -> Self {
        FdcCatalog { ingredients }
    }

    pub fn ingredients(&self) -> &[FdcIngredient] {
        &self.ingredients
    }

    pub fn len(&self) -> usize {
        self.ingredients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ingredients.is_empty()
    }
}

/// Tokenize an FDC description, returning a weight for every kept token.
///
/// Descriptions are comma-separated phrases of decreasing relevance; each
/// later phrase loses 1e-3 of weight. Tokens after a negation get weight
/// 0, and tokens after a reduced-relevance marker lose 0.5.
pub fn tokenize_fdc_description(
    description: &str,
    embeddings: &EmbeddingTable,
) -> Vec<(String, f64)> {
    let tokens = tokenize(&description.to_lowercase());

    let mut prepared: Vec<(String, f64)> = Vec::new();
    let mut phrase_count = 0usize;
    for phrase in tokens.split(|t| t == ",") {
        if phrase.is_empty() {
            continue;
        }
        let phrase = prepare_tokens_uncached(phrase, embeddings);
        if phrase.is_empty() {
            continue;
        }

        let mut weights = vec![1.0 - phrase_count as f64 * 1e-3; phrase.len()];

        for negation in NEGATION_TOKENS {
            if let Some(position) = phrase.iter().position(|t| t == negation) {
                for weight in weights.iter_mut().skip(position) {
                    *weight = 0.0;
                }
            }
        }
        for marker in REDUCED_RELEVANCE_TOKENS {
            if let Some(position) = phrase.iter().position(|t| t == marker) {
                for weight in weights.iter_mut().skip(position) {
                    *weight = (*weight - 0.5).max(0.0);
                }
            }
        }

        prepared.extend(phrase.into_iter().zip(weights));
        phrase_count += 1;
    }

    prepared
}
