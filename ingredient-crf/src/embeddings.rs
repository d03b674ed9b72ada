//! Word embedding table.
//!
//! Loads a gzipped word2vec-style text file: the first line is
//! `vocab_size dimension`, each following line a token and its vector
//! components separated by spaces. The table is read-only after loading
//! and shared by the feature emitter and the foundation-food rankers.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::GzDecoder;

use crate::error::{ParseError, ParseResult};

#[derive(Debug, Clone)]
pub struct EmbeddingTable {
    vectors: HashMap<String, Vec<f64>>,
    dimension: usize,
}

impl EmbeddingTable {
    /// Load from a gzipped word2vec text file.
    pub fn from_path(path: &Path) -> ParseResult<Self> {
        let file = File::open(path).map_err(|e| ParseError::Resource {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let reader = BufReader::new(GzDecoder::new(file));
        Self::from_reader(reader).map_err(|e| match e {
            ParseError::Resource { reason, .. } => ParseError::Resource {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    /// Load from an uncompressed reader. The format is identical to the
    /// file format minus the gzip layer; tests feed in-memory fixtures
    /// through this.
    pub fn from_reader(reader: impl BufRead) -> ParseResult<Self> {
        let resource_error = |reason: String| ParseError::Resource {
            path: "<embeddings>".to_string(),
            reason,
        };

        let mut lines = reader.lines();
        let header = lines
            .next()
            .ok_or_else(|| resource_error("empty embeddings file".to_string()))?
            .map_err(|e| resource_error(e.to_string()))?;
        let mut parts = header.split_whitespace();
        let vocab_size: usize = parts
            .next()
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| resource_error(format!("malformed header: '{header}'")))?;
        let dimension: usize = parts
            .next()
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| resource_error(format!("malformed header: '{header}'")))?;

        let mut vectors = HashMap::with_capacity(vocab_size);
        for line in lines {
            let line = line.map_err(|e| resource_error(e.to_string()))?;
            if line.trim().is_empty() {
                continue;
            }
            let mut parts = line.split_whitespace();
            let token = parts
                .next()
                .ok_or_else(|| resource_error("empty vector line".to_string()))?
                .to_string();
            let vector: Vec<f64> = parts
                .map(|v| {
                    v.parse::<f64>()
                        .map_err(|_| resource_error(format!("bad vector component for '{token}'")))
                })
                .collect::<ParseResult<_>>()?;
            if vector.len() != dimension {
                return Err(resource_error(format!(
                    "vector for '{token}' has {} components, expected {dimension}",
                    vector.len()
                )));
            }
            vectors.insert(token, vector);
        }

        Ok(EmbeddingTable { vectors, dimension })
    }

    /// Build directly from token/vector pairs. All vectors must share the
    /// given dimension.
    pub fn from_vectors(vectors: HashMap<String, Vec<f64>>, dimension: usize) -> Self {
        EmbeddingTable { vectors, dimension }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.vectors.contains_key(token)
    }

    pub fn get(&self, token: &str) -> Option<&[f64]> {
        self.vectors.get(token).map(Vec::as_slice)
    }
}

/// Euclidean norm of a vector.
pub(crate) fn norm(vector: &[f64]) -> f64 {
    vector.iter().map(|v| v * v).sum::<f64>().sqrt()
}

/// Euclidean distance between two vectors.
pub(crate) fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Dot product of two vectors.
pub(crate) fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
