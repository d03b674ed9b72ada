//! Linear-chain CRF inference.
//!
//! The model file holds the label set, sparse per-attribute state weights
//! and a dense label-to-label transition matrix, serialized as gzipped
//! JSON. Weights are log-potentials: the score of a label sequence is the
//! sum of matching state weights (each scaled by its attribute value) plus
//! the transition weights between adjacent labels.
//!
//! Decoding uses Viterbi; per-position marginal probabilities come from
//! the forward-backward recursions in log space.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;

use crate::error::{ParseError, ParseResult};
use crate::features::FeatureVec;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrfModel {
    labels: Vec<String>,
    /// Attribute name to sparse (label index, weight) pairs.
    state_weights: HashMap<String, Vec<(usize, f64)>>,
    /// `transitions[from][to]`, indexed by label position in `labels`.
    transitions: Vec<Vec<f64>>,
}

/// Labels plus the marginal probability of the chosen label at each
/// position.
#[derive(Debug, Clone, PartialEq)]
pub struct TagResult {
    pub labels: Vec<String>,
    pub scores: Vec<f64>,
}

impl CrfModel {
    /// Build a model from its parts. The transition matrix must be square
    /// with one row per label.
    pub fn new(
        labels: Vec<String>,
        state_weights: HashMap<String, Vec<(usize, f64)>>,
        transitions: Vec<Vec<f64>>,
    ) -> ParseResult<Self> {
        let n = labels.len();
        if transitions.len() != n || transitions.iter().any(|row| row.len() != n) {
            return Err(ParseError::Resource {
                path: "<model>".to_string(),
                reason: format!("transition matrix is not {n}x{n}"),
            });
        }
        if let Some(&(label, _)) = state_weights
            .values()
            .flatten()
            .find(|&&(label, _)| label >= n)
        {
            return Err(ParseError::Resource {
                path: "<model>".to_string(),
                reason: format!("state weight refers to label index {label} out of {n}"),
            });
        }
        Ok(CrfModel {
            labels,
            state_weights,
            transitions,
        })
    }

    /// Load a gzipped JSON model file.
    pub fn from_path(path: &Path) -> ParseResult<Self> {
        let file = File::open(path).map_err(|e| ParseError::Resource {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_reader(BufReader::new(GzDecoder::new(file))).map_err(|e| match e {
            ParseError::Resource { reason, .. } => ParseError::Resource {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    /// Load an uncompressed JSON model from a reader.
    pub fn from_reader(reader: impl Read) -> ParseResult<Self> {
        let model: CrfModel = serde_json::from_reader(reader).map_err(|e| ParseError::Resource {
            path: "<model>".to_string(),
            reason: e.to_string(),
        })?;
        CrfModel::new(model.labels, model.state_weights, model.transitions)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Decode the most likely label sequence and the marginal probability
    /// of each chosen label.
    pub fn tag(&self, features: &[FeatureVec]) -> TagResult {
        self.tag_with_marginals(features).0
    }

    /// Decode labels and also return the full per-position, per-label
    /// marginal matrix (label order matches [`CrfModel::labels`]).
    pub fn tag_with_marginals(&self, features: &[FeatureVec]) -> (TagResult, Vec<Vec<f64>>) {
        if features.is_empty() || self.labels.is_empty() {
            return (
                TagResult {
                    labels: Vec::new(),
                    scores: Vec::new(),
                },
                Vec::new(),
            );
        }

        let emissions = self.emission_scores(features);
        let path = self.viterbi(&emissions);
        let marginals = self.marginals_from_emissions(&emissions);

        let labels: Vec<String> = path.iter().map(|&l| self.labels[l].clone()).collect();
        let scores: Vec<f64> = path
            .iter()
            .enumerate()
            .map(|(i, &l)| marginals[i][l])
            .collect();

        (TagResult { labels, scores }, marginals)
    }

    /// Marginal probability of every label at every position.
    pub fn marginals(&self, features: &[FeatureVec]) -> Vec<Vec<f64>> {
        if features.is_empty() || self.labels.is_empty() {
            return Vec::new();
        }
        let emissions = self.emission_scores(features);
        self.marginals_from_emissions(&emissions)
    }

    fn emission_scores(&self, features: &[FeatureVec]) -> Vec<Vec<f64>> {
        features
            .iter()
            .map(|feature_vec| {
                let mut scores = vec![0.0; self.labels.len()];
                for (attribute, value) in feature_vec {
                    if let Some(weights) = self.state_weights.get(attribute) {
                        for &(label, weight) in weights {
                            scores[label] += weight * value;
                        }
                    }
                }
                scores
            })
            .collect()
    }

    fn viterbi(&self, emissions: &[Vec<f64>]) -> Vec<usize> {
        let n_labels = self.labels.len();
        let n = emissions.len();

        let mut score = emissions[0].clone();
        let mut backpointers: Vec<Vec<usize>> = Vec::with_capacity(n);

        for emission in emissions.iter().skip(1) {
            let mut next = vec![f64::NEG_INFINITY; n_labels];
            let mut pointers = vec![0usize; n_labels];
            for (to, next_score) in next.iter_mut().enumerate() {
                for from in 0..n_labels {
                    let candidate = score[from] + self.transitions[from][to];
                    if candidate > *next_score {
                        *next_score = candidate;
                        pointers[to] = from;
                    }
                }
                *next_score += emission[to];
            }
            score = next;
            backpointers.push(pointers);
        }

        let mut best = 0;
        for (label, &s) in score.iter().enumerate() {
            if s > score[best] {
                best = label;
            }
        }

        let mut path = vec![best; n];
        for (i, pointers) in backpointers.iter().enumerate().rev() {
            path[i] = pointers[path[i + 1]];
        }
        path
    }

    fn marginals_from_emissions(&self, emissions: &[Vec<f64>]) -> Vec<Vec<f64>> {
        let n_labels = self.labels.len();
        let n = emissions.len();

        // Forward pass
        let mut alpha: Vec<Vec<f64>> = Vec::with_capacity(n);
        alpha.push(emissions[0].clone());
        for i in 1..n {
            let prev = &alpha[i - 1];
            let mut row = vec![0.0; n_labels];
            for (to, value) in row.iter_mut().enumerate() {
                let terms: Vec<f64> = (0..n_labels)
                    .map(|from| prev[from] + self.transitions[from][to])
                    .collect();
                *value = log_sum_exp(&terms) + emissions[i][to];
            }
            alpha.push(row);
        }

        // Backward pass
        let mut beta = vec![vec![0.0; n_labels]; n];
        for i in (0..n.saturating_sub(1)).rev() {
            for from in 0..n_labels {
                let terms: Vec<f64> = (0..n_labels)
                    .map(|to| self.transitions[from][to] + emissions[i + 1][to] + beta[i + 1][to])
                    .collect();
                beta[i][from] = log_sum_exp(&terms);
            }
        }

        let log_z = log_sum_exp(&alpha[n - 1]);
        (0..n)
            .map(|i| {
                (0..n_labels)
                    .map(|l| (alpha[i][l] + beta[i][l] - log_z).exp())
                    .collect()
            })
            .collect()
    }
}

fn log_sum_exp(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    max + values.iter().map(|v| (v - max).exp()).sum::<f64>().ln()
}
