//! Unsupervised Smooth Inverse Frequency sentence-embedding ranker.
//!
//! Each catalog entry is embedded as the weighted mean of its token
//! vectors, weight a/(a/2 + p(t)) with p estimated from token frequency
//! in the catalog. Scores are cosine distances, smaller is better. The
//! common-component removal of the reference recipe is deliberately not
//! implemented.

use std::collections::HashMap;

use crate::embeddings::{dot, norm, EmbeddingTable};

use super::catalog::FdcIngredient;

pub(crate) struct Usif {
    a: f64,
    min_prob: f64,
    token_prob: HashMap<String, f64>,
    dimension: usize,
    doc_vectors: Vec<Vec<f64>>,
}

impl Usif {
    pub(crate) fn new(embeddings: &EmbeddingTable, ingredients: &[FdcIngredient]) -> Self {
        let token_prob = estimate_token_probability(ingredients);
        let min_prob = token_prob
            .values()
            .copied()
            .fold(f64::INFINITY, f64::min)
            .min(1.0);
        let a = calculate_a_factor(&token_prob, ingredients);

        let mut usif = Usif {
            a,
            min_prob,
            token_prob,
            dimension: embeddings.dimension(),
            doc_vectors: Vec::new(),
        };
        let doc_vectors: Vec<Vec<f64>> = ingredients
            .iter()
            .map(|ingredient| usif.embed(&ingredient.tokens, embeddings))
            .collect();
        usif.doc_vectors = doc_vectors;
        usif
    }

    fn weight(&self, token: &str) -> f64 {
        let probability = self.token_prob.get(token).copied().unwrap_or(self.min_prob);
        self.a / (0.5 * self.a + probability)
    }

    /// Embed a token list as the weighted mean of its per-dimension
    /// normalised token vectors.
    pub(crate) fn embed(&self, tokens: &[String], embeddings: &EmbeddingTable) -> Vec<f64> {
        let vectors: Vec<(&String, &[f64])> = tokens
            .iter()
            .filter_map(|t| embeddings.get(t).map(|v| (t, v)))
            .collect();

        if vectors.is_empty() {
            return vec![self.a; self.dimension];
        }

        // Normalise per dimension across the token vectors.
        let mut column_norms = vec![0.0; self.dimension];
        for (_, vector) in &vectors {
            for (d, value) in vector.iter().enumerate() {
                column_norms[d] += value * value;
            }
        }
        for column_norm in &mut column_norms {
            *column_norm = column_norm.sqrt();
            if *column_norm == 0.0 {
                *column_norm = 1.0;
            }
        }

        let mut mean = vec![0.0; self.dimension];
        for (token, vector) in &vectors {
            let weight = self.weight(token);
            for (d, value) in vector.iter().enumerate() {
                mean[d] += weight * value / column_norms[d];
            }
        }
        for value in &mut mean {
            *value /= vectors.len() as f64;
        }
        mean
    }

    /// Rank every catalog entry by cosine distance to the query
    /// embedding. Smaller scores are better matches.
    pub(crate) fn rank(&self, tokens: &[String], embeddings: &EmbeddingTable) -> Vec<(usize, f64)> {
        let query = self.embed(tokens, embeddings);

        let mut ranked: Vec<(usize, f64)> = self
            .doc_vectors
            .iter()
            .enumerate()
            .map(|(index, vector)| (index, cosine_distance(&query, vector)))
            .collect();
        ranked.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked
    }
}

fn estimate_token_probability(ingredients: &[FdcIngredient]) -> HashMap<String, f64> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for ingredient in ingredients {
        for token in &ingredient.tokens {
            *counts.entry(token.clone()).or_insert(0) += 1;
        }
    }
    let total: usize = counts.values().sum();
    if total == 0 {
        return HashMap::new();
    }
    counts
        .into_iter()
        .map(|(token, count)| (token, count as f64 / total as f64))
        .collect()
}

fn calculate_a_factor(token_prob: &HashMap<String, f64>, ingredients: &[FdcIngredient]) -> f64 {
    let vocab_size = token_prob.len() as f64;
    if vocab_size == 0.0 || ingredients.is_empty() {
        return 1.0;
    }

    let token_count: usize = ingredients.iter().map(|i| i.tokens.len()).sum();
    let average_sentence_length = (token_count / ingredients.len()) as i32;

    let threshold = 1.0 - (1.0 - 1.0 / vocab_size).powi(average_sentence_length);
    let alpha =
        token_prob.values().filter(|&&p| p > threshold).count() as f64 / vocab_size;
    if alpha == 0.0 {
        return 1.0;
    }
    let z = 0.5 * vocab_size;
    (1.0 - alpha) / (alpha * z)
}

fn cosine_distance(a: &[f64], b: &[f64]) -> f64 {
    let denominator = norm(a) * norm(b);
    if denominator == 0.0 {
        return 1.0;
    }
    1.0 - dot(a, b) / denominator
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::FdcDataType;

    fn ingredient(fdc_id: u32, tokens: &[&str]) -> FdcIngredient {
        FdcIngredient {
            fdc_id,
            data_type: FdcDataType::FoundationFood,
            description: tokens.join(" "),
            category: String::new(),
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
            weights: vec![1.0; tokens.len()],
        }
    }

    fn embeddings() -> EmbeddingTable {
        let mut vectors = HashMap::new();
        vectors.insert("wine".to_string(), vec![1.0, 0.1, 0.0]);
        vectors.insert("white".to_string(), vec![0.8, 0.3, 0.1]);
        vectors.insert("red".to_string(), vec![0.7, -0.4, 0.2]);
        vectors.insert("vinegar".to_string(), vec![-0.5, 0.9, 0.4]);
        vectors.insert("malt".to_string(), vec![-0.4, 0.8, 0.6]);
        EmbeddingTable::from_vectors(vectors, 3)
    }

    fn query(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_rank_orders_by_cosine_distance() {
        let corpus = vec![
            ingredient(1, &["white", "wine"]),
            ingredient(2, &["red", "wine"]),
            ingredient(3, &["malt", "vinegar"]),
        ];
        let table = embeddings();
        let usif = Usif::new(&table, &corpus);

        let ranked = usif.rank(&query(&["white", "wine"]), &table);
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].0, 0);
        assert_eq!(ranked[2].0, 2);
        // Scores ascend: smaller distance is a better match.
        assert!(ranked[0].1 <= ranked[1].1);
        assert!(ranked[1].1 <= ranked[2].1);
    }

    #[test]
    fn test_embed_out_of_vocabulary_fallback() {
        let corpus = vec![ingredient(1, &["wine"])];
        let table = embeddings();
        let usif = Usif::new(&table, &corpus);

        let vector = usif.embed(&query(&["quinoa"]), &table);
        assert_eq!(vector.len(), 3);
        assert!(vector.iter().all(|&v| v == vector[0]));
    }

    #[test]
    fn test_every_entry_is_scored() {
        let corpus = vec![
            ingredient(1, &["white", "wine"]),
            ingredient(2, &["malt", "vinegar"]),
        ];
        let table = embeddings();
        let usif = Usif::new(&table, &corpus);
        // Even a query with no shared tokens scores all entries.
        let ranked = usif.rank(&query(&["red"]), &table);
        assert_eq!(ranked.len(), 2);
    }
}
