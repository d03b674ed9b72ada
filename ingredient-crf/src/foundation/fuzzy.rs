//! Fuzzy embedding-distance ranker.
//!
//! Implements a fuzzy document distance: per token pair, the Euclidean
//! distance between embeddings is mapped through 1/(1+exp(-1/d)) to a
//! similarity in (0, 1] (exactly 1 when the distance is 0). Query and
//! candidate token sets combine into a fuzzy Jaccard score; the reported
//! distance is one minus that score, so smaller is better.

use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;

use crate::embeddings::{euclidean_distance, EmbeddingTable};

use super::catalog::FdcIngredient;

const SIMILARITY_CACHE_CAPACITY: usize = 512;

pub(crate) struct FuzzyMatcher {
    /// Pre-computed token vectors per catalog entry.
    fdc_vectors: Vec<Vec<Vec<f64>>>,
    similarity_cache: Mutex<LruCache<(String, String), f64>>,
}

impl FuzzyMatcher {
    pub(crate) fn new(embeddings: &EmbeddingTable, ingredients: &[FdcIngredient]) -> Self {
        let fdc_vectors = ingredients
            .iter()
            .map(|ingredient| {
                ingredient
                    .tokens
                    .iter()
                    .filter_map(|t| embeddings.get(t).map(<[f64]>::to_vec))
                    .collect()
            })
            .collect();

        #[allow(clippy::expect_used)]
        let capacity =
            NonZeroUsize::new(SIMILARITY_CACHE_CAPACITY).expect("cache capacity is non-zero");
        FuzzyMatcher {
            fdc_vectors,
            similarity_cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Similarity between two tokens via the sigmoid-transformed
    /// Euclidean distance of their embeddings. Cached, since the same
    /// token pairs recur across candidates.
    fn token_similarity(
        &self,
        token_a: &str,
        token_b: &str,
        vector_a: &[f64],
        vector_b: &[f64],
    ) -> f64 {
        let key = (token_a.to_string(), token_b.to_string());
        if let Ok(mut cache) = self.similarity_cache.lock() {
            if let Some(&similarity) = cache.get(&key) {
                return similarity;
            }
            let similarity = sigmoid_similarity(euclidean_distance(vector_a, vector_b));
            cache.put(key, similarity);
            similarity
        } else {
            sigmoid_similarity(euclidean_distance(vector_a, vector_b))
        }
    }

    /// Fuzzy document distance between the query tokens and one catalog
    /// entry. Smaller values are closer matches.
    fn fuzzy_document_distance(
        &self,
        query_tokens: &[String],
        query_vectors: &[Vec<f64>],
        fdc_tokens: &[String],
        fdc_vectors: &[Vec<f64>],
    ) -> f64 {
        let mut union_membership = 0.0;
        let mut query_membership = 0.0;
        let mut fdc_membership = 0.0;

        let token_union: HashSet<&String> = query_tokens.iter().chain(fdc_tokens.iter()).collect();
        for &token in &token_union {
            let in_query = query_tokens.iter().position(|t| t == token);
            let in_fdc = fdc_tokens.iter().position(|t| t == token);

            let (token_query_score, token_fdc_score) = match (in_query, in_fdc) {
                (Some(_), Some(_)) => (1.0, 1.0),
                (Some(query_pos), None) => {
                    // Exact match on the query side; find the most similar
                    // candidate token.
                    let best = fdc_tokens
                        .iter()
                        .zip(fdc_vectors.iter())
                        .map(|(fdc_token, fdc_vector)| {
                            self.token_similarity(
                                token,
                                fdc_token,
                                &query_vectors[query_pos],
                                fdc_vector,
                            )
                        })
                        .fold(0.0, f64::max);
                    (1.0, best)
                }
                (None, Some(fdc_pos)) => {
                    let best = query_tokens
                        .iter()
                        .zip(query_vectors.iter())
                        .map(|(query_token, query_vector)| {
                            self.token_similarity(
                                query_token,
                                token,
                                query_vector,
                                &fdc_vectors[fdc_pos],
                            )
                        })
                        .fold(0.0, f64::max);
                    (best, 1.0)
                }
                (None, None) => (0.0, 0.0),
            };

            union_membership += token_query_score * token_fdc_score;
            query_membership += token_query_score;
            fdc_membership += token_fdc_score;
        }

        let denominator = query_membership + fdc_membership - union_membership;
        let score = if denominator > 0.0 {
            union_membership / denominator
        } else {
            0.0
        };
        1.0 - score
    }

    /// Rank catalog entries by fuzzy distance, smallest first. When a
    /// candidate set is given, only those entries are scored.
    pub(crate) fn rank(
        &self,
        tokens: &[String],
        embeddings: &EmbeddingTable,
        ingredients: &[FdcIngredient],
        candidates: Option<&HashSet<usize>>,
    ) -> Vec<(usize, f64)> {
        let query_vectors: Vec<Vec<f64>> = tokens
            .iter()
            .filter_map(|t| embeddings.get(t).map(<[f64]>::to_vec))
            .collect();
        let query_tokens: Vec<String> = tokens
            .iter()
            .filter(|t| embeddings.contains(t))
            .cloned()
            .collect();

        let mut ranked: Vec<(usize, f64)> = ingredients
            .iter()
            .enumerate()
            .filter(|(index, _)| candidates.is_none_or(|set| set.contains(index)))
            .map(|(index, ingredient)| {
                let distance = self.fuzzy_document_distance(
                    &query_tokens,
                    &query_vectors,
                    &ingredient.tokens,
                    &self.fdc_vectors[index],
                );
                (index, distance)
            })
            .collect();
        ranked.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked
    }
}

fn sigmoid_similarity(distance: f64) -> f64 {
    if distance == 0.0 {
        1.0
    } else {
        1.0 / (1.0 + (-1.0 / distance).exp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::FdcDataType;
    use std::collections::HashMap;

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
        vectors.insert("wine".to_string(), vec![1.0, 0.0]);
        vectors.insert("white".to_string(), vec![0.9, 0.1]);
        vectors.insert("pale".to_string(), vec![0.85, 0.15]);
        vectors.insert("vinegar".to_string(), vec![-1.0, 0.5]);
        EmbeddingTable::from_vectors(vectors, 2)
    }

    fn query(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_sigmoid_similarity() {
        assert_eq!(sigmoid_similarity(0.0), 1.0);
        let near = sigmoid_similarity(0.1);
        let far = sigmoid_similarity(10.0);
        assert!(near > far);
        assert!(near > 0.99);
        assert!((0.0..=1.0).contains(&far));
    }

    #[test]
    fn test_identical_documents_have_zero_distance() {
        let table = embeddings();
        let corpus = vec![ingredient(1, &["white", "wine"])];
        let fuzzy = FuzzyMatcher::new(&table, &corpus);
        let ranked = fuzzy.rank(&query(&["white", "wine"]), &table, &corpus, None);
        assert!(ranked[0].1.abs() < 1e-9);
    }

    #[test]
    fn test_rank_orders_by_similarity() {
        let table = embeddings();
        let corpus = vec![
            ingredient(1, &["vinegar"]),
            ingredient(2, &["pale", "wine"]),
        ];
        let fuzzy = FuzzyMatcher::new(&table, &corpus);
        let ranked = fuzzy.rank(&query(&["white", "wine"]), &table, &corpus, None);
        assert_eq!(ranked[0].0, 1);
        assert!(ranked[0].1 < ranked[1].1);
    }

    #[test]
    fn test_candidate_restriction() {
        let table = embeddings();
        let corpus = vec![
            ingredient(1, &["vinegar"]),
            ingredient(2, &["pale", "wine"]),
        ];
        let fuzzy = FuzzyMatcher::new(&table, &corpus);
        let candidates: HashSet<usize> = [0].into_iter().collect();
        let ranked = fuzzy.rank(&query(&["wine"]), &table, &corpus, Some(&candidates));
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].0, 0);
    }
}
