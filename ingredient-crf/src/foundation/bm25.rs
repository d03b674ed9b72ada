//! ATIRE BM25 lexical ranker over the catalog token lists.

use std::collections::HashMap;

use super::catalog::FdcIngredient;

pub(crate) struct Bm25 {
    k1: f64,
    b: f64,
    avgdl: f64,
    doc_len: Vec<usize>,
    /// Term to (ingredient index, frequency) postings.
    t2d: HashMap<String, Vec<(usize, u32)>>,
    idf: HashMap<String, f64>,
}

impl Bm25 {
    pub(crate) fn new(ingredients: &[FdcIngredient], k1: f64, b: f64) -> Self {
        let mut doc_len = Vec::with_capacity(ingredients.len());
        let mut t2d: HashMap<String, HashMap<usize, u32>> = HashMap::new();

        for (i, ingredient) in ingredients.iter().enumerate() {
            doc_len.push(ingredient.tokens.len());
            for token in &ingredient.tokens {
                *t2d.entry(token.clone()).or_default().entry(i).or_insert(0) += 1;
            }
        }

        let corpus_size = doc_len.len();
        let avgdl = if corpus_size == 0 {
            0.0
        } else {
            doc_len.iter().sum::<usize>() as f64 / corpus_size as f64
        };

        let mut postings: HashMap<String, Vec<(usize, u32)>> = HashMap::new();
        let mut idf = HashMap::new();
        for (token, docs) in t2d {
            idf.insert(token.clone(), (corpus_size as f64 / docs.len() as f64).ln());
            let mut entries: Vec<(usize, u32)> = docs.into_iter().collect();
            entries.sort_unstable();
            postings.insert(token, entries);
        }

        Bm25 {
            k1,
            b,
            avgdl,
            doc_len,
            t2d: postings,
            idf,
        }
    }

    /// Score every catalog entry sharing a term with the query, best
    /// first. Entries with no matching term are omitted.
    pub(crate) fn rank(&self, tokens: &[String]) -> Vec<(usize, f64)> {
        let mut scores: HashMap<usize, f64> = HashMap::new();
        for token in tokens {
            let Some(postings) = self.t2d.get(token) else {
                continue;
            };
            let idf = self.idf.get(token).copied().unwrap_or(0.0);
            for &(index, frequency) in postings {
                let frequency = frequency as f64;
                let denom_constant =
                    self.k1 * (1.0 - self.b + self.b * self.doc_len[index] as f64 / self.avgdl);
                *scores.entry(index).or_insert(0.0) +=
                    idf * frequency * (self.k1 + 1.0) / (denom_constant + frequency);
            }
        }

        let mut ranked: Vec<(usize, f64)> = scores.into_iter().collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked
    }
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

    fn query(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_rank_prefers_matching_terms() {
        let corpus = vec![
            ingredient(1, &["wine", "white"]),
            ingredient(2, &["wine", "red"]),
            ingredient(3, &["vinegar", "malt"]),
        ];
        let bm25 = Bm25::new(&corpus, 1.5, 0.75);

        let ranked = bm25.rank(&query(&["white", "wine"]));
        assert_eq!(ranked[0].0, 0);
        assert!(ranked[0].1 > ranked[1].1);
        // The vinegar entry shares no term and is omitted.
        assert!(!ranked.iter().any(|&(i, _)| i == 2));
    }

    #[test]
    fn test_rare_terms_weigh_more() {
        let corpus = vec![
            ingredient(1, &["milk", "whole"]),
            ingredient(2, &["milk", "skim"]),
            ingredient(3, &["milk", "goat"]),
        ];
        let bm25 = Bm25::new(&corpus, 1.5, 0.75);

        // "milk" appears everywhere so its idf is ln(1) = 0.
        let ranked = bm25.rank(&query(&["milk"]));
        assert!(ranked.iter().all(|&(_, s)| s.abs() < 1e-12));

        let ranked = bm25.rank(&query(&["goat"]));
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].0, 2);
        assert!(ranked[0].1 > 0.0);
    }

    #[test]
    fn test_unknown_query_tokens() {
        let corpus = vec![ingredient(1, &["butter"])];
        let bm25 = Bm25::new(&corpus, 1.5, 0.75);
        assert!(bm25.rank(&query(&["absent"])).is_empty());
    }
}
