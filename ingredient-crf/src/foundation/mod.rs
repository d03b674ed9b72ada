//! Foundation-food resolution.
//!
//! Maps a parsed ingredient name to one entry of the Food Data Central
//! catalog. Three rankers score the whole catalog: BM25 over the entry
//! token lists, uSIF sentence-embedding cosine distance, and (when the
//! first two disagree) a fuzzy per-token embedding distance. Their score
//! distributions are normalised and fused, weighted by a per-ranker
//! confidence estimate.

pub mod catalog;

mod bm25;
mod fuzzy;
mod usif;

use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;

use crate::embeddings::EmbeddingTable;
use crate::lexicon::AMBIGUOUS_ADJECTIVES;
use crate::output::{FdcDataType, FoundationFood};
use crate::postprocess::round6;
use crate::stem::stem;

use bm25::Bm25;
pub use catalog::{FdcCatalog, FdcIngredient};
use fuzzy::FuzzyMatcher;
use usif::Usif;

/// Top matches considered wherever the candidate set is limited.
const TOP_K: usize = 100;

/// Rank-biased overlap below which the fuzzy ranker arbitrates.
const AGREEMENT_THRESHOLD: f64 = 0.2;

/// RBO persistence parameter; expected evaluation depth ~20.
const RBO_PERSISTENCE: f64 = 0.95;

const PREPARED_CACHE_CAPACITY: usize = 512;

/// Phrase spelling substitutions applied to stemmed name tokens, mapping
/// regional spellings onto the catalog's vocabulary.
static PHRASE_SUBSTITUTIONS: &[(&[&str], &[&str])] = &[
    (&["doubl", "cream"], &["heavi", "cream"]),
    (&["glac", "cherri"], &["maraschino", "cherri"]),
    (&["ice", "sugar"], &["powder", "sugar"]),
    (&["mang", "tout"], &["snow", "pea"]),
    (&["plain", "flour"], &["all", "purpos", "flour"]),
    (&["singl", "cream"], &["light", "cream"]),
    (&["haa", "avocado"], &["hass", "avocado"]),
];

static TOKEN_TO_PHRASE_SUBSTITUTIONS: &[(&str, &[&str])] = &[
    ("lemongrass", &["lemon", "grass"]),
    ("water", &["tap", "water"]),
];

static TOKEN_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("aubergin", "eggplant"),
    ("beetroot", "beet"),
    ("capsicum", "bell"),
    ("chile", "chili"),
    ("chilli", "chili"),
    ("coriand", "cilantro"),
    ("cornflour", "cornstarch"),
    ("courgett", "zucchini"),
    ("gherkin", "pickl"),
    ("mangetout", "snowpea"),
    ("mint", "spearmint"),
    ("prawn", "shrimp"),
    ("rocket", "arugula"),
    ("swede", "rutabaga"),
    ("yoghurt", "yogurt"),
];

/// Names that bypass ranking entirely. Single-token names give the
/// embedding rankers too little to work with, so the common ones are
/// pinned to their catalog entry.
static OVERRIDES: &[(&[&str], &str, u32, &str)] = &[
    (&["salt"], "Salt, table, iodized", 746775, "Spices and Herbs"),
    (&["sea", "salt"], "Salt, table, iodized", 746775, "Spices and Herbs"),
    (
        &["egg"],
        "Eggs, Grade A, Large, egg whole",
        748967,
        "Dairy and Egg Products",
    ),
    (
        &["butter"],
        "Butter, stick, unsalted",
        789828,
        "Dairy and Egg Products",
    ),
    (
        &["all-purpos", "flour"],
        "Flour, wheat, all-purpose, unenriched, unbleached",
        790018,
        "Cereal Grains and Pasta",
    ),
    (
        &["all", "purpos", "flour"],
        "Flour, wheat, all-purpose, unenriched, unbleached",
        790018,
        "Cereal Grains and Pasta",
    ),
];

/// Verb stems indicating the food is not raw; their absence biases the
/// query towards the raw catalog entry.
static NON_RAW_FOOD_VERB_STEMS: &[&str] = &[
    "age", "bake", "black", "blanch", "boil", "brais", "brew", "broil", "butter", "can", "cook",
    "crisp", "cultur", "cure", "decaffein", "dehydr", "devil", "distil", "dri", "ferment",
    "flavor", "fortifi", "fresh", "fri", "grill", "ground", "heat", "hull", "microwav", "parboil",
    "pasteur", "pickl", "poach", "precook", "prepar", "preserv", "powder", "raw", "reconstitut",
    "refin", "refri", "reheat", "rehydr", "render", "roast", "simmer", "smoke", "soak", "spice",
    "steam", "stew", "toast", "unbak", "unsalt",
];

/// Resolves parsed ingredient names against the FDC catalog.
pub struct FoundationFoodResolver {
    embeddings: Arc<EmbeddingTable>,
    catalog: FdcCatalog,
    bm25: Bm25,
    usif: Usif,
    fuzzy: FuzzyMatcher,
    prepared_cache: Mutex<LruCache<Vec<String>, Vec<String>>>,
}

impl FoundationFoodResolver {
    pub fn new(embeddings: Arc<EmbeddingTable>, catalog: FdcCatalog) -> Self {
        tracing::debug!(entries = catalog.len(), "initializing foundation food rankers");
        let bm25 = Bm25::new(catalog.ingredients(), 1.5, 0.75);
        let usif = Usif::new(&embeddings, catalog.ingredients());
        let fuzzy = FuzzyMatcher::new(&embeddings, catalog.ingredients());

        #[allow(clippy::expect_used)]
        let capacity =
            NonZeroUsize::new(PREPARED_CACHE_CAPACITY).expect("cache capacity is non-zero");
        FoundationFoodResolver {
            embeddings,
            catalog,
            bm25,
            usif,
            fuzzy,
            prepared_cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn catalog(&self) -> &FdcCatalog {
        &self.catalog
    }

    /// Match an ingredient name to a catalog entry.
    ///
    /// Returns `None` when the name has no tokens in the embedding
    /// vocabulary or no catalog entry matches confidently enough; that is
    /// an expected outcome, not an error.
    pub fn resolve(
        &self,
        tokens: &[String],
        pos_tags: &[&str],
        name_index: usize,
    ) -> Option<FoundationFood> {
        let tokens = strip_ambiguous_leading_adjectives(tokens, pos_tags);
        tracing::debug!(?tokens, "matching foundation food for name tokens");

        let prepared = self.prepare_tokens(&tokens);
        if prepared.is_empty() {
            tracing::debug!("name has no tokens in embedding vocabulary");
            return None;
        }

        let mut normalized = normalize_spelling(&prepared);

        if let Some(food) = self.override_for(&normalized, name_index) {
            tracing::debug!("returning foundation food from override list");
            return Some(food);
        }

        // Bias towards the raw catalog entry unless the name already says
        // the food is cooked or otherwise processed.
        if !normalized
            .iter()
            .any(|t| NON_RAW_FOOD_VERB_STEMS.contains(&t.as_str()))
        {
            normalized.push("raw".to_string());
        }

        let usif_matches = self.usif.rank(&normalized, &self.embeddings);
        let bm25_matches = self.bm25.rank(&normalized);

        let agreement = rank_biased_overlap(
            &top_indices(&bm25_matches, TOP_K),
            &top_indices(&usif_matches, TOP_K),
            RBO_PERSISTENCE,
        );
        let fuzzy_matches = if agreement < AGREEMENT_THRESHOLD {
            tracing::debug!(agreement, "BM25 and uSIF disagree; running fuzzy ranker");
            let candidates: HashSet<usize> = top_indices(&bm25_matches, TOP_K)
                .into_iter()
                .chain(top_indices(&usif_matches, TOP_K))
                .collect();
            self.fuzzy.rank(
                &normalized,
                &self.embeddings,
                self.catalog.ingredients(),
                Some(&candidates),
            )
        } else {
            Vec::new()
        };

        let fused = self.fuse_results(&bm25_matches, &fuzzy_matches, &usif_matches);
        let (best_index, best_score) = *fused.first()?;

        if let Some(&(_, second_score)) = fused.get(1) {
            if best_score < 0.95 && percent_difference(best_score, second_score) <= 0.01 {
                tracing::debug!("no foundation food with a good enough match");
                return None;
            }
        }

        let entry = &self.catalog.ingredients()[best_index];
        Some(FoundationFood {
            text: entry.description.clone(),
            confidence: round6(best_score),
            fdc_id: entry.fdc_id,
            category: entry.category.clone(),
            data_type: entry.data_type,
            name_index,
        })
    }

    fn override_for(&self, tokens: &[String], name_index: usize) -> Option<FoundationFood> {
        for &(key, description, fdc_id, category) in OVERRIDES {
            if tokens.len() == key.len() && tokens.iter().zip(key.iter()).all(|(t, k)| t == k) {
                return Some(FoundationFood {
                    text: description.to_string(),
                    confidence: 1.0,
                    fdc_id,
                    category: category.to_string(),
                    data_type: FdcDataType::FoundationFood,
                    name_index,
                });
            }
        }
        None
    }

    /// Cached token preparation; see [`prepare_tokens_uncached`].
    fn prepare_tokens(&self, tokens: &[String]) -> Vec<String> {
        let key: Vec<String> = tokens.to_vec();
        if let Ok(mut cache) = self.prepared_cache.lock() {
            if let Some(prepared) = cache.get(&key) {
                return prepared.clone();
            }
            let prepared = prepare_tokens_uncached(tokens, &self.embeddings);
            cache.put(key, prepared.clone());
            prepared
        } else {
            prepare_tokens_uncached(tokens, &self.embeddings)
        }
    }

    /// Distribution-based score fusion.
    ///
    /// Each ranker's top scores are min-max normalised (uSIF and fuzzy
    /// are inverted afterwards so larger is better) and summed, weighted
    /// by a confidence estimate per ranker. The weights are scaled to sum
    /// to 3 and the fused score divided by 3, keeping it in [0, 1].
    fn fuse_results(
        &self,
        bm25_matches: &[(usize, f64)],
        fuzzy_matches: &[(usize, f64)],
        usif_matches: &[(usize, f64)],
    ) -> Vec<(usize, f64)> {
        let bm25_matches = &bm25_matches[..bm25_matches.len().min(TOP_K)];
        let usif_matches = &usif_matches[..usif_matches.len().min(TOP_K)];
        let fuzzy_matches = &fuzzy_matches[..fuzzy_matches.len().min(TOP_K)];

        let bm25_normalized = normalize_scores(bm25_matches);
        let usif_normalized = normalize_scores(usif_matches);
        let fuzzy_normalized = normalize_scores(fuzzy_matches);

        let mut bm25_confidence = estimate_ranker_confidence(&bm25_normalized);
        let mut usif_confidence = estimate_ranker_confidence(&usif_normalized);
        let mut fuzzy_confidence = estimate_ranker_confidence(&fuzzy_normalized);
        let total = bm25_confidence + usif_confidence + fuzzy_confidence;
        if total > 0.0 {
            bm25_confidence = bm25_confidence / total * 3.0;
            usif_confidence = usif_confidence / total * 3.0;
            fuzzy_confidence = fuzzy_confidence / total * 3.0;
        } else {
            bm25_confidence = 1.0;
            usif_confidence = 1.0;
            fuzzy_confidence = 1.0;
        }
        tracing::debug!(
            bm25 = bm25_confidence,
            usif = usif_confidence,
            fuzzy = fuzzy_confidence,
            "ranker confidences"
        );

        let bm25_scores: std::collections::HashMap<usize, f64> =
            bm25_normalized.iter().copied().collect();
        let usif_scores: std::collections::HashMap<usize, f64> =
            usif_normalized.iter().copied().collect();
        let fuzzy_scores: std::collections::HashMap<usize, f64> =
            fuzzy_normalized.iter().copied().collect();

        let candidates: HashSet<usize> = bm25_matches
            .iter()
            .chain(usif_matches.iter())
            .map(|&(index, _)| index)
            .collect();

        let mut fused: Vec<(usize, f64)> = candidates
            .into_iter()
            .map(|index| {
                let bm25_score = bm25_scores.get(&index).copied().unwrap_or(0.0);
                // uSIF and fuzzy scores are distances; after normalisation
                // subtract from one so bigger means better.
                let usif_score = 1.0 - usif_scores.get(&index).copied().unwrap_or(1.0);
                let fuzzy_score = 1.0 - fuzzy_scores.get(&index).copied().unwrap_or(1.0);

                let fused_score = bm25_confidence * bm25_score
                    + usif_confidence * usif_score
                    + fuzzy_confidence * fuzzy_score;
                (index, fused_score / 3.0)
            })
            .collect();

        let ingredients = self.catalog.ingredients();
        fused.sort_by(|&(index_a, score_a), &(index_b, score_b)| {
            score_b
                .partial_cmp(&score_a)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| ingredients[index_b].data_type.cmp(&ingredients[index_a].data_type))
        });
        fused
    }
}

/// Prepare name tokens for the embedding-based matchers: split hyphenated
/// tokens, drop numerics, punctuation and single characters, stem, apply
/// spelling substitutions and keep only vocabulary tokens.
pub(crate) fn prepare_tokens_uncached(
    tokens: &[String],
    embeddings: &EmbeddingTable,
) -> Vec<String> {
    let mut split_tokens: Vec<&str> = Vec::new();
    for token in tokens {
        if token.contains('-') {
            split_tokens.extend(token.split('-').filter(|t| !t.is_empty()));
        } else {
            split_tokens.push(token.as_str());
        }
    }

    let stemmed: Vec<String> = split_tokens
        .iter()
        .filter(|t| {
            t.chars().count() > 1
                && !t.chars().all(|c| c.is_numeric())
                && !t.chars().all(|c| c.is_ascii_punctuation())
                && !t.chars().all(char::is_whitespace)
        })
        .map(|t| stem(&t.to_lowercase()))
        .collect();

    normalize_spelling(&stemmed)
        .into_iter()
        .filter(|t| embeddings.contains(t))
        .collect()
}

/// Normalise stemmed token spellings to those used by the catalog, e.g.
/// `courgett` -> `zucchini`, `doubl cream` -> `heavi cream`.
pub(crate) fn normalize_spelling(tokens: &[String]) -> Vec<String> {
    let mut normalized = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].to_lowercase();
        let next = tokens.get(i + 1).map(|t| t.to_lowercase());

        if let Some(next) = &next {
            if let Some(&(_, replacement)) = PHRASE_SUBSTITUTIONS
                .iter()
                .find(|&&(phrase, _)| phrase == [token.as_str(), next.as_str()])
            {
                normalized.extend(replacement.iter().map(|t| t.to_string()));
                i += 2;
                continue;
            }
        }

        if let Some(&(_, replacement)) = TOKEN_TO_PHRASE_SUBSTITUTIONS
            .iter()
            .find(|&&(key, _)| key == token)
        {
            normalized.extend(replacement.iter().map(|t| t.to_string()));
        } else if let Some(&(_, replacement)) =
            TOKEN_SUBSTITUTIONS.iter().find(|&&(key, _)| key == token)
        {
            normalized.push(replacement.to_string());
        } else {
            normalized.push(token);
        }
        i += 1;
    }
    normalized
}

/// Strip leading adjectives that are ambiguous between a sensory and a
/// state reading ("hot" as temperature vs spiciness). If stripping would
/// remove every token, the original list is kept.
pub(crate) fn strip_ambiguous_leading_adjectives(
    tokens: &[String],
    pos_tags: &[&str],
) -> Vec<String> {
    let mut start = 0;
    while start < tokens.len()
        && pos_tags.get(start).is_some_and(|tag| tag.starts_with('J'))
        && AMBIGUOUS_ADJECTIVES.contains(&tokens[start].to_lowercase().as_str())
    {
        start += 1;
    }
    if start >= tokens.len() {
        return tokens.to_vec();
    }
    tokens[start..].to_vec()
}

fn top_indices(matches: &[(usize, f64)], k: usize) -> Vec<usize> {
    matches.iter().take(k).map(|&(index, _)| index).collect()
}

/// Rank-Biased Overlap between two ranked lists of catalog indices.
///
/// The persistence parameter sets how top-weighted the measure is; at
/// p = 0.95 the expected evaluation depth is about 20. Both lists are
/// evaluated to the depth of the shorter one.
pub(crate) fn rank_biased_overlap(a: &[usize], b: &[usize], p: f64) -> f64 {
    let depth_limit = a.len().min(b.len());
    if depth_limit == 0 {
        return 0.0;
    }

    let mut seen_a: HashSet<usize> = HashSet::new();
    let mut seen_b: HashSet<usize> = HashSet::new();
    let mut rbo_sum = 0.0;
    for depth in 1..=depth_limit {
        seen_a.insert(a[depth - 1]);
        seen_b.insert(b[depth - 1]);

        let overlap = seen_a.intersection(&seen_b).count() as f64;
        let agreement = overlap / depth as f64;
        rbo_sum += agreement * p.powi(depth as i32);
    }

    (1.0 - p) * rbo_sum
}

/// Relative difference between two scores, in [0, 1].
fn percent_difference(score_a: f64, score_b: f64) -> f64 {
    if score_a == score_b {
        return 0.0;
    }
    let max_score = score_a.max(score_b);
    let min_score = score_a.min(score_b);
    (max_score - min_score) / max_score
}

/// Min-max normalise ranker scores to [0, 1], keeping the index pairing.
/// Identical scores collapse to 0.5.
fn normalize_scores(matches: &[(usize, f64)]) -> Vec<(usize, f64)> {
    if matches.is_empty() {
        return Vec::new();
    }

    let first = matches[0].1;
    if matches.iter().all(|&(_, s)| s == first) {
        return matches.iter().map(|&(index, _)| (index, 0.5)).collect();
    }

    let min = matches.iter().map(|&(_, s)| s).fold(f64::INFINITY, f64::min);
    let max = matches
        .iter()
        .map(|&(_, s)| s)
        .fold(f64::NEG_INFINITY, f64::max);
    let range = (max - min).max(1e-9);

    matches
        .iter()
        .map(|&(index, score)| {
            let normalized = ((score - min) / range).clamp(0.0, 1.0);
            (index, normalized)
        })
        .collect()
}

/// Confidence of a ranker from the spread of its normalised scores: the
/// relative gap between the best two scores, blended with how
/// concentrated the rest of the distribution is.
fn estimate_ranker_confidence(normalized: &[(usize, f64)]) -> f64 {
    if normalized.len() < 2 {
        return 0.0;
    }

    let mut scores: Vec<f64> = normalized.iter().map(|&(_, s)| s).collect();
    scores.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    let max_score = scores[0];
    let second = scores[1];

    let relative_gap = if max_score > 0.0 {
        (max_score - second) / max_score
    } else {
        0.0
    };

    let distribution_factor = if scores.len() > 2 {
        let remaining = &scores[1..];
        let remaining_mean = remaining.iter().sum::<f64>() / remaining.len() as f64;
        if remaining_mean > 0.0 {
            let variance = remaining
                .iter()
                .map(|s| (s - remaining_mean) * (s - remaining_mean))
                .sum::<f64>()
                / remaining.len() as f64;
            let coefficient_of_variation = variance.sqrt() / remaining_mean;
            1.0 / (1.0 + coefficient_of_variation)
        } else {
            1.0
        }
    } else {
        1.0
    };

    0.7 * relative_gap + 0.3 * distribution_factor
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn ingredient(
        fdc_id: u32,
        data_type: FdcDataType,
        description: &str,
        category: &str,
        tokens: &[&str],
    ) -> FdcIngredient {
        FdcIngredient {
            fdc_id,
            data_type,
            description: description.to_string(),
            category: category.to_string(),
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
            weights: vec![1.0; tokens.len()],
        }
    }

    fn embeddings() -> Arc<EmbeddingTable> {
        let entries: &[(&str, [f64; 3])] = &[
            ("wine", [1.0, 0.1, 0.0]),
            ("white", [0.8, 0.3, 0.1]),
            ("red", [0.7, -0.4, 0.2]),
            ("vinegar", [-0.5, 0.9, 0.4]),
            ("malt", [-0.4, 0.8, 0.6]),
            ("egg", [0.2, 0.2, 0.9]),
            ("salt", [0.1, -0.8, 0.3]),
            ("raw", [0.0, 0.0, 0.1]),
        ];
        let vectors: HashMap<String, Vec<f64>> = entries
            .iter()
            .map(|&(t, v)| (t.to_string(), v.to_vec()))
            .collect();
        Arc::new(EmbeddingTable::from_vectors(vectors, 3))
    }

    fn resolver() -> FoundationFoodResolver {
        let catalog = FdcCatalog::from_ingredients(vec![
            ingredient(
                1,
                FdcDataType::FoundationFood,
                "Wine, white",
                "Beverages",
                &["wine", "white"],
            ),
            ingredient(
                2,
                FdcDataType::SrLegacyFood,
                "Wine, red",
                "Beverages",
                &["wine", "red"],
            ),
            ingredient(
                3,
                FdcDataType::FoundationFood,
                "Vinegar, malt",
                "Condiments",
                &["vinegar", "malt"],
            ),
        ]);
        FoundationFoodResolver::new(embeddings(), catalog)
    }

    fn name(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_override_match() {
        let resolver = resolver();
        let food = resolver.resolve(&name(&["egg"]), &["NN"], 0).unwrap();
        assert_eq!(food.fdc_id, 748967);
        assert_eq!(food.confidence, 1.0);
        assert_eq!(food.data_type, FdcDataType::FoundationFood);
    }

    #[test]
    fn test_ranked_match() {
        let resolver = resolver();
        let food = resolver
            .resolve(&name(&["white", "wine"]), &["JJ", "NN"], 0)
            .unwrap();
        assert!(food.text.to_lowercase().contains("wine"));
        assert!(matches!(
            food.data_type,
            FdcDataType::FoundationFood | FdcDataType::SrLegacyFood
        ));
        assert!((0.0..=1.0).contains(&food.confidence));
    }

    #[test]
    fn test_out_of_vocabulary_name() {
        let resolver = resolver();
        assert!(resolver.resolve(&name(&["lionfish"]), &["NN"], 0).is_none());
    }

    #[test]
    fn test_strip_ambiguous_leading_adjectives() {
        let stripped = strip_ambiguous_leading_adjectives(
            &name(&["hot", "chicken", "stock"]),
            &["JJ", "NN", "NN"],
        );
        assert_eq!(stripped, name(&["chicken", "stock"]));

        // Stripping everything reverts to the original list.
        let stripped = strip_ambiguous_leading_adjectives(&name(&["hot"]), &["JJ"]);
        assert_eq!(stripped, name(&["hot"]));

        // Non-adjective "hot" is kept.
        let stripped = strip_ambiguous_leading_adjectives(&name(&["hot", "dog"]), &["NN", "NN"]);
        assert_eq!(stripped, name(&["hot", "dog"]));
    }

    #[test]
    fn test_normalize_spelling() {
        assert_eq!(
            normalize_spelling(&name(&["doubl", "cream"])),
            name(&["heavi", "cream"])
        );
        assert_eq!(normalize_spelling(&name(&["courgett"])), name(&["zucchini"]));
        assert_eq!(
            normalize_spelling(&name(&["lemongrass"])),
            name(&["lemon", "grass"])
        );
        assert_eq!(normalize_spelling(&name(&["beef"])), name(&["beef"]));
    }

    #[test]
    fn test_rank_biased_overlap() {
        let a = vec![1, 2, 3, 4, 5];
        let b = vec![1, 2, 3, 4, 5];
        let identical = rank_biased_overlap(&a, &b, 0.95);

        let c = vec![6, 7, 8, 9, 10];
        let disjoint = rank_biased_overlap(&a, &c, 0.95);
        assert_eq!(disjoint, 0.0);
        assert!(identical > disjoint);

        let d = vec![1, 2, 9, 10, 11];
        let partial = rank_biased_overlap(&a, &d, 0.95);
        assert!(partial > 0.0 && partial < identical);
    }

    #[test]
    fn test_normalize_scores() {
        let normalized = normalize_scores(&[(0, 10.0), (1, 5.0), (2, 0.0)]);
        assert_eq!(normalized[0].1, 1.0);
        assert_eq!(normalized[1].1, 0.5);
        assert_eq!(normalized[2].1, 0.0);

        // Identical scores collapse to 0.5.
        let normalized = normalize_scores(&[(0, 3.0), (1, 3.0)]);
        assert!(normalized.iter().all(|&(_, s)| s == 0.5));

        assert!(normalize_scores(&[]).is_empty());
    }

    #[test]
    fn test_estimate_ranker_confidence() {
        // A clear winner gives more confidence than a flat distribution.
        let confident = estimate_ranker_confidence(&[(0, 1.0), (1, 0.2), (2, 0.19), (3, 0.21)]);
        let unsure = estimate_ranker_confidence(&[(0, 1.0), (1, 0.99), (2, 0.98), (3, 0.97)]);
        assert!(confident > unsure);
        assert_eq!(estimate_ranker_confidence(&[(0, 1.0)]), 0.0);
    }

    #[test]
    fn test_percent_difference() {
        assert_eq!(percent_difference(1.0, 1.0), 0.0);
        assert!((percent_difference(1.0, 0.5) - 0.5).abs() < 1e-9);
        assert!((percent_difference(0.5, 1.0) - 0.5).abs() < 1e-9);
    }
}
