//! Sentence tokenization and unit singularisation.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::lexicon::PLURAL_TO_SINGULAR;

/// Captures the punctuation marks that become independent tokens.
static PUNCTUATION: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r#"([\(\)\[\]\{\},"/:;])"#).expect("invalid punctuation pattern")
});

/// Tokenize a normalised ingredient sentence.
///
/// The sentence is split on white space, then the punctuation marks
/// `( ) [ ] { } , " / : ;` are split out as separate tokens. A trailing
/// full stop becomes its own token unless it closes an abbreviation
/// (a letter-dot-letter pattern like `e.g.`). Empty tokens are discarded.
///
/// ```
/// use ingredient_crf::tokenize::tokenize;
/// assert_eq!(
///     tokenize("2 cups (500 ml) milk"),
///     vec!["2", "cups", "(", "500", "ml", ")", "milk"]
/// );
/// assert_eq!(
///     tokenize("1-2 mashed bananas: as ripe as possible"),
///     vec!["1-2", "mashed", "bananas", ":", "as", "ripe", "as", "possible"]
/// );
/// ```
pub fn tokenize(sentence: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for word in sentence.split_whitespace() {
        let mut last = 0;
        for m in PUNCTUATION.find_iter(word) {
            if m.start() > last {
                tokens.push(word[last..m.start()].to_string());
            }
            tokens.push(m.as_str().to_string());
            last = m.end();
        }
        if last < word.len() {
            tokens.push(word[last..].to_string());
        }
    }

    // Second pass to separate full stops from the end of tokens.
    let mut separated = Vec::with_capacity(tokens.len());
    for token in tokens {
        if let Some(stripped) = strip_trailing_full_stop(&token) {
            separated.push(stripped.to_string());
            separated.push(".".to_string());
        } else {
            separated.push(token);
        }
    }
    separated.retain(|t| !t.is_empty());
    separated
}

/// If the token ends with a full stop that is not part of an abbreviation,
/// return the token without it.
///
/// A full stop preceded by a dot-letter pair (`e.g.`, `No.1.`-style
/// abbreviations) stays attached.
fn strip_trailing_full_stop(token: &str) -> Option<&str> {
    let stripped = token.strip_suffix('.')?;
    if stripped.is_empty() {
        return None;
    }
    let chars: Vec<char> = stripped.chars().collect();
    if chars.len() >= 2 {
        let last = chars[chars.len() - 1];
        let second_last = chars[chars.len() - 2];
        if second_last == '.' && (last.is_alphanumeric() || last == '_') {
            return None;
        }
    }
    Some(stripped)
}

/// Singularise recognised plural units in a tokenized sentence.
///
/// Returns the modified tokens and the indices of the tokens that were
/// changed, so the plural spelling can be restored for tokens whose final
/// label turns out not to be UNIT.
pub fn singularize_units(tokens: Vec<String>) -> (Vec<String>, Vec<usize>) {
    let mut singularized_indices = Vec::new();
    let mut tokens = tokens;
    for (idx, token) in tokens.iter_mut().enumerate() {
        if let Some(&singular) = PLURAL_TO_SINGULAR.get(token.as_str()) {
            *token = singular.to_string();
            singularized_indices.push(idx);
        }
    }
    (tokens, singularized_indices)
}

/// True if the token represents a number: integers, decimals, ranges
/// (`1-2`), multipliers (`2x`), fraction sentinels, number words and
/// `dozen`.
///
/// `00` is a special case that does not represent a number ("Type 00
/// flour").
pub fn is_numeric_token(token: &str) -> bool {
    if token == "00" {
        return false;
    }

    if crate::normalize::is_fraction_token(token) {
        return true;
    }

    let lowered = token.to_lowercase();
    if crate::lexicon::STRING_NUMBERS
        .iter()
        .any(|&(word, _)| word == lowered)
    {
        return true;
    }

    if token.contains('-') {
        return token
            .split('-')
            .all(|part| !part.is_empty() && is_numeric_token(part));
    }

    if token == "dozen" {
        return true;
    }

    if let Some(prefix) = token.strip_suffix('x') {
        return prefix.parse::<f64>().is_ok();
    }

    token.parse::<f64>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric_token() {
        assert!(is_numeric_token("1"));
        assert!(is_numeric_token("2.5"));
        assert!(is_numeric_token("1-2"));
        assert!(is_numeric_token("dozen"));
        assert!(is_numeric_token("1x"));
        assert!(is_numeric_token("three"));
        assert!(is_numeric_token("#1$2"));
        assert!(is_numeric_token("1#1$2"));
        assert!(is_numeric_token("#1$4-#1$2"));
        assert!(!is_numeric_token("00"));
        assert!(!is_numeric_token("beef"));
        assert!(!is_numeric_token("1-"));
    }

    #[test]
    fn test_tokenize_punctuation() {
        assert_eq!(
            tokenize("1.5 kg bananas, mashed"),
            vec!["1.5", "kg", "bananas", ",", "mashed"]
        );
        assert_eq!(
            tokenize("Freshly grated Parmesan cheese, for garnish."),
            vec!["Freshly", "grated", "Parmesan", "cheese", ",", "for", "garnish", "."]
        );
    }

    #[test]
    fn test_tokenize_abbreviation_keeps_full_stop() {
        assert_eq!(
            tokenize("chillies e.g. jalapeno"),
            vec!["chillies", "e.g.", "jalapeno"]
        );
    }

    #[test]
    fn test_tokenize_empty_tokens_discarded() {
        assert_eq!(tokenize("  2   cups  "), vec!["2", "cups"]);
        assert_eq!(
            tokenize("salt/pepper"),
            vec!["salt", "/", "pepper"]
        );
    }

    #[test]
    fn test_tokenize_decimal_not_split() {
        assert_eq!(tokenize("1.5 kg"), vec!["1.5", "kg"]);
        assert_eq!(tokenize("approx. 250 g"), vec!["approx", ".", "250", "g"]);
    }

    #[test]
    fn test_singularize_units() {
        let tokens = tokenize("2 cups (500 ml) milk");
        let (tokens, indices) = singularize_units(tokens);
        assert_eq!(tokens, vec!["2", "cup", "(", "500", "ml", ")", "milk"]);
        assert_eq!(indices, vec![1]);
    }

    #[test]
    fn test_singularize_irregular_plural() {
        let (tokens, indices) = singularize_units(vec!["2".to_string(), "loaves".to_string()]);
        assert_eq!(tokens, vec!["2", "loaf"]);
        assert_eq!(indices, vec![1]);
    }
}
