use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// Sub-labels for tokens that form part of an ingredient name.
///
/// The name labels follow a BIO-like scheme: a name is rooted at a
/// `BeginTok` token and extended by `InsideTok` tokens, while `Variant`
/// tokens introduce alternatives ("beef or chicken stock") and `Modifier`
/// tokens apply to every following name ("hot beef or chicken stock").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NameLabel {
    BeginTok,
    InsideTok,
    Variant,
    Modifier,
    Separator,
}

/// Label assigned to a token by the sequence labeler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    Qty,
    Unit,
    Size,
    Prep,
    Purpose,
    Comment,
    Punc,
    Name(NameLabel),
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Qty => "QTY",
            Label::Unit => "UNIT",
            Label::Size => "SIZE",
            Label::Prep => "PREP",
            Label::Purpose => "PURPOSE",
            Label::Comment => "COMMENT",
            Label::Punc => "PUNC",
            Label::Name(NameLabel::BeginTok) => "B_NAME_TOK",
            Label::Name(NameLabel::InsideTok) => "I_NAME_TOK",
            Label::Name(NameLabel::Variant) => "NAME_VAR",
            Label::Name(NameLabel::Modifier) => "NAME_MOD",
            Label::Name(NameLabel::Separator) => "NAME_SEP",
        }
    }

    /// True for any of the name sub-labels.
    pub fn is_name(&self) -> bool {
        matches!(self, Label::Name(_))
    }
}

impl FromStr for Label {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "QTY" => Ok(Label::Qty),
            "UNIT" => Ok(Label::Unit),
            "SIZE" => Ok(Label::Size),
            "PREP" => Ok(Label::Prep),
            "PURPOSE" => Ok(Label::Purpose),
            "COMMENT" => Ok(Label::Comment),
            "PUNC" => Ok(Label::Punc),
            "B_NAME_TOK" => Ok(Label::Name(NameLabel::BeginTok)),
            "I_NAME_TOK" => Ok(Label::Name(NameLabel::InsideTok)),
            "NAME_VAR" => Ok(Label::Name(NameLabel::Variant)),
            "NAME_MOD" => Ok(Label::Name(NameLabel::Modifier)),
            "NAME_SEP" => Ok(Label::Name(NameLabel::Separator)),
            other => Err(ParseError::ModelMismatch {
                label: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        for s in [
            "QTY",
            "UNIT",
            "SIZE",
            "PREP",
            "PURPOSE",
            "COMMENT",
            "PUNC",
            "B_NAME_TOK",
            "I_NAME_TOK",
            "NAME_VAR",
            "NAME_MOD",
            "NAME_SEP",
        ] {
            let label: Label = s.parse().unwrap();
            assert_eq!(label.as_str(), s);
        }
    }

    #[test]
    fn test_unknown_label_is_model_mismatch() {
        let err = "OTHER".parse::<Label>().unwrap_err();
        assert_eq!(
            err,
            ParseError::ModelMismatch {
                label: "OTHER".to_string()
            }
        );
    }

    #[test]
    fn test_is_name() {
        assert!("B_NAME_TOK".parse::<Label>().unwrap().is_name());
        assert!("NAME_MOD".parse::<Label>().unwrap().is_name());
        assert!(!"COMMENT".parse::<Label>().unwrap().is_name());
    }
}
