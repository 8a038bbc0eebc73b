//! Heuristic mapping of source field names onto [`TransactionKey`]s.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::dates::parse_date_string;
use crate::number::looks_like_amount;
use crate::transaction::{FieldValue, Record, TransactionKey};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    #[default]
    Medium,
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Confidence::Medium => "medium",
            Confidence::High => "high",
        })
    }
}

impl FromStr for Confidence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "medium" => Ok(Confidence::Medium),
            "high" => Ok(Confidence::High),
            other => Err(format!("Unknown confidence: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GuessOptions {
    /// Candidates below this level are discarded.
    pub min_confidence: Confidence,
    /// Example records used to boost medium-confidence name matches.
    pub sample: Vec<Record>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldGuess {
    pub source_field: String,
    pub target_field: TransactionKey,
    pub confidence: Confidence,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuessResult {
    /// One entry per mapped field, in input order.
    pub guesses: Vec<FieldGuess>,
    pub unmapped_fields: Vec<String>,
    /// Target key to source field name.
    pub mapping: BTreeMap<TransactionKey, String>,
}

// ── Field-name patterns ───────────────────────────────────────────────────────

use Confidence::{High, Medium};
use TransactionKey as K;

/// Most specific first within each target. Matched case-insensitively.
/// `metadata` is deliberately absent: it is never guessed.
const NAME_PATTERNS: &[(TransactionKey, &str, Confidence)] = &[
    (K::Date, r"^date$", High),
    (K::Date, r"^transaction[_\s-]?date$", High),
    (K::Date, r"^trans[_\s-]?date$", High),
    (K::Date, r"^posting[_\s-]?date$", High),
    (K::Date, r"^value[_\s-]?date$", High),
    (K::Date, r"^effective[_\s-]?date$", High),
    (K::Date, r"^settlement[_\s-]?date$", Medium),
    (K::Date, r"date$", Medium),
    (K::Date, r"^when$", Medium),
    (K::Date, r"^timestamp$", Medium),
    (K::Time, r"^time$", High),
    (K::Time, r"^transaction[_\s-]?time$", High),
    (K::Time, r"^trans[_\s-]?time$", High),
    (K::Time, r"^posting[_\s-]?time$", High),
    (K::Time, r"time$", Medium),
    (K::Time, r"^clock$", Medium),
    (K::Amount, r"^amount$", High),
    (K::Amount, r"^value$", High),
    (K::Amount, r"^transaction[_\s-]?amount$", High),
    (K::Amount, r"^trans[_\s-]?amount$", High),
    (K::Amount, r"^debit$", Medium),
    (K::Amount, r"^credit$", Medium),
    (K::Amount, r"^sum$", Medium),
    (K::Amount, r"^total$", Medium),
    (K::Amount, r"^price$", Medium),
    (K::Amount, r"^cost$", Medium),
    (K::Amount, r"amount$", Medium),
    (K::Payee, r"^payee$", High),
    (K::Payee, r"^merchant$", High),
    (K::Payee, r"^vendor$", High),
    (K::Payee, r"^recipient$", High),
    (K::Payee, r"^beneficiary$", High),
    (K::Payee, r"^merchant[_\s-]?name$", High),
    (K::Payee, r"^payee[_\s-]?name$", High),
    (K::Payee, r"^name$", Medium),
    (K::Payee, r"^counterparty$", Medium),
    (K::Payee, r"^store$", Medium),
    (K::Payee, r"^shop$", Medium),
    (K::Description, r"^description$", High),
    (K::Description, r"^memo$", High),
    (K::Description, r"^note$", High),
    (K::Description, r"^notes$", High),
    (K::Description, r"^narrative$", High),
    (K::Description, r"^transaction[_\s-]?description$", High),
    (K::Description, r"^details$", Medium),
    (K::Description, r"^reference$", Medium),
    (K::Description, r"^particulars$", Medium),
    (K::Description, r"^comment$", Medium),
    (K::Description, r"^remarks$", Medium),
    (K::Category, r"^category$", High),
    (K::Category, r"^classification$", High),
    (K::Category, r"^transaction[_\s-]?type$", Medium),
    (K::Category, r"^trans[_\s-]?type$", Medium),
    (K::Category, r"^type$", Medium),
    (K::Category, r"^class$", Medium),
    (K::Category, r"^group$", Medium),
    (K::Category, r"^tag$", Medium),
    (K::Category, r"^label$", Medium),
];

struct NamePattern {
    target: TransactionKey,
    regex: Regex,
    confidence: Confidence,
}

fn name_patterns() -> &'static [NamePattern] {
    static PATTERNS: OnceLock<Vec<NamePattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        NAME_PATTERNS
            .iter()
            .map(|&(target, pattern, confidence)| NamePattern {
                target,
                regex: Regex::new(&format!("(?i){pattern}")).expect("invalid regex"),
                confidence,
            })
            .collect()
    })
}

// ── Value analysis ────────────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(
    re_date_shape,
    r"^(?:\d{4}-\d{2}-\d{2}|\d{2}/\d{2}/\d{4}|\d{2}-\d{2}-\d{4}|\d{1,2}\s+\w+\s+\d{4}|\d{4}/\d{2}/\d{2})$"
);
re!(re_time_shape, r"^\d{1,2}:\d{2}(?::\d{2}(?:\.\d{1,3})?)?(?:\s?[aApP]\.?[mM]\.?)?$");

fn looks_like_date(value: &str) -> bool {
    re_date_shape().is_match(value) && parse_date_string(value).is_some()
}

/// The target every sampled value for a field points at, if they agree.
/// Empty strings and nulls are ignored; a field with no meaningful values
/// suggests nothing.
fn analyze_values<'a>(values: impl Iterator<Item = &'a FieldValue>) -> Option<TransactionKey> {
    let mut texts = Vec::new();
    let mut numbers = 0usize;
    for value in values {
        match value {
            FieldValue::Text(s) if !s.is_empty() => texts.push(s.as_str()),
            FieldValue::Number(n) if n.is_finite() => numbers += 1,
            _ => {}
        }
    }

    if !texts.is_empty() && numbers == 0 {
        if texts.iter().all(|v| looks_like_date(v)) {
            return Some(TransactionKey::Date);
        }
        if texts.iter().all(|v| re_time_shape().is_match(v)) {
            return Some(TransactionKey::Time);
        }
    }

    if texts.len() + numbers > 0 && texts.iter().all(|v| looks_like_amount(v)) {
        return Some(TransactionKey::Amount);
    }

    None
}

// ── Guessing ──────────────────────────────────────────────────────────────────

/// First pattern for `target` that matches `field` and, after any boost,
/// meets `min_confidence`.
fn match_target(
    field: &str,
    target: TransactionKey,
    suggested: Option<TransactionKey>,
    min_confidence: Confidence,
) -> Option<FieldGuess> {
    name_patterns()
        .iter()
        .filter(|p| p.target == target && p.regex.is_match(field))
        .find_map(|p| {
            let boosted = p.confidence == Medium && suggested == Some(target);
            let confidence = if boosted { High } else { p.confidence };
            if confidence < min_confidence {
                return None;
            }

            let mut reason = format!("Field name \"{field}\" matches pattern for {target}");
            if boosted {
                reason.push_str(" (boosted by value analysis)");
            }
            Some(FieldGuess {
                source_field: field.to_string(),
                target_field: target,
                confidence,
                reason,
            })
        })
}

/// Guesses which transaction field each source field holds.
///
/// Targets are tried in [`TransactionKey`] order and each target is claimed by
/// at most one field, the first to match it. When several targets match one
/// field the most confident wins, ties going to the earlier target.
pub fn guess<S: AsRef<str>>(fields: &[S], options: &GuessOptions) -> GuessResult {
    let mut guesses: Vec<FieldGuess> = Vec::new();
    let mut unmapped_fields = Vec::new();
    let mut claimed = BTreeSet::new();

    for field in fields {
        let field = field.as_ref();
        let suggested = if options.sample.is_empty() {
            None
        } else {
            analyze_values(options.sample.iter().filter_map(|record| record.get(field)))
        };

        let mut best: Option<FieldGuess> = None;
        for target in TransactionKey::ALL {
            if claimed.contains(&target) {
                continue;
            }
            let Some(candidate) = match_target(field, target, suggested, options.min_confidence)
            else {
                continue;
            };
            if best.as_ref().is_none_or(|b| candidate.confidence > b.confidence) {
                best = Some(candidate);
            }
        }

        match best {
            Some(found) => {
                claimed.insert(found.target_field);
                guesses.push(found);
            }
            None => unmapped_fields.push(field.to_string()),
        }
    }

    let mapping = guesses
        .iter()
        .map(|g| (g.target_field, g.source_field.clone()))
        .collect();

    GuessResult {
        guesses,
        unmapped_fields,
        mapping,
    }
}
