// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Parsing of the vision model's labeled car analysis.
//!
//! The model is prompted to answer with six emoji-labeled lines followed by
//! free-form trivia paragraphs. Extraction matches the literal labels; any
//! field whose label is missing falls back to a default, so parsing never
//! fails.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::RarityTier;

pub const MAKE_MODEL_LABEL: &str = "🚗 Make & Model:";
pub const YEAR_LABEL: &str = "📅 Year:";
pub const PERFORMANCE_LABEL: &str = "🏎️ Performance:";
pub const FEATURES_LABEL: &str = "💫 Notable Features:";
pub const RARITY_LABEL: &str = "💎 Rarity:";
pub const VALUE_RANGE_LABEL: &str = "💰 Estimated Value Range:";

const UNKNOWN: &str = "Unknown";
const DEFAULT_RARITY: &str = "Bronze";
const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Rest-of-line pattern for a label: `<label> <value>`.
fn line_pattern(label: &str) -> Regex {
    Regex::new(&format!(r"{} (.+)", regex::escape(label))).expect("valid label pattern")
}

static MAKE_MODEL_RE: Lazy<Regex> = Lazy::new(|| line_pattern(MAKE_MODEL_LABEL));
static PERFORMANCE_RE: Lazy<Regex> = Lazy::new(|| line_pattern(PERFORMANCE_LABEL));
static FEATURES_RE: Lazy<Regex> = Lazy::new(|| line_pattern(FEATURES_LABEL));
static RARITY_RE: Lazy<Regex> = Lazy::new(|| line_pattern(RARITY_LABEL));
static VALUE_RANGE_RE: Lazy<Regex> = Lazy::new(|| line_pattern(VALUE_RANGE_LABEL));
static YEAR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"{} (\d{{4}})", regex::escape(YEAR_LABEL))).expect("valid year pattern")
});

/// Structured result of one analysis response. Not persisted on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CarAnalysis {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub performance: String,
    pub features: String,
    /// Rarity label as written by the model (normally a tier name)
    pub rarity: String,
    pub value_range: String,
    pub trivia: String,
}

impl CarAnalysis {
    /// The rarity label interpreted as a tier, if it names one.
    pub fn rarity_tier(&self) -> Option<RarityTier> {
        RarityTier::from_label(&self.rarity)
    }
}

/// Parse a labeled analysis response into a [`CarAnalysis`].
pub fn parse_analysis(content: &str) -> CarAnalysis {
    let make_model = capture(&MAKE_MODEL_RE, content);
    let (make, model) = split_make_model(make_model.unwrap_or_default());

    let year = capture(&YEAR_RE, content)
        .and_then(|y| y.parse().ok())
        .unwrap_or(0);

    CarAnalysis {
        make,
        model,
        year,
        performance: capture(&PERFORMANCE_RE, content)
            .unwrap_or_default()
            .to_string(),
        features: capture(&FEATURES_RE, content)
            .unwrap_or_default()
            .to_string(),
        rarity: capture(&RARITY_RE, content)
            .unwrap_or(DEFAULT_RARITY)
            .to_string(),
        value_range: capture(&VALUE_RANGE_RE, content)
            .unwrap_or_default()
            .to_string(),
        trivia: last_paragraph(content).to_string(),
    }
}

fn capture<'a>(re: &Regex, content: &'a str) -> Option<&'a str> {
    re.captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|v| !v.is_empty())
}

/// First whitespace-separated token is the make, the remainder the model.
fn split_make_model(value: &str) -> (String, String) {
    let value = value.trim();
    let (make, model) = match value.split_once(char::is_whitespace) {
        Some((make, model)) => (make, model.trim()),
        None => (value, ""),
    };

    let or_unknown = |s: &str| {
        if s.is_empty() {
            UNKNOWN.to_string()
        } else {
            s.to_string()
        }
    };

    (or_unknown(make), or_unknown(model))
}

/// Last blank-line-separated paragraph, or the whole input if there is none.
fn last_paragraph(content: &str) -> &str {
    content
        .rsplit(PARAGRAPH_SEPARATOR)
        .next()
        .unwrap_or(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn well_formed(trivia: &str) -> String {
        format!(
            "{MAKE_MODEL_LABEL} Ferrari F40\n\
             {YEAR_LABEL} 1989\n\
             {PERFORMANCE_LABEL} 2.9L twin-turbo V8, 471 hp, 0-60 in 3.8s\n\
             {FEATURES_LABEL} Kevlar body panels, fixed rear wing\n\
             {RARITY_LABEL} Diamond\n\
             {VALUE_RANGE_LABEL} $2,500,000 - $3,500,000\n\n\
             {trivia}"
        )
    }

    #[test]
    fn test_parse_well_formed_response() {
        let analysis = parse_analysis(&well_formed("This car is iconic."));

        assert_eq!(analysis.make, "Ferrari");
        assert_eq!(analysis.model, "F40");
        assert_eq!(analysis.year, 1989);
        assert_eq!(
            analysis.performance,
            "2.9L twin-turbo V8, 471 hp, 0-60 in 3.8s"
        );
        assert_eq!(analysis.features, "Kevlar body panels, fixed rear wing");
        assert_eq!(analysis.rarity, "Diamond");
        assert_eq!(analysis.value_range, "$2,500,000 - $3,500,000");
        assert_eq!(analysis.trivia, "This car is iconic.");
        assert_eq!(analysis.rarity_tier(), Some(RarityTier::Diamond));
    }

    #[test]
    fn test_trivia_is_last_paragraph() {
        let text = well_formed("First fact.\n\nLast fact.");
        assert_eq!(parse_analysis(&text).trivia, "Last fact.");
    }

    #[test]
    fn test_parse_without_labels_uses_defaults() {
        let text = "I can't tell what car this is, sorry.";
        let analysis = parse_analysis(text);

        assert_eq!(
            analysis,
            CarAnalysis {
                make: "Unknown".to_string(),
                model: "Unknown".to_string(),
                year: 0,
                performance: String::new(),
                features: String::new(),
                rarity: "Bronze".to_string(),
                value_range: String::new(),
                trivia: text.to_string(),
            }
        );
    }

    #[test]
    fn test_multi_word_model() {
        let text = format!("{MAKE_MODEL_LABEL} Mercedes-Benz 300 SL Gullwing");
        let analysis = parse_analysis(&text);
        assert_eq!(analysis.make, "Mercedes-Benz");
        assert_eq!(analysis.model, "300 SL Gullwing");
    }

    #[test]
    fn test_make_only() {
        let text = format!("{MAKE_MODEL_LABEL} Lada");
        let analysis = parse_analysis(&text);
        assert_eq!(analysis.make, "Lada");
        assert_eq!(analysis.model, "Unknown");
    }

    #[test]
    fn test_year_range_takes_first_four_digits() {
        let text = format!("{YEAR_LABEL} 1965-1967 (estimate)");
        assert_eq!(parse_analysis(&text).year, 1965);
    }

    #[test]
    fn test_malformed_year_defaults_to_zero() {
        let text = format!("{YEAR_LABEL} late sixties");
        assert_eq!(parse_analysis(&text).year, 0);

        let text = format!("{YEAR_LABEL} 98");
        assert_eq!(parse_analysis(&text).year, 0);
    }

    #[test]
    fn test_labels_without_emoji_are_not_matched() {
        let text = "Make & Model: Honda Civic\nRarity: Gold";
        let analysis = parse_analysis(text);
        assert_eq!(analysis.make, "Unknown");
        assert_eq!(analysis.rarity, "Bronze");
    }

    #[test]
    fn test_crlf_line_endings_are_trimmed() {
        let text = format!("{RARITY_LABEL} Gold\r\n{VALUE_RANGE_LABEL} $20k\r\n");
        let analysis = parse_analysis(&text);
        assert_eq!(analysis.rarity, "Gold");
        assert_eq!(analysis.value_range, "$20k");
    }

    #[test]
    fn test_empty_input() {
        let analysis = parse_analysis("");
        assert_eq!(analysis.make, "Unknown");
        assert_eq!(analysis.trivia, "");
    }
}
