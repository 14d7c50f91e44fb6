// SPDX-FileCopyrightText: 2026 Odoobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Heuristic query classification.
//!
//! Sorts user messages into greeting, data query or default using
//! substring matches on the lower-cased text. No network, no model call.

use strum::Display;

/// Inputs at or above this many characters are never treated as greetings.
pub const DEFAULT_SIMPLE_MAX_CHARS: usize = 20;

/// What kind of message the user sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum QueryKind {
    /// Short greeting or courtesy; answered without tools.
    Simple,
    /// Asks for ERP data; answered with full formatting instructions.
    Data,
    /// Anything else.
    Default,
}

/// Greeting and courtesy tokens (contains, case-insensitive).
const GREETING_TOKENS: &[&str] = &[
    "bonjour",
    "salut",
    "hello",
    "hi",
    "bonsoir",
    "comment ça va",
    "merci",
    "au revoir",
    "bye",
];

/// CRM and sales vocabulary (contains, case-insensitive).
///
/// Plural forms are covered by their singular prefix.
const DATA_TOKENS: &[&str] = &[
    "lead",
    "prospect",
    "client",
    "customer",
    "vente",
    "sale",
    "commande",
    "order",
    "facture",
    "invoice",
    "liste",
    "lister",
    "list",
    "show",
    "affiche",
    "statistique",
    "stats",
    "résumé",
    "summary",
    "crm",
    "pipeline",
    "opportunité",
];

/// Keyword classifier with a configurable greeting length threshold.
#[derive(Debug, Clone, Copy)]
pub struct QueryClassifier {
    simple_max_chars: usize,
}

impl QueryClassifier {
    pub fn new() -> Self {
        Self {
            simple_max_chars: DEFAULT_SIMPLE_MAX_CHARS,
        }
    }

    /// Classifier whose greeting check rejects inputs of `max_chars` characters or more.
    pub fn with_simple_max_chars(max_chars: usize) -> Self {
        Self {
            simple_max_chars: max_chars,
        }
    }

    pub fn simple_max_chars(&self) -> usize {
        self.simple_max_chars
    }

    /// True when the trimmed input contains a greeting token and is shorter
    /// than the threshold, counted in characters.
    pub fn is_simple_query(&self, text: &str) -> bool {
        let trimmed = text.trim();
        if trimmed.chars().count() >= self.simple_max_chars {
            return false;
        }
        let lower = trimmed.to_lowercase();
        GREETING_TOKENS.iter().any(|token| lower.contains(token))
    }

    /// True when the input mentions any CRM or sales token.
    pub fn is_data_query(&self, text: &str) -> bool {
        let lower = text.trim().to_lowercase();
        DATA_TOKENS.iter().any(|token| lower.contains(token))
    }

    /// Greeting wins over data when both match.
    pub fn classify(&self, text: &str) -> QueryKind {
        if self.is_simple_query(text) {
            QueryKind::Simple
        } else if self.is_data_query(text) {
            QueryKind::Data
        } else {
            QueryKind::Default
        }
    }
}

impl Default for QueryClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn classify_simple_greetings() {
        let c = QueryClassifier::new();
        assert!(c.is_simple_query("bonjour"));
        assert!(c.is_simple_query("Salut !"));
        assert!(c.is_simple_query("  HELLO  "));
        assert!(c.is_simple_query("merci beaucoup"));
        assert!(c.is_simple_query("Comment ça va ?"));
        assert_eq!(c.classify("au revoir"), QueryKind::Simple);
    }

    #[test]
    fn long_greeting_is_not_simple() {
        let c = QueryClassifier::new();
        // 20 characters exactly
        assert!(!c.is_simple_query("bonjour tout le mond"));
        assert!(!c.is_simple_query("bonjour, peux-tu m'aider avec mes ventes ?"));
    }

    #[test]
    fn threshold_counts_characters_not_bytes() {
        let c = QueryClassifier::new();
        let input = "comment ça va élodie";
        assert_eq!(input.chars().count(), 20);
        assert!(!c.is_simple_query(input));
        let input = "comment ça va élodi";
        assert_eq!(input.chars().count(), 19);
        assert!(c.is_simple_query(input));
    }

    #[test]
    fn threshold_is_configurable() {
        let c = QueryClassifier::with_simple_max_chars(60);
        assert!(c.is_simple_query("bonjour, peux-tu m'aider avec mes ventes ?"));
        assert_eq!(c.simple_max_chars(), 60);
    }

    #[test]
    fn classify_data_queries() {
        let c = QueryClassifier::new();
        assert!(c.is_data_query("liste des leads"));
        assert!(c.is_data_query("Show me the PIPELINE"));
        assert!(c.is_data_query("Quelles factures sont impayées ?"));
        assert!(c.is_data_query("résumé des opportunités"));
        assert_eq!(c.classify("statistiques du mois"), QueryKind::Data);
    }

    #[test]
    fn greeting_wins_over_data() {
        let c = QueryClassifier::new();
        assert!(c.is_data_query("salut crm"));
        assert_eq!(c.classify("salut crm"), QueryKind::Simple);
    }

    #[test]
    fn empty_input_is_neither() {
        let c = QueryClassifier::new();
        assert!(!c.is_simple_query(""));
        assert!(!c.is_data_query("   "));
        assert_eq!(c.classify(""), QueryKind::Default);
    }

    #[test]
    fn neutral_text_is_default() {
        let c = QueryClassifier::new();
        assert_eq!(c.classify("quelle est la météo à Paris"), QueryKind::Default);
    }

    #[test]
    fn kind_display() {
        assert_eq!(QueryKind::Simple.to_string(), "simple");
        assert_eq!(QueryKind::Data.to_string(), "data");
        assert_eq!(QueryKind::Default.to_string(), "default");
    }

    proptest! {
        #[test]
        fn short_input_with_greeting_is_simple(
            token in proptest::sample::select(GREETING_TOKENS),
            pad in "[a-z ]{0,5}",
        ) {
            let input = format!("{token}{pad}");
            prop_assume!(input.trim().chars().count() < DEFAULT_SIMPLE_MAX_CHARS);
            prop_assert!(QueryClassifier::new().is_simple_query(&input));
        }

        #[test]
        fn long_input_is_never_simple(input in "\\PC{20,60}") {
            prop_assume!(input.trim().chars().count() >= DEFAULT_SIMPLE_MAX_CHARS);
            prop_assert!(!QueryClassifier::new().is_simple_query(&input));
        }

        #[test]
        fn data_tokens_match_in_any_case(
            token in proptest::sample::select(DATA_TOKENS),
            prefix in "[a-z ]{0,10}",
            upper in any::<bool>(),
        ) {
            let input = format!("{prefix}{token}");
            let input = if upper { input.to_uppercase() } else { input };
            prop_assert!(QueryClassifier::new().is_data_query(&input));
        }
    }
}
