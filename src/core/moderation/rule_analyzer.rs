// Local, deterministic text scorer used when the external classifier is down.
//
// Pure function over a fixed token list: no I/O, no failure modes.
// NOTE: the score it returns is a CLEAN score (1.0 = clean, 0.0 = toxic), the
// inverse of the toxicity convention used everywhere else.

use serde::Serialize;

/// Offensive tokens matched as case-insensitive substrings.
pub const DEFAULT_OFFENSIVE_TOKENS: &[&str] = &[
    "puta",
    "idiota",
    "imbecil",
    "estupido",
    "mierda",
    "joder",
    "coño",
    "gilipollas",
    "cabron",
    "tonto",
    "subnormal",
    "retrasado",
    "marica",
    "fuck",
    "shit",
    "damn",
    "bitch",
    "asshole",
    "motherfucker",
];

/// Penalty subtracted from the clean score for each matched token.
const PENALTY_PER_MATCH: f64 = 0.3;

/// Result of a rule-based analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleAnalysis {
    /// 1.0 = clean, 0.0 = toxic.
    pub clean_score: f64,
    pub matched_count: usize,
    pub matched_tokens: Vec<String>,
}

impl RuleAnalysis {
    /// Human-readable explanation of the analysis.
    pub fn reason(&self) -> String {
        if self.matched_count == 0 {
            "Clean content according to basic rules".to_string()
        } else {
            format!(
                "Detected {} inappropriate words: {}",
                self.matched_count,
                self.matched_tokens.join(", ")
            )
        }
    }
}

/// Local scorer consulted when the external classifier is unavailable.
///
/// Implementations are synchronous and cannot fail. The result is on the
/// clean-score scale; callers convert it to toxicity.
pub trait LocalAnalyzer: Send + Sync {
    fn analyze(&self, text: &str) -> RuleAnalysis;
}

/// Keyword-based analyzer.
#[derive(Debug, Clone)]
pub struct RuleAnalyzer {
    /// Lower-cased and de-duplicated.
    tokens: Vec<String>,
}

impl Default for RuleAnalyzer {
    fn default() -> Self {
        Self::with_tokens(DEFAULT_OFFENSIVE_TOKENS.iter().copied())
    }
}

impl RuleAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an analyzer over a custom token list.
    pub fn with_tokens<I, T>(tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for token in tokens {
            let token = token.as_ref().trim().to_lowercase();
            if !token.is_empty() && !normalized.contains(&token) {
                normalized.push(token);
            }
        }
        Self { tokens: normalized }
    }

    /// Scores `text` against the token list.
    ///
    /// `clean_score = max(0, 1 - 0.3 * matched_count)` where `matched_count`
    /// is the number of distinct tokens found anywhere in the lower-cased text.
    pub fn analyze(&self, text: &str) -> RuleAnalysis {
        let lower = text.to_lowercase();

        let matched_tokens: Vec<String> = self
            .tokens
            .iter()
            .filter(|token| lower.contains(token.as_str()))
            .cloned()
            .collect();
        let matched_count = matched_tokens.len();

        let clean_score = (1.0 - PENALTY_PER_MATCH * matched_count as f64).max(0.0);

        RuleAnalysis {
            clean_score,
            matched_count,
            matched_tokens,
        }
    }
}

impl LocalAnalyzer for RuleAnalyzer {
    fn analyze(&self, text: &str) -> RuleAnalysis {
        RuleAnalyzer::analyze(self, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn clean_text_scores_one() {
        let analyzer = RuleAnalyzer::new();
        for text in ["This is a great movie", "", "   ", "Loved the soundtrack!"] {
            let result = analyzer.analyze(text);
            assert_eq!(result.matched_count, 0);
            assert_eq!(result.clean_score, 1.0);
            assert!(result.matched_tokens.is_empty());
        }
    }

    #[test]
    fn matching_is_case_insensitive_substring() {
        let analyzer = RuleAnalyzer::new();
        let result = analyzer.analyze("What a SHITty film");
        assert_eq!(result.matched_count, 1);
        assert_eq!(result.matched_tokens, vec!["shit".to_string()]);
        assert!(approx(result.clean_score, 0.7));
    }

    #[test]
    fn two_tokens_give_point_four() {
        let analyzer = RuleAnalyzer::new();
        let result = analyzer.analyze("The director is an idiota and the plot is mierda");
        assert_eq!(result.matched_count, 2);
        assert!(approx(result.clean_score, 0.4));
    }

    #[test]
    fn repeated_token_counts_once() {
        let analyzer = RuleAnalyzer::new();
        let result = analyzer.analyze("damn damn damn");
        assert_eq!(result.matched_count, 1);
        assert!(approx(result.clean_score, 0.7));
    }

    #[test]
    fn score_floors_at_zero() {
        let analyzer = RuleAnalyzer::new();
        let result = analyzer.analyze("fuck shit damn bitch");
        assert_eq!(result.matched_count, 4);
        assert_eq!(result.clean_score, 0.0);
    }

    #[test]
    fn overlapping_tokens_are_distinct_matches() {
        let analyzer = RuleAnalyzer::new();
        let result = analyzer.analyze("motherfucker");
        assert!(result.matched_tokens.contains(&"fuck".to_string()));
        assert!(result.matched_tokens.contains(&"motherfucker".to_string()));
        assert_eq!(result.matched_count, 2);
    }

    #[test]
    fn analysis_is_deterministic() {
        let analyzer = RuleAnalyzer::new();
        let text = "Tonto, this movie is a joder mess";
        assert_eq!(analyzer.analyze(text), analyzer.analyze(text));
    }

    #[test]
    fn custom_tokens_are_normalized() {
        let analyzer = RuleAnalyzer::with_tokens(["Spoiler", "spoiler", " BORING "]);
        let result = analyzer.analyze("boring spoiler alert");
        assert_eq!(result.matched_count, 2);
        assert!(approx(result.clean_score, 0.4));
    }

    #[test]
    fn reason_lists_matches() {
        let analyzer = RuleAnalyzer::with_tokens(["alpha", "beta"]);
        assert_eq!(
            analyzer.analyze("nothing here").reason(),
            "Clean content according to basic rules"
        );
        assert_eq!(
            analyzer.analyze("alpha and beta").reason(),
            "Detected 2 inappropriate words: alpha, beta"
        );
    }
}
