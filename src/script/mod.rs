// src/script/mod.rs
//! Script preparation: article text -> ordered narration segments, plus the
//! transcript join/split used to persist and re-voice a script.

pub mod summarizer;

use once_cell::sync::OnceCell;
use regex::Regex;
use tracing::{info, warn};

use crate::config::ScriptConfig;
use summarizer::{DynSummarizer, SummaryBounds};

pub const OUTRO: &str = "And that concludes this report.";

pub fn intro_line(title: &str) -> String {
    format!("Our next story is titled: {title}.")
}

pub fn fallback_intro_line(title: &str) -> String {
    format!("The next story is: {title}.")
}

pub struct ScriptPreparer {
    summarizer: DynSummarizer,
    bounds: SummaryBounds,
    target_words: usize,
    max_input_words: usize,
}

impl ScriptPreparer {
    pub fn new(summarizer: DynSummarizer, cfg: &ScriptConfig) -> Self {
        Self {
            summarizer,
            bounds: SummaryBounds {
                min_tokens: cfg.summary_min_tokens,
                max_tokens: cfg.summary_max_tokens,
            },
            target_words: cfg.target_word_count(),
            max_input_words: cfg.max_input_words,
        }
    }

    /// Build the narration segments for one article.
    ///
    /// Empty text gives an empty script. A summarizer failure falls back to a
    /// shorter intro plus the first `target_words` words, without outro.
    pub async fn prepare(&self, article_text: &str, title: &str) -> Vec<String> {
        if article_text.trim().is_empty() {
            return Vec::new();
        }

        info!(title, summarizer = self.summarizer.name(), "summarizing article");
        let input = first_words(article_text, self.max_input_words);
        match self.summarizer.summarize(&input, self.bounds).await {
            Ok(summary) if !summary.trim().is_empty() => {
                vec![intro_line(title), summary, OUTRO.to_string()]
            }
            Ok(_) => {
                warn!(title, "summarizer returned empty text, using truncated article");
                self.fallback(article_text, title)
            }
            Err(e) => {
                warn!(title, error = ?e, "error during summarization, using truncated article");
                self.fallback(article_text, title)
            }
        }
    }

    fn fallback(&self, article_text: &str, title: &str) -> Vec<String> {
        vec![
            fallback_intro_line(title),
            first_words(article_text, self.target_words),
        ]
    }
}

/// First `n` whitespace-separated words joined by single spaces.
pub fn first_words(text: &str, n: usize) -> String {
    text.split_whitespace().take(n).collect::<Vec<_>>().join(" ")
}

/// Persisted form of a script.
pub fn join_transcript(parts: &[String]) -> String {
    parts.join(" ")
}

/// Recover segments from a transcript: split after `.`, `?` or `!` followed
/// by whitespace. Segment boundaries inside a summary are not preserved, so
/// this usually yields more segments than were originally joined.
pub fn split_transcript(text: &str) -> Vec<String> {
    static RE_BOUNDARY: OnceCell<Regex> = OnceCell::new();
    let re = RE_BOUNDARY.get_or_init(|| Regex::new(r"[.?!]\s+").expect("sentence boundary regex"));

    let text = text.trim();
    let mut out = Vec::new();
    let mut last = 0usize;
    for m in re.find_iter(text) {
        // punctuation is a single ASCII byte
        out.push(text[last..m.start() + 1].to_string());
        last = m.end();
    }
    if last < text.len() {
        out.push(text[last..].to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::summarizer::{DisabledSummarizer, Summarizer};
    use super::*;
    use std::sync::Arc;

    struct FixedSummarizer(&'static str);

    #[async_trait::async_trait]
    impl Summarizer for FixedSummarizer {
        async fn summarize(&self, _text: &str, _b: SummaryBounds) -> anyhow::Result<String> {
            Ok(self.0.to_string())
        }
        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    fn preparer(s: DynSummarizer) -> ScriptPreparer {
        ScriptPreparer::new(s, &ScriptConfig::default())
    }

    #[tokio::test]
    async fn summary_script_has_intro_summary_outro() {
        let p = preparer(Arc::new(FixedSummarizer("The gist.")));
        let script = p.prepare("Body text here.", "Big News").await;
        assert_eq!(
            script,
            vec![
                "Our next story is titled: Big News.".to_string(),
                "The gist.".to_string(),
                OUTRO.to_string()
            ]
        );
    }

    #[tokio::test]
    async fn failure_falls_back_to_truncated_text() {
        let p = preparer(Arc::new(DisabledSummarizer));
        let body = "word ".repeat(1_000);
        let script = p.prepare(&body, "T").await;
        assert_eq!(script.len(), 2);
        assert_eq!(script[0], "The next story is: T.");
        assert_eq!(script[1].split_whitespace().count(), 600);
    }

    #[tokio::test]
    async fn blank_summary_also_falls_back() {
        let p = preparer(Arc::new(FixedSummarizer("   ")));
        let script = p.prepare("a b c", "T").await;
        assert_eq!(script, vec!["The next story is: T.".to_string(), "a b c".to_string()]);
    }

    #[tokio::test]
    async fn empty_text_gives_empty_script() {
        let p = preparer(Arc::new(FixedSummarizer("x")));
        assert!(p.prepare("  \n", "T").await.is_empty());
    }

    #[test]
    fn split_on_sentence_boundaries() {
        assert_eq!(split_transcript("A. B! C?"), vec!["A.", "B!", "C?"]);
        assert_eq!(
            split_transcript("  Wait... what?  Yes.\nNo "),
            vec!["Wait...", "what?", "Yes.", "No"]
        );
        assert_eq!(split_transcript("3.5 percent rise"), vec!["3.5 percent rise"]);
        assert!(split_transcript("   ").is_empty());
    }

    #[test]
    fn join_then_split_recovers_simple_script() {
        let parts = vec![
            intro_line("X"),
            "Short summary.".to_string(),
            OUTRO.to_string(),
        ];
        assert_eq!(split_transcript(&join_transcript(&parts)), parts);
    }
}
