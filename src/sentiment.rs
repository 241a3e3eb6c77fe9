// src/sentiment.rs
//! Article sentiment: lexical polarity scoring and three-way bucketing.

use metrics::counter;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

use crate::news::Article;

/// Polarity above this is positive, below its negation negative.
pub const POLARITY_THRESHOLD: f64 = 0.2;

const NEGATION_FACTOR: f64 = -0.5;
const INTENSIFIER_FACTOR: f64 = 1.3;

static LEXICON: Lazy<HashMap<String, f64>> = Lazy::new(|| {
    let raw = include_str!("../sentiment_lexicon.json");
    serde_json::from_str::<HashMap<String, f64>>(raw).unwrap_or_else(|e| {
        tracing::error!(
            error = %e,
            "sentiment lexicon failed to parse; scoring everything neutral"
        );
        HashMap::new()
    })
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Neutral, Sentiment::Negative];

    pub fn from_polarity(polarity: f64) -> Self {
        if polarity > POLARITY_THRESHOLD {
            Sentiment::Positive
        } else if polarity < -POLARITY_THRESHOLD {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }

    /// Dashboard color for the pie chart.
    pub fn color(self) -> &'static str {
        match self {
            Sentiment::Positive => "#2ecc71",
            Sentiment::Neutral => "#3498db",
            Sentiment::Negative => "#e74c3c",
        }
    }
}

/// Text → polarity in [-1, 1].
pub trait PolarityScorer: Send + Sync {
    fn polarity(&self, text: &str) -> anyhow::Result<f64>;
}

/// Lexicon-based scorer: mean of matched word scores, with negation and intensifiers.
#[derive(Debug, Clone, Default)]
pub struct LexiconScorer;

impl LexiconScorer {
    pub fn new() -> Self {
        Self
    }

    #[inline]
    fn word_score(&self, w: &str) -> Option<f64> {
        LEXICON.get(w).copied()
    }
}

impl PolarityScorer for LexiconScorer {
    fn polarity(&self, text: &str) -> anyhow::Result<f64> {
        let decoded = html_escape::decode_html_entities(text);
        let tokens: Vec<String> = tokenize(&decoded).collect();

        let mut sum = 0.0;
        let mut matched = 0usize;
        for i in 0..tokens.len() {
            let Some(mut score) = self.word_score(tokens[i].as_str()) else {
                continue;
            };
            if i >= 1 && is_intensifier(tokens[i - 1].as_str()) {
                score *= INTENSIFIER_FACTOR;
            }
            // negator within the previous 1..=3 tokens
            if (1..=3).any(|k| i >= k && is_negator(tokens[i - k].as_str())) {
                score *= NEGATION_FACTOR;
            }
            sum += score.clamp(-1.0, 1.0);
            matched += 1;
        }

        if matched == 0 {
            return Ok(0.0);
        }
        let polarity = sum / matched as f64;
        anyhow::ensure!(polarity.is_finite(), "non-finite polarity");
        Ok(polarity.clamp(-1.0, 1.0))
    }
}

/// Lower-cased alphanumeric tokens (Unicode-aware, so accented words survive).
fn tokenize(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

fn is_negator(tok: &str) -> bool {
    matches!(
        tok,
        "not" | "no" | "never" | "without" | "cannot" | "não" | "nao" | "nunca" | "sem" | "nem"
    )
}

fn is_intensifier(tok: &str) -> bool {
    matches!(
        tok,
        "very" | "extremely" | "really" | "muito" | "muita" | "extremamente" | "super"
    )
}

/// Per-category counts; always carries all three categories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SentimentCounts {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SentimentRecord {
    pub sentiment: Sentiment,
    pub count: usize,
}

impl SentimentCounts {
    pub fn get(&self, s: Sentiment) -> usize {
        match s {
            Sentiment::Positive => self.positive,
            Sentiment::Neutral => self.neutral,
            Sentiment::Negative => self.negative,
        }
    }

    fn bump(&mut self, s: Sentiment) {
        match s {
            Sentiment::Positive => self.positive += 1,
            Sentiment::Neutral => self.neutral += 1,
            Sentiment::Negative => self.negative += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.positive + self.neutral + self.negative
    }

    /// Exactly three records, in positive/neutral/negative order.
    pub fn records(&self) -> Vec<SentimentRecord> {
        Sentiment::ALL
            .iter()
            .map(|&s| SentimentRecord {
                sentiment: s,
                count: self.get(s),
            })
            .collect()
    }
}

#[derive(Clone)]
pub struct SentimentAnalyzer {
    scorer: Arc<dyn PolarityScorer>,
}

impl Default for SentimentAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentAnalyzer {
    pub fn new() -> Self {
        Self::with_scorer(Arc::new(LexiconScorer::new()))
    }

    pub fn with_scorer(scorer: Arc<dyn PolarityScorer>) -> Self {
        Self { scorer }
    }

    /// Scoring failures count as neutral.
    pub fn classify(&self, article: &Article) -> Sentiment {
        match self.scorer.polarity(&article.headline_text()) {
            Ok(p) => Sentiment::from_polarity(p),
            Err(e) => {
                counter!("sentiment_scoring_errors_total").increment(1);
                warn!(
                    error = %e,
                    title = %article.title,
                    "sentiment scoring failed; using neutral"
                );
                Sentiment::Neutral
            }
        }
    }

    pub fn analyze(&self, articles: &[Article]) -> SentimentCounts {
        let mut counts = SentimentCounts::default();
        for a in articles {
            counts.bump(self.classify(a));
        }
        counts
    }
}
