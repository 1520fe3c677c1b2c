//! Vocabulary catalog
//!
//! Ordered, read-only list of terms supplied once at startup. The source
//! term doubles as the stable term id stored in progress state.
//!
//! Text format: entries separated by `;`, fields by `|`:
//! `source|target|example;source|target|example`

use lexq_common::Result;
use std::path::Path;
use tracing::debug;

/// One vocabulary entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub source: String,
    pub target: String,
    pub example: String,
}

impl Term {
    pub fn new(source: &str, target: &str, example: &str) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
            example: example.to_string(),
        }
    }

    /// Stable id used in `learned` and `favorites`
    pub fn id(&self) -> &str {
        &self.source
    }
}

const BUILTIN_WORDS: &str = "abandon|terk etmek|They had to abandon the car in the snow.;\
ability|yetenek|She has the ability to learn quickly.;\
accurate|doğru, kesin|The report gives an accurate picture of the situation.;\
achieve|başarmak|You can achieve anything with hard work.;\
acquire|edinmek|He acquired a taste for coffee in Italy.;\
adapt|uyum sağlamak|Animals adapt to their environment.;\
benefit|fayda|The new law will benefit small businesses.;\
brief|kısa|She gave a brief summary of the book.;\
candidate|aday|There are three candidates for the job.;\
consider|düşünmek|Please consider my offer.;\
decline|reddetmek|He declined the invitation politely.;\
deserve|hak etmek|You deserve a break.;\
eager|istekli|The children were eager to start.;\
efficient|verimli|This engine is very efficient.;\
familiar|tanıdık|Her face looks familiar.;\
generous|cömert|He is generous with his time.;\
improve|geliştirmek|Reading helps improve your vocabulary.;\
journey|yolculuk|The journey took six hours.;\
obvious|açık, belli|The answer seemed obvious.;\
reliable|güvenilir|We need a reliable supplier.";

/// Ordered vocabulary list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    terms: Vec<Term>,
}

impl Catalog {
    /// Parse the flat delimited text format
    ///
    /// Blank entries are skipped; missing trailing fields become empty.
    pub fn parse(raw: &str) -> Self {
        let terms: Vec<Term> = raw
            .split(';')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                let mut fields = entry.split('|').map(str::trim);
                let source = fields.next().unwrap_or_default();
                let target = fields.next().unwrap_or_default();
                let example = fields.next().unwrap_or_default();
                Term::new(source, target, example)
            })
            .filter(|term| !term.source.is_empty())
            .collect();

        debug!("Parsed vocabulary catalog with {} terms", terms.len());
        Self { terms }
    }

    pub fn from_terms(terms: Vec<Term>) -> Self {
        Self { terms }
    }

    /// Read and parse a catalog file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(Self::parse(&raw))
    }

    /// Word list bundled with the binary
    pub fn builtin() -> Self {
        Self::parse(BUILTIN_WORDS)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Term> {
        self.terms.get(index)
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn iter(&self) -> impl Iterator<Item = &Term> {
        self.terms.iter()
    }

    /// Look up a term by id
    pub fn find(&self, id: &str) -> Option<&Term> {
        self.terms.iter().find(|t| t.id() == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.terms.iter().position(|t| t.id() == id)
    }
}
