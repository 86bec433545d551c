//! Regulation vocabulary for EU digital-law citations.
//!
//! Maps the many surface forms a model (or a source document) uses for an
//! instrument onto one canonical short name, and exposes the alias table the
//! citation validator matches against retrieved text.
//!
//! # Naming conventions
//!
//! - Acronyms: "GDPR", "NIS2", "DSA", "DMA", "CNIL"
//! - Long titles: "General Data Protection Regulation", "Digital Services Act"
//! - Spaced variants: "NIS 2", "AI  Act" (runs of whitespace collapse to one)
//! - Official identifiers: "Regulation (EU) 2016/679", "Directive (EU) 2022/2555"
//! - File-name forms: "GDPR_", "AI_ACT", "DIGITAL_SERVICES_ACT"

/// A regulatory instrument the extractor and validator recognise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Regulation {
    Gdpr,
    AiAct,
    Nis2,
    Dsa,
    Dma,
    Cnil,
}

/// Normalisation table, checked in order. Keys are upper-case and matched as
/// substrings of the whitespace-collapsed, upper-cased input.
const NORMALIZATION: &[(&str, Regulation)] = &[
    ("GDPR", Regulation::Gdpr),
    ("GENERAL DATA PROTECTION REGULATION", Regulation::Gdpr),
    ("AI ACT", Regulation::AiAct),
    ("ARTIFICIAL INTELLIGENCE ACT", Regulation::AiAct),
    ("NIS2", Regulation::Nis2),
    ("NIS 2", Regulation::Nis2),
    ("DSA", Regulation::Dsa),
    ("DIGITAL SERVICES ACT", Regulation::Dsa),
    ("DMA", Regulation::Dma),
    ("DIGITAL MARKETS ACT", Regulation::Dma),
    ("CNIL", Regulation::Cnil),
];

impl Regulation {
    pub const ALL: [Regulation; 6] = [
        Self::Gdpr,
        Self::AiAct,
        Self::Nis2,
        Self::Dsa,
        Self::Dma,
        Self::Cnil,
    ];

    /// Canonical short name stored on a [`Citation`](crate::Citation).
    pub fn canonical(&self) -> &'static str {
        match self {
            Self::Gdpr => "GDPR",
            Self::AiAct => "AI Act",
            Self::Nis2 => "NIS2",
            Self::Dsa => "DSA",
            Self::Dma => "DMA",
            Self::Cnil => "CNIL",
        }
    }

    /// Upper-case surface forms used to recognise the instrument in source
    /// metadata and retrieved text.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::Gdpr => &[
                "GDPR",
                "GENERAL DATA PROTECTION REGULATION",
                "GDPR_",
                "GDPR-",
                "REGULATION (EU) 2016/679",
            ],
            Self::AiAct => &[
                "AI ACT",
                "ARTIFICIAL INTELLIGENCE ACT",
                "AI_ACT",
                "AI-ACT",
                "REGULATION (EU) 2024/1689",
            ],
            Self::Nis2 => &["NIS2", "NIS 2", "NIS_2", "DIRECTIVE (EU) 2022/2555"],
            Self::Dsa => &[
                "DSA",
                "DIGITAL SERVICES ACT",
                "DIGITAL_SERVICES_ACT",
                "REGULATION (EU) 2022/2065",
            ],
            Self::Dma => &[
                "DMA",
                "DIGITAL MARKETS ACT",
                "DIGITAL_MARKETS_ACT",
                "REGULATION (EU) 2022/1925",
            ],
            Self::Cnil => &["CNIL"],
        }
    }

    /// Recognise a regulation from a raw name, case-insensitively.
    ///
    /// Returns `None` for names outside the vocabulary.
    pub fn recognize(name: &str) -> Option<Self> {
        let upper = collapse_whitespace(name).to_uppercase();
        NORMALIZATION
            .iter()
            .find(|(key, _)| upper.contains(key))
            .map(|(_, reg)| *reg)
    }

    /// True if any alias occurs in `haystack`, which must already be upper-case.
    pub fn appears_in_upper(&self, haystack: &str) -> bool {
        self.aliases().iter().any(|alias| haystack.contains(alias))
    }
}

impl std::fmt::Display for Regulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.canonical())
    }
}

/// Normalise a raw regulation name to its canonical short form.
///
/// "General Data Protection Regulation" → "GDPR", "nis 2" → "NIS2".
/// Unrecognised names are returned trimmed with their case preserved.
pub fn normalize_regulation_name(name: &str) -> String {
    match Regulation::recognize(name) {
        Some(reg) => reg.canonical().to_string(),
        None => name.trim().to_string(),
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
