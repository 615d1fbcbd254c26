//! crates/wildlife_core/src/risk.rs
//!
//! Maps free-text conservation status labels onto six ordered buckets.
//!
//! Matching is case-insensitive substring containment, checked from the most
//! specific keyword to the least specific, so "Critically Endangered" never
//! falls into the plain `Endangered` bucket and "Endangered (regional)" still does.

/// Conservation risk buckets, most endangered first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RiskLevel {
    CriticallyEndangered,
    Endangered,
    Vulnerable,
    NearThreatened,
    LeastConcern,
    Other,
}

/// How a risk level should be highlighted by a presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Critical,
    Warning,
    Safe,
    Neutral,
}

/// The closed vocabulary offered as risk filter choices.
pub const RISK_FILTER_OPTIONS: [&str; 5] = [
    "Critically Endangered",
    "Endangered",
    "Vulnerable",
    "Least Concern",
    "Not Evaluated",
];

// Order matters: earlier entries shadow later ones.
const KEYWORDS: [(&str, RiskLevel); 5] = [
    ("critically endangered", RiskLevel::CriticallyEndangered),
    ("endangered", RiskLevel::Endangered),
    ("vulnerable", RiskLevel::Vulnerable),
    ("near threatened", RiskLevel::NearThreatened),
    ("least concern", RiskLevel::LeastConcern),
];

impl RiskLevel {
    pub const ALL: [RiskLevel; 6] = [
        RiskLevel::CriticallyEndangered,
        RiskLevel::Endangered,
        RiskLevel::Vulnerable,
        RiskLevel::NearThreatened,
        RiskLevel::LeastConcern,
        RiskLevel::Other,
    ];

    /// Sort priority: 1 is the most endangered, 6 is unclassified.
    pub fn rank(self) -> u8 {
        match self {
            RiskLevel::CriticallyEndangered => 1,
            RiskLevel::Endangered => 2,
            RiskLevel::Vulnerable => 3,
            RiskLevel::NearThreatened => 4,
            RiskLevel::LeastConcern => 5,
            RiskLevel::Other => 6,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::CriticallyEndangered => "Critically Endangered",
            RiskLevel::Endangered => "Endangered",
            RiskLevel::Vulnerable => "Vulnerable",
            RiskLevel::NearThreatened => "Near Threatened",
            RiskLevel::LeastConcern => "Least Concern",
            RiskLevel::Other => "Other",
        }
    }

    pub fn tone(self) -> Tone {
        match self {
            RiskLevel::CriticallyEndangered | RiskLevel::Endangered => Tone::Critical,
            RiskLevel::Vulnerable => Tone::Warning,
            RiskLevel::LeastConcern => Tone::Safe,
            RiskLevel::NearThreatened | RiskLevel::Other => Tone::Neutral,
        }
    }
}

/// Classifies a risk label. Total over every input; unknown labels are `Other`.
pub fn bucket(label: &str) -> RiskLevel {
    let label = label.to_lowercase();
    KEYWORDS
        .iter()
        .find(|(keyword, _)| label.contains(keyword))
        .map(|(_, level)| *level)
        .unwrap_or(RiskLevel::Other)
}

/// Sort key for a risk label; ascending rank means descending risk.
pub fn rank(label: &str) -> u8 {
    bucket(label).rank()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_labels_are_strictly_ordered() {
        let labels = [
            "Critically Endangered",
            "Endangered",
            "Vulnerable",
            "Near Threatened",
            "Least Concern",
            "Anything else",
        ];
        let ranks: Vec<u8> = labels.iter().map(|l| rank(l)).collect();
        assert!(ranks.windows(2).all(|w| w[0] < w[1]), "ranks: {:?}", ranks);
    }

    #[test]
    fn critically_endangered_wins_over_endangered() {
        assert_eq!(bucket("Critically Endangered"), RiskLevel::CriticallyEndangered);
        assert_eq!(bucket("CRITICALLY ENDANGERED (possibly extinct)"), RiskLevel::CriticallyEndangered);
    }

    #[test]
    fn qualified_labels_match_by_substring() {
        assert_eq!(bucket("Endangered (regional)"), RiskLevel::Endangered);
        assert_eq!(bucket("vulnerable"), RiskLevel::Vulnerable);
        assert_eq!(bucket("IUCN: Near Threatened"), RiskLevel::NearThreatened);
    }

    #[test]
    fn unknown_and_empty_labels_are_other() {
        assert_eq!(bucket(""), RiskLevel::Other);
        assert_eq!(bucket("Not Evaluated"), RiskLevel::Other);
        assert_eq!(bucket("Data Deficient"), RiskLevel::Other);
        assert_eq!(rank(""), 6);
    }

    #[test]
    fn rank_matches_enum_order() {
        for pair in RiskLevel::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].rank() < pair[1].rank());
        }
    }

    #[test]
    fn tones_follow_severity() {
        assert_eq!(RiskLevel::CriticallyEndangered.tone(), Tone::Critical);
        assert_eq!(RiskLevel::Endangered.tone(), Tone::Critical);
        assert_eq!(RiskLevel::Vulnerable.tone(), Tone::Warning);
        assert_eq!(RiskLevel::NearThreatened.tone(), Tone::Neutral);
        assert_eq!(RiskLevel::LeastConcern.tone(), Tone::Safe);
        assert_eq!(bucket(RISK_FILTER_OPTIONS[4]).tone(), Tone::Neutral);
    }
}
