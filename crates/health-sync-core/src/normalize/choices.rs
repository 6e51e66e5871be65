//! Canonicalization of gender and blood-group spellings.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use strsim::jaro_winkler;

use crate::models::{BloodGroup, Gender};

/// Minimum Jaro–Winkler similarity for a fuzzy gender match.
const GENDER_MATCH_THRESHOLD: f64 = 0.85;

static BLOOD_GROUP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)
        ^(?:blood\s*(?:group|type)?\s*[:\-]?\s*)?
        (?P<abo>ab|a|b|o|0)
        \s*
        (?P<rh>\+\s*ve|-\s*ve|\+|-|−|positive|pos|negative|neg|rh\s*\+|rh\s*-)?
        \s*$",
    )
    .unwrap()
});

/// Alias tables for choice fields.
pub struct ChoiceTables {
    gender_aliases: HashMap<String, Gender>,
}

impl Default for ChoiceTables {
    fn default() -> Self {
        Self::new()
    }
}

impl ChoiceTables {
    pub fn new() -> Self {
        Self {
            gender_aliases: Self::default_gender_aliases(),
        }
    }

    /// Resolve a free-form gender: exact alias first, then fuzzy match.
    pub fn gender(&self, raw: &str) -> Option<Gender> {
        let key = raw.trim().trim_end_matches('.').to_lowercase();
        if key.is_empty() {
            return None;
        }
        if let Some(g) = self.gender_aliases.get(&key) {
            return Some(*g);
        }

        Gender::ALL
            .into_iter()
            .map(|g| (g, jaro_winkler(&key, &g.as_str().to_lowercase())))
            .filter(|(_, score)| *score >= GENDER_MATCH_THRESHOLD)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(g, _)| g)
    }

    /// Add a custom gender alias.
    pub fn add_gender_alias(&mut self, alias: &str, gender: Gender) {
        self.gender_aliases.insert(alias.to_lowercase(), gender);
    }

    /// Resolve blood-group spellings such as "a positive", "AB+ve", "o neg".
    ///
    /// A bare ABO letter is read as Rh positive.
    pub fn blood_group(&self, raw: &str) -> Option<BloodGroup> {
        let caps = BLOOD_GROUP_RE.captures(raw.trim())?;
        let abo = caps.name("abo")?.as_str().to_lowercase();
        let negative = caps
            .name("rh")
            .map(|m| {
                let rh = m.as_str().to_lowercase();
                rh.contains('-') || rh.contains('−') || rh.starts_with("neg")
            })
            .unwrap_or(false);

        let group = match (abo.as_str(), negative) {
            ("a", false) => BloodGroup::APositive,
            ("a", true) => BloodGroup::ANegative,
            ("b", false) => BloodGroup::BPositive,
            ("b", true) => BloodGroup::BNegative,
            ("ab", false) => BloodGroup::AbPositive,
            ("ab", true) => BloodGroup::AbNegative,
            (_, false) => BloodGroup::OPositive,
            (_, true) => BloodGroup::ONegative,
        };
        Some(group)
    }

    fn default_gender_aliases() -> HashMap<String, Gender> {
        let mut map = HashMap::new();

        for alias in ["male", "m", "man", "boy", "mr", "masculine"] {
            map.insert(alias.into(), Gender::Male);
        }
        for alias in ["female", "f", "woman", "girl", "mrs", "ms", "miss", "feminine"] {
            map.insert(alias.into(), Gender::Female);
        }
        for alias in [
            "other",
            "o",
            "x",
            "non-binary",
            "nonbinary",
            "non binary",
            "transgender",
            "intersex",
        ] {
            map.insert(alias.into(), Gender::Other);
        }

        map
    }
}
