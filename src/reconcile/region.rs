//! Target region: district spellings, placeholder detection and name keys.

use hashbrown::HashMap;
use regex::Regex;

use crate::config::RegionConfig;
use crate::models::Place;

/// Region the pipeline works in, plus the optional target district.
#[derive(Debug, Clone)]
pub struct Region {
    pub state: String,
    pub country: String,
    pub country_code: String,
    /// Canonical target district, if one is configured
    pub target: Option<String>,
    /// Lower-cased spelling → canonical district
    aliases: HashMap<String, String>,
    /// Spellings accepted as the target district, canonical first
    target_spellings: Vec<String>,
    pub search_hints: Vec<String>,
    /// Trailing ", <state>" qualifier on place names
    qualifier: Regex,
}

impl Region {
    pub fn from_config(config: &RegionConfig) -> Result<Self, regex::Error> {
        let mut aliases = HashMap::new();
        for (spelling, canonical) in &config.aliases {
            let canonical = canonical.trim().to_string();
            aliases.insert(canonical.to_lowercase(), canonical.clone());
            aliases.insert(spelling.trim().to_lowercase(), canonical);
        }

        let target = config
            .target
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| {
                aliases
                    .get(&t.to_lowercase())
                    .cloned()
                    .unwrap_or_else(|| t.to_string())
            });

        let mut target_spellings: Vec<String> = Vec::new();
        if let Some(target) = &target {
            target_spellings.push(target.clone());
            for (spelling, canonical) in &config.aliases {
                let spelling = spelling.trim();
                let known = target_spellings
                    .iter()
                    .any(|s| s.eq_ignore_ascii_case(spelling));
                if canonical.trim() == target && !known {
                    target_spellings.push(spelling.to_string());
                }
            }
        }

        let state_pattern = config
            .state
            .split_whitespace()
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(r"\s*");
        let qualifier = Regex::new(&format!(r"(?i),\s*{}\s*$", state_pattern))?;

        Ok(Self {
            state: config.state.clone(),
            country: config.country.clone(),
            country_code: config.country_code.clone(),
            target,
            aliases,
            target_spellings,
            search_hints: config.search_hints.clone(),
            qualifier,
        })
    }

    /// Sentinel district of records not yet resolved
    pub fn placeholder(&self) -> &str {
        &self.state
    }

    pub fn is_placeholder(&self, district: &str) -> bool {
        district.trim().eq_ignore_ascii_case(self.state.trim())
    }

    /// The one "already enriched?" check: true when the district is missing,
    /// blank or the placeholder
    pub fn needs_district(&self, place: &Place) -> bool {
        match place.district.as_deref() {
            None => true,
            Some(d) => d.trim().is_empty() || self.is_placeholder(d),
        }
    }

    /// Collapse alternate spellings to one canonical district name
    pub fn canonical_district(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        self.aliases
            .get(&trimmed.to_lowercase())
            .cloned()
            .unwrap_or_else(|| trimmed.to_string())
    }

    /// Case-insensitive, spelling-tolerant match against the target district
    pub fn matches_target(&self, district: &str) -> bool {
        let lowered = district.to_lowercase();
        self.target_spellings
            .iter()
            .any(|s| lowered.contains(&s.to_lowercase()))
    }

    /// Case-insensitive match against the state name
    pub fn matches_state(&self, state: &str) -> bool {
        state
            .to_lowercase()
            .contains(&self.state.to_lowercase())
    }

    /// Target spellings, canonical first
    pub fn target_spellings(&self) -> &[String] {
        &self.target_spellings
    }

    /// Remove a trailing ", <state>" qualifier
    pub fn strip_qualifier(&self, name: &str) -> String {
        self.qualifier.replace(name.trim(), "").trim().to_string()
    }

    /// Merge key for a place name: lower-cased, qualifier stripped,
    /// punctuation removed, whitespace collapsed
    pub fn normalize_name(&self, name: &str) -> String {
        let stripped = self.strip_qualifier(name).to_lowercase();
        let cleaned: String = stripped.chars().filter(|&c| !is_punctuation(c)).collect();
        cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

/// ASCII punctuation and symbols, plus typographic quotes and dashes.
/// Letters and combining marks of non-Latin scripts are kept.
fn is_punctuation(c: char) -> bool {
    (c.is_ascii() && !c.is_ascii_alphanumeric() && !c.is_ascii_whitespace())
        || matches!(c, '\u{2010}'..='\u{201F}' | '\u{00B7}' | '\u{2026}')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(target: Option<&str>) -> Region {
        let config = RegionConfig {
            target: target.map(str::to_string),
            ..RegionConfig::default()
        };
        Region::from_config(&config).unwrap()
    }

    #[test]
    fn test_normalize_collapses_variants() {
        let r = region(None);
        let key = r.normalize_name("abc village");
        assert_eq!(r.normalize_name("Abc Village, Tamil Nadu"), key);
        assert_eq!(r.normalize_name("ABC VILLAGE"), key);
        assert_eq!(r.normalize_name("  Abc   Village ,tamilnadu"), key);
        assert_eq!(r.normalize_name("Abc Village."), key);
        assert_eq!(r.normalize_name("Abc (Village)"), key);
        assert_eq!(r.normalize_name("O'Neil-Pet"), "oneilpet");
        assert_eq!(key, "abc village");
    }

    #[test]
    fn test_normalize_keeps_non_ascii_letters() {
        let r = region(None);
        assert_eq!(r.normalize_name("கயத்தாறு"), "கயத்தாறு");
    }

    #[test]
    fn test_placeholder_predicate() {
        let r = region(None);
        let mut place = Place::new("A", "0", "0");
        assert!(r.needs_district(&place));
        place.district = Some("tamil nadu".to_string());
        assert!(r.needs_district(&place));
        place.district = Some("  ".to_string());
        assert!(r.needs_district(&place));
        place.district = Some("South".to_string());
        assert!(!r.needs_district(&place));
    }

    #[test]
    fn test_canonical_spelling() {
        let r = region(Some("thoothukudi"));
        assert_eq!(r.target.as_deref(), Some("Thoothukkudi"));
        assert_eq!(r.canonical_district("THOOTHUKUDI"), "Thoothukkudi");
        assert_eq!(r.canonical_district("Thoothukkudi"), "Thoothukkudi");
        assert_eq!(r.canonical_district(" Madurai "), "Madurai");
    }

    #[test]
    fn test_matches_target_spellings() {
        let r = region(Some("Thoothukkudi"));
        assert!(r.matches_target("Thoothukudi"));
        assert!(r.matches_target("thoothukkudi district"));
        assert!(!r.matches_target("Tirunelveli"));

        let none = region(None);
        assert!(!none.matches_target("Thoothukkudi"));
    }

    #[test]
    fn test_strip_qualifier() {
        let r = region(None);
        assert_eq!(r.strip_qualifier("Kayathar, Tamil Nadu"), "Kayathar");
        assert_eq!(r.strip_qualifier("Tamil Nadu Nagar"), "Tamil Nadu Nagar");
    }
}
