use std::collections::HashMap;

use crate::models::{BillingUnit, UnitAlias};

/// The import cannot commit until every listing resolves; suggestions at
/// or above this confidence are pre-selected, anything below requires a
/// manual assignment.
pub const SUGGEST_THRESHOLD: u8 = 70;

const ALIAS_CONFIDENCE: u8 = 95;

/// Match quality, each tier carrying its own confidence rule so the 70/90
/// boundaries are contracts rather than display cutoffs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchTier {
    None,
    Fuzzy,
    Partial,
    Alias,
    Exact,
}

impl MatchTier {
    pub fn label(&self) -> &'static str {
        match self {
            MatchTier::Exact => "exact",
            MatchTier::Alias => "alias",
            MatchTier::Partial => "partial",
            MatchTier::Fuzzy => "fuzzy",
            MatchTier::None => "none",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PossibleMatch {
    pub unit_id: i64,
    pub unit_name: String,
    pub confidence: u8,
    pub tier: MatchTier,
    /// The alias text that matched, when the tier is Alias.
    pub matched_name: Option<String>,
}

/// One distinct listing name found in an import file, with candidate
/// billing units ordered by confidence.
#[derive(Debug, Clone)]
pub struct ListingInfo {
    pub name: String,
    pub count: usize,
    pub possible_matches: Vec<PossibleMatch>,
    pub suggested_unit_id: Option<i64>,
    pub confidence: u8,
    pub needs_manual_assignment: bool,
}

/// The user's final decision for one listing name, consumed at commit
/// time to route rows and optionally persist the alias.
#[derive(Debug, Clone)]
pub struct ListingMapping {
    pub listing_name: String,
    pub unit_id: i64,
    pub save_as_alias: bool,
}

fn normalize(s: &str) -> String {
    s.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

fn token_overlap(a: &str, b: &str) -> f64 {
    let ta: Vec<&str> = a.split_whitespace().collect();
    let tb: Vec<&str> = b.split_whitespace().collect();
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }
    let shared = ta.iter().filter(|t| tb.contains(t)).count();
    let union = ta.len() + tb.len() - shared;
    shared as f64 / union as f64
}

/// 0.0..=1.0 string similarity: the better of normalized edit distance
/// and token overlap, so word reorderings still score well.
fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 0.0;
    }
    let edit = 1.0 - levenshtein(a, b) as f64 / max_len as f64;
    edit.max(token_overlap(a, b))
}

fn partial_confidence(a: &str, b: &str) -> u8 {
    let (shorter, longer) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    // 70..=89 scaled by how much of the longer name is covered
    70 + ((shorter.len() * 19) / longer.len().max(1)) as u8
}

fn fuzzy_confidence(sim: f64) -> Option<u8> {
    if sim < 0.5 {
        return None;
    }
    // 50..=69 across the 0.5..=1.0 similarity band
    Some((50.0 + (sim - 0.5) * 38.0).round().min(69.0) as u8)
}

fn best_match_for_unit(
    listing: &str,
    unit: &BillingUnit,
    aliases: &[UnitAlias],
) -> Option<PossibleMatch> {
    let norm_listing = normalize(listing);
    let norm_unit = normalize(&unit.name);

    if norm_listing == norm_unit {
        return Some(PossibleMatch {
            unit_id: unit.id,
            unit_name: unit.name.clone(),
            confidence: 100,
            tier: MatchTier::Exact,
            matched_name: None,
        });
    }

    for alias in aliases.iter().filter(|a| a.unit_id == unit.id) {
        if normalize(&alias.listing_name) == norm_listing {
            return Some(PossibleMatch {
                unit_id: unit.id,
                unit_name: unit.name.clone(),
                confidence: ALIAS_CONFIDENCE,
                tier: MatchTier::Alias,
                matched_name: Some(alias.listing_name.clone()),
            });
        }
    }

    if norm_listing.contains(&norm_unit) || norm_unit.contains(&norm_listing) {
        return Some(PossibleMatch {
            unit_id: unit.id,
            unit_name: unit.name.clone(),
            confidence: partial_confidence(&norm_listing, &norm_unit),
            tier: MatchTier::Partial,
            matched_name: None,
        });
    }

    fuzzy_confidence(similarity(&norm_listing, &norm_unit)).map(|confidence| PossibleMatch {
        unit_id: unit.id,
        unit_name: unit.name.clone(),
        confidence,
        tier: MatchTier::Fuzzy,
        matched_name: None,
    })
}

/// Rank billing units against one free-text listing name.
pub fn match_listing(
    name: &str,
    count: usize,
    units: &[BillingUnit],
    aliases: &[UnitAlias],
) -> ListingInfo {
    let mut matches: Vec<PossibleMatch> = units
        .iter()
        .filter_map(|u| best_match_for_unit(name, u, aliases))
        .collect();
    matches.sort_by(|a, b| b.confidence.cmp(&a.confidence).then(a.unit_name.cmp(&b.unit_name)));

    let (suggested, confidence) = match matches.first() {
        Some(best) if best.confidence >= SUGGEST_THRESHOLD => (Some(best.unit_id), best.confidence),
        Some(best) => (None, best.confidence),
        None => (None, 0),
    };

    ListingInfo {
        name: name.to_string(),
        count,
        possible_matches: matches,
        suggested_unit_id: suggested,
        confidence,
        needs_manual_assignment: suggested.is_none(),
    }
}

/// Distinct listing names in first-appearance order, with row counts,
/// each ranked against the known units.
pub fn collect_listings(
    listing_names: &[String],
    units: &[BillingUnit],
    aliases: &[UnitAlias],
) -> Vec<ListingInfo> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for name in listing_names {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        let entry = counts.entry(name).or_insert(0);
        if *entry == 0 {
            order.push(name);
        }
        *entry += 1;
    }
    order
        .into_iter()
        .map(|name| match_listing(name, counts[name], units, aliases))
        .collect()
}
