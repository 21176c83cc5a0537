// 🏷️ Alias Tables - canonical names and the raw tokens that denote them
// "PRO-100", "pixmapro100", "CanPro-100" → all the same printer

use std::collections::{BTreeMap, HashMap};
use std::ops::Range;
use tracing::{debug, warn};

/// Sentinel used whenever a printer or brand cannot be resolved.
pub const UNKNOWN: &str = "Unknown";

// ============================================================================
// ALIAS HIT
// ============================================================================

/// One canonical name found inside a larger piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasHit {
    /// Canonical name the alias belongs to
    pub canonical: String,

    /// Longest alias of this canonical seen in the text (configured spelling)
    pub alias: String,

    /// Byte offset of the first occurrence in the lowercased text
    pub position: usize,
}

// ============================================================================
// ALIAS TABLE
// ============================================================================

/// Bidirectional, case-insensitive lookup between canonical names and aliases.
///
/// Built once from configuration and never mutated afterwards. Every canonical
/// name is also an alias of itself.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    /// canonical → aliases as configured
    aliases: BTreeMap<String, Vec<String>>,

    /// lowercased alias → (canonical, configured spelling)
    index: HashMap<String, (String, String)>,

    /// lowercased aliases, longest first, for substring scans
    scan_order: Vec<String>,

    /// canonical → model token used in combo keys
    model_tokens: HashMap<String, String>,
}

impl AliasTable {
    /// Build the table from a canonical → aliases mapping.
    ///
    /// When two canonicals claim the same alias (case-insensitively) the first
    /// canonical in name order keeps it.
    pub fn new<I, S>(mapping: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<S>)>,
        S: Into<String>,
    {
        let mut aliases: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (canonical, names) in mapping {
            let entry = aliases.entry(canonical.into()).or_default();
            for name in names {
                let name = name.into();
                if !name.trim().is_empty() && !entry.contains(&name) {
                    entry.push(name);
                }
            }
        }

        let mut index: HashMap<String, (String, String)> = HashMap::new();
        for (canonical, names) in &aliases {
            for name in std::iter::once(canonical).chain(names.iter()) {
                let key = name.to_lowercase();
                match index.get(&key) {
                    Some((owner, _)) if owner != canonical => {
                        warn!(alias = %name, kept = %owner, dropped = %canonical, "alias claimed by two canonical names");
                    }
                    Some(_) => {}
                    None => {
                        index.insert(key, (canonical.clone(), name.clone()));
                    }
                }
            }
        }

        let mut scan_order: Vec<String> = index.keys().cloned().collect();
        scan_order.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        let model_tokens = aliases
            .iter()
            .map(|(canonical, names)| (canonical.clone(), pick_model_token(canonical, names)))
            .collect();

        AliasTable {
            aliases,
            index,
            scan_order,
            model_tokens,
        }
    }

    /// Exact, case-insensitive lookup of a whole token.
    pub fn lookup(&self, token: &str) -> Option<&str> {
        let key = token.trim().to_lowercase();
        if key.is_empty() {
            return None;
        }
        self.index.get(&key).map(|(canonical, _)| canonical.as_str())
    }

    /// Find every canonical name whose alias appears inside `text`.
    ///
    /// Occurrences nested inside a longer matched alias are ignored, so
    /// "SC-P900" yields one hit rather than also counting "P900". Hits are
    /// returned in order of first appearance, one per canonical name.
    pub fn find_in(&self, text: &str) -> Vec<AliasHit> {
        self.collect_hits(text, false)
    }

    /// Like `find_in`, but an alias only counts when it starts a word
    /// ("HFAPhoto" hits "HFA", "Mirror" does not hit "RR").
    pub fn find_at_word_start(&self, text: &str) -> Vec<AliasHit> {
        self.collect_hits(text, true)
    }

    /// Byte ranges of every alias occurrence in `text`, in order, with no
    /// two ranges overlapping. Longer aliases claim their span first.
    ///
    /// Offsets refer to `text` itself, so the ranges can be cut out of it.
    pub fn spans_in(&self, text: &str) -> Vec<Range<usize>> {
        let haystack = text.to_ascii_lowercase();
        let mut spans: Vec<Range<usize>> = Vec::new();
        for alias in &self.scan_order {
            for (start, matched) in haystack.match_indices(alias.as_str()) {
                let end = start + matched.len();
                if !spans.iter().any(|s| start < s.end && s.start < end) {
                    spans.push(start..end);
                }
            }
        }
        spans.sort_by_key(|s| s.start);
        spans
    }

    /// Alias occurrences not nested inside a longer one, as (start, end, alias).
    fn accepted_spans<'s>(&'s self, haystack: &str, word_start_only: bool) -> Vec<(usize, usize, &'s str)> {
        // scan_order is longest-first, so containing spans are accepted first
        let mut accepted: Vec<(usize, usize, &str)> = Vec::new();
        for alias in &self.scan_order {
            for (start, matched) in haystack.match_indices(alias.as_str()) {
                if word_start_only && !starts_word(haystack, start) {
                    continue;
                }
                let end = start + matched.len();
                let nested = accepted.iter().any(|(s, e, _)| *s <= start && end <= *e);
                if !nested {
                    accepted.push((start, end, alias.as_str()));
                }
            }
        }
        accepted
    }

    fn collect_hits(&self, text: &str, word_start_only: bool) -> Vec<AliasHit> {
        let haystack = text.to_lowercase();
        if haystack.is_empty() {
            return Vec::new();
        }

        let accepted = self.accepted_spans(&haystack, word_start_only);
        let mut hits: Vec<AliasHit> = Vec::new();
        for (start, _, alias) in accepted {
            let Some((canonical, spelling)) = self.index.get(alias) else {
                continue;
            };
            match hits.iter_mut().find(|hit| &hit.canonical == canonical) {
                Some(hit) => {
                    hit.position = hit.position.min(start);
                    if spelling.len() > hit.alias.len() {
                        hit.alias = spelling.clone();
                    }
                }
                None => hits.push(AliasHit {
                    canonical: canonical.clone(),
                    alias: spelling.clone(),
                    position: start,
                }),
            }
        }

        hits.sort_by_key(|hit| hit.position);
        hits
    }

    /// True if any alias occurs anywhere in `text`.
    pub fn occurs_in(&self, text: &str) -> bool {
        let haystack = text.to_lowercase();
        self.scan_order.iter().any(|alias| haystack.contains(alias.as_str()))
    }

    /// Stable identifier for a canonical name inside combo keys.
    ///
    /// The shortest configured alias, uppercased ("Epson P7570" → "P7570").
    pub fn model_token(&self, canonical: &str) -> String {
        self.model_tokens
            .get(canonical)
            .cloned()
            .unwrap_or_else(|| canonical.to_uppercase())
    }

    /// Aliases configured for a canonical name.
    pub fn aliases_of(&self, canonical: &str) -> &[String] {
        self.aliases.get(canonical).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All canonical names, sorted.
    pub fn canonical_names(&self) -> impl Iterator<Item = &str> {
        self.aliases.keys().map(String::as_str)
    }

    /// Number of canonical names
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

fn starts_word(text: &str, index: usize) -> bool {
    text[..index]
        .chars()
        .next_back()
        .map_or(true, |c| !c.is_alphanumeric())
}

fn pick_model_token(canonical: &str, names: &[String]) -> String {
    std::iter::once(canonical)
        .chain(names.iter().map(String::as_str))
        .map(str::to_uppercase)
        .min_by(|a, b| a.chars().count().cmp(&b.chars().count()).then_with(|| a.cmp(b)))
        .unwrap_or_else(|| canonical.to_uppercase())
}

// ============================================================================
// REMAPPING TABLE
// ============================================================================

/// Canonical → canonical printer consolidation, applied once after alias
/// normalization.
#[derive(Debug, Clone, Default)]
pub struct RemappingTable {
    targets: HashMap<String, String>,
}

impl RemappingTable {
    pub fn new<I, S>(mapping: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        let targets: HashMap<String, String> = mapping
            .into_iter()
            .map(|(from, to)| (from.into(), to.into()))
            .filter(|(from, to)| from != to)
            .collect();

        for (from, to) in &targets {
            if targets.contains_key(to) {
                warn!(from = %from, to = %to, "remap target is itself remapped; chain will not be followed");
            }
        }

        RemappingTable { targets }
    }

    /// Substitute the mapped target if one exists. Never follows chains.
    pub fn apply(&self, printer: &str) -> String {
        match self.targets.get(printer) {
            Some(target) => {
                debug!(from = %printer, to = %target, "remapping printer");
                target.clone()
            }
            None => printer.to_string(),
        }
    }

    pub fn get(&self, printer: &str) -> Option<&str> {
        self.targets.get(printer).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================
