// 🧭 Normalizer - raw printer/brand tokens → canonical names
// Alias lookup first, remapping exactly once afterwards

use crate::aliases::{AliasTable, RemappingTable, UNKNOWN};
use crate::resolver::ComboKey;

// ============================================================================
// PRINTER RESOLUTION
// ============================================================================

/// What a raw printer token turned out to denote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrinterResolution {
    /// One canonical printer (already remapped)
    Resolved(String),

    /// Several printers; needs the MultiPrinterResolver
    Combo {
        key: ComboKey,
        /// Distinct remapped candidates, in order of appearance
        candidates: Vec<String>,
    },

    /// No alias matched
    Unknown,
}

impl PrinterResolution {
    /// Canonical name, or the "Unknown" sentinel for anything else.
    pub fn name(&self) -> &str {
        match self {
            PrinterResolution::Resolved(name) => name,
            _ => UNKNOWN,
        }
    }
}

/// Where the brand for a filename comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrandInput<'a> {
    /// Fixed by the rule; used verbatim
    Fixed(&'a str),
    /// Extracted from the filename (possibly empty)
    Raw(&'a str),
}

// ============================================================================
// NORMALIZER
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    printers: AliasTable,
    brands: AliasTable,
    /// Flat list of additional known brand names
    paper_brands: Vec<String>,
    remappings: RemappingTable,
}

impl Normalizer {
    pub fn new(
        printers: AliasTable,
        brands: AliasTable,
        paper_brands: Vec<String>,
        remappings: RemappingTable,
    ) -> Self {
        Normalizer {
            printers,
            brands,
            paper_brands,
            remappings,
        }
    }

    /// Resolve both tokens at once.
    pub fn normalize(&self, printer_token: &str, brand: BrandInput<'_>) -> (PrinterResolution, String) {
        (self.resolve_printer(printer_token), self.resolve_brand(brand))
    }

    /// Exact alias match first, then every alias embedded in the token.
    pub fn resolve_printer(&self, token: &str) -> PrinterResolution {
        let token = token.trim();
        if token.is_empty() {
            return PrinterResolution::Unknown;
        }

        if let Some(canonical) = self.printers.lookup(token) {
            return PrinterResolution::Resolved(self.remappings.apply(canonical));
        }

        let hits = self.printers.find_in(token);
        match hits.len() {
            0 => PrinterResolution::Unknown,
            1 => PrinterResolution::Resolved(self.remappings.apply(&hits[0].canonical)),
            _ => {
                let key = ComboKey::from_tokens(hits.iter().map(|h| self.printers.model_token(&h.canonical)));

                let mut candidates: Vec<String> = Vec::with_capacity(hits.len());
                for hit in &hits {
                    let name = self.remappings.apply(&hit.canonical);
                    if !candidates.contains(&name) {
                        candidates.push(name);
                    }
                }

                // Remapping can collapse the combo into a single printer
                if candidates.len() == 1 {
                    PrinterResolution::Resolved(candidates.remove(0))
                } else {
                    PrinterResolution::Combo { key, candidates }
                }
            }
        }
    }

    /// Fixed brands pass through; raw tokens go through the alias table and
    /// then the `paper_brands` list. Anything else is "Unknown".
    pub fn resolve_brand(&self, brand: BrandInput<'_>) -> String {
        match brand {
            BrandInput::Fixed(value) => value.to_string(),
            BrandInput::Raw(token) => {
                let token = token.trim();
                if let Some(canonical) = self.brands.lookup(token) {
                    return canonical.to_string();
                }
                self.paper_brands
                    .iter()
                    .find(|b| !token.is_empty() && b.eq_ignore_ascii_case(token))
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN.to_string())
            }
        }
    }

    /// Best-effort brand search over a whole filename.
    ///
    /// Brand aliases must start a word; the longest one wins, earliest on ties.
    /// Falls back to `paper_brands` entries found anywhere in the name.
    pub fn detect_brand(&self, text: &str) -> Option<String> {
        let hits = self.brands.find_at_word_start(text);
        let best = hits
            .iter()
            .max_by(|a, b| a.alias.len().cmp(&b.alias.len()).then_with(|| b.position.cmp(&a.position)));
        if let Some(hit) = best {
            return Some(hit.canonical.clone());
        }

        let lower = text.to_lowercase();
        self.paper_brands
            .iter()
            .find(|b| !b.is_empty() && lower.contains(&b.to_lowercase()))
            .cloned()
    }

    pub fn printers(&self) -> &AliasTable {
        &self.printers
    }

    pub fn brands(&self) -> &AliasTable {
        &self.brands
    }

    pub fn paper_brands(&self) -> &[String] {
        &self.paper_brands
    }

    pub fn remappings(&self) -> &RemappingTable {
        &self.remappings
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> Normalizer {
        Normalizer::new(
            AliasTable::new(vec![
                ("Canon Pixma PRO-100", vec!["PRO-100", "pixmapro100", "pro100"]),
                ("Epson P700", vec!["P700", "SC-P700"]),
                ("Epson P900", vec!["P900", "SC-P900"]),
                ("Epson P7570", vec!["P7570", "SC-P7570"]),
                ("Epson P9570", vec!["P9570"]),
            ]),
            AliasTable::new(vec![("Canson", vec!["cifa"]), ("Hahnemuehle", vec!["HFA"]), ("MOAB", vec!["Moab"])]),
            vec!["Ilford".to_string()],
            RemappingTable::new(vec![("Epson P700", "Epson P900")]),
        )
    }

    #[test]
    fn test_exact_then_substring() {
        let n = normalizer();
        assert_eq!(n.resolve_printer("pro-100"), PrinterResolution::Resolved("Canon Pixma PRO-100".into()));
        assert_eq!(n.resolve_printer("EpsSC-P900x"), PrinterResolution::Resolved("Epson P900".into()));
        assert_eq!(n.resolve_printer("Z9000"), PrinterResolution::Unknown);
        assert_eq!(n.resolve_printer("  "), PrinterResolution::Unknown);
    }

    #[test]
    fn test_remap_after_normalization() {
        let n = normalizer();
        assert_eq!(n.resolve_printer("SC-P700"), PrinterResolution::Resolved("Epson P900".into()));
    }

    #[test]
    fn test_combo_detected() {
        let n = normalizer();
        match n.resolve_printer("P9570-P7570") {
            PrinterResolution::Combo { key, candidates } => {
                assert_eq!(key.as_str(), "P7570-P9570");
                assert_eq!(candidates, vec!["Epson P9570", "Epson P7570"]);
            }
            other => panic!("expected combo, got {:?}", other),
        }
    }

    #[test]
    fn test_combo_collapsed_by_remap() {
        let n = normalizer();
        assert_eq!(n.resolve_printer("P700-P900"), PrinterResolution::Resolved("Epson P900".into()));
    }

    #[test]
    fn test_brand_resolution() {
        let n = normalizer();
        assert_eq!(n.resolve_brand(BrandInput::Fixed("Red River")), "Red River");
        assert_eq!(n.resolve_brand(BrandInput::Raw("CIFA")), "Canson");
        assert_eq!(n.resolve_brand(BrandInput::Raw("ilford")), "Ilford");
        assert_eq!(n.resolve_brand(BrandInput::Raw("Tecco")), UNKNOWN);
        assert_eq!(n.resolve_brand(BrandInput::Raw("")), UNKNOWN);
    }

    #[test]
    fn test_detect_brand() {
        let n = normalizer();
        assert_eq!(n.detect_brand("HFAPhoto Rag P900").as_deref(), Some("Hahnemuehle"));
        assert_eq!(n.detect_brand("Gold Fibre ILFORD P900").as_deref(), Some("Ilford"));
        assert_eq!(n.detect_brand("Glossy P900"), None);
    }
}
