// 🏷️ Classification Rules - Rules as Data
// Filename → rule → fields → canonical names → ClassificationResult

use crate::aliases::UNKNOWN;
use crate::catalog::{PatternCatalog, RuleDefinition};
use crate::config::RuleConfig;
use crate::extract::{extract_fields, ExtractedFields};
use crate::normalize::{BrandInput, Normalizer, PrinterResolution};
use crate::paper::PaperTypeFormatter;
use crate::resolver::{ComboKey, MultiPrinterResolver, Resolution};
use anyhow::{Context as AnyhowContext, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

/// Extensions stripped before matching (compared case-insensitively).
pub const PROFILE_EXTENSIONS: &[&str] = &["icc", "icm", "emx", "emy2", "pdf"];

/// Drop a known profile/document extension and turn '+' into a space.
pub fn preprocess_filename(filename: &str) -> String {
    let trimmed = filename.trim();
    let stem = match trimmed.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty() && PROFILE_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext)) =>
        {
            stem
        }
        _ => trimmed,
    };
    stem.replace('+', " ").trim().to_string()
}

// ============================================================================
// CLASSIFICATION RESULT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ClassificationStatus {
    Matched,
    Unmatched,
    /// Printer token named several printers and nobody decided yet
    PendingDisambiguation,
}

impl ClassificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassificationStatus::Matched => "Matched",
            ClassificationStatus::Unmatched => "Unmatched",
            ClassificationStatus::PendingDisambiguation => "PendingDisambiguation",
        }
    }
}

impl fmt::Display for ClassificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Filename as given by the caller
    pub filename: String,

    /// Canonical printer or "Unknown"
    pub printer: String,

    /// Canonical brand or "Unknown"
    pub brand: String,

    /// Formatted paper type (may be empty)
    pub paper_type: String,

    /// Extracted `code` field (ink set, revision...), may be empty
    pub code: String,

    /// Name of the rule that selected this filename
    pub matched_rule: Option<String>,

    pub status: ClassificationStatus,

    /// Set when the printer token named several printers
    pub combo_key: Option<ComboKey>,

    /// Printers the combo could mean
    pub candidates: Vec<String>,
}

impl ClassificationResult {
    /// Result for a filename no rule could handle.
    pub fn unmatched(filename: &str) -> Self {
        ClassificationResult {
            filename: filename.to_string(),
            printer: UNKNOWN.to_string(),
            brand: UNKNOWN.to_string(),
            paper_type: String::new(),
            code: String::new(),
            matched_rule: None,
            status: ClassificationStatus::Unmatched,
            combo_key: None,
            candidates: Vec::new(),
        }
    }

    pub fn is_matched(&self) -> bool {
        self.status == ClassificationStatus::Matched
    }

    /// "Printer - Brand - Paper Type", paper type omitted when empty.
    pub fn display_name(&self) -> String {
        if self.paper_type.is_empty() {
            format!("{} - {}", self.printer, self.brand)
        } else {
            format!("{} - {} - {}", self.printer, self.brand, self.paper_type)
        }
    }
}

// ============================================================================
// OUTPUT NAMES
// ============================================================================

/// Hands out "Printer - Brand - Paper Type.ext" names for a batch.
///
/// Repeats of a name get " [2]", " [3]" and so on before the extension.
/// The extension is taken from the source filename as given.
#[derive(Debug, Clone, Default)]
pub struct OutputNamer {
    seen: HashMap<String, usize>,
}

impl OutputNamer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name_for(&mut self, result: &ClassificationResult) -> String {
        let base = result.display_name();
        let count = self.seen.entry(base.clone()).or_insert(0);
        *count += 1;

        let name = if *count == 1 {
            base
        } else {
            format!("{} [{}]", base, count)
        };
        match extension_of(&result.filename) {
            Some(ext) => format!("{}.{}", name, ext),
            None => name,
        }
    }
}

fn extension_of(filename: &str) -> Option<&str> {
    filename
        .trim()
        .rsplit_once('.')
        .filter(|(stem, ext)| !stem.is_empty() && !ext.is_empty() && !ext.contains(' '))
        .map(|(_, ext)| ext)
}

// ============================================================================
// RULE ENGINE
// ============================================================================

/// Pure, read-only classification pipeline. Safe to share across threads.
#[derive(Debug, Clone)]
pub struct RuleEngine {
    catalog: PatternCatalog,
    normalizer: Normalizer,
}

impl RuleEngine {
    pub fn new(catalog: PatternCatalog, normalizer: Normalizer) -> Self {
        RuleEngine { catalog, normalizer }
    }

    /// Engine built from the embedded default configuration.
    pub fn with_defaults() -> Self {
        RuleConfig::defaults()
            .build_engine()
            .expect("embedded default configuration yields a usable catalog")
    }

    /// Load a user configuration file on top of the defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = RuleConfig::load(Some(path.as_ref()))
            .with_context(|| format!("Failed to load rules file: {:?}", path.as_ref()))?;

        config.build_engine().context("Failed to build rule engine")
    }

    /// Classify one filename without touching any preference state.
    ///
    /// Combos come back as PendingDisambiguation; `Classifier` settles them.
    pub fn analyze(&self, filename: &str) -> ClassificationResult {
        let name = preprocess_filename(filename);

        let Some(selected) = self.catalog.match_rule(&name) else {
            warn!(file = %filename, "no filename pattern matched");
            return ClassificationResult::unmatched(filename);
        };
        let rule = selected.rule;

        let fields = extract_fields(
            rule,
            &name,
            &selected.remainder,
            self.normalizer.printers(),
            self.normalizer.brands(),
        );
        let printer = self
            .normalizer
            .resolve_printer(fields.printer.as_deref().unwrap_or_default());

        if rule.is_fallback() && printer == PrinterResolution::Unknown {
            warn!(file = %filename, "no printer alias found");
            return ClassificationResult::unmatched(filename);
        }

        let mut result = ClassificationResult {
            filename: filename.to_string(),
            printer: UNKNOWN.to_string(),
            brand: self.brand_for(rule, &fields, &name),
            paper_type: paper_type_for(rule, fields.paper_type.as_deref().unwrap_or_default()),
            code: fields.code.unwrap_or_default(),
            matched_rule: Some(rule.name.clone()),
            status: ClassificationStatus::Matched,
            combo_key: None,
            candidates: Vec::new(),
        };

        match printer {
            PrinterResolution::Resolved(canonical) => result.printer = canonical,
            PrinterResolution::Combo { key, candidates } => {
                result.status = ClassificationStatus::PendingDisambiguation;
                result.combo_key = Some(key);
                result.candidates = candidates;
            }
            PrinterResolution::Unknown => {}
        }

        debug!(
            file = %filename,
            rule = %rule.name,
            printer = %result.printer,
            brand = %result.brand,
            paper_type = %result.paper_type,
            status = %result.status,
            "classified"
        );
        result
    }

    /// Fixed brand, else the extracted token, else a scan of the whole name.
    fn brand_for(&self, rule: &RuleDefinition, fields: &ExtractedFields, name: &str) -> String {
        if let Some(fixed) = &rule.brand_value {
            return self.normalizer.resolve_brand(BrandInput::Fixed(fixed));
        }
        let brand = self
            .normalizer
            .resolve_brand(BrandInput::Raw(fields.brand.as_deref().unwrap_or_default()));
        if brand != UNKNOWN {
            return brand;
        }
        self.normalizer.detect_brand(name).unwrap_or(brand)
    }

    pub fn catalog(&self) -> &PatternCatalog {
        &self.catalog
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Get number of rules loaded
    pub fn rule_count(&self) -> usize {
        self.catalog.len()
    }
}

fn paper_type_for(rule: &RuleDefinition, raw: &str) -> String {
    let processing = &rule.paper_type_processing;
    if processing.format {
        PaperTypeFormatter::from_processing(processing).format(raw)
    } else {
        raw.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

// ============================================================================
// CLASSIFIER
// ============================================================================

/// RuleEngine plus the stateful combo resolver.
pub struct Classifier {
    engine: RuleEngine,
    resolver: MultiPrinterResolver,
}

impl Classifier {
    pub fn new(engine: RuleEngine, resolver: MultiPrinterResolver) -> Self {
        Classifier { engine, resolver }
    }

    pub fn classify(&mut self, filename: &str) -> ClassificationResult {
        let result = self.engine.analyze(filename);
        self.settle(result)
    }

    /// Analyse every filename in parallel, then settle combos one at a time
    /// in input order so the resolver and its store see a single writer.
    pub fn classify_batch<S>(&mut self, filenames: &[S]) -> Vec<ClassificationResult>
    where
        S: AsRef<str> + Sync,
    {
        let engine = &self.engine;
        let analyzed: Vec<ClassificationResult> = filenames
            .par_iter()
            .map(|filename| engine.analyze(filename.as_ref()))
            .collect();

        analyzed.into_iter().map(|result| self.settle(result)).collect()
    }

    fn settle(&mut self, mut result: ClassificationResult) -> ClassificationResult {
        if result.status != ClassificationStatus::PendingDisambiguation {
            return result;
        }
        let Some(key) = result.combo_key.clone() else {
            return result;
        };

        if let Resolution::Resolved { printer, source } = self.resolver.resolve(&key, &result.candidates) {
            debug!(file = %result.filename, combo = %key, printer = %printer, ?source, "combo settled");
            result.printer = printer;
            result.status = ClassificationStatus::Matched;
        }
        result
    }

    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    pub fn resolver(&self) -> &MultiPrinterResolver {
        &self.resolver
    }

    pub fn resolver_mut(&mut self) -> &mut MultiPrinterResolver {
        &mut self.resolver
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aliases::{AliasTable, RemappingTable};
    use crate::catalog::{FieldKind, FieldLocator, PaperTypeProcessing};
    use crate::preferences::MemoryPreferenceStore;

    fn formatted() -> PaperTypeProcessing {
        PaperTypeProcessing {
            format: true,
            ..PaperTypeProcessing::default()
        }
    }

    fn small_engine(rules: Vec<RuleDefinition>) -> RuleEngine {
        let normalizer = Normalizer::new(
            AliasTable::new(vec![
                ("Epson P900", vec!["P900", "SC-P900"]),
                ("Epson P7570", vec!["P7570"]),
                ("Epson P9570", vec!["P9570"]),
            ]),
            AliasTable::new(vec![("Canson", vec!["cifa"])]),
            Vec::new(),
            RemappingTable::default(),
        );
        RuleEngine::new(PatternCatalog::new(rules), normalizer)
    }

    #[test]
    fn test_preprocess_filename() {
        assert_eq!(preprocess_filename("MOAB Lasal+Gloss P900.icc"), "MOAB Lasal Gloss P900");
        assert_eq!(preprocess_filename("EPSON SC-P900 Canson.EMY2"), "EPSON SC-P900 Canson");
        assert_eq!(preprocess_filename("Rag v1.2"), "Rag v1.2");
        assert_eq!(preprocess_filename(".icc"), ".icc");
    }

    #[test]
    fn test_rule_priority() {
        let engine = small_engine(vec![
            RuleDefinition::new("general", 1)
                .with_field(FieldKind::Printer, FieldLocator::Substring)
                .with_field(FieldKind::PaperType, FieldLocator::Remaining),
            RuleDefinition::new("specific", 100)
                .with_prefix("Canson ", false)
                .with_brand("Canson")
                .with_field(FieldKind::PaperType, FieldLocator::BeforePrinter)
                .with_field(FieldKind::Printer, FieldLocator::KeySearch),
        ]);

        let result = engine.analyze("Canson Aquarelle Rag P900.icc");
        assert_eq!(result.matched_rule.as_deref(), Some("specific"));
        assert_eq!(result.brand, "Canson");
        assert_eq!(result.paper_type, "Aquarelle Rag");
    }

    #[test]
    fn test_prefixed_rule_without_printer_still_matches() {
        let engine = small_engine(vec![RuleDefinition::new("moab", 100)
            .with_prefix("MOAB ", true)
            .with_brand("MOAB")
            .with_processing(formatted())
            .with_field(FieldKind::PaperType, FieldLocator::From(0))
            .with_field(FieldKind::Printer, FieldLocator::KeySearch)]);

        let result = engine.analyze("MOAB Juniper Baryta.icc");
        assert_eq!(result.status, ClassificationStatus::Matched);
        assert_eq!(result.printer, UNKNOWN);
        assert_eq!(result.paper_type, "Juniper Baryta");
    }

    #[test]
    fn test_no_rule_is_unmatched() {
        let engine = small_engine(vec![RuleDefinition::new("moab", 100).with_prefix("MOAB ", true)]);
        let result = engine.analyze("cifa_p900_aqua.icc");
        assert_eq!(result, ClassificationResult::unmatched("cifa_p900_aqua.icc"));
        assert_eq!(result.display_name(), "Unknown - Unknown");
    }

    #[test]
    fn test_output_names_number_repeats_and_keep_extension() {
        let named = |filename: &str, paper_type: &str| ClassificationResult {
            printer: "Epson P900".to_string(),
            brand: "Canson".to_string(),
            paper_type: paper_type.to_string(),
            status: ClassificationStatus::Matched,
            ..ClassificationResult::unmatched(filename)
        };

        let mut namer = OutputNamer::new();
        assert_eq!(namer.name_for(&named("a.icc", "Rag")), "Epson P900 - Canson - Rag.icc");
        assert_eq!(namer.name_for(&named("b.ICM", "Rag")), "Epson P900 - Canson - Rag [2].ICM");
        assert_eq!(namer.name_for(&named("c.emy2", "Rag")), "Epson P900 - Canson - Rag [3].emy2");
        assert_eq!(namer.name_for(&named("d.icc", "Baryta")), "Epson P900 - Canson - Baryta.icc");
        assert_eq!(namer.name_for(&named("noext", "Velvet")), "Epson P900 - Canson - Velvet");
    }

    #[test]
    fn test_fallback_detects_brand_best_effort() {
        let engine = small_engine(vec![RuleDefinition::new("fallback", 10)
            .with_processing(formatted())
            .with_field(FieldKind::Printer, FieldLocator::Substring)
            .with_field(FieldKind::PaperType, FieldLocator::Remaining)]);

        let result = engine.analyze("CIFA Rag P900.icm");
        assert_eq!(result.printer, "Epson P900");
        assert_eq!(result.brand, "Canson");
        assert_eq!(result.paper_type, "CIFA Rag");
        assert_eq!(result.display_name(), "Epson P900 - Canson - CIFA Rag");
    }

    #[test]
    fn test_unformatted_paper_type_only_collapsed() {
        let engine = small_engine(vec![RuleDefinition::new("raw", 10)
            .with_prefix("X_", false)
            .with_delimiter("_")
            .with_field(FieldKind::Printer, FieldLocator::Index(0))
            .with_field(FieldKind::PaperType, FieldLocator::From(1))]);

        let result = engine.analyze("X_P900_velvetRag__300");
        assert_eq!(result.paper_type, "velvetRag 300");
    }

    #[test]
    fn test_combo_pending_without_prompter() {
        let engine = small_engine(vec![RuleDefinition::new("fallback", 10)
            .with_field(FieldKind::Printer, FieldLocator::Substring)
            .with_field(FieldKind::PaperType, FieldLocator::Remaining)]);

        let mut classifier = Classifier::new(engine, MultiPrinterResolver::non_interactive(MemoryPreferenceStore::new()));
        let result = classifier.classify("Gloss P9570-P7570.icc");
        assert_eq!(result.status, ClassificationStatus::PendingDisambiguation);
        assert_eq!(result.printer, UNKNOWN);
        assert_eq!(result.combo_key.as_ref().map(ComboKey::as_str), Some("P7570-P9570"));
        assert_eq!(result.candidates, vec!["Epson P9570", "Epson P7570"]);
    }

    #[test]
    fn test_batch_uses_stored_preference() {
        let engine = small_engine(vec![RuleDefinition::new("fallback", 10)
            .with_field(FieldKind::Printer, FieldLocator::Substring)
            .with_field(FieldKind::PaperType, FieldLocator::Remaining)]);
        let store = MemoryPreferenceStore::new().with_entry("P7570-P9570", "Epson P9570");
        let mut classifier = Classifier::new(engine, MultiPrinterResolver::non_interactive(store));

        let results = classifier.classify_batch(&["Gloss P7570-P9570.icc", "Satin P900.icc", "nothing here"]);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].printer, "Epson P9570");
        assert!(results[0].is_matched());
        assert_eq!(results[1].printer, "Epson P900");
        assert_eq!(results[2].status, ClassificationStatus::Unmatched);
    }
}
