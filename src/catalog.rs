// 📚 Pattern Catalog - Rules as Data
// Declarative filename rules, validated at load time and evaluated by priority

use crate::error::RuleError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use tracing::{info, warn};

// ============================================================================
// FIELD SPECS
// ============================================================================

/// Which output field a FieldSpec fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Printer,
    Brand,
    PaperType,
    /// Free-form code (ink set, profile revision, ...)
    Code,
}

impl FieldKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "printer" => Some(FieldKind::Printer),
            "brand" => Some(FieldKind::Brand),
            "paper_type" => Some(FieldKind::PaperType),
            "code" => Some(FieldKind::Code),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Printer => "printer",
            FieldKind::Brand => "brand",
            FieldKind::PaperType => "paper_type",
            FieldKind::Code => "code",
        }
    }
}

/// How a field is located in the filename. Closed set: every variant maps to
/// one extraction strategy in `extract`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldLocator {
    /// Single part at this index
    Index(usize),
    /// Parts from this index to the end ("N+")
    From(usize),
    BeforePrinter,
    AfterPrinter,
    /// Every part except the printer part
    Remaining,
    /// First part containing a known printer alias
    KeySearch,
    /// Printer aliases anywhere in the raw filename
    Substring,
}

impl FieldLocator {
    /// Parse a `position` value: an integer, "N+", or a named position.
    pub fn parse_position(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_u64().map(|i| FieldLocator::Index(i as usize)),
            Value::String(s) => {
                let s = s.trim();
                match s {
                    "before_printer" => Some(FieldLocator::BeforePrinter),
                    "after_printer" => Some(FieldLocator::AfterPrinter),
                    "remaining" => Some(FieldLocator::Remaining),
                    _ => match s.strip_suffix('+') {
                        Some(start) => start.trim().parse().ok().map(FieldLocator::From),
                        None => s.parse().ok().map(FieldLocator::Index),
                    },
                }
            }
            _ => None,
        }
    }

    /// Parse a `match_type` value.
    pub fn parse_match_type(value: &str) -> Option<Self> {
        match value.trim() {
            "key_search" => Some(FieldLocator::KeySearch),
            "substring" => Some(FieldLocator::Substring),
            _ => None,
        }
    }
}

impl fmt::Display for FieldLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldLocator::Index(i) => write!(f, "{}", i),
            FieldLocator::From(i) => write!(f, "{}+", i),
            FieldLocator::BeforePrinter => write!(f, "before_printer"),
            FieldLocator::AfterPrinter => write!(f, "after_printer"),
            FieldLocator::Remaining => write!(f, "remaining"),
            FieldLocator::KeySearch => write!(f, "key_search"),
            FieldLocator::Substring => write!(f, "substring"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub field: FieldKind,
    pub locator: FieldLocator,
}

impl FieldSpec {
    pub fn new(field: FieldKind, locator: FieldLocator) -> Self {
        FieldSpec { field, locator }
    }
}

// ============================================================================
// RULE DEFINITION
// ============================================================================

/// Alternate prefix with an explicit number of characters to strip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixVariant {
    pub prefix: String,
    pub strip_length: usize,
    pub case_insensitive: bool,
}

/// Paper-type post-processing declared by a rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperTypeProcessing {
    /// Run the PaperTypeFormatter at all
    #[serde(default)]
    pub format: bool,

    /// Brand name stripped as a whole word
    #[serde(default)]
    pub remove_brand: Option<String>,

    /// Extraneous whole-word markers (e.g. "MK", "PK")
    #[serde(default)]
    pub remove_markers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDefinition {
    /// Unique rule name, reported as `matched_rule`
    pub name: String,

    /// Higher = evaluated earlier
    pub priority: i64,

    pub description: String,

    /// Required prefix; None means "always matches" (fallback rule)
    pub prefix: Option<String>,

    pub prefix_case_insensitive: bool,

    pub delimiter: String,

    /// Alternate prefixes tried in order; take precedence over `prefix`
    pub variants: Vec<PrefixVariant>,

    pub structure: Vec<FieldSpec>,

    /// Fixed canonical brand, bypasses alias lookup
    pub brand_value: Option<String>,

    pub paper_type_processing: PaperTypeProcessing,
}

impl RuleDefinition {
    /// Minimal rule; builder methods fill in the rest.
    pub fn new(name: impl Into<String>, priority: i64) -> Self {
        RuleDefinition {
            name: name.into(),
            priority,
            description: String::new(),
            prefix: None,
            prefix_case_insensitive: false,
            delimiter: " ".to_string(),
            variants: Vec::new(),
            structure: Vec::new(),
            brand_value: None,
            paper_type_processing: PaperTypeProcessing::default(),
        }
    }

    /// Builder: required prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>, case_insensitive: bool) -> Self {
        self.prefix = Some(prefix.into());
        self.prefix_case_insensitive = case_insensitive;
        self
    }

    /// Builder: alternate prefix with strip length
    pub fn with_variant(mut self, prefix: impl Into<String>, strip_length: usize, case_insensitive: bool) -> Self {
        self.variants.push(PrefixVariant {
            prefix: prefix.into(),
            strip_length,
            case_insensitive,
        });
        self
    }

    /// Builder: delimiter
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Builder: add a field
    pub fn with_field(mut self, field: FieldKind, locator: FieldLocator) -> Self {
        self.structure.push(FieldSpec::new(field, locator));
        self
    }

    /// Builder: fixed brand
    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand_value = Some(brand.into());
        self
    }

    /// Builder: paper-type processing
    pub fn with_processing(mut self, processing: PaperTypeProcessing) -> Self {
        self.paper_type_processing = processing;
        self
    }

    /// True for the prefix-less fallback rule.
    pub fn is_fallback(&self) -> bool {
        self.prefix.is_none() && self.variants.is_empty()
    }

    /// Test the prefix condition and return what remains after stripping.
    pub fn strip_prefix(&self, filename: &str) -> Option<String> {
        if !self.variants.is_empty() {
            return self
                .variants
                .iter()
                .find(|v| starts_with(filename, &v.prefix, v.case_insensitive))
                .map(|v| filename.chars().skip(v.strip_length).collect());
        }

        match &self.prefix {
            Some(prefix) => {
                if starts_with(filename, prefix, self.prefix_case_insensitive) {
                    Some(filename.chars().skip(prefix.chars().count()).collect())
                } else {
                    None
                }
            }
            None => Some(filename.to_string()),
        }
    }

    /// Build a rule from one raw configuration entry.
    pub fn from_value(index: usize, value: &Value) -> Result<Self, RuleError> {
        let raw: RawRule =
            serde_json::from_value(value.clone()).map_err(|source| RuleError::Shape { index, source })?;

        let name = match raw.name {
            Some(name) if !name.trim().is_empty() => name,
            _ => return Err(RuleError::MissingName { index }),
        };
        let priority = raw.priority.ok_or_else(|| RuleError::MissingPriority { name: name.clone() })?;

        if raw.delimiter.is_empty() {
            return Err(RuleError::EmptyDelimiter { name });
        }

        let mut variants = Vec::with_capacity(raw.variants.len());
        for (i, variant) in raw.variants.into_iter().enumerate() {
            let prefix = variant
                .prefix
                .filter(|p| !p.is_empty())
                .ok_or_else(|| RuleError::VariantWithoutPrefix { name: name.clone(), index: i })?;
            variants.push(PrefixVariant {
                strip_length: variant.prefix_length.unwrap_or_else(|| prefix.chars().count()),
                case_insensitive: variant.case_insensitive.unwrap_or(raw.prefix_case_insensitive),
                prefix,
            });
        }

        let mut structure = Vec::with_capacity(raw.structure.len());
        for spec in raw.structure {
            let field_name = spec.field.unwrap_or_default();
            let field = FieldKind::parse(&field_name).ok_or_else(|| RuleError::UnknownField {
                name: name.clone(),
                field: field_name.clone(),
            })?;

            let locator = if let Some(match_type) = spec.match_type {
                FieldLocator::parse_match_type(&match_type).ok_or_else(|| RuleError::UnknownMatchType {
                    name: name.clone(),
                    value: match_type.clone(),
                })?
            } else if let Some(position) = spec.position {
                FieldLocator::parse_position(&position).ok_or_else(|| RuleError::UnknownPosition {
                    name: name.clone(),
                    value: position.to_string(),
                })?
            } else {
                return Err(RuleError::MissingLocator { name, field: field_name });
            };

            structure.push(FieldSpec { field, locator });
        }

        Ok(RuleDefinition {
            name,
            priority,
            description: raw.description,
            prefix: raw.prefix,
            prefix_case_insensitive: raw.prefix_case_insensitive,
            delimiter: raw.delimiter,
            variants,
            structure,
            brand_value: raw.brand_value,
            paper_type_processing: raw.paper_type_processing,
        })
    }
}

fn starts_with(text: &str, prefix: &str, case_insensitive: bool) -> bool {
    if case_insensitive {
        let mut folded = text.chars().flat_map(char::to_lowercase);
        prefix
            .chars()
            .flat_map(char::to_lowercase)
            .all(|p| folded.next() == Some(p))
    } else {
        text.starts_with(prefix)
    }
}

// ============================================================================
// RAW CONFIGURATION SHAPE
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawRule {
    name: Option<String>,
    priority: Option<i64>,
    #[serde(default)]
    description: String,
    prefix: Option<String>,
    #[serde(default)]
    prefix_case_insensitive: bool,
    #[serde(default = "default_delimiter")]
    delimiter: String,
    #[serde(default)]
    variants: Vec<RawVariant>,
    #[serde(default)]
    structure: Vec<RawFieldSpec>,
    brand_value: Option<String>,
    #[serde(default)]
    paper_type_processing: PaperTypeProcessing,
}

fn default_delimiter() -> String {
    " ".to_string()
}

#[derive(Debug, Deserialize)]
struct RawVariant {
    prefix: Option<String>,
    prefix_length: Option<usize>,
    case_insensitive: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RawFieldSpec {
    field: Option<String>,
    position: Option<Value>,
    match_type: Option<String>,
}

// ============================================================================
// PATTERN CATALOG
// ============================================================================

/// A rule selected for a filename, with its prefix already stripped.
#[derive(Debug, Clone)]
pub struct RuleMatch<'a> {
    pub rule: &'a RuleDefinition,
    pub remainder: String,
}

/// Ordered, read-only rule collection.
#[derive(Debug, Clone, Default)]
pub struct PatternCatalog {
    /// Sorted by (priority desc, definition order asc)
    rules: Vec<RuleDefinition>,
}

impl PatternCatalog {
    /// Create catalog from rules in definition order.
    pub fn new(mut rules: Vec<RuleDefinition>) -> Self {
        // Stable sort keeps definition order among equal priorities
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        PatternCatalog { rules }
    }

    /// Build from raw configuration entries, rejecting malformed ones.
    ///
    /// Returns the catalog together with every rejection, each already logged.
    pub fn from_values(values: &[Value]) -> (Self, Vec<RuleError>) {
        let mut rules = Vec::new();
        let mut rejected = Vec::new();
        let mut seen = HashSet::new();

        for (index, value) in values.iter().enumerate() {
            match RuleDefinition::from_value(index, value) {
                Ok(rule) if !seen.insert(rule.name.clone()) => {
                    rejected.push(RuleError::DuplicateName { name: rule.name });
                }
                Ok(rule) => rules.push(rule),
                Err(e) => rejected.push(e),
            }
        }

        for e in &rejected {
            warn!("rejected filename pattern: {}", e);
        }
        info!(loaded = rules.len(), rejected = rejected.len(), "filename patterns loaded");

        (PatternCatalog::new(rules), rejected)
    }

    /// Select the highest-priority rule whose prefix condition holds.
    ///
    /// Evaluation stops at the first hit; lower rules are never consulted.
    pub fn match_rule(&self, filename: &str) -> Option<RuleMatch<'_>> {
        self.rules.iter().find_map(|rule| {
            rule.strip_prefix(filename)
                .map(|remainder| RuleMatch { rule, remainder })
        })
    }

    /// Rules in evaluation order
    pub fn rules(&self) -> &[RuleDefinition] {
        &self.rules
    }

    pub fn get(&self, name: &str) -> Option<&RuleDefinition> {
        self.rules.iter().find(|r| r.name == name)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================
