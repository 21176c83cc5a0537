// Profile Sorter - Core Library
// Classification engine for color-profile filenames, used by the CLI and tests

pub mod error;
pub mod aliases;      // AliasTable, RemappingTable
pub mod catalog;      // Rules as data: RuleDefinition, PatternCatalog
pub mod extract;      // FieldExtractor strategy table
pub mod normalize;    // Raw tokens → canonical names
pub mod paper;        // PaperTypeFormatter
pub mod preferences;  // Durable combo → printer answers
pub mod resolver;     // Multi-printer disambiguation
pub mod prompt;       // Terminal prompter
pub mod rules;        // RuleEngine, Classifier, ClassificationResult
pub mod config;       // Embedded defaults + user overrides
pub mod documents;    // Companion PDF filing
pub mod report;       // Batch summary + CSV export

// Re-export commonly used types
pub use error::{ConfigError, PreferenceError, RuleError};
pub use aliases::{AliasHit, AliasTable, RemappingTable, UNKNOWN};
pub use catalog::{
    FieldKind, FieldLocator, FieldSpec, PaperTypeProcessing, PatternCatalog,
    PrefixVariant, RuleDefinition, RuleMatch,
};
pub use extract::{extract_fields, ExtractedFields};
pub use normalize::{BrandInput, Normalizer, PrinterResolution};
pub use paper::{format_paper_type, PaperTypeFormatter};
pub use preferences::{
    JsonPreferenceStore, MemoryPreferenceStore, PreferenceStore, DEFAULT_PREFERENCES_FILE,
};
pub use resolver::{
    ComboKey, ComboState, DeferPrompter, MultiPrinterResolver, Prompter, Resolution,
    ResolutionSource,
};
pub use prompt::TerminalPrompter;
pub use rules::{
    preprocess_filename, ClassificationResult, ClassificationStatus, Classifier, OutputNamer,
    RuleEngine,
};
pub use config::{AliasList, RuleConfig, DEFAULT_CONFIG};
pub use documents::{file_document, DocumentFiling, PrinterSource, UNCATEGORIZED};
pub use report::{leading_token, write_csv, BatchSummary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
