// 📎 Companion Documents - PDFs filed next to the profiles they describe
// Printer from the filename, then from the enclosing directories

use crate::aliases::UNKNOWN;
use crate::normalize::PrinterResolution;
use crate::rules::Classifier;
use serde::Serialize;
use tracing::debug;

/// Folder used when no printer can be found for a document.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Where a document's printer came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PrinterSource {
    Filename,
    /// Ancestor directory name that named the printer
    Directory(String),
    Nowhere,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DocumentFiling {
    /// Same content as a document already filed
    Duplicate { of: String },
    Printer { printer: String, source: PrinterSource },
}

impl DocumentFiling {
    /// Printer folder, or None for duplicates
    pub fn printer(&self) -> Option<&str> {
        match self {
            DocumentFiling::Printer { printer, .. } => Some(printer),
            DocumentFiling::Duplicate { .. } => None,
        }
    }
}

/// Decide where a companion document belongs.
///
/// The filename is classified like a profile, so combos are settled through
/// the classifier's resolver and its stored preferences. `ancestors` are
/// directory names, nearest first. `duplicate_of` is the caller's
/// content-digest verdict; it wins over everything else.
pub fn file_document<S: AsRef<str>>(
    classifier: &mut Classifier,
    name: &str,
    ancestors: &[S],
    duplicate_of: Option<&str>,
) -> DocumentFiling {
    if let Some(original) = duplicate_of {
        debug!(document = %name, of = %original, "duplicate document");
        return DocumentFiling::Duplicate {
            of: original.to_string(),
        };
    }

    let result = classifier.classify(name);
    if result.is_matched() && result.printer != UNKNOWN {
        return DocumentFiling::Printer {
            printer: result.printer,
            source: PrinterSource::Filename,
        };
    }

    for dir in ancestors {
        let dir = dir.as_ref();
        if let Some(printer) = printer_named_by(classifier, dir) {
            debug!(document = %name, dir = %dir, printer = %printer, "printer taken from directory");
            return DocumentFiling::Printer {
                printer,
                source: PrinterSource::Directory(dir.to_string()),
            };
        }
    }

    DocumentFiling::Printer {
        printer: UNCATEGORIZED.to_string(),
        source: PrinterSource::Nowhere,
    }
}

/// Printer a directory name denotes, settling combos like filenames.
fn printer_named_by(classifier: &mut Classifier, dir: &str) -> Option<String> {
    match classifier.engine().normalizer().resolve_printer(dir) {
        PrinterResolution::Resolved(printer) => Some(printer),
        PrinterResolution::Combo { key, candidates } => classifier
            .resolver_mut()
            .resolve(&key, &candidates)
            .printer()
            .map(str::to_string),
        PrinterResolution::Unknown => None,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::MemoryPreferenceStore;
    use crate::resolver::MultiPrinterResolver;
    use crate::rules::RuleEngine;

    fn classifier_with(store: MemoryPreferenceStore) -> Classifier {
        Classifier::new(RuleEngine::with_defaults(), MultiPrinterResolver::non_interactive(store))
    }

    fn classifier() -> Classifier {
        classifier_with(MemoryPreferenceStore::new())
    }

    #[test]
    fn test_duplicate_wins() {
        let filing = file_document(&mut classifier(), "P900 Guide.pdf", &["Epson P900"], Some("P900 Guide (1).pdf"));
        assert_eq!(
            filing,
            DocumentFiling::Duplicate {
                of: "P900 Guide (1).pdf".to_string()
            }
        );
        assert_eq!(filing.printer(), None);
    }

    #[test]
    fn test_printer_from_filename_is_remapped() {
        let filing = file_document::<&str>(&mut classifier(), "SC-P700 profiling notes.PDF", &[], None);
        assert_eq!(
            filing,
            DocumentFiling::Printer {
                printer: "Epson P900".to_string(),
                source: PrinterSource::Filename
            }
        );
    }

    #[test]
    fn test_combo_filename_uses_stored_preference() {
        let store = MemoryPreferenceStore::new().with_entry("P7570-P9570", "Epson P7570");
        let filing = file_document::<&str>(&mut classifier_with(store), "MOAB Lasal P7570-P9570 guide.pdf", &[], None);
        assert_eq!(
            filing,
            DocumentFiling::Printer {
                printer: "Epson P7570".to_string(),
                source: PrinterSource::Filename
            }
        );
    }

    #[test]
    fn test_undecided_combo_falls_back_to_directory() {
        let filing = file_document(&mut classifier(), "MOAB Lasal P7570-P9570 guide.pdf", &["Epson P9570"], None);
        assert_eq!(
            filing,
            DocumentFiling::Printer {
                printer: "Epson P9570".to_string(),
                source: PrinterSource::Directory("Epson P9570".to_string())
            }
        );
    }

    #[test]
    fn test_printer_from_nearest_matching_directory() {
        let filing = file_document(
            &mut classifier(),
            "Instructions.pdf",
            &["Docs", "Canon iPF8400 profiles", "P900"],
            None,
        );
        assert_eq!(
            filing,
            DocumentFiling::Printer {
                printer: "Canon iPF6450".to_string(),
                source: PrinterSource::Directory("Canon iPF8400 profiles".to_string())
            }
        );
    }

    #[test]
    fn test_uncategorized() {
        let filing = file_document(&mut classifier(), "Readme.pdf", &["Downloads"], None);
        assert_eq!(filing.printer(), Some(UNCATEGORIZED));
    }
}
