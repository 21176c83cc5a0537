// 📄 Paper Type Formatter
// "HahnemuehlePhotoRag308" → "Photo Rag 308"

use crate::catalog::PaperTypeProcessing;

/// Turns a raw paper-type token sequence into a clean, title-cased string.
///
/// Idempotent: formatting an already formatted string returns it unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaperTypeFormatter {
    /// Words of the brand to strip, lowercased
    brand_words: Vec<String>,
    /// Whole-word markers to strip, lowercased
    markers: Vec<String>,
}

impl PaperTypeFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Formatter configured by a rule's `paper_type_processing`.
    pub fn from_processing(processing: &PaperTypeProcessing) -> Self {
        let mut formatter = PaperTypeFormatter::new();
        if let Some(brand) = &processing.remove_brand {
            formatter = formatter.removing_brand(brand);
        }
        formatter.removing_markers(&processing.remove_markers)
    }

    /// Builder: strip a brand name wherever it appears as whole words
    pub fn removing_brand(mut self, brand: &str) -> Self {
        self.brand_words = words_lower(brand);
        self
    }

    /// Builder: strip extraneous markers such as "MK"/"PK"
    pub fn removing_markers<S: AsRef<str>>(mut self, markers: &[S]) -> Self {
        self.markers.extend(
            markers
                .iter()
                .map(|m| m.as_ref().trim().to_lowercase())
                .filter(|m| !m.is_empty()),
        );
        self
    }

    pub fn format(&self, raw: &str) -> String {
        let spaced = raw.replace(['+', '_'], " ");
        let segmented = segment(&spaced);
        let mut words: Vec<&str> = segmented.split_whitespace().collect();

        loop {
            let before = words.len();
            if !self.brand_words.is_empty() {
                remove_sequence(&mut words, &self.brand_words);
            }
            words.retain(|w| !self.markers.iter().any(|m| w.to_lowercase() == *m));
            if words.len() == before {
                break;
            }
        }

        words.into_iter().map(title_case).collect::<Vec<_>>().join(" ")
    }
}

/// Format with an optional brand to remove.
pub fn format_paper_type(raw: &str, remove_brand: Option<&str>) -> String {
    let formatter = match remove_brand {
        Some(brand) => PaperTypeFormatter::new().removing_brand(brand),
        None => PaperTypeFormatter::new(),
    };
    formatter.format(raw)
}

/// Insert spaces at lower/digit → upper and lower → digit boundaries.
/// Uppercase runs ("MOAB", "P900") are left joined.
fn segment(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut prev: Option<char> = None;
    for c in text.chars() {
        if let Some(p) = prev {
            let camel = (p.is_lowercase() || p.is_ascii_digit()) && c.is_uppercase();
            let number = p.is_lowercase() && c.is_ascii_digit();
            if camel || number {
                out.push(' ');
            }
        }
        out.push(c);
        prev = Some(c);
    }
    out
}

fn words_lower(text: &str) -> Vec<String> {
    segment(&text.replace(['+', '_'], " "))
        .split_whitespace()
        .map(str::to_lowercase)
        .collect()
}

fn remove_sequence(words: &mut Vec<&str>, sequence: &[String]) {
    let n = sequence.len();
    let mut i = 0;
    while i + n <= words.len() {
        let hit = words[i..i + n]
            .iter()
            .zip(sequence)
            .all(|(w, s)| w.to_lowercase() == *s);
        if hit {
            words.drain(i..i + n);
        } else {
            i += 1;
        }
    }
}

/// Uppercase the first letter; words carrying digits stay verbatim.
fn title_case(word: &str) -> String {
    if word.chars().any(|c| c.is_ascii_digit()) {
        return word.to_string();
    }
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_case_and_numbers() {
        assert_eq!(format_paper_type("PhotoRag308", None), "Photo Rag 308");
        assert_eq!(format_paper_type("baryta2 310", None), "Baryta 2 310");
        assert_eq!(format_paper_type("aqua310", None), "Aqua 310");
        assert_eq!(format_paper_type("308Gloss", None), "308 Gloss");
    }

    #[test]
    fn test_acronyms_and_models_kept() {
        assert_eq!(format_paper_type("MOAB Lasal", None), "MOAB Lasal");
        assert_eq!(format_paper_type("for P900", None), "For P900");
    }

    #[test]
    fn test_delimiters_and_whitespace() {
        assert_eq!(format_paper_type("  Platine_Fibre+Rag  ", None), "Platine Fibre Rag");
        assert_eq!(format_paper_type("", None), "");
        assert_eq!(format_paper_type(" _ + ", None), "");
    }

    #[test]
    fn test_brand_removed_as_whole_word() {
        assert_eq!(format_paper_type("HahnemuehlePhotoRag308", Some("Hahnemuehle")), "Photo Rag 308");
        assert_eq!(format_paper_type("hahnemuehle Baryta", Some("Hahnemuehle")), "Baryta");
        // Not a whole word: kept
        assert_eq!(format_paper_type("Epic Matte", Some("Ep")), "Epic Matte");
        assert_eq!(format_paper_type("Ultra Pro Satin Ep", Some("Ep")), "Ultra Pro Satin");
    }

    #[test]
    fn test_multiword_brand_and_markers() {
        let formatter = PaperTypeFormatter::new()
            .removing_brand("Red River")
            .removing_markers(&["MK", "PK"]);
        assert_eq!(formatter.format("Red MK River Polar Matte"), "Polar Matte");
        assert_eq!(formatter.format("Arctic_pk_Polar"), "Arctic Polar");
    }

    #[test]
    fn test_from_processing() {
        let processing = PaperTypeProcessing {
            format: true,
            remove_brand: Some("Hahnemuehle".to_string()),
            remove_markers: vec!["MK".to_string()],
        };
        let formatter = PaperTypeFormatter::from_processing(&processing);
        assert_eq!(formatter.format("MK_HahnemuehleFineArtBaryta"), "Fine Art Baryta");
    }

    #[test]
    fn test_idempotent_on_samples() {
        for raw in ["PhotoRag308", "baryta2 310", "aBC dEF", "p900x", "HFAPhoto_Metallic", "Lasal Gloss+Matte"] {
            let once = format_paper_type(raw, None);
            assert_eq!(format_paper_type(&once, None), once, "input {:?}", raw);
        }
    }
}
