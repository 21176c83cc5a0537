// ✂️ Field Extraction - pull raw tokens out of a delimited filename
// One pure function per FieldLocator; absence is an empty field, never an error

use crate::aliases::AliasTable;
use crate::catalog::{FieldKind, FieldLocator, RuleDefinition};

// ============================================================================
// EXTRACTION CONTEXT
// ============================================================================

/// Everything a strategy may look at for one filename.
#[derive(Debug)]
pub struct ExtractionContext<'a> {
    /// Whole preprocessed filename, prefix included (for `substring`)
    pub raw: &'a str,

    /// Remainder after prefix stripping, and its parts split on the delimiter
    pub remainder: &'a str,
    pub parts: Vec<&'a str>,
    delimiter: &'a str,

    pub printers: &'a AliasTable,
    pub brands: &'a AliasTable,

    /// Index of the part holding the printer token, if any
    printer_index: Option<usize>,

    /// The rule finds its printer anywhere in the name, not by part
    printer_by_substring: bool,
}

impl<'a> ExtractionContext<'a> {
    pub fn new(
        raw: &'a str,
        remainder: &'a str,
        delimiter: &'a str,
        printers: &'a AliasTable,
        brands: &'a AliasTable,
    ) -> Self {
        let parts: Vec<&str> = remainder.split(delimiter).collect();
        let printer_index = key_search_index(&parts, printers);
        ExtractionContext {
            raw,
            remainder,
            parts,
            delimiter,
            printers,
            brands,
            printer_index,
            printer_by_substring: false,
        }
    }

    /// Builder: mark the printer as located by `substring`
    pub fn with_substring_printer(mut self, by_substring: bool) -> Self {
        self.printer_by_substring = by_substring;
        self
    }

    /// Part index located by `key_search` over printer aliases.
    pub fn printer_index(&self) -> Option<usize> {
        self.printer_index
    }

    fn table_for(&self, field: FieldKind) -> &'a AliasTable {
        match field {
            FieldKind::Brand => self.brands,
            _ => self.printers,
        }
    }

    fn join(&self, parts: impl IntoIterator<Item = &'a str>) -> String {
        parts.into_iter().collect::<Vec<_>>().join(" ")
    }
}

fn key_search_index(parts: &[&str], table: &AliasTable) -> Option<usize> {
    parts.iter().position(|part| !part.is_empty() && table.occurs_in(part))
}

// ============================================================================
// STRATEGY TABLE
// ============================================================================

type Strategy = fn(&ExtractionContext<'_>, FieldKind, FieldLocator) -> Option<String>;

/// Strategy registered for each locator.
fn strategy_for(locator: FieldLocator) -> Strategy {
    match locator {
        FieldLocator::Index(_) => by_index,
        FieldLocator::From(_) => by_range,
        FieldLocator::BeforePrinter => before_printer,
        FieldLocator::AfterPrinter => after_printer,
        FieldLocator::Remaining => remaining,
        FieldLocator::KeySearch => key_search,
        FieldLocator::Substring => substring,
    }
}

fn by_index(ctx: &ExtractionContext<'_>, _: FieldKind, locator: FieldLocator) -> Option<String> {
    let FieldLocator::Index(i) = locator else { return None };
    ctx.parts.get(i).map(|p| p.to_string())
}

fn by_range(ctx: &ExtractionContext<'_>, _: FieldKind, locator: FieldLocator) -> Option<String> {
    let FieldLocator::From(start) = locator else { return None };
    ctx.parts.get(start..).map(|rest| ctx.join(rest.iter().copied()))
}

fn before_printer(ctx: &ExtractionContext<'_>, _: FieldKind, _: FieldLocator) -> Option<String> {
    ctx.printer_index.map(|i| ctx.join(ctx.parts[..i].iter().copied()))
}

fn after_printer(ctx: &ExtractionContext<'_>, _: FieldKind, _: FieldLocator) -> Option<String> {
    ctx.printer_index.map(|i| ctx.join(ctx.parts[i + 1..].iter().copied()))
}

fn remaining(ctx: &ExtractionContext<'_>, _: FieldKind, _: FieldLocator) -> Option<String> {
    if ctx.printer_by_substring {
        return without_printer_aliases(ctx);
    }
    let skip = ctx.printer_index?;
    Some(ctx.join(
        ctx.parts
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != skip)
            .map(|(_, p)| *p),
    ))
}

/// The remainder with every printer alias span cut out, delimiters turned
/// into spaces. None when no alias occurs.
fn without_printer_aliases(ctx: &ExtractionContext<'_>) -> Option<String> {
    let spans = ctx.printers.spans_in(ctx.remainder);
    if spans.is_empty() {
        return None;
    }

    let mut kept = String::with_capacity(ctx.remainder.len());
    let mut cursor = 0;
    for span in spans {
        kept.push_str(&ctx.remainder[cursor..span.start]);
        kept.push(' ');
        cursor = span.end;
    }
    kept.push_str(&ctx.remainder[cursor..]);

    if !ctx.delimiter.is_empty() {
        kept = kept.replace(ctx.delimiter, " ");
    }
    Some(kept.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn key_search(ctx: &ExtractionContext<'_>, field: FieldKind, _: FieldLocator) -> Option<String> {
    let index = match field {
        FieldKind::Printer => ctx.printer_index,
        other => key_search_index(&ctx.parts, ctx.table_for(other)),
    };
    index.map(|i| ctx.parts[i].to_string())
}

fn substring(ctx: &ExtractionContext<'_>, field: FieldKind, _: FieldLocator) -> Option<String> {
    // The whole name is the token; the normalizer decodes every alias in it
    ctx.table_for(field)
        .occurs_in(ctx.raw)
        .then(|| ctx.raw.to_string())
}

// ============================================================================
// EXTRACTED FIELDS
// ============================================================================

/// Raw (un-normalized) field values for one filename.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFields {
    pub printer: Option<String>,
    pub brand: Option<String>,
    pub paper_type: Option<String>,
    pub code: Option<String>,
}

impl ExtractedFields {
    fn slot(&mut self, field: FieldKind) -> &mut Option<String> {
        match field {
            FieldKind::Printer => &mut self.printer,
            FieldKind::Brand => &mut self.brand,
            FieldKind::PaperType => &mut self.paper_type,
            FieldKind::Code => &mut self.code,
        }
    }
}

/// Run every FieldSpec of `rule` against the filename.
///
/// When a rule lists the same field more than once, the first spec that
/// yields a non-empty value wins.
pub fn extract_fields(
    rule: &RuleDefinition,
    raw: &str,
    remainder: &str,
    printers: &AliasTable,
    brands: &AliasTable,
) -> ExtractedFields {
    let by_substring = rule
        .structure
        .iter()
        .find(|spec| spec.field == FieldKind::Printer)
        .is_some_and(|spec| spec.locator == FieldLocator::Substring);
    let ctx = ExtractionContext::new(raw, remainder, &rule.delimiter, printers, brands)
        .with_substring_printer(by_substring);
    let mut fields = ExtractedFields::default();

    for spec in &rule.structure {
        let slot = fields.slot(spec.field);
        if slot.is_some() {
            continue;
        }
        let value = strategy_for(spec.locator)(&ctx, spec.field, spec.locator)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        *slot = value;
    }

    fields
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn printers() -> AliasTable {
        AliasTable::new(vec![
            ("Canon Pixma PRO-100", vec!["PRO-100", "pro100"]),
            ("Epson P7570", vec!["P7570"]),
            ("Epson P9570", vec!["P9570"]),
        ])
    }

    fn brands() -> AliasTable {
        AliasTable::new(vec![("Canson", vec!["cifa"]), ("MOAB", vec!["Moab"])])
    }

    #[test]
    fn test_positions_around_printer() {
        let p = printers();
        let b = brands();
        let rule = RuleDefinition::new("moab", 100)
            .with_field(FieldKind::PaperType, FieldLocator::BeforePrinter)
            .with_field(FieldKind::Printer, FieldLocator::KeySearch)
            .with_field(FieldKind::Code, FieldLocator::AfterPrinter);

        let raw = "MOAB Anasazi Canvas PRO-100 MPP";
        let fields = extract_fields(&rule, raw, "Anasazi Canvas PRO-100 MPP", &p, &b);
        assert_eq!(fields.printer.as_deref(), Some("PRO-100"));
        assert_eq!(fields.paper_type.as_deref(), Some("Anasazi Canvas"));
        assert_eq!(fields.code.as_deref(), Some("MPP"));
        assert_eq!(fields.brand, None);
    }

    #[test]
    fn test_index_and_open_range() {
        let p = printers();
        let b = brands();
        let rule = RuleDefinition::new("cifa", 80)
            .with_delimiter("_")
            .with_field(FieldKind::Printer, FieldLocator::Index(0))
            .with_field(FieldKind::PaperType, FieldLocator::From(1))
            .with_field(FieldKind::Code, FieldLocator::Index(9));

        let fields = extract_fields(&rule, "cifa_pro100_baryta2_310", "pro100_baryta2_310", &p, &b);
        assert_eq!(fields.printer.as_deref(), Some("pro100"));
        assert_eq!(fields.paper_type.as_deref(), Some("baryta2 310"));
        assert_eq!(fields.code, None);
    }

    #[test]
    fn test_key_search_without_printer_leaves_fields_empty() {
        let p = printers();
        let b = brands();
        let rule = RuleDefinition::new("moab", 100)
            .with_field(FieldKind::PaperType, FieldLocator::BeforePrinter)
            .with_field(FieldKind::Printer, FieldLocator::KeySearch)
            .with_field(FieldKind::Code, FieldLocator::Remaining);

        let fields = extract_fields(&rule, "MOAB Lasal Gloss", "Lasal Gloss", &p, &b);
        assert_eq!(fields, ExtractedFields::default());
    }

    #[test]
    fn test_remaining_skips_printer_part() {
        let p = printers();
        let b = brands();
        let rule = RuleDefinition::new("loose", 10)
            .with_field(FieldKind::Printer, FieldLocator::KeySearch)
            .with_field(FieldKind::PaperType, FieldLocator::Remaining);

        let raw = "Velvet Rag xPRO-100 v2";
        let fields = extract_fields(&rule, raw, raw, &p, &b);
        assert_eq!(fields.printer.as_deref(), Some("xPRO-100"));
        assert_eq!(fields.paper_type.as_deref(), Some("Velvet Rag v2"));
    }

    #[test]
    fn test_remaining_cuts_substring_printer_alias() {
        let p = AliasTable::new(vec![
            ("Epson P900", vec!["P900", "SC-P900"]),
            ("Epson P7570", vec!["P7570", "Epson SureColor P7570"]),
        ]);
        let b = brands();
        let rule = RuleDefinition::new("fallback", 10)
            .with_field(FieldKind::Printer, FieldLocator::Substring)
            .with_field(FieldKind::PaperType, FieldLocator::Remaining);

        let raw = "Velvet_Rag_P900";
        let fields = extract_fields(&rule, raw, raw, &p, &b);
        assert_eq!(fields.printer.as_deref(), Some(raw));
        assert_eq!(fields.paper_type.as_deref(), Some("Velvet_Rag_"));

        let raw = "Epson SureColor P7570 Velvet";
        let fields = extract_fields(&rule, raw, raw, &p, &b);
        assert_eq!(fields.paper_type.as_deref(), Some("Velvet"));

        let raw = "Velvet Rag P7570 v2";
        let fields = extract_fields(&rule, raw, raw, &p, &b);
        assert_eq!(fields.paper_type.as_deref(), Some("Velvet Rag v2"));
    }

    #[test]
    fn test_first_non_empty_spec_wins() {
        let p = printers();
        let b = brands();
        let rule = RuleDefinition::new("mixed", 10)
            .with_field(FieldKind::Printer, FieldLocator::Index(0))
            .with_field(FieldKind::Printer, FieldLocator::KeySearch);

        let fields = extract_fields(&rule, " P9570", " P9570", &p, &b);
        assert_eq!(fields.printer.as_deref(), Some("P9570"));
    }

    #[test]
    fn test_brand_key_search_uses_brand_aliases() {
        let p = printers();
        let b = brands();
        let rule = RuleDefinition::new("loose", 10).with_field(FieldKind::Brand, FieldLocator::KeySearch);
        let fields = extract_fields(&rule, "Baryta moab P7570", "Baryta moab P7570", &p, &b);
        assert_eq!(fields.brand.as_deref(), Some("moab"));
    }
}
