// 🗂️ profile-sorter CLI
// Thin shell over the library: parse args, wire collaborators, print results

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use profile_sorter::{
    file_document, write_csv, BatchSummary, ClassificationResult, ClassificationStatus, Classifier,
    DocumentFiling, JsonPreferenceStore, MultiPrinterResolver, OutputNamer, RuleConfig,
    TerminalPrompter, DEFAULT_PREFERENCES_FILE, VERSION,
};

#[derive(Parser)]
#[command(
    name = "profile-sorter",
    version,
    about = "Classify ICC/EMY2 color profile filenames into printer, brand and paper type"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// User configuration (JSON); its top-level keys replace the defaults
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Classify filenames given as arguments or one per line on stdin
    Classify {
        #[arg(value_name = "NAMES")]
        names: Vec<String>,

        /// Printer preference file for multi-printer profiles
        #[arg(long, value_name = "FILE", default_value = DEFAULT_PREFERENCES_FILE)]
        preferences: PathBuf,

        /// Ask which printer a multi-printer profile belongs to (prompts go to stderr)
        #[arg(long)]
        interactive: bool,

        /// Write results as CSV to stdout
        #[arg(long)]
        csv: bool,

        /// Print batch statistics after the results
        #[arg(long)]
        summary: bool,
    },

    /// List filename rules in evaluation order
    Rules,

    /// Decide the printer folder for a companion document (PDF)
    Document {
        path: PathBuf,

        /// Name of an already filed document with identical content
        #[arg(long, value_name = "NAME")]
        duplicate_of: Option<String>,

        /// Printer preference file for multi-printer names
        #[arg(long, value_name = "FILE", default_value = DEFAULT_PREFERENCES_FILE)]
        preferences: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = RuleConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let engine = config.build_engine().context("Failed to build rule engine")?;

    match cli.command {
        Command::Classify {
            names,
            preferences,
            interactive,
            csv,
            summary,
        } => {
            let names = if names.is_empty() {
                if interactive {
                    bail!("--interactive needs filenames as arguments; stdin is used for answers");
                }
                read_stdin_names()?
            } else {
                names
            };

            let store = JsonPreferenceStore::open(&preferences);
            let resolver = if interactive {
                MultiPrinterResolver::interactive(store, TerminalPrompter::stdio())
            } else {
                MultiPrinterResolver::non_interactive(store)
            };
            let mut classifier = Classifier::new(engine, resolver);
            let results = classifier.classify_batch(&names);

            if csv {
                write_csv(io::stdout().lock(), &results)?;
            } else {
                print_results(&results);
            }
            if summary {
                print_summary(&BatchSummary::from_results(&results));
            }
        }
        Command::Rules => {
            println!("📚 profile-sorter {} - {} rules", VERSION, engine.rule_count());
            for rule in engine.catalog().rules() {
                let prefix = match (&rule.prefix, rule.variants.is_empty()) {
                    (_, false) => rule
                        .variants
                        .iter()
                        .map(|v| format!("{:?}", v.prefix))
                        .collect::<Vec<_>>()
                        .join(" | "),
                    (Some(prefix), true) => format!("{:?}", prefix),
                    (None, true) => "(any)".to_string(),
                };
                println!("  [{:>4}] {:<28} {}  {}", rule.priority, rule.name, prefix, rule.description);
            }
        }
        Command::Document {
            path,
            duplicate_of,
            preferences,
        } => {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .with_context(|| format!("Not a file path: {:?}", path))?;
            let ancestors = ancestor_names(&path);
            let resolver = MultiPrinterResolver::non_interactive(JsonPreferenceStore::open(&preferences));
            let mut classifier = Classifier::new(engine, resolver);
            match file_document(&mut classifier, &name, &ancestors, duplicate_of.as_deref()) {
                DocumentFiling::Duplicate { of } => println!("♻️  {} duplicates {}", name, of),
                DocumentFiling::Printer { printer, source } => {
                    println!("📎 {} → {} ({:?})", name, printer, source)
                }
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn read_stdin_names() -> Result<Vec<String>> {
    let mut names = Vec::new();
    for line in io::stdin().lock().lines() {
        let line = line.context("Failed to read filenames from stdin")?;
        let line = line.trim();
        if !line.is_empty() {
            names.push(line.to_string());
        }
    }
    Ok(names)
}

/// Directory names from nearest to farthest.
fn ancestor_names(path: &Path) -> Vec<String> {
    path.ancestors()
        .skip(1)
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect()
}

fn print_results(results: &[ClassificationResult]) {
    let mut namer = OutputNamer::new();
    for result in results {
        match result.status {
            ClassificationStatus::Matched => println!("✅ {} → {}", result.filename, namer.name_for(result)),
            ClassificationStatus::PendingDisambiguation => println!(
                "⏳ {} → combo {} ({})",
                result.filename,
                result.combo_key.as_ref().map(|k| k.as_str()).unwrap_or_default(),
                result.candidates.join(" / ")
            ),
            ClassificationStatus::Unmatched => println!("❓ {} → no rule matched", result.filename),
        }
    }
}

fn print_summary(summary: &BatchSummary) {
    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("📊 {}", summary.summary());

    for (printer, brands) in &summary.by_printer {
        println!("\n🖨️  {}", printer);
        for (brand, count) in brands {
            println!("   {:<24} {}", brand, count);
        }
    }

    if !summary.pending_combos.is_empty() {
        println!("\n⏳ Undecided printer combos (rerun with --interactive):");
        for (combo, count) in &summary.pending_combos {
            println!("   {:<24} {} profiles", combo, count);
        }
    }

    if !summary.unmatched_groups.is_empty() {
        println!("\n❓ Unmatched, grouped by leading token:");
        for (token, files) in &summary.unmatched_groups {
            println!("   {:<24} {} files", token, files.len());
        }
    }
    println!("\nGenerated at {}", summary.generated_at.format("%Y-%m-%d %H:%M:%S UTC"));
}
