// 🔀 Multi-Printer Resolver - one profile, several printers
// "P7570-P9570" → ask once, remember forever

use crate::preferences::PreferenceStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, warn};

// ============================================================================
// COMBO KEY
// ============================================================================

/// Canonical identifier for a set of printer models named by one filename.
///
/// Sorted, deduplicated, uppercased model tokens joined with "-", so the same
/// set always yields the same key whatever order the filename used.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComboKey(String);

impl ComboKey {
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tokens: Vec<String> = tokens
            .into_iter()
            .map(|t| t.as_ref().trim().to_uppercase())
            .filter(|t| !t.is_empty())
            .collect();
        tokens.sort();
        tokens.dedup();
        ComboKey(tokens.join("-"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComboKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// PROMPTER
// ============================================================================

/// Injected collaborator that asks a human to pick a printer.
///
/// Returning None means "skip for now"; the combo stays undecided.
pub trait Prompter {
    fn choose(&mut self, combo_key: &ComboKey, candidates: &[String]) -> Option<String>;
}

/// Prompter that never resolves anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeferPrompter;

impl Prompter for DeferPrompter {
    fn choose(&mut self, _combo_key: &ComboKey, _candidates: &[String]) -> Option<String> {
        None
    }
}

// ============================================================================
// STATE
// ============================================================================

/// Per-run state of a combo key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComboState {
    /// Seen, not in the store, and nobody to ask
    Unresolved,
    /// Waiting on the prompter
    PendingPrompt,
    Resolved(String),
    /// The prompter skipped it; not asked again this run
    Deferred,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    /// Answered earlier in this run
    Session,
    /// Found in the preference store
    Stored,
    /// Just answered by the prompter
    Prompted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved { printer: String, source: ResolutionSource },
    /// No answer; the file is PendingDisambiguation
    Pending,
}

impl Resolution {
    pub fn printer(&self) -> Option<&str> {
        match self {
            Resolution::Resolved { printer, .. } => Some(printer),
            Resolution::Pending => None,
        }
    }
}

// ============================================================================
// RESOLVER
// ============================================================================

/// Stateful combo resolution: session cache → preference store → prompter.
///
/// Not reentrant; one resolver serves one sequential disambiguation pass.
pub struct MultiPrinterResolver {
    store: Box<dyn PreferenceStore>,
    prompter: Option<Box<dyn Prompter>>,
    session: HashMap<ComboKey, ComboState>,
}

impl MultiPrinterResolver {
    pub fn new(store: Box<dyn PreferenceStore>, prompter: Option<Box<dyn Prompter>>) -> Self {
        MultiPrinterResolver {
            store,
            prompter,
            session: HashMap::new(),
        }
    }

    /// Resolver that only consults the store and never prompts.
    pub fn non_interactive(store: impl PreferenceStore + 'static) -> Self {
        Self::new(Box::new(store), None)
    }

    pub fn interactive(store: impl PreferenceStore + 'static, prompter: impl Prompter + 'static) -> Self {
        Self::new(Box::new(store), Some(Box::new(prompter)))
    }

    pub fn is_interactive(&self) -> bool {
        self.prompter.is_some()
    }

    pub fn resolve(&mut self, key: &ComboKey, candidates: &[String]) -> Resolution {
        match self.session.get(key) {
            Some(ComboState::Resolved(printer)) => {
                return Resolution::Resolved {
                    printer: printer.clone(),
                    source: ResolutionSource::Session,
                };
            }
            Some(ComboState::Deferred) | Some(ComboState::Unresolved) => {
                debug!(combo = %key, "combo still undecided");
                return Resolution::Pending;
            }
            Some(ComboState::PendingPrompt) | None => {}
        }

        if let Some(printer) = self.store.get(key.as_str()) {
            debug!(combo = %key, printer = %printer, "combo resolved from preferences");
            self.session.insert(key.clone(), ComboState::Resolved(printer.clone()));
            return Resolution::Resolved {
                printer,
                source: ResolutionSource::Stored,
            };
        }

        let Some(prompter) = self.prompter.as_mut() else {
            warn!(combo = %key, candidates = ?candidates, "printer combo needs a decision; rerun interactively");
            self.session.insert(key.clone(), ComboState::Unresolved);
            return Resolution::Pending;
        };

        self.session.insert(key.clone(), ComboState::PendingPrompt);
        let answer = prompter
            .choose(key, candidates)
            .and_then(|choice| match_candidate(&choice, candidates));

        let Some(printer) = answer else {
            info!(combo = %key, "combo skipped");
            self.session.insert(key.clone(), ComboState::Deferred);
            return Resolution::Pending;
        };

        if let Err(e) = self.store.record(key.as_str(), &printer) {
            warn!(combo = %key, "could not persist printer preference: {}", e);
        }
        info!(combo = %key, printer = %printer, "combo resolved");
        self.session.insert(key.clone(), ComboState::Resolved(printer.clone()));

        Resolution::Resolved {
            printer,
            source: ResolutionSource::Prompted,
        }
    }

    /// Per-run state of a combo, if it has been seen.
    pub fn state(&self, key: &ComboKey) -> Option<&ComboState> {
        self.session.get(key)
    }

    pub fn store(&self) -> &dyn PreferenceStore {
        self.store.as_ref()
    }
}

/// Accept a prompter answer only if it names one of the candidates.
fn match_candidate(choice: &str, candidates: &[String]) -> Option<String> {
    let found = candidates
        .iter()
        .find(|c| c.eq_ignore_ascii_case(choice.trim()))
        .cloned();
    if found.is_none() {
        warn!(choice = %choice, "prompter answered with a printer outside the candidates");
    }
    found
}

// ============================================================================
// TESTS
// ============================================================================
