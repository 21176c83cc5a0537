// ⌨️ Terminal Prompter - numbered choice on stderr, answer from stdin
// stdout stays free for results and CSV

use crate::resolver::{ComboKey, Prompter};
use std::io::{self, BufRead, BufReader, Stderr, Stdin, Write};
use tracing::warn;

/// Line-oriented prompter over any reader/writer pair.
///
/// Accepts a candidate number or a candidate name; "q" or end of input skips.
pub struct TerminalPrompter<R, W> {
    input: R,
    output: W,
}

impl TerminalPrompter<BufReader<Stdin>, Stderr> {
    /// Reads answers from stdin and writes prompts to stderr.
    pub fn stdio() -> Self {
        TerminalPrompter::new(BufReader::new(io::stdin()), io::stderr())
    }
}

impl<R: BufRead, W: Write> TerminalPrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        TerminalPrompter { input, output }
    }

    fn ask(&mut self, combo_key: &ComboKey, candidates: &[String]) -> io::Result<Option<String>> {
        writeln!(self.output)?;
        writeln!(self.output, "🖨️  Several printers found in one profile: {}", combo_key)?;
        for (i, candidate) in candidates.iter().enumerate() {
            writeln!(self.output, "  {}. {}", i + 1, candidate)?;
        }

        loop {
            write!(self.output, "Choose a printer (1-{}, or q to skip): ", candidates.len())?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            let answer = line.trim();

            if answer.eq_ignore_ascii_case("q") {
                return Ok(None);
            }
            if let Ok(n) = answer.parse::<usize>() {
                if (1..=candidates.len()).contains(&n) {
                    return Ok(Some(candidates[n - 1].clone()));
                }
            }
            if let Some(c) = candidates.iter().find(|c| c.eq_ignore_ascii_case(answer)) {
                return Ok(Some(c.clone()));
            }

            writeln!(self.output, "❌ Invalid choice: {:?}", answer)?;
        }
    }
}

impl<R: BufRead, W: Write> Prompter for TerminalPrompter<R, W> {
    fn choose(&mut self, combo_key: &ComboKey, candidates: &[String]) -> Option<String> {
        if candidates.is_empty() {
            return None;
        }
        match self.ask(combo_key, candidates) {
            Ok(choice) => choice,
            Err(e) => {
                warn!("prompt failed: {}", e);
                None
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn candidates() -> Vec<String> {
        vec!["Epson P9570".to_string(), "Epson P7570".to_string()]
    }

    fn key() -> ComboKey {
        ComboKey::from_tokens(["P9570", "P7570"])
    }

    #[test]
    fn test_choice_by_number() {
        let mut out = Vec::new();
        let mut prompter = TerminalPrompter::new(Cursor::new("2\n"), &mut out);
        assert_eq!(prompter.choose(&key(), &candidates()).as_deref(), Some("Epson P7570"));

        let shown = String::from_utf8(out).unwrap();
        assert!(shown.contains("P7570-P9570"));
        assert!(shown.contains("1. Epson P9570"));
    }

    #[test]
    fn test_invalid_then_name() {
        let mut out = Vec::new();
        let mut prompter = TerminalPrompter::new(Cursor::new("7\nepson p9570\n"), &mut out);
        assert_eq!(prompter.choose(&key(), &candidates()).as_deref(), Some("Epson P9570"));
        assert!(String::from_utf8(out).unwrap().contains("Invalid choice"));
    }

    #[test]
    fn test_skip_and_eof() {
        let mut prompter = TerminalPrompter::new(Cursor::new("q\n"), io::sink());
        assert_eq!(prompter.choose(&key(), &candidates()), None);

        let mut prompter = TerminalPrompter::new(Cursor::new(""), io::sink());
        assert_eq!(prompter.choose(&key(), &candidates()), None);
    }

    #[test]
    fn test_stdio_prompts_on_stderr() {
        let _prompter: TerminalPrompter<BufReader<Stdin>, Stderr> = TerminalPrompter::stdio();
    }
}
