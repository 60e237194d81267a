use tracing::{debug, error, trace};

use crate::error::{LineRef, RIPTAnalysisError, RIPTAnalysisResult, RIPTResult, SyntaxReason};
use crate::matcher::{self, Layout};
use crate::source::LineSource;
use crate::table::Table;

/// One step of input: a right-trimmed line, or the end of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event<'a> {
  Line(&'a str),
  Eof,
}

/// What the parser expects next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
  ExpectChain,
  ExpectColumnHeader,
  /// Rule rows beneath a column header; `Numbered` rows may carry a rule number.
  ExpectRuleOrBlankOrChain(Layout),
  /// Input ended in an accepting state. Nothing may follow.
  Terminal,
}

impl Default for State {
  fn default() -> State {
    State::ExpectChain
  }
}

impl State {
  /// Consumes one event, appending to `table` where the grammar says so.
  ///
  /// `at` locates the event for error reporting; it is not inspected otherwise.
  pub fn step(self, event: Event, at: &LineRef, table: &mut Table) -> RIPTAnalysisResult<State> {
    match (self, event) {
      (State::Terminal, _) => Err(internal(at, "event after the terminal state")),

      (State::ExpectChain, Event::Eof) => Ok(State::Terminal),
      (State::ExpectChain, Event::Line(line)) => match matcher::chain_header(line) {
        Ok(Some(chain)) => {
          debug!(chain = chain.name(), builtin = chain.is_builtin(), "chain header");
          table.push_chain(chain);
          Ok(State::ExpectColumnHeader)
        }
        Ok(None) => Err(syntax(at, SyntaxReason::UnrecognizedChainHeader)),
        Err(err) => Err(err.at(at.clone())),
      },

      (State::ExpectColumnHeader, Event::Eof) => Err(syntax(at, SyntaxReason::MissingColumnHeader)),
      (State::ExpectColumnHeader, Event::Line(line)) => match matcher::column_header(line) {
        Some(layout) => Ok(State::ExpectRuleOrBlankOrChain(layout)),
        None => Err(syntax(at, SyntaxReason::MissingColumnHeader)),
      },

      (State::ExpectRuleOrBlankOrChain(_), Event::Eof) => Ok(State::Terminal),
      (State::ExpectRuleOrBlankOrChain(_), Event::Line("")) => Ok(State::ExpectChain),
      (State::ExpectRuleOrBlankOrChain(layout), Event::Line(line)) => {
        let rule = match matcher::rule_row(line, layout) {
          Ok(Some(rule)) => rule,
          Ok(None) => return Err(syntax(at, SyntaxReason::UnrecognizedRuleRow)),
          Err(err) => return Err(err.at(at.clone())),
        };
        let chain = match table.last_chain_mut() {
          Some(chain) => chain,
          None => return Err(internal(at, "matched a rule, when no chains exist")),
        };
        chain.push_rule(rule);
        Ok(State::ExpectRuleOrBlankOrChain(layout))
      }
    }
  }
}

fn syntax(at: &LineRef, reason: SyntaxReason) -> RIPTAnalysisError {
  RIPTAnalysisError::Syntax { at: at.clone(), reason }
}

fn internal(at: &LineRef, reason: &'static str) -> RIPTAnalysisError {
  error!(%at, reason, "parser state machine inconsistency");
  RIPTAnalysisError::Internal { at: at.clone(), reason }
}

/// Parses the output of:
///
/// ```text
/// iptables [-t <table>] -L -n -v -x [--line-numbers]
/// ```
///
/// Lines are pulled from `source` until it reports end of input, which is fed to the
/// state machine as a final event of its own. The first I/O or grammar error aborts
/// the parse.
pub fn parse<L: LineSource>(mut source: L) -> RIPTResult<Table> {
  let mut table = Table::default();
  let mut state = State::default();
  let mut number = 0;

  while let Some(raw) = source.next_line()? {
    number += 1;
    let line = raw.trim_end_matches(&[' ', '\r', '\n'][..]);
    let at = LineRef::Line { number, text: line.to_string() };
    let next = state.step(Event::Line(line), &at, &mut table)?;
    trace!(number, ?state, ?next, "transition");
    state = next;
  }

  let next = state.step(Event::Eof, &LineRef::Eof, &mut table)?;
  trace!(?state, ?next, "end of input");

  debug!(lines = number, chains = table.chains().len(), rules = table.rule_count(), "parsed listing");
  Ok(table)
}

#[cfg(test)]
mod tests {
  use super::*;

  const RULE: &str = "1 3 180 ACCEPT tcp -- eth0 * 0.0.0.0/0 0.0.0.0/0";

  fn line(number: usize, text: &str) -> LineRef {
    LineRef::Line { number, text: text.to_string() }
  }

  #[test]
  fn test_rule_without_chain_is_internal() {
    let mut table = Table::default();
    let at = line(1, RULE);
    let err = State::ExpectRuleOrBlankOrChain(Layout::Numbered)
      .step(Event::Line(RULE), &at, &mut table)
      .unwrap_err();
    assert!(err.is_internal());
    assert_eq!(err.line_ref(), &at);
    assert!(table.is_empty());
  }

  #[test]
  fn test_terminal_absorbs_everything() {
    let mut table = Table::default();
    for event in &[Event::Line(RULE), Event::Line(""), Event::Eof] {
      let err = State::Terminal.step(*event, &LineRef::Eof, &mut table).unwrap_err();
      assert!(err.is_internal());
    }
  }

  #[test]
  fn test_transitions() {
    let mut table = Table::default();
    let at = LineRef::Eof;

    let state = State::ExpectChain
      .step(Event::Line("Chain FORWARD (policy DROP 0 packets, 0 bytes)"), &at, &mut table)
      .unwrap();
    assert_eq!(state, State::ExpectColumnHeader);

    let state = state
      .step(Event::Line("num pkts bytes target prot opt in out source destination"), &at, &mut table)
      .unwrap();
    assert_eq!(state, State::ExpectRuleOrBlankOrChain(Layout::Numbered));

    let state = state.step(Event::Line(RULE), &at, &mut table).unwrap();
    assert_eq!(state, State::ExpectRuleOrBlankOrChain(Layout::Numbered));
    assert_eq!(table.chains()[0].rules().len(), 1);

    assert_eq!(state.step(Event::Line(""), &at, &mut table).unwrap(), State::ExpectChain);
    assert_eq!(state.step(Event::Eof, &at, &mut table).unwrap(), State::Terminal);
    assert_eq!(State::ExpectChain.step(Event::Eof, &at, &mut table).unwrap(), State::Terminal);
  }

  #[test]
  fn test_column_header_eof() {
    let mut table = Table::default();
    let err = State::ExpectColumnHeader.step(Event::Eof, &LineRef::Eof, &mut table).unwrap_err();
    assert_eq!(err.syntax_reason(), Some(SyntaxReason::MissingColumnHeader));
    assert_eq!(err.line_ref(), &LineRef::Eof);
  }

  #[test]
  fn test_blank_line_is_not_a_chain() {
    let mut table = Table::default();
    let err = State::ExpectChain.step(Event::Line(""), &line(3, ""), &mut table).unwrap_err();
    assert_eq!(err.syntax_reason(), Some(SyntaxReason::UnrecognizedChainHeader));
  }
}
