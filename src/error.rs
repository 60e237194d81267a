use std::{fmt, io, num};

use thiserror::Error;

/// Errors surfaced by the parse entry points.
#[derive(Debug, Error)]
pub enum RIPTError {
  /// The line source failed; reported verbatim.
  #[error("{0}")]
  Io(#[from] io::Error),
  #[error("{0}")]
  Analysis(#[from] RIPTAnalysisError),
}

/// Defines the Result type of the listing parser
pub type RIPTResult<T> = Result<T, RIPTError>;

impl RIPTError {
  pub fn analysis(&self) -> Option<&RIPTAnalysisError> {
    match self {
      RIPTError::Analysis(err) => Some(err),
      RIPTError::Io(_) => None,
    }
  }

  pub fn is_io(&self) -> bool {
    matches!(self, RIPTError::Io(_))
  }

  pub fn is_syntax(&self) -> bool {
    self.analysis().map_or(false, RIPTAnalysisError::is_syntax)
  }

  pub fn is_value(&self) -> bool {
    self.analysis().map_or(false, RIPTAnalysisError::is_value)
  }

  pub fn is_internal(&self) -> bool {
    self.analysis().map_or(false, RIPTAnalysisError::is_internal)
  }
}

/// Where in the input an analysis error happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineRef {
  /// 1-based line number and the raw (right-trimmed) line text.
  Line { number: usize, text: String },
  Eof,
}

impl fmt::Display for LineRef {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      LineRef::Line { number, text } => write!(f, "while parsing line {}: {:?}", number, text),
      LineRef::Eof => write!(f, "when encountered end of input"),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxReason {
  UnrecognizedChainHeader,
  MissingColumnHeader,
  UnrecognizedRuleRow,
}

impl fmt::Display for SyntaxReason {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let message = match self {
      SyntaxReason::UnrecognizedChainHeader => "unrecognized chain header",
      SyntaxReason::MissingColumnHeader => "missing column header",
      SyntaxReason::UnrecognizedRuleRow => "unrecognized rule row",
    };
    f.write_str(message)
  }
}

/// Grammar failures raised by the state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RIPTAnalysisError {
  #[error("{reason}, {at}")]
  Syntax { at: LineRef, reason: SyntaxReason },

  #[error("invalid {field} value {value:?}: {source}, {at}")]
  Value {
    at: LineRef,
    field: &'static str,
    value: String,
    #[source]
    source: num::ParseIntError,
  },

  /// The matchers and the transition table disagree. Never caused by input alone.
  #[error("internal parser error: {reason}, {at}")]
  Internal { at: LineRef, reason: &'static str },
}

pub type RIPTAnalysisResult<T> = Result<T, RIPTAnalysisError>;

impl RIPTAnalysisError {
  pub fn line_ref(&self) -> &LineRef {
    match self {
      RIPTAnalysisError::Syntax { at, .. } => at,
      RIPTAnalysisError::Value { at, .. } => at,
      RIPTAnalysisError::Internal { at, .. } => at,
    }
  }

  pub fn syntax_reason(&self) -> Option<SyntaxReason> {
    match self {
      RIPTAnalysisError::Syntax { reason, .. } => Some(*reason),
      _ => None,
    }
  }

  pub fn is_syntax(&self) -> bool {
    matches!(self, RIPTAnalysisError::Syntax { .. })
  }

  pub fn is_value(&self) -> bool {
    matches!(self, RIPTAnalysisError::Value { .. })
  }

  pub fn is_internal(&self) -> bool {
    matches!(self, RIPTAnalysisError::Internal { .. })
  }
}

/// A numeric column that did not fit an `i64`. Matchers return this before a line
/// position is known; the state machine attaches one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueError {
  pub field: &'static str,
  pub value: String,
  pub source: num::ParseIntError,
}

impl ValueError {
  pub(crate) fn at(self, at: LineRef) -> RIPTAnalysisError {
    RIPTAnalysisError::Value {
      at,
      field: self.field,
      value: self.value,
      source: self.source,
    }
  }
}
