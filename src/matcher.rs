//! Line matchers for the verbose listing grammar.
//!
//! Each matcher looks at one right-trimmed line and either extracts the construct it
//! recognizes, declines with `Ok(None)`, or fails with a [`ValueError`] when the line has
//! the right shape but a numeric column does not fit an `i64`.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::error::ValueError;
use crate::table::{Chain, ChainKind, Rule};

static BUILTIN_CHAIN: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"^Chain (?P<chain>[^ ]+) \(policy (?P<policy>[^ ]+) (?P<packets>[0-9]+) packets, (?P<bytes>[0-9]+) bytes\)$").unwrap()
});

static USER_CHAIN: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"^Chain (?P<chain>[^ ]+) \((?P<refs>[0-9]+) references\)$").unwrap()
});

static COLUMN_HEADER: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"^(?:(?P<num>num) +| *)pkts +bytes +target +prot +opt +in +out +source +destination$").unwrap()
});

// Everything after the two counters. The match-extension is lazy so that a trailing
// `/* ... */` block, when present, is split off into the comment.
const RULE_TAIL: &str = concat!(
  r" +(?P<target>[^ ]+) +(?P<prot>[^ ]+) +(?P<opt>[^ ]+) +(?P<in>[^ ]+) +(?P<out>[^ ]+)",
  r" +(?P<source>[^ ]+) +(?P<destination>[^ ]+)",
  r"(?: +(?P<match>.*?))?(?: */\* (?P<comment>.*?) \*/)?$",
);

// Counters are taken as whole tokens and checked afterwards, so a corrupt counter is
// reported as such instead of failing the row shape. A sign never starts a counter.
const COUNTER: &str = r"[^ +-][^ ]*";

// The rule number, like `num` in the header, sits at column 0.
static NUMBERED_RULE: Lazy<Regex> = Lazy::new(|| {
  Regex::new(&format!(r"^[0-9]+ +(?P<pkts>{c}) +(?P<bytes>{c}){}", RULE_TAIL, c = COUNTER)).unwrap()
});

// Without a rule number the packet count has to open the row.
static UNNUMBERED_RULE: Lazy<Regex> = Lazy::new(|| {
  Regex::new(&format!(r"^ *(?P<pkts>[0-9][^ ]*) +(?P<bytes>{c}){}", RULE_TAIL, c = COUNTER)).unwrap()
});

/// Column layout announced by the column header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
  /// `num pkts ...` header: rows may start with their rule number.
  Numbered,
  /// `pkts bytes ...` header: rows never carry a rule number.
  Unnumbered,
}

/// Matches either chain header form:
///
/// ```text
/// Chain INPUT (policy ACCEPT 10 packets, 500 bytes)
/// Chain LOGGING (0 references)
/// ```
pub fn chain_header(line: &str) -> Result<Option<Chain>, ValueError> {
  if let Some(caps) = BUILTIN_CHAIN.captures(line) {
    let kind = ChainKind::Builtin {
      policy: caps["policy"].to_string(),
      packets: number(&caps, "packets")?,
      bytes: number(&caps, "bytes")?,
    };
    return Ok(Some(Chain::new(caps["chain"].to_string(), kind)));
  }
  if let Some(caps) = USER_CHAIN.captures(line) {
    let kind = ChainKind::User { references: number(&caps, "refs")? };
    return Ok(Some(Chain::new(caps["chain"].to_string(), kind)));
  }
  Ok(None)
}

/// Matches the column-title line printed under every chain header and reports
/// whether it carries the leading `num` column.
pub fn column_header(line: &str) -> Option<Layout> {
  COLUMN_HEADER.captures(line).map(|caps| match caps.name("num") {
    Some(_) => Layout::Numbered,
    None => Layout::Unnumbered,
  })
}

/// Matches a rule row under a header of the given layout. The rule number, when
/// present, is dropped.
///
/// Under a numbered header the row is read with its rule number first; only when that
/// reading does not fit the columns is it read as a row without one.
pub fn rule_row(line: &str, layout: Layout) -> Result<Option<Rule>, ValueError> {
  let numbered = match layout {
    Layout::Numbered => NUMBERED_RULE.captures(line),
    Layout::Unnumbered => None,
  };
  match numbered.or_else(|| UNNUMBERED_RULE.captures(line)) {
    Some(caps) => rule(&caps).map(Some),
    None => Ok(None),
  }
}

fn rule(caps: &Captures) -> Result<Rule, ValueError> {
  Ok(Rule {
    packets: number(caps, "pkts")?,
    bytes: number(caps, "bytes")?,
    target: caps["target"].to_string(),
    protocol: caps["prot"].to_string(),
    option: caps["opt"].to_string(),
    input: caps["in"].to_string(),
    output: caps["out"].to_string(),
    source: caps["source"].to_string(),
    destination: caps["destination"].to_string(),
    matches: optional(caps, "match"),
    comment: optional(caps, "comment"),
  })
}

fn number(caps: &Captures, field: &'static str) -> Result<i64, ValueError> {
  let value = &caps[field];
  value.parse::<i64>().map_err(|source| ValueError {
    field,
    value: value.to_string(),
    source,
  })
}

fn optional(caps: &Captures, field: &str) -> String {
  caps.name(field).map_or_else(String::new, |m| m.as_str().to_string())
}
