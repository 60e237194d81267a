use std::fmt;

use serde::{Deserialize, Serialize};

/// A parsed `iptables -L -n -v -x` listing: every chain in order of appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
  pub(crate) chains: Vec<Chain>,
}

impl Table {
  pub fn chains(&self) -> &[Chain] {
    &self.chains
  }

  /// Looks up a chain by name. Chain names are unique in a real listing; the first
  /// one wins otherwise.
  pub fn chain(&self, name: &str) -> Option<&Chain> {
    self.chains.iter().find(|chain| chain.name == name)
  }

  pub fn chain_names(&self) -> Vec<&str> {
    self.chains.iter().map(|chain| &chain.name[..]).collect()
  }

  pub fn rule_count(&self) -> usize {
    self.chains.iter().map(|chain| chain.rules.len()).sum()
  }

  pub fn is_empty(&self) -> bool {
    self.chains.is_empty()
  }

  pub(crate) fn push_chain(&mut self, chain: Chain) {
    self.chains.push(chain);
  }

  pub(crate) fn last_chain_mut(&mut self) -> Option<&mut Chain> {
    self.chains.last_mut()
  }
}

/// Either a built-in chain (policy and counters) or a user-defined one (reference count).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChainKind {
  Builtin { policy: String, packets: i64, bytes: i64 },
  User { references: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chain {
  pub(crate) name: String,
  pub(crate) kind: ChainKind,
  pub(crate) rules: Vec<Rule>,
}

impl Chain {
  pub(crate) fn new(name: String, kind: ChainKind) -> Chain {
    Chain { name, kind, rules: vec![] }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn kind(&self) -> &ChainKind {
    &self.kind
  }

  /// Rules in listing order, which is also evaluation order.
  pub fn rules(&self) -> &[Rule] {
    &self.rules
  }

  pub fn is_builtin(&self) -> bool {
    matches!(self.kind, ChainKind::Builtin { .. })
  }

  pub fn policy(&self) -> Option<&str> {
    match &self.kind {
      ChainKind::Builtin { policy, .. } => Some(policy),
      ChainKind::User { .. } => None,
    }
  }

  /// `(packets, bytes)` of a built-in chain.
  pub fn counters(&self) -> Option<(i64, i64)> {
    match self.kind {
      ChainKind::Builtin { packets, bytes, .. } => Some((packets, bytes)),
      ChainKind::User { .. } => None,
    }
  }

  pub fn references(&self) -> Option<i64> {
    match self.kind {
      ChainKind::User { references } => Some(references),
      ChainKind::Builtin { .. } => None,
    }
  }

  pub(crate) fn push_rule(&mut self, rule: Rule) {
    self.rules.push(rule);
  }
}

/// One rule row. `matches` holds the raw match-extension text (e.g. `tcp dpt:22`),
/// `comment` the text of a trailing `/* ... */` block; both are empty when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
  pub packets: i64,
  pub bytes: i64,
  pub target: String,
  pub protocol: String,
  pub option: String,
  pub input: String,
  pub output: String,
  pub source: String,
  pub destination: String,
  pub matches: String,
  pub comment: String,
}

impl fmt::Display for Table {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    writeln!(f, "Table {{")?;
    for chain in &self.chains {
      write!(f, "{}", chain)?;
    }
    writeln!(f, "}}")
  }
}

impl fmt::Display for Chain {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "Chain [ name={:?}", self.name)?;
    match &self.kind {
      ChainKind::Builtin { policy, packets, bytes } => {
        write!(f, " policy={:?} packets={} bytes={}", policy, packets, bytes)?
      }
      ChainKind::User { references } => write!(f, " references={}", references)?,
    }
    writeln!(f, " ] {{")?;
    for rule in &self.rules {
      writeln!(f, "{}", rule)?;
    }
    writeln!(f, "}}")
  }
}

impl fmt::Display for Rule {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(
      f,
      "packets={} bytes={} target={:?} proto={:?} option={:?} in={:?} out={:?} src={:?} dest={:?} match={:?} comment={:?}",
      self.packets, self.bytes, self.target, self.protocol, self.option, self.input,
      self.output, self.source, self.destination, self.matches, self.comment
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample() -> Table {
    let mut input = Chain::new("INPUT".to_string(), ChainKind::Builtin {
      policy: "DROP".to_string(),
      packets: 7,
      bytes: 420,
    });
    input.push_rule(Rule {
      packets: 1,
      bytes: 60,
      target: "ACCEPT".to_string(),
      protocol: "tcp".to_string(),
      option: "--".to_string(),
      input: "*".to_string(),
      output: "*".to_string(),
      source: "0.0.0.0/0".to_string(),
      destination: "0.0.0.0/0".to_string(),
      matches: "tcp dpt:22".to_string(),
      comment: String::new(),
    });
    let user = Chain::new("LOGDROP".to_string(), ChainKind::User { references: 2 });
    Table { chains: vec![input, user] }
  }

  #[test]
  fn test_chain_accessors() {
    let table = sample();
    let input = table.chain("INPUT").unwrap();
    assert!(input.is_builtin());
    assert_eq!(input.policy(), Some("DROP"));
    assert_eq!(input.counters(), Some((7, 420)));
    assert_eq!(input.references(), None);

    let user = table.chain("LOGDROP").unwrap();
    assert!(!user.is_builtin());
    assert_eq!(user.policy(), None);
    assert_eq!(user.counters(), None);
    assert_eq!(user.references(), Some(2));

    assert!(table.chain("FORWARD").is_none());
    assert_eq!(table.chain_names(), vec!["INPUT", "LOGDROP"]);
    assert_eq!(table.rule_count(), 1);
  }

  #[test]
  fn test_display() {
    let text = sample().to_string();
    let expected = "Table {\n\
      Chain [ name=\"INPUT\" policy=\"DROP\" packets=7 bytes=420 ] {\n\
      packets=1 bytes=60 target=\"ACCEPT\" proto=\"tcp\" option=\"--\" in=\"*\" out=\"*\" \
      src=\"0.0.0.0/0\" dest=\"0.0.0.0/0\" match=\"tcp dpt:22\" comment=\"\"\n\
      }\n\
      Chain [ name=\"LOGDROP\" references=2 ] {\n\
      }\n\
      }\n";
    assert_eq!(text, expected);
  }

  #[test]
  fn test_json_tags_chain_kind() {
    let json = serde_json::to_value(sample()).unwrap();
    assert_eq!(json["chains"][0]["kind"]["kind"], "builtin");
    assert_eq!(json["chains"][0]["kind"]["policy"], "DROP");
    assert_eq!(json["chains"][1]["kind"]["kind"], "user");
    assert_eq!(json["chains"][1]["kind"]["references"], 2);
    assert_eq!(json["chains"][0]["rules"][0]["matches"], "tcp dpt:22");
  }
}
