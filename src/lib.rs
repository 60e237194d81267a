//! Parser for verbose iptables chain listings.
//!
//! ```text
//! Chain INPUT (policy ACCEPT 10 packets, 500 bytes)
//! num   pkts bytes target     prot opt in     out     source               destination
//! 1        3    180 ACCEPT     tcp  --  eth0   *       0.0.0.0/0            0.0.0.0/0           /* allow-ssh */
//!
//! Chain LOGGING (0 references)
//! num   pkts bytes target     prot opt in     out     source               destination
//! ```
//!
//! The listing is read line by line from a [`LineSource`] and turned into a [`Table`]
//! of chains and rules. Any line the grammar does not allow aborts the whole parse.

use std::io::{BufReader, Read};
use std::str::FromStr;

use error::{RIPTError, RIPTResult};
use source::BufLineSource;
use table::Table;

mod iptparser;
mod matcher;
pub mod error;
pub mod source;
pub mod table;

pub use iptparser::{parse, Event, State};
pub use matcher::Layout;
pub use source::LineSource;
pub use table::{Chain, ChainKind, Rule};

/// Parses an in-memory listing.
///
/// # Example
///
/// ```rust
/// let table = riptlist::parse_str("Chain LOGGING (0 references)\nnum pkts bytes target prot opt in out source destination\n").unwrap();
/// assert_eq!(table.chain_names(), vec!["LOGGING"]);
/// ```
pub fn parse_str(text: &str) -> RIPTResult<Table> {
  iptparser::parse(BufLineSource::new(text.as_bytes()))
}

/// Parses a listing from any reader, e.g. the stdout of `iptables -L -n -v -x`.
pub fn parse_reader<R: Read>(reader: R) -> RIPTResult<Table> {
  iptparser::parse(BufLineSource::new(BufReader::new(reader)))
}

impl FromStr for Table {
  type Err = RIPTError;

  fn from_str(text: &str) -> Result<Table, RIPTError> {
    parse_str(text)
  }
}
