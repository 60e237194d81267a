use std::fmt;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "riptlist")]
#[command(version, about = "Parse `iptables -L -n -v -x` output", long_about = None)]
struct Cli {
  /// Listing to read; stdin when omitted or `-`
  file: Option<PathBuf>,

  #[arg(long, value_enum, default_value = "text")]
  format: Format,

  /// Only print this chain
  #[arg(long)]
  chain: Option<String>,
}

impl Cli {
  fn input(&self) -> Option<&Path> {
    self.file.as_deref().filter(|path| path.as_os_str() != "-")
  }
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
  Text,
  Json,
}

fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
    .with_writer(io::stderr)
    .init();

  let cli = Cli::parse();
  let stdout = io::stdout();
  let mut out = stdout.lock();

  match cli.input() {
    Some(path) => {
      let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
      run(&cli, file, &mut out).with_context(|| format!("while reading {}", path.display()))
    }
    None => run(&cli, io::stdin().lock(), &mut out).context("while reading stdin"),
  }
}

fn run<R: Read, W: Write>(cli: &Cli, input: R, out: &mut W) -> anyhow::Result<()> {
  let table = riptlist::parse_reader(input).context("failed to parse listing")?;

  match &cli.chain {
    Some(name) => {
      let chain = table.chain(name).with_context(|| format!("no chain named {:?}", name))?;
      render(chain, cli.format, out)
    }
    None => render(&table, cli.format, out),
  }
}

fn render<T: fmt::Display + Serialize, W: Write>(value: &T, format: Format, out: &mut W) -> anyhow::Result<()> {
  match format {
    Format::Text => write!(out, "{}", value)?,
    Format::Json => {
      serde_json::to_writer_pretty(&mut *out, value)?;
      writeln!(out)?;
    }
  }
  Ok(())
}
