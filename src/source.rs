use std::io::{self, BufRead};

/// Produces lines for parsing, one at a time.
///
/// `Ok(Some(line))` may keep its trailing newline and whitespace, `Ok(None)` signals end
/// of input. The parser stops calling the source after the first `None` or error.
pub trait LineSource {
  fn next_line(&mut self) -> io::Result<Option<String>>;
}

impl<T: LineSource + ?Sized> LineSource for &mut T {
  fn next_line(&mut self) -> io::Result<Option<String>> {
    (**self).next_line()
  }
}

/// Reads newline-terminated lines from a buffered reader. A final line without a
/// trailing newline is still delivered.
pub struct BufLineSource<R> {
  reader: R,
}

impl<R: BufRead> BufLineSource<R> {
  pub fn new(reader: R) -> BufLineSource<R> {
    BufLineSource { reader }
  }
}

impl<R: BufRead> LineSource for BufLineSource<R> {
  fn next_line(&mut self) -> io::Result<Option<String>> {
    let mut line = String::new();
    match self.reader.read_line(&mut line)? {
      0 => Ok(None),
      _ => Ok(Some(line)),
    }
  }
}

#[cfg(test)]
mod tests {
  use std::io::{Cursor, Read};

  use super::*;

  fn drain<L: LineSource>(mut source: L) -> Vec<String> {
    let mut lines = vec![];
    while let Some(line) = source.next_line().unwrap() {
      lines.push(line);
    }
    lines
  }

  #[test]
  fn test_buf_source_keeps_newlines() {
    let lines = drain(BufLineSource::new(Cursor::new("a\n\nb  \r\nc")));
    assert_eq!(lines, vec!["a\n", "\n", "b  \r\n", "c"]);
  }

  #[test]
  fn test_buf_source_empty() {
    assert!(drain(BufLineSource::new(&b""[..])).is_empty());
  }

  #[test]
  fn test_buf_source_stays_exhausted() {
    let mut source = BufLineSource::new("only\n".as_bytes());
    assert_eq!(source.next_line().unwrap(), Some("only\n".to_string()));
    assert_eq!(source.next_line().unwrap(), None);
    assert_eq!(source.next_line().unwrap(), None);
  }

  struct Broken;

  impl Read for Broken {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
      Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
    }
  }

  #[test]
  fn test_buf_source_propagates_errors() {
    let mut source = BufLineSource::new(io::BufReader::new(Broken));
    let err = source.next_line().unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
  }
}
