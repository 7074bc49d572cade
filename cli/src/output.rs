//! Output formatting for CLI

use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;

/// Write `value` as indented JSON followed by a newline.
pub fn print_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).context("failed to output JSON")?;
    writeln!(out).context("failed to output JSON")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pretty_prints_with_trailing_newline() {
        let mut out = Vec::new();
        print_json(&mut out, &serde_json::json!({"id": "doc1"})).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "{\n  \"id\": \"doc1\"\n}\n");
    }
}
