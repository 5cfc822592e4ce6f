//! Minimal CSV helpers for the per-target flat files.
//!
//! The raw-file contract is deliberately narrow: comma separator, values
//! quoted only when they contain a comma/quote/newline, double-quote
//! escaping inside quoted fields. Quotes + CRLF tolerant on the read side.

/// Format one row, quoting fields only when required.
pub fn write_row<S: AsRef<str>>(fields: &[S]) -> String {
    let mut out = String::new();
    for (i, field) in fields.iter().enumerate() {
        let field = field.as_ref();
        if i > 0 {
            out.push(',');
        }
        if needs_quotes(field) {
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(field);
        }
    }
    out
}

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Split one CSV line into fields, honoring quoting.
pub fn split_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    if matches!(chars.peek(), Some('"')) {
                        chars.next(); // double-quote escape
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut field));
            }
            '\r' | '\n' if !in_quotes => {}
            _ => field.push(ch),
        }
    }

    fields.push(field);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_row_roundtrip() {
        let row = write_row(&["03/07/2024", "Plain title", "1.2K", "3"]);
        assert_eq!(row, "03/07/2024,Plain title,1.2K,3");
        assert_eq!(split_line(&row), vec!["03/07/2024", "Plain title", "1.2K", "3"]);
    }

    #[test]
    fn comma_field_is_quoted() {
        let row = write_row(&["a", "hello, world", "b"]);
        assert_eq!(row, "a,\"hello, world\",b");
        assert_eq!(split_line(&row), vec!["a", "hello, world", "b"]);
    }

    #[test]
    fn embedded_quotes_escape() {
        let row = write_row(&["say \"hi\""]);
        assert_eq!(row, "\"say \"\"hi\"\"\"");
        assert_eq!(split_line(&row), vec!["say \"hi\""]);
    }

    #[test]
    fn split_tolerates_crlf() {
        assert_eq!(split_line("a,b\r\n"), vec!["a", "b"]);
    }

    #[test]
    fn empty_fields_survive() {
        assert_eq!(split_line("a,,c"), vec!["a", "", "c"]);
    }
}
