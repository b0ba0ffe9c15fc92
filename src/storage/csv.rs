//! Comma-separated row codec for snapshot files. Quote-aware on both
//! sides, CRLF tolerant on read.

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Encodes one row, quoting fields that contain the delimiter, quotes
/// or line breaks. Terminates with `\n`.
pub fn encode_row(fields: &[String]) -> String {
    let mut line = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            line.push(',');
        }
        if needs_quotes(field) {
            line.push('"');
            line.push_str(&field.replace('"', "\"\""));
            line.push('"');
        } else {
            line.push_str(field);
        }
    }
    line.push('\n');
    line
}

/// Parses a CSV document into rows of fields. Handles quoted fields
/// with doubled-quote escapes; blank lines are skipped.
pub fn parse_rows(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    if matches!(chars.peek(), Some('"')) {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            ',' if !in_quotes => {
                row.push(std::mem::take(&mut field));
            }
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && matches!(chars.peek(), Some('\n')) {
                    chars.next();
                }
                row.push(std::mem::take(&mut field));
                if !(row.len() == 1 && row[0].is_empty()) {
                    rows.push(std::mem::take(&mut row));
                } else {
                    row.clear();
                }
            }
            _ => field.push(ch),
        }
    }

    // trailing row without a final newline
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_fields_stay_unquoted() {
        let row = vec!["xtreme".to_string(), "Atomic".to_string(), "170".to_string()];
        assert_eq!(encode_row(&row), "xtreme,Atomic,170\n");
    }

    #[test]
    fn delimiter_and_quotes_are_escaped() {
        let row = vec![
            "Kore, X".to_string(),
            "the \"wide\" one".to_string(),
        ];
        assert_eq!(encode_row(&row), "\"Kore, X\",\"the \"\"wide\"\" one\"\n");
    }

    #[test]
    fn encode_parse_round_trip() {
        let row = vec![
            "snowmania".to_string(),
            "Völkl".to_string(),
            "Deacon, 76 \"demo\"".to_string(),
            "".to_string(),
            "1299.50".to_string(),
        ];
        let text = encode_row(&row);
        let parsed = parse_rows(&text);
        assert_eq!(parsed, vec![row]);
    }

    #[test]
    fn crlf_and_blank_lines_are_tolerated() {
        let parsed = parse_rows("a,b\r\n\r\nc,d\n");
        assert_eq!(
            parsed,
            vec![
                vec!["a".to_string(), "b".to_string()],
                vec!["c".to_string(), "d".to_string()],
            ]
        );
    }

    #[test]
    fn quoted_newline_stays_inside_field() {
        let parsed = parse_rows("\"a\nb\",c\n");
        assert_eq!(parsed, vec![vec!["a\nb".to_string(), "c".to_string()]]);
    }
}
