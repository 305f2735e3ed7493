//! Pipe-delimited tables in assistant replies.

/// Whether any line of `text` looks like a table row.
pub fn has_table_rows(text: &str) -> bool {
    !extract_rows(text).is_empty()
}

/// Collect table rows from lines containing `|`.
///
/// Markdown separator rows (`|---|:--:|`) are skipped.
pub fn extract_rows(text: &str) -> Vec<Vec<String>> {
    text.lines()
        .filter(|line| line.contains('|'))
        .map(|line| {
            line.split('|')
                .map(str::trim)
                .filter(|cell| !cell.is_empty())
                .map(String::from)
                .collect::<Vec<_>>()
        })
        .filter(|cells| !cells.is_empty() && !is_separator_row(cells))
        .collect()
}

fn is_separator_row(cells: &[String]) -> bool {
    cells
        .iter()
        .all(|c| c.chars().all(|ch| matches!(ch, '-' | ':' | ' ')))
}

/// Render rows as RFC 4180 CSV.
pub fn to_csv(rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    for row in rows {
        let line = row
            .iter()
            .map(|cell| escape_cell(cell))
            .collect::<Vec<_>>()
            .join(",");
        out.push_str(&line);
        out.push('\n');
    }
    out
}

fn escape_cell(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}
