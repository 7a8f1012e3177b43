use colored::Colorize;
use console::{Alignment, measure_text_width, pad_str};

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(measure_text_width(title)).dimmed());
}

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

// ============================================================================
// Tables
// ============================================================================

/// Placeholder for empty table cells
pub const EMPTY_CELL: &str = "—";

/// Print a table with a bold header row
pub fn table(headers: &[&str], rows: &[Vec<String>]) {
    print!("{}", format_table(headers, rows, true));
}

/// Lay out a table with columns padded to their widest cell.
///
/// Widths are measured in terminal columns, so colored or wide cells line
/// up. The last column is never padded.
pub fn format_table(headers: &[&str], rows: &[Vec<String>], styled: bool) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| measure_text_width(h)).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(measure_text_width(cell));
        }
    }

    let last = widths.len().saturating_sub(1);
    let line = |cells: Vec<&str>| -> String {
        let mut out = String::new();
        for (i, cell) in cells.into_iter().enumerate() {
            if i > 0 {
                out.push_str("  ");
            }
            if i == last {
                out.push_str(cell);
            } else {
                out.push_str(&pad_str(cell, widths[i], Alignment::Left, None));
            }
        }
        out.push('\n');
        out
    };

    let head = line(headers.to_vec());
    let mut out = if styled {
        format!("{}\n", head.trim_end().bold())
    } else {
        head
    };
    for row in rows {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
    }
    out
}

/// Join values for a table cell, or a dash when there are none
pub fn cell(values: &[String]) -> String {
    if values.is_empty() {
        EMPTY_CELL.to_string()
    } else {
        values.join(", ")
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_table_pads_columns() {
        let rows = vec![
            vec!["web".to_string(), "nginx:latest".to_string(), "Yes".to_string()],
            vec!["database".to_string(), "pg".to_string(), "No".to_string()],
        ];
        let out = format_table(&["Name", "Image", "Auto"], &rows, false);

        assert_eq!(
            out,
            "Name      Image         Auto\n\
             web       nginx:latest  Yes\n\
             database  pg            No\n"
        );
    }

    #[test]
    fn test_format_table_measures_display_width() {
        let rows = vec![vec![EMPTY_CELL.to_string(), "x".to_string()]];
        let out = format_table(&["Ports", "Env"], &rows, false);
        assert_eq!(out, "Ports  Env\n—      x\n");
    }

    #[test]
    fn test_cell() {
        assert_eq!(cell(&[]), "—");
        assert_eq!(cell(&["a".to_string(), "b".to_string()]), "a, b");
    }
}
