//! Plain-text table rendering and ES/AR number formatting

/// Decimal places used for currency and percentage cells
pub const DEFAULT_DECIMALS: usize = 2;

/// Render an aligned, pipe-delimited table.
///
/// Column width is the widest of the header and every cell, measured in chars
/// on the already formatted strings.
pub fn render(headers: &[&str], rows: &[Vec<String>]) -> String {
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.chars().count())
                .fold(h.chars().count(), usize::max)
        })
        .collect();

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(render_line(headers.iter().copied(), &widths));
    lines.push(format!(
        "| {} |",
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join(" | ")
    ));
    for row in rows {
        let cells = (0..headers.len()).map(|i| row.get(i).map(String::as_str).unwrap_or(""));
        lines.push(render_line(cells, &widths));
    }

    lines.join("\n")
}

fn render_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = width))
        .collect();
    format!("| {} |", padded.join(" | "))
}

/// Format an amount as ES/AR currency: 1234567.8 → "$ 1.234.567,80"
///
/// Non-finite values fall back to their plain string form.
pub fn format_currency(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    format!("$ {}", swap_separators(&format_grouped(value, decimals)))
}

/// Format a ratio as ES/AR percentage: 0.1 → "10,00 %"
pub fn format_percent(value: f64, decimals: usize) -> String {
    let scaled = value * 100.0;
    if !scaled.is_finite() {
        return value.to_string();
    }
    format!("{} %", swap_separators(&format_grouped(scaled, decimals)))
}

/// Invariant rendering with `,` thousands and `.` decimal: "1,234,567.80"
fn format_grouped(value: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, value);
    let (sign, unsigned) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let len = int_part.len();
    let mut grouped = String::with_capacity(len + len / 3 + decimals + 2);
    grouped.push_str(sign);
    // Digits are ASCII, so byte indexing is safe
    for (i, ch) in int_part.bytes().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch as char);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}

/// Swap invariant separators to the ES/AR convention
fn swap_separators(invariant: &str) -> String {
    invariant
        .chars()
        .map(|c| match c {
            ',' => '.',
            '.' => ',',
            other => other,
        })
        .collect()
}
