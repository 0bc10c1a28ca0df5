//! Reshape an extracted `result` fragment into spreadsheet-native output.

use std::sync::LazyLock;

use modelport_common::{ScalarValue, SpillValue};
use regex::Regex;

/// Row substrings of a two-dimensional fragment. Rows themselves are assumed
/// not to contain nested brackets.
static ROW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\[\]]*)\]").expect("row pattern must compile"));

/// Shape a fragment into a scalar, a 1×N row, or an R×C grid.
///
/// `[[` opens a grid, a single `[...]` opens a row, anything else is one
/// scalar. One-element arrays and 1×1 grids collapse to a bare scalar.
pub fn shape_result(fragment: &str) -> SpillValue {
    let fragment = fragment.trim();
    if fragment.starts_with("[[") {
        shape_grid(fragment)
    } else if fragment.starts_with('[') && fragment.ends_with(']') {
        shape_row(fragment)
    } else {
        SpillValue::Scalar(parse_single_value(fragment))
    }
}

fn shape_grid(fragment: &str) -> SpillValue {
    let mut rows: Vec<Vec<ScalarValue>> = Vec::new();
    let mut max_cols = 0;

    for caps in ROW_RE.captures_iter(fragment) {
        let interior = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let mut row = Vec::new();
        if !interior.trim().is_empty() {
            for part in interior.split(',').filter(|p| !p.is_empty()) {
                row.push(parse_single_value(part.trim()));
            }
        }
        max_cols = max_cols.max(row.len());
        rows.push(row);
    }

    if rows.is_empty() {
        return SpillValue::text("Error: Invalid 2D array format");
    }
    if max_cols == 0 {
        return SpillValue::text("");
    }
    if rows.len() == 1 && rows[0].len() == 1 {
        return SpillValue::Scalar(rows.into_iter().next().unwrap().into_iter().next().unwrap());
    }

    // Pad jagged rows with empty text to form a rectangle.
    for row in &mut rows {
        while row.len() < max_cols {
            row.push(ScalarValue::Text(String::new()));
        }
    }
    SpillValue::Grid(rows)
}

fn shape_row(fragment: &str) -> SpillValue {
    let interior = fragment[1..fragment.len() - 1].trim();
    if interior.is_empty() {
        return SpillValue::text("");
    }

    let mut values: Vec<ScalarValue> = interior
        .split(',')
        .filter(|p| !p.is_empty())
        .map(|p| parse_single_value(p.trim()))
        .collect();

    if values.len() == 1 {
        return SpillValue::Scalar(values.remove(0));
    }
    SpillValue::Row(values)
}

/// Parse one element: invariant float parse, else strip one layer of
/// surrounding quotes and keep the text.
pub fn parse_single_value(text: &str) -> ScalarValue {
    let trimmed = text.trim();
    if let Ok(n) = trimmed.parse::<f64>() {
        if n.is_finite() {
            return ScalarValue::Number(n);
        }
    }
    ScalarValue::Text(strip_quotes(trimmed).to_string())
}

fn strip_quotes(text: &str) -> &str {
    if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        &text[1..text.len() - 1]
    } else {
        text
    }
}
