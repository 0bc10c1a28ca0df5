//! Cell-value serialization: one JSON fragment per parameter, concatenated
//! into the canonical `{"data": {...}}` request body.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use modelport_common::{CellValue, format_number, serial_to_datetime};
use modelport_spec::{ParamKind, ParameterSpec};

/// Serialize one argument against its inferred parameter spec.
///
/// Precedence: blank/error cells become `null`; declared-array parameters
/// flatten range references with blank/error elements elided; degenerate
/// 1×1 ranges unwrap to their scalar; scalars dispatch on the spec's kind.
pub fn serialize_param(value: &CellValue, spec: &ParameterSpec) -> String {
    if value.is_blank_or_error() {
        return "null".to_string();
    }

    if spec.is_array {
        match value {
            CellValue::Row(cells) => return serialize_vector(cells, spec.kind),
            CellValue::Grid(rows) => return serialize_grid(rows, spec.kind),
            _ => {}
        }
    }

    let single = value.as_single();
    if single.is_blank_or_error() {
        return "null".to_string();
    }
    serialize_scalar(single, spec.kind)
}

/// Build the full request body in parameter order.
///
/// Missing trailing arguments are treated as blank cells; extra arguments
/// are ignored. Parameter names are emitted verbatim as JSON keys.
pub fn build_request_body(args: &[CellValue], specs: &[ParameterSpec]) -> String {
    let empty = CellValue::Empty;
    let mut body = String::from("{\"data\": {");
    for (i, spec) in specs.iter().enumerate() {
        if i > 0 {
            body.push_str(", ");
        }
        let value = args.get(i).unwrap_or(&empty);
        body.push('"');
        body.push_str(&spec.name);
        body.push_str("\": ");
        body.push_str(&serialize_param(value, spec));
    }
    body.push_str("}}");
    body
}

fn serialize_vector(cells: &[CellValue], kind: ParamKind) -> String {
    serialize_elements(cells.iter(), kind)
}

/// Grids flatten row-major into a single array dimension; elements are
/// always scalars of the parameter's kind, never nested arrays.
fn serialize_grid(rows: &[Vec<CellValue>], kind: ParamKind) -> String {
    serialize_elements(rows.iter().flatten(), kind)
}

fn serialize_elements<'a, I>(cells: I, kind: ParamKind) -> String
where
    I: IntoIterator<Item = &'a CellValue>,
{
    let mut out = String::from("[");
    let mut appended = false;
    for cell in cells {
        if cell.is_blank_or_error() {
            continue;
        }
        if appended {
            out.push(',');
        }
        out.push_str(&serialize_element(cell, kind));
        appended = true;
    }
    out.push(']');
    out
}

/// Array elements of Number kind round-trip through invariant string form
/// before the generic value serialization, so numeric text re-parses to a
/// bare number and anything unparseable degrades to a JSON string.
fn serialize_element(cell: &CellValue, kind: ParamKind) -> String {
    match kind {
        ParamKind::Number => serialize_number_text(&display_text(cell)),
        _ => serialize_scalar(cell, kind),
    }
}

fn serialize_scalar(value: &CellValue, kind: ParamKind) -> String {
    match kind {
        ParamKind::String => format!("\"{}\"", escape_json_string(&display_text(value))),
        ParamKind::Date => format!("\"{}\"", escape_json_string(&format_date_value(value))),
        ParamKind::Bool => serialize_bool(value),
        ParamKind::Number => serialize_number(value),
    }
}

/// Escape only `\` and `"`. Control characters pass through; callers must
/// not assume full JSON-string compliance.
fn escape_json_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn display_text(value: &CellValue) -> String {
    match value {
        CellValue::Text(s) => s.clone(),
        CellValue::Number(n) => format_number(*n),
        other => other.to_string(),
    }
}

/// Bool coercion never fails: nonzero numbers are true, `"true"`/`"false"`
/// match case-insensitively, numeric-looking text takes its truthiness,
/// anything else is false.
fn serialize_bool(value: &CellValue) -> String {
    let b = match value {
        CellValue::Bool(b) => *b,
        CellValue::Number(n) => *n != 0.0,
        CellValue::Text(s) => {
            let t = s.trim();
            if t.eq_ignore_ascii_case("true") {
                true
            } else if t.eq_ignore_ascii_case("false") {
                false
            } else if let Ok(n) = t.parse::<f64>() {
                n != 0.0
            } else {
                false
            }
        }
        _ => false,
    };
    (if b { "true" } else { "false" }).to_string()
}

fn serialize_number(value: &CellValue) -> String {
    match value {
        CellValue::Number(n) if n.is_finite() => format_number(*n),
        CellValue::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
        CellValue::Text(s) => serialize_number_text(s),
        other => format!("\"{}\"", escape_json_string(&display_text(other))),
    }
}

/// Numeric text re-parses and reformats invariantly; non-numeric text falls
/// back to a JSON string rather than failing.
fn serialize_number_text(text: &str) -> String {
    match text.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => format_number(n),
        _ => format!("\"{}\"", escape_json_string(text)),
    }
}

/// Format a date-kind value to `YYYY-MM-DD`.
///
/// Numbers are interpreted, in order: epoch milliseconds (≥ 1e12), epoch
/// seconds (≥ 1e9), spreadsheet serial days. Text that itself parses as a
/// date reuses its components; anything else passes through unchanged.
/// Malformed dates are the model's problem to reject, not ours to drop.
pub fn format_date_value(value: &CellValue) -> String {
    match value {
        CellValue::Number(n) => format_date_from_number(*n),
        CellValue::Text(s) => {
            let t = s.trim();
            if t.is_empty() {
                return String::new();
            }
            if let Ok(n) = t.parse::<f64>() {
                if n.is_finite() {
                    return format_date_from_number(n);
                }
            }
            if let Some(date) = parse_date_text(t) {
                return date.format("%Y-%m-%d").to_string();
            }
            t.to_string()
        }
        CellValue::Empty | CellValue::Error(_) => String::new(),
        other => other.to_string(),
    }
}

fn format_date_from_number(value: f64) -> String {
    if value >= 1e12 {
        if let Some(dt) = DateTime::from_timestamp_millis(value.round() as i64) {
            return dt.date_naive().format("%Y-%m-%d").to_string();
        }
    } else if value >= 1e9 {
        if let Some(dt) = DateTime::from_timestamp(value.round() as i64, 0) {
            return dt.date_naive().format("%Y-%m-%d").to_string();
        }
    } else if let Some(dt) = serial_to_datetime(value) {
        return dt.date().format("%Y-%m-%d").to_string();
    }
    // Out-of-range for every interpretation: emit the raw number.
    format_number(value)
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    for fmt in ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(text, fmt) {
            return Some(d);
        }
    }
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt.date());
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelport_common::CellError;

    fn spec(kind: ParamKind, is_array: bool) -> ParameterSpec {
        ParameterSpec {
            name: "x".to_string(),
            kind,
            is_array,
            example: None,
        }
    }

    #[test]
    fn blank_and_error_cells_are_null() {
        assert_eq!(serialize_param(&CellValue::Empty, &spec(ParamKind::Bool, false)), "null");
        assert_eq!(
            serialize_param(&CellValue::Error(CellError::Na), &spec(ParamKind::Number, false)),
            "null"
        );
        // A 1x1 range holding a blank is still null.
        let grid = CellValue::Grid(vec![vec![CellValue::Empty]]);
        assert_eq!(serialize_param(&grid, &spec(ParamKind::String, false)), "null");
    }

    #[test]
    fn string_escaping_is_minimal() {
        let value = CellValue::Text(r#"path\to "x""#.to_string());
        assert_eq!(
            serialize_param(&value, &spec(ParamKind::String, false)),
            r#""path\\to \"x\"""#
        );
    }

    #[test]
    fn number_scalars_and_fallbacks() {
        assert_eq!(serialize_param(&CellValue::Number(85000.0), &spec(ParamKind::Number, false)), "85000");
        assert_eq!(
            serialize_param(&CellValue::Text(" 35.05 ".to_string()), &spec(ParamKind::Number, false)),
            "35.05"
        );
        assert_eq!(
            serialize_param(&CellValue::Text("n/a".to_string()), &spec(ParamKind::Number, false)),
            "\"n/a\""
        );
        assert_eq!(serialize_param(&CellValue::Bool(true), &spec(ParamKind::Number, false)), "1");
    }

    #[test]
    fn bool_coercions_never_fail() {
        let s = spec(ParamKind::Bool, false);
        assert_eq!(serialize_param(&CellValue::Bool(false), &s), "false");
        assert_eq!(serialize_param(&CellValue::Number(2.0), &s), "true");
        assert_eq!(serialize_param(&CellValue::Number(0.0), &s), "false");
        assert_eq!(serialize_param(&CellValue::Text("TRUE".to_string()), &s), "true");
        assert_eq!(serialize_param(&CellValue::Text("False".to_string()), &s), "false");
        assert_eq!(serialize_param(&CellValue::Text("0.0".to_string()), &s), "false");
        assert_eq!(serialize_param(&CellValue::Text("7".to_string()), &s), "true");
        assert_eq!(serialize_param(&CellValue::Text("maybe".to_string()), &s), "false");
    }

    #[test]
    fn arrays_elide_blanks_and_errors() {
        let row = CellValue::Row(vec![
            CellValue::Number(5.0),
            CellValue::Empty,
            CellValue::Number(7.0),
        ]);
        assert_eq!(serialize_param(&row, &spec(ParamKind::Number, true)), "[5,7]");

        // Grids flatten row-major; elided cells shorten the array.
        let grid = CellValue::Grid(vec![
            vec![CellValue::Number(1.0), CellValue::Error(CellError::Div)],
            vec![CellValue::Number(3.0), CellValue::Number(4.0)],
        ]);
        assert_eq!(serialize_param(&grid, &spec(ParamKind::Number, true)), "[1,3,4]");
    }

    #[test]
    fn single_column_grid_is_one_dimension() {
        let grid = CellValue::Grid(vec![
            vec![CellValue::Number(1.0)],
            vec![CellValue::Empty],
            vec![CellValue::Number(3.0)],
        ]);
        assert_eq!(serialize_param(&grid, &spec(ParamKind::Number, true)), "[1,3]");
    }

    #[test]
    fn number_array_elements_round_trip_through_text() {
        let row = CellValue::Row(vec![
            CellValue::Text("5".to_string()),
            CellValue::Text("oops".to_string()),
        ]);
        assert_eq!(serialize_param(&row, &spec(ParamKind::Number, true)), "[5,\"oops\"]");
    }

    #[test]
    fn string_array_elements_stay_strings() {
        let row = CellValue::Row(vec![
            CellValue::Text("1M".to_string()),
            CellValue::Text("3M".to_string()),
        ]);
        assert_eq!(
            serialize_param(&row, &spec(ParamKind::String, true)),
            "[\"1M\",\"3M\"]"
        );
    }

    #[test]
    fn scalar_with_array_spec_stays_scalar() {
        assert_eq!(serialize_param(&CellValue::Number(5.0), &spec(ParamKind::Number, true)), "5");
    }

    #[test]
    fn one_by_one_range_unwraps_for_scalar_specs() {
        let grid = CellValue::Grid(vec![vec![CellValue::Number(42.0)]]);
        assert_eq!(serialize_param(&grid, &spec(ParamKind::Number, false)), "42");
    }

    #[test]
    fn date_from_serial_and_text_agree() {
        let from_serial = serialize_param(&CellValue::Number(45000.0), &spec(ParamKind::Date, false));
        let from_text = serialize_param(
            &CellValue::Text("2023-03-15".to_string()),
            &spec(ParamKind::Date, false),
        );
        assert_eq!(from_serial, "\"2023-03-15\"");
        assert_eq!(from_serial, from_text);
    }

    #[test]
    fn date_epoch_interpretations() {
        // 2023-03-15T00:00:00Z in epoch seconds and milliseconds.
        assert_eq!(format_date_value(&CellValue::Number(1678838400.0)), "2023-03-15");
        assert_eq!(format_date_value(&CellValue::Number(1678838400000.0)), "2023-03-15");
        // Numeric text goes through the same ladder.
        assert_eq!(
            format_date_value(&CellValue::Text("1678838400".to_string())),
            "2023-03-15"
        );
    }

    #[test]
    fn date_text_passthrough() {
        assert_eq!(
            format_date_value(&CellValue::Text("2023/03/15".to_string())),
            "2023-03-15"
        );
        assert_eq!(
            format_date_value(&CellValue::Text("2023-03-15T10:30:00".to_string())),
            "2023-03-15"
        );
        assert_eq!(
            format_date_value(&CellValue::Text("next tuesday".to_string())),
            "next tuesday"
        );
    }

    #[test]
    fn request_body_shape() {
        let specs = vec![
            ParameterSpec {
                name: "age".to_string(),
                kind: ParamKind::Number,
                is_array: false,
                example: None,
            },
            ParameterSpec {
                name: "income".to_string(),
                kind: ParamKind::Number,
                is_array: false,
                example: None,
            },
        ];
        let args = vec![CellValue::Number(35.0), CellValue::Number(85000.0)];
        assert_eq!(
            build_request_body(&args, &specs),
            r#"{"data": {"age": 35, "income": 85000}}"#
        );
        // Missing trailing arguments serialize as null.
        assert_eq!(
            build_request_body(&args[..1], &specs),
            r#"{"data": {"age": 35, "income": null}}"#
        );
    }
}
