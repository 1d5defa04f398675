use crate::model::{Record, RenderGroup};

/// Join the present fields with `sep`. Returns `None` when no field is present,
/// so a line with nothing to show is absent rather than an empty string.
fn join_present(fields: &[&Option<String>], sep: &str) -> Option<String> {
    let mut line = String::new();
    for value in fields.iter().filter_map(|f| f.as_deref()) {
        if value.is_empty() {
            continue;
        }
        if !line.is_empty() {
            line.push_str(sep);
        }
        line.push_str(value);
    }
    (!line.is_empty()).then_some(line)
}

/// Build the display lines for one record:
///
/// - demographics: `"{age} {population} {sex}"`
/// - disease: `"with {disease}"`
/// - names: `"{name}; {synonyms}; {tissue_of_origin}"`
///
/// Separators are emitted only between fields that are present.
pub fn compose_group(record: &Record) -> RenderGroup {
    RenderGroup {
        demographics: join_present(&[&record.age, &record.population, &record.sex], " "),
        disease: record
            .disease
            .as_deref()
            .filter(|d| !d.is_empty())
            .map(|d| format!("with {d}")),
        names: join_present(
            &[&record.name, &record.synonyms, &record.tissue_of_origin],
            "; ",
        ),
    }
}

pub fn compose_groups(records: &[Record]) -> Vec<RenderGroup> {
    records.iter().map(compose_group).collect()
}

/// Replace every space that does not follow a semicolon with a no-break
/// space, so a names line can only wrap between its `;`-separated parts.
pub fn keep_names_together(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut prev = None;
    for ch in line.chars() {
        if ch == ' ' && prev != Some(';') {
            out.push('\u{00A0}');
        } else {
            out.push(ch);
        }
        prev = Some(ch);
    }
    out
}
