//! Client-side search filters.

use std::collections::HashMap;

use serde_json::Value;

use super::fields::{pick_first, value_text};

/// Company filter value meaning "no company filter".
pub const ALL_COMPANIES: &str = "all";
/// Keys a row may use to reference its mould.
pub const MOULD_REF_KEYS: [&str; 3] = ["mould_id", "mould", "mould_pk"];

/// Lower-cased, trimmed search term; `None` when blank.
pub fn normalize_term(term: &str) -> Option<String> {
    let term = term.trim().to_lowercase();
    (!term.is_empty()).then_some(term)
}

/// Whether any of `fields` contains `term` (already normalized).
pub fn row_matches(row: &Value, fields: &[&str], term: &str) -> bool {
    fields.iter().any(|field| {
        row.get(*field)
            .map(value_text)
            .is_some_and(|text| text.to_lowercase().contains(term))
    })
}

/// Keep rows whose `fields` contain `term`, case-insensitively.
pub fn search<'a>(rows: &'a [Value], fields: &[&str], term: &str) -> Vec<&'a Value> {
    match normalize_term(term) {
        None => rows.iter().collect(),
        Some(term) => rows
            .iter()
            .filter(|row| row_matches(row, fields, &term))
            .collect(),
    }
}

/// Distinct companies present in `moulds`, led by [`ALL_COMPANIES`].
pub fn companies(moulds: &[Value]) -> Vec<String> {
    let mut out = vec![ALL_COMPANIES.to_string()];
    for company in moulds
        .iter()
        .filter_map(|mould| mould.get("company").and_then(Value::as_str))
        .filter(|company| !company.is_empty())
    {
        if !out.iter().any(|seen| seen == company) {
            out.push(company.to_string());
        }
    }
    out
}

/// Mould list filter: term over number/product plus an exact company match.
pub fn filter_moulds<'a>(moulds: &'a [Value], term: &str, company: &str) -> Vec<&'a Value> {
    let term = normalize_term(term);
    moulds
        .iter()
        .filter(|mould| {
            term.as_deref()
                .is_none_or(|term| row_matches(mould, &["product", "mould_number"], term))
        })
        .filter(|mould| {
            company == ALL_COMPANIES
                || mould.get("company").and_then(Value::as_str) == Some(company)
        })
        .collect()
}

/// Moulds keyed by the text form of their id, for resolving references.
#[derive(Debug, Default)]
pub struct MouldIndex<'a> {
    by_id: HashMap<String, &'a Value>,
}

impl<'a> MouldIndex<'a> {
    pub fn new(moulds: &'a [Value]) -> Self {
        let by_id = moulds
            .iter()
            .filter_map(|mould| mould.get("id").map(|id| (value_text(id), mould)))
            .collect();
        Self { by_id }
    }

    pub fn get(&self, id: &Value) -> Option<&'a Value> {
        self.by_id.get(&value_text(id)).copied()
    }

    /// Mould referenced by `row` through any of [`MOULD_REF_KEYS`].
    pub fn referenced_by(&self, row: &Value) -> Option<&'a Value> {
        pick_first(row, &MOULD_REF_KEYS).and_then(|id| self.get(id))
    }
}

/// Keep rows whose referenced mould's number or product contains `term`.
///
/// Rows without a resolvable mould never match a non-blank term.
pub fn search_by_mould<'r>(rows: &'r [Value], index: &MouldIndex<'_>, term: &str) -> Vec<&'r Value> {
    let Some(term) = normalize_term(term) else {
        return rows.iter().collect();
    };
    rows.iter()
        .filter(|row| {
            index
                .referenced_by(row)
                .is_some_and(|mould| row_matches(mould, &["mould_number", "product"], &term))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn moulds() -> Vec<Value> {
        vec![
            json!({"id": 1, "mould_number": "F-100", "product": "Cap 28mm", "company": "Acme"}),
            json!({"id": 2, "mould_number": "F-200", "product": "Bottle 1L", "company": "Beta"}),
            json!({"id": "3", "mould_number": "X-300", "product": "Cap 38mm", "company": "Acme"}),
        ]
    }

    #[test]
    fn mould_filter_combines_term_and_company() {
        let moulds = moulds();
        assert_eq!(filter_moulds(&moulds, " cap ", ALL_COMPANIES).len(), 2);
        assert_eq!(filter_moulds(&moulds, "f-", "Acme").len(), 1);
        assert_eq!(filter_moulds(&moulds, "", "Beta").len(), 1);
        assert_eq!(companies(&moulds), vec!["all", "Acme", "Beta"]);
    }

    #[test]
    fn tickets_resolve_moulds_by_reference() {
        let moulds = moulds();
        let index = MouldIndex::new(&moulds);
        let tickets = vec![
            json!({"id": 10, "mould_id": 3}),
            json!({"id": 11, "mould": "2"}),
            json!({"id": 12}),
        ];
        let hits = search_by_mould(&tickets, &index, "CAP");
        assert_eq!(hits, vec![&tickets[0]]);
        assert_eq!(search_by_mould(&tickets, &index, "bottle"), vec![&tickets[1]]);
        assert_eq!(search_by_mould(&tickets, &index, "  ").len(), 3);
    }

    #[test]
    fn generic_search_is_case_insensitive() {
        let rows = vec![json!({"note": "Leak on Line 4"}), json!({"note": 44})];
        assert_eq!(search(&rows, &["note"], "LINE").len(), 1);
        assert_eq!(search(&rows, &["note"], "4").len(), 2);
    }
}
