// src/exec/template.rs

//! `{{nodeId}}` placeholder substitution for node prompts.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::exec::ParentResults;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([^{}\s]+)\s*\}\}").expect("placeholder regex is valid")
});

/// Replace every `{{parentId}}` in `template` with that parent's result.
///
/// Placeholders naming an id that is not among `parent_results` are left
/// untouched.
pub fn render_prompt<'t>(template: &'t str, parent_results: &ParentResults) -> Cow<'t, str> {
    PLACEHOLDER.replace_all(template, |caps: &Captures<'_>| {
        match parent_results.get(&caps[1]) {
            Some(result) => result.clone(),
            None => caps[0].to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn results(pairs: &[(&str, &str)]) -> ParentResults {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn substitutes_all_occurrences() {
        let parents = results(&[("a", "alpha"), ("b", "beta")]);
        assert_eq!(
            render_prompt("{{a}} and {{ b }} then {{a}}", &parents),
            "alpha and beta then alpha"
        );
    }

    #[test]
    fn leaves_unknown_placeholders_alone() {
        let parents = results(&[("a", "alpha")]);
        assert_eq!(render_prompt("{{a}} {{zzz}}", &parents), "alpha {{zzz}}");
        assert!(matches!(render_prompt("plain", &parents), Cow::Borrowed(_)));
    }
}
