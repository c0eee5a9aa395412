use std::collections::BTreeMap;

use super::*;
use crate::store::{ManualOverrideStore, MemoryStore};

struct RecordingResolver {
    answer: String,
    asked: Vec<(String, Vec<String>)>,
}

impl UnmatchedResolver for RecordingResolver {
    fn resolve_unmatched(
        &mut self,
        header: &str,
        candidates: &[String],
    ) -> Result<String, MappingError> {
        self.asked.push((header.to_string(), candidates.to_vec()));
        Ok(self.answer.clone())
    }
}

fn headers(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_string()).collect()
}

#[test]
fn typo_fuzzy_matches_account_number() {
    let schema = Schema::from_pairs([("खाता संख्या", "account_number")]);
    let overrides = ManualOverrideStore::in_memory();

    match resolve("खाता संख्यय", &schema, &overrides, DEFAULT_CUTOFF) {
        MatchResult::FuzzyMatched { field, score } => {
            assert_eq!(field, "account_number");
            assert!(score >= DEFAULT_CUTOFF);
        }
        other => panic!("expected fuzzy match, got {other:?}"),
    }
}

#[test]
fn exact_header_scores_one_hundred() {
    let schema = Schema::builtin_default();
    let overrides = ManualOverrideStore::in_memory();
    assert_eq!(
        resolve("रकबा", &schema, &overrides, DEFAULT_CUTOFF),
        MatchResult::FuzzyMatched {
            field: "area".to_string(),
            score: 100.0,
        }
    );
}

#[test]
fn unrelated_header_is_unmatched() {
    let schema = Schema::builtin_default();
    let overrides = ManualOverrideStore::in_memory();
    assert_eq!(
        resolve("फसल", &schema, &overrides, DEFAULT_CUTOFF),
        MatchResult::Unmatched
    );
}

#[test]
fn empty_schema_leaves_everything_unmatched() {
    let overrides = ManualOverrideStore::in_memory();
    assert_eq!(
        resolve("खाता संख्या", &Schema::default(), &overrides, DEFAULT_CUTOFF),
        MatchResult::Unmatched
    );
}

#[test]
fn override_wins_over_perfect_fuzzy_match() {
    let schema = Schema::builtin_default();
    let overrides = ManualOverrideStore::in_memory();
    overrides
        .record("खाता संख्या", "khata_id")
        .expect("memory write");

    for schema in [schema, Schema::default()] {
        assert_eq!(
            resolve("खाता संख्या", &schema, &overrides, 100.0),
            MatchResult::Overridden("khata_id".to_string())
        );
    }
}

#[test]
fn resolve_is_idempotent() {
    let schema = Schema::builtin_default();
    let overrides = ManualOverrideStore::in_memory();
    for header in ["खाता संख्यय", "खेवट", "साझीदार का नाम"] {
        let first = resolve(header, &schema, &overrides, DEFAULT_CUTOFF);
        let second = resolve(header, &schema, &overrides, DEFAULT_CUTOFF);
        assert_eq!(first, second);
    }
}

#[test]
fn ties_keep_the_earliest_schema_key() {
    let schema = Schema::from_pairs([("रकबा१", "area"), ("रकबा२", "area_alt")]);
    let (key, field, score) = best_candidate("रकबा", &schema).expect("candidate");
    assert_eq!(key, "रकबा१");
    assert_eq!(field, "area");
    assert_eq!(score, weighted_ratio("रकबा", "रकबा२"));
}

#[test]
fn unmatched_headers_are_asked_once_and_persisted() {
    let schema = Schema::builtin_default();
    let overrides = ManualOverrideStore::in_memory();
    let mut resolver = RecordingResolver {
        answer: "category".to_string(),
        asked: Vec::new(),
    };

    let mapping = resolve_columns(
        &headers(&["खाता संख्या", "फसल", "फसल"]),
        &schema,
        &overrides,
        DEFAULT_CUTOFF,
        &mut resolver,
    )
    .expect("mapping");

    assert_eq!(resolver.asked.len(), 1);
    assert_eq!(resolver.asked[0].0, "फसल");
    assert_eq!(resolver.asked[0].1, schema.canonical_fields());

    assert_eq!(mapping.columns.len(), 2);
    assert_eq!(mapping.columns[0].method, ResolutionMethod::Fuzzy);
    assert_eq!(mapping.columns[1].method, ResolutionMethod::Manual);
    assert_eq!(overrides.get("फसल").as_deref(), Some("category"));
    assert!(mapping.persistence_failures.is_empty());

    let again = resolve_columns(
        &headers(&["फसल"]),
        &schema,
        &overrides,
        DEFAULT_CUTOFF,
        &mut resolver,
    )
    .expect("second mapping");
    assert_eq!(resolver.asked.len(), 1);
    assert_eq!(again.columns[0].method, ResolutionMethod::Override);
}

#[test]
fn choice_outside_candidates_is_rejected() {
    let schema = Schema::builtin_default();
    let overrides = ManualOverrideStore::in_memory();
    let mut resolver = ScriptedResolver::new([("फसल".to_string(), "crop".to_string())]);

    let err = resolve_columns(
        &headers(&["फसल"]),
        &schema,
        &overrides,
        DEFAULT_CUTOFF,
        &mut resolver,
    )
    .expect_err("crop is not a canonical field of the default schema");

    assert!(matches!(err, MappingError::InvalidChoice { .. }));
    assert!(overrides.is_empty());
}

#[test]
fn scripted_resolver_without_answer_fails() {
    let mut resolver = ScriptedResolver::default();
    let err = resolver
        .resolve_unmatched("फसल", &["area".to_string()])
        .expect_err("no answer");
    assert!(matches!(err, MappingError::Unresolved { .. }));
}

#[test]
fn persistence_failure_keeps_mapping_usable() {
    let schema = Schema::builtin_default();
    let overrides =
        ManualOverrideStore::load(Box::new(MemoryStore::failing())).expect("empty store");
    let mut resolver = ScriptedResolver::new([("फसल".to_string(), "area".to_string())]);

    let mapping = resolve_columns(
        &headers(&["फसल"]),
        &schema,
        &overrides,
        DEFAULT_CUTOFF,
        &mut resolver,
    )
    .expect("mapping still produced");

    assert_eq!(mapping.persistence_failures.len(), 1);
    let expected = BTreeMap::from([("फसल".to_string(), "area".to_string())]);
    assert_eq!(mapping.resolutions(), expected);
}
