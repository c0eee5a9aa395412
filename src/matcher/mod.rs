use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{MappingError, PersistenceError};
use crate::schema::Schema;
use crate::similarity::weighted_ratio;
use crate::store::ManualOverrideStore;

#[cfg(test)]
mod tests;

pub const DEFAULT_CUTOFF: f64 = 75.0;

#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    Overridden(String),
    FuzzyMatched { field: String, score: f64 },
    Unmatched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    Override,
    Fuzzy,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnResolution {
    pub detected: String,
    pub field: String,
    pub method: ResolutionMethod,
    pub score: Option<f64>,
}

#[derive(Debug, Default)]
pub struct ColumnMapping {
    pub columns: Vec<ColumnResolution>,
    pub persistence_failures: Vec<PersistenceError>,
}

impl ColumnMapping {
    pub fn resolutions(&self) -> BTreeMap<String, String> {
        self.columns
            .iter()
            .map(|column| (column.detected.clone(), column.field.clone()))
            .collect()
    }
}

pub trait UnmatchedResolver {
    fn resolve_unmatched(&mut self, header: &str, candidates: &[String])
    -> Result<String, MappingError>;
}

pub fn best_candidate<'a>(detected: &str, schema: &'a Schema) -> Option<(&'a str, &'a str, f64)> {
    let mut best: Option<(&str, &str, f64)> = None;
    for (key, field) in schema.string_entries() {
        let score = weighted_ratio(detected, key);
        if best.is_none_or(|(_, _, best_score)| score > best_score) {
            best = Some((key, field, score));
        }
    }
    best
}

pub fn resolve(
    detected: &str,
    schema: &Schema,
    overrides: &ManualOverrideStore,
    cutoff: f64,
) -> MatchResult {
    if let Some(field) = overrides.get(detected) {
        return MatchResult::Overridden(field);
    }

    match best_candidate(detected, schema) {
        Some((key, field, score)) if score >= cutoff => {
            debug!(detected, key, field, score, "fuzzy header match");
            MatchResult::FuzzyMatched {
                field: field.to_string(),
                score,
            }
        }
        Some((key, _, score)) => {
            debug!(detected, key, score, cutoff, "best candidate below cutoff");
            MatchResult::Unmatched
        }
        None => MatchResult::Unmatched,
    }
}

pub fn resolve_columns(
    headers: &[String],
    schema: &Schema,
    overrides: &ManualOverrideStore,
    cutoff: f64,
    resolver: &mut dyn UnmatchedResolver,
) -> Result<ColumnMapping, MappingError> {
    let candidates = schema.canonical_fields();
    let mut mapping = ColumnMapping::default();

    for header in headers {
        if mapping.columns.iter().any(|column| &column.detected == header) {
            continue;
        }

        let column = match resolve(header, schema, overrides, cutoff) {
            MatchResult::Overridden(field) => ColumnResolution {
                detected: header.clone(),
                field,
                method: ResolutionMethod::Override,
                score: None,
            },
            MatchResult::FuzzyMatched { field, score } => ColumnResolution {
                detected: header.clone(),
                field,
                method: ResolutionMethod::Fuzzy,
                score: Some(score),
            },
            MatchResult::Unmatched => {
                let choice = resolver.resolve_unmatched(header, &candidates)?;
                if !candidates.contains(&choice) {
                    return Err(MappingError::InvalidChoice {
                        header: header.clone(),
                        choice,
                    });
                }

                if let Err(err) = overrides.record(header, &choice) {
                    warn!(
                        header = %header,
                        error = %err,
                        "manual mapping not persisted; future documents will ask again"
                    );
                    mapping.persistence_failures.push(err);
                }

                ColumnResolution {
                    detected: header.clone(),
                    field: choice,
                    method: ResolutionMethod::Manual,
                    score: None,
                }
            }
        };

        mapping.columns.push(column);
    }

    info!(
        columns = mapping.columns.len(),
        manual = mapping
            .columns
            .iter()
            .filter(|column| column.method == ResolutionMethod::Manual)
            .count(),
        "resolved headers"
    );

    Ok(mapping)
}

#[derive(Debug, Default)]
pub struct ScriptedResolver {
    answers: BTreeMap<String, String>,
}

impl ScriptedResolver {
    pub fn new(answers: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
        }
    }
}

impl UnmatchedResolver for ScriptedResolver {
    fn resolve_unmatched(
        &mut self,
        header: &str,
        _candidates: &[String],
    ) -> Result<String, MappingError> {
        self.answers
            .get(header)
            .cloned()
            .ok_or_else(|| MappingError::Unresolved {
                header: header.to_string(),
                reason: "no --assign given for this header".to_string(),
            })
    }
}
