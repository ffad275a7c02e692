//! Variant matcher.
//!
//! For every clinical record, narrows the annotation candidates step by step
//! until one remains:
//! 1. Same `Feature`
//! 2. Same `Existing_variation` (only if more than one candidate is left)
//! 3. Same `Codons` (only if more than one candidate is left)
//! 4. Fewest missing cells, first one wins on ties
//!
//! A record whose candidate set becomes empty is written to the unmatched log.

use crate::runtime::unmatched_log::UnmatchedLog;
use crate::runtime::PipelineError;
use crate::table::{is_missing, Row, Table};
use std::collections::HashMap;
use std::fmt;
use std::io::Write;

/// Column names of the keys compared between the two tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchKeys {
    pub feature: String,
    pub existing_variation: String,
    pub codons: String,
}

impl Default for MatchKeys {
    fn default() -> Self {
        Self {
            feature: "Feature".to_string(),
            existing_variation: "Existing_variation".to_string(),
            codons: "Codons".to_string(),
        }
    }
}

impl MatchKeys {
    fn as_slice(&self) -> [&str; 3] {
        [
            self.feature.as_str(),
            self.existing_variation.as_str(),
            self.codons.as_str(),
        ]
    }
}

/// The narrowing step at which a record was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchStage {
    Feature,
    ExistingVariation,
    Codons,
    TieBreak,
}

impl fmt::Display for MatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStage::Feature => write!(f, "feature"),
            MatchStage::ExistingVariation => write!(f, "existing variation"),
            MatchStage::Codons => write!(f, "codons"),
            MatchStage::TieBreak => write!(f, "NA-count tie-break"),
        }
    }
}

/// Result of matching one clinical record.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome<'a> {
    Matched { annotation: &'a Row, stage: MatchStage },
    Unmatched { stage: MatchStage },
}

/// Key equality: both values present and identical. Missing never matches.
fn keys_equal(left: Option<&str>, right: Option<&str>) -> bool {
    match (left, right) {
        (Some(l), Some(r)) => !is_missing(l) && !is_missing(r) && l == r,
        _ => false,
    }
}

/// Keep the candidates whose `column` equals the clinical record's.
fn narrow<'a>(candidates: Vec<&'a Row>, clinical: &Row, column: &str) -> Vec<&'a Row> {
    let wanted = clinical.get(column);
    candidates
        .into_iter()
        .filter(|candidate| keys_equal(wanted, candidate.get(column)))
        .collect()
}

/// Pick the candidate with the fewest missing cells; earliest wins ties.
fn break_tie<'a>(mut candidates: Vec<&'a Row>) -> Option<&'a Row> {
    // stable sort keeps input order among equal counts
    candidates.sort_by_key(|row| row.missing_count());
    candidates.into_iter().next()
}

/// Run the cascade for one clinical record over its `Feature` candidates.
///
/// `candidates` must be the annotation rows sharing the record's `Feature`,
/// in annotation-table order.
pub fn select_candidate<'a>(
    clinical: &Row,
    candidates: Vec<&'a Row>,
    keys: &MatchKeys,
) -> MatchOutcome<'a> {
    let stages = [
        (MatchStage::ExistingVariation, keys.existing_variation.as_str()),
        (MatchStage::Codons, keys.codons.as_str()),
    ];

    let mut candidates = candidates;
    let mut stage = MatchStage::Feature;

    for (next_stage, column) in stages {
        match candidates.len() {
            0 => return MatchOutcome::Unmatched { stage },
            1 => {
                return MatchOutcome::Matched {
                    annotation: candidates[0],
                    stage,
                }
            }
            _ => {
                candidates = narrow(candidates, clinical, column);
                stage = next_stage;
            }
        }
    }

    match candidates.len() {
        0 => MatchOutcome::Unmatched { stage },
        1 => MatchOutcome::Matched {
            annotation: candidates[0],
            stage,
        },
        _ => match break_tie(candidates) {
            Some(annotation) => MatchOutcome::Matched {
                annotation,
                stage: MatchStage::TieBreak,
            },
            None => MatchOutcome::Unmatched {
                stage: MatchStage::TieBreak,
            },
        },
    }
}

/// Counters for a matcher run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchStats {
    /// Clinical records examined
    pub processed: usize,
    pub matched: usize,
    pub unmatched: usize,
    /// Matches decided after the `Feature` step
    pub by_feature: usize,
    /// Matches decided after the `Existing_variation` step
    pub by_existing_variation: usize,
    /// Matches decided after the `Codons` step
    pub by_codons: usize,
    /// Matches decided by the NA-count tie-break
    pub by_tie_break: usize,
}

impl MatchStats {
    fn record_match(&mut self, stage: MatchStage) {
        self.matched += 1;
        match stage {
            MatchStage::Feature => self.by_feature += 1,
            MatchStage::ExistingVariation => self.by_existing_variation += 1,
            MatchStage::Codons => self.by_codons += 1,
            MatchStage::TieBreak => self.by_tie_break += 1,
        }
    }
}

/// Output of a matcher run.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchReport {
    /// One row per matched clinical record, in clinical order
    pub merged: Table,
    /// Positions of clinical records that found no annotation, in clinical order
    pub unmatched: Vec<usize>,
    pub stats: MatchStats,
}

#[derive(Debug, Clone, Default)]
pub struct VariantMatcher {
    keys: MatchKeys,
}

impl VariantMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Match every clinical record against the annotation table.
    ///
    /// Unmatched records are written to `log` as they are found.
    ///
    /// # Errors
    /// Fails before processing any record if a key column is missing from
    /// either table, or if writing the log fails.
    pub fn run<W: Write>(
        &self,
        clinical: &Table,
        annotations: &Table,
        log: &mut UnmatchedLog<W>,
    ) -> Result<MatchReport, PipelineError> {
        let keys = self.keys.as_slice();
        clinical.require_columns(&keys, "clinical table")?;
        annotations.require_columns(&keys, "annotation table")?;

        let mut by_feature: HashMap<&str, Vec<&Row>> = HashMap::new();
        for row in annotations.rows() {
            if let Some(feature) = row.get(&self.keys.feature) {
                if !is_missing(feature) {
                    by_feature.entry(feature).or_default().push(row);
                }
            }
        }

        let mut columns = clinical.columns().to_vec();
        for column in annotations.columns() {
            if !clinical.has_column(column) {
                columns.push(column.clone());
            }
        }

        let mut merged = Table::new(columns);
        let mut unmatched = Vec::new();
        let mut stats = MatchStats::default();

        for record in clinical.rows() {
            stats.processed += 1;

            let candidates = record
                .get(&self.keys.feature)
                .filter(|feature| !is_missing(feature))
                .and_then(|feature| by_feature.get(feature))
                .cloned()
                .unwrap_or_default();

            match select_candidate(record, candidates, &self.keys) {
                MatchOutcome::Matched { annotation, stage } => {
                    tracing::debug!(
                        "Row {} matched annotation row {} at {} step",
                        record.position(),
                        annotation.position(),
                        stage
                    );
                    stats.record_match(stage);
                    merged.push_row(record.merged_with(annotation));
                }
                MatchOutcome::Unmatched { stage } => {
                    tracing::debug!(
                        "Row {} has no annotation after {} step",
                        record.position(),
                        stage
                    );
                    stats.unmatched += 1;
                    unmatched.push(record.position());
                    log.record(record.position())?;
                }
            }
        }

        log.flush()?;

        tracing::info!(
            "Matched {} of {} clinical records ({} unmatched)",
            stats.matched,
            stats.processed,
            stats.unmatched
        );

        Ok(MatchReport {
            merged,
            unmatched,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn row(position: usize, pairs: &[(&str, &str)]) -> Row {
        let fields: IndexMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Row::new(position, fields)
    }

    fn annotation(position: usize, existing: &str, codons: &str, score: &str) -> Row {
        row(
            position,
            &[
                ("Feature", "ENST1"),
                ("Existing_variation", existing),
                ("Codons", codons),
                ("REVEL_score", score),
            ],
        )
    }

    fn clinical(existing: &str, codons: &str) -> Row {
        row(
            0,
            &[
                ("Feature", "ENST1"),
                ("Existing_variation", existing),
                ("Codons", codons),
            ],
        )
    }

    #[test]
    fn test_single_feature_candidate() {
        let a = annotation(0, "rs9", "Aaa/Gaa", "0.1");

        // accepted even though the other keys differ
        let outcome = select_candidate(&clinical("rs1", "Gca/Aca"), vec![&a], &MatchKeys::default());

        assert_eq!(
            outcome,
            MatchOutcome::Matched {
                annotation: &a,
                stage: MatchStage::Feature
            }
        );
    }

    #[test]
    fn test_no_feature_candidate() {
        let outcome = select_candidate(&clinical("rs1", "Gca/Aca"), vec![], &MatchKeys::default());

        assert_eq!(
            outcome,
            MatchOutcome::Unmatched {
                stage: MatchStage::Feature
            }
        );
    }

    #[test]
    fn test_existing_variation_narrows() {
        let a = annotation(0, "rs1", "Gca/Aca", "0.1");
        let b = annotation(1, "rs2", "Gca/Aca", "0.2");

        let outcome = select_candidate(
            &clinical("rs2", "Gca/Aca"),
            vec![&a, &b],
            &MatchKeys::default(),
        );

        assert_eq!(
            outcome,
            MatchOutcome::Matched {
                annotation: &b,
                stage: MatchStage::ExistingVariation
            }
        );
    }

    #[test]
    fn test_existing_variation_empties_set() {
        let a = annotation(0, "rs1", "Gca/Aca", "0.1");
        let b = annotation(1, "rs2", "Gca/Aca", "0.2");

        let outcome = select_candidate(
            &clinical("rs3", "Gca/Aca"),
            vec![&a, &b],
            &MatchKeys::default(),
        );

        assert_eq!(
            outcome,
            MatchOutcome::Unmatched {
                stage: MatchStage::ExistingVariation
            }
        );
    }

    #[test]
    fn test_codons_narrows() {
        let a = annotation(0, "rs1", "Gca/Aca", "0.1");
        let b = annotation(1, "rs1", "gCa/gTa", "0.2");

        let outcome = select_candidate(
            &clinical("rs1", "gCa/gTa"),
            vec![&a, &b],
            &MatchKeys::default(),
        );

        assert_eq!(
            outcome,
            MatchOutcome::Matched {
                annotation: &b,
                stage: MatchStage::Codons
            }
        );
    }

    #[test]
    fn test_tie_break_prefers_fewest_missing() {
        let a = annotation(0, "rs1", "Gca/Aca", "NA");
        let b = annotation(1, "rs1", "Gca/Aca", "0.7");

        let outcome = select_candidate(
            &clinical("rs1", "Gca/Aca"),
            vec![&a, &b],
            &MatchKeys::default(),
        );

        assert_eq!(
            outcome,
            MatchOutcome::Matched {
                annotation: &b,
                stage: MatchStage::TieBreak
            }
        );
    }

    #[test]
    fn test_tie_break_is_stable() {
        let a = annotation(0, "rs1", "Gca/Aca", "0.3");
        let b = annotation(1, "rs1", "Gca/Aca", "0.7");
        let c = annotation(2, "rs1", "Gca/Aca", "0.9");

        for _ in 0..3 {
            let outcome = select_candidate(
                &clinical("rs1", "Gca/Aca"),
                vec![&a, &b, &c],
                &MatchKeys::default(),
            );
            assert_eq!(
                outcome,
                MatchOutcome::Matched {
                    annotation: &a,
                    stage: MatchStage::TieBreak
                }
            );
        }
    }

    #[test]
    fn test_missing_key_never_matches() {
        let a = annotation(0, "NA", "Gca/Aca", "0.1");
        let b = annotation(1, "rs2", "Gca/Aca", "0.2");

        let outcome = select_candidate(
            &clinical("NA", "Gca/Aca"),
            vec![&a, &b],
            &MatchKeys::default(),
        );

        assert_eq!(
            outcome,
            MatchOutcome::Unmatched {
                stage: MatchStage::ExistingVariation
            }
        );
    }

    #[test]
    fn test_narrowing_is_monotonic() {
        let rows: Vec<Row> = (0..6)
            .map(|i| {
                annotation(
                    i,
                    if i % 2 == 0 { "rs1" } else { "rs2" },
                    if i % 3 == 0 { "Gca/Aca" } else { "Aaa/Gaa" },
                    "0.5",
                )
            })
            .collect();
        let all: Vec<&Row> = rows.iter().collect();
        let record = clinical("rs1", "Gca/Aca");

        let after_existing = narrow(all.clone(), &record, "Existing_variation");
        let after_codons = narrow(after_existing.clone(), &record, "Codons");

        assert!(after_existing.iter().all(|r| all.contains(r)));
        assert!(after_codons.iter().all(|r| after_existing.contains(r)));
        assert_eq!(after_codons.len(), 1);
        assert_eq!(after_codons[0].position(), 0);
    }

    #[test]
    fn test_run_requires_key_columns() {
        let clinical = Table::new(vec!["Feature".to_string(), "Codons".to_string()]);
        let annotations = Table::new(
            ["Feature", "Existing_variation", "Codons"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        let mut log = UnmatchedLog::new(Vec::<u8>::new()).unwrap();

        let err = VariantMatcher::new()
            .run(&clinical, &annotations, &mut log)
            .unwrap_err();

        assert!(err.to_string().contains("Existing_variation"));
    }
}
