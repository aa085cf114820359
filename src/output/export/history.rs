//! In-memory field histories
//!
//! A [`FieldHistory`] collects one field's trajectory from an
//! [`IntegrationReport`] into a dense step-by-node matrix, convenient
//! for post-processing (maxima per step, per-node series, plotting).

use crate::physics::FieldKind;
use crate::solver::IntegrationReport;
use ndarray::Array2;

/// Step-by-node history of one field
#[derive(Debug, Clone)]
pub struct FieldHistory {
    /// Which field this history holds
    pub kind: FieldKind,
    /// Recorded times, one per row
    pub times: Vec<f64>,
    /// Values, shape `(steps, nodes)`
    pub values: Array2<f64>,
}

impl FieldHistory {
    /// Extract one field's history from a report
    pub fn from_report(report: &IntegrationReport, kind: FieldKind) -> Result<Self, String> {
        if report.trajectory.is_empty() {
            return Err("report carries no trajectory".to_string());
        }
        let nodes = report.trajectory[0]
            .len_of(kind)
            .ok_or_else(|| format!("field '{}' not present in the trajectory", kind))?;

        let steps = report.trajectory.len();
        let mut flat = Vec::with_capacity(steps * nodes);
        for state in &report.trajectory {
            let field = state
                .get(kind)
                .ok_or_else(|| format!("field '{}' missing from a recorded state", kind))?;
            if field.len() != nodes {
                return Err(format!(
                    "field '{}' changes length mid-trajectory ({} vs {})",
                    kind,
                    field.len(),
                    nodes
                ));
            }
            flat.extend(field.iter().copied());
        }

        let values = Array2::from_shape_vec((steps, nodes), flat)
            .map_err(|e| format!("history shape error: {}", e))?;
        Ok(Self {
            kind,
            times: report.time_points.clone(),
            values,
        })
    }

    /// Number of recorded steps
    pub fn steps(&self) -> usize {
        self.values.nrows()
    }

    /// Number of nodes
    pub fn nodes(&self) -> usize {
        self.values.ncols()
    }

    /// Maximum value across nodes, one entry per step
    pub fn max_per_step(&self) -> Vec<f64> {
        self.values
            .rows()
            .into_iter()
            .map(|row| row.iter().copied().fold(f64::NEG_INFINITY, f64::max))
            .collect()
    }

    /// One node's series over all steps
    pub fn node_series(&self, node: usize) -> Vec<f64> {
        assert!(
            node < self.nodes(),
            "node {} outside history with {} nodes",
            node,
            self.nodes()
        );
        self.values.column(node).iter().copied().collect()
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::FieldSet;
    use crate::solver::Termination;
    use std::collections::HashMap;

    fn report_with(values: &[(f64, Vec<f64>)]) -> IntegrationReport {
        let trajectory: Vec<FieldSet> = values
            .iter()
            .map(|(_, v)| {
                FieldSet::new(FieldKind::Slip, nalgebra::DVector::from_vec(v.clone()))
            })
            .collect();
        IntegrationReport {
            time_points: values.iter().map(|(t, _)| *t).collect(),
            final_state: trajectory.last().unwrap().clone(),
            trajectory,
            implicit_state: None,
            termination: Termination::TimeReached,
            steps: values.len() - 1,
            rejected_steps: 0,
            min_step_hits: 0,
            max_step_hits: 0,
            rate_evaluations: 0,
            final_dt: 1.0,
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn test_history_shape_and_values() {
        let report = report_with(&[
            (0.0, vec![0.0, 1.0]),
            (1.0, vec![2.0, 3.0]),
            (2.0, vec![4.0, 5.0]),
        ]);

        let history = FieldHistory::from_report(&report, FieldKind::Slip).unwrap();
        assert_eq!(history.steps(), 3);
        assert_eq!(history.nodes(), 2);
        assert_eq!(history.values[[1, 1]], 3.0);
        assert_eq!(history.times, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_max_per_step_and_node_series() {
        let report = report_with(&[(0.0, vec![0.5, 1.0]), (1.0, vec![4.0, 3.0])]);
        let history = FieldHistory::from_report(&report, FieldKind::Slip).unwrap();

        assert_eq!(history.max_per_step(), vec![1.0, 4.0]);
        assert_eq!(history.node_series(0), vec![0.5, 4.0]);
    }

    #[test]
    fn test_missing_field_is_error() {
        let report = report_with(&[(0.0, vec![0.0])]);
        assert!(FieldHistory::from_report(&report, FieldKind::State).is_err());
    }
}
