use crate::core::models::job::CustomLatticeJob;
use crate::core::models::parametric::ParameterPath;
use itertools::Itertools;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// One concrete combination of sweep values layered over the defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSet {
    pub job_id: String,
    pub parameters: BTreeMap<ParameterPath, f64>,
    /// Index into each sweep's value list, in sweep declaration order.
    pub sweep_indices: Vec<usize>,
}

impl ParameterSet {
    pub fn get(&self, path: &ParameterPath) -> Option<f64> {
        self.parameters.get(path).copied()
    }

    /// Parameters keyed by their textual path, for records and logs.
    pub fn named_parameters(&self) -> BTreeMap<String, f64> {
        self.parameters
            .iter()
            .map(|(path, value)| (path.to_string(), *value))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepDimension {
    pub parameter: String,
    pub num_values: usize,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepInfo {
    pub num_sweeps: usize,
    pub total_jobs: usize,
    pub sweep_dimensions: Vec<SweepDimension>,
}

pub fn job_id_for(sequence: usize) -> String {
    format!("job_{:03}", sequence)
}

/// Expands the job's sweeps into the full Cartesian product of parameter sets.
///
/// The first sweep varies slowest. Job ids are assigned as `job_001`, `job_002`, ... in
/// iteration order. Without sweeps a single `job_001` carrying the defaults is returned.
pub fn generate_parameter_sets(job: &CustomLatticeJob) -> Vec<ParameterSet> {
    let parametric = &job.job.parametric;

    if parametric.sweeps.is_empty() {
        return vec![ParameterSet {
            job_id: job_id_for(1),
            parameters: parametric.defaults.clone(),
            sweep_indices: Vec::new(),
        }];
    }

    let sets: Vec<ParameterSet> = parametric
        .sweeps
        .iter()
        .map(|sweep| 0..sweep.values.len())
        .multi_cartesian_product()
        .enumerate()
        .map(|(n, indices)| {
            let mut parameters = parametric.defaults.clone();
            for (sweep, &value_index) in parametric.sweeps.iter().zip(&indices) {
                parameters.insert(sweep.parameter, sweep.values[value_index]);
            }
            ParameterSet {
                job_id: job_id_for(n + 1),
                parameters,
                sweep_indices: indices,
            }
        })
        .collect();

    debug!(
        sweeps = parametric.sweeps.len(),
        jobs = sets.len(),
        "Expanded parametric sweeps."
    );
    sets
}

pub fn sweep_info(job: &CustomLatticeJob) -> SweepInfo {
    let sweeps = &job.job.parametric.sweeps;
    let sweep_dimensions: Vec<SweepDimension> = sweeps
        .iter()
        .map(|sweep| SweepDimension {
            parameter: sweep.parameter.to_string(),
            num_values: sweep.values.len(),
            values: sweep.values.clone(),
        })
        .collect();

    SweepInfo {
        num_sweeps: sweeps.len(),
        total_jobs: sweep_dimensions.iter().map(|d| d.num_values).product(),
        sweep_dimensions,
    }
}

/// Lists, per parameter, the distinct values taken across `sets`.
pub fn parameter_summary(sets: &[ParameterSet]) -> String {
    if sets.is_empty() {
        return "No parameter sets".to_string();
    }

    let mut values_by_path: BTreeMap<ParameterPath, Vec<f64>> = BTreeMap::new();
    for set in sets {
        for (path, value) in &set.parameters {
            values_by_path.entry(*path).or_default().push(*value);
        }
    }

    let mut lines = vec![format!("Parameter sets: {}", sets.len())];
    for (path, mut values) in values_by_path {
        values.sort_by(f64::total_cmp);
        values.dedup();
        if let [value] = values.as_slice() {
            lines.push(format!("  {}: {} (constant)", path, value));
        } else {
            let listed = values.iter().map(f64::to_string).join(", ");
            lines.push(format!("  {}: {} values [{}]", path, values.len(), listed));
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::geometry::Geometry;
    use crate::core::models::job::JobInfo;
    use crate::core::models::material::Mesh;
    use crate::core::models::parametric::{ElementField, Parametric, ParametricSweep};
    use crate::core::models::study::{BoundaryConditions, StrainConfig, Study};

    const SPHERE_RADIUS: ParameterPath = ParameterPath::Global(ElementField::SphereRadius);
    const BEAM_THICKNESS: ParameterPath = ParameterPath::Global(ElementField::BeamThickness);

    fn job_with(parametric: Parametric) -> CustomLatticeJob {
        CustomLatticeJob {
            job: JobInfo {
                name: "sweep".to_string(),
                description: String::new(),
                unit_cell_size: [1.0, 1.0, 1.0],
                parametric,
            },
            geometry: Geometry::new(1.0, Vec::new(), Vec::new()),
            materials: BTreeMap::new(),
            mesh: Mesh {
                size: 5,
                mesh_type: "FreeTri".to_string(),
            },
            study: Study {
                strain: StrainConfig {
                    delta: 0.01,
                    steps: "0, 1".to_string(),
                },
                boundary_conditions: BoundaryConditions::default(),
            },
        }
    }

    fn two_dimensional_job() -> CustomLatticeJob {
        job_with(Parametric {
            defaults: BTreeMap::from([(BEAM_THICKNESS, 0.05), (SPHERE_RADIUS, 0.1)]),
            sweeps: vec![
                ParametricSweep {
                    parameter: SPHERE_RADIUS,
                    values: vec![0.2, 0.3, 0.4],
                },
                ParametricSweep {
                    parameter: BEAM_THICKNESS,
                    values: vec![0.1, 0.15],
                },
            ],
        })
    }

    #[test]
    fn no_sweeps_yields_single_default_set() {
        let job = job_with(Parametric {
            defaults: BTreeMap::from([(SPHERE_RADIUS, 0.25)]),
            sweeps: Vec::new(),
        });
        let sets = generate_parameter_sets(&job);

        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].job_id, "job_001");
        assert_eq!(sets[0].get(&SPHERE_RADIUS), Some(0.25));
        assert!(sets[0].sweep_indices.is_empty());
    }

    #[test]
    fn product_is_ordered_outer_to_inner() {
        let sets = generate_parameter_sets(&two_dimensional_job());

        assert_eq!(sets.len(), 6);
        let ids: Vec<&str> = sets.iter().map(|s| s.job_id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["job_001", "job_002", "job_003", "job_004", "job_005", "job_006"]
        );
        let indices: Vec<Vec<usize>> = sets.iter().map(|s| s.sweep_indices.clone()).collect();
        assert_eq!(
            indices,
            vec![
                vec![0, 0],
                vec![0, 1],
                vec![1, 0],
                vec![1, 1],
                vec![2, 0],
                vec![2, 1]
            ]
        );
        assert_eq!(sets[3].get(&SPHERE_RADIUS), Some(0.3));
        assert_eq!(sets[3].get(&BEAM_THICKNESS), Some(0.15));
    }

    #[test]
    fn sweep_values_override_defaults() {
        let sets = generate_parameter_sets(&two_dimensional_job());
        assert!(sets.iter().all(|s| s.get(&SPHERE_RADIUS) != Some(0.1)));
    }

    #[test]
    fn job_ids_widen_past_three_digits() {
        let job = job_with(Parametric {
            defaults: BTreeMap::new(),
            sweeps: vec![ParametricSweep {
                parameter: SPHERE_RADIUS,
                values: (1..=1000).map(|v| v as f64 / 1000.0).collect(),
            }],
        });
        let sets = generate_parameter_sets(&job);

        assert_eq!(sets[998].job_id, "job_999");
        assert_eq!(sets[999].job_id, "job_1000");
    }

    #[test]
    fn sweep_info_reports_dimensions() {
        let info = sweep_info(&two_dimensional_job());

        assert_eq!(info.num_sweeps, 2);
        assert_eq!(info.total_jobs, 6);
        assert_eq!(info.sweep_dimensions[0].parameter, "sphere.radius");
        assert_eq!(info.sweep_dimensions[1].num_values, 2);
    }

    #[test]
    fn sweep_info_without_sweeps_counts_one_job() {
        let info = sweep_info(&job_with(Parametric::default()));
        assert_eq!(info.num_sweeps, 0);
        assert_eq!(info.total_jobs, 1);
    }

    #[test]
    fn summary_lists_distinct_values() {
        let sets = generate_parameter_sets(&two_dimensional_job());
        let summary = parameter_summary(&sets);

        assert!(summary.contains("Parameter sets: 6"));
        assert!(summary.contains("sphere.radius: 3 values [0.2, 0.3, 0.4]"));
        assert!(summary.contains("beam.thickness: 2 values [0.1, 0.15]"));
    }
}
