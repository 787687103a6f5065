#[derive(Debug, Clone, PartialEq)]
pub struct StrainConfig {
    /// Prescribed strain increment.
    pub delta: f64,
    /// Solver step expression, e.g. `"range(0, 0.1, 1)"`.
    pub steps: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryConditions {
    pub fixed: bool,
    pub copyface: bool,
}

impl Default for BoundaryConditions {
    fn default() -> Self {
        Self {
            fixed: true,
            copyface: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Study {
    pub strain: StrainConfig,
    pub boundary_conditions: BoundaryConditions,
}
