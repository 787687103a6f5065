/// Linear elastic material properties.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    /// Young's modulus in Pa.
    pub youngs_modulus: f64,
    /// Poisson's ratio, within `[-1.0, 0.5]`.
    pub poissons_ratio: f64,
    /// Density in kg/m^3.
    pub density: f64,
}

/// Mesh settings passed through to the solver.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    /// COMSOL predefined mesh size, from 1 (extremely fine) to 9 (extremely coarse).
    pub size: u8,
    pub mesh_type: String,
}
