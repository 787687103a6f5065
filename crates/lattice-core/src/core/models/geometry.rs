use super::beam::Beam;
use super::ids::SphereId;
use super::sphere::Sphere;

/// The complete lattice of one job: spheres in declaration order, beams in declaration
/// order, and the lattice constant that scales the unit cell.
///
/// Declaration order is significant. Indexed parameter paths such as `sphere.2.radius`
/// address elements by their position in these vectors, not by id.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub lattice_constant: f64,
    pub spheres: Vec<Sphere>,
    pub beams: Vec<Beam>,
}

impl Geometry {
    pub fn new(lattice_constant: f64, spheres: Vec<Sphere>, beams: Vec<Beam>) -> Self {
        Self {
            lattice_constant,
            spheres,
            beams,
        }
    }

    pub fn sphere(&self, id: SphereId) -> Option<&Sphere> {
        self.spheres.iter().find(|s| s.id == id)
    }

    /// Position of the sphere with `id` within the sphere list.
    pub fn sphere_index(&self, id: SphereId) -> Option<usize> {
        self.spheres.iter().position(|s| s.id == id)
    }
}
