use nalgebra::Point3;

pub fn center_distance(a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    nalgebra::distance(a, b)
}

/// Distance between two sphere surfaces; negative when the spheres overlap.
pub fn surface_gap(a: &Point3<f64>, radius_a: f64, b: &Point3<f64>, radius_b: f64) -> f64 {
    center_distance(a, b) - (radius_a + radius_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn center_distance_is_euclidean() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(3.0, 4.0, 0.0);
        assert_relative_eq!(center_distance(&a, &b), 5.0);
    }

    #[test]
    fn surface_gap_is_negative_for_overlap() {
        let a = Point3::origin();
        let b = Point3::new(0.5, 0.0, 0.0);
        assert_relative_eq!(surface_gap(&a, 0.5, &b, 0.5), -0.5);
        assert_relative_eq!(surface_gap(&a, 0.2, &b, 0.1), 0.2);
    }
}
