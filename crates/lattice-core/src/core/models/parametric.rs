use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The geometric attribute a parameter path addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementField {
    SphereRadius,
    SphereRatio,
    BeamThickness,
    BeamRatio,
}

impl ElementField {
    pub fn element(&self) -> &'static str {
        match self {
            Self::SphereRadius | Self::SphereRatio => "sphere",
            Self::BeamThickness | Self::BeamRatio => "beam",
        }
    }

    pub fn field(&self) -> &'static str {
        match self {
            Self::SphereRadius => "radius",
            Self::BeamThickness => "thickness",
            Self::SphereRatio | Self::BeamRatio => "ratio",
        }
    }

    pub fn is_ratio(&self) -> bool {
        matches!(self, Self::SphereRatio | Self::BeamRatio)
    }

    fn parse(element: &str, field: &str) -> Result<Self, ParameterPathError> {
        match (element, field) {
            ("sphere", "radius") => Ok(Self::SphereRadius),
            ("sphere", "ratio") => Ok(Self::SphereRatio),
            ("beam", "thickness") => Ok(Self::BeamThickness),
            ("beam", "ratio") => Ok(Self::BeamRatio),
            ("sphere" | "beam", _) => Err(ParameterPathError::UnknownField {
                element: element.to_string(),
                field: field.to_string(),
            }),
            _ => Err(ParameterPathError::UnknownElement(element.to_string())),
        }
    }
}

/// A parsed parameter name such as `sphere.radius` or `beam.3.ratio`.
///
/// Global paths apply to every element of a kind; indexed paths address one element by
/// its 0-based position in the geometry's declaration order. Ratios only exist in
/// indexed form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParameterPath {
    Global(ElementField),
    Indexed(usize, ElementField),
}

impl ParameterPath {
    pub fn field(&self) -> ElementField {
        match self {
            Self::Global(field) | Self::Indexed(_, field) => *field,
        }
    }
}

impl fmt::Display for ParameterPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global(field) => write!(f, "{}.{}", field.element(), field.field()),
            Self::Indexed(index, field) => {
                write!(f, "{}.{}.{}", field.element(), index, field.field())
            }
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ParameterPathError {
    #[error("malformed parameter path '{0}' (expected '<element>.<field>' or '<element>.<index>.<field>')")]
    Malformed(String),
    #[error("unknown element '{0}' (expected 'sphere' or 'beam')")]
    UnknownElement(String),
    #[error("unknown field '{field}' for element '{element}'")]
    UnknownField { element: String, field: String },
    #[error("invalid element index '{0}'")]
    InvalidIndex(String),
    #[error("'{0}' is only supported with an element index")]
    GlobalRatio(String),
}

impl FromStr for ParameterPath {
    type Err = ParameterPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        match parts.as_slice() {
            [element, field] => {
                let field = ElementField::parse(element, field)?;
                if field.is_ratio() {
                    return Err(ParameterPathError::GlobalRatio(s.to_string()));
                }
                Ok(Self::Global(field))
            }
            [element, index, field] => {
                let index = index
                    .parse::<usize>()
                    .map_err(|_| ParameterPathError::InvalidIndex(index.to_string()))?;
                Ok(Self::Indexed(index, ElementField::parse(element, field)?))
            }
            _ => Err(ParameterPathError::Malformed(s.to_string())),
        }
    }
}

/// One sweep dimension: a parameter varied across an ordered list of values.
#[derive(Debug, Clone, PartialEq)]
pub struct ParametricSweep {
    pub parameter: ParameterPath,
    pub values: Vec<f64>,
}

/// Default parameter values plus sweep dimensions in declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Parametric {
    pub defaults: BTreeMap<ParameterPath, f64>,
    pub sweeps: Vec<ParametricSweep>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_paths() {
        assert_eq!(
            "sphere.radius".parse::<ParameterPath>().unwrap(),
            ParameterPath::Global(ElementField::SphereRadius)
        );
        assert_eq!(
            "beam.thickness".parse::<ParameterPath>().unwrap(),
            ParameterPath::Global(ElementField::BeamThickness)
        );
    }

    #[test]
    fn parses_indexed_paths() {
        assert_eq!(
            "sphere.2.ratio".parse::<ParameterPath>().unwrap(),
            ParameterPath::Indexed(2, ElementField::SphereRatio)
        );
        assert_eq!(
            "beam.0.thickness".parse::<ParameterPath>().unwrap(),
            ParameterPath::Indexed(0, ElementField::BeamThickness)
        );
    }

    #[test]
    fn display_matches_parsed_form() {
        for raw in ["sphere.radius", "beam.thickness", "sphere.4.radius", "beam.1.ratio"] {
            let path: ParameterPath = raw.parse().unwrap();
            assert_eq!(path.to_string(), raw);
        }
    }

    #[test]
    fn rejects_global_ratio() {
        assert_eq!(
            "sphere.ratio".parse::<ParameterPath>(),
            Err(ParameterPathError::GlobalRatio("sphere.ratio".to_string()))
        );
    }

    #[test]
    fn rejects_unknown_parts() {
        assert!(matches!(
            "node.radius".parse::<ParameterPath>(),
            Err(ParameterPathError::UnknownElement(_))
        ));
        assert!(matches!(
            "sphere.thickness".parse::<ParameterPath>(),
            Err(ParameterPathError::UnknownField { .. })
        ));
        assert!(matches!(
            "sphere.x.radius".parse::<ParameterPath>(),
            Err(ParameterPathError::InvalidIndex(_))
        ));
        assert!(matches!(
            "sphere".parse::<ParameterPath>(),
            Err(ParameterPathError::Malformed(_))
        ));
    }

    #[test]
    fn global_paths_order_before_indexed() {
        let global = ParameterPath::Global(ElementField::SphereRadius);
        let indexed = ParameterPath::Indexed(0, ElementField::SphereRadius);
        assert!(global < indexed);
    }
}
