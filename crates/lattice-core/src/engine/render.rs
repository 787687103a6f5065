use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const SOURCE_TEMPLATE_NAME: &str = "solver.java.tpl";
pub const SCRIPT_TEMPLATE_NAME: &str = "run.bat.tpl";

const BUILTIN_SOURCE_TEMPLATE: &str = include_str!("../../templates/solver.java.tpl");
const BUILTIN_SCRIPT_TEMPLATE: &str = include_str!("../../templates/run.bat.tpl");

/// Every key the generator places in a [`RenderContext`].
pub const CONTEXT_KEYS: &[&str] = &[
    "class_name",
    "job_id",
    "run_id",
    "job_name",
    "generated_at",
    "lattice_constant",
    "unit_cell_size",
    "num_spheres",
    "num_beams",
    "points",
    "sphere_radii",
    "sphere_ratios",
    "beam_endpoints",
    "lines",
    "beam_thicknesses",
    "beam_ratios",
    "material_name",
    "youngs_modulus",
    "poissons_ratio",
    "density",
    "mesh_size",
    "mesh_type",
    "strain_delta",
    "strain_steps",
    "bc_fixed",
    "bc_copyface",
    "source_file",
    "output_file",
    "solver_command",
    "num_cores",
];

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Template '{path}' could not be loaded: {source}", path = path.display())]
    TemplateNotFound {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Flat key to text mapping handed to a renderer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderContext {
    values: BTreeMap<String, String>,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: impl fmt::Display) {
        self.values.insert(key.to_string(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Rendered text of one job.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedJob {
    /// Solver source code.
    pub source: String,
    /// Execution script.
    pub script: String,
}

/// The template-rendering collaborator.
///
/// Rendering is a pure function of the context. Implementations must not hold state
/// about previously rendered jobs.
pub trait TemplateRenderer {
    fn render(&self, context: &RenderContext) -> Result<RenderedJob, RenderError>;
}

/// Substitutes `{{ key }}` placeholders in a source template and a script template.
///
/// Placeholders naming a key absent from the context are left untouched, so the code
/// check of the rendered output reports them as unrendered markers.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceholderRenderer {
    source_template: String,
    script_template: String,
}

impl PlaceholderRenderer {
    pub fn new(source_template: impl Into<String>, script_template: impl Into<String>) -> Self {
        Self {
            source_template: source_template.into(),
            script_template: script_template.into(),
        }
    }

    /// The templates shipped with the library.
    pub fn builtin() -> Self {
        Self::new(BUILTIN_SOURCE_TEMPLATE, BUILTIN_SCRIPT_TEMPLATE)
    }

    /// Loads [`SOURCE_TEMPLATE_NAME`] and [`SCRIPT_TEMPLATE_NAME`] from `dir`.
    pub fn from_dir(dir: &Path) -> Result<Self, RenderError> {
        let read = |name: &str| {
            let path = dir.join(name);
            fs::read_to_string(&path).map_err(|source| RenderError::TemplateNotFound { path, source })
        };
        let renderer = Self::new(read(SOURCE_TEMPLATE_NAME)?, read(SCRIPT_TEMPLATE_NAME)?);
        debug!(dir = %dir.display(), "Loaded templates.");
        Ok(renderer)
    }

    /// Template names paired with their text.
    pub fn templates(&self) -> [(&'static str, &str); 2] {
        [
            (SOURCE_TEMPLATE_NAME, self.source_template.as_str()),
            (SCRIPT_TEMPLATE_NAME, self.script_template.as_str()),
        ]
    }
}

impl TemplateRenderer for PlaceholderRenderer {
    fn render(&self, context: &RenderContext) -> Result<RenderedJob, RenderError> {
        Ok(RenderedJob {
            source: render_template(&self.source_template, context),
            script: render_template(&self.script_template, context),
        })
    }
}

pub(crate) fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub fn render_template(template: &str, context: &RenderContext) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            output.push_str(&rest[start..]);
            return output;
        };
        let key = after[..end].trim();
        match context.get(key).filter(|_| is_identifier(key)) {
            Some(value) => {
                output.push_str(value);
                rest = &after[end + 2..];
            }
            None => {
                output.push('{');
                rest = &rest[start + 1..];
            }
        }
    }

    output.push_str(rest);
    output
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateLintIssue {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for TemplateLintIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// A template marker found in one line of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Marker<'a> {
    /// Byte offset of the opening `{`.
    pub start: usize,
    /// Whether whitespace separates the two opening braces, as in `{ {`.
    pub spaced: bool,
    /// Text after the second opening brace up to the end of the line.
    pub body: &'a str,
}

/// Finds every `{`, optional whitespace, `{` sequence in `line`.
///
/// Only the innermost pair of a brace run is reported, and numeric array initializers such
/// as `{{0.5, -1}, {2, 3}}` are not markers.
pub(crate) fn find_markers(line: &str) -> Vec<Marker<'_>> {
    line.match_indices('{')
        .filter_map(|(start, _)| {
            let rest = &line[start + 1..];
            let gap = rest.len() - rest.trim_start().len();
            let body = rest[gap..].strip_prefix('{')?;
            if body.starts_with('{') || is_numeric_initializer(body) {
                return None;
            }
            Some(Marker {
                start,
                spaced: gap > 0,
                body,
            })
        })
        .collect()
}

fn is_numeric_initializer(body: &str) -> bool {
    let Some(end) = body.find('}') else {
        return false;
    };
    let inner = &body[..end];
    inner.chars().any(|c| c.is_ascii_digit())
        && inner
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_whitespace() || matches!(c, '.' | ',' | '-' | '+'))
}

/// Checks a template for placeholders the renderer cannot fill.
///
/// Every marker must be a well-formed `{{ key }}` naming a known context key; only numeric
/// array initializers such as `{{0, 1}}` count as literal text.
pub fn lint_template(template: &str) -> Vec<TemplateLintIssue> {
    let mut issues = Vec::new();

    for (line_index, line) in template.lines().enumerate() {
        let line_number = line_index + 1;
        let mut push = |message: String| {
            issues.push(TemplateLintIssue {
                line: line_number,
                message,
            })
        };

        if line.contains("{%") {
            push("block tags '{% ... %}' are not supported".to_string());
        }

        let mut resume = 0;
        for marker in find_markers(line) {
            if marker.start < resume {
                continue;
            }
            if marker.spaced {
                push("spaced marker '{ {' is never rendered".to_string());
                continue;
            }
            let Some(end) = marker.body.find("}}") else {
                push("unterminated placeholder".to_string());
                break;
            };
            let key = marker.body[..end].trim();
            if !is_identifier(key) {
                push(format!("malformed placeholder '{{{{ {} }}}}'", key));
            } else if !CONTEXT_KEYS.contains(&key) {
                push(format!("unknown placeholder key '{}'", key));
            }
            resume = marker.start + 2 + end + 2;
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn context(entries: &[(&str, &str)]) -> RenderContext {
        let mut ctx = RenderContext::new();
        for (k, v) in entries {
            ctx.insert(k, v);
        }
        ctx
    }

    #[test]
    fn substitutes_known_keys() {
        let ctx = context(&[("class_name", "job_001"), ("num_cores", "4")]);
        assert_eq!(
            render_template("class {{ class_name }} uses {{num_cores}} cores", &ctx),
            "class job_001 uses 4 cores"
        );
    }

    #[test]
    fn leaves_unknown_keys_in_place() {
        let ctx = context(&[("class_name", "job_001")]);
        assert_eq!(
            render_template("{{ class_name }} {{ missing }}", &ctx),
            "job_001 {{ missing }}"
        );
    }

    #[test]
    fn keeps_literal_double_braces() {
        let ctx = context(&[("points", "{0, 0, 0}")]);
        assert_eq!(
            render_template("int[][] a = {{0, 1}}; double[][] p = { {{ points }} };", &ctx),
            "int[][] a = {{0, 1}}; double[][] p = { {0, 0, 0} };"
        );
    }

    #[test]
    fn unterminated_marker_is_copied_verbatim() {
        let ctx = context(&[("job_id", "job_001")]);
        assert_eq!(render_template("{{ job_id }} {{ job_", &ctx), "job_001 {{ job_");
    }

    #[test]
    fn builtin_templates_lint_clean() {
        for (name, template) in PlaceholderRenderer::builtin().templates() {
            assert_eq!(lint_template(template), Vec::new(), "template {}", name);
        }
    }

    #[test]
    fn lint_reports_unknown_unterminated_and_blocks() {
        let issues = lint_template("{{ bogus }}\n{{ job_id\n{% if x %}\nint[][] a = {{0}};\n");
        let lines: Vec<usize> = issues.iter().map(|i| i.line).collect();

        assert_eq!(lines, vec![1, 2, 3]);
        assert!(issues[0].message.contains("bogus"));
        assert!(issues[1].message.contains("unterminated"));
        assert!(issues[2].message.contains("block tags"));
    }

    #[test]
    fn lint_flags_markers_that_are_not_plain_keys() {
        let issues = lint_template("a = {{- num_cores }};\nb = { { job_id }};\nc = {{ }};\n");
        let lines: Vec<usize> = issues.iter().map(|i| i.line).collect();

        assert_eq!(lines, vec![1, 2, 3]);
        assert!(issues[0].message.contains("malformed"));
        assert!(issues[1].message.contains("spaced marker"));
        assert!(issues[2].message.contains("malformed"));
    }

    #[test]
    fn finds_only_non_numeric_markers() {
        assert!(find_markers("double[][] p = {{0.5, 1}, {2, 3}};").is_empty());
        assert!(find_markers("int[][] b = {{-1, +2}};").is_empty());
        assert!(find_markers("double[] r = { 0.3, 0.65 };").is_empty());

        let spaced = find_markers("x = { { radius }};");
        assert_eq!(spaced.len(), 1);
        assert!(spaced[0].spaced);

        let nested = find_markers("double[] u = { {{ unit_cell_size }} };");
        assert_eq!(nested.len(), 1);
        assert_eq!(nested[0].start, 15);
        assert!(!nested[0].spaced);

        assert_eq!(find_markers("s = \"{{ \"lit\" }}\";").len(), 1);
        assert_eq!(find_markers("c = {{ }};").len(), 1);
    }

    #[test]
    fn loads_templates_from_directory() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(SOURCE_TEMPLATE_NAME), "class {{ class_name }} {}").unwrap();
        fs::write(dir.path().join(SCRIPT_TEMPLATE_NAME), "run {{ job_id }}").unwrap();

        let renderer = PlaceholderRenderer::from_dir(dir.path()).unwrap();
        let rendered = renderer
            .render(&context(&[("class_name", "job_002"), ("job_id", "job_002")]))
            .unwrap();
        assert_eq!(rendered.source, "class job_002 {}");
        assert_eq!(rendered.script, "run job_002");
    }

    #[test]
    fn missing_template_is_reported_with_path() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(SOURCE_TEMPLATE_NAME), "class {{ class_name }} {}").unwrap();

        let err = PlaceholderRenderer::from_dir(dir.path()).unwrap_err();
        let RenderError::TemplateNotFound { path, .. } = err;
        assert_eq!(path, dir.path().join(SCRIPT_TEMPLATE_NAME));
    }
}
