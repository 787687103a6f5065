use super::load_renderer;
use crate::cli::LintTemplatesArgs;
use crate::config::{self, FlagOverrides};
use crate::error::{CliError, Result};
use latticegen::engine::render::lint_template;

pub fn run(args: LintTemplatesArgs) -> Result<()> {
    let flags = FlagOverrides {
        template_dir: args.template_dir.clone(),
        ..Default::default()
    };
    let app = config::build_config(&args.config, &flags)?;

    match &app.template_dir {
        Some(dir) => println!("Linting templates in {}", dir.display()),
        None => println!("Linting built-in templates"),
    }
    let renderer = load_renderer(app.template_dir.as_deref())?;

    let mut total_issues = 0;
    for (name, template) in renderer.templates() {
        let issues = lint_template(template);
        if issues.is_empty() {
            println!("  ✓ {}", name);
            continue;
        }
        println!("  ✗ {} ({} issue(s))", name, issues.len());
        for issue in &issues {
            println!("      {}", issue);
        }
        total_issues += issues.len();
    }

    if total_issues > 0 {
        return Err(CliError::Validation(format!(
            "{} template issue(s) found",
            total_issues
        )));
    }
    Ok(())
}
