use super::load_job;
use crate::cli::InfoArgs;
use crate::error::Result;
use latticegen::core::io::toml_job::job_summary;
use latticegen::engine::parametric::{generate_parameter_sets, parameter_summary, sweep_info};

pub fn run(args: InfoArgs) -> Result<()> {
    let job = load_job(&args.input)?;

    println!("{}", job_summary(&job));

    let info = sweep_info(&job);
    if info.num_sweeps > 0 {
        println!();
        println!("Sweeps:");
        for dimension in &info.sweep_dimensions {
            let values = dimension
                .values
                .iter()
                .map(f64::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            println!(
                "  {}: {} value(s) [{}]",
                dimension.parameter, dimension.num_values, values
            );
        }
    }

    println!();
    println!("{}", parameter_summary(&generate_parameter_sets(&job)));
    Ok(())
}
