use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::error::Error;
use std::io::Write;
use vpc_stack_generator::aws::Progress;
use vpc_stack_generator::config::Settings;
use vpc_stack_generator::output::{print_graph, print_topology, progress_line, save_report};
use vpc_stack_generator::{deploy_topology, generate_template, load_topology};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// Write a CloudFormation template
    Template,
    /// Create the resources with the AWS CLI
    Deploy,
}

/// Generate or deploy an AWS VPC topology.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Topology input file (YAML or JSON)
    topology: String,

    #[arg(value_enum, default_value_t = Backend::Template)]
    backend: Backend,
}

fn main() -> Result<(), Box<dyn Error>> {
    // Do as little as possible in main.rs as it can't contain any tests
    log4rs::init_file("log4rs.yml", Default::default())?;
    dotenv::dotenv().ok();
    log::info!("#Start main()");

    let args = Args::parse();
    let settings = Settings::from_env()?;
    let topology = load_topology(&args.topology)?;
    print_topology(&topology);

    match args.backend {
        Backend::Template => {
            let template = generate_template(&topology, &settings)?;
            println!(
                "Wrote {} resources to {}",
                template.resources.0.len(),
                settings.template_path.display()
            );
        }
        Backend::Deploy => {
            let mut progress = Progress::with_observer(|phase, percent| {
                print!("\r{}", progress_line(phase, percent));
                std::io::stdout().flush().ok();
            });
            let result = deploy_topology(&topology, &settings, &mut progress);
            println!();
            let graph = match &result {
                Ok(graph) => graph,
                Err(failure) => &failure.graph,
            };
            print_graph(graph);
            let report = save_report(graph, &settings.report_dir)?;
            println!("Report saved to {}", report.display());
            if let Err(failure) = result {
                println!("{} {failure}", "FAILED".on_red());
                return Err(failure.into());
            }
        }
    }

    log::info!("#End main()");
    Ok(())
}
