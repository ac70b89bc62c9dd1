use mpsim::prelude::*;
use std::path::Path;
use structopt::StructOpt;

/// Command line options
#[derive(StructOpt, Debug)]
#[structopt(
    name = "mpsim",
    about = "Integrates a constitutive behaviour at a material point along a loading path"
)]
struct Options {
    /// JSON file with the description of the test
    input: String,

    /// Results file (JSON if the extension is .json; whitespace-separated text otherwise)
    #[structopt(short, long, default_value = "/tmp/mpsim/results.txt")]
    output: String,

    /// Prints the iterations
    #[structopt(short, long)]
    verbose: bool,
}

fn main() -> Result<(), String> {
    // parse options
    let options = Options::from_args();

    // load data
    let mut input = InputData::read_json(&options.input).map_err(|e| format!("{}: {}", e, options.input))?;
    if options.verbose {
        input.control.verbose = Verbosity::Level2;
    }

    // run
    let registry = AccelerationRegistry::new();
    let mut driver = Driver::from_input(&input, &registry).map_err(|e| e.to_string())?;
    let mut table = ResultTable::new();
    let summary = driver.run(&input.times, &mut table).map_err(|e| e.to_string())?;

    // write results
    let is_json = Path::new(&options.output).extension().map_or(false, |ext| ext == "json");
    if is_json {
        table.write_json(&options.output)?;
    } else {
        table.write_text(&options.output)?;
    }

    // message
    for outcome in summary.checks.iter().filter(|c| !c.passed) {
        println!("{}", outcome.message);
    }
    let thin_line = format!("{:─^1$}", "", options.output.len());
    println!("\n{}", thin_line);
    println!(
        "{} steps committed ({} failed attempts); the results file is:",
        summary.n_committed(),
        summary.n_failed()
    );
    println!("{}", options.output);
    println!("{}\n", thin_line);
    if !summary.all_checks_passed() {
        return Err("some checks have failed".to_string());
    }
    Ok(())
}
