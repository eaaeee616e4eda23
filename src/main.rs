#[macro_use]
extern crate clap;
use clap::{Arg, ArgMatches};
use colored::*;
use console::style;
use constprop::ast::{self, Ast};
use constprop::cfg;
use constprop::environment::{self, Environment, Mode};
use constprop::error::Result;
use constprop::folding::ConstantFolding;
use constprop::propagation::ConstantPropagation;
use constprop::util::{DumpToFile, Transform};
use log::LevelFilter;
use std::fs;
use std::path::Path;
use std::process;

fn main() {
    let arguments = app_from_crate!()
        .after_help(
            "INPUT may contain classes with methods built from blocks, declarations, \
             assignments, calls, if, while, do-while and return statements. \
             break, continue, for, switch, try, throw, new, ++/-- and compound \
             assignments are rejected as syntax errors.",
        )
        .arg(
            Arg::with_name("environment_file")
                .short("e")
                .long("env")
                .value_name("FILE")
                .help("Sets environment file to use")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("mode")
                .short("m")
                .long("mode")
                .value_name("MODE")
                .possible_values(&["fold", "propagate"])
                .help("Sets optimization mode (overwrites environment)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("debug")
                .short("d")
                .long("debug")
                .help("Enables debug mode"),
        )
        .arg(
            Arg::with_name("cfg_file")
                .long("cfg")
                .value_name("FILE")
                .help("Prints the CFG of every method into the file")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("input_file")
                .value_name("INPUT")
                .help("Java source file to be optimized")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("output_file")
                .value_name("OUTPUT")
                .help("File the optimized source is written to")
                .required(true)
                .index(2),
        )
        .get_matches();

    if let Err(e) = constprop(&arguments) {
        println!("{}", style(e).bold().red());
        process::exit(-1);
    }
}

fn build_environment(arguments: &ArgMatches) -> Result<Environment> {
    let mut env_builder = environment::EnvironmentBuilder::default();

    if let Some(file_path) = arguments.value_of("environment_file") {
        let env_file = Path::new(file_path);
        if !env_file.is_file() {
            return Err(format!("Environment file '{}' does not exist", file_path).into());
        }
        env_builder.from_file(env_file)?;
    } else if let Some(input_file) = arguments.value_of("input_file") {
        // Try to find an environment file for the current input
        let env_file = Path::new(input_file).with_extension("yaml");
        if env_file.is_file() {
            println!(
                "Using environment defined in '{}'",
                style(env_file.display()).yellow()
            );
            env_builder.from_file(&env_file)?;
        }
    }

    if let Some(mode) = arguments.value_of("mode") {
        env_builder.mode(match mode {
            "fold" => Mode::Fold,
            _ => Mode::Propagate,
        });
    }

    if arguments.is_present("debug") {
        env_builder.debug(true);
    }

    Ok(env_builder.build()?)
}

fn create_transformation(env: &Environment) -> Box<dyn Transform<Ast>> {
    match env.mode {
        Mode::Fold => Box::new(ConstantFolding::new_from_env(env)),
        Mode::Propagate => Box::new(ConstantPropagation::new_from_env(env)),
    }
}

fn write_cfgs(ast: &Ast, path: &Path) -> Result<()> {
    let graphs: Vec<String> = cfg::build(ast, ast.root())?
        .iter()
        .map(|cfg| cfg.dot_graph(ast))
        .collect();
    graphs.concat().dump_to_file(path)
}

fn constprop(arguments: &ArgMatches) -> Result<()> {
    let input_file = arguments
        .value_of("input_file")
        .ok_or("No input file given")?;
    let output_file = arguments
        .value_of("output_file")
        .ok_or("No output file given")?;

    let env = build_environment(arguments)?;

    let level = if env.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    simple_logging::log_to_stderr(level);

    if env.debug {
        println!("{}:\n{}\n---", "Environment".bold(), style(&env).cyan());
    }

    println!(
        "{} Parsing '{}'",
        style("[1/3]").bold().dim(),
        input_file.yellow()
    );
    let source = fs::read_to_string(input_file)
        .map_err(|e| format!("Input file '{}' could not be read: {}", input_file, e))?;
    let mut ast = ast::parse(&source)?;

    let transformation = create_transformation(&env);
    println!(
        "{} {} ({})",
        style("[2/3]").bold().dim(),
        transformation.description(),
        style(env.mode).cyan()
    );
    transformation.transform(&mut ast)?;

    if let Some(path) = arguments.value_of("cfg_file") {
        write_cfgs(&ast, Path::new(path))?;
    }

    println!(
        "{} Writing '{}'",
        style("[3/3]").bold().dim(),
        output_file.yellow()
    );
    ast.dump_to_file(Path::new(output_file))?;

    println!("{}", "Done.".bold().green());

    Ok(())
}
