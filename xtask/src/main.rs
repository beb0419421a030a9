// Licensed under the Apache-2.0 license

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use regspec_generator::{BundleConfig, DocStyle, GetterConfig};
use simple_logger::SimpleLogger;
use std::path::PathBuf;

mod regs_gen;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Xtask {
    #[command(subcommand)]
    xtask: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate register specifications and generate documentation and code
    Regs(RegsArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DocArg {
    /// Bit diagrams and field tables
    Custom,
    /// The LaTeX register package
    Register,
}

#[derive(Args, Debug)]
struct RegsArgs {
    /// Register specification files
    #[arg(required = true, value_name = "SPEC")]
    specs: Vec<PathBuf>,

    /// Register detail blocks to write after the index
    #[arg(long, value_enum)]
    doc: Option<DocArg>,

    /// Documentation output file (stdout if not given)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Write LaTeX register and field name macros to FILE
    #[arg(long, value_name = "FILE")]
    definitions: Option<PathBuf>,

    /// Write C #defines to FILE
    #[arg(long, value_name = "FILE")]
    cheader: Option<PathBuf>,

    /// Write the context getter declarations to FILE
    #[arg(long, value_name = "FILE", requires = "getters_impl")]
    getters_header: Option<PathBuf>,

    /// Write the context getter definitions to FILE
    #[arg(long, value_name = "FILE", requires = "getters_header")]
    getters_impl: Option<PathBuf>,

    /// Prefix of the generated getter types and functions
    #[arg(long, default_value = "reg")]
    getters_prefix: String,

    /// Write Chisel bundles to FILE
    #[arg(long, value_name = "FILE")]
    chisel: Option<PathBuf>,

    /// Scala package of the Chisel bundles
    #[arg(long, default_value = "registers")]
    chisel_package: String,

    /// Only check that every requested artifact can be generated
    #[arg(long)]
    check: bool,

    /// Log more (-v for progress, -vv for debug output)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl From<&RegsArgs> for regs_gen::Options {
    fn from(args: &RegsArgs) -> Self {
        let getters = match (&args.getters_header, &args.getters_impl) {
            (Some(header), Some(implementation)) => Some((header.clone(), implementation.clone())),
            _ => None,
        };
        let mut getter_config = GetterConfig::new(&args.getters_prefix);
        if let Some(name) = getters
            .as_ref()
            .and_then(|(header, _)| header.file_name())
        {
            getter_config = getter_config.with_header_name(&name.to_string_lossy());
        }
        Self {
            specs: args.specs.clone(),
            doc: args.doc.map(|doc| match doc {
                DocArg::Custom => DocStyle::Custom,
                DocArg::Register => DocStyle::RegisterPackage,
            }),
            output: args.output.clone(),
            definitions: args.definitions.clone(),
            cheader: args.cheader.clone(),
            getters,
            getter_config,
            chisel: args.chisel.clone(),
            bundle_config: BundleConfig::new(&args.chisel_package),
            check: args.check,
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    let _ = SimpleLogger::new().with_level(level).init();
}

fn main() {
    let cli = Xtask::parse();
    let result = match &cli.xtask {
        Commands::Regs(args) => {
            init_logging(args.verbose);
            regs_gen::generate(&args.into())
        }
    };
    result.unwrap_or_else(|e| {
        eprintln!("Error: {e:#}");
        std::process::exit(-1);
    });
}
