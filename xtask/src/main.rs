// Licensed under the Apache-2.0 license

use clap::{Parser, Subcommand};
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::path::PathBuf;

mod rdl_gen_renode;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Xtask {
    /// Log every step of the generation
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    xtask: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a Renode C# peripheral from a register description
    RdlGenRenode {
        /// Register description, TOML or JSON
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Generated C# file
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Peripheral class name; derived from the address map if omitted
        #[arg(long)]
        name: Option<String>,

        /// Namespace below the root namespace, in dotted form
        #[arg(long, default_value = "")]
        namespace: String,

        /// Root namespace, in dotted form
        #[arg(long, default_value = "Antmicro.Renode.Peripherals")]
        root_namespace: String,

        /// Make every generated declaration public
        #[arg(long)]
        all_public: bool,
    },
}

fn main() {
    let cli = Xtask::parse();
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let _ = SimpleLogger::new().with_level(level).init();

    let result = match cli.xtask {
        Commands::RdlGenRenode {
            input,
            output,
            name,
            namespace,
            root_namespace,
            all_public,
        } => {
            let options = rdl_gen_renode::Options {
                name,
                namespace,
                root_namespace,
                all_public,
            };
            rdl_gen_renode::generate(&input, &output, &options)
        }
    };
    if let Err(e) = result {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}
