use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::process::exit;

use clap::{Args, Parser, Subcommand};
use log::{error, info};
use serde::de::DeserializeOwned;

use transit_router::requests::{
    make_base, process_requests, MakeBaseInput, ProcessRequestsInput, Response,
};
use transit_router::test::random_samples;

#[derive(Parser, Debug)]
#[command(
    version,
    author,
    about = "Precomputes fastest bus routes into a snapshot and answers queries from it"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Clone, Debug)]
enum Commands {
    #[command(about = "Build the catalogue and route table and write them to a snapshot")]
    MakeBase(MakeBaseArgs),

    #[command(about = "Answer stat requests from a snapshot")]
    ProcessRequests(ProcessRequestsArgs),

    #[command(about = "Check the router on random networks")]
    RunRandom(RunRandomArgs),
}

#[derive(Args, Clone, Debug)]
struct MakeBaseArgs {
    #[arg(
        short = 'i',
        long,
        help = "The JSON file with base requests. Read from stdin if not given."
    )]
    input: Option<String>,

    #[arg(
        short = 'f',
        long,
        help = "Replace the snapshot file if it already exists."
    )]
    force: bool,
}

#[derive(Args, Clone, Debug)]
struct ProcessRequestsArgs {
    #[arg(
        short = 'i',
        long,
        help = "The JSON file with stat requests. Read from stdin if not given."
    )]
    input: Option<String>,

    #[arg(
        short = 'o',
        long,
        help = "The file to write the responses to. Written to stdout if not given."
    )]
    output: Option<String>,
}

#[derive(Args, Clone, Debug)]
struct RunRandomArgs {
    #[arg(long, default_value_t = 0)]
    seed: u64,

    #[arg(short = 'n', long, default_value_t = 1)]
    count: u64,
}

fn read_input<T: DeserializeOwned>(input: Option<&str>) -> T {
    let parsed = match input {
        Some(path) => {
            let file = File::open(path).unwrap_or_else(|it| {
                error!("Could not open {}: {}", path, it);
                exit(1);
            });
            serde_json::from_reader(BufReader::new(file))
        }
        None => serde_json::from_reader(io::stdin().lock()),
    };
    parsed.unwrap_or_else(|it| {
        error!("Could not parse input: {}", it);
        exit(1);
    })
}

fn main_make_base(args: &MakeBaseArgs) {
    let input: MakeBaseInput = read_input(args.input.as_deref());
    make_base(&input, args.force).unwrap_or_else(|it| {
        error!("Could not make base: {}", it);
        exit(1);
    });
    info!(
        "Wrote snapshot to {}",
        input.serialization_settings.file.display()
    );
}

fn main_process_requests(args: &ProcessRequestsArgs) {
    let input: ProcessRequestsInput = read_input(args.input.as_deref());
    let responses = process_requests(&input).unwrap_or_else(|it| {
        error!("Could not process requests: {}", it);
        exit(1);
    });

    let out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(File::create(path).unwrap_or_else(|it| {
            error!("Could not create {}: {}", path, it);
            exit(1);
        })),
        None => Box::new(io::stdout().lock()),
    };
    write_responses(&mut BufWriter::new(out), &responses).unwrap_or_else(|it| {
        error!("Could not write responses: {}", it);
        exit(1);
    });
}

fn write_responses(out: &mut impl Write, responses: &[Response]) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, responses)?;
    writeln!(out)?;
    out.flush()
}

fn main() {
    env_logger::builder().parse_env("LOG").init();
    let cli = Cli::parse();

    match cli.command {
        Commands::MakeBase(args) => main_make_base(&args),
        Commands::ProcessRequests(args) => main_process_requests(&args),
        Commands::RunRandom(args) => random_samples::run_samples(args.seed, args.count),
    }
}
