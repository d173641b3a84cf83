use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use minic_core::toolchain::{RuntimeError, ToolchainError};
use minic_core::{
    ArtifactPaths, ExecutionReport, SystemRunner, Toolchain, build_and_run, compile_file,
    write_c_source,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const RULE: &str = "-------------------------";

/// Compile a minic program to C, then build and run it with a C compiler.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "input.txt")]
    input: PathBuf,

    #[arg(short, long, default_value = "output.c", help = "Where to write the generated C")]
    output: PathBuf,

    #[arg(long, default_value = "program", help = "Path of the compiled executable")]
    exe: PathBuf,

    #[arg(
        long,
        default_value = "result.txt",
        help = "File that receives the program's standard output"
    )]
    results: PathBuf,

    #[arg(long, env = "CC", default_value = "gcc", help = "C compiler to invoke")]
    cc: PathBuf,

    #[arg(
        long,
        value_name = "SECS",
        default_value_t = 30,
        help = "Kill the compiler or the program after this many seconds (0 disables)"
    )]
    timeout_secs: u64,

    #[arg(long, help = "Stop after writing the C source")]
    no_run: bool,

    #[arg(long, help = "Do not print the parse tree")]
    no_tree: bool,

    #[arg(short, long, action = clap::ArgAction::Count, help = "Increase log verbosity")]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    execute(cli)
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "error",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn execute(cli: Cli) -> Result<()> {
    let artifact = compile_file(&cli.input)?;

    if !cli.no_tree {
        println!("\n--- VISUAL PARSE TREE ---");
        print!("{}", artifact.tree);
        println!("{RULE}\n");
    }

    write_c_source(&artifact, &cli.output)?;

    if cli.no_run {
        println!("C source written to {}", cli.output.display());
        return Ok(());
    }

    let paths = ArtifactPaths {
        source: cli.output.clone(),
        executable: cli.exe.clone(),
        results: cli.results.clone(),
    };
    debug!(?paths, cc = %cli.cc.display(), "building generated program");
    let mut runner = SystemRunner::new();
    if cli.timeout_secs > 0 {
        runner = runner.with_timeout(Duration::from_secs(cli.timeout_secs));
    }

    println!("\n--- EXECUTION RESULTS ---");
    let report = build_and_run(&Toolchain::new(&cli.cc), &paths, &runner);
    report_execution(&report, &paths);
    println!("{RULE}");
    Ok(())
}

/// Toolchain and runtime failures are printed, never propagated.
fn report_execution(report: &ExecutionReport, paths: &ArtifactPaths) {
    match report {
        ExecutionReport::Succeeded { output } => {
            print!("{output}");
            println!("\n(Output saved to '{}')", paths.results.display());
        }
        ExecutionReport::CompileFailed(err) => match err {
            ToolchainError::CompileFailed { status, stderr } => {
                eprintln!("error: compilation failed with {status}");
                eprint!("{stderr}");
            }
            ToolchainError::Process(process) => {
                eprintln!("error: compilation failed: {process}");
            }
        },
        ExecutionReport::RunFailed(err) => {
            eprintln!("error: {err}");
            if let RuntimeError::NonZeroExit { output, .. } = err {
                if !output.is_empty() {
                    print!("{output}");
                }
            }
        }
    }
}

