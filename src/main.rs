mod cli;
mod config;
mod pipelines;
mod utils;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use std::{env, fs};

use anyhow::{Context, Result};
use clap::CommandFactory;
use env_logger::Builder;
use log::{self, LevelFilter, error, info};

use crate::cli::parse;
use crate::config::assets::{DEFAULTS_SOURCE, ExampleData};
use crate::config::defaults::ToolDefaults;
use crate::config::defs::PipelineError;
use crate::pipelines::consensus::{RunController, RunState};
use crate::utils::params::InputFileRef;
use crate::utils::runtime::{LocalRuntime, SandboxRuntime, required_tools};

#[tokio::main]
async fn main() -> Result<()> {
    let run_start = Instant::now();

    let args = parse();

    let log_level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    Builder::new()
        .filter_level(log_level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {}: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();

    let defaults = ToolDefaults::parse(DEFAULTS_SOURCE)?;
    println!("\n-------------\n ViralConsensus Runner v{}\n-------------\n", defaults.version);

    let dir = env::current_dir()?;
    info!("The current directory is {:?}", dir);

    if args.reference.is_none()
        && args.alignment.is_none()
        && !args.example_reference
        && !args.example_alignment
    {
        cli::Arguments::command().print_help()?;
        return Ok(());
    }

    // Keep the TempDir guard alive for the whole run.
    let mut _workspace_guard = None;
    let workdir: PathBuf = match &args.workdir {
        Some(path) => PathBuf::from(path),
        None => {
            let tmp = tempfile::Builder::new()
                .prefix("consensus_run_")
                .tempdir()
                .context("Failed to create workspace directory")?;
            let path = tmp.path().to_path_buf();
            _workspace_guard = Some(tmp);
            path
        }
    };
    info!("The execution workspace is {:?}", workdir);

    let mut runtime = LocalRuntime::new(&workdir);
    runtime.init(&required_tools()).await?;

    let mut controller = RunController::new(runtime, &defaults, ExampleData::bundled());
    apply_arguments(&mut controller, &args)?;

    let out_dir = match &args.out_dir {
        Some(out) => {
            let path = PathBuf::from(out);
            if path.is_absolute() { path } else { dir.join(path) }
        }
        None => dir.join("consensus_out"),
    };

    match controller.submit().await {
        Ok(RunState::Done) => {
            let outputs = controller.download_outputs().await?;
            fs::create_dir_all(&out_dir)?;
            for output in &outputs {
                let target = out_dir.join(&output.name);
                fs::write(&target, &output.bytes)?;
                info!("Wrote {:?}", target);
            }
            println!("Run complete: {} milliseconds.", run_start.elapsed().as_millis());
            Ok(())
        }
        Ok(RunState::Invalid) => {
            error!("Invalid input. Please check your input and try again.");
            std::process::exit(1);
        }
        Ok(state) => {
            error!("Run ended in unexpected state {:?}", state);
            std::process::exit(1);
        }
        Err(e) => {
            error!(
                "Pipeline failed: {} at {} milliseconds.",
                e,
                run_start.elapsed().as_millis()
            );
            std::process::exit(1);
        }
    }
}

/// Feeds the command-line values into the run form, reading upload files
/// into memory. Invalid numeric text is kept for the validator to flag at
/// submission rather than rejected here.
fn apply_arguments<R: SandboxRuntime>(
    controller: &mut RunController<R>,
    args: &cli::Arguments,
) -> Result<(), PipelineError> {
    if args.example_reference {
        controller.inputs.set_reference(InputFileRef::Example);
    } else if let Some(path) = &args.reference {
        controller.inputs.set_reference(read_upload(path)?);
    }

    if args.example_alignment {
        controller.inputs.set_alignment(InputFileRef::Example);
    } else if let Some(path) = &args.alignment {
        controller.inputs.set_alignment(read_upload(path)?);
    }

    if let Some(path) = &args.primer {
        controller.inputs.set_primer(read_upload(path)?);
    }

    if let Some(raw) = &args.primer_offset {
        controller.inputs.set_primer_offset(raw);
    }
    if let Some(raw) = &args.min_base_quality {
        controller.inputs.set_min_base_quality(raw);
    }
    if let Some(raw) = &args.min_depth {
        controller.inputs.set_min_depth(raw);
    }
    if let Some(raw) = &args.min_freq {
        controller.inputs.set_min_freq(raw);
    }
    if let Some(raw) = &args.ambig_symbol {
        controller.inputs.set_ambig_symbol(raw);
    }
    if args.position_counts {
        controller.inputs.set_gen_pos_counts(true);
    }
    if args.insertion_counts {
        controller.inputs.set_gen_ins_counts(true);
    }

    Ok(())
}

fn read_upload(path: &str) -> Result<InputFileRef, PipelineError> {
    let path = Path::new(path);
    let bytes = fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());
    Ok(InputFileRef::Upload { name, bytes })
}
