use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use stack_tox::{Pipeline, PipelineConfig, PipelineError, Prediction};

mod cli;
mod display;

enum Outcome {
    Predicted(Prediction),
    InvalidInput,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = match cli::parse() {
        Ok(cli) => cli,
        Err(code) => return code,
    };

    let pipeline = Pipeline::new(PipelineConfig::from_env());
    let mut stdout = io::stdout().lock();

    match run(&pipeline, &cli.smiles, &mut stdout) {
        Ok(Outcome::Predicted(prediction)) => {
            let _ = writeln!(stdout, "{prediction}");
            ExitCode::SUCCESS
        }
        Ok(Outcome::InvalidInput) => {
            let _ = writeln!(stdout, "Invalid SMILES notation.");
            ExitCode::FAILURE
        }
        Err(e) => {
            let _ = stdout.flush();
            display::print_error(&e);
            ExitCode::FAILURE
        }
    }
}

fn run(pipeline: &Pipeline, smiles: &str, out: &mut impl Write) -> anyhow::Result<Outcome> {
    match pipeline.run(smiles, out) {
        Ok(prediction) => Ok(Outcome::Predicted(prediction)),
        Err(PipelineError::InvalidInput { .. }) => Ok(Outcome::InvalidInput),
        Err(e) => Err(e).with_context(|| {
            format!(
                "failed to classify '{smiles}' with artifacts from {}",
                pipeline.config().artifact_dir().display()
            )
        }),
    }
}
