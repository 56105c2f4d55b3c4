use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;

pub const USAGE: &str = "Usage: stack-tox 'SMILES_STRING'";

#[derive(Parser)]
#[command(
    name = "stack-tox",
    about = "Predict whether a molecule is toxic from its SMILES string",
    long_about = "Predict whether a molecule is toxic from its SMILES string.\n\n\
                  Artifacts (stacking_clf_model.json, scaler.json, imputer.json,\n\
                  descriptor_list.txt) are read from the current directory, or from\n\
                  STACK_TOX_ARTIFACT_DIR when set. Set RUST_LOG=debug for diagnostics.",
    version
)]
pub struct Cli {
    /// Molecule in SMILES notation (quote it in the shell)
    #[arg(value_name = "SMILES", allow_hyphen_values = true)]
    pub smiles: String,
}

/// Parse the command line. Help and version exit 0; any other argument
/// error prints the usage line and exits 1.
pub fn parse() -> Result<Cli, ExitCode> {
    match Cli::try_parse() {
        Ok(cli) => Ok(cli),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                let _ = err.print();
                Err(ExitCode::SUCCESS)
            }
            _ => {
                println!("{USAGE}");
                Err(ExitCode::FAILURE)
            }
        },
    }
}
