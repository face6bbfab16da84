mod cli;
mod orchestrate;

use std::process::ExitCode;

use cli::Cli;
use log::{error, info, warn, Level};

use corth::diagnostics::Severity;
use corth::options::Mode;

fn main() -> ExitCode {
    let args = Cli::init();
    let level = if args.verbose { Level::Debug } else { Level::Info };
    simple_logger::init_with_level(level).expect("logger can only be initialized once");

    let options = args.to_options();

    let report = match corth::compile(&options) {
        Ok(report) => report,
        Err(err) => {
            error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    for diagnostic in &report.diagnostics {
        match diagnostic.severity {
            Severity::Warning => warn!("{diagnostic}"),
            Severity::Error => error!("{diagnostic}"),
        }
    }

    info!("wrote {}", report.output_path.display());

    if options.mode == Mode::Compile {
        if let Err(err) = orchestrate::assemble_and_link(&report.output_path, &options) {
            error!("{err}");
            return ExitCode::FAILURE;
        }
        info!("wrote {}", options.output_name);
    }

    ExitCode::SUCCESS
}
