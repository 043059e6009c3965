use std::env::args_os;
use std::process::ExitCode;

use stereo_ppm_io::{extract_channel, CLIParser};

fn main() -> ExitCode {
    let mut cli_parser = CLIParser::default();
    let arguments = cli_parser.parse(args_os());
    match extract_channel(&arguments) {
        Ok(_) => {
            println!("Extraction successful");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Extraction failed because of: {}", e);
            ExitCode::FAILURE
        }
    }
}
