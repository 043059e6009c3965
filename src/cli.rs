use crate::image::writer::pgm::GrayEncoding;
use crate::{Arguments, Channel, Side};
use clap::{
    arg, crate_authors, crate_description, crate_name, crate_version, value_parser, Arg,
    ArgAction, ArgMatches, Command,
};
use std::ffi::OsString;
use std::path::PathBuf;

pub struct CLIParser {
    command: Command,
}

impl CLIParser {
    pub fn new() -> Self {
        let command = Self::create_base_command();
        let command = Self::register_arguments(command);
        CLIParser { command }
    }

    pub fn parse<I, T>(&mut self, itr: I) -> Arguments
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = self
            .command
            .try_get_matches_from_mut(itr)
            .unwrap_or_else(|e| e.exit());
        Self::extract_arguments(&matches)
    }

    fn register_arguments(command: Command) -> Command {
        let command = Self::register_left_file_argument(command);
        let command = Self::register_right_file_argument(command);
        let command = Self::register_output_file_argument(command);
        let command = Self::register_dimension_arguments(command);
        let command = Self::register_side_argument(command);
        let command = Self::register_channel_argument(command);
        Self::register_ascii_argument(command)
    }

    fn register_left_file_argument(command: Command) -> Command {
        command.arg(Self::create_left_file_argument())
    }

    fn register_right_file_argument(command: Command) -> Command {
        command.arg(Self::create_right_file_argument())
    }

    fn register_output_file_argument(command: Command) -> Command {
        command.arg(Self::create_output_file_argument())
    }

    fn register_dimension_arguments(command: Command) -> Command {
        command
            .arg(Self::create_height_argument())
            .arg(Self::create_width_argument())
    }

    fn register_side_argument(command: Command) -> Command {
        command.arg(Self::create_side_argument())
    }

    fn register_channel_argument(command: Command) -> Command {
        command.arg(Self::create_channel_argument())
    }

    fn register_ascii_argument(command: Command) -> Command {
        command.arg(Self::create_ascii_argument())
    }

    fn create_base_command() -> Command {
        Command::new(crate_name!())
            .version(crate_version!())
            .author(crate_authors!())
            .about(crate_description!())
    }

    fn create_left_file_argument() -> Arg {
        Arg::new("left_file")
            .help("Path to the left PPM image of the stereo pair")
            .value_parser(value_parser!(PathBuf))
            .required(true)
    }

    fn create_right_file_argument() -> Arg {
        Arg::new("right_file")
            .help("Path to the right PPM image of the stereo pair")
            .value_parser(value_parser!(PathBuf))
            .required(true)
    }

    fn create_output_file_argument() -> Arg {
        Arg::new("output_file")
            .help("Path to the PGM output file")
            .value_parser(value_parser!(PathBuf))
            .required(true)
    }

    fn create_height_argument() -> Arg {
        arg!(height: -H --height <HEIGHT> "Expected height of both images")
            .required(true)
            .value_parser(value_parser!(usize))
    }

    fn create_width_argument() -> Arg {
        arg!(width: -W --width <WIDTH> "Expected width of both images")
            .required(true)
            .value_parser(value_parser!(usize))
    }

    fn create_side_argument() -> Arg {
        arg!(side: -s --side <SIDE> "Side of the stereo pair to extract from")
            .default_value("left")
            .value_parser(value_parser!(Side))
    }

    fn create_channel_argument() -> Arg {
        arg!(channel: -c --channel <CHANNEL> "Color channel written as gray image")
            .default_value("green")
            .value_parser(value_parser!(Channel))
    }

    fn create_ascii_argument() -> Arg {
        arg!(ascii: -a --ascii "Write an ASCII (P2) instead of a binary (P5) image")
            .action(ArgAction::SetTrue)
    }

    fn extract_arguments(matches: &ArgMatches) -> Arguments {
        Arguments {
            left_file: Self::extract_left_file_argument(matches),
            right_file: Self::extract_right_file_argument(matches),
            output_file: Self::extract_output_file_argument(matches),
            height: Self::extract_height_argument(matches),
            width: Self::extract_width_argument(matches),
            side: Self::extract_side_argument(matches),
            channel: Self::extract_channel_argument(matches),
            encoding: Self::extract_encoding_argument(matches),
        }
    }

    fn extract_left_file_argument(matches: &ArgMatches) -> PathBuf {
        matches
            .get_one::<PathBuf>("left_file")
            .expect("Required argument left_file not provided")
            .clone()
    }

    fn extract_right_file_argument(matches: &ArgMatches) -> PathBuf {
        matches
            .get_one::<PathBuf>("right_file")
            .expect("Required argument right_file not provided")
            .clone()
    }

    fn extract_output_file_argument(matches: &ArgMatches) -> PathBuf {
        matches
            .get_one::<PathBuf>("output_file")
            .expect("Required argument output_file not provided")
            .clone()
    }

    fn extract_height_argument(matches: &ArgMatches) -> usize {
        matches
            .get_one::<usize>("height")
            .expect("Required argument height not provided")
            .to_owned()
    }

    fn extract_width_argument(matches: &ArgMatches) -> usize {
        matches
            .get_one::<usize>("width")
            .expect("Required argument width not provided")
            .to_owned()
    }

    fn extract_side_argument(matches: &ArgMatches) -> Side {
        matches
            .get_one::<Side>("side")
            .expect("Side must be provided, but was unset.")
            .to_owned()
    }

    fn extract_channel_argument(matches: &ArgMatches) -> Channel {
        matches
            .get_one::<Channel>("channel")
            .expect("Channel must be provided, but was unset.")
            .to_owned()
    }

    fn extract_encoding_argument(matches: &ArgMatches) -> GrayEncoding {
        if matches.get_flag("ascii") {
            GrayEncoding::Ascii
        } else {
            GrayEncoding::Binary
        }
    }
}

impl Default for CLIParser {
    fn default() -> Self {
        Self::new()
    }
}
