use clap::{Arg, ArgAction, Command as ClapCommand};
use std::process;

use slidescrub::commands::{Command, RedactCommand};

fn main() {
    let matches = ClapCommand::new("slidescrub")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Delete the slide label from an MRXS, NDPI, SVS or Ventana whole-slide image")
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .help("Show debugging information")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("files")
                .help("Slide files to redact")
                .value_name("FILE")
                .required(true)
                .num_args(1..),
        )
        .get_matches();

    let level = if matches.get_flag("debug") {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new().filter_level(level).init();

    let command = match RedactCommand::new(&matches) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if command.execute().is_err() {
        process::exit(1);
    }
}
