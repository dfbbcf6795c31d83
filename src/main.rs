mod binary;

use self::binary::{execute_script, InteractiveBinary, MAN_MISH};
use log::LevelFilter;
use mish::{Options, Shell};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use std::{
    env,
    fs::File,
    io::{self, BufReader},
    process,
};

/// Installs a stderr logger when `MISH_LOG` names a level.
fn init_logging() {
    let level = match env::var("MISH_LOG").ok().and_then(|level| level.parse().ok()) {
        Some(level) => level,
        None => return,
    };
    if level != LevelFilter::Off {
        let _ = TermLogger::init(level, Config::default(), TerminalMode::Stderr, ColorChoice::Auto);
    }
}

fn usage() -> ! {
    eprintln!("usage: mish [-n] [-x] [-c command | file]");
    process::exit(1);
}

fn main() {
    init_logging();

    let mut opts = Options::default();
    let mut command = None;
    let mut files = Vec::new();

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-c" => match args.next() {
                Some(line) => command = Some(line),
                None => {
                    eprintln!("mish: -c requires a command");
                    process::exit(1);
                }
            },
            "-n" | "--no-execute" => opts.no_exec = true,
            "-x" => opts.print_comms = true,
            "-v" | "--version" => {
                println!("{}", mish::version());
                return;
            }
            "-h" | "--help" => {
                println!("{}", MAN_MISH);
                return;
            }
            _ if arg.starts_with('-') && arg.len() > 1 => {
                eprintln!("mish: unknown option: {}", arg);
                usage();
            }
            _ => files.push(arg),
        }
    }

    let mut shell = Shell::with_options(opts);
    let stdin = io::stdin();
    let status = match (command, files.as_slice()) {
        (Some(command), []) => execute_script(&mut shell, command.as_bytes()),
        (None, []) if atty::is(atty::Stream::Stdin) => {
            InteractiveBinary::new(shell).execute_interactive()
        }
        (None, []) => execute_script(&mut shell, stdin.lock()),
        (None, [path]) => match File::open(path) {
            Ok(file) => execute_script(&mut shell, BufReader::new(file)),
            Err(why) => {
                eprintln!("mish: failed to open file: {}", why);
                1
            }
        },
        _ => usage(),
    };
    process::exit(status);
}
