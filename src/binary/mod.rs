//! Contains the binary logic of mish.
use mish::{Flow, Shell};
use std::{
    env,
    io::{self, BufRead, Write},
};

pub const MAN_MISH: &str = "NAME
    mish - a minimal pipeline shell

SYNOPSIS
    mish [options] [file]

DESCRIPTION
    Runs command lines made of stages joined by pipes (|) and parallel
    operators (&), with >, >> and < redirections.

OPTIONS:
    -c <command>        evaluates the given command instead of reading input.

    -n or --no-execute
        do not execute any commands, just do syntax checking.

    -x  print every line before it is executed.

    -v or --version
        prints the version of mish then exits.

    -h or --help
        prints this message then exits.

ARGS:
    <file>    a file whose lines are executed one after another.

ENVIRONMENT:
    MISH_LOG    log level written to stderr (error, warn, info, debug, trace).";

/// Reads lines from `reader` and executes each of them until input ends or
/// `exit` is run. Returns the status the process should exit with.
pub fn execute_script<R: BufRead>(shell: &mut Shell, reader: R) -> i32 {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(why) => {
                eprintln!("mish: failed to read input: {}", why);
                return 1;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        if shell.on_command(&line) == Flow::Exit {
            return 0;
        }
    }
    shell.previous_status().as_os_code()
}

pub struct InteractiveBinary {
    shell: Shell,
}

impl InteractiveBinary {
    pub fn new(shell: Shell) -> Self { InteractiveBinary { shell } }

    fn prompt() -> String {
        let cwd = env::current_dir()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|_| "?".into());
        format!("mish:{}$ ", cwd)
    }

    /// Prompts for and executes lines until end of input or `exit`.
    pub fn execute_interactive(mut self) -> i32 {
        let stdin = io::stdin();
        let mut line = String::new();
        loop {
            print!("{}", Self::prompt());
            let _ = io::stdout().flush();

            line.clear();
            match stdin.lock().read_line(&mut line) {
                Ok(0) => {
                    println!();
                    return 0;
                }
                Ok(_) => (),
                Err(why) => {
                    eprintln!("mish: failed to read input: {}", why);
                    return 1;
                }
            }

            if self.shell.on_command(&line) == Flow::Exit {
                return 0;
            }
        }
    }
}
