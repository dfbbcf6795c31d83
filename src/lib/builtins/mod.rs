mod echo;

use self::echo::echo;
use crate::shell::status::Status;
use std::{
    env,
    io::{self, Write},
};

/// A built-in receives its full argument vector, including its own name, and
/// writes its output to `out`.
pub type BuiltinFunction = fn(&[String], &mut dyn Write) -> Status;

macro_rules! map {
    ($($name:expr => $func:ident),+) => {{
        BuiltinMap {
            name: &[$($name),+],
            functions: &[$($func),+],
        }
    }}
}

/// Builtins are in A-Z order.
pub const BUILTINS: &BuiltinMap = &map!(
    "cd" => builtin_cd,
    "clear" => builtin_clear,
    "echo" => builtin_echo,
    "export" => builtin_export
);

/// Commands that run inside the shell instead of being looked up on `PATH`.
pub struct BuiltinMap {
    pub(crate) name:      &'static [&'static str],
    pub(crate) functions: &'static [BuiltinFunction],
}

impl BuiltinMap {
    pub fn get(&self, func: &str) -> Option<BuiltinFunction> {
        self.name.binary_search(&func).ok().map(|pos| self.functions[pos])
    }

    /// The built-in that handles a stage whose first word is `command`. A
    /// `VAR=value` word sets an environment variable.
    pub fn lookup(&self, command: &str) -> Option<BuiltinFunction> {
        match self.get(command) {
            Some(main) => Some(main),
            None if is_assignment(command) => Some(builtin_assign as BuiltinFunction),
            None => None,
        }
    }
}

/// Splits a `NAME=value` word, where `NAME` is a valid variable name.
pub fn assignment(word: &str) -> Option<(&str, &str)> {
    let eq = word.find('=')?;
    let (name, value) = (&word[..eq], &word[eq + 1..]);
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first == '_' || first.is_ascii_alphabetic() => (),
        _ => return None,
    }
    if chars.all(|c| c == '_' || c.is_ascii_alphanumeric()) {
        Some((name, value))
    } else {
        None
    }
}

pub fn is_assignment(word: &str) -> bool { assignment(word).is_some() }

fn set_variables(command: &str, words: &[String]) -> Status {
    for word in words {
        match assignment(word) {
            Some((name, value)) => env::set_var(name, value),
            None => {
                return Status::error(format!(
                    "mish: {}: incorrect format '{}', use VAR=value",
                    command, word
                ))
            }
        }
    }
    Status::SUCCESS
}

pub fn builtin_cd(args: &[String], _: &mut dyn Write) -> Status {
    let dir = match args {
        [_] => match env::var("HOME") {
            Ok(home) => home,
            Err(_) => return Status::error("mish: cd: HOME is not set"),
        },
        [_, dir] => dir.clone(),
        _ => return Status::error("mish: cd: too many arguments"),
    };

    match env::set_current_dir(&dir) {
        Ok(()) => Status::SUCCESS,
        Err(why) => Status::error(format!("mish: cd: {}: {}", dir, why)),
    }
}

fn builtin_clear(_: &[String], out: &mut dyn Write) -> Status {
    let result: io::Result<()> = out.write_all(b"\x1b[2J\x1b[1;1H").and_then(|_| out.flush());
    result.into()
}

fn builtin_echo(args: &[String], out: &mut dyn Write) -> Status { echo(args, out).into() }

fn builtin_export(args: &[String], _: &mut dyn Write) -> Status {
    if args.len() < 2 {
        return Status::error("mish: export: expected VAR=value");
    }
    set_variables("export", &args[1..])
}

fn builtin_assign(args: &[String], _: &mut dyn Write) -> Status {
    set_variables("assignment", args)
}
