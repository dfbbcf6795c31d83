use smallvec::SmallVec;
use std::{
    borrow::Cow,
    env,
    io::{self, Write},
};

/// `$NAME` arguments are replaced by the value of that environment variable.
/// An unset variable expands to nothing and is skipped.
fn expand(arg: &str) -> Option<Cow<'_, str>> {
    match arg.strip_prefix('$') {
        Some(name) if !name.is_empty() => env::var(name).ok().map(Cow::Owned),
        _ => Some(Cow::Borrowed(arg)),
    }
}

pub fn echo(args: &[String], out: &mut dyn Write) -> io::Result<()> {
    let mut newline = true;
    let mut data: SmallVec<[Cow<'_, str>; 16]> = SmallVec::new();

    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "-n" | "--no-newline" if data.is_empty() => newline = false,
            _ => data.extend(expand(arg)),
        }
    }

    let mut first = true;
    for arg in &data {
        if first {
            first = false;
        } else {
            out.write_all(b" ")?;
        }
        out.write_all(arg.as_bytes())?;
    }
    if newline {
        out.write_all(b"\n")?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn run(args: &[&str]) -> String {
        let args: Vec<String> = args.iter().map(|&arg| arg.into()).collect();
        let mut out = Vec::new();
        echo(&args, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn words_are_joined() {
        assert_eq!("hello world\n", run(&["echo", "hello", "world"]));
        assert_eq!("\n", run(&["echo"]));
        assert_eq!("no newline", run(&["echo", "-n", "no", "newline"]));
        assert_eq!("a -n\n", run(&["echo", "a", "-n"]));
    }

    #[test]
    #[serial]
    fn environment_variables() {
        env::set_var("MISH_ECHO_TEST", "expanded");
        env::remove_var("MISH_ECHO_UNSET");
        assert_eq!("value: expanded\n", run(&["echo", "value:", "$MISH_ECHO_TEST"]));
        assert_eq!("\n", run(&["echo", "$MISH_ECHO_UNSET"]));
        assert_eq!("$\n", run(&["echo", "$"]));
    }
}
