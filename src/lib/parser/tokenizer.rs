use super::{
    pipelines::{RedirectKind, Redirection},
    ParseError,
};
use std::fmt;

/// A classified piece of an input line.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Token {
    /// A program name or argument.
    Word(String),
    /// `|`
    Pipe,
    /// `&`
    Parallel,
    /// `>`, `>>` or `<`, together with the filename that followed it.
    Redirect(Redirection),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Word(word) => f.write_str(word),
            Token::Pipe => f.write_str("|"),
            Token::Parallel => f.write_str("&"),
            Token::Redirect(redirection) => write!(f, "{}", redirection),
        }
    }
}

/// Splits one whitespace-delimited chunk at every `|` and `&`, dropping the
/// empty words in between.
fn split_chunk(chunk: &str, tokens: &mut Vec<Token>) {
    let mut start = 0;
    for (index, byte) in chunk.bytes().enumerate() {
        let operator = match byte {
            b'|' => Token::Pipe,
            b'&' => Token::Parallel,
            _ => continue,
        };
        if start < index {
            tokens.push(Token::Word(chunk[start..index].into()));
        }
        tokens.push(operator);
        start = index + 1;
    }
    if start < chunk.len() {
        tokens.push(Token::Word(chunk[start..].into()));
    }
}

/// Tokenizes a line of input.
///
/// Pipe and parallel operators are recognized anywhere, even when glued to a
/// word (`ls|wc`). Redirection operators must stand alone and take the next
/// word as their target.
pub fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut chunks = input.split_whitespace();

    while let Some(chunk) = chunks.next() {
        let kind = match RedirectKind::from_operator(chunk) {
            Some(kind) => kind,
            None => {
                split_chunk(chunk, &mut tokens);
                continue;
            }
        };

        let target = chunks.next().ok_or(ParseError::MissingRedirectTarget(kind))?;
        let mut pieces = Vec::new();
        split_chunk(target, &mut pieces);
        let mut pieces = pieces.into_iter();
        match pieces.next() {
            Some(Token::Word(target)) => {
                tokens.push(Token::Redirect(Redirection { kind, target }));
                tokens.extend(pieces);
            }
            _ => return Err(ParseError::MissingRedirectTarget(kind)),
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(word: &str) -> Token { Token::Word(word.into()) }

    fn redirect(kind: RedirectKind, target: &str) -> Token {
        Token::Redirect(Redirection { kind, target: target.into() })
    }

    #[test]
    fn tokenize_empty_string() {
        assert_eq!(tokenize("").unwrap(), Vec::<Token>::new());
        assert_eq!(tokenize(" \t   ").unwrap(), Vec::<Token>::new());
    }

    #[test]
    fn tokenize_multiple_words() {
        assert_eq!(tokenize("  one two\tthree ").unwrap(), vec![
            word("one"),
            word("two"),
            word("three")
        ]);
    }

    #[test]
    fn operators_glued_to_words() {
        assert_eq!(tokenize("ls|wc -l&").unwrap(), vec![
            word("ls"),
            Token::Pipe,
            word("wc"),
            word("-l"),
            Token::Parallel
        ]);
        assert_eq!(tokenize("a||b").unwrap(), vec![word("a"), Token::Pipe, Token::Pipe, word("b")]);
        assert_eq!(tokenize("&|").unwrap(), vec![Token::Parallel, Token::Pipe]);
    }

    #[test]
    fn redirections_take_the_next_word() {
        assert_eq!(tokenize("sort < in >> out").unwrap(), vec![
            word("sort"),
            redirect(RedirectKind::Input, "in"),
            redirect(RedirectKind::Append, "out")
        ]);
    }

    #[test]
    fn redirection_target_glued_to_pipe() {
        assert_eq!(tokenize("cat > out|wc").unwrap(), vec![
            word("cat"),
            redirect(RedirectKind::Output, "out"),
            Token::Pipe,
            word("wc")
        ]);
    }

    #[test]
    fn redirection_not_split_mid_word() {
        assert_eq!(tokenize("echo a>b").unwrap(), vec![word("echo"), word("a>b")]);
    }

    #[test]
    fn dangling_redirection() {
        assert_eq!(tokenize("cmd1 >"), Err(ParseError::MissingRedirectTarget(RedirectKind::Output)));
        assert_eq!(tokenize("cmd1 <"), Err(ParseError::MissingRedirectTarget(RedirectKind::Input)));
        assert_eq!(
            tokenize("cmd1 >> | wc"),
            Err(ParseError::MissingRedirectTarget(RedirectKind::Append))
        );
        assert_eq!(
            tokenize("cmd1 > &"),
            Err(ParseError::MissingRedirectTarget(RedirectKind::Output))
        );
    }
}
