use crate::shell::ast::{Command, CommandLine, Expr, OutputTarget};
use crate::shell::error::ParseError;
use std::mem;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Pipe,
    And,
    Or,
    RedirectNew,
    RedirectAppend,
    Unsupported(&'static str),
    Unterminated,
}

impl Token {
    fn symbol(&self) -> &'static str {
        match self {
            Token::Word(_) => "word",
            Token::Pipe => "|",
            Token::And => "&&",
            Token::Or => "||",
            Token::RedirectNew => ">",
            Token::RedirectAppend => ">>",
            Token::Unsupported(s) => s,
            Token::Unterminated => "quote",
        }
    }

    fn continues_line(&self) -> bool {
        matches!(self, Token::Pipe | Token::And | Token::Or)
    }
}

enum Scan {
    Complete {
        tokens: Vec<Token>,
        consumed: usize,
    },
    Incomplete,
}

/// Incremental parser: raw bytes go in through `feed`, complete command
/// lines come out of `pop_next`.
#[derive(Debug, Default)]
pub struct Parser {
    raw: Vec<u8>,
    text: String,
    eof: bool,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        self.raw.extend_from_slice(bytes);
    }

    /// No more input will arrive; whatever is buffered is the last line.
    pub fn finish(&mut self) {
        self.eof = true;
    }

    pub fn pop_next(&mut self) -> Result<Option<CommandLine>, ParseError> {
        self.decode_ready();
        loop {
            if self.text.is_empty() {
                return Ok(None);
            }
            match scan(&self.text, self.eof) {
                Scan::Incomplete => return Ok(None),
                Scan::Complete { tokens, consumed } => {
                    self.text.drain(..consumed);
                    if tokens.is_empty() {
                        continue;
                    }
                    return build(tokens).map(Some);
                }
            }
        }
    }

    // Newlines are always UTF-8 boundaries, so decoding whole lines is safe
    // even when a multi-byte character was split across two reads.
    fn decode_ready(&mut self) {
        let end = if self.eof {
            self.raw.len()
        } else {
            match self.raw.iter().rposition(|&b| b == b'\n') {
                Some(i) => i + 1,
                None => return,
            }
        };
        let ready: Vec<u8> = self.raw.drain(..end).collect();
        self.text.push_str(&String::from_utf8_lossy(&ready));
    }
}

fn scan(text: &str, eof: bool) -> Scan {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut word_started = false;
    let mut in_single_quote = false;
    let mut in_double_quote = false;
    let mut escaped = false;

    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if escaped {
            escaped = false;
            // backslash-newline joins lines
            if c != '\n' {
                current.push(c);
                word_started = true;
            }
            continue;
        }

        if in_single_quote {
            if c == '\'' {
                in_single_quote = false;
            } else {
                current.push(c);
            }
            continue;
        }

        if in_double_quote {
            match c {
                '"' => in_double_quote = false,
                '\\' => match chars.peek() {
                    Some(&(_, '"' | '\\' | '$')) => {
                        let (_, next) = chars.next().unwrap_or((i, c));
                        current.push(next);
                    }
                    Some(&(_, '\n')) => {
                        chars.next();
                    }
                    _ => current.push(c),
                },
                _ => current.push(c),
            }
            continue;
        }

        match c {
            '\\' => escaped = true,
            '\'' => {
                in_single_quote = true;
                word_started = true;
            }
            '"' => {
                in_double_quote = true;
                word_started = true;
            }
            '#' if !word_started => {
                while let Some(&(_, next)) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            '\n' => {
                flush_word(&mut tokens, &mut current, &mut word_started);
                if tokens.last().is_some_and(Token::continues_line) {
                    continue;
                }
                return Scan::Complete {
                    tokens,
                    consumed: i + 1,
                };
            }
            c if c.is_whitespace() => flush_word(&mut tokens, &mut current, &mut word_started),
            '|' | '&' | '>' | ';' => {
                flush_word(&mut tokens, &mut current, &mut word_started);
                let doubled = chars.peek().is_some_and(|&(_, next)| next == c);
                let token = match (c, doubled) {
                    ('|', true) => Token::Or,
                    ('|', false) => Token::Pipe,
                    ('&', true) => Token::And,
                    ('&', false) => Token::Unsupported("&"),
                    ('>', true) => Token::RedirectAppend,
                    ('>', false) => Token::RedirectNew,
                    _ => Token::Unsupported(";"),
                };
                if doubled && c != ';' {
                    chars.next();
                }
                tokens.push(token);
            }
            _ => {
                current.push(c);
                word_started = true;
            }
        }
    }

    if !eof {
        return Scan::Incomplete;
    }
    if in_single_quote || in_double_quote {
        return Scan::Complete {
            tokens: vec![Token::Unterminated],
            consumed: text.len(),
        };
    }
    flush_word(&mut tokens, &mut current, &mut word_started);
    Scan::Complete {
        tokens,
        consumed: text.len(),
    }
}

fn flush_word(tokens: &mut Vec<Token>, current: &mut String, word_started: &mut bool) {
    if *word_started {
        tokens.push(Token::Word(mem::take(current)));
        *word_started = false;
    }
}

fn build(tokens: Vec<Token>) -> Result<CommandLine, ParseError> {
    let mut exprs = Vec::new();
    let mut words: Vec<String> = Vec::new();
    let mut out = OutputTarget::Stdout;
    let mut last_symbol = "";

    let mut iter = tokens.into_iter();
    while let Some(token) = iter.next() {
        match token {
            Token::Word(w) => words.push(w),
            Token::Pipe | Token::And | Token::Or => {
                if words.is_empty() {
                    return Err(ParseError::MissingCommand(token.symbol()));
                }
                exprs.push(Expr::Command(Command::new(mem::take(&mut words))));
                exprs.push(match token {
                    Token::Pipe => Expr::Pipe,
                    Token::And => Expr::And,
                    _ => Expr::Or,
                });
                last_symbol = token.symbol();
            }
            Token::RedirectNew | Token::RedirectAppend => {
                let symbol = token.symbol();
                let Some(Token::Word(path)) = iter.next() else {
                    return Err(ParseError::MissingRedirectTarget(symbol));
                };
                if out != OutputTarget::Stdout {
                    return Err(ParseError::DuplicateRedirect);
                }
                out = if token == Token::RedirectNew {
                    OutputTarget::NewFile(path.into())
                } else {
                    OutputTarget::AppendFile(path.into())
                };
                last_symbol = symbol;
            }
            Token::Unsupported(symbol) => return Err(ParseError::UnsupportedOperator(symbol)),
            Token::Unterminated => return Err(ParseError::UnterminatedQuote),
        }
    }

    if words.is_empty() {
        return Err(ParseError::MissingCommand(last_symbol));
    }
    exprs.push(Expr::Command(Command::new(words)));
    Ok(CommandLine::new(exprs, out))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_all(input: &str) -> Vec<Result<CommandLine, ParseError>> {
        let mut parser = Parser::new();
        parser.feed(input.as_bytes());
        parser.finish();
        let mut lines = Vec::new();
        loop {
            match parser.pop_next() {
                Ok(Some(line)) => lines.push(Ok(line)),
                Ok(None) => break,
                Err(e) => lines.push(Err(e)),
            }
        }
        lines
    }

    fn cmd(args: &[&str]) -> Expr {
        Expr::Command(Command::new(args.iter().map(|s| s.to_string()).collect()))
    }

    #[test]
    fn test_parser_basic() {
        let lines = parse_all("echo hello world\n");
        assert_eq!(lines.len(), 1);
        let line = lines[0].as_ref().unwrap();
        assert_eq!(line.exprs, vec![cmd(&["echo", "hello", "world"])]);
        assert_eq!(line.out, OutputTarget::Stdout);
        if let Expr::Command(c) = &line.exprs[0] {
            assert_eq!(c.executable, "echo");
            assert_eq!(c.arg_count(), 2);
        }
    }

    #[test]
    fn test_operators_and_redirect() {
        let line = parse_all("ls -l | grep x && echo ok || echo no >> log.txt")
            .remove(0)
            .unwrap();
        assert_eq!(
            line.exprs,
            vec![
                cmd(&["ls", "-l"]),
                Expr::Pipe,
                cmd(&["grep", "x"]),
                Expr::And,
                cmd(&["echo", "ok"]),
                Expr::Or,
                cmd(&["echo", "no"]),
            ]
        );
        assert_eq!(line.out, OutputTarget::AppendFile("log.txt".into()));
    }

    #[test]
    fn test_operators_without_spaces() {
        let line = parse_all("echo a|cat>out").remove(0).unwrap();
        assert_eq!(line.exprs, vec![cmd(&["echo", "a"]), Expr::Pipe, cmd(&["cat"])]);
        assert_eq!(line.out, OutputTarget::NewFile("out".into()));
    }

    #[test]
    fn test_quotes_keep_operators_literal() {
        let line = parse_all(r#"echo 'a | b' "c && \"d\"" e\ f"#).remove(0).unwrap();
        assert_eq!(line.exprs, vec![cmd(&["echo", "a | b", "c && \"d\"", "e f"])]);
    }

    #[test]
    fn test_empty_quotes_make_a_word() {
        let line = parse_all("echo '' x").remove(0).unwrap();
        assert_eq!(line.exprs, vec![cmd(&["echo", "", "x"])]);
    }

    #[test]
    fn test_incomplete_input_waits() {
        let mut parser = Parser::new();
        parser.feed(b"echo hel");
        assert_eq!(parser.pop_next(), Ok(None));
        parser.feed(b"lo\necho second\n");
        let first = parser.pop_next().unwrap().unwrap();
        assert_eq!(first.exprs, vec![cmd(&["echo", "hello"])]);
        let second = parser.pop_next().unwrap().unwrap();
        assert_eq!(second.exprs, vec![cmd(&["echo", "second"])]);
        assert_eq!(parser.pop_next(), Ok(None));
    }

    #[test]
    fn test_trailing_operator_continues_line() {
        let mut parser = Parser::new();
        parser.feed(b"echo a |\n");
        assert_eq!(parser.pop_next(), Ok(None));
        parser.feed(b"cat\n");
        let line = parser.pop_next().unwrap().unwrap();
        assert_eq!(line.exprs, vec![cmd(&["echo", "a"]), Expr::Pipe, cmd(&["cat"])]);
    }

    #[test]
    fn test_open_quote_spans_newline() {
        let mut parser = Parser::new();
        parser.feed(b"echo 'a\n");
        assert_eq!(parser.pop_next(), Ok(None));
        parser.feed(b"b'\n");
        let line = parser.pop_next().unwrap().unwrap();
        assert_eq!(line.exprs, vec![cmd(&["echo", "a\nb"])]);
    }

    #[test]
    fn test_split_utf8_sequence() {
        let bytes = "echo héllo\n".as_bytes();
        let mut parser = Parser::new();
        parser.feed(&bytes[..7]);
        assert_eq!(parser.pop_next(), Ok(None));
        parser.feed(&bytes[7..]);
        let line = parser.pop_next().unwrap().unwrap();
        assert_eq!(line.exprs, vec![cmd(&["echo", "héllo"])]);
    }

    #[test]
    fn test_blank_lines_and_comments() {
        let lines = parse_all("\n   \n# just a comment\necho a # trailing\n");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].as_ref().unwrap().exprs, vec![cmd(&["echo", "a"])]);
    }

    #[test]
    fn test_syntax_errors() {
        assert_eq!(parse_all("| cat")[0], Err(ParseError::MissingCommand("|")));
        assert_eq!(parse_all("echo a &&")[0], Err(ParseError::MissingCommand("&&")));
        assert_eq!(parse_all("echo a >")[0], Err(ParseError::MissingRedirectTarget(">")));
        assert_eq!(parse_all("echo a > x >> y")[0], Err(ParseError::DuplicateRedirect));
        assert_eq!(parse_all("sleep 1 &")[0], Err(ParseError::UnsupportedOperator("&")));
        assert_eq!(parse_all("a; b")[0], Err(ParseError::UnsupportedOperator(";")));
        assert_eq!(parse_all("echo 'oops")[0], Err(ParseError::UnterminatedQuote));
    }

    #[test]
    fn test_error_does_not_poison_following_lines() {
        let lines = parse_all("| bad\necho good\n");
        assert_eq!(lines.len(), 2);
        assert!(lines[0].is_err());
        assert_eq!(lines[1].as_ref().unwrap().exprs, vec![cmd(&["echo", "good"])]);
    }
}
