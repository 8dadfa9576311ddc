//! Tokenizer for comment-free statement text

/// One lexical token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Word(String),
    /// A token that contained a quoted section, with quotes and escapes removed
    Quoted(String),
    Open,
    Close,
    Newline,
}

impl Token {
    /// Text of a word or quoted token
    pub fn text(&self) -> Option<&str> {
        match self {
            Token::Word(s) | Token::Quoted(s) => Some(s),
            _ => None,
        }
    }
}

/// Split statement text into tokens.
///
/// Braces outside quotes are always delimiters. A backslash takes the next
/// character literally, inside quotes or not. An unterminated quote runs to
/// the end of the input.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut in_token = false;
    let mut in_quote = false;
    let mut chars = text.chars();

    let flush = |tokens: &mut Vec<Token>, current: &mut String, quoted: &mut bool, in_token: &mut bool| {
        if *in_token {
            let text = std::mem::take(current);
            tokens.push(if *quoted {
                Token::Quoted(text)
            } else {
                Token::Word(text)
            });
        }
        *quoted = false;
        *in_token = false;
    };

    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                current.push(next);
            }
            in_token = true;
            continue;
        }
        if in_quote {
            if c == '"' {
                in_quote = false;
            } else {
                current.push(c);
            }
            continue;
        }
        match c {
            '"' => {
                in_quote = true;
                quoted = true;
                in_token = true;
            }
            '{' | '}' | '\n' => {
                flush(&mut tokens, &mut current, &mut quoted, &mut in_token);
                tokens.push(match c {
                    '{' => Token::Open,
                    '}' => Token::Close,
                    _ => Token::Newline,
                });
            }
            c if c.is_whitespace() => {
                flush(&mut tokens, &mut current, &mut quoted, &mut in_token);
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }
    flush(&mut tokens, &mut current, &mut quoted, &mut in_token);
    tokens
}
