//! Second pass: build a [`ConfigObject`] from one scanned statement

use crate::config::ParserSettings;
use crate::domain::{ConfigObject, Properties, Value};

use super::lexer::{Token, tokenize};
use super::path::is_object_path;
use super::scan::RawStatement;

/// Parse one statement. On failure returns the reason only; the caller knows
/// the file and lines.
pub fn parse_statement(
    raw: &RawStatement,
    settings: &ParserSettings,
) -> Result<ConfigObject, String> {
    let tokens = tokenize(&raw.stripped);
    let open = tokens
        .iter()
        .position(|t| *t == Token::Open)
        .ok_or_else(|| "missing '{' after statement header".to_string())?;

    let (type_tag, full_path) = parse_header(&tokens[..open], settings)?;

    let properties = if settings.is_raw_body(&type_tag) {
        raw_body(&raw.text)?
    } else {
        let mut cursor = Cursor {
            tokens: &tokens,
            pos: open + 1,
        };
        let body = cursor.block()?;
        if let Some(extra) = cursor.rest().iter().find(|t| **t != Token::Newline) {
            return Err(format!("unexpected {} after statement", describe(extra)));
        }
        body
    };

    Ok(ConfigObject::new(type_tag, full_path, properties))
}

/// Split the header into type tag and full path
fn parse_header(tokens: &[Token], settings: &ParserSettings) -> Result<(String, String), String> {
    let words: Vec<&Token> = tokens.iter().filter(|t| **t != Token::Newline).collect();
    let path_at = words
        .iter()
        .position(|t| t.text().is_some_and(is_object_path));

    let Some(path_at) = path_at else {
        let header = words
            .iter()
            .filter_map(|t| t.text())
            .collect::<Vec<_>>()
            .join(" ");
        if header.is_empty() {
            return Err("missing type".to_string());
        }
        if settings.is_global_kind(&header) {
            return Ok((header.clone(), header));
        }
        return Err("missing object path".to_string());
    };

    if path_at == 0 {
        return Err("missing type".to_string());
    }
    let mut type_words = Vec::with_capacity(path_at);
    for token in &words[..path_at] {
        match token {
            Token::Word(w) => type_words.push(w.as_str()),
            other => return Err(format!("unexpected {} in type", describe(other))),
        }
    }
    if let Some(extra) = words.get(path_at + 1) {
        return Err(format!("unexpected {} after object path", describe(extra)));
    }
    let full_path = words[path_at].text().unwrap_or_default().to_string();
    Ok((type_words.join(" "), full_path))
}

/// Script bodies are kept verbatim under `definition`
fn raw_body(text: &str) -> Result<Properties, String> {
    let (Some(open), Some(close)) = (text.find('{'), text.rfind('}')) else {
        return Err("unbalanced braces".to_string());
    };
    if close < open {
        return Err("unbalanced braces".to_string());
    }
    let inner = &text[open + 1..close];
    let inner = inner.strip_prefix('\n').unwrap_or(inner).trim_end();
    let mut properties = Properties::new();
    properties.insert("definition".to_string(), Value::Scalar(inner.to_string()));
    Ok(properties)
}

fn describe(token: &Token) -> String {
    match token {
        Token::Word(w) | Token::Quoted(w) => format!("'{w}'"),
        Token::Open => "'{'".to_string(),
        Token::Close => "'}'".to_string(),
        Token::Newline => "end of line".to_string(),
    }
}

/// Part of a property value: a plain word or a brace group
enum Part {
    Word(String),
    Group(Value),
}

struct Cursor<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn rest(&self) -> &'a [Token] {
        self.tokens.get(self.pos..).unwrap_or(&[])
    }

    /// Parse properties up to and including the closing brace
    fn block(&mut self) -> Result<Properties, String> {
        let mut properties = Properties::new();
        loop {
            match self.next() {
                None => return Err("unbalanced braces".to_string()),
                Some(Token::Newline) => {}
                Some(Token::Close) => return Ok(properties),
                Some(Token::Open) => return Err("unexpected '{' where a key was expected".into()),
                Some(Token::Word(key) | Token::Quoted(key)) => {
                    let value = self.value()?;
                    properties.insert(key.clone(), value);
                }
            }
        }
    }

    /// Parse the value following a key, up to end of line or the enclosing `}`
    fn value(&mut self) -> Result<Value, String> {
        let mut parts = Vec::new();
        loop {
            match self.peek() {
                None | Some(Token::Close) => break,
                Some(Token::Newline) => {
                    self.pos += 1;
                    break;
                }
                Some(Token::Word(w) | Token::Quoted(w)) => {
                    parts.push(Part::Word(w.clone()));
                    self.pos += 1;
                }
                Some(Token::Open) => {
                    self.pos += 1;
                    parts.push(Part::Group(self.group()?));
                }
            }
        }
        Ok(shape(parts))
    }

    /// A brace group: an inline list when it holds only words on one line,
    /// an inline block when those words read as key/value pairs, otherwise
    /// a nested block
    fn group(&mut self) -> Result<Value, String> {
        let mut words = Vec::new();
        for (offset, token) in self.rest().iter().enumerate() {
            match token {
                Token::Word(_) | Token::Quoted(_) => words.push(token),
                Token::Close => {
                    self.pos += offset + 1;
                    return Ok(inline_group(&words));
                }
                Token::Open | Token::Newline => break,
            }
        }
        self.block().map(Value::Block)
    }
}

/// `{ pool /Common/snat type snat }` is a block, `{ /Common/a /Common/b }`
/// a list. Pairs count as a block only when every key is a bare property
/// name and some value is not, so `{ external internal }` stays a list.
fn inline_group(words: &[&Token]) -> Value {
    let is_key = |token: &Token| match token {
        Token::Word(w) => is_property_name(w),
        _ => false,
    };
    let paired = words.len() >= 2
        && words.len() % 2 == 0
        && words.iter().step_by(2).all(|t| is_key(*t))
        && words.iter().skip(1).step_by(2).any(|t| !is_key(*t));
    if paired {
        let mut properties = Properties::new();
        for pair in words.chunks(2) {
            if let [key, value] = pair {
                properties.insert(
                    key.text().unwrap_or_default().to_string(),
                    Value::Scalar(value.text().unwrap_or_default().to_string()),
                );
            }
        }
        if properties.len() * 2 == words.len() {
            return Value::Block(properties);
        }
    }
    Value::List(
        words
            .iter()
            .filter_map(|t| t.text())
            .map(str::to_string)
            .collect(),
    )
}

fn is_property_name(word: &str) -> bool {
    word.starts_with(|c: char| c.is_ascii_lowercase())
        && word
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

fn shape(parts: Vec<Part>) -> Value {
    let words = parts.iter().filter(|p| matches!(p, Part::Word(_))).count();
    match (words, parts.len()) {
        (0, 0) => Value::List(Vec::new()),
        (1, 1) | (0, 1) => match parts.into_iter().next() {
            Some(Part::Word(w)) => Value::Scalar(w),
            Some(Part::Group(value)) => value,
            None => Value::List(Vec::new()),
        },
        _ if words == parts.len() => Value::List(
            parts
                .into_iter()
                .filter_map(|p| match p {
                    Part::Word(w) => Some(w),
                    Part::Group(_) => None,
                })
                .collect(),
        ),
        _ => {
            let mut items = Vec::new();
            for part in parts {
                match part {
                    Part::Word(w) => items.push(w),
                    Part::Group(value) => {
                        items.extend(value.named_items().into_iter().map(str::to_string));
                    }
                }
            }
            Value::List(items)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LineRange;

    fn raw(text: &str) -> RawStatement {
        let stripped = text.to_string();
        RawStatement {
            lines: LineRange::new(1, text.lines().count()),
            text: text.to_string(),
            stripped,
        }
    }

    fn parse(text: &str) -> Result<ConfigObject, String> {
        parse_statement(&raw(text), &ParserSettings::default())
    }

    fn list(items: &[&str]) -> Value {
        Value::List(items.iter().map(|s| (*s).to_string()).collect())
    }

    #[test]
    fn test_header_and_scalar_properties() {
        let obj = parse("ltm profile http /Common/http_x {\n    defaults-from /Common/http\n    insert-xforwarded-for enabled\n}").unwrap();
        assert_eq!(obj.type_tag, "ltm profile http");
        assert_eq!(obj.full_path, "/Common/http_x");
        assert_eq!(obj.get("defaults-from"), Some(&Value::Scalar("/Common/http".into())));
        assert_eq!(obj.properties.len(), 2);
    }

    #[test]
    fn test_inline_list_and_nested_blocks() {
        let obj = parse(
            "ltm virtual /Common/vs {\n    destination /Common/10.0.0.10:80\n    profiles {\n        /Common/http { }\n        /Common/tcp {\n            context all\n        }\n    }\n    vlans { /Common/external /Common/internal }\n    vlans-enabled\n}",
        )
        .unwrap();
        let profiles = obj.get("profiles").and_then(Value::as_block).unwrap();
        assert_eq!(profiles.keys().collect::<Vec<_>>(), vec!["/Common/http", "/Common/tcp"]);
        assert_eq!(profiles["/Common/http"], list(&[]));
        assert_eq!(
            profiles["/Common/tcp"].as_block().unwrap()["context"],
            Value::Scalar("all".into())
        );
        assert_eq!(obj.get("vlans"), Some(&list(&["/Common/external", "/Common/internal"])));
        assert_eq!(obj.get("vlans-enabled"), Some(&list(&[])));
    }

    #[test]
    fn test_one_line_key_value_group_is_block() {
        let obj = parse(
            "ltm virtual /Common/vs {\n    source-address-translation { pool /Common/snat type snat }\n    persist { /Common/cookie { default yes } }\n    vlans { external internal }\n}",
        )
        .unwrap();
        let snat = obj.get("source-address-translation").and_then(Value::as_block).unwrap();
        assert_eq!(snat["pool"], Value::Scalar("/Common/snat".into()));
        assert_eq!(snat["type"], Value::Scalar("snat".into()));

        let persist = obj.get("persist").and_then(Value::as_block).unwrap();
        assert_eq!(persist.keys().collect::<Vec<_>>(), vec!["/Common/cookie"]);
        assert_eq!(obj.get("vlans"), Some(&list(&["external", "internal"])));
    }

    #[test]
    fn test_one_line_group_with_repeated_key_stays_list() {
        let obj = parse("ltm pool /Common/p {\n    tags { pool /Common/a pool /Common/b }\n}").unwrap();
        assert_eq!(
            obj.get("tags"),
            Some(&list(&["pool", "/Common/a", "pool", "/Common/b"]))
        );
    }

    #[test]
    fn test_multi_word_value_is_list_and_mixed_is_flattened() {
        let obj = parse(
            "ltm pool /Common/p {\n    monitor /Common/http and /Common/tcp\n    min-monitor min 1 of { /Common/a /Common/b }\n}",
        )
        .unwrap();
        assert_eq!(obj.get("monitor"), Some(&list(&["/Common/http", "and", "/Common/tcp"])));
        assert_eq!(
            obj.get("min-monitor"),
            Some(&list(&["min", "1", "of", "/Common/a", "/Common/b"]))
        );
    }

    #[test]
    fn test_multi_line_members_block() {
        let obj = parse(
            "ltm pool /Common/p {\n    members {\n        /Common/n1:80 {\n            address 10.0.0.1\n        }\n        /Common/n2:80 { }\n    }\n}",
        )
        .unwrap();
        let members = obj.get("members").unwrap();
        assert_eq!(members.named_items(), vec!["/Common/n1:80", "/Common/n2:80"]);
    }

    #[test]
    fn test_quoted_values_and_paths() {
        let obj = parse("ltm virtual \"/Common/my vs\" {\n    description \"front { door }\"\n}").unwrap();
        assert_eq!(obj.full_path, "/Common/my vs");
        assert_eq!(obj.get("description"), Some(&Value::Scalar("front { door }".into())));
    }

    #[test]
    fn test_missing_path_and_type() {
        assert_eq!(parse("ltm pool {\n}").unwrap_err(), "missing object path");
        assert_eq!(parse("/Common/p {\n}").unwrap_err(), "missing type");
        assert!(parse("ltm pool /Common/p").unwrap_err().contains("missing '{'"));
    }

    #[test]
    fn test_global_kind_without_path() {
        let obj = parse("sys global-settings {\n    hostname bigip1.example.com\n}").unwrap();
        assert_eq!(obj.type_tag, "sys global-settings");
        assert_eq!(obj.full_path, "sys global-settings");
        assert_eq!(obj.get("hostname"), Some(&Value::Scalar("bigip1.example.com".into())));
    }

    #[test]
    fn test_raw_body_keeps_script_verbatim() {
        let obj = parse(
            "ltm rule /Common/r1 {\nwhen HTTP_REQUEST {\n    pool /Common/p1\n}\n}",
        )
        .unwrap();
        assert_eq!(
            obj.get("definition"),
            Some(&Value::Scalar("when HTTP_REQUEST {\n    pool /Common/p1\n}".into()))
        );
    }

    #[test]
    fn test_unbalanced_body_is_error() {
        assert_eq!(parse("ltm pool /Common/p {\n    members {\n}").unwrap_err(), "unbalanced braces");
        assert!(parse("ltm pool /Common/p {\n}\n}").is_err());
    }

    #[test]
    fn test_later_duplicate_key_wins() {
        let obj = parse("ltm pool /Common/p {\n    description a\n    description b\n}").unwrap();
        assert_eq!(obj.get("description"), Some(&Value::Scalar("b".into())));
    }
}
