use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// `<name a="b">` or `<name a="b"/>`
    StartTag {
        name: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
    },
    /// `</name>`
    EndTag(String),
    /// Character data between tags, entities decoded (CDATA included).
    Text(String),

    Eof,
}

#[derive(Debug, thiserror::Error)]
pub enum LexError {
    #[error("Unexpected character: {0:?}")]
    UnexpectedChar(char),
    #[error("Unexpected end of input inside {0}")]
    UnexpectedEof(&'static str),
    #[error("Unterminated attribute value")]
    UnterminatedString,
    #[error("Unknown entity: &{0};")]
    UnknownEntity(String),
    #[error("Invalid character reference: &{0};")]
    InvalidCharRef(String),
}

pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        let input = input.strip_prefix('\u{feff}').unwrap_or(input);
        Self {
            chars: input.chars().peekable(),
        }
    }

    /// Check the upcoming characters without consuming them.
    fn starts_with(&self, s: &str) -> bool {
        let mut ahead = self.chars.clone();
        s.chars().all(|c| ahead.next() == Some(c))
    }

    /// Consume `s` if it comes next.
    fn eat(&mut self, s: &str) -> bool {
        if self.starts_with(s) {
            for _ in s.chars() {
                self.chars.next();
            }
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.chars.peek() {
            if c.is_whitespace() {
                self.chars.next();
            } else {
                break;
            }
        }
    }

    /// Consume everything up to and including `end`.
    fn skip_past(&mut self, end: &str, context: &'static str) -> Result<(), LexError> {
        loop {
            if self.eat(end) {
                return Ok(());
            }
            if self.chars.next().is_none() {
                return Err(LexError::UnexpectedEof(context));
            }
        }
    }

    /// `<!DOCTYPE ...>` may carry an internal subset in brackets.
    fn skip_doctype(&mut self) -> Result<(), LexError> {
        let mut depth = 0usize;
        loop {
            match self.chars.next() {
                Some('[') => depth += 1,
                Some(']') => depth = depth.saturating_sub(1),
                Some('>') if depth == 0 => return Ok(()),
                Some(_) => {}
                None => return Err(LexError::UnexpectedEof("doctype")),
            }
        }
    }

    fn read_name(&mut self) -> Result<String, LexError> {
        let mut s = String::new();
        match self.chars.peek() {
            Some(&c) if c.is_alphabetic() || c == '_' || c == ':' => {
                s.push(c);
                self.chars.next();
            }
            Some(&c) => return Err(LexError::UnexpectedChar(c)),
            None => return Err(LexError::UnexpectedEof("tag")),
        }
        while let Some(&c) = self.chars.peek() {
            if c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':') {
                s.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        Ok(s)
    }

    /// Decode the entity following an already consumed `&`.
    fn read_entity(&mut self) -> Result<char, LexError> {
        let mut name = String::new();
        loop {
            match self.chars.next() {
                Some(';') => break,
                Some(c) if name.len() < 32 => name.push(c),
                Some(_) => return Err(LexError::UnknownEntity(name)),
                None => return Err(LexError::UnexpectedEof("entity")),
            }
        }

        match name.as_str() {
            "amp" => Ok('&'),
            "lt" => Ok('<'),
            "gt" => Ok('>'),
            "quot" => Ok('"'),
            "apos" => Ok('\''),
            _ => {
                let code = if let Some(hex) = name
                    .strip_prefix("#x")
                    .or_else(|| name.strip_prefix("#X"))
                {
                    u32::from_str_radix(hex, 16).ok()
                } else if let Some(dec) = name.strip_prefix('#') {
                    dec.parse::<u32>().ok()
                } else {
                    return Err(LexError::UnknownEntity(name));
                };
                code.and_then(char::from_u32)
                    .ok_or(LexError::InvalidCharRef(name))
            }
        }
    }

    fn read_attr_value(&mut self) -> Result<String, LexError> {
        let quote = match self.chars.next() {
            Some(q @ ('"' | '\'')) => q,
            Some(c) => return Err(LexError::UnexpectedChar(c)),
            None => return Err(LexError::UnexpectedEof("tag")),
        };

        let mut s = String::new();
        loop {
            match self.chars.next() {
                Some(c) if c == quote => return Ok(s),
                Some('&') => s.push(self.read_entity()?),
                Some('<') => return Err(LexError::UnexpectedChar('<')),
                // End-of-line handling folds \r\n to one char before normalization
                Some('\r') => {
                    if self.chars.peek() == Some(&'\n') {
                        self.chars.next();
                    }
                    s.push(' ');
                }
                Some('\n' | '\t') => s.push(' '),
                Some(c) => s.push(c),
                None => return Err(LexError::UnterminatedString),
            }
        }
    }

    fn read_start_tag(&mut self) -> Result<Token, LexError> {
        let name = self.read_name()?;
        let mut attrs = Vec::new();

        loop {
            self.skip_whitespace();
            match self.chars.peek() {
                Some('>') => {
                    self.chars.next();
                    return Ok(Token::StartTag {
                        name,
                        attrs,
                        self_closing: false,
                    });
                }
                Some('/') => {
                    self.chars.next();
                    return match self.chars.next() {
                        Some('>') => Ok(Token::StartTag {
                            name,
                            attrs,
                            self_closing: true,
                        }),
                        Some(c) => Err(LexError::UnexpectedChar(c)),
                        None => Err(LexError::UnexpectedEof("tag")),
                    };
                }
                Some(_) => {
                    let key = self.read_name()?;
                    self.skip_whitespace();
                    match self.chars.next() {
                        Some('=') => {}
                        Some(c) => return Err(LexError::UnexpectedChar(c)),
                        None => return Err(LexError::UnexpectedEof("tag")),
                    }
                    self.skip_whitespace();
                    let value = self.read_attr_value()?;
                    attrs.push((key, value));
                }
                None => return Err(LexError::UnexpectedEof("tag")),
            }
        }
    }

    fn read_end_tag(&mut self) -> Result<Token, LexError> {
        let name = self.read_name()?;
        self.skip_whitespace();
        match self.chars.next() {
            Some('>') => Ok(Token::EndTag(name)),
            Some(c) => Err(LexError::UnexpectedChar(c)),
            None => Err(LexError::UnexpectedEof("tag")),
        }
    }

    fn read_cdata(&mut self) -> Result<String, LexError> {
        let mut s = String::new();
        loop {
            if self.eat("]]>") {
                return Ok(s);
            }
            match self.chars.next() {
                Some(c) => s.push(c),
                None => return Err(LexError::UnexpectedEof("CDATA section")),
            }
        }
    }

    fn read_text(&mut self) -> Result<String, LexError> {
        let mut s = String::new();
        while let Some(&c) = self.chars.peek() {
            if c == '<' {
                break;
            }
            self.chars.next();
            if c == '&' {
                s.push(self.read_entity()?);
            } else {
                s.push(c);
            }
        }
        Ok(s)
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        loop {
            match self.chars.peek() {
                None => return Ok(Token::Eof),
                Some('<') => {}
                Some(_) => return Ok(Token::Text(self.read_text()?)),
            }

            if self.eat("<?") {
                self.skip_past("?>", "processing instruction")?;
            } else if self.eat("<!--") {
                self.skip_past("-->", "comment")?;
            } else if self.eat("<![CDATA[") {
                return Ok(Token::Text(self.read_cdata()?));
            } else if self.eat("<!") {
                self.skip_doctype()?;
            } else if self.eat("</") {
                return self.read_end_tag();
            } else {
                self.chars.next(); // <
                return self.read_start_tag();
            }
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            if tok == Token::Eof {
                tokens.push(tok);
                break;
            }
            tokens.push(tok);
        }
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start(name: &str, attrs: &[(&str, &str)], self_closing: bool) -> Token {
        Token::StartTag {
            name: name.into(),
            attrs: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            self_closing,
        }
    }

    #[test]
    fn test_basic_tokens() {
        let tokens = Lexer::new(r#"<table name="users"><column name="id"/></table>"#)
            .tokenize()
            .unwrap();
        assert_eq!(
            tokens,
            vec![
                start("table", &[("name", "users")], false),
                start("column", &[("name", "id")], true),
                Token::EndTag("table".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_prolog_comments_and_doctype() {
        let input = "<?xml version=\"1.0\"?>\n<!DOCTYPE database [ <!ELEMENT database ANY> ]>\
                     <!-- generated --><database/>";
        let tokens = Lexer::new(input).tokenize().unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Text("\n".into()),
                start("database", &[], true),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_entities() {
        let input = r#"<column default="a &amp; b &lt;c&gt; &#65;&#x42;">&quot;x&apos;</column>"#;
        let tokens = Lexer::new(input).tokenize().unwrap();
        assert_eq!(tokens[0], start("column", &[("default", "a & b <c> AB")], false));
        assert_eq!(tokens[1], Token::Text("\"x'".into()));
    }

    #[test]
    fn test_single_quotes_and_whitespace() {
        let tokens = Lexer::new("<reference local = 'user_id'\n\tforeign=\"id\" >")
            .tokenize()
            .unwrap();
        assert_eq!(
            tokens[0],
            start("reference", &[("local", "user_id"), ("foreign", "id")], false)
        );
    }

    #[test]
    fn test_byte_order_mark() {
        let tokens = Lexer::new("\u{feff}<database/>").tokenize().unwrap();
        assert_eq!(tokens[0], start("database", &[], true));
    }

    #[test]
    fn test_attribute_line_breaks() {
        let tokens = Lexer::new("<column default=\"a\r\nb\rc\nd\te\"/>").tokenize().unwrap();
        assert_eq!(tokens[0], start("column", &[("default", "a b c d e")], true));
    }

    #[test]
    fn test_cdata() {
        let tokens = Lexer::new("<a><![CDATA[<raw> & stuff]]></a>").tokenize().unwrap();
        assert_eq!(tokens[1], Token::Text("<raw> & stuff".into()));
    }

    #[test]
    fn test_hyphenated_names() {
        let tokens = Lexer::new("<foreign-key/><unique-column/>").tokenize().unwrap();
        assert_eq!(tokens[0], start("foreign-key", &[], true));
        assert_eq!(tokens[1], start("unique-column", &[], true));
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            Lexer::new("<a b=\"c").tokenize(),
            Err(LexError::UnterminatedString)
        ));
        assert!(matches!(
            Lexer::new("<a>&nbsp;</a>").tokenize(),
            Err(LexError::UnknownEntity(_))
        ));
        assert!(matches!(
            Lexer::new("<a>&#xD800;</a>").tokenize(),
            Err(LexError::InvalidCharRef(_))
        ));
        assert!(matches!(
            Lexer::new("<!-- open").tokenize(),
            Err(LexError::UnexpectedEof("comment"))
        ));
        assert!(matches!(
            Lexer::new("<a b>").tokenize(),
            Err(LexError::UnexpectedChar('>'))
        ));
    }
}
