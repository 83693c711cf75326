use crate::lexer::{LexError, Lexer, Token};
use crate::rdm::{Document, Element, Node};

/// Element nesting limit, the same default libxml2 applies.
pub const MAX_DEPTH: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Lex error: {0}")]
    Lex(#[from] LexError),
    #[error("Unexpected token: {0:?}, expected {1}")]
    Unexpected(Token, &'static str),
    #[error("Mismatched end tag: expected </{expected}>, found </{found}>")]
    MismatchedTag { expected: String, found: String },
    #[error("Element <{0}> is never closed")]
    Unclosed(String),
    #[error("Duplicate attribute {attr:?} on <{element}>")]
    DuplicateAttribute { element: String, attr: String },
    #[error("Document has no root element")]
    MissingRoot,
    #[error("Elements nested deeper than {0} levels")]
    TooDeep(usize),
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(input: &str) -> Result<Self, ParseError> {
        let tokens = Lexer::new(input).tokenize()?;
        Ok(Self { tokens, pos: 0 })
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        self.pos += 1;
        tok
    }

    /// Whitespace-only text is allowed around the root element.
    fn skip_blank_text(&mut self) -> Result<(), ParseError> {
        while let Token::Text(text) = self.peek() {
            if !text.trim().is_empty() {
                return Err(ParseError::Unexpected(self.peek().clone(), "root element"));
            }
            self.pos += 1;
        }
        Ok(())
    }

    pub fn parse(&mut self) -> Result<Document, ParseError> {
        self.skip_blank_text()?;

        let root = match self.advance() {
            Token::StartTag {
                name,
                attrs,
                self_closing,
            } => self.parse_element(name, attrs, self_closing, 1)?,
            Token::Eof => return Err(ParseError::MissingRoot),
            tok => return Err(ParseError::Unexpected(tok, "root element")),
        };

        self.skip_blank_text()?;
        match self.advance() {
            Token::Eof => Ok(Document::new(root)),
            tok => Err(ParseError::Unexpected(tok, "end of document")),
        }
    }

    fn parse_element(
        &mut self,
        name: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
        depth: usize,
    ) -> Result<Element, ParseError> {
        if depth > MAX_DEPTH {
            return Err(ParseError::TooDeep(MAX_DEPTH));
        }

        let mut element = Element::new(name);
        for (key, value) in attrs {
            if element.attrs.contains_key(&key) {
                return Err(ParseError::DuplicateAttribute {
                    element: element.name,
                    attr: key,
                });
            }
            element.attrs.insert(key, value);
        }

        if self_closing {
            return Ok(element);
        }

        loop {
            match self.advance() {
                Token::StartTag {
                    name,
                    attrs,
                    self_closing,
                } => {
                    let child = self.parse_element(name, attrs, self_closing, depth + 1)?;
                    element.children.push(Node::Element(child));
                }
                Token::Text(text) => element.children.push(Node::Text(text)),
                Token::EndTag(found) => {
                    if found != element.name {
                        return Err(ParseError::MismatchedTag {
                            expected: element.name,
                            found,
                        });
                    }
                    return Ok(element);
                }
                Token::Eof => return Err(ParseError::Unclosed(element.name)),
            }
        }
    }
}

/// Parse an XML string into a relational document.
pub fn parse_document(input: &str) -> Result<Document, ParseError> {
    Parser::new(input)?.parse()
}
