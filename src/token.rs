/// The character that separated a word from its successor in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Delimiter {
    Space,
    Tab,
    Newline,
}

impl Delimiter {
    pub fn from_char(ch: char) -> Option<Delimiter> {
        match ch {
            ' ' => Some(Delimiter::Space),
            '\t' => Some(Delimiter::Tab),
            '\n' => Some(Delimiter::Newline),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Delimiter::Space => ' ',
            Delimiter::Tab => '\t',
            Delimiter::Newline => '\n',
        }
    }
}

/// A word of a subtitle line.
///
/// `delimiter` is `None` exactly when the token ends its segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub delimiter: Option<Delimiter>,
}

impl Token {
    pub fn new(text: impl Into<String>, delimiter: Option<Delimiter>) -> Token {
        Token {
            text: text.into(),
            delimiter,
        }
    }

    /// A token that ends its segment.
    pub fn last(text: impl Into<String>) -> Token {
        Token::new(text, None)
    }

    /// A token followed by a single space.
    pub fn spaced(text: impl Into<String>) -> Token {
        Token::new(text, Some(Delimiter::Space))
    }
}

/// Split `text` on space, tab and newline.
///
/// Every split point becomes the delimiter of the fragment before it. The
/// final fragment always gets `None`; a trailing delimiter in `text` is
/// dropped rather than producing an empty last word.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut start = 0;

    for (i, ch) in text.char_indices() {
        if let Some(delimiter) = Delimiter::from_char(ch) {
            tokens.push(Token::new(&text[start..i], Some(delimiter)));
            start = i + ch.len_utf8();
        }
    }

    if start < text.len() {
        tokens.push(Token::last(&text[start..]));
    } else if let Some(last) = tokens.last_mut() {
        last.delimiter = None;
    }

    tokens
}

/// Concatenate tokens back into text, writing each delimiter after its word.
pub fn join(tokens: &[Token]) -> String {
    let mut text = String::new();
    for token in tokens {
        text.push_str(&token.text);
        if let Some(delimiter) = token.delimiter {
            text.push(delimiter.as_char());
        }
    }
    text
}
