//! Path expression AST and parser.

use crate::escape::literal_slash_at;
use crate::PathSyntaxError;

/// One navigation step inside a non-recursive chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// `.`
    Current,
    /// `..`
    FirstChild,
    /// `*`
    Wildcard,
    /// All-digit segment.
    Index(usize),
    Key(String),
}

impl Segment {
    pub fn parse(text: &str) -> Self {
        match text {
            "." => Self::Current,
            ".." => Self::FirstChild,
            "*" => Self::Wildcard,
            _ => match index_text(text) {
                Some(index) => Self::Index(index),
                None => Self::Key(text.to_string()),
            },
        }
    }
}

/// Target of a `//` step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescendKey {
    /// `//*`: immediate children.
    Any,
    /// `//key`: every descendant whose key equals `key`.
    Key(String),
}

impl DescendKey {
    fn parse(text: &str) -> Result<Self, PathSyntaxError> {
        match text {
            "" => Err(PathSyntaxError::EmptyDescentKey),
            "*" => Ok(Self::Any),
            "." | ".." => Err(PathSyntaxError::NavigationDescent(text.to_string())),
            _ => Ok(Self::Key(text.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Segments applied one after another.
    Walk(Vec<Segment>),
    Descend(DescendKey),
}

/// Parsed path: a list of steps applied left to right from a base node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathExpr {
    steps: Vec<Step>,
}

impl PathExpr {
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// `true` when the path designates the base node itself.
    pub fn is_base(&self) -> bool {
        self.steps.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Slash,
    Descend,
    Text(String),
}

/// Splits a path into segment texts and delimiters.
///
/// Runs of two or more slashes become one [`Token::Descend`]. Trailing
/// slashes are dropped and segment texts are trimmed.
fn tokenize(path: &str) -> Vec<Token> {
    let path = path.trim();
    let bytes = path.as_bytes();
    let mut tokens = Vec::new();
    let mut text: Option<String> = None;
    let mut slashes = 0usize;
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'/' && literal_slash_at(bytes, i).is_none() {
            if let Some(t) = text.take() {
                let mut t = t;
                t.push_str(&path[start..i]);
                tokens.push(Token::Text(t.trim().to_string()));
            }
            slashes += 1;
            i += 1;
            continue;
        }
        if slashes > 0 {
            tokens.push(if slashes == 1 { Token::Slash } else { Token::Descend });
            slashes = 0;
        }
        if text.is_none() {
            text = Some(String::new());
            start = i;
        }
        match literal_slash_at(bytes, i) {
            Some(len) => {
                if let Some(t) = text.as_mut() {
                    t.push_str(&path[start..i]);
                    t.push('/');
                }
                i += len;
                start = i;
            }
            None => i += 1,
        }
    }
    if let Some(mut t) = text {
        t.push_str(&path[start..]);
        tokens.push(Token::Text(t.trim().to_string()));
    }
    tokens
}

/// Parses a slash path.
///
/// An empty path, or one made only of slashes, designates the base node.
pub fn parse_path(path: &str) -> Result<PathExpr, PathSyntaxError> {
    let mut steps = Vec::new();
    let mut walk = Vec::new();
    let mut tokens = tokenize(path).into_iter();

    while let Some(token) = tokens.next() {
        match token {
            Token::Slash => {}
            Token::Text(text) => walk.push(Segment::parse(&text)),
            Token::Descend => {
                if !walk.is_empty() {
                    steps.push(Step::Walk(std::mem::take(&mut walk)));
                }
                let key = match tokens.next() {
                    Some(Token::Text(text)) => DescendKey::parse(&text)?,
                    _ => return Err(PathSyntaxError::EmptyDescentKey),
                };
                steps.push(Step::Descend(key));
            }
        }
    }
    if !walk.is_empty() {
        steps.push(Step::Walk(walk));
    }
    Ok(PathExpr { steps })
}

fn index_text(text: &str) -> Option<usize> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}
