use std::ffi::{OsStr, OsString};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unrecognized format verb {0:?}")]
    UnrecognizedVerb(char),

    #[error("unterminated format verb")]
    UnterminatedVerb,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    FullPath,
    FileName,
}

/// A parsed process command.
///
/// `%p` is the path of the segment (directory joined with the filename), `%f` is
/// the bare filename and `%%` is a literal percent sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    pieces: Vec<Piece>,
}

impl CommandTemplate {
    pub fn parse(format: &str) -> Result<Self, TemplateError> {
        let mut pieces = Vec::new();
        let mut literal = String::new();
        let mut chars = format.chars();

        while let Some(c) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }

            let verb = match chars.next() {
                Some('%') => {
                    literal.push('%');
                    continue;
                }
                Some('p') => Piece::FullPath,
                Some('f') => Piece::FileName,
                Some(other) => return Err(TemplateError::UnrecognizedVerb(other)),
                None => return Err(TemplateError::UnterminatedVerb),
            };

            if !literal.is_empty() {
                pieces.push(Piece::Literal(std::mem::take(&mut literal)));
            }
            pieces.push(verb);
        }

        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }

        Ok(Self { pieces })
    }

    pub fn render(&self, full_path: &str, filename: &str) -> String {
        let mut command = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Literal(text) => command.push_str(text),
                Piece::FullPath => command.push_str(full_path),
                Piece::FileName => command.push_str(filename),
            }
        }
        command
    }

    /// Renders with a full path that may not be valid UTF-8. The path bytes are
    /// substituted unchanged.
    pub fn render_os(&self, full_path: &OsStr, filename: &str) -> OsString {
        let mut command = OsString::new();
        for piece in &self.pieces {
            match piece {
                Piece::Literal(text) => command.push(text),
                Piece::FullPath => command.push(full_path),
                Piece::FileName => command.push(filename),
            }
        }
        command
    }
}

/// Expands `format` for one segment.
pub fn expand(format: &str, full_path: &str, filename: &str) -> Result<String, TemplateError> {
    Ok(CommandTemplate::parse(format)?.render(full_path, filename))
}
