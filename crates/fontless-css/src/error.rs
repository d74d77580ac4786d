pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Unterminated comment starting at byte offset {offset}")]
    UnterminatedComment { offset: usize },

    #[error("Unterminated string starting at byte offset {offset}")]
    UnterminatedString { offset: usize },

    #[error("Unclosed block starting at byte offset {offset}")]
    UnclosedBlock { offset: usize },

    #[error("Unexpected `}}` at byte offset {offset}")]
    UnexpectedCloseBrace { offset: usize },

    #[error("CSS syntax error at line {line}, column {column}")]
    Syntax { line: u32, column: u32 },
}
