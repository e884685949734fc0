use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HuffmanError {
    #[error("failed to read input: {0}")]
    ReadFailure(#[source] io::Error),

    #[error("failed to write output: {0}")]
    WriteFailure(#[source] io::Error),

    #[error("failed to rewind input: {0}")]
    SeekFailure(#[source] io::Error),

    /// The artifact ended early; the message says where.
    #[error("compressed data is truncated: {0}")]
    TruncatedArtifact(String),

    #[error("malformed huffman tree: {0}")]
    MalformedTree(String),

    /// The input differed between the frequency scan and the payload pass.
    #[error("input changed while it was being compressed")]
    InputChanged,
}

impl HuffmanError {
    /// Maps an error met while reading an artifact: running out of bytes means the
    /// artifact is truncated, anything else is a plain read failure.
    pub(crate) fn from_artifact_read(err: io::Error, context: impl FnOnce() -> String) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            HuffmanError::TruncatedArtifact(context())
        } else {
            HuffmanError::ReadFailure(err)
        }
    }
}

pub type Result<T, E = HuffmanError> = std::result::Result<T, E>;
