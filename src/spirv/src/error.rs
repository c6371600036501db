use derive_more::*;

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum CompilerErrorKind {
    /// The word stream is not a valid SPIR-V module.
    #[display(fmt = "invalid module")]
    InvalidModule,
    /// A library limitation has been exceeded, such as an array length.
    #[display(fmt = "limit exceeded")]
    LimitExceeded,
    /// The module uses a construct this reflector cannot describe.
    #[display(fmt = "unsupported module")]
    UnsupportedModule,
    /// The module declares no entry point at all.
    #[display(fmt = "no entry point")]
    NoEntryPoint,
    /// No entry point matches the requested name and execution model.
    #[display(fmt = "entry point not found")]
    EntryPointNotFound,
    /// A query that needs a compiled module was made before `compile`.
    #[display(fmt = "module not compiled")]
    NotCompiled,
}

#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[display(fmt = "{}: {}", kind, detail)]
pub struct CompilerError {
    kind: ErrorKind,
    detail: String,
}

pub type ErrorKind = CompilerErrorKind;
pub type Error = CompilerError;
pub type Result<T> = std::result::Result<T, Error>;

impl std::error::Error for Error {}

impl Error {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self { kind, detail: detail.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind, kind.to_string())
    }
}

impl From<rspirv::binary::ParseState> for Error {
    fn from(state: rspirv::binary::ParseState) -> Self {
        Self::new(ErrorKind::InvalidModule, format!("{:?}", state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let err = Error::new(ErrorKind::EntryPointNotFound, "tesc_main");
        assert_eq!(err.to_string(), "entry point not found: tesc_main");
        let err: Error = ErrorKind::NoEntryPoint.into();
        assert_eq!(err.kind(), ErrorKind::NoEntryPoint);
        assert_eq!(err.detail(), "no entry point");
    }
}
