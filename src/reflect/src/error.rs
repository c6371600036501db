use derive_more::Display;

/// The execution-mode categories a tessellation pipeline cannot do
/// without.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum ModeCategory {
    #[display(fmt = "a patch input mode (Triangles, Quads, or Isolines)")]
    PatchKind,
    #[display(fmt = "a winding order mode (VertexOrderCw or VertexOrderCcw)")]
    WindingOrder,
    #[display(fmt = "a partition mode (SpacingEqual, SpacingFractionalOdd, or \
        SpacingFractionalEven)")]
    PartitionMode,
    #[display(fmt = "the number of output control points")]
    ControlPoints,
}

#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[non_exhaustive]
pub enum ReflectError {
    #[display(fmt = "neither tessellation shader specifies {}", _0)]
    MissingExecutionMode(ModeCategory),
    /// The shader compiler rejected the module or entry point.
    #[display(fmt = "{}", _0)]
    ReflectionFailure(String),
}

pub type Error = ReflectError;
pub type Result<T> = std::result::Result<T, Error>;

impl std::error::Error for Error {}

impl From<spv::CompilerError> for Error {
    fn from(err: spv::CompilerError) -> Self {
        Self::ReflectionFailure(err.to_string())
    }
}

impl Error {
    pub(crate) fn failure(detail: impl Into<String>) -> Self {
        Self::ReflectionFailure(detail.into())
    }

    pub fn missing_mode(&self) -> Option<ModeCategory> {
        match *self {
            Self::MissingExecutionMode(category) => Some(category),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        let err = Error::MissingExecutionMode(ModeCategory::WindingOrder);
        assert_eq!(
            err.to_string(),
            "neither tessellation shader specifies a winding order mode \
                (VertexOrderCw or VertexOrderCcw)",
        );
        assert_eq!(err.missing_mode(), Some(ModeCategory::WindingOrder));

        let err: Error = spv::CompilerError::new(
            spv::CompilerErrorKind::InvalidModule, "HeaderIncorrect").into();
        assert_eq!(err.to_string(), "invalid module: HeaderIncorrect");
        assert_eq!(err.missing_mode(), None);
    }
}
