use derive_more::Display;
use spirv_headers as spv;

pub type Id = u32;

/// Scalar kind of a numeric type, after width and signedness are folded
/// together.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum BaseType {
    #[display(fmt = "unknown")]
    Unknown,
    #[display(fmt = "bool")]
    Boolean,
    #[display(fmt = "i8")]
    SByte,
    #[display(fmt = "u8")]
    UByte,
    #[display(fmt = "i16")]
    Short,
    #[display(fmt = "u16")]
    UShort,
    #[display(fmt = "i32")]
    Int,
    #[display(fmt = "u32")]
    UInt,
    #[display(fmt = "i64")]
    Int64,
    #[display(fmt = "u64")]
    UInt64,
    #[display(fmt = "f16")]
    Half,
    #[display(fmt = "f32")]
    Float,
    #[display(fmt = "f64")]
    Double,
}

impl Default for BaseType {
    fn default() -> Self {
        Self::Unknown
    }
}

impl BaseType {
    /// Maps an `OpTypeInt` declaration.
    pub(crate) fn int(width: u32, signed: bool) -> Self {
        match (width, signed) {
            (8, true) => Self::SByte,
            (8, false) => Self::UByte,
            (16, true) => Self::Short,
            (16, false) => Self::UShort,
            (32, true) => Self::Int,
            (32, false) => Self::UInt,
            (64, true) => Self::Int64,
            (64, false) => Self::UInt64,
            _ => Self::Unknown,
        }
    }

    /// Maps an `OpTypeFloat` declaration.
    pub(crate) fn float(width: u32) -> Self {
        match width {
            16 => Self::Half,
            32 => Self::Float,
            64 => Self::Double,
            _ => Self::Unknown,
        }
    }
}

/// A type declared by the module, with nested types referred to by id.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Type {
    Scalar(BaseType),
    Vector {
        base: BaseType,
        width: u32,
    },
    /// Column-major matrix of `columns` vectors, each `rows` wide.
    Matrix {
        base: BaseType,
        rows: u32,
        columns: u32,
    },
    Array {
        element: Id,
        length: u32,
    },
    RuntimeArray {
        element: Id,
    },
    Struct {
        members: Vec<Id>,
    },
    Pointer {
        storage_class: spv::StorageClass,
        pointee: Id,
    },
    /// Images, samplers, functions and anything else that never appears
    /// in a shader interface.
    Opaque,
}

impl Type {
    pub fn is_struct(&self) -> bool {
        matches!(self, Self::Struct { .. })
    }

    /// Number of locations-worth of elements one level of this type
    /// repeats: array length for arrays, column count for matrices, and 1
    /// for everything else.
    pub fn repeat_count(&self) -> u32 {
        match *self {
            Self::Array { length, .. } => length,
            Self::Matrix { columns, .. } => columns,
            _ => 1,
        }
    }
}
