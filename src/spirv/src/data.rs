use derivative::Derivative;
use fnv::{FnvHashMap as HashMap, FnvHashSet as HashSet};
use rspirv::dr::ModuleHeader;
use spirv_headers as spv;

use crate::*;

/// A parsed SPIR-V module plus the reflection state of its bound entry
/// point.
#[derive(Debug)]
pub struct Module {
    pub(crate) header: ModuleHeader,
    pub(crate) entry_points: Vec<EntryPoint>,
    pub(crate) types: HashMap<Id, Type>,
    pub(crate) constants: HashMap<Id, u32>,
    pub(crate) variables: HashMap<Id, Variable>,
    /// Declaration order of global variables.
    pub(crate) variable_order: Vec<Id>,
    pub(crate) functions: HashMap<Id, Function>,
    pub(crate) decorations: HashMap<DecorationTarget, DecorationSet>,
    pub(crate) bound: Option<BoundEntry>,
    pub(crate) requested: Option<(String, spv::ExecutionModel)>,
}

/// A decorated id, or a member of a decorated struct type.
pub(crate) type DecorationTarget = (Id, Option<u32>);

#[derive(Clone, Debug, Default)]
pub(crate) struct DecorationSet {
    pub(crate) location: Option<u32>,
    pub(crate) component: Option<u32>,
    pub(crate) patch: bool,
    pub(crate) builtin: Option<spv::BuiltIn>,
    pub(crate) name: Option<String>,
}

#[derive(Debug, Derivative)]
#[derivative(Default)]
pub(crate) struct Variable {
    #[derivative(Default(value = "spv::StorageClass::Private"))]
    pub(crate) storage_class: spv::StorageClass,
    /// The pointer type of the variable.
    pub(crate) ty: Id,
}

#[derive(Debug, Derivative)]
#[derivative(Default)]
pub(crate) struct EntryPoint {
    #[derivative(Default(value = "spv::ExecutionModel::Vertex"))]
    pub(crate) execution_model: spv::ExecutionModel,
    pub(crate) function: Id,
    pub(crate) name: String,
    pub(crate) interface: Vec<Id>,
    pub(crate) modes: HashMap<spv::ExecutionMode, Vec<u32>>,
}

/// A chain of constant indices into a variable; `None` marks a dynamic
/// index.
pub(crate) type AccessPath = Vec<Option<u32>>;

#[derive(Debug, Default)]
pub(crate) struct Function {
    pub(crate) accesses: Vec<(Id, AccessPath)>,
    pub(crate) calls: Vec<Id>,
}

/// Per-entry-point state computed by `compile` and
/// `update_active_builtins`.
#[derive(Debug, Default)]
pub(crate) struct BoundEntry {
    pub(crate) index: usize,
    pub(crate) active_variables: Vec<Id>,
    pub(crate) accesses: HashMap<Id, Vec<AccessPath>>,
    pub(crate) active_builtins: HashSet<(spv::BuiltIn, spv::StorageClass)>,
}
