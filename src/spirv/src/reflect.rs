use spirv_headers as spv;

use crate::*;

/// The query surface reflection passes consume.
///
/// Queries on execution modes and interface variables answer for the
/// entry point bound by `set_entry_point`, or for the module's first entry
/// point if none was bound. `compile` must succeed before
/// `active_interface_variables` or `has_active_builtin` return anything
/// meaningful.
pub trait Reflect {
    fn set_entry_point(&mut self, name: &str, model: spv::ExecutionModel) ->
        Result<()>;

    /// Resolves the bound entry point and computes which variables it
    /// statically accesses.
    fn compile(&mut self) -> Result<()>;

    fn has_execution_mode(&self, mode: spv::ExecutionMode) -> bool;

    /// The first literal argument of `mode`, if the entry point declares
    /// it with one.
    fn execution_mode_argument(&self, mode: spv::ExecutionMode) -> Option<u32>;

    /// Interface variables accessed by the entry point, in declaration
    /// order.
    fn active_interface_variables(&self) -> Vec<Id>;

    fn storage_class(&self, var: Id) -> Option<spv::StorageClass>;

    /// The type a variable points to.
    fn variable_type(&self, var: Id) -> Option<Id>;

    fn get_type(&self, id: Id) -> Option<&Type>;

    /// The first literal of `deco` on `id`. Decorations without literals,
    /// like `Patch`, report 0.
    fn decoration(&self, id: Id, deco: spv::Decoration) -> Option<u32>;

    fn member_decoration(&self, ty: Id, member: u32, deco: spv::Decoration) ->
        Option<u32>;

    fn builtin(&self, id: Id) -> Option<spv::BuiltIn>;

    fn member_builtin(&self, ty: Id, member: u32) -> Option<spv::BuiltIn>;

    /// Recomputes the set of builtins the entry point actually touches.
    fn update_active_builtins(&mut self);

    fn has_active_builtin(
        &self,
        builtin: spv::BuiltIn,
        storage: spv::StorageClass,
    ) -> bool;

    fn has_decoration(&self, id: Id, deco: spv::Decoration) -> bool {
        self.decoration(id, deco).is_some()
    }

    fn has_member_decoration(&self, ty: Id, member: u32, deco: spv::Decoration) ->
        bool
    {
        self.member_decoration(ty, member, deco).is_some()
    }
}
