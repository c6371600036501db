#![cfg(test)]
use fnv::{FnvHashMap as HashMap, FnvHashSet as HashSet};

use spv::{
    BaseType, BuiltIn, Decoration, ExecutionMode, ExecutionModel, Id, Reflect,
    StorageClass, Type,
};

pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// An in-memory stand-in for a parsed module. Builder methods declare
/// types and variables; every declared variable is active unless
/// deactivated.
#[derive(Debug, Default)]
pub(crate) struct FakeModule {
    next_id: Id,
    types: HashMap<Id, Type>,
    variables: Vec<(Id, StorageClass, Id)>,
    inactive: HashSet<Id>,
    decorations: HashMap<(Id, Option<u32>, Decoration), u32>,
    builtins: HashMap<(Id, Option<u32>), BuiltIn>,
    modes: Vec<(ExecutionMode, Option<u32>)>,
    declared_builtins: HashSet<(BuiltIn, StorageClass)>,
    active_builtins: HashSet<(BuiltIn, StorageClass)>,
    fail_entry_point: bool,
    compiled: bool,
}

impl FakeModule {
    pub(crate) fn new() -> Self {
        Self { next_id: 1, ..Default::default() }
    }

    pub(crate) fn is_compiled(&self) -> bool {
        self.compiled
    }

    fn id(&mut self) -> Id {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn add_type(&mut self, ty: Type) -> Id {
        let id = self.id();
        self.types.insert(id, ty);
        id
    }

    pub(crate) fn scalar(&mut self, base: BaseType) -> Id {
        self.add_type(Type::Scalar(base))
    }

    pub(crate) fn vector(&mut self, base: BaseType, width: u32) -> Id {
        self.add_type(Type::Vector { base, width })
    }

    pub(crate) fn matrix(&mut self, base: BaseType, rows: u32, columns: u32) ->
        Id
    {
        self.add_type(Type::Matrix { base, rows, columns })
    }

    pub(crate) fn array(&mut self, element: Id, length: u32) -> Id {
        self.add_type(Type::Array { element, length })
    }

    pub(crate) fn structure(&mut self, members: &[Id]) -> Id {
        self.add_type(Type::Struct { members: members.to_vec() })
    }

    fn variable(&mut self, storage: StorageClass, ty: Id) -> Id {
        let id = self.id();
        self.variables.push((id, storage, ty));
        id
    }

    pub(crate) fn output(&mut self, ty: Id) -> Id {
        self.variable(StorageClass::Output, ty)
    }

    pub(crate) fn input(&mut self, ty: Id) -> Id {
        self.variable(StorageClass::Input, ty)
    }

    pub(crate) fn deactivate(&mut self, var: Id) {
        self.inactive.insert(var);
    }

    pub(crate) fn decorate(&mut self, id: Id, deco: Decoration, value: u32) {
        self.decorations.insert((id, None, deco), value);
    }

    pub(crate) fn member_decorate(
        &mut self,
        ty: Id,
        member: u32,
        deco: Decoration,
        value: u32,
    ) {
        self.decorations.insert((ty, Some(member), deco), value);
    }

    pub(crate) fn decorate_builtin(&mut self, id: Id, builtin: BuiltIn) {
        self.builtins.insert((id, None), builtin);
    }

    pub(crate) fn decorate_member_builtin(
        &mut self,
        ty: Id,
        member: u32,
        builtin: BuiltIn,
    ) {
        self.builtins.insert((ty, Some(member)), builtin);
    }

    /// Marks a builtin as written by the entry point. It is reported only
    /// after `update_active_builtins`.
    pub(crate) fn activate_builtin(&mut self, builtin: BuiltIn, storage: StorageClass) {
        self.declared_builtins.insert((builtin, storage));
    }

    pub(crate) fn execution_mode(&mut self, mode: ExecutionMode) {
        self.modes.push((mode, None));
    }

    pub(crate) fn execution_mode_with(&mut self, mode: ExecutionMode, arg: u32) {
        self.modes.push((mode, Some(arg)));
    }

    /// Makes every `set_entry_point` call fail.
    pub(crate) fn fail_entry_point(&mut self) {
        self.fail_entry_point = true;
    }

    fn find_variable(&self, var: Id) -> Option<&(Id, StorageClass, Id)> {
        self.variables.iter().find(|&&(id, _, _)| id == var)
    }
}

impl Reflect for FakeModule {
    fn set_entry_point(&mut self, name: &str, _: ExecutionModel) ->
        spv::Result<()>
    {
        if self.fail_entry_point {
            return Err(spv::CompilerError::new(
                spv::CompilerErrorKind::EntryPointNotFound, name));
        }
        Ok(())
    }

    fn compile(&mut self) -> spv::Result<()> {
        self.compiled = true;
        Ok(())
    }

    fn has_execution_mode(&self, mode: ExecutionMode) -> bool {
        self.modes.iter().any(|&(m, _)| m == mode)
    }

    fn execution_mode_argument(&self, mode: ExecutionMode) -> Option<u32> {
        self.modes.iter().find(|&&(m, _)| m == mode).and_then(|&(_, arg)| arg)
    }

    fn active_interface_variables(&self) -> Vec<Id> {
        if !self.compiled { return Vec::new(); }
        self.variables.iter()
            .map(|&(id, _, _)| id)
            .filter(|id| !self.inactive.contains(id))
            .collect()
    }

    fn storage_class(&self, var: Id) -> Option<StorageClass> {
        self.find_variable(var).map(|&(_, storage, _)| storage)
    }

    fn variable_type(&self, var: Id) -> Option<Id> {
        self.find_variable(var).map(|&(_, _, ty)| ty)
    }

    fn get_type(&self, id: Id) -> Option<&Type> {
        self.types.get(&id)
    }

    fn decoration(&self, id: Id, deco: Decoration) -> Option<u32> {
        self.decorations.get(&(id, None, deco)).copied()
    }

    fn member_decoration(&self, ty: Id, member: u32, deco: Decoration) ->
        Option<u32>
    {
        self.decorations.get(&(ty, Some(member), deco)).copied()
    }

    fn builtin(&self, id: Id) -> Option<BuiltIn> {
        self.builtins.get(&(id, None)).copied()
    }

    fn member_builtin(&self, ty: Id, member: u32) -> Option<BuiltIn> {
        self.builtins.get(&(ty, Some(member))).copied()
    }

    fn update_active_builtins(&mut self) {
        self.active_builtins = self.declared_builtins.clone();
    }

    fn has_active_builtin(&self, builtin: BuiltIn, storage: StorageClass) -> bool {
        self.active_builtins.contains(&(builtin, storage))
    }
}
