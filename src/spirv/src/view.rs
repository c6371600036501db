use fnv::FnvHashSet as HashSet;
use log::{debug, trace};
use rspirv::dr::ModuleHeader;
use spirv_headers as spv;

use crate::*;
use crate::data::*;

impl Module {
    pub(crate) fn new() -> Self {
        Self {
            header: ModuleHeader::new(0),
            entry_points: Default::default(),
            types: Default::default(),
            constants: Default::default(),
            variables: Default::default(),
            variable_order: Default::default(),
            functions: Default::default(),
            decorations: Default::default(),
            bound: None,
            requested: None,
        }
    }

    /// The SPIR-V version as a pair `(major, minor)`.
    pub fn version(&self) -> (u8, u8) {
        let word = self.header.version;
        ((word >> 16) as u8, (word >> 8) as u8)
    }

    /// Names and execution models of all entry points, in declaration
    /// order.
    pub fn entry_points(&self) ->
        impl ExactSizeIterator<Item = (&str, spv::ExecutionModel)> + '_
    {
        self.entry_points.iter()
            .map(|entry| (&entry.name[..], entry.execution_model))
    }

    pub fn name(&self, id: Id) -> Option<&str> {
        self.decorations.get(&(id, None))?.name.as_deref()
    }

    pub fn member_name(&self, ty: Id, member: u32) -> Option<&str> {
        self.decorations.get(&(ty, Some(member)))?.name.as_deref()
    }

    fn decorations(&self, id: Id, member: Option<u32>) ->
        Option<&DecorationSet>
    {
        self.decorations.get(&(id, member))
    }

    /// The entry point queries answer for: the one bound by `compile`,
    /// the requested one if it exists, or else the first declared.
    fn entry_point(&self) -> Option<&EntryPoint> {
        if let Some(bound) = &self.bound {
            return self.entry_points.get(bound.index);
        }
        match &self.requested {
            Some((name, model)) => self.find_entry_point(name, *model)
                .map(|index| &self.entry_points[index]),
            None => self.entry_points.first(),
        }
    }

    fn find_entry_point(&self, name: &str, model: spv::ExecutionModel) ->
        Option<usize>
    {
        self.entry_points.iter().position(|entry|
            entry.name == name && entry.execution_model == model)
    }

    fn select_entry_point(&self) -> Result<usize> {
        if self.entry_points.is_empty() {
            return Err(ErrorKind::NoEntryPoint.into());
        }
        match &self.requested {
            Some((name, model)) => self.find_entry_point(name, *model)
                .ok_or_else(|| Error::new(
                    ErrorKind::EntryPointNotFound,
                    format!("{} ({:?})", name, model),
                )),
            None => Ok(0),
        }
    }

    /// Collects the accesses of `func` and everything it calls.
    fn collect_accesses(&self, func: Id, entry: &mut BoundEntry) {
        let mut visited = HashSet::default();
        let mut stack = vec![func];
        while let Some(func) = stack.pop() {
            if !visited.insert(func) { continue; }
            let func = match self.functions.get(&func) {
                Some(func) => func,
                None => continue,
            };
            for (var, path) in func.accesses.iter() {
                entry.accesses.entry(*var).or_default().push(path.clone());
            }
            stack.extend(func.calls.iter().copied());
        }
    }

    fn pointee(&self, var: &Variable) -> Option<Id> {
        match self.types.get(&var.ty)? {
            &Type::Pointer { pointee, .. } => Some(pointee),
            _ => None,
        }
    }

    /// Marks the builtins reached by following `path` into `ty`. A path
    /// that stops short of a struct member touches every member below it.
    fn mark_builtins(
        &self,
        mut ty: Id,
        path: &[Option<u32>],
        storage: spv::StorageClass,
        active: &mut HashSet<(spv::BuiltIn, spv::StorageClass)>,
    ) {
        let mut path = path.iter();
        loop {
            match self.types.get(&ty) {
                Some(&Type::Array { element, .. })
                | Some(&Type::RuntimeArray { element }) => {
                    path.next();
                    ty = element;
                },
                Some(Type::Struct { members }) => match path.next() {
                    Some(&Some(member)) => {
                        let member_ty = match members.get(member as usize) {
                            Some(&member_ty) => member_ty,
                            None => return,
                        };
                        if let Some(builtin) = self.member_builtin(ty, member) {
                            active.insert((builtin, storage));
                        }
                        ty = member_ty;
                    },
                    // Struct indices are always constant; a dynamic or
                    // missing one means the whole struct is touched.
                    _ => {
                        for (member, &member_ty) in members.iter().enumerate() {
                            let member = member as u32;
                            if let Some(builtin) =
                                self.member_builtin(ty, member)
                            {
                                active.insert((builtin, storage));
                            }
                            self.mark_builtins(member_ty, &[], storage, active);
                        }
                        return;
                    },
                },
                _ => return,
            }
        }
    }
}

impl Reflect for Module {
    fn set_entry_point(&mut self, name: &str, model: spv::ExecutionModel) ->
        Result<()>
    {
        if self.find_entry_point(name, model).is_none() {
            return Err(Error::new(
                ErrorKind::EntryPointNotFound,
                format!("{} ({:?})", name, model),
            ));
        }
        self.requested = Some((name.to_owned(), model));
        self.bound = None;
        Ok(())
    }

    fn compile(&mut self) -> Result<()> {
        let index = self.select_entry_point()?;
        let entry = &self.entry_points[index];
        let mut bound = BoundEntry { index, ..Default::default() };
        self.collect_accesses(entry.function, &mut bound);

        let interface: HashSet<Id> = entry.interface.iter().copied().collect();
        let active_variables = self.variable_order.iter().copied()
            .filter(|var| bound.accesses.contains_key(var))
            .filter(|var| {
                let storage = self.variables[var].storage_class;
                match storage {
                    spv::StorageClass::Input | spv::StorageClass::Output =>
                        interface.contains(var),
                    _ => true,
                }
            })
            .collect();
        bound.active_variables = active_variables;
        debug!(
            "compiled entry point {}: {} active variable(s)",
            entry.name, bound.active_variables.len(),
        );
        self.bound = Some(bound);
        Ok(())
    }

    fn has_execution_mode(&self, mode: spv::ExecutionMode) -> bool {
        self.entry_point().map_or(false, |entry| entry.modes.contains_key(&mode))
    }

    fn execution_mode_argument(&self, mode: spv::ExecutionMode) -> Option<u32> {
        self.entry_point()?.modes.get(&mode)?.first().copied()
    }

    fn active_interface_variables(&self) -> Vec<Id> {
        self.bound.as_ref()
            .map(|bound| bound.active_variables.clone())
            .unwrap_or_default()
    }

    fn storage_class(&self, var: Id) -> Option<spv::StorageClass> {
        Some(self.variables.get(&var)?.storage_class)
    }

    fn variable_type(&self, var: Id) -> Option<Id> {
        self.pointee(self.variables.get(&var)?)
    }

    fn get_type(&self, id: Id) -> Option<&Type> {
        self.types.get(&id)
    }

    fn decoration(&self, id: Id, deco: spv::Decoration) -> Option<u32> {
        decoration_value(self.decorations(id, None)?, deco)
    }

    fn member_decoration(&self, ty: Id, member: u32, deco: spv::Decoration) ->
        Option<u32>
    {
        decoration_value(self.decorations(ty, Some(member))?, deco)
    }

    fn builtin(&self, id: Id) -> Option<spv::BuiltIn> {
        self.decorations(id, None)?.builtin
    }

    fn member_builtin(&self, ty: Id, member: u32) -> Option<spv::BuiltIn> {
        self.decorations(ty, Some(member))?.builtin
    }

    fn update_active_builtins(&mut self) {
        let bound = match &self.bound {
            Some(bound) => bound,
            None => return,
        };
        let mut active = HashSet::default();
        for &var_id in bound.active_variables.iter() {
            let var = &self.variables[&var_id];
            let storage = var.storage_class;
            if let Some(builtin) = self.builtin(var_id) {
                active.insert((builtin, storage));
            }
            let ty = match self.pointee(var) {
                Some(ty) => ty,
                None => continue,
            };
            for path in bound.accesses[&var_id].iter() {
                self.mark_builtins(ty, path, storage, &mut active);
            }
        }
        trace!("active builtins: {:?}", active);
        if let Some(bound) = &mut self.bound {
            bound.active_builtins = active;
        }
    }

    fn has_active_builtin(
        &self,
        builtin: spv::BuiltIn,
        storage: spv::StorageClass,
    ) -> bool {
        self.bound.as_ref()
            .map_or(false, |bound| bound.active_builtins.contains(&(builtin, storage)))
    }
}

fn decoration_value(decos: &DecorationSet, deco: spv::Decoration) ->
    Option<u32>
{
    match deco {
        spv::Decoration::Location => decos.location,
        spv::Decoration::Component => decos.component,
        spv::Decoration::Patch => if decos.patch { Some(0) } else { None },
        spv::Decoration::BuiltIn => decos.builtin.map(|builtin| builtin as u32),
        _ => None,
    }
}
