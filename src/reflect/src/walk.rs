use log::{debug, trace};
use spv::{Decoration, ExecutionModel, Id, Reflect, StorageClass, Type};

use crate::*;

/// Running location and component counters.
#[derive(Clone, Copy, Debug)]
struct Cursor {
    location: Location,
    component: u32,
}

/// Attributes a leaf picks up from the members enclosing it.
#[derive(Clone, Copy, Debug)]
struct Inherited {
    per_patch: bool,
    builtin: Option<spv::BuiltIn>,
    is_used: bool,
}

/// The first leaf emitted for a struct and the largest leaf size found
/// anywhere inside it.
#[derive(Clone, Copy, Debug)]
struct FirstMember {
    index: usize,
    alignment: u32,
}

fn fold(first: Option<FirstMember>, child: Option<FirstMember>) ->
    Option<FirstMember>
{
    match (first, child) {
        (Some(first), Some(child)) => Some(FirstMember {
            index: first.index,
            alignment: first.alignment.max(child.alignment),
        }),
        (first, child) => first.or(child),
    }
}

/// The most leaves one stage's outputs may flatten to. Every leaf takes a
/// location of its own, and no stage's location space comes near this.
pub const MAX_OUTPUTS: u32 = 4096;

fn limit_exceeded(detail: String) -> Error {
    spv::CompilerError::new(spv::CompilerErrorKind::LimitExceeded, detail).into()
}

fn leaf_shape(ty: &Type) -> (spv::BaseType, u32) {
    match *ty {
        Type::Scalar(base) => (base, 1),
        Type::Vector { base, width } => (base, width),
        Type::Matrix { base, rows, .. } => (base, rows),
        _ => (spv::BaseType::Unknown, 1),
    }
}

#[derive(Debug)]
struct OutputWalker<'r, R> {
    reflect: &'r R,
    storage: StorageClass,
    outputs: Vec<ShaderOutput>,
}

impl<'r, R: Reflect> OutputWalker<'r, R> {
    fn new(reflect: &'r R) -> Self {
        Self {
            reflect,
            storage: StorageClass::Output,
            outputs: Vec::new(),
        }
    }

    fn get_type(&self, id: Id) -> Result<&'r Type> {
        self.reflect.get_type(id)
            .ok_or_else(|| Error::failure(format!("unknown type %{}", id)))
    }

    /// Peels arrays and matrix columns off a type, returning the element
    /// type and how many times it repeats.
    fn resolve(&self, mut id: Id) -> Result<(Id, &'r Type, u32)> {
        let mut count: u32 = 1;
        loop {
            let ty = self.get_type(id)?;
            let (next, repeat) = match *ty {
                Type::Array { element, length } => (Some(element), length),
                Type::RuntimeArray { element } => (Some(element), 1),
                Type::Matrix { columns, .. } => (None, columns),
                _ => (None, 1),
            };
            count = count.checked_mul(repeat)
                .filter(|&count| count <= MAX_OUTPUTS)
                .ok_or_else(|| limit_exceeded(format!(
                    "type %{} repeats more than {} times", id, MAX_OUTPUTS)))?;
            match next {
                Some(element) => id = element,
                None => return Ok((id, ty, count)),
            }
        }
    }

    fn emit(&mut self, ty: &Type, cursor: &mut Cursor, attrs: Inherited) ->
        Result<usize>
    {
        if self.outputs.len() >= MAX_OUTPUTS as usize {
            return Err(limit_exceeded(format!(
                "more than {} output leaves", MAX_OUTPUTS)));
        }
        let (base_type, vec_width) = leaf_shape(ty);
        let output = ShaderOutput {
            base_type,
            vec_width,
            location: cursor.location,
            component: cursor.component,
            first_struct_member_alignment: 0,
            builtin: attrs.builtin,
            per_patch: attrs.per_patch,
            is_used: attrs.is_used,
        };
        trace!("output: {:?}", output);
        self.outputs.push(output);
        cursor.location = cursor.location.next();
        Ok(self.outputs.len() - 1)
    }

    fn walk(
        &mut self,
        id: Id,
        ty: &'r Type,
        cursor: &mut Cursor,
        attrs: Inherited,
    ) -> Result<Option<FirstMember>> {
        match ty {
            Type::Struct { members } =>
                self.walk_struct(id, members, cursor, attrs),
            _ => {
                let index = self.emit(ty, cursor, attrs)?;
                let alignment = output_size(&self.outputs[index]);
                Ok(Some(FirstMember { index, alignment }))
            },
        }
    }

    fn walk_struct(
        &mut self,
        struct_id: Id,
        members: &'r [Id],
        cursor: &mut Cursor,
        parent: Inherited,
    ) -> Result<Option<FirstMember>> {
        let reflect = self.reflect;
        let context_component = cursor.component;
        let mut first = None;
        for (member, &member_ty) in members.iter().enumerate() {
            let member = member as u32;
            let location =
                reflect.member_decoration(struct_id, member, Decoration::Location);
            let component =
                reflect.member_decoration(struct_id, member, Decoration::Component);
            if let Some(location) = location {
                cursor.location = Location::Assigned(location);
                cursor.component = component.unwrap_or(0);
            } else {
                cursor.component = component.unwrap_or(context_component);
            }

            let mut attrs = parent;
            attrs.per_patch |=
                reflect.has_member_decoration(struct_id, member, Decoration::Patch);
            if let Some(builtin) = reflect.member_builtin(struct_id, member) {
                attrs.builtin = Some(builtin);
                attrs.is_used &= reflect.has_active_builtin(builtin, self.storage);
            }

            let (elem_id, elem_ty, count) = self.resolve(member_ty)?;
            for _ in 0..count {
                let child = self.walk(elem_id, elem_ty, cursor, attrs)?;
                first = fold(first, child);
            }
        }

        // A struct aligns like its largest member, so its first flattened
        // leaf must carry that alignment.
        if let Some(first) = first {
            let output = &mut self.outputs[first.index];
            output.first_struct_member_alignment =
                output.first_struct_member_alignment.max(first.alignment);
        }
        Ok(first)
    }

    fn walk_variable(&mut self, var: Id, model: ExecutionModel) -> Result<()> {
        let reflect = self.reflect;
        let per_patch = reflect.has_decoration(var, Decoration::Patch);
        let builtin = reflect.builtin(var);
        let is_used = builtin.map_or(true, |builtin|
            reflect.has_active_builtin(builtin, self.storage));
        let mut cursor = Cursor {
            location: reflect.decoration(var, Decoration::Location)
                .map_or(Location::Unassigned, Location::Assigned),
            component: reflect.decoration(var, Decoration::Component)
                .unwrap_or(0),
        };

        let mut ty = reflect.variable_type(var)
            .ok_or_else(|| Error::failure(format!("untyped variable %{}", var)))?;
        // Per-vertex control shader outputs are arrayed over the control
        // points.
        if model == ExecutionModel::TessellationControl && !per_patch {
            match *self.get_type(ty)? {
                Type::Array { element, .. } | Type::RuntimeArray { element } =>
                    ty = element,
                _ => {},
            }
        }

        let attrs = Inherited { per_patch, builtin, is_used };
        let (elem_id, elem_ty, count) = self.resolve(ty)?;
        for _ in 0..count {
            self.walk(elem_id, elem_ty, &mut cursor, attrs)?;
        }
        Ok(())
    }
}

/// Flattens the active outputs of a compiled module into leaves, stably
/// sorted by location. Outputs without a location are left unassigned,
/// after all assigned ones, in traversal order.
///
/// `module` must already be compiled with its active builtins updated.
pub fn flatten_outputs<R: Reflect>(module: &R, model: ExecutionModel) ->
    Result<Vec<ShaderOutput>>
{
    let mut walker = OutputWalker::new(module);
    for var in module.active_interface_variables() {
        if module.storage_class(var) != Some(StorageClass::Output) { continue; }
        walker.walk_variable(var, model)?;
    }
    let mut outputs = walker.outputs;
    outputs.sort_by_key(|output| output.location);
    Ok(outputs)
}

/// Returns the flattened outputs of a shader stage in location order,
/// with implicit locations filled in.
pub fn shader_outputs<R: Reflect>(
    module: &mut R,
    model: ExecutionModel,
    entry_name: Option<&str>,
) -> Result<ShaderInterface> {
    if let Some(name) = entry_name.filter(|name| !name.is_empty()) {
        module.set_entry_point(name, model)?;
    }
    module.compile()?;
    module.update_active_builtins();

    let mut outputs = flatten_outputs(&*module, model)?;
    assign_locations(&mut outputs);
    debug!("reflected {} output(s) for {:?} stage", outputs.len(), model);
    Ok(ShaderInterface::new(outputs))
}
