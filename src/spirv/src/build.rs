use fnv::FnvHashMap as HashMap;
use log::trace;
use rspirv::{self, dr};
use rspirv::binary::{Consumer, ParseAction};
use spirv_headers as spv;

use crate::*;
use crate::data::*;

#[derive(Debug)]
struct RawModule {
    header: dr::ModuleHeader,
    instructions: Vec<dr::Instruction>,
}

impl RawModule {
    fn new() -> Self {
        Self {
            header: dr::ModuleHeader::new(0),
            instructions: Default::default(),
        }
    }

    #[inline]
    fn occurrences(&self, opcode: spv::Op) ->
        impl Iterator<Item = &'_ dr::Instruction> + '_
    {
        self.instructions.iter()
            .filter(move |inst| inst.class.opcode == opcode)
    }
}

fn invalid(what: &str) -> Error {
    Error::new(ErrorKind::InvalidModule, what)
}

macro_rules! get_operand_variant {
    ($operand:expr, $variant:ident) => {
        match $operand {
            Some(dr::Operand::$variant(val)) => Ok(val.clone()),
            _ => Err(invalid(concat!("expected ", stringify!($variant)))),
        }
    }
}

macro_rules! parse_operand {
    ($operands:expr, $variant:ident) => {
        get_operand_variant!($operands.next(), $variant)?
    };
    ($operands:expr, $variant:ident?) => {
        match $operands.next() {
            Some(dr::Operand::$variant(val)) => Some(val.clone()),
            _ => None,
        }
    };
    ($operands:expr, $variant:ident*) => {
        $operands.map(|operand| get_operand_variant!(Some(operand), $variant))
            .collect::<Result<Vec<_>>>()?
    };
}

fn result_id(inst: &dr::Instruction) -> Result<Id> {
    inst.result_id.ok_or_else(|| invalid("missing result id"))
}

fn raise_module(raw: RawModule) -> Result<Module> {
    let mut module = Module::new();
    build_decoration_sets(&mut module, &raw)?;
    raise_types(&mut module, &raw)?;
    raise_variables(&mut module, &raw)?;
    raise_entry_points(&mut module, &raw)?;
    raise_execution_modes(&mut module, &raw)?;
    raise_functions(&mut module, &raw)?;
    module.header = raw.header;
    Ok(module)
}

fn build_decoration_sets(module: &mut Module, raw: &RawModule) -> Result<()> {
    for inst in raw.instructions.iter() {
        let operands = &inst.operands;
        match inst.class.opcode {
            spv::Op::Decorate => apply_decoration(module, operands, false)?,
            spv::Op::MemberDecorate =>
                apply_decoration(module, operands, true)?,
            spv::Op::Name => apply_name(module, operands, false)?,
            spv::Op::MemberName => apply_name(module, operands, true)?,
            _ => {},
        }
    }
    Ok(())
}

fn apply_decoration(
    module: &mut Module,
    operands: &[dr::Operand],
    member: bool,
) -> Result<()> {
    let mut ops = operands.iter();
    let target = parse_operand!(ops, IdRef);
    let member = if member { Some(parse_operand!(ops, LiteralInt32)) }
        else { None };
    let decoration = parse_operand!(ops, Decoration);
    let decos = module.decorations.entry((target, member)).or_default();
    match decoration {
        spv::Decoration::Location => {
            decos.location = Some(parse_operand!(ops, LiteralInt32));
        },
        spv::Decoration::Component => {
            decos.component = Some(parse_operand!(ops, LiteralInt32));
        },
        spv::Decoration::Patch => decos.patch = true,
        spv::Decoration::BuiltIn => {
            decos.builtin = Some(parse_operand!(ops, BuiltIn));
        },
        _ => {},
    }
    Ok(())
}

fn apply_name(
    module: &mut Module,
    operands: &[dr::Operand],
    member: bool,
) -> Result<()> {
    let mut ops = operands.iter();
    let target = parse_operand!(ops, IdRef);
    let member = if member { Some(parse_operand!(ops, LiteralInt32)) }
        else { None };
    let name = parse_operand!(ops, LiteralString);
    module.decorations.entry((target, member)).or_default().name = Some(name);
    Ok(())
}

/// Types must be declared before they are referenced, which also rules
/// out recursive types.
fn declared_type(module: &Module, id: Id) -> Result<Id> {
    if module.types.contains_key(&id) {
        Ok(id)
    } else {
        Err(invalid(&format!("type %{} used before its declaration", id)))
    }
}

fn raise_types(module: &mut Module, raw: &RawModule) -> Result<()> {
    for inst in raw.instructions.iter() {
        let mut ops = inst.operands.iter();
        let ty = match inst.class.opcode {
            spv::Op::Constant | spv::Op::SpecConstant => {
                // Only 32-bit integers can size an array.
                if let Some(value) = parse_operand!(ops, LiteralInt32?) {
                    module.constants.insert(result_id(inst)?, value);
                }
                continue;
            },
            spv::Op::TypeBool => Type::Scalar(BaseType::Boolean),
            spv::Op::TypeInt => {
                let width = parse_operand!(ops, LiteralInt32);
                let signed = parse_operand!(ops, LiteralInt32) != 0;
                Type::Scalar(BaseType::int(width, signed))
            },
            spv::Op::TypeFloat => {
                let width = parse_operand!(ops, LiteralInt32);
                Type::Scalar(BaseType::float(width))
            },
            spv::Op::TypeVector => {
                let component = parse_operand!(ops, IdRef);
                let width = parse_operand!(ops, LiteralInt32);
                let base = match module.types.get(&component) {
                    Some(&Type::Scalar(base)) => base,
                    _ => return Err(invalid("vector of non-scalar")),
                };
                Type::Vector { base, width }
            },
            spv::Op::TypeMatrix => {
                let column = parse_operand!(ops, IdRef);
                let columns = parse_operand!(ops, LiteralInt32);
                let (base, rows) = match module.types.get(&column) {
                    Some(&Type::Vector { base, width }) => (base, width),
                    _ => return Err(invalid("matrix of non-vector")),
                };
                Type::Matrix { base, rows, columns }
            },
            spv::Op::TypeArray => {
                let element = declared_type(module, parse_operand!(ops, IdRef))?;
                let length_id = parse_operand!(ops, IdRef);
                let length = *module.constants.get(&length_id)
                    .ok_or_else(|| Error::new(
                        ErrorKind::UnsupportedModule,
                        format!("array length %{} is not a literal", length_id),
                    ))?;
                Type::Array { element, length }
            },
            spv::Op::TypeRuntimeArray => {
                let element = declared_type(module, parse_operand!(ops, IdRef))?;
                Type::RuntimeArray { element }
            },
            spv::Op::TypeStruct => {
                let members = parse_operand!(ops, IdRef*);
                for &member in members.iter() {
                    declared_type(module, member)?;
                }
                Type::Struct { members }
            },
            spv::Op::TypePointer => {
                let storage_class = parse_operand!(ops, StorageClass);
                let pointee = parse_operand!(ops, IdRef);
                Type::Pointer { storage_class, pointee }
            },
            spv::Op::TypeVoid
            | spv::Op::TypeImage
            | spv::Op::TypeSampler
            | spv::Op::TypeSampledImage
            | spv::Op::TypeOpaque
            | spv::Op::TypeFunction => Type::Opaque,
            _ => continue,
        };
        module.types.insert(result_id(inst)?, ty);
    }
    Ok(())
}

fn raise_variables(module: &mut Module, raw: &RawModule) -> Result<()> {
    for inst in raw.occurrences(spv::Op::Variable) {
        raise_variable(module, inst)?;
    }
    Ok(())
}

fn raise_variable(module: &mut Module, inst: &dr::Instruction) -> Result<()> {
    let mut ops = inst.operands.iter();
    let id = result_id(inst)?;

    let storage_class = parse_operand!(ops, StorageClass);
    if storage_class == spv::StorageClass::Function { return Ok(()); }

    let ty = inst.result_type.ok_or_else(|| invalid("untyped variable"))?;
    module.variables.insert(id, Variable { storage_class, ty });
    module.variable_order.push(id);
    Ok(())
}

fn raise_entry_points(module: &mut Module, raw: &RawModule) -> Result<()> {
    for inst in raw.occurrences(spv::Op::EntryPoint) {
        raise_entry_point(module, inst)?;
    }
    Ok(())
}

fn raise_entry_point(module: &mut Module, inst: &dr::Instruction) ->
    Result<()>
{
    let mut ops = inst.operands.iter();
    let execution_model = parse_operand!(ops, ExecutionModel);
    let function = parse_operand!(ops, IdRef);
    let name = parse_operand!(ops, LiteralString);
    let interface = parse_operand!(ops, IdRef*);

    trace!(
        "entry point: {} ({:?}), {} interface variable(s)",
        name, execution_model, interface.len(),
    );
    module.entry_points.push(EntryPoint {
        execution_model,
        function,
        name,
        interface,
        modes: Default::default(),
    });
    Ok(())
}

fn raise_execution_modes(module: &mut Module, raw: &RawModule) -> Result<()> {
    for inst in raw.occurrences(spv::Op::ExecutionMode) {
        let mut ops = inst.operands.iter();
        let function = parse_operand!(ops, IdRef);
        let mode = parse_operand!(ops, ExecutionMode);
        let args: Vec<u32> = ops
            .filter_map(|op| match op {
                dr::Operand::LiteralInt32(val) => Some(*val),
                _ => None,
            })
            .collect();
        // An execution mode applies to every entry point sharing the
        // function.
        for entry in module.entry_points.iter_mut()
            .filter(|entry| entry.function == function)
        {
            entry.modes.insert(mode, args.clone());
        }
    }
    Ok(())
}

/// Maps derived pointers back to the variable and constant index chain
/// they were formed from.
#[derive(Debug, Default)]
struct PointerRoots {
    roots: HashMap<Id, (Id, AccessPath)>,
}

impl PointerRoots {
    fn resolve(&self, module: &Module, id: Id) -> Option<(Id, AccessPath)> {
        if module.variables.contains_key(&id) {
            Some((id, Vec::new()))
        } else {
            self.roots.get(&id).cloned()
        }
    }
}

fn raise_functions(module: &mut Module, raw: &RawModule) -> Result<()> {
    let mut roots = PointerRoots::default();
    let mut current: Option<(Id, Function)> = None;
    for inst in raw.instructions.iter() {
        match inst.class.opcode {
            spv::Op::Function => {
                current = Some((result_id(inst)?, Function::default()));
                continue;
            },
            spv::Op::FunctionEnd => {
                let (id, func) = current.take()
                    .ok_or_else(|| invalid("unmatched OpFunctionEnd"))?;
                module.functions.insert(id, func);
                continue;
            },
            _ => {},
        }
        let func = match current.as_mut() {
            Some((_, func)) => func,
            None => continue,
        };
        raise_function_instruction(module, &mut roots, func, inst)?;
    }
    if current.is_some() {
        return Err(invalid("missing OpFunctionEnd"));
    }
    Ok(())
}

fn raise_function_instruction(
    module: &Module,
    roots: &mut PointerRoots,
    func: &mut Function,
    inst: &dr::Instruction,
) -> Result<()> {
    let ids = inst.operands.iter().filter_map(|op| match op {
        dr::Operand::IdRef(id) => Some(*id),
        _ => None,
    });
    match inst.class.opcode {
        spv::Op::AccessChain
        | spv::Op::InBoundsAccessChain
        | spv::Op::PtrAccessChain
        | spv::Op::InBoundsPtrAccessChain => {
            let mut ids = ids;
            let base = ids.next().ok_or_else(|| invalid("empty access chain"))?;
            if let Some((var, mut path)) = roots.resolve(module, base) {
                // The element operand of a pointer access chain does not
                // index into the pointee type.
                if matches!(
                    inst.class.opcode,
                    spv::Op::PtrAccessChain | spv::Op::InBoundsPtrAccessChain
                ) {
                    ids.next();
                }
                path.extend(ids.map(|idx| module.constants.get(&idx).copied()));
                roots.roots.insert(result_id(inst)?, (var, path.clone()));
                func.accesses.push((var, path));
            }
        },
        spv::Op::FunctionCall => {
            let mut ids = ids;
            let callee = ids.next().ok_or_else(|| invalid("empty call"))?;
            func.calls.push(callee);
            func.accesses.extend(ids.filter_map(|id| roots.resolve(module, id)));
        },
        _ => {
            func.accesses.extend(ids.filter_map(|id| roots.resolve(module, id)));
        },
    }
    Ok(())
}

impl Consumer for RawModule {
    fn initialize(&mut self) -> ParseAction {
        ParseAction::Continue
    }

    fn finalize(&mut self) -> ParseAction {
        ParseAction::Continue
    }

    fn consume_header(&mut self, header: dr::ModuleHeader) -> ParseAction {
        self.instructions.reserve(header.bound as usize);
        self.header = header;
        ParseAction::Continue
    }

    fn consume_instruction(&mut self, inst: dr::Instruction) -> ParseAction {
        self.instructions.push(inst);
        ParseAction::Continue
    }
}

pub fn parse_words(words: &impl AsRef<[u32]>) -> Result<Module> {
    let mut raw = RawModule::new();
    rspirv::binary::parse_words(words, &mut raw)?;
    raise_module(raw)
}

pub fn parse_bytes(bytes: &impl AsRef<[u8]>) -> Result<Module> {
    let mut raw = RawModule::new();
    rspirv::binary::parse_bytes(bytes, &mut raw)?;
    raise_module(raw)
}
