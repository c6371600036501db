//! Word-level assembly of small SPIR-V modules for tests.
//!
//! Instructions are emitted in call order, so callers are responsible for
//! declaring types before they are used by constants or other types.
use spirv_headers as spv;

use crate::Id;

const MAGIC: u32 = 0x0723_0203;
const VERSION_1_0: u32 = 0x0001_0000;

#[derive(Debug)]
pub struct Assembler {
    next_id: Id,
    words: Vec<u32>,
    uint: Option<Id>,
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new()
    }
}

/// Encodes a literal string as nul-terminated, zero-padded words.
pub fn string_words(s: &str) -> Vec<u32> {
    let mut bytes = s.as_bytes().to_vec();
    bytes.push(0);
    while bytes.len() % 4 != 0 {
        bytes.push(0);
    }
    bytes.chunks(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

impl Assembler {
    pub fn new() -> Self {
        let mut asm = Self {
            next_id: 1,
            words: Vec::new(),
            uint: None,
        };
        asm.inst(spv::Op::Capability, &[spv::Capability::Shader as u32]);
        asm.inst(spv::Op::Capability, &[spv::Capability::Tessellation as u32]);
        asm.inst(spv::Op::MemoryModel, &[
            spv::AddressingModel::Logical as u32,
            spv::MemoryModel::GLSL450 as u32,
        ]);
        asm
    }

    pub fn id(&mut self) -> Id {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn inst(&mut self, op: spv::Op, operands: &[u32]) {
        let count = operands.len() as u32 + 1;
        self.words.push((count << 16) | op as u32);
        self.words.extend_from_slice(operands);
    }

    fn result(&mut self, op: spv::Op, operands: &[u32]) -> Id {
        let id = self.id();
        let mut words = vec![id];
        words.extend_from_slice(operands);
        self.inst(op, &words);
        id
    }

    fn typed_result(&mut self, op: spv::Op, ty: Id, operands: &[u32]) -> Id {
        let id = self.id();
        let mut words = vec![ty, id];
        words.extend_from_slice(operands);
        self.inst(op, &words);
        id
    }

    pub fn entry_point(
        &mut self,
        model: spv::ExecutionModel,
        function: Id,
        name: &str,
        interface: &[Id],
    ) {
        let mut words = vec![model as u32, function];
        words.extend(string_words(name));
        words.extend_from_slice(interface);
        self.inst(spv::Op::EntryPoint, &words);
    }

    pub fn execution_mode(
        &mut self,
        function: Id,
        mode: spv::ExecutionMode,
        args: &[u32],
    ) {
        let mut words = vec![function, mode as u32];
        words.extend_from_slice(args);
        self.inst(spv::Op::ExecutionMode, &words);
    }

    pub fn name(&mut self, target: Id, name: &str) {
        let mut words = vec![target];
        words.extend(string_words(name));
        self.inst(spv::Op::Name, &words);
    }

    pub fn decorate(&mut self, target: Id, deco: spv::Decoration, args: &[u32]) {
        let mut words = vec![target, deco as u32];
        words.extend_from_slice(args);
        self.inst(spv::Op::Decorate, &words);
    }

    pub fn member_decorate(
        &mut self,
        ty: Id,
        member: u32,
        deco: spv::Decoration,
        args: &[u32],
    ) {
        let mut words = vec![ty, member, deco as u32];
        words.extend_from_slice(args);
        self.inst(spv::Op::MemberDecorate, &words);
    }

    pub fn type_void(&mut self) -> Id {
        self.result(spv::Op::TypeVoid, &[])
    }

    pub fn type_int(&mut self, width: u32, signed: bool) -> Id {
        self.result(spv::Op::TypeInt, &[width, signed as u32])
    }

    pub fn type_float(&mut self, width: u32) -> Id {
        self.result(spv::Op::TypeFloat, &[width])
    }

    pub fn type_vector(&mut self, component: Id, width: u32) -> Id {
        self.result(spv::Op::TypeVector, &[component, width])
    }

    pub fn type_matrix(&mut self, column: Id, columns: u32) -> Id {
        self.result(spv::Op::TypeMatrix, &[column, columns])
    }

    pub fn constant_u32(&mut self, value: u32) -> Id {
        let uint = match self.uint {
            Some(uint) => uint,
            None => {
                let uint = self.type_int(32, false);
                self.uint = Some(uint);
                uint
            },
        };
        self.typed_result(spv::Op::Constant, uint, &[value])
    }

    pub fn type_array(&mut self, element: Id, length: u32) -> Id {
        let length = self.constant_u32(length);
        self.result(spv::Op::TypeArray, &[element, length])
    }

    pub fn type_struct(&mut self, members: &[Id]) -> Id {
        self.result(spv::Op::TypeStruct, members)
    }

    pub fn type_pointer(&mut self, storage: spv::StorageClass, pointee: Id) ->
        Id
    {
        self.result(spv::Op::TypePointer, &[storage as u32, pointee])
    }

    pub fn type_function(&mut self, ret: Id) -> Id {
        self.result(spv::Op::TypeFunction, &[ret])
    }

    pub fn variable(&mut self, ptr: Id, storage: spv::StorageClass) -> Id {
        self.typed_result(spv::Op::Variable, ptr, &[storage as u32])
    }

    /// Opens a function body with its entry label. `id` is a
    /// preallocated result id, so entry points can refer to it first.
    pub fn begin_function(&mut self, id: Id, ret: Id, fn_ty: Id) {
        // Function control: none.
        self.inst(spv::Op::Function, &[ret, id, 0, fn_ty]);
        let label = self.id();
        self.inst(spv::Op::Label, &[label]);
    }

    pub fn end_function(&mut self) {
        self.inst(spv::Op::Return, &[]);
        self.inst(spv::Op::FunctionEnd, &[]);
    }

    pub fn undef(&mut self, ty: Id) -> Id {
        self.typed_result(spv::Op::Undef, ty, &[])
    }

    pub fn access_chain(&mut self, ptr_ty: Id, base: Id, indices: &[Id]) -> Id {
        let mut words = vec![base];
        words.extend_from_slice(indices);
        self.typed_result(spv::Op::AccessChain, ptr_ty, &words)
    }

    pub fn store(&mut self, ptr: Id, value: Id) {
        self.inst(spv::Op::Store, &[ptr, value]);
    }

    pub fn call(&mut self, ret: Id, function: Id) -> Id {
        self.typed_result(spv::Op::FunctionCall, ret, &[function])
    }

    pub fn finish(self) -> Vec<u32> {
        let mut words = vec![MAGIC, VERSION_1_0, 0, self.next_id, 0];
        words.extend(self.words);
        words
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings() {
        assert_eq!(string_words("main"), vec![0x6e69_616d, 0]);
        assert_eq!(string_words("abc"), vec![0x0063_6261]);
        assert_eq!(string_words(""), vec![0]);
    }

    #[test]
    fn header() {
        let mut asm = Assembler::new();
        let id = asm.id();
        let words = asm.finish();
        assert_eq!(words[0], MAGIC);
        assert_eq!(words[3], id + 1);
        // Capability opcode with one operand.
        assert_eq!(words[5], (2 << 16) | spv::Op::Capability as u32);
    }
}
