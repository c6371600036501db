use linkage_reflect::*;
use spv::testing::Assembler;
use spv::{BuiltIn, Decoration, ExecutionMode, ExecutionModel, StorageClass};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// out gl_PerVertex { vec4 gl_Position; float gl_PointSize; };
/// layout(location = 0) out vec4 color;
/// out vec2 uv;
///
/// Only gl_Position, color and uv are written.
fn vertex_shader() -> Vec<u32> {
    let mut asm = Assembler::new();
    let main = asm.id();

    let void = asm.type_void();
    let float = asm.type_float(32);
    let vec2 = asm.type_vector(float, 2);
    let vec4 = asm.type_vector(float, 4);
    let per_vertex_ty = asm.type_struct(&[vec4, float]);
    let block_ptr = asm.type_pointer(StorageClass::Output, per_vertex_ty);
    let vec4_ptr = asm.type_pointer(StorageClass::Output, vec4);
    let vec2_ptr = asm.type_pointer(StorageClass::Output, vec2);
    let zero = asm.constant_u32(0);
    let fn_ty = asm.type_function(void);

    let per_vertex = asm.variable(block_ptr, StorageClass::Output);
    let color = asm.variable(vec4_ptr, StorageClass::Output);
    let uv = asm.variable(vec2_ptr, StorageClass::Output);

    asm.entry_point(ExecutionModel::Vertex, main, "main", &[per_vertex, color, uv]);
    asm.member_decorate(per_vertex_ty, 0, Decoration::BuiltIn,
        &[BuiltIn::Position as u32]);
    asm.member_decorate(per_vertex_ty, 1, Decoration::BuiltIn,
        &[BuiltIn::PointSize as u32]);
    asm.decorate(color, Decoration::Location, &[0]);

    asm.begin_function(main, void, fn_ty);
    let position = asm.access_chain(vec4_ptr, per_vertex, &[zero]);
    let value = asm.undef(vec4);
    asm.store(position, value);
    asm.store(color, value);
    let value = asm.undef(vec2);
    asm.store(uv, value);
    asm.end_function();

    asm.finish()
}

/// layout(vertices = 3, cw) out;
/// layout(location = 0) out vec4 data[];
/// layout(location = 1) patch out float level;
fn control_shader() -> Vec<u32> {
    let mut asm = Assembler::new();
    let main = asm.id();

    let void = asm.type_void();
    let float = asm.type_float(32);
    let vec4 = asm.type_vector(float, 4);
    let data_ty = asm.type_array(vec4, 3);
    let data_ptr = asm.type_pointer(StorageClass::Output, data_ty);
    let vec4_ptr = asm.type_pointer(StorageClass::Output, vec4);
    let float_ptr = asm.type_pointer(StorageClass::Output, float);
    let one = asm.constant_u32(1);
    let fn_ty = asm.type_function(void);

    let data = asm.variable(data_ptr, StorageClass::Output);
    let level = asm.variable(float_ptr, StorageClass::Output);

    asm.entry_point(ExecutionModel::TessellationControl, main, "main",
        &[data, level]);
    asm.execution_mode(main, ExecutionMode::OutputVertices, &[3]);
    asm.execution_mode(main, ExecutionMode::VertexOrderCw, &[]);
    asm.decorate(data, Decoration::Location, &[0]);
    asm.decorate(level, Decoration::Location, &[1]);
    asm.decorate(level, Decoration::Patch, &[]);

    asm.begin_function(main, void, fn_ty);
    let elem = asm.access_chain(vec4_ptr, data, &[one]);
    let value = asm.undef(vec4);
    asm.store(elem, value);
    let value = asm.undef(float);
    asm.store(level, value);
    asm.end_function();

    asm.finish()
}

/// layout(triangles, fractional_odd_spacing, point_mode) in;
fn evaluation_shader() -> Vec<u32> {
    let mut asm = Assembler::new();
    let main = asm.id();
    let void = asm.type_void();
    let fn_ty = asm.type_function(void);

    asm.entry_point(ExecutionModel::TessellationEvaluation, main, "main", &[]);
    asm.execution_mode(main, ExecutionMode::Triangles, &[]);
    asm.execution_mode(main, ExecutionMode::SpacingFractionalOdd, &[]);
    asm.execution_mode(main, ExecutionMode::PointMode, &[]);

    asm.begin_function(main, void, fn_ty);
    asm.end_function();

    asm.finish()
}

#[test]
fn vertex_outputs() {
    init_logger();
    let words = vertex_shader();
    let interface = shader_outputs_from_words(&words, ExecutionModel::Vertex, None)
        .unwrap();

    let locations: Vec<_> = interface.iter()
        .map(|output| output.location)
        .collect();
    assert_eq!(locations, vec![
        Location::Assigned(0),
        Location::Assigned(1),
        Location::Assigned(2),
        Location::Assigned(3),
    ]);

    // color, then the unlocated outputs in declaration order.
    let color = &interface[0];
    assert_eq!((color.base_type, color.vec_width), (spv::BaseType::Float, 4));
    assert_eq!(color.builtin, None);

    let position = &interface[1];
    assert_eq!(position.builtin, Some(BuiltIn::Position));
    assert!(position.is_used);
    assert_eq!(position.first_struct_member_alignment, 16);

    let point_size = &interface[2];
    assert_eq!(point_size.builtin, Some(BuiltIn::PointSize));
    assert!(!point_size.is_used);
    assert_eq!(point_size.size(), 0);

    assert_eq!(interface[3].vec_width, 2);
    assert_eq!(interface.total_size(), 16 + 16 + 8);
}

#[test]
fn named_entry_point() {
    init_logger();
    let words = vertex_shader();
    let interface =
        shader_outputs_from_words(&words, ExecutionModel::Vertex, Some("main"))
            .unwrap();
    assert_eq!(interface.len(), 4);

    let err = shader_outputs_from_words(&words, ExecutionModel::Vertex, Some("vs"))
        .unwrap_err();
    assert!(matches!(err, Error::ReflectionFailure(_)));
    assert!(err.to_string().contains("vs"), "{}", err);

    // Right name, wrong stage.
    let err =
        shader_outputs_from_words(&words, ExecutionModel::Fragment, Some("main"))
            .unwrap_err();
    assert!(matches!(err, Error::ReflectionFailure(_)));
}

#[test]
fn control_outputs() {
    init_logger();
    let words = control_shader();
    let interface = shader_outputs_from_words(
        &words, ExecutionModel::TessellationControl, None).unwrap();

    assert_eq!(interface.len(), 2);
    assert_eq!(interface[0].location, Location::Assigned(0));
    assert_eq!(interface[0].vec_width, 4);
    assert!(!interface[0].per_patch);
    assert_eq!(interface[1].location, Location::Assigned(1));
    assert!(interface[1].per_patch);
    assert_eq!(interface[1].size(), 4);
}

#[test]
fn tessellation_pair() {
    init_logger();
    let tesc = control_shader();
    let tese = evaluation_shader();
    let data = tess_reflection_data_from_words(&tesc, Some("main"), &tese, None)
        .unwrap();
    assert_eq!(data, TessReflectionData {
        patch_kind: PatchKind::Triangles,
        winding_order: WindingOrder::Cw,
        partition_mode: PartitionMode::FractionalOdd,
        point_mode: true,
        control_points: 3,
    });
}

#[test]
fn tessellation_missing_winding() {
    init_logger();
    // The evaluation shader alone declares no winding order or control
    // point count.
    let tese = evaluation_shader();
    let err = tess_reflection_data_from_words(&tese, None, &tese, None)
        .unwrap_err();
    assert_eq!(err.missing_mode(), Some(ModeCategory::WindingOrder));
}

#[test]
fn invalid_words() {
    init_logger();
    let err = shader_outputs_from_words(&[0xdead_beef, 0, 0],
        ExecutionModel::Vertex, None).unwrap_err();
    assert!(matches!(err, Error::ReflectionFailure(_)));
}

/// A vertex shader writing one output of a type built by `output_type`.
fn single_output_shader(output_type: impl FnOnce(&mut Assembler) -> u32) ->
    Vec<u32>
{
    let mut asm = Assembler::new();
    let main = asm.id();
    let void = asm.type_void();
    let ty = output_type(&mut asm);
    let ptr = asm.type_pointer(StorageClass::Output, ty);
    let fn_ty = asm.type_function(void);
    let var = asm.variable(ptr, StorageClass::Output);
    asm.entry_point(ExecutionModel::Vertex, main, "main", &[var]);
    asm.decorate(var, Decoration::Location, &[0]);

    asm.begin_function(main, void, fn_ty);
    let value = asm.undef(ty);
    asm.store(var, value);
    asm.end_function();

    asm.finish()
}

#[test]
fn oversized_output_is_failure() {
    init_logger();
    // out float x[0x40000000];
    let words = single_output_shader(|asm| {
        let float = asm.type_float(32);
        asm.type_array(float, 0x4000_0000)
    });
    let err = shader_outputs_from_words(&words, ExecutionModel::Vertex, None)
        .unwrap_err();
    assert!(matches!(err, Error::ReflectionFailure(_)));
    assert!(err.to_string().starts_with("limit exceeded"), "{}", err);
}

#[test]
fn recursive_struct_is_failure() {
    init_logger();
    // %s = OpTypeStruct %s %s
    let words = single_output_shader(|asm| {
        let s = asm.id();
        asm.inst(spv::Op::TypeStruct, &[s, s, s]);
        s
    });
    let err = shader_outputs_from_words(&words, ExecutionModel::Vertex, None)
        .unwrap_err();
    assert!(matches!(err, Error::ReflectionFailure(_)));
    assert!(err.to_string().starts_with("invalid module"), "{}", err);
}
