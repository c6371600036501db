use crate::*;

fn component_size(base: spv::BaseType) -> u32 {
    use spv::BaseType as Base;
    match base {
        Base::SByte | Base::UByte => 1,
        Base::Short | Base::UShort | Base::Half => 2,
        _ => 4,
    }
}

/// Returns the size in bytes of an output. Unused outputs consume no
/// buffer space.
pub fn output_size(output: &ShaderOutput) -> u32 {
    if !output.is_used { return 0; }
    // 3-vectors are laid out like 4-vectors on the target.
    let width = if output.vec_width == 3 { 4 } else { output.vec_width };
    component_size(output.base_type) * width
}

/// Returns the alignment of an output. This is normally its size, but the
/// first leaf of a struct takes on the alignment of the whole struct.
pub fn output_alignment(output: &ShaderOutput) -> u32 {
    if output.is_used && output.first_struct_member_alignment != 0 {
        output.first_struct_member_alignment
    } else {
        output_size(output)
    }
}
