//! Shader interface reflection for stitching pipeline stages together.
//!
//! Given SPIR-V modules, this crate recovers the tessellation parameters
//! of a control/evaluation shader pair and flattens a stage's outputs
//! into located, sized leaves, so a later stage can be fed from a buffer
//! the previous stage wrote.

mod assign;
mod error;
mod layout;
mod output;
mod tess;
mod testing;
mod walk;

pub use assign::*;
pub use error::*;
pub use layout::*;
pub use output::*;
pub use tess::*;
pub use walk::*;

/// Parses a SPIR-V word stream and reflects its outputs.
pub fn shader_outputs_from_words(
    words: &[u32],
    model: spv::ExecutionModel,
    entry_name: Option<&str>,
) -> Result<ShaderInterface> {
    let mut module = spv::parse_words(&words)?;
    shader_outputs(&mut module, model, entry_name)
}

/// Parses a pair of SPIR-V word streams and reflects their tessellation
/// parameters.
pub fn tess_reflection_data_from_words(
    tesc: &[u32],
    tesc_entry: Option<&str>,
    tese: &[u32],
    tese_entry: Option<&str>,
) -> Result<TessReflectionData> {
    let mut tesc_module = spv::parse_words(&tesc)?;
    let mut tese_module = spv::parse_words(&tese)?;
    tess_reflection_data(&mut tesc_module, tesc_entry, &mut tese_module, tese_entry)
}
