use derive_more::Display;

use crate::*;

/// An output location, or its absence before implicit locations are
/// filled in.
///
/// Variants are ordered so that sorting places unassigned locations after
/// every assigned one.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Location {
    #[display(fmt = "{}", _0)]
    Assigned(u32),
    #[display(fmt = "unassigned")]
    Unassigned,
}

impl Default for Location {
    fn default() -> Self {
        Self::Unassigned
    }
}

impl From<u32> for Location {
    fn from(loc: u32) -> Self {
        Self::Assigned(loc)
    }
}

impl Location {
    pub fn get(self) -> Option<u32> {
        match self {
            Self::Assigned(loc) => Some(loc),
            Self::Unassigned => None,
        }
    }

    pub fn is_assigned(self) -> bool {
        self.get().is_some()
    }

    /// The location after this one. Running off the end of the location
    /// space leaves the location unassigned.
    pub fn next(self) -> Self {
        match self {
            Self::Assigned(loc) => loc.checked_add(1)
                .map_or(Self::Unassigned, Self::Assigned),
            Self::Unassigned => Self::Unassigned,
        }
    }
}

/// One flattened scalar or vector leaf of a shader's output interface.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ShaderOutput {
    pub base_type: spv::BaseType,
    /// Vector width; 1 for scalars.
    pub vec_width: u32,
    pub location: Location,
    pub component: u32,
    /// If this is the first leaf of a struct, the alignment of that
    /// struct; otherwise 0.
    pub first_struct_member_alignment: u32,
    pub builtin: Option<spv::BuiltIn>,
    /// Only meaningful for tessellation control shaders.
    pub per_patch: bool,
    /// Whether the shader actually writes this output.
    pub is_used: bool,
}

impl ShaderOutput {
    pub fn size(&self) -> u32 {
        output_size(self)
    }

    pub fn alignment(&self) -> u32 {
        output_alignment(self)
    }
}

/// The outputs of a shader stage in ascending location order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ShaderInterface {
    outputs: Vec<ShaderOutput>,
}

impl ShaderInterface {
    pub(crate) fn new(outputs: Vec<ShaderOutput>) -> Self {
        Self { outputs }
    }

    pub fn outputs(&self) -> &[ShaderOutput] {
        &self.outputs
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ShaderOutput> {
        self.outputs.iter()
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Bytes of buffer space all outputs occupy, ignoring alignment.
    pub fn total_size(&self) -> u32 {
        self.outputs.iter().map(output_size).sum()
    }

    pub fn find_location(&self, loc: u32) ->
        impl Iterator<Item = &ShaderOutput> + '_
    {
        self.outputs.iter()
            .filter(move |output| output.location == Location::Assigned(loc))
    }

    pub fn into_vec(self) -> Vec<ShaderOutput> {
        self.outputs
    }
}

impl<'a> IntoIterator for &'a ShaderInterface {
    type Item = &'a ShaderOutput;
    type IntoIter = std::slice::Iter<'a, ShaderOutput>;

    fn into_iter(self) -> Self::IntoIter {
        self.outputs.iter()
    }
}

impl std::ops::Index<usize> for ShaderInterface {
    type Output = ShaderOutput;

    fn index(&self, idx: usize) -> &Self::Output {
        &self.outputs[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_order() {
        let mut locs = vec![
            Location::Unassigned,
            Location::Assigned(3),
            Location::Assigned(u32::MAX),
            Location::Assigned(0),
        ];
        locs.sort();
        assert_eq!(locs, vec![
            Location::Assigned(0),
            Location::Assigned(3),
            Location::Assigned(u32::MAX),
            Location::Unassigned,
        ]);
    }

    #[test]
    fn location_next() {
        assert_eq!(Location::Assigned(4).next(), Location::Assigned(5));
        assert_eq!(Location::Assigned(u32::MAX).next(), Location::Unassigned);
        assert_eq!(Location::Unassigned.next(), Location::Unassigned);
        assert_eq!(Location::Assigned(7).get(), Some(7));
        assert!(!Location::default().is_assigned());
        assert_eq!(Location::Unassigned.to_string(), "unassigned");
    }
}
