use crate::*;

/// Gives every unassigned output the location after its predecessor.
///
/// `outputs` must already be stable-sorted by location, which places all
/// unassigned outputs after the assigned ones in traversal order.
pub fn assign_locations(outputs: &mut [ShaderOutput]) {
    let mut last: Option<u32> = None;
    for output in outputs.iter_mut() {
        let loc = match output.location {
            Location::Assigned(loc) => loc,
            Location::Unassigned => last.map_or(0, |loc| loc.saturating_add(1)),
        };
        output.location = Location::Assigned(loc);
        last = Some(loc);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(location: Location) -> ShaderOutput {
        ShaderOutput {
            base_type: spv::BaseType::Float,
            vec_width: 4,
            location,
            component: 0,
            first_struct_member_alignment: 0,
            builtin: None,
            per_patch: false,
            is_used: true,
        }
    }

    fn locations(outputs: &[ShaderOutput]) -> Vec<Option<u32>> {
        outputs.iter().map(|output| output.location.get()).collect()
    }

    #[test]
    fn all_unassigned() {
        let mut outputs = vec![at(Location::Unassigned); 3];
        assign_locations(&mut outputs);
        assert_eq!(locations(&outputs), vec![Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn follows_explicit() {
        let mut outputs = vec![
            at(Location::Assigned(0)),
            at(Location::Assigned(2)),
            at(Location::Unassigned),
        ];
        assign_locations(&mut outputs);
        assert_eq!(locations(&outputs), vec![Some(0), Some(2), Some(3)]);
    }

    #[test]
    fn fills_between_explicit() {
        // Unsorted input is scanned as given.
        let mut outputs = vec![
            at(Location::Assigned(0)),
            at(Location::Unassigned),
            at(Location::Assigned(2)),
        ];
        assign_locations(&mut outputs);
        assert_eq!(locations(&outputs), vec![Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn saturates() {
        let mut outputs = vec![
            at(Location::Assigned(u32::MAX)),
            at(Location::Unassigned),
        ];
        assign_locations(&mut outputs);
        assert_eq!(locations(&outputs), vec![Some(u32::MAX), Some(u32::MAX)]);
    }
}
