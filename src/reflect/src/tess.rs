use log::{debug, warn};
use spv::{ExecutionMode, ExecutionModel, Reflect};

use crate::*;

/// The primitive a tessellator subdivides.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PatchKind {
    Triangles,
    Quads,
    Isolines,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum WindingOrder {
    Cw,
    Ccw,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PartitionMode {
    Equal,
    FractionalEven,
    FractionalOdd,
}

/// Maps a closed set of values onto the execution modes that declare
/// them. Candidates are tried in slice order.
trait ModeSet: Copy + Eq + std::fmt::Debug + 'static {
    const CATEGORY: ModeCategory;
    const CANDIDATES: &'static [Self];

    fn execution_mode(self) -> ExecutionMode;
}

macro_rules! impl_mode_set {
    ($name:ident, $category:ident, {$($value:ident => $mode:ident,)*}) => {
        impl $name {
            /// The execution mode that declares this value.
            pub fn execution_mode(self) -> ExecutionMode {
                match self {
                    $($name::$value => ExecutionMode::$mode,)*
                }
            }
        }

        impl ModeSet for $name {
            const CATEGORY: ModeCategory = ModeCategory::$category;
            const CANDIDATES: &'static [Self] = &[$($name::$value,)*];

            fn execution_mode(self) -> ExecutionMode {
                $name::execution_mode(self)
            }
        }
    }
}

impl_mode_set!(PatchKind, PatchKind, {
    Triangles => Triangles,
    Quads => Quads,
    Isolines => Isolines,
});

impl_mode_set!(WindingOrder, WindingOrder, {
    Cw => VertexOrderCw,
    Ccw => VertexOrderCcw,
});

impl_mode_set!(PartitionMode, PartitionMode, {
    Equal => SpacingEqual,
    FractionalEven => SpacingFractionalEven,
    FractionalOdd => SpacingFractionalOdd,
});

/// Tessellation parameters gathered from a control/evaluation shader pair.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct TessReflectionData {
    pub patch_kind: PatchKind,
    pub winding_order: WindingOrder,
    pub partition_mode: PartitionMode,
    pub point_mode: bool,
    /// Number of output control points per patch.
    pub control_points: u32,
}

fn declared<T: ModeSet, R: Reflect>(module: &R) -> Option<T> {
    T::CANDIDATES.iter().copied()
        .find(|&value| module.has_execution_mode(ModeSet::execution_mode(value)))
}

fn select<T, C, E>(tesc: &C, tese: &E) -> Result<T>
where
    T: ModeSet,
    C: Reflect,
    E: Reflect,
{
    let control: Option<T> = declared(tesc);
    let eval: Option<T> = declared(tese);
    match (control, eval) {
        (Some(control), Some(eval)) if control != eval => {
            warn!(
                "tessellation shaders disagree on {}: {:?} in control, {:?} \
                    in evaluation; using {:?}",
                T::CATEGORY, control, eval, control,
            );
        },
        _ => {},
    }
    control.or(eval).ok_or(Error::MissingExecutionMode(T::CATEGORY))
}

fn bind(module: &mut impl Reflect, model: ExecutionModel, entry: Option<&str>) ->
    Result<()>
{
    if let Some(name) = entry.filter(|name| !name.is_empty()) {
        module.set_entry_point(name, model)?;
    }
    module.compile()?;
    Ok(())
}

/// Reads the tessellation execution modes off a pair of shaders. Each
/// category may be declared in either stage; the control shader takes
/// precedence.
pub fn tess_reflection_data<C: Reflect, E: Reflect>(
    tesc: &mut C,
    tesc_entry: Option<&str>,
    tese: &mut E,
    tese_entry: Option<&str>,
) -> Result<TessReflectionData> {
    bind(tesc, ExecutionModel::TessellationControl, tesc_entry)?;
    bind(tese, ExecutionModel::TessellationEvaluation, tese_entry)?;
    let (tesc, tese) = (&*tesc, &*tese);

    let patch_kind: PatchKind = select(tesc, tese)?;
    let winding_order: WindingOrder = select(tesc, tese)?;
    let partition_mode: PartitionMode = select(tesc, tese)?;
    let point_mode = tesc.has_execution_mode(ExecutionMode::PointMode)
        || tese.has_execution_mode(ExecutionMode::PointMode);
    let control = tesc.execution_mode_argument(ExecutionMode::OutputVertices);
    let eval = tese.execution_mode_argument(ExecutionMode::OutputVertices);
    if let (Some(control), Some(eval)) = (control, eval) {
        if control != eval {
            warn!(
                "tessellation shaders disagree on output vertices: {} in \
                    control, {} in evaluation; using {}",
                control, eval, control,
            );
        }
    }
    let control_points = control.or(eval)
        .ok_or(Error::MissingExecutionMode(ModeCategory::ControlPoints))?;

    let data = TessReflectionData {
        patch_kind,
        winding_order,
        partition_mode,
        point_mode,
        control_points,
    };
    debug!("tessellation reflection: {:?}", data);
    Ok(data)
}
