use crate::mesh_error::MeshError;
use crate::topology::poly_mesh::PolyMesh;
use crate::topology::validation::check_poly_mesh;

/// Trait for validating data structure invariants.
pub trait DebugInvariants {
    /// Assert invariants in debug builds or when invariant checking is enabled.
    fn debug_assert_invariants(&self);
    /// Validate invariants and return the first error encountered.
    fn validate_invariants(&self) -> Result<(), MeshError>;
}

/// Helper macro to run a fallible check and panic on error when invariant
/// checking is enabled.
#[macro_export]
macro_rules! debug_invariants {
    ($expr:expr, $($ctx:tt)*) => {
        #[cfg(any(debug_assertions, feature = "strict-invariants", feature = "check-invariants"))]
        if let Err(e) = $expr {
            panic!(concat!("[invariants] ", $($ctx)*, ": {}"), e);
        }
    };
}

impl DebugInvariants for PolyMesh {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "PolyMesh");
    }

    /// Structural checks plus upper-triangular ordering of internal faces.
    fn validate_invariants(&self) -> Result<(), MeshError> {
        check_poly_mesh(self)?;
        let nei = self.neighbour();
        let own = self.owner();
        if let Some(f) = (1..nei.len()).find(|&f| (own[f - 1], nei[f - 1]) > (own[f], nei[f])) {
            return Err(MeshError::InvalidTopology(format!(
                "internal face {f} breaks (owner, neighbour) ordering"
            )));
        }
        Ok(())
    }
}
