//! Field data containers
//!
//! Every quantity the integrator evolves is a per-node vector along the
//! fault. A [`FieldSet`] bundles one or more of them under type-safe
//! [`FieldKind`] identifiers so that the integrator can treat the whole
//! state as an opaque tuple of semantically distinct buffers.

use nalgebra::DVector;
use std::collections::BTreeMap;
use std::fmt;

// =================================================================================================
// Field Kinds (Type-safe Identifiers)
// =================================================================================================

/// Known integrated field kinds (type-safe enum)
///
/// # Enum type safety
///
/// If you need a field beyond those available in this enumeration, use
/// `Custom` with a static name to maintain type safety.
///
/// # Example
/// ```
/// use quake_rs::physics::{FieldKind, FieldSet};
///
/// let porosity = FieldKind::Custom("porosity");
/// let mut state = FieldSet::empty();
/// state.set(porosity, nalgebra::DVector::from_element(100, 0.1));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldKind {
    /// Rate-and-state variable psi (dimensionless)
    State,

    /// Slip / plus-side fault displacement (m)
    Slip,

    /// Minus-side fault displacement, full-duplex faults only (m)
    SlipMinus,

    /// Temperature (K), integrated implicitly under IMEX stepping
    Temperature,

    /// Custom field (for extension)
    Custom(&'static str),
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::State => write!(f, "state"),
            FieldKind::Slip => write!(f, "slip"),
            FieldKind::SlipMinus => write!(f, "slip_minus"),
            FieldKind::Temperature => write!(f, "temperature"),
            FieldKind::Custom(name) => write!(f, "{}", name),
        }
    }
}

// =================================================================================================
// Field Set (Integration State Vector)
// =================================================================================================

/// Ordered collection of named per-node field buffers
///
/// This is the state vector handed to and returned by the time
/// integrator. Fields are keyed by [`FieldKind`] and stored in a
/// `BTreeMap`, so iteration order is deterministic — stage combinations
/// and error norms always walk the fields in the same order.
///
/// # Type Safety
///
/// Fields are identified by the `FieldKind` enum instead of strings.
///
/// # Example
/// ```
/// use quake_rs::physics::{FieldKind, FieldSet};
/// use nalgebra::DVector;
///
/// let mut state = FieldSet::new(FieldKind::State, DVector::from_element(10, 0.6));
/// state.set(FieldKind::Slip, DVector::zeros(10));
/// assert_eq!(state.num_fields(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSet {
    /// Field buffers keyed by kind
    fields: BTreeMap<FieldKind, DVector<f64>>,
}

impl FieldSet {
    /// Create a new set with a primary field
    pub fn new(kind: FieldKind, values: DVector<f64>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(kind, values);
        Self { fields }
    }

    /// Create an empty set
    pub fn empty() -> Self {
        Self { fields: BTreeMap::new() }
    }

    /// Create a set with a single uniform field
    pub fn uniform(kind: FieldKind, len: usize, value: f64) -> Self {
        Self::new(kind, DVector::from_element(len, value))
    }

    /// Get a field by kind
    pub fn get(&self, kind: FieldKind) -> Option<&DVector<f64>> {
        self.fields.get(&kind)
    }

    /// Get mutable reference to a field
    pub fn get_mut(&mut self, kind: FieldKind) -> Option<&mut DVector<f64>> {
        self.fields.get_mut(&kind)
    }

    /// Set a field
    pub fn set(&mut self, kind: FieldKind, values: DVector<f64>) {
        self.fields.insert(kind, values);
    }

    /// Check whether a field is present
    pub fn contains(&self, kind: FieldKind) -> bool {
        self.fields.contains_key(&kind)
    }

    /// List of stored field kinds, in deterministic order
    pub fn kinds(&self) -> Vec<FieldKind> {
        self.fields.keys().copied().collect()
    }

    /// Number of stored fields
    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    /// Check emptiness
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Length of a stored field, if present
    pub fn len_of(&self, kind: FieldKind) -> Option<usize> {
        self.fields.get(&kind).map(|v| v.len())
    }

    /// Iterate over `(kind, buffer)` pairs in deterministic order
    pub fn iter(&self) -> impl Iterator<Item = (&FieldKind, &DVector<f64>)> {
        self.fields.iter()
    }

    /// Check that `other` carries exactly the same field kinds with the
    /// same per-field lengths.
    ///
    /// The integrator enforces this between the initial condition and
    /// every rate buffer a model returns; inside the stepping loop the
    /// shapes are then trusted.
    pub fn shape_matches(&self, other: &FieldSet) -> bool {
        if self.fields.len() != other.fields.len() {
            return false;
        }
        self.fields
            .iter()
            .all(|(kind, values)| other.len_of(*kind) == Some(values.len()))
    }
}

// Operator overloading for stage combinations

impl std::ops::Add for FieldSet {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self::Output {
        for (kind, values) in rhs.fields {
            if let Some(existing) = self.fields.get_mut(&kind) {
                *existing += values;
            } else {
                self.fields.insert(kind, values);
            }
        }
        self
    }
}

impl std::ops::Mul<f64> for FieldSet {
    type Output = Self;

    fn mul(mut self, scalar: f64) -> Self::Output {
        for values in self.fields.values_mut() {
            *values *= scalar;
        }
        self
    }
}

impl std::ops::Mul<FieldSet> for f64 {
    type Output = FieldSet;

    fn mul(self, rhs: FieldSet) -> Self::Output {
        rhs * self
    }
}

// =================================================================================================
// Tests
// =================================================================================================
