use russell_tensor::Mandel;
use serde::{Deserialize, Serialize};

/// Defines the modelling hypothesis of the material point
///
/// # Default value
///
/// The default hypothesis is **Tridimensional**
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum Hypothesis {
    /// Axisymmetrical generalised plane strain (1D; radial, axial and hoop directions)
    AxisymmetricalGeneralisedPlaneStrain,

    /// Axisymmetrical (2D; radial, axial and hoop directions)
    Axisymmetrical,

    /// Plane stress (2D)
    PlaneStress,

    /// Plane strain (2D)
    PlaneStrain,

    /// Generalised plane strain (2D)
    GeneralisedPlaneStrain,

    /// Tridimensional (3D)
    Tridimensional,
}

impl Default for Hypothesis {
    fn default() -> Self {
        Hypothesis::Tridimensional
    }
}

impl Hypothesis {
    /// Returns the space dimension (1, 2 or 3)
    pub fn space_dim(&self) -> usize {
        match self {
            Hypothesis::AxisymmetricalGeneralisedPlaneStrain => 1,
            Hypothesis::Axisymmetrical => 2,
            Hypothesis::PlaneStress => 2,
            Hypothesis::PlaneStrain => 2,
            Hypothesis::GeneralisedPlaneStrain => 2,
            Hypothesis::Tridimensional => 3,
        }
    }

    /// Returns the number of components of a symmetric tensor (3, 4 or 6)
    pub fn n_stensor(&self) -> usize {
        match self.space_dim() {
            1 => 3,
            2 => 4,
            _ => 6,
        }
    }

    /// Returns the number of components of a non-symmetric tensor (3, 5 or 9)
    pub fn n_tensor(&self) -> usize {
        match self.space_dim() {
            1 => 3,
            2 => 5,
            _ => 9,
        }
    }

    /// Indicates an axisymmetric hypothesis (components named after R, Z, T)
    pub fn axisymmetric(&self) -> bool {
        match self {
            Hypothesis::AxisymmetricalGeneralisedPlaneStrain | Hypothesis::Axisymmetrical => true,
            _ => false,
        }
    }

    /// Returns the Mandel representation used by the built-in behaviours
    ///
    /// # Results
    ///
    /// * `1D` and `2D`: [Mandel::Symmetric2D] (the 1D case uses the first three components)
    /// * `3D`: [Mandel::Symmetric]
    pub fn mandel(&self) -> Mandel {
        if self.space_dim() == 3 {
            Mandel::Symmetric
        } else {
            Mandel::Symmetric2D
        }
    }

    /// Returns the (i,j) indices associated with each symmetric tensor component
    ///
    /// The ordering is `00, 11, 22, 01, 12, 02` (Mandel ordering).
    pub fn stensor_pairs(&self) -> &'static [(usize, usize)] {
        const PAIRS: [(usize, usize); 6] = [(0, 0), (1, 1), (2, 2), (0, 1), (1, 2), (0, 2)];
        &PAIRS[..self.n_stensor()]
    }

    /// Returns the (i,j) indices associated with each non-symmetric tensor component
    ///
    /// The ordering is `00, 11, 22, 01, 10, 12, 21, 02, 20`; thus the off-diagonal symmetric
    /// component `k ≥ 3` corresponds to the pair of components `2k-3` and `2k-2`.
    pub fn tensor_pairs(&self) -> &'static [(usize, usize)] {
        const PAIRS: [(usize, usize); 9] = [
            (0, 0),
            (1, 1),
            (2, 2),
            (0, 1),
            (1, 0),
            (1, 2),
            (2, 1),
            (0, 2),
            (2, 0),
        ];
        &PAIRS[..self.n_tensor()]
    }

    /// Returns the names of the symmetric tensor components (e.g., EXX, EYY, ...)
    pub fn stensor_names(&self, prefix: &str) -> Vec<String> {
        self.stensor_pairs()
            .iter()
            .map(|(i, j)| format!("{}{}{}", prefix, self.axis(*i), self.axis(*j)))
            .collect()
    }

    /// Returns the names of the non-symmetric tensor components (e.g., FXX, FXY, FYX, ...)
    pub fn tensor_names(&self, prefix: &str) -> Vec<String> {
        self.tensor_pairs()
            .iter()
            .map(|(i, j)| format!("{}{}{}", prefix, self.axis(*i), self.axis(*j)))
            .collect()
    }

    /// Returns the names of the components of a vector in the local frame of an interface
    ///
    /// The first component is normal to the interface (e.g., Un, Ut or Un, Ut1, Ut2).
    pub fn interface_names(&self, prefix: &str) -> Vec<String> {
        match self.space_dim() {
            1 => vec![format!("{}n", prefix)],
            2 => vec![format!("{}n", prefix), format!("{}t", prefix)],
            _ => vec![format!("{}n", prefix), format!("{}t1", prefix), format!("{}t2", prefix)],
        }
    }

    /// Returns the label of an axis
    fn axis(&self, i: usize) -> char {
        if self.axisymmetric() {
            ['R', 'Z', 'T'][i]
        } else {
            ['X', 'Y', 'Z'][i]
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
