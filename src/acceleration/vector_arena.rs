use russell_lab::Vector;

/// Identifies a vector stored in a [VectorArena]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Handle(usize);

/// Holds a pool of fixed-size vectors addressed by handles
///
/// Released vectors are recycled by the next `acquire`, thus no allocation happens once the
/// pool has grown to its working size.
pub struct VectorArena {
    /// Dimension of all vectors
    dim: usize,

    /// All allocated vectors
    buffers: Vec<Vector>,

    /// Indices of the vectors available for reuse
    free: Vec<usize>,
}

impl VectorArena {
    /// Allocates a new (empty) instance
    pub fn new(dim: usize) -> Self {
        VectorArena {
            dim,
            buffers: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Returns the dimension of the vectors
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Drops all vectors and sets a new dimension
    ///
    /// All previously acquired handles become invalid.
    pub fn reset(&mut self, dim: usize) {
        self.dim = dim;
        self.buffers.clear();
        self.free.clear();
    }

    /// Returns a handle to an available vector (its contents are unspecified)
    pub fn acquire(&mut self) -> Handle {
        match self.free.pop() {
            Some(index) => Handle(index),
            None => {
                self.buffers.push(Vector::new(self.dim));
                Handle(self.buffers.len() - 1)
            }
        }
    }

    /// Returns a handle to an available vector holding a copy of another one
    pub fn duplicate(&mut self, handle: Handle) -> Handle {
        let copy = self.acquire();
        for i in 0..self.dim {
            let value = self.buffers[handle.0][i];
            self.buffers[copy.0][i] = value;
        }
        copy
    }

    /// Makes the vector available for reuse
    pub fn release(&mut self, handle: Handle) {
        if !self.free.contains(&handle.0) {
            self.free.push(handle.0);
        }
    }

    /// Returns an access to the vector
    pub fn get(&self, handle: Handle) -> &Vector {
        &self.buffers[handle.0]
    }

    /// Returns a mutable access to the vector
    pub fn get_mut(&mut self, handle: Handle) -> &mut Vector {
        &mut self.buffers[handle.0]
    }

    /// Returns the number of allocated vectors
    pub fn n_allocated(&self) -> usize {
        self.buffers.len()
    }

    /// Returns the number of vectors in use
    pub fn n_in_use(&self) -> usize {
        self.buffers.len() - self.free.len()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
