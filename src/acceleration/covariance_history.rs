use crate::StrError;
use russell_lab::Matrix;

/// Defines the relative threshold below which a direction is regarded as linearly dependent
const DEPENDENCY_TOLERANCE: f64 = 1e-10;

/// Holds the Gram matrix of a sliding window of correction vectors
///
/// The window holds up to `capacity` vectors (oldest first). Only the inner products are
/// stored; the vectors themselves belong to the caller. After every change the weights
/// `α` (with `Σα = 1`) minimizing `‖Σ αᵢ fᵢ‖` are recomputed.
///
/// With the newest vector `fₘ` as reference, the differences `dⱼ = fⱼ - fₘ` have the Gram matrix
///
/// ```text
/// Mᵢⱼ = Gᵢⱼ - Gᵢₘ - Gₘⱼ + Gₘₘ
/// ```
///
/// which is factorized as `M = Rᵀ R` (Gram-Schmidt on the differences, processed from the most
/// recent to the oldest). Differences that are (almost) linearly dependent on the previous ones
/// are dropped, i.e., receive a zero weight.
pub struct CovarianceHistory {
    /// Maximum number of vectors
    capacity: usize,

    /// Current number of vectors
    depth: usize,

    /// Inner products of the stored vectors (capacity × capacity)
    gram: Matrix,

    /// Upper triangular factor of the differences Gram matrix (in processing order)
    rr: Matrix,

    /// Right-hand side (-Dᵀ fₘ) and intermediate solutions
    b: Vec<f64>,
    y: Vec<f64>,
    gamma: Vec<f64>,

    /// Flags of the differences kept by the factorization (in processing order)
    accepted: Vec<bool>,

    /// Mixing weights
    alpha: Vec<f64>,
}

impl CovarianceHistory {
    /// Allocates a new instance
    pub fn new(capacity: usize) -> Result<Self, StrError> {
        if capacity < 1 {
            return Err("the capacity of the covariance history must be ≥ 1");
        }
        Ok(CovarianceHistory {
            capacity,
            depth: 0,
            gram: Matrix::new(capacity, capacity),
            rr: Matrix::new(capacity, capacity),
            b: vec![0.0; capacity],
            y: vec![0.0; capacity],
            gamma: vec![0.0; capacity],
            accepted: vec![false; capacity],
            alpha: vec![0.0; capacity],
        })
    }

    /// Returns the maximum number of vectors
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the current number of vectors
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Indicates that no more vectors can be inserted before a shift
    pub fn is_full(&self) -> bool {
        self.depth == self.capacity
    }

    /// Returns the inner product of the i-th and j-th vectors (oldest first)
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.gram.get(i, j)
    }

    /// Removes all vectors
    pub fn clear(&mut self) {
        self.depth = 0;
    }

    /// Inserts a new (newest) vector
    ///
    /// `products` holds the inner products of the new vector with the stored vectors
    /// (oldest first) followed by its squared norm; thus `products.len() == depth + 1`.
    pub fn insert(&mut self, products: &[f64]) -> Result<(), StrError> {
        if self.depth == self.capacity {
            return Err("the covariance history is full");
        }
        if products.len() != self.depth + 1 {
            return Err("the number of inner products must equal the depth plus one");
        }
        let n = self.depth;
        for i in 0..n {
            self.gram.set(i, n, products[i]);
            self.gram.set(n, i, products[i]);
        }
        self.gram.set(n, n, products[n]);
        self.depth += 1;
        self.refactorize();
        Ok(())
    }

    /// Drops the oldest vector
    pub fn shift(&mut self) {
        if self.depth == 0 {
            return;
        }
        for i in 1..self.depth {
            for j in 1..self.depth {
                self.gram.set(i - 1, j - 1, self.gram.get(i, j));
            }
        }
        self.depth -= 1;
        self.refactorize();
    }

    /// Returns the mixing weights of the stored vectors (oldest first)
    pub fn weights(&self) -> &[f64] {
        &self.alpha[..self.depth]
    }

    /// Computes the mixing weights
    fn refactorize(&mut self) {
        let n = self.depth;
        if n == 0 {
            return;
        }
        let m = n - 1; // newest vector and number of differences
        let g = &self.gram;
        let diff = |i: usize, j: usize| g.get(i, j) - g.get(i, m) - g.get(m, j) + g.get(m, m);

        // processing order: p = 0 is the newest difference
        let index = |p: usize| m - 1 - p;
        for p in 0..m {
            let k = index(p);
            self.b[p] = -(g.get(k, m) - g.get(m, m));
        }

        // Gram-Schmidt (Cholesky factorization of the differences Gram matrix)
        for p in 0..m {
            let k = index(p);
            let mkk = diff(k, k);
            let mut d = mkk;
            for q in 0..p {
                if self.accepted[q] {
                    d -= self.rr.get(q, p) * self.rr.get(q, p);
                }
            }
            if mkk <= 0.0 || d <= DEPENDENCY_TOLERANCE * mkk {
                self.accepted[p] = false;
                continue;
            }
            self.accepted[p] = true;
            let rpp = f64::sqrt(d);
            self.rr.set(p, p, rpp);
            for l in (p + 1)..m {
                let mut v = diff(k, index(l));
                for q in 0..p {
                    if self.accepted[q] {
                        v -= self.rr.get(q, p) * self.rr.get(q, l);
                    }
                }
                self.rr.set(p, l, v / rpp);
            }
        }

        // solve Rᵀ y = b
        for p in 0..m {
            if !self.accepted[p] {
                continue;
            }
            let mut v = self.b[p];
            for q in 0..p {
                if self.accepted[q] {
                    v -= self.rr.get(q, p) * self.y[q];
                }
            }
            self.y[p] = v / self.rr.get(p, p);
        }

        // solve R γ = y
        for p in (0..m).rev() {
            if !self.accepted[p] {
                self.gamma[p] = 0.0;
                continue;
            }
            let mut v = self.y[p];
            for l in (p + 1)..m {
                if self.accepted[l] {
                    v -= self.rr.get(p, l) * self.gamma[l];
                }
            }
            self.gamma[p] = v / self.rr.get(p, p);
        }

        // weights
        let mut sum = 0.0;
        for p in 0..m {
            self.alpha[index(p)] = self.gamma[p];
            sum += self.gamma[p];
        }
        self.alpha[m] = 1.0 - sum;
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
