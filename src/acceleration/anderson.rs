use super::{parse_positive, AccelerationTrait, CovarianceHistory, Handle, VectorArena};
use crate::StrError;
use russell_lab::{vec_inner, Vector};
use std::collections::VecDeque;

/// Defines the default number of stored (estimate, correction) pairs
pub const ANDERSON_DEFAULT_N_MAX: usize = 5;

/// Defines the default period of the mixing (mixing happens when iteration % alMax == 0)
pub const ANDERSON_DEFAULT_AL_MAX: usize = 1;

/// Implements the Anderson mixing
///
/// The last `Nmax` pairs `(xᵢ, fᵢ)` are kept, where `xᵢ` is the estimate after the Newton
/// correction and `fᵢ` the correction itself. The new estimate is the combination `Σ αᵢ xᵢ`
/// whose weights (`Σ αᵢ = 1`) minimize `‖Σ αᵢ fᵢ‖` (see [CovarianceHistory]).
///
/// Two forms are available:
///
/// * `UAnderson`: `f = -δu`
/// * `FAnderson`: `f = [-δu / eeps, R / seps]` (correction and residual, each scaled by its tolerance)
///
/// The newest pair of a converged step is kept by `post_step` and seeds the window of the
/// next step in `pre_step`.
///
/// Parameters: `Nmax` (default 5) and `alMax` (default 1).
pub struct Anderson {
    /// Uses the residual in the correction vectors (FAnderson)
    with_residual: bool,

    /// Maximum number of pairs
    n_max: usize,

    /// Mixing period
    al_max: usize,

    /// Gram matrix of the corrections (allocated by initialize)
    history: Option<CovarianceHistory>,

    /// Estimates
    x_arena: VectorArena,

    /// Corrections
    f_arena: VectorArena,

    /// Stored pairs (oldest first)
    window: VecDeque<(Handle, Handle)>,

    /// Converged pair of the previous step
    seed: Option<(Handle, Handle)>,

    /// Inner products of the newest correction
    products: Vec<f64>,
}

impl Anderson {
    /// Allocates a new instance
    ///
    /// Use `with_residual = true` for the FAnderson form.
    pub fn new(with_residual: bool) -> Self {
        Anderson {
            with_residual,
            n_max: ANDERSON_DEFAULT_N_MAX,
            al_max: ANDERSON_DEFAULT_AL_MAX,
            history: None,
            x_arena: VectorArena::new(0),
            f_arena: VectorArena::new(0),
            window: VecDeque::new(),
            seed: None,
            products: Vec::new(),
        }
    }

    /// Returns the number of stored pairs
    pub fn depth(&self) -> usize {
        self.window.len()
    }

    /// Releases all stored pairs (the seed is kept)
    fn clear(&mut self) {
        while let Some((hx, hf)) = self.window.pop_front() {
            self.x_arena.release(hx);
            self.f_arena.release(hf);
        }
        if let Some(history) = self.history.as_mut() {
            history.clear();
        }
    }
}

impl AccelerationTrait for Anderson {
    fn name(&self) -> &'static str {
        if self.with_residual {
            "FAnderson"
        } else {
            "UAnderson"
        }
    }

    fn set_parameter(&mut self, key: &str, value: &str) -> Result<(), StrError> {
        match key {
            "Nmax" => self.n_max = parse_positive(value, "Nmax must be an integer ≥ 1")?,
            "alMax" => self.al_max = parse_positive(value, "alMax must be an integer ≥ 1")?,
            _ => return Err("unknown parameter of the Anderson algorithm"),
        }
        Ok(())
    }

    fn initialize(&mut self, n: usize) -> Result<(), StrError> {
        let nf = if self.with_residual { 2 * n } else { n };
        self.history = Some(CovarianceHistory::new(self.n_max)?);
        self.window.clear();
        self.seed = None;
        self.x_arena.reset(n);
        self.f_arena.reset(nf);
        self.products = Vec::with_capacity(self.n_max);
        Ok(())
    }

    fn pre_step(&mut self) {
        self.clear();
        let (sx, sf) = match self.seed {
            Some(pair) => pair,
            None => return,
        };
        let history = match self.history.as_mut() {
            Some(h) => h,
            None => return,
        };
        let hx = self.x_arena.duplicate(sx);
        let hf = self.f_arena.duplicate(sf);
        let f = self.f_arena.get(hf);
        if history.insert(&[vec_inner(f, f)]).is_err() {
            self.x_arena.release(hx);
            self.f_arena.release(hf);
            return;
        }
        self.window.push_back((hx, hf));
    }

    fn execute(&mut self, u: &mut Vector, du: &Vector, rr: &Vector, eeps: f64, seps: f64, iteration: usize) -> bool {
        let n = self.x_arena.dim();
        let history = match self.history.as_mut() {
            Some(h) => h,
            None => return false, // not initialized
        };

        // evict the oldest pair
        if self.window.len() == self.n_max {
            if let Some((hx, hf)) = self.window.pop_front() {
                self.x_arena.release(hx);
                self.f_arena.release(hf);
            }
            history.shift();
        }

        // store the new pair
        let hx = self.x_arena.acquire();
        let hf = self.f_arena.acquire();
        {
            let x = self.x_arena.get_mut(hx);
            for i in 0..n {
                x[i] = u[i];
            }
            let f = self.f_arena.get_mut(hf);
            if self.with_residual {
                for i in 0..n {
                    f[i] = -du[i] / eeps;
                    f[n + i] = rr[i] / seps;
                }
            } else {
                for i in 0..n {
                    f[i] = -du[i];
                }
            }
        }
        self.products.clear();
        let f_new = self.f_arena.get(hf);
        for (_, h) in &self.window {
            self.products.push(vec_inner(self.f_arena.get(*h), f_new));
        }
        self.products.push(vec_inner(f_new, f_new));
        if history.insert(&self.products).is_err() {
            self.x_arena.release(hx);
            self.f_arena.release(hf);
            return false;
        }
        self.window.push_back((hx, hf));

        // mixing
        if iteration % self.al_max != 0 || self.window.len() < 2 {
            return false;
        }
        let weights = history.weights();
        u.fill(0.0);
        for (k, (h, _)) in self.window.iter().enumerate() {
            let x = self.x_arena.get(*h);
            for i in 0..n {
                u[i] += weights[k] * x[i];
            }
        }
        true
    }

    fn post_step(&mut self) {
        let newest = match self.window.pop_back() {
            Some(pair) => pair,
            None => return,
        };
        if let Some((sx, sf)) = self.seed.take() {
            self.x_arena.release(sx);
            self.f_arena.release(sf);
        }
        self.seed = Some(newest);
        self.clear();
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
