// 1-D maximizers
// --------------
// Ternary, golden-section and Fibonacci shrink a bracket [lower, upper] around
// a single peak; nothing is guaranteed for them when the objective has several.
// The two random searchers sample the bracket instead and only ever keep the
// best point seen. They draw from a `StdRng` seeded per call, so a run is
// reproducible for a given seed.
//
// The objective is fallible; the first error aborts the search and is returned
// as-is.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const MAX_ITERATIONS: usize = 200;

/// Best point found by a search.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Maximum {
    pub argmax: f64,
    pub value: f64,
    pub evaluations: usize,
}

pub trait Maximizer: Send + Sync {
    fn maximize<F, E>(&self, objective: F, lower: f64, upper: f64) -> Result<Maximum, E>
    where
        F: FnMut(f64) -> Result<f64, E>;
}

/// Counts objective calls.
struct Counted<F> {
    objective: F,
    evaluations: usize,
}

impl<F> Counted<F> {
    fn new(objective: F) -> Self {
        Self { objective, evaluations: 0 }
    }

    fn eval<E>(&mut self, x: f64) -> Result<f64, E>
    where
        F: FnMut(f64) -> Result<f64, E>,
    {
        self.evaluations += 1;
        (self.objective)(x)
    }
}

fn is_degenerate(lower: f64, upper: f64) -> bool {
    !lower.is_finite() || !upper.is_finite() || lower >= upper || !(upper - lower).is_finite()
}

fn degenerate<F, E>(objective: &mut Counted<F>, lower: f64) -> Result<Maximum, E>
where
    F: FnMut(f64) -> Result<f64, E>,
{
    let value = objective.eval(lower)?;
    Ok(Maximum { argmax: lower, value, evaluations: objective.evaluations })
}

// ----------------------------------- Ternary -----------------------------------

#[derive(Copy, Clone, Debug)]
pub struct TernarySearch {
    pub epsilon: f64,
}

impl Maximizer for TernarySearch {
    fn maximize<F, E>(&self, objective: F, lower: f64, upper: f64) -> Result<Maximum, E>
    where
        F: FnMut(f64) -> Result<f64, E>,
    {
        let mut f = Counted::new(objective);
        if is_degenerate(lower, upper) {
            return degenerate(&mut f, lower);
        }

        let (mut a, mut b) = (lower, upper);
        for _ in 0..MAX_ITERATIONS {
            let width = b - a;
            if width <= self.epsilon {
                break;
            }
            let m1 = a + width / 3.0;
            let m2 = b - width / 3.0;
            if f.eval(m1)? < f.eval(m2)? { a = m1; } else { b = m2; }
            if b - a >= width {
                break; // no longer shrinking at this magnitude
            }
        }

        let argmax = 0.5 * (a + b);
        let value = f.eval(argmax)?;
        Ok(Maximum { argmax, value, evaluations: f.evaluations })
    }
}

// -------------------------------- Golden section --------------------------------

#[derive(Copy, Clone, Debug)]
pub struct GoldenSectionSearch {
    pub epsilon: f64,
}

impl Maximizer for GoldenSectionSearch {
    fn maximize<F, E>(&self, objective: F, lower: f64, upper: f64) -> Result<Maximum, E>
    where
        F: FnMut(f64) -> Result<f64, E>,
    {
        let mut f = Counted::new(objective);
        if is_degenerate(lower, upper) {
            return degenerate(&mut f, lower);
        }

        let inv_phi = 0.5 * (5.0_f64.sqrt() - 1.0); // 1 / golden ratio ~0.618
        let (mut a, mut b) = (lower, upper);
        let mut c = b - (b - a) * inv_phi;
        let mut d = a + (b - a) * inv_phi;
        let mut fc = f.eval(c)?;
        let mut fd = f.eval(d)?;

        for _ in 0..MAX_ITERATIONS {
            if b - a <= self.epsilon { break; }
            if fc > fd {
                b = d; d = c; fd = fc;
                c = b - (b - a) * inv_phi;
                fc = f.eval(c)?;
            } else {
                a = c; c = d; fc = fd;
                d = a + (b - a) * inv_phi;
                fd = f.eval(d)?;
            }
        }

        let (argmax, value) = if fc > fd { (c, fc) } else { (d, fd) };
        Ok(Maximum { argmax, value, evaluations: f.evaluations })
    }
}

// ---------------------------------- Fibonacci ----------------------------------

/// Fixed budget of `steps` objective evaluations.
#[derive(Copy, Clone, Debug)]
pub struct FibonacciSearch {
    steps: usize,
}

impl FibonacciSearch {
    /// Fewer than three steps cannot place two distinct interior points.
    pub fn new(steps: usize) -> Self {
        Self { steps: steps.max(3) }
    }

    #[inline]
    pub fn steps(&self) -> usize {
        self.steps
    }
}

impl Maximizer for FibonacciSearch {
    fn maximize<F, E>(&self, objective: F, lower: f64, upper: f64) -> Result<Maximum, E>
    where
        F: FnMut(f64) -> Result<f64, E>,
    {
        let mut f = Counted::new(objective);
        if is_degenerate(lower, upper) {
            return degenerate(&mut f, lower);
        }

        let n = self.steps;
        let mut fib = vec![1.0_f64; n + 1];
        for i in 2..=n {
            fib[i] = fib[i - 1] + fib[i - 2];
        }

        let (mut a, mut b) = (lower, upper);
        let mut x1 = a + fib[n - 2] / fib[n] * (b - a);
        let mut x2 = a + fib[n - 1] / fib[n] * (b - a);
        let mut f1 = f.eval(x1)?;
        let mut f2 = f.eval(x2)?;

        for k in (3..=n).rev() {
            if f1 > f2 {
                b = x2; x2 = x1; f2 = f1;
                x1 = a + fib[k - 3] / fib[k - 1] * (b - a);
                f1 = f.eval(x1)?;
            } else {
                a = x1; x1 = x2; f1 = f2;
                x2 = a + fib[k - 2] / fib[k - 1] * (b - a);
                f2 = f.eval(x2)?;
            }
        }

        let (argmax, value) = if f1 > f2 { (x1, f1) } else { (x2, f2) };
        Ok(Maximum { argmax, value, evaluations: f.evaluations })
    }
}

// ----------------------------------- Random -----------------------------------

/// `samples` uniform draws over the bracket.
#[derive(Copy, Clone, Debug)]
pub struct RandomSearch {
    pub samples: usize,
    pub seed: u64,
}

impl Maximizer for RandomSearch {
    fn maximize<F, E>(&self, objective: F, lower: f64, upper: f64) -> Result<Maximum, E>
    where
        F: FnMut(f64) -> Result<f64, E>,
    {
        let mut f = Counted::new(objective);
        if is_degenerate(lower, upper) {
            return degenerate(&mut f, lower);
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut argmax = rng.gen_range(lower..=upper);
        let mut value = f.eval(argmax)?;
        for _ in 1..self.samples {
            let x = rng.gen_range(lower..=upper);
            let v = f.eval(x)?;
            if v > value {
                argmax = x;
                value = v;
            }
        }
        Ok(Maximum { argmax, value, evaluations: f.evaluations })
    }
}

// ------------------------------- Adaptive random -------------------------------

pub const DEFAULT_SHRINK_FACTOR: f64 = 0.8;

/// Samples around the best point so far. The radius starts at a quarter of the
/// bracket and is multiplied by `shrink_factor` after every improvement; a
/// factor outside `[0, 1]` falls back to [`DEFAULT_SHRINK_FACTOR`].
#[derive(Copy, Clone, Debug)]
pub struct AdaptiveRandomSearch {
    pub samples: usize,
    pub shrink_factor: f64,
    pub seed: u64,
}

impl Maximizer for AdaptiveRandomSearch {
    fn maximize<F, E>(&self, objective: F, lower: f64, upper: f64) -> Result<Maximum, E>
    where
        F: FnMut(f64) -> Result<f64, E>,
    {
        let mut f = Counted::new(objective);
        if is_degenerate(lower, upper) {
            return degenerate(&mut f, lower);
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut argmax = rng.gen_range(lower..=upper);
        let mut value = f.eval(argmax)?;
        let mut radius = 0.25 * (upper - lower);
        let shrink = if (0.0..=1.0).contains(&self.shrink_factor) { self.shrink_factor } else { DEFAULT_SHRINK_FACTOR };

        for _ in 1..self.samples {
            let x = (argmax + rng.gen_range(-radius..=radius)).clamp(lower, upper);
            let v = f.eval(x)?;
            if v > value {
                argmax = x;
                value = v;
                radius *= shrink;
            }
        }
        Ok(Maximum { argmax, value, evaluations: f.evaluations })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    fn parabola(x: f64) -> Result<f64, Infallible> {
        Ok(-(x - 3.0) * (x - 3.0) + 5.0)
    }

    fn check<M: Maximizer>(m: &M, tol: f64) {
        let max = m.maximize(parabola, 0.0, 10.0).unwrap();
        assert!((max.argmax - 3.0).abs() < tol, "argmax {}", max.argmax);
        assert!((max.value - 5.0).abs() < tol);
        assert!(max.evaluations > 2);
    }

    #[test]
    fn finds_peak_of_parabola() {
        check(&TernarySearch { epsilon: 1e-9 }, 1e-6);
        check(&GoldenSectionSearch { epsilon: 1e-9 }, 1e-6);
        check(&FibonacciSearch::new(45), 1e-6);
    }

    #[test]
    fn random_searches_find_peak_of_parabola() {
        let max = RandomSearch { samples: 1000, seed: 7 }.maximize(parabola, 0.0, 10.0).unwrap();
        assert!((max.argmax - 3.0).abs() < 0.05, "argmax {}", max.argmax);
        assert!((max.value - 5.0).abs() < 0.01);
        assert_eq!(max.evaluations, 1000);

        let adaptive = AdaptiveRandomSearch { samples: 1000, shrink_factor: 0.95, seed: 7 };
        let max = adaptive.maximize(parabola, 0.0, 10.0).unwrap();
        assert!((max.argmax - 3.0).abs() < 0.05, "argmax {}", max.argmax);
        assert!((max.value - 5.0).abs() < 0.01);
        assert_eq!(max.evaluations, 1000);
    }

    #[test]
    fn random_searches_are_reproducible_per_seed() {
        let search = RandomSearch { samples: 50, seed: 42 };
        assert_eq!(search.maximize(parabola, 0.0, 10.0).unwrap(), search.maximize(parabola, 0.0, 10.0).unwrap());
        let adaptive = AdaptiveRandomSearch { samples: 50, shrink_factor: 0.8, seed: 42 };
        assert_eq!(adaptive.maximize(parabola, 0.0, 10.0).unwrap(), adaptive.maximize(parabola, 0.0, 10.0).unwrap());
    }

    #[test]
    fn random_search_escapes_a_side_peak() {
        // tall narrow peak at 8, broad low hump at 2
        let two_peaks = |x: f64| -> Result<f64, Infallible> {
            Ok((-(x - 2.0) * (x - 2.0)).exp() + 3.0 * (-4.0 * (x - 8.0) * (x - 8.0)).exp())
        };
        let max = RandomSearch { samples: 500, seed: 3 }.maximize(two_peaks, 0.0, 10.0).unwrap();
        assert!((max.argmax - 8.0).abs() < 0.2, "argmax {}", max.argmax);
        assert!(max.argmax >= 0.0 && max.argmax <= 10.0);
    }

    #[test]
    fn peak_on_the_boundary() {
        let rising = |x: f64| -> Result<f64, Infallible> { Ok(x) };
        let max = GoldenSectionSearch { epsilon: 1e-9 }.maximize(rising, 0.0, 1.0).unwrap();
        assert!((max.argmax - 1.0).abs() < 1e-6);
    }

    #[test]
    fn fibonacci_uses_fixed_budget() {
        let max = FibonacciSearch::new(20).maximize(parabola, 0.0, 10.0).unwrap();
        assert_eq!(max.evaluations, 20);
        assert_eq!(FibonacciSearch::new(1).steps(), 3);
    }

    #[test]
    fn degenerate_bounds_evaluate_once() {
        let max = TernarySearch { epsilon: 1e-9 }.maximize(parabola, 4.0, 4.0).unwrap();
        assert_eq!(max, Maximum { argmax: 4.0, value: 4.0, evaluations: 1 });
        let max = GoldenSectionSearch { epsilon: 1e-9 }.maximize(parabola, 5.0, 1.0).unwrap();
        assert_eq!(max.argmax, 5.0);
        assert_eq!(max.evaluations, 1);
        let max = RandomSearch { samples: 10, seed: 0 }.maximize(parabola, 2.0, 2.0).unwrap();
        assert_eq!(max, Maximum { argmax: 2.0, value: 4.0, evaluations: 1 });
    }

    #[test]
    fn objective_errors_propagate() {
        let failing = |x: f64| if x > 5.0 { Err("too far") } else { Ok(x) };
        let err = TernarySearch { epsilon: 1e-6 }.maximize(failing, 0.0, 10.0).unwrap_err();
        assert_eq!(err, "too far");
    }
}
