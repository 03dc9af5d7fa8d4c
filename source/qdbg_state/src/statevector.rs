// A dense state-vector backend: a struct wrapping simulator state plus an
// optional seeded RNG, sized `2^n` since this debugger's state sizes are
// small by construction (assertion targets are enumerated explicitly) and a
// dense representation keeps the amplitude and density-matrix access
// patterns `qdbg_linalg` expects straightforward.

use crate::backend::{QuantumState, StateError};
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::FRAC_1_SQRT_2;

pub struct StatevectorBackend {
    amplitudes: Vec<Complex64>,
    num_qubits: usize,
    rng: StdRng,
}

impl StatevectorBackend {
    #[must_use]
    pub fn new(num_qubits: usize) -> Self {
        let dim = 1usize << num_qubits;
        let mut amplitudes = vec![Complex64::new(0.0, 0.0); dim];
        amplitudes[0] = Complex64::new(1.0, 0.0);
        Self {
            amplitudes,
            num_qubits,
            rng: StdRng::from_entropy(),
        }
    }

    /// Restores a backend directly from a (already-collapsed/evolved)
    /// amplitude vector, e.g. when the engine rewinds to a recorded
    /// snapshot. `amplitudes.len()` must be a power of two.
    #[must_use]
    pub fn from_amplitudes(amplitudes: Vec<Complex64>) -> Self {
        let num_qubits = amplitudes.len().trailing_zeros() as usize;
        Self {
            amplitudes,
            num_qubits,
            rng: StdRng::from_entropy(),
        }
    }

    fn check_qubit(&self, q: usize) -> Result<(), StateError> {
        if q >= self.num_qubits {
            Err(StateError::QubitOutOfRange(q))
        } else {
            Ok(())
        }
    }

    fn apply_single(&mut self, qubit: usize, m: [[Complex64; 2]; 2]) {
        let bit = 1usize << qubit;
        for i in 0..self.amplitudes.len() {
            if i & bit == 0 {
                let j = i | bit;
                let a0 = self.amplitudes[i];
                let a1 = self.amplitudes[j];
                self.amplitudes[i] = m[0][0] * a0 + m[0][1] * a1;
                self.amplitudes[j] = m[1][0] * a0 + m[1][1] * a1;
            }
        }
    }

    fn apply_controlled_single(&mut self, controls: &[usize], target: usize, m: [[Complex64; 2]; 2]) {
        let target_bit = 1usize << target;
        let control_mask: usize = controls.iter().map(|c| 1usize << c).sum();
        for i in 0..self.amplitudes.len() {
            if i & target_bit == 0 && (i & control_mask) == control_mask {
                let j = i | target_bit;
                let a0 = self.amplitudes[i];
                let a1 = self.amplitudes[j];
                self.amplitudes[i] = m[0][0] * a0 + m[0][1] * a1;
                self.amplitudes[j] = m[1][0] * a0 + m[1][1] * a1;
            }
        }
    }

    fn apply_swap(&mut self, q0: usize, q1: usize) {
        let b0 = 1usize << q0;
        let b1 = 1usize << q1;
        for i in 0..self.amplitudes.len() {
            let bit0 = i & b0 != 0;
            let bit1 = i & b1 != 0;
            if bit0 != bit1 {
                let j = i ^ b0 ^ b1;
                if j > i {
                    self.amplitudes.swap(i, j);
                }
            }
        }
    }
}

fn c(re: f64, im: f64) -> Complex64 {
    Complex64::new(re, im)
}

fn single_qubit_matrix(name: &str, params: &[f64]) -> Option<[[Complex64; 2]; 2]> {
    match name {
        "x" => Some([[c(0.0, 0.0), c(1.0, 0.0)], [c(1.0, 0.0), c(0.0, 0.0)]]),
        "y" => Some([[c(0.0, 0.0), c(0.0, -1.0)], [c(0.0, 1.0), c(0.0, 0.0)]]),
        "z" => Some([[c(1.0, 0.0), c(0.0, 0.0)], [c(0.0, 0.0), c(-1.0, 0.0)]]),
        "h" => Some([
            [c(FRAC_1_SQRT_2, 0.0), c(FRAC_1_SQRT_2, 0.0)],
            [c(FRAC_1_SQRT_2, 0.0), c(-FRAC_1_SQRT_2, 0.0)],
        ]),
        "s" => Some([[c(1.0, 0.0), c(0.0, 0.0)], [c(0.0, 0.0), c(0.0, 1.0)]]),
        "sdg" => Some([[c(1.0, 0.0), c(0.0, 0.0)], [c(0.0, 0.0), c(0.0, -1.0)]]),
        "t" => Some([
            [c(1.0, 0.0), c(0.0, 0.0)],
            [c(0.0, 0.0), c(FRAC_1_SQRT_2, FRAC_1_SQRT_2)],
        ]),
        "tdg" => Some([
            [c(1.0, 0.0), c(0.0, 0.0)],
            [c(0.0, 0.0), c(FRAC_1_SQRT_2, -FRAC_1_SQRT_2)],
        ]),
        "rx" => {
            let theta = params.first().copied().unwrap_or(0.0);
            let (s, cs) = ((theta / 2.0).sin(), (theta / 2.0).cos());
            Some([[c(cs, 0.0), c(0.0, -s)], [c(0.0, -s), c(cs, 0.0)]])
        }
        "ry" => {
            let theta = params.first().copied().unwrap_or(0.0);
            let (s, cs) = ((theta / 2.0).sin(), (theta / 2.0).cos());
            Some([[c(cs, 0.0), c(-s, 0.0)], [c(s, 0.0), c(cs, 0.0)]])
        }
        "rz" => {
            let theta = params.first().copied().unwrap_or(0.0);
            Some([
                [Complex64::from_polar(1.0, -theta / 2.0), c(0.0, 0.0)],
                [c(0.0, 0.0), Complex64::from_polar(1.0, theta / 2.0)],
            ])
        }
        "id" => Some([[c(1.0, 0.0), c(0.0, 0.0)], [c(0.0, 0.0), c(1.0, 0.0)]]),
        _ => None,
    }
}

impl QuantumState for StatevectorBackend {
    fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    fn apply_gate(
        &mut self,
        name: &str,
        params: &[f64],
        qubits: &[usize],
    ) -> Result<(), StateError> {
        for &q in qubits {
            self.check_qubit(q)?;
        }
        match name {
            "cx" | "cnot" => {
                require_arity(name, qubits, 2)?;
                self.apply_controlled_single(&[qubits[0]], qubits[1], single_qubit_matrix("x", &[]).unwrap());
            }
            "cy" => {
                require_arity(name, qubits, 2)?;
                self.apply_controlled_single(&[qubits[0]], qubits[1], single_qubit_matrix("y", &[]).unwrap());
            }
            "cz" => {
                require_arity(name, qubits, 2)?;
                self.apply_controlled_single(&[qubits[0]], qubits[1], single_qubit_matrix("z", &[]).unwrap());
            }
            "ccx" | "toffoli" => {
                require_arity(name, qubits, 3)?;
                self.apply_controlled_single(
                    &[qubits[0], qubits[1]],
                    qubits[2],
                    single_qubit_matrix("x", &[]).unwrap(),
                );
            }
            "swap" => {
                require_arity(name, qubits, 2)?;
                self.apply_swap(qubits[0], qubits[1]);
            }
            _ => {
                let m = single_qubit_matrix(name, params)
                    .ok_or_else(|| StateError::UnknownGate(name.to_string()))?;
                require_arity(name, qubits, 1)?;
                self.apply_single(qubits[0], m);
            }
        }
        Ok(())
    }

    fn measure(&mut self, qubit: usize) -> Result<bool, StateError> {
        self.check_qubit(qubit)?;
        let bit = 1usize << qubit;
        let prob_one: f64 = self
            .amplitudes
            .iter()
            .enumerate()
            .filter(|(i, _)| i & bit != 0)
            .map(|(_, a)| a.norm_sqr())
            .sum();
        let outcome = self.rng.gen::<f64>() < prob_one;
        let norm = if outcome {
            prob_one.sqrt()
        } else {
            (1.0 - prob_one).sqrt()
        };
        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            let has_bit = i & bit != 0;
            if has_bit != outcome {
                *amp = Complex64::new(0.0, 0.0);
            } else if norm > 0.0 {
                *amp /= norm;
            }
        }
        Ok(outcome)
    }

    fn reset(&mut self, qubit: usize) -> Result<(), StateError> {
        if self.measure(qubit)? {
            self.apply_single(qubit, single_qubit_matrix("x", &[]).unwrap());
        }
        Ok(())
    }

    fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    fn set_seed(&mut self, seed: Option<u64>) {
        self.rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
    }
}

fn require_arity(name: &str, qubits: &[usize], expected: usize) -> Result<(), StateError> {
    if qubits.len() != expected {
        return Err(StateError::ArityMismatch {
            name: name.to_string(),
            expected,
            actual: qubits.len(),
        });
    }
    Ok(())
}
