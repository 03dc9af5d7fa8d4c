// Thin helpers over `num_complex::Complex64`, grounded on
// `include/common/ComplexMathematics.hpp` in the original source
// (`complexAddition`, `complexMultiplication`, `complexConjugate`,
// `complexMagnitude`, `complexToString`). `Complex64` already implements
// these as operator overloads and trait methods; these free functions exist
// so call sites read the same way the original's utility module does.

use num_complex::Complex64;

#[must_use]
pub fn add(a: Complex64, b: Complex64) -> Complex64 {
    a + b
}

#[must_use]
pub fn mul(a: Complex64, b: Complex64) -> Complex64 {
    a * b
}

#[must_use]
pub fn conjugate(a: Complex64) -> Complex64 {
    a.conj()
}

#[must_use]
pub fn magnitude(a: Complex64) -> f64 {
    a.norm()
}

#[must_use]
pub fn to_string(a: Complex64) -> String {
    if a.im == 0.0 {
        format!("{}", a.re)
    } else if a.re == 0.0 {
        format!("{}i", a.im)
    } else if a.im < 0.0 {
        format!("{}-{}i", a.re, -a.im)
    } else {
        format!("{}+{}i", a.re, a.im)
    }
}
