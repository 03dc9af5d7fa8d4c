#[derive(Clone, Debug, PartialEq)]
pub enum CheckOutcome {
    Passed,
    Failed(CheckFailure),
}

impl CheckOutcome {
    #[must_use]
    pub fn is_passed(&self) -> bool {
        matches!(self, CheckOutcome::Passed)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum CheckFailure {
    NotEntangled { targets: Vec<String> },
    NotInSuperposition { target: String },
    FidelityBelowThreshold { threshold: f64, fidelity: f64 },
}
