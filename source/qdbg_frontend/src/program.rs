// The preprocessor's output: a flat, index-addressed
// instruction list plus the register/variable tables needed to resolve
// textual targets at run time.

use qdbg_ast::{ClassicalRegisterDefinition, Instruction, InstrId, QubitRegisterDefinition, Variable};
use qdbg_data_structures::index_map::IndexMap;
use rustc_hash::FxHashMap;
use std::rc::Rc;

pub struct Program {
    pub source: Rc<str>,
    pub instructions: IndexMap<InstrId, Instruction>,
    pub qubit_registers: Vec<QubitRegisterDefinition>,
    pub classical_registers: Vec<ClassicalRegisterDefinition>,
    pub variables: Vec<Variable>,
    pub num_qubits: usize,
    pub num_classical_bits: usize,
    pub entry: InstrId,
    /// Gate name -> its header (NOP) instruction.
    pub function_entries: FxHashMap<Rc<str>, InstrId>,
    /// Gate name -> every CALL instruction that invokes it.
    pub function_callers: FxHashMap<Rc<str>, Vec<InstrId>>,
}

impl Program {
    #[must_use]
    pub fn instruction(&self, id: InstrId) -> &Instruction {
        self.instructions
            .get(id)
            .expect("instruction ids are only ever handed out for instructions that exist")
    }

    #[must_use]
    pub fn qubit_register(&self, name: &str) -> Option<&QubitRegisterDefinition> {
        self.qubit_registers.iter().find(|r| &*r.name == name)
    }

    #[must_use]
    pub fn classical_register(&self, name: &str) -> Option<&ClassicalRegisterDefinition> {
        self.classical_registers.iter().find(|r| &*r.name == name)
    }
}
