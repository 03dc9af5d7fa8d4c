// Maps a raw byte offset in the original source to the instruction that
// should break there. A gate definition's own span covers its whole
// `gate ... { ... }` text, so its body instructions' (smaller) spans are
// already nested inside it; picking the smallest span that contains the
// offset is equivalent to "descend into the body if possible, else land on
// the definition itself".

use qdbg_ast::InstrId;
use qdbg_frontend::Program;

#[must_use]
pub fn resolve_breakpoint(program: &Program, offset: u32) -> Option<InstrId> {
    program
        .instructions
        .iter()
        .filter(|(_, instr)| instr.span.contains(offset))
        .min_by_key(|(_, instr)| instr.span.len())
        .map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lands_on_inner_instruction_of_a_gate_body() {
        let source = "gate my q {\n    x q;\n}\nqreg q[1];\nmy q[0];\n";
        let program = qdbg_frontend::preprocess(source).unwrap();
        let inner_offset = source.find("x q;").unwrap() as u32 + 1;
        let hit = resolve_breakpoint(&program, inner_offset).unwrap();
        let instr = program.instruction(hit);
        assert!(instr.enclosing_function.is_some());
    }

    #[test]
    fn lands_on_definition_when_offset_outside_any_body_statement() {
        let source = "gate my q {\n    x q;\n}\nqreg q[1];\nmy q[0];\n";
        let program = qdbg_frontend::preprocess(source).unwrap();
        let header_offset = source.find("gate my").unwrap() as u32 + 1;
        let hit = resolve_breakpoint(&program, header_offset).unwrap();
        assert!(program.instruction(hit).function_body.is_some());
    }
}
