// The engine's call stack: a push/pop stack of call-site records, holding
// the source-level bookkeeping needed to resolve a parameter name back to a
// global qubit or resume control flow on RETURN, rather than a
// functor/loop-iteration record.

use qdbg_ast::{InstrId, Successor};
use std::rc::Rc;

#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub callee: Rc<str>,
    pub call_site: InstrId,
    /// Where control resumes once this call's RETURN is reached.
    pub return_successor: Successor,
    /// Parameter name -> argument name, as recorded on the CALL instruction.
    pub substitutions: Vec<(Rc<str>, Rc<str>)>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct CallStack {
    frames: Vec<Frame>,
}

impl CallStack {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn to_frames(&self) -> Vec<Frame> {
        self.frames.clone()
    }

    pub fn push_frame(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn pop_frame(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    #[must_use]
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Frame> {
        self.frames.iter()
    }
}
