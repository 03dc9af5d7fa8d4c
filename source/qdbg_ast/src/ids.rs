use qdbg_data_structures::index_ty;

index_ty! {
    /// A 0-based index into the program's instruction list.
    pub struct InstrId;
}
