pub mod algorithms;
pub mod balance;
pub mod evaluate;
pub mod forest;
pub mod graph;
pub mod io;
pub mod output;
pub mod remap;

/// Identifier of a part. Valid values lie in `0..num_parts` of the run that
/// produced them; an unassigned slot is represented as `None` in an
/// assignment (`&[Option<PartId>]`), never as a magic value.
pub type PartId = u16;

// The `Partition` trait allows for partitioning data.
// Partitioning algorithms implement this trait.
// The generic argument `M` defines the input of the algorithms (e.g. a
// decomposition forest, or a graph together with a traversal order).
// The input assignment must be of the correct size; every slot is overwritten
// by a successful run.
pub trait Partition<M> {
    // Diagnostic data returned for a specific run of the algorithm.
    type Metadata;

    // Error details, should the algorithm fail to run.
    type Error;

    // Partition the given data and output the part ID of each element in
    // `part_ids`.
    //
    // Part IDs are contiguous and start from zero. Elements that do not take
    // part in the run (e.g. ids absent from the graph) are left as `None`.
    fn partition(&mut self, part_ids: &mut [Option<PartId>], data: M)
                 -> Result<Self::Metadata, Self::Error>;
}
