use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use tracing::info;

use crate::algorithms::Error;
use crate::balance::parts_used;
use crate::graph::GraphAccess;
use crate::remap::positions;
use crate::PartId;

/// Part files are suffixed with a two digit index.
pub const MAX_OUTPUT_PARTS: usize = 100;

/// Name of the file holding the edges of `part`.
pub fn part_file_name(prefix: &str, part: usize) -> PathBuf {
    PathBuf::from(format!("{prefix}{part:02}"))
}

/// Split the edges of `graph` into one text file per part.
///
/// Each undirected edge `X Y` (`X < Y`) is written once, to the file of the
/// part of whichever endpoint comes first in `order`. Files are named
/// `<prefix>00`, `<prefix>01`, ... and are truncated if they exist. A failure
/// midway leaves the files written so far in place.
pub fn write_partitioned_graph<G: GraphAccess>(
    graph: &G,
    partition: &[Option<PartId>],
    order: &[usize],
    prefix: &str,
) -> Result<(), Error> {
    let num_parts = parts_used(partition);
    if num_parts > MAX_OUTPUT_PARTS {
        return Err(Error::TooManyParts {
            requested: num_parts,
            max: MAX_OUTPUT_PARTS,
        });
    }

    let position = positions(order);
    let part_of = |vertex: usize| partition.get(vertex).copied().flatten().ok_or(Error::Unassigned { vertex });
    let position_of = |vertex: usize| position.get(vertex).copied().flatten().ok_or(Error::MissingFromOrder { vertex });

    let mut outputs = (0..num_parts)
        .map(|part| File::create(part_file_name(prefix, part)).map(BufWriter::new))
        .collect::<Result<Vec<_>, _>>()?;
    let mut written = vec![0usize; num_parts];

    for x in graph.nodes() {
        let x_part = part_of(x)?;
        let x_pos = position_of(x)?;
        for y in graph.neighbors(x).filter(|&y| x < y) {
            let y_part = part_of(y)?;
            let y_pos = position_of(y)?;
            let owner = usize::from(if x_pos < y_pos { x_part } else { y_part });
            writeln!(outputs[owner], "{x} {y}")?;
            written[owner] += 1;
        }
    }

    for output in &mut outputs {
        output.flush()?;
    }
    info!(parts = num_parts, edges = written.iter().sum::<usize>(), prefix, "wrote partitioned graph");
    Ok(())
}
