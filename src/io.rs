use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use sprs::io::{read_matrix_market, IoError};

use crate::algorithms::Error;
use crate::balance::parts_used;
use crate::forest::Forest;
use crate::graph::Graph;
use crate::remap::to_vertex_index;
use crate::PartId;

/// Read a matrix market file and output Graph struct.
pub fn read_matrix_market_as_graph(file_path: &Path) -> Result<Graph, IoError> {
    // read the matrix market file as a TriMat with edge lengths.
    let tri_matrix = read_matrix_market::<f64, usize, _>(file_path)?;

    // Read was successful, we return it after converting to CSR.
    Ok(Graph {
        graph_csr: tri_matrix.to_csr(),
    })
}

fn invalid_data(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}

/// Parse every whitespace separated token of a text file.
fn read_tokens<T: FromStr>(file_path: &Path) -> io::Result<Vec<T>> {
    let reader = BufReader::new(File::open(file_path)?);
    let mut values = Vec::new();
    for (line_number, line) in reader.lines().enumerate() {
        for token in line?.split_whitespace() {
            let value = token.parse().map_err(|_| {
                invalid_data(format!(
                    "{}:{}: unexpected token {token:?}",
                    file_path.display(),
                    line_number + 1
                ))
            })?;
            values.push(value);
        }
    }
    Ok(values)
}

/// Read a partition file: one part id per forest position, whitespace
/// separated.
pub fn read_partition_file(file_path: &Path) -> io::Result<Vec<PartId>> {
    read_tokens(file_path)
}

/// Read a sequence (or traversal order) file: one vertex id per position.
pub fn read_sequence(file_path: &Path) -> io::Result<Vec<usize>> {
    read_tokens(file_path)
}

/// Load a precomputed partition and re-index it by vertex id through `seq`.
/// Returns the assignment and the number of parts it uses.
pub fn load_partition(file_path: &Path, seq: &[usize]) -> Result<(Vec<Option<PartId>>, usize), Error> {
    let forest_parts: Vec<Option<PartId>> = read_partition_file(file_path)?.into_iter().map(Some).collect();
    let partition = to_vertex_index(&forest_parts, seq)?;
    let num_parts = parts_used(&partition);
    Ok((partition, num_parts))
}

/// Write an assignment in sequence order, one part id per line, so that
/// [`load_partition`] with the same sequence reads it back.
pub fn write_partition_data_to_file(partition: &[Option<PartId>], seq: &[usize], file_path: &Path) -> Result<(), Error> {
    let mut file = BufWriter::new(File::create(file_path)?);
    for &vertex in seq {
        let part = partition.get(vertex).copied().flatten().ok_or(Error::Unassigned { vertex })?;
        writeln!(file, "{part}")?;
    }
    file.flush()?;
    Ok(())
}

/// Read a decomposition forest: one node per line, `parent weight`, where the
/// parent of a root is written as `-`.
pub fn read_forest(file_path: &Path) -> Result<Forest, Error> {
    let reader = BufReader::new(File::open(file_path)?);
    let mut parents = Vec::new();
    let mut weights = Vec::new();
    for (line_number, line) in reader.lines().enumerate() {
        let line = line?;
        let mut fields = line.split_whitespace();
        let (Some(parent), Some(weight), None) = (fields.next(), fields.next(), fields.next()) else {
            if line.trim().is_empty() {
                continue;
            }
            return Err(invalid_data(format!(
                "{}:{}: expected `parent weight`",
                file_path.display(),
                line_number + 1
            ))
            .into());
        };
        let bad_field = |field: &str| {
            invalid_data(format!(
                "{}:{}: unexpected token {field:?}",
                file_path.display(),
                line_number + 1
            ))
        };
        parents.push(match parent {
            "-" => None,
            _ => Some(parent.parse().map_err(|_| bad_field(parent))?),
        });
        weights.push(weight.parse().map_err(|_| bad_field(weight))?);
    }
    Forest::new(parents, weights)
}

/// One record of a binary edge file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeRecord {
    pub tail: u32,
    pub head: u32,
    pub weight: f32,
}

impl EdgeRecord {
    /// Size of a record on disk: two little-endian `u32` ids and an `f32`.
    pub const SIZE: usize = 12;

    fn decode(bytes: &[u8; Self::SIZE]) -> Self {
        EdgeRecord {
            tail: LittleEndian::read_u32(&bytes[0..4]),
            head: LittleEndian::read_u32(&bytes[4..8]),
            weight: LittleEndian::read_f32(&bytes[8..12]),
        }
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(self.tail)?;
        writer.write_u32::<LittleEndian>(self.head)?;
        writer.write_f32::<LittleEndian>(self.weight)
    }
}

/// Iterator over the records of a headerless binary edge file. A trailing
/// partial record is reported as `UnexpectedEof`.
pub struct EdgeRecords<R> {
    reader: R,
}

impl<R: BufRead> EdgeRecords<R> {
    pub fn new(reader: R) -> Self {
        EdgeRecords { reader }
    }
}

impl<R: BufRead> Iterator for EdgeRecords<R> {
    type Item = io::Result<EdgeRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.fill_buf() {
            Ok([]) => return None,
            Ok(_) => {}
            Err(err) => return Some(Err(err)),
        }
        let mut bytes = [0u8; EdgeRecord::SIZE];
        Some(self.reader.read_exact(&mut bytes).map(|()| EdgeRecord::decode(&bytes)))
    }
}

/// Open a binary edge file for streaming.
pub fn open_edge_records(file_path: &Path) -> io::Result<EdgeRecords<BufReader<File>>> {
    Ok(EdgeRecords::new(BufReader::new(File::open(file_path)?)))
}

/// Write records in the binary edge file format.
pub fn write_edge_records(records: &[EdgeRecord], file_path: &Path) -> io::Result<()> {
    let mut file = BufWriter::new(File::create(file_path)?);
    for record in records {
        record.write_to(&mut file)?;
    }
    file.flush()
}
