use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, Parser, Subcommand, ValueEnum};
use forestcut::algorithms::{
    partition_forest, BackwardPartitioner, EdgeStreamPartitioner, Error, FennelPartitioner, ForwardPartitioner,
    Metadata, NodeOrder, OrderedPartitioner, RandomPartitioner,
};
use forestcut::balance::{imbalance, parts_used, BalanceMode, PartitionConfig, PartitionSummary};
use forestcut::evaluate::{evaluate, VertexHash};
use forestcut::graph::{Graph, GraphAccess};
use forestcut::io::{
    load_partition, read_forest, read_matrix_market_as_graph, read_sequence, write_partition_data_to_file,
};
use forestcut::output::write_partitioned_graph;
use forestcut::remap::{to_forest_index, to_vertex_index};
use forestcut::{Partition, PartId};
use rand::rngs::SmallRng;
use rand::SeedableRng;

/// Forest-guided and streaming graph partitioning
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Partition a decomposition forest and map the result onto vertices
    Forest(ForestArgs),
    /// Stream the vertices of a graph through FENNEL
    Fennel(FennelArgs),
    /// Stream a binary edge file through FENNEL, one part per edge
    FennelFile(FennelFileArgs),
    /// Score a partition file
    Evaluate(EvaluateArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Algorithm {
    Forward,
    Backward,
    Depth,
    Height,
    Naive,
    Random,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Mode {
    Edge,
    Vertex,
}

impl From<Mode> for BalanceMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Edge => BalanceMode::Edge,
            Mode::Vertex => BalanceMode::Vertex,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Hash {
    Knuth,
    Cormen,
}

#[derive(Args, Debug)]
struct Balance {
    /// Number of Partitions
    num_of_partitions: usize,

    /// Balance the parts by edges or by vertices
    #[arg(short, long, value_enum, default_value_t = Mode::Edge)]
    mode: Mode,

    /// Imbalance Ratio
    #[arg(short, long, default_value_t = 1.03)]
    balance_factor: f64,
}

impl Balance {
    fn config(&self) -> Result<PartitionConfig, Error> {
        PartitionConfig::new(self.num_of_partitions, self.mode.into(), self.balance_factor)
    }
}

#[derive(Args, Debug)]
struct Report {
    /// Path of a .mtx file to evaluate the result on
    #[arg(short, long)]
    graph: Option<PathBuf>,

    /// Filename where the partition mapping can be stored
    #[arg(short, long)]
    partition_file: Option<PathBuf>,

    /// Write the edges of every part to <prefix>NN (requires --graph)
    #[arg(short, long, requires = "graph")]
    output_prefix: Option<String>,

    /// Seed of the random edge owner draw
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args, Debug)]
struct ForestArgs {
    /// Forest file, one `parent weight` line per node (`-` for roots)
    forest: PathBuf,

    /// Sequence file mapping forest positions to vertex ids
    sequence: PathBuf,

    #[command(flatten)]
    balance: Balance,

    /// Partitioning algorithm
    #[arg(short, long, value_enum, default_value_t = Algorithm::Forward)]
    algorithm: Algorithm,

    #[command(flatten)]
    report: Report,
}

#[derive(Args, Debug)]
struct FennelArgs {
    /// Path of the .mtx file
    mtx_filepath: PathBuf,

    /// Order file, one vertex id per position
    order: PathBuf,

    #[command(flatten)]
    balance: Balance,

    /// Exponent of the balance penalty
    #[arg(long, default_value_t = 1.5)]
    gamma: f64,

    /// Filename where the partition mapping can be stored
    #[arg(short, long)]
    partition_file: Option<PathBuf>,

    /// Write the edges of every part to <prefix>NN
    #[arg(short, long)]
    output_prefix: Option<String>,

    /// Seed of the random edge owner draw
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args, Debug)]
struct FennelFileArgs {
    /// Binary edge file
    edges: PathBuf,

    /// Number of Partitions
    num_of_partitions: usize,

    /// Imbalance Ratio
    #[arg(short, long, default_value_t = 1.03)]
    balance_factor: f64,

    /// Exponent of the balance penalty
    #[arg(long, default_value_t = 1.5)]
    gamma: f64,

    /// Filename where the per-edge parts can be stored
    #[arg(short, long)]
    partition_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct EvaluateArgs {
    /// Path of the .mtx file
    mtx_filepath: PathBuf,

    /// Partition file, one part id per sequence position
    partition: PathBuf,

    /// Sequence file mapping positions to vertex ids
    sequence: PathBuf,

    /// Compute the order based volumes along this order file
    #[arg(long)]
    order: Option<PathBuf>,

    /// Hash deciding edge ownership
    #[arg(long, value_enum, default_value_t = Hash::Knuth)]
    hash: Hash,

    /// Seed of the random edge owner draw
    #[arg(long)]
    seed: Option<u64>,

    /// Write the edges of every part to <prefix>NN, split along the sequence
    #[arg(short, long)]
    output_prefix: Option<String>,
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn rng(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    }
}

fn print_metrics(graph: &Graph, partition: &[Option<PartId>], order: Option<&[usize]>, hash: VertexHash, seed: Option<u64>) -> CliResult {
    let metrics = evaluate(graph, partition, order, hash, &mut rng(seed))?;
    print!("{metrics}");
    Ok(())
}

// Parts opened beyond the requested count still take part in the imbalance.
fn print_imbalance(partition: &[Option<PartId>], num_parts: usize, weights: &[u64]) {
    let imbalance_of_partition = imbalance(parts_used(partition).max(num_parts), partition, weights);
    println!("Imbalance {:?}", imbalance_of_partition);
}

fn run_forest(args: ForestArgs) -> CliResult {
    let forest = read_forest(&args.forest)?;
    let seq = read_sequence(&args.sequence)?;
    let config = args.balance.config()?;

    let start = Instant::now();
    let (partition, metadata) = match args.algorithm {
        Algorithm::Forward => partition_forest(&mut ForwardPartitioner { config }, &forest, &seq)?,
        Algorithm::Backward => partition_forest(&mut BackwardPartitioner { config }, &forest, &seq)?,
        Algorithm::Depth => partition_forest(&mut OrderedPartitioner { config, order: NodeOrder::Depth }, &forest, &seq)?,
        Algorithm::Height => partition_forest(&mut OrderedPartitioner { config, order: NodeOrder::Height }, &forest, &seq)?,
        Algorithm::Naive => partition_forest(&mut OrderedPartitioner { config, order: NodeOrder::Naive }, &forest, &seq)?,
        Algorithm::Random => {
            let mut forest_parts = vec![None; forest.len()];
            let metadata = RandomPartitioner { num_parts: config.num_parts, seed: args.report.seed }
                .partition(&mut forest_parts, ())?;
            (to_vertex_index(&forest_parts, &seq)?, metadata)
        }
    };
    let elapsed_time = start.elapsed();

    report(&partition, metadata, &seq, &args.report)?;
    print_imbalance(&to_forest_index(&partition, &seq), config.num_parts, &forest.weights(config.mode));
    println!("Execution time {:?}", elapsed_time);
    Ok(())
}

fn report(partition: &[Option<PartId>], metadata: Metadata, order: &[usize], args: &Report) -> CliResult {
    println!("{}", PartitionSummary::new(partition));
    println!("Capacity {}", metadata.max_component);
    if let Some(path) = &args.partition_file {
        write_partition_data_to_file(partition, order, path)?;
    }
    if let Some(path) = &args.graph {
        let graph = read_matrix_market_as_graph(path)?;
        print_metrics(&graph, partition, Some(order), VertexHash::Knuth, args.seed)?;
        if let Some(prefix) = &args.output_prefix {
            write_partitioned_graph(&graph, partition, order, prefix)?;
        }
    }
    Ok(())
}

fn run_fennel(args: FennelArgs) -> CliResult {
    let graph = read_matrix_market_as_graph(&args.mtx_filepath)?;
    let order = read_sequence(&args.order)?;
    let config = args.balance.config()?;

    let start = Instant::now();
    let mut partition = vec![None; graph.vertex_bound()];
    FennelPartitioner { config, gamma: args.gamma }.partition(&mut partition, (&graph, &order[..]))?;
    let elapsed_time = start.elapsed();

    println!("{}", PartitionSummary::new(&partition));
    let weights: Vec<u64> = (0..graph.vertex_bound())
        .map(|vertex| match config.mode {
            BalanceMode::Edge => graph.degree(vertex) as u64,
            BalanceMode::Vertex => u64::from(graph.contains(vertex)),
        })
        .collect();
    print_imbalance(&partition, config.num_parts, &weights);
    if let Some(path) = &args.partition_file {
        write_partition_data_to_file(&partition, &order, path)?;
    }
    print_metrics(&graph, &partition, Some(&order), VertexHash::Knuth, args.seed)?;
    if let Some(prefix) = &args.output_prefix {
        write_partitioned_graph(&graph, &partition, &order, prefix)?;
    }
    println!("Execution time {:?}", elapsed_time);
    Ok(())
}

fn run_fennel_file(args: FennelFileArgs) -> CliResult {
    let start = Instant::now();
    let (edge_parts, metadata) = EdgeStreamPartitioner {
        num_parts: args.num_of_partitions,
        balance_factor: args.balance_factor,
        gamma: args.gamma,
    }
    .partition_file(&args.edges)?;
    let elapsed_time = start.elapsed();

    let edge_parts: Vec<Option<PartId>> = edge_parts.into_iter().map(Some).collect();
    println!("{}", PartitionSummary::new(&edge_parts));
    println!("Capacity {}", metadata.max_component);
    if let Some(path) = &args.partition_file {
        let edges: Vec<usize> = (0..edge_parts.len()).collect();
        write_partition_data_to_file(&edge_parts, &edges, path)?;
    }
    println!("Execution time {:?}", elapsed_time);
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> CliResult {
    let graph = read_matrix_market_as_graph(&args.mtx_filepath)?;
    let seq = read_sequence(&args.sequence)?;
    let (partition, num_parts) = load_partition(&args.partition, &seq)?;
    let order = args.order.as_deref().map(read_sequence).transpose()?;
    let hash = match args.hash {
        Hash::Knuth => VertexHash::Knuth,
        Hash::Cormen => VertexHash::Cormen,
    };

    println!("Loaded {num_parts} partitions.");
    print_metrics(&graph, &partition, order.as_deref(), hash, args.seed)?;
    if let Some(prefix) = &args.output_prefix {
        write_partitioned_graph(&graph, &partition, &seq, prefix)?;
    }
    Ok(())
}

fn main() -> CliResult {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Forest(args) => run_forest(args),
        Command::Fennel(args) => run_fennel(args),
        Command::FennelFile(args) => run_fennel_file(args),
        Command::Evaluate(args) => run_evaluate(args),
    }
}
