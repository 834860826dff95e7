mod clusters;
mod load;
mod parse;

pub use clusters::{NO_POSITIONS_CLUSTER, OTHERS_CLUSTER, assign_derived_clusters};
pub use load::load_dataset;
pub use parse::{RawCluster, RawDataset, RawLink, RawNode, parse_dataset};
