pub mod codec;
pub mod genome;
pub mod operators;
pub mod population;
pub mod rule;

pub use codec::{decode, encode, Clause, RECORD_WIDTH};
pub use genome::{mutate, new_gene, Gene};
pub use operators::{select_deterministic, select_weighted, Scored, SelectionMode};
pub use population::{Individual, Population};
pub use rule::*;
