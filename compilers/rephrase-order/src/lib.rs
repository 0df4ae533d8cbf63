pub mod cache;
pub mod element;
pub mod graph;
pub mod persist;
pub mod policy;
pub mod train;

pub use cache::OrderCache;
pub use element::{element_of, observe, Observation, WH};
pub use graph::{learn_order, Precedence, PrecedenceGraph};
pub use persist::{load, save, Format, OrderError};
pub use policy::{apply_ranking, DataDriven, FixedTemplate, OrderPolicy, Ranking, DEFAULT_GROUP};
pub use train::{train, training_version};
