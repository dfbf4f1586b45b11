pub mod catalogue;
pub mod col;
pub mod domain;
pub mod geo;
pub mod graph;
pub mod render;
pub mod requests;
pub mod routing;
pub mod serialization;
pub mod shortest_path;
pub mod test;
pub mod weight;
