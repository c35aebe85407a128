pub mod ensemble;
pub mod verdict;
