pub mod alias_seed;
pub mod normalize;
pub mod ranking;
pub mod verdict;
