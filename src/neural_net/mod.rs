pub mod activation_functions;
pub mod errors;
pub mod export;
pub mod mutations;
pub mod nets;
pub mod nodes;
pub mod populations;
pub mod scoring;
