pub mod errors;
pub mod gapped;
pub mod aligner;
pub mod debug;
