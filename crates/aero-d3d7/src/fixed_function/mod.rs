pub mod combiner;
pub mod fvf;
pub mod tss;
