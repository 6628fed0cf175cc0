pub mod fog;
pub mod sync;
pub mod table;
pub mod topology;
