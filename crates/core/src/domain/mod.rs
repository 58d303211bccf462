pub mod attachment;
pub mod quote;
