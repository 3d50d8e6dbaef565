pub mod kv;
pub mod posts;
