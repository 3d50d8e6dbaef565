pub mod nonce;
pub mod visitor;
