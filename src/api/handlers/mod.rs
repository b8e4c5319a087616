pub mod codegen;
pub mod health;
pub mod recording;
