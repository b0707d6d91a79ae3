pub mod api;
pub mod binary;
pub mod error;
pub mod generator;
pub mod lexer;
pub mod node;
pub mod parser;
pub mod utils;
mod blob;
mod serialization;

pub use api::{
    decode, decode_file, encode, encode_file, generate, generate_file, parse, parse_file,
    parse_with_name, to_json, to_yaml,
};
pub use error::{Error, ParseError, TreeError};
pub use generator::Style;
pub use lexer::CommentPolicy;
pub use node::{NodeId, Tree, Value};
