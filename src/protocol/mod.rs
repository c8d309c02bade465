//! External interfaces: the KFEN position codec, the JSON game record, and
//! the control-protocol command parser.

pub mod kfen;
pub mod parser;
pub mod record;

pub use kfen::{decode, encode, KfenError};
pub use parser::{parse_command, Command, GoParams, PositionSpec, ProtocolError};
pub use record::{ActionRecord, GameRecord, RecordError, RecordMetadata};
