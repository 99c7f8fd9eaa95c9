pub mod apu;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod instrument;
pub mod macro_int;
pub mod note;
pub mod platform;
pub mod sample;

pub use config::{ChipConfig, Region};
pub use context::{EngineContext, SongData};
pub use dispatch::{create_dispatch, list_chips, ChipDispatch, Command, CommandKind, DispatchStatus};
pub use error::Error;
