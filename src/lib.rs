mod analysis;
mod balance;
mod config;
mod demand;
mod error;
mod flow_tracing;
mod frame;
mod merit;
mod netting;
mod network;
mod series;
mod stack;
mod storage;
mod summary;
mod window;

pub mod debug;


pub use analysis::*;
pub use balance::*;
pub use config::*;
pub use demand::*;
pub use error::{AnalysisError, Result};
pub use flow_tracing::*;
pub use frame::*;
pub use merit::*;
pub use netting::*;
pub use network::*;
pub use series::{Series, TimeIndex};
pub use stack::*;
pub use storage::*;
pub use summary::*;
pub use window::*;
