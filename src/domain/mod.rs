mod balance;
mod expense;
mod ledger;
mod money;
mod player;
mod results;
mod settlement;
mod snapshot;

pub use balance::*;
pub use expense::*;
pub use ledger::*;
pub use money::*;
pub use player::*;
pub use results::*;
pub use settlement::*;
pub use snapshot::*;
