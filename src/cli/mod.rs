pub mod custom;
pub mod optimize;
pub mod scenarios;
pub mod schemes;
pub mod setup;
pub mod solve;
pub mod sync;
pub mod ui;
