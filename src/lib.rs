pub mod chat;
pub mod cli;
pub mod controller;
pub mod gateway;
pub mod io;
pub mod model;
pub mod notify;
pub mod ops;
pub mod router;
pub mod tui;
pub mod util;
