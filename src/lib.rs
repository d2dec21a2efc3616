#![forbid(unsafe_code)]
#![cfg_attr(feature = "strict", deny(warnings))]

pub mod board;
pub mod chess;
pub mod clock;
pub mod coord;
pub mod error;
pub mod event;
pub mod fen;
pub mod force;
pub mod frontend;
pub mod grid;
pub mod match_controller;
pub mod network;
pub mod piece;
pub mod role;
pub mod rules;
pub mod session;
pub mod test_util;
pub mod ticker;
