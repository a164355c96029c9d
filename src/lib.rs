use wasm_bindgen::prelude::*;

pub mod board;
pub mod client;
pub mod config;
pub mod game_id;
pub mod optimistic;
pub mod reconcile;
pub mod render;
pub mod selection;
pub mod session;
pub mod types;
pub mod view;
#[cfg(target_arch = "wasm32")]
pub mod web;

#[wasm_bindgen]
pub fn wasm_ready() -> bool {
    true
}
