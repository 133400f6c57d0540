pub mod export;
pub mod inventory;
pub mod join;
pub mod score;
pub mod status;
