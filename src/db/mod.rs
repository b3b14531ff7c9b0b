pub mod prod_db;
pub mod world_bank;
