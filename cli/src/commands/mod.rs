mod budget;
mod db;
mod helpers;
mod item;
mod list;
mod store;

pub(crate) use budget::{
    cmd_budget_disable, cmd_budget_enable, cmd_budget_reset, cmd_budget_set, cmd_budget_status,
    cmd_budget_sync,
};
pub(crate) use db::{
    cmd_db_clear, cmd_db_load, cmd_db_save, cmd_db_stats, cmd_db_users, cmd_db_vacuum,
};
pub(crate) use item::{cmd_add, cmd_clear_purchased, cmd_purchase, cmd_remove, cmd_unpurchase};
pub(crate) use list::{cmd_list, cmd_search, cmd_stats};
pub(crate) use store::{cmd_export_csv, cmd_import_csv};
