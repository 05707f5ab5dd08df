pub mod symbols;
pub mod evaluator;
pub mod cooldown;

pub mod watch_store;
pub mod memory_store;
pub mod mongo_store;
pub mod db_init;

pub mod quote_source;
pub mod yahoo;
pub mod notifier;

pub mod alert_monitor;
