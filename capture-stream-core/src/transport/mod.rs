pub mod descriptor;
pub mod message_queue;
pub mod signal_group;
