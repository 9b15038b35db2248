pub mod cart_sync;
pub mod sync_state;
