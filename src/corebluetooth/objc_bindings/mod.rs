mod mac_extensions_cb;
pub mod peripheral_manager_cb;
mod peripheral_manager_delegate_cb;
