pub mod chat_panel;
pub mod header;
pub mod links_overlay;
pub mod radio_panel;
