pub mod buyback;
pub mod common;
pub mod connection_status;
pub mod farm;
pub mod governance;
pub mod harvest_history;
pub mod home;
pub mod layout;
pub mod presale;
