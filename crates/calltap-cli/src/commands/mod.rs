pub mod asset;
pub mod drill;
pub mod init;
