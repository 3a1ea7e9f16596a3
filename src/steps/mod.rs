pub mod gitconfig;
pub mod link;
pub mod packages;
pub mod shell;
pub mod templates;
