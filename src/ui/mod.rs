pub mod components;
pub mod pages;
pub mod shell;
pub mod wizard_dialog;
