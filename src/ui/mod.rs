/// UI module exports
pub mod components;
pub mod form;
pub mod panel;
