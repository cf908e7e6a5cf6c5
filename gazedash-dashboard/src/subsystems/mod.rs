pub mod controller;
pub mod event_view;
pub mod timeline;
