// Profile editing, job preferences and reference lists.

pub mod handlers;
