// Employer dashboard for company employees.

pub mod handlers;
