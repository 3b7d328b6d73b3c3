// Jobs: search, detail, applications, saved jobs and preference-based recommendations.

pub mod handlers;
pub mod recommendation;
pub mod search;
