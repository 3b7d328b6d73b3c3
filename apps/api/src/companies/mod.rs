// Companies: listings, company pages, follows and ratings.

pub mod handlers;
pub mod ratings;
