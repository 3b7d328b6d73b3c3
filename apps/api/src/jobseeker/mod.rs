// Job seeker views of their own activity.

pub mod handlers;
