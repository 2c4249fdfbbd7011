pub mod dedupe;
pub mod feed;
pub mod news;
pub mod normalize;
pub mod purge;
pub mod today;
