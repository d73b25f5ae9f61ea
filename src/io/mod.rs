/// CSV export of trajectories and run summaries.
pub mod export;
