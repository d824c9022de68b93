//! Game subsystems built on top of the snapshot.

pub mod accrual;
pub mod chores;
pub mod completion;
pub mod leaderboard;
pub mod members;
