pub mod distribution;
pub mod summary;
pub mod type_matrix;
pub mod win_rate;

pub use distribution::{distribution, Bin, Distribution};
pub use summary::{general_stats, DashboardData, GeneralStats, WinnerProfile, SPEED_BINS, TOP_N};
pub use type_matrix::{is_composite, single_type_lookup, TypeMatrix};
pub use win_rate::{appearance_counts, win_counts, win_rates, NameCount, WinRateRow};
