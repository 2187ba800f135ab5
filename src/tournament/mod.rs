pub mod awards;
pub mod results;
pub mod standings;

pub use awards::{Award, Placement, podium};
pub use results::confirmed_results;
pub use standings::{TournamentStanding, compute_standings};
