//! Seeded cup-fixture frames shared by the workspace tests

use polars::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

/// Processed cup fixtures for the given rounds
///
/// `opponent_league_rank_prev` is null for roughly one opponent in ten
/// (non-league sides, division 5) and `team_win` is an integer column.
/// `next_team_points` is `2 * team_win + 0.05 * team_size` plus noise.
pub fn cup_fixtures(stages: &[i64], rows_per_stage: usize, seed: u64) -> DataFrame {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 1.0).unwrap();

    let n = stages.len() * rows_per_stage;
    let mut stage = Vec::with_capacity(n);
    let mut rank: Vec<Option<f64>> = Vec::with_capacity(n);
    let mut division = Vec::with_capacity(n);
    let mut win = Vec::with_capacity(n);
    let mut size = Vec::with_capacity(n);
    let mut points = Vec::with_capacity(n);

    for &round in stages {
        for _ in 0..rows_per_stage {
            let opponent_division: i64 = rng.gen_range(1..=4);
            let opponent_rank = rng.gen_range(1..=24) as f64;
            let non_league = rng.gen_bool(0.1);
            let strength = if non_league {
                30.0
            } else {
                opponent_rank + 24.0 * (opponent_division - 1) as f64
            };
            let latent = (strength - 45.0) / 25.0 + 0.3 * noise.sample(&mut rng);
            let won: i64 = if latent > 0.0 { 1 } else { 0 };
            let team_size = 25.0 + 3.0 * noise.sample(&mut rng);

            stage.push(round);
            rank.push((!non_league).then_some(opponent_rank));
            division.push(if non_league { 5 } else { opponent_division });
            win.push(won);
            size.push(team_size);
            points.push(2.0 * won as f64 + 0.05 * team_size + 0.3 * noise.sample(&mut rng));
        }
    }

    df![
        "stage" => stage,
        "opponent_league_rank_prev" => rank,
        "opponent_division" => division,
        "team_win" => win,
        "team_size" => size,
        "next_team_points" => points,
    ]
    .unwrap()
}
