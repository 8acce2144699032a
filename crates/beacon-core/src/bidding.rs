//! Bidding controller — turns spare influence into votes.
//!
//! Every round the home unit may bid in a sealed auction for one vote.
//! The controller tracks win/loss streaks from the vote tally and moves
//! between a handful of strategies. The transition itself is a pure
//! function of the round's [`BidSignals`].

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::Round;

/// Tuning for the bidding controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BiddingConfig {
    /// Length of a match in rounds (default: 1500).
    pub total_rounds: Round,
    /// Votes that guarantee the win (default: 751).
    pub votes_to_win: u32,
    /// Loss streak that triggers a break (default: 5).
    pub break_after_losses: u32,
    /// Breaks are only taken while the needed win share is below this (default: 0.6).
    pub break_max_proportion: f64,
    /// Rounds without bidding once on a break (default: 25).
    pub break_turns: u32,
    /// Endgame sizing starts after this round (default: 1350).
    pub endgame_round: Round,
    /// Scale up when influence exceeds this many reserves (default: 6).
    pub scale_up_reserve_multiple: i64,
    /// Scale up when the needed win share exceeds this (default: 0.8).
    pub scale_up_proportion: f64,
    /// Win streak after which bids are halved (default: 4).
    pub halve_after_wins: u32,
    /// Halving only while the needed win share is below this (default: 0.55).
    pub halve_max_proportion: f64,
    pub min_bid: i64,
    /// Cap divisor switches from early to late at this round (default: 300).
    pub early_round: Round,
    pub early_cap_divisor: i64,
    pub late_cap_divisor: i64,
    /// From this round on the cap is all influence (default: 1450).
    pub uncapped_round: Round,
    /// Projected future income is `base - decay * round^1.5` (defaults: 7745, 2/15).
    pub income_projection_base: f64,
    pub income_projection_decay: f64,
    /// Added to the needed win share when deciding whether to bid in the endgame.
    pub endgame_bid_bias: f64,
}

impl Default for BiddingConfig {
    fn default() -> Self {
        Self {
            total_rounds: 1500,
            votes_to_win: 751,
            break_after_losses: 5,
            break_max_proportion: 0.6,
            break_turns: 25,
            endgame_round: 1350,
            scale_up_reserve_multiple: 6,
            scale_up_proportion: 0.8,
            halve_after_wins: 4,
            halve_max_proportion: 0.55,
            min_bid: 2,
            early_round: 300,
            early_cap_divisor: 15,
            late_cap_divisor: 7,
            uncapped_round: 1450,
            income_projection_base: 7745.0,
            income_projection_decay: 2.0 / 15.0,
            endgame_bid_bias: 0.1,
        }
    }
}

/// Bidding strategy for the current round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BidState {
    /// Hover around the previous bid.
    KeepUp,
    /// Grow bids multiplicatively after losses.
    ScaleUp,
    /// Spend projected income across the remaining needed wins.
    Endgame,
    /// Winning is impossible or already certain.
    GiveUp,
    /// Sit out a losing streak.
    OnABreak { turns_left: u32 },
}

/// Host-reported facts at the start of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BidObservation {
    pub round: Round,
    pub influence: i32,
    pub team_votes: u32,
    /// Current production reserve floor.
    pub reserve: i32,
}

/// Inputs to a state transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BidSignals {
    pub round: Round,
    pub influence: i64,
    pub reserve: i64,
    pub lost_in_a_row: u32,
    pub won_in_a_row: u32,
    pub lost_last: bool,
    pub wins_needed: i64,
    /// Share of remaining rounds we still have to win.
    pub proportion_needed: f64,
}

/// Next state from the current one.
pub fn transition(state: BidState, signals: &BidSignals, config: &BiddingConfig) -> BidState {
    if let BidState::OnABreak { turns_left } = state {
        let turns_left = turns_left.saturating_sub(1);
        if turns_left > 0 {
            return BidState::OnABreak { turns_left };
        }
    }

    let p = signals.proportion_needed;
    if signals.lost_in_a_row >= config.break_after_losses && p < config.break_max_proportion {
        BidState::OnABreak {
            turns_left: config.break_turns,
        }
    } else if p > 1.0 || p <= 0.0 {
        BidState::GiveUp
    } else if signals.round > config.endgame_round {
        BidState::Endgame
    } else if signals.influence > config.scale_up_reserve_multiple * signals.reserve
        || p > config.scale_up_proportion
    {
        BidState::ScaleUp
    } else {
        BidState::KeepUp
    }
}

/// Largest bid allowed this round.
///
/// Before `uncapped_round` the bid keeps twice the reserve in hand and is
/// at most a fixed fraction of influence; that fraction grows once the
/// early game is over.
pub fn max_bid(round: Round, influence: i64, reserve: i64, config: &BiddingConfig) -> i64 {
    if round >= config.uncapped_round {
        return influence.max(0);
    }
    let divisor = if round < config.early_round {
        config.early_cap_divisor
    } else {
        config.late_cap_divisor
    };
    (influence - 2 * reserve).min(influence / divisor.max(1)).max(0)
}

/// Per-home-unit auction state.
pub struct BidController {
    config: BiddingConfig,
    state: BidState,
    prev_votes: u32,
    prev_bid: i64,
    lost_in_a_row: u32,
    won_in_a_row: u32,
    lost_last: bool,
    wins_needed: i64,
    proportion_needed: f64,
    rng: SmallRng,
}

impl BidController {
    pub fn new(config: BiddingConfig, seed: u64) -> Self {
        Self {
            prev_bid: config.min_bid,
            wins_needed: config.votes_to_win as i64,
            config,
            state: BidState::KeepUp,
            prev_votes: 0,
            lost_in_a_row: 0,
            won_in_a_row: 0,
            lost_last: false,
            proportion_needed: 0.5,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn state(&self) -> BidState {
        self.state
    }

    pub fn lost_in_a_row(&self) -> u32 {
        self.lost_in_a_row
    }

    pub fn proportion_needed(&self) -> f64 {
        self.proportion_needed
    }

    fn signals(&self, obs: &BidObservation) -> BidSignals {
        BidSignals {
            round: obs.round,
            influence: obs.influence as i64,
            reserve: obs.reserve as i64,
            lost_in_a_row: self.lost_in_a_row,
            won_in_a_row: self.won_in_a_row,
            lost_last: self.lost_last,
            wins_needed: self.wins_needed,
            proportion_needed: self.proportion_needed,
        }
    }

    /// Score last round's bid from the tally and pick this round's state.
    pub fn observe(&mut self, obs: &BidObservation) -> BidState {
        self.lost_last = obs.round != 0 && obs.team_votes == self.prev_votes;
        // A skipped bid is neither a win nor a loss for streak purposes.
        if self.prev_bid != 0 {
            self.lost_in_a_row = if self.lost_last { self.lost_in_a_row + 1 } else { 0 };
        }
        self.won_in_a_row = if self.lost_last { 0 } else { self.won_in_a_row + 1 };

        self.wins_needed = self.config.votes_to_win as i64 - obs.team_votes as i64;
        let remaining = self.config.total_rounds as f64 - obs.round as f64;
        self.proportion_needed = if remaining > 0.0 {
            self.wins_needed as f64 / remaining
        } else if self.wins_needed > 0 {
            f64::INFINITY
        } else {
            0.0
        };

        let next = transition(self.state, &self.signals(obs), &self.config);
        if next == (BidState::OnABreak { turns_left: self.config.break_turns }) {
            self.lost_in_a_row = 0;
        }
        if std::mem::discriminant(&next) != std::mem::discriminant(&self.state) {
            debug!(from = ?self.state, to = ?next, round = obs.round, "bid state change");
        }
        self.state = next;
        next
    }

    /// Bid for the current state, capped by [`max_bid`] and by influence.
    pub fn suggest_bid(&mut self, obs: &BidObservation) -> u32 {
        let config = &self.config;
        let influence = obs.influence as i64;
        let cap = max_bid(obs.round, influence, obs.reserve as i64, config);
        let p = self.proportion_needed;
        let halve = !self.lost_last
            && self.won_in_a_row >= config.halve_after_wins
            && p < config.halve_max_proportion;

        let bid = match self.state {
            BidState::OnABreak { .. } | BidState::GiveUp => 0,
            BidState::KeepUp => {
                let mut bid = self.prev_bid.max(config.min_bid);
                if self.lost_last {
                    bid += self.rng.gen_range(1..=2);
                } else if halve {
                    bid /= 2;
                }
                bid.min(cap)
            }
            BidState::ScaleUp => {
                let mut bid = self.prev_bid.max(config.min_bid);
                if self.lost_last {
                    bid = bid * 3 / 2;
                } else if halve {
                    bid /= 2;
                }
                bid.min(cap)
            }
            BidState::Endgame => {
                let projected = influence
                    + (config.income_projection_base
                        - config.income_projection_decay * (obs.round as f64).powf(1.5))
                        as i64;
                if self.rng.gen::<f64>() < p + config.endgame_bid_bias {
                    cap.min(projected / self.wins_needed.max(1))
                } else {
                    0
                }
            }
        };
        bid.min(influence).max(0) as u32
    }

    /// Remember what was bid so the next tally can be scored.
    pub fn commit(&mut self, bid: u32, obs: &BidObservation) {
        self.prev_bid = bid as i64;
        self.prev_votes = obs.team_votes;
    }

    /// One full round: observe, size and commit. Returns the bid (0 = skip).
    pub fn bid(&mut self, obs: &BidObservation) -> u32 {
        self.observe(obs);
        let bid = self.suggest_bid(obs);
        self.commit(bid, obs);
        bid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(round: Round, influence: i32, team_votes: u32) -> BidObservation {
        BidObservation {
            round,
            influence,
            team_votes,
            reserve: 5 + round as i32 / 10,
        }
    }

    fn signals(lost_in_a_row: u32, proportion_needed: f64) -> BidSignals {
        BidSignals {
            round: 200,
            influence: 60,
            reserve: 25,
            lost_in_a_row,
            won_in_a_row: 0,
            lost_last: true,
            wins_needed: 400,
            proportion_needed,
        }
    }

    #[test]
    fn losing_streak_with_modest_need_takes_a_break() {
        let config = BiddingConfig::default();
        let next = transition(BidState::KeepUp, &signals(5, 0.4), &config);
        assert_eq!(next, BidState::OnABreak { turns_left: 25 });
        // Too much still needed: keep fighting.
        let next = transition(BidState::KeepUp, &signals(5, 0.7), &config);
        assert_ne!(next, BidState::OnABreak { turns_left: 25 });
    }

    #[test]
    fn break_suppresses_bids_for_the_cooldown() {
        let mut bidder = BidController::new(BiddingConfig::default(), 3);
        let votes = 400;
        let mut round = 100;
        // First round scores as a win, then five straight losses.
        for _ in 0..5 {
            assert!(bidder.bid(&obs(round, 60, votes)) > 0);
            round += 1;
        }
        assert_eq!(bidder.bid(&obs(round, 60, votes)), 0);
        assert_eq!(bidder.state(), BidState::OnABreak { turns_left: 25 });
        assert_eq!(bidder.lost_in_a_row(), 0);

        for _ in 1..25 {
            round += 1;
            assert_eq!(bidder.bid(&obs(round, 60, votes)), 0);
            assert!(matches!(bidder.state(), BidState::OnABreak { .. }));
        }

        round += 1;
        assert!(bidder.bid(&obs(round, 60, votes)) > 0);
        assert!(!matches!(bidder.state(), BidState::OnABreak { .. }));
    }

    #[test]
    fn impossible_or_settled_matches_give_up() {
        let mut bidder = BidController::new(BiddingConfig::default(), 1);
        assert_eq!(bidder.observe(&obs(1400, 500, 100)), BidState::GiveUp);
        assert_eq!(bidder.suggest_bid(&obs(1400, 500, 100)), 0);

        let mut winner = BidController::new(BiddingConfig::default(), 1);
        assert_eq!(winner.observe(&obs(900, 500, 751)), BidState::GiveUp);
    }

    #[test]
    fn late_rounds_enter_endgame_within_the_cap() {
        let mut bidder = BidController::new(BiddingConfig::default(), 9);
        let o = obs(1400, 3000, 700);
        assert_eq!(bidder.observe(&o), BidState::Endgame);
        let cap = max_bid(1400, 3000, o.reserve as i64, &BiddingConfig::default());
        for _ in 0..20 {
            assert!(bidder.suggest_bid(&o) as i64 <= cap);
        }
    }

    #[test]
    fn rich_centers_scale_up() {
        let mut bidder = BidController::new(BiddingConfig::default(), 1);
        assert_eq!(bidder.observe(&obs(100, 1000, 10)), BidState::ScaleUp);
    }

    #[test]
    fn cap_keeps_a_reserve_and_opens_up_late() {
        let config = BiddingConfig::default();
        assert_eq!(max_bid(100, 1500, 15, &config), 100);
        assert_eq!(max_bid(500, 1400, 55, &config), 200);
        assert_eq!(max_bid(100, 20, 15, &config), 0);
        assert_eq!(max_bid(1460, 1400, 150, &config), 1400);
    }

    #[test]
    fn win_streak_halves_the_bid() {
        let mut bidder = BidController::new(BiddingConfig::default(), 5);
        let mut bids = Vec::new();
        for round in 1..=4 {
            // One more vote every round: every bid wins.
            bids.push(bidder.bid(&obs(round, 200, round)));
        }
        assert_eq!(bids, vec![2, 2, 2, 1]);
    }

    #[test]
    fn bids_never_exceed_influence() {
        let mut bidder = BidController::new(BiddingConfig::default(), 2);
        for round in 1460..1470 {
            assert!(bidder.bid(&obs(round, 3, 740)) <= 3);
        }
    }
}
