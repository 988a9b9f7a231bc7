use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use nottingham_game::numbers::{ratio_or, u32_to_f64};
use nottingham_game::{
    BagView, Inspector, InspectorAction, InspectorPolicy, InspectorReply, Negotiation, RoundRecord,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Built-in inspector personalities for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectorPersonality {
    TriggerHappy,
    Corrupt,
    Greedy,
    Strict,
    Smart,
}

impl InspectorPersonality {
    pub const ALL: [Self; 5] = [
        Self::TriggerHappy,
        Self::Corrupt,
        Self::Greedy,
        Self::Strict,
        Self::Smart,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::TriggerHappy => "trigger_happy",
            Self::Corrupt => "corrupt",
            Self::Greedy => "greedy",
            Self::Strict => "strict",
            Self::Smart => "smart",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::TriggerHappy => "Threatens half the bags and inspects anyone who offers a bribe",
            Self::Corrupt => "Threatens everyone and pockets every offer",
            Self::Greedy => "Takes only bribes worth half the declared value",
            Self::Strict => "Opens every bag, no exceptions",
            Self::Smart => "Adapts its inspection rate to its own catch record",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn InspectorPolicy> {
        match self {
            Self::TriggerHappy => Box::new(TriggerHappyPolicy::new(seed)),
            Self::Corrupt => Box::new(CorruptPolicy),
            Self::Greedy => Box::new(GreedyPolicy::new(seed)),
            Self::Strict => Box::new(StrictPolicy),
            Self::Smart => Box::new(SmartPolicy::new(seed)),
        }
    }
}

impl fmt::Display for InspectorPersonality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for InspectorPersonality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|personality| personality.key() == normalized)
            .ok_or_else(|| format!("unknown inspector personality `{s}`"))
    }
}

/// Offer as a share of the declared value.
fn offer_ratio(view: &BagView<'_>, negotiation: &Negotiation) -> f64 {
    let offer = negotiation.standing_offer().unwrap_or(0);
    u32_to_f64(offer) / u32_to_f64(view.declared_value.max(1))
}

struct TriggerHappyPolicy {
    rng: ChaCha20Rng,
}

impl TriggerHappyPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl InspectorPolicy for TriggerHappyPolicy {
    fn name(&self) -> &str {
        "Trigger Happy"
    }

    fn choose_action(&mut self, _view: &BagView<'_>, _inspector: &Inspector) -> InspectorAction {
        if self.rng.gen_bool(0.5) {
            InspectorAction::Threaten
        } else {
            InspectorAction::Pass
        }
    }

    fn respond(&mut self, _view: &BagView<'_>, _negotiation: &Negotiation) -> InspectorReply {
        // Anyone paying must be hiding something.
        InspectorReply::Reject
    }
}

struct CorruptPolicy;

impl InspectorPolicy for CorruptPolicy {
    fn name(&self) -> &str {
        "Corrupt"
    }

    fn choose_action(&mut self, _view: &BagView<'_>, _inspector: &Inspector) -> InspectorAction {
        InspectorAction::Threaten
    }

    fn respond(&mut self, _view: &BagView<'_>, _negotiation: &Negotiation) -> InspectorReply {
        InspectorReply::Accept
    }
}

struct GreedyPolicy {
    rng: ChaCha20Rng,
}

impl GreedyPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl InspectorPolicy for GreedyPolicy {
    fn name(&self) -> &str {
        "Greedy"
    }

    fn choose_action(&mut self, _view: &BagView<'_>, _inspector: &Inspector) -> InspectorAction {
        if self.rng.gen_bool(0.4) {
            InspectorAction::Inspect
        } else {
            InspectorAction::Threaten
        }
    }

    fn respond(&mut self, view: &BagView<'_>, negotiation: &Negotiation) -> InspectorReply {
        let ratio = offer_ratio(view, negotiation);
        if ratio >= 0.5 || (ratio >= 0.4 && self.rng.gen_bool(0.7)) {
            InspectorReply::Accept
        } else {
            InspectorReply::Reject
        }
    }
}

struct StrictPolicy;

impl InspectorPolicy for StrictPolicy {
    fn name(&self) -> &str {
        "Strict"
    }

    fn choose_action(&mut self, _view: &BagView<'_>, _inspector: &Inspector) -> InspectorAction {
        InspectorAction::Inspect
    }

    fn respond(&mut self, _view: &BagView<'_>, _negotiation: &Negotiation) -> InspectorReply {
        InspectorReply::Reject
    }
}

const SMART_MEMORY: usize = 20;

/// Adaptive inspector tracking `(opened, caught)` for its last twenty rounds.
struct SmartPolicy {
    rng: ChaCha20Rng,
    memory: VecDeque<(bool, bool)>,
}

impl SmartPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            memory: VecDeque::with_capacity(SMART_MEMORY),
        }
    }

    fn inspection_rate(&self, declared_value: u32) -> f64 {
        let opened = self.memory.iter().filter(|(opened, _)| *opened).count();
        let caught = self.memory.iter().filter(|(_, caught)| *caught).count();
        let catch_rate = ratio_or(caught, opened, 0.5);
        let mut rate: f64 = if catch_rate > 0.6 {
            0.6
        } else if catch_rate < 0.3 {
            0.3
        } else {
            0.45
        };
        if self.memory.len() >= 5 {
            let smuggling_rate = ratio_or(caught, self.memory.len(), 0.0);
            if smuggling_rate > 0.3 {
                rate += 0.15;
            } else if smuggling_rate > 0.2 {
                rate += 0.10;
            }
        }
        if declared_value > 15 {
            rate += 0.15;
        }
        rate.min(1.0)
    }
}

impl InspectorPolicy for SmartPolicy {
    fn name(&self) -> &str {
        "Smart"
    }

    fn choose_action(&mut self, view: &BagView<'_>, _inspector: &Inspector) -> InspectorAction {
        let rate = self.inspection_rate(view.declared_value);
        if self.rng.gen_bool(rate) {
            InspectorAction::Inspect
        } else if self.rng.gen_bool(0.5) {
            InspectorAction::Threaten
        } else {
            InspectorAction::Pass
        }
    }

    fn respond(&mut self, view: &BagView<'_>, negotiation: &Negotiation) -> InspectorReply {
        let ratio = offer_ratio(view, negotiation);
        if ratio > 0.4 {
            // Too generous to be innocent.
            return InspectorReply::Reject;
        }
        if ratio < 0.2 {
            return if self.rng.gen_bool(0.6) {
                InspectorReply::Accept
            } else {
                InspectorReply::Reject
            };
        }
        match negotiation.standing_offer() {
            Some(offer) if negotiation.demands().is_empty() => {
                InspectorReply::Counter(offer + (offer / 2).max(1))
            }
            _ if self.rng.gen_bool(0.5) => InspectorReply::Accept,
            _ => InspectorReply::Reject,
        }
    }

    fn observe(&mut self, record: &RoundRecord) {
        if self.memory.len() == SMART_MEMORY {
            self.memory.pop_front();
        }
        self.memory.push_back((record.bag_opened, record.lie_caught));
        log::trace!(
            "smart inspector memory: {} rounds, last caught={}",
            self.memory.len(),
            record.lie_caught
        );
    }
}
