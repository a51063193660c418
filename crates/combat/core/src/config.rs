use serde::{Deserialize, Serialize};

/// Game-balance constants used by attrition and outcome scoring.
///
/// The defaults are tuned values; change them only together with game design.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BalanceConfig {
    /// Damage multiplier for receivers actively defending against the attack category.
    pub active_defense: f64,
    /// Damage multiplier for receivers not defending against the attack category.
    pub passive_defense: f64,
    /// Damage multiplier for concentrated attack categories.
    pub concentrated_defense: f64,
    /// Share of attacker bandwidth loss the defender may out-lose and still win.
    pub victory_threshold: f64,
    /// Share of defender cycles taken by a winning attacker.
    pub cycle_theft: f64,
    /// Cap on each clan-point component.
    pub clan_point_cap: f64,
    pub hardpoint_offset: f64,
    pub hardpoint_divisor: f64,
    /// Lifetime of a planted infection, in seconds.
    pub infection_ttl_secs: i64,
}

impl BalanceConfig {
    pub const DEFAULT_ACTIVE_DEFENSE: f64 = 0.8;
    pub const DEFAULT_PASSIVE_DEFENSE: f64 = 0.4;
    pub const DEFAULT_CONCENTRATED_DEFENSE: f64 = 1.0;
    pub const DEFAULT_VICTORY_THRESHOLD: f64 = 0.1;
    pub const DEFAULT_CYCLE_THEFT: f64 = 0.1;
    pub const DEFAULT_CLAN_POINT_CAP: f64 = 10.0;
    pub const DEFAULT_HARDPOINT_OFFSET: f64 = 200.0;
    pub const DEFAULT_HARDPOINT_DIVISOR: f64 = 200.0;
    pub const DEFAULT_INFECTION_TTL_SECS: i64 = 6 * 60 * 60;

    pub fn new() -> Self {
        Self {
            active_defense: Self::DEFAULT_ACTIVE_DEFENSE,
            passive_defense: Self::DEFAULT_PASSIVE_DEFENSE,
            concentrated_defense: Self::DEFAULT_CONCENTRATED_DEFENSE,
            victory_threshold: Self::DEFAULT_VICTORY_THRESHOLD,
            cycle_theft: Self::DEFAULT_CYCLE_THEFT,
            clan_point_cap: Self::DEFAULT_CLAN_POINT_CAP,
            hardpoint_offset: Self::DEFAULT_HARDPOINT_OFFSET,
            hardpoint_divisor: Self::DEFAULT_HARDPOINT_DIVISOR,
            infection_ttl_secs: Self::DEFAULT_INFECTION_TTL_SECS,
        }
    }
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self::new()
    }
}
