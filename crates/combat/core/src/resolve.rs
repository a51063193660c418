//! Pure resolution of one engagement.
//!
//! [`resolve`] takes both loaded accounts by value and returns them mutated
//! together with the two events. Nothing is persisted here; if any pool
//! would end negative the whole resolution fails and the caller still holds
//! the untouched state it loaded.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::account::{AccountState, Side};
use crate::action::{ActionKind, PreparedEngagement};
use crate::battle::{Battle, Ledger, SideTally};
use crate::category::UnitCategory;
use crate::config::BalanceConfig;
use crate::error::CombatRuleError;
use crate::event::{BattleResult, Event, Role, UnitLoss, WarReference};
use crate::outcome::{Award, Outcome, WarStatus};
use crate::units::{OwnedUnit, UnitSnapshot};

/// Everything a resolution produces, ready to commit.
#[derive(Clone, Debug, PartialEq)]
pub struct Resolution {
    pub attacker: AccountState,
    pub defender: AccountState,
    pub attacker_event: Event,
    pub defender_event: Event,
    pub winner: Side,
    pub award: Award,
    pub ledger: Ledger,
}

impl Resolution {
    pub fn events(&self) -> [&Event; 2] {
        [&self.attacker_event, &self.defender_event]
    }

    pub fn accounts(&self) -> [&AccountState; 2] {
        [&self.attacker, &self.defender]
    }
}

/// Resolves a validated engagement between two loaded accounts.
pub fn resolve(
    prepared: &PreparedEngagement,
    mut attacker: AccountState,
    mut defender: AccountState,
    war: WarStatus,
    now: DateTime<Utc>,
    balance: &BalanceConfig,
) -> Result<Resolution, CombatRuleError> {
    let action = prepared.request.action;
    let defender_usage_before = defender.pools.bandwidth_usage;

    let mut battle = Battle::assemble(prepared, &attacker, &defender, now);
    let ledger = *battle.fight(balance);

    for participant in battle.arena.iter().map(|(_, p)| p) {
        let lost = participant.lost();
        if lost == 0 {
            continue;
        }
        match participant.side {
            Side::Attacker => attacker.remove_units(participant.at, lost),
            Side::Defender => defender.remove_units(participant.at, lost),
        }
    }

    // Expired stacks sat out the fight; commit them away with the result.
    for account in [&mut attacker, &mut defender] {
        let dropped = account.drop_expired(now);
        if !dropped.is_empty() {
            debug!("dropped {} expired stacks from {}", dropped.len(), account.identity);
        }
    }

    let mut intel = None;
    let (winner, award) = match action {
        ActionKind::Attack => {
            let outcome = Outcome::score(
                &ledger,
                defender.pools.cycles,
                defender_usage_before,
                war,
                balance,
            );
            let award = outcome.award;
            attacker.pools.attack_points += award.attacker_points;
            defender.pools.attack_points += award.defender_points;
            attacker.pools.cycles += award.cycles_stolen;
            defender.pools.cycles -= award.cycles_stolen;
            attacker.pools.clan_points += award.clan_points;
            (outcome.winner, award)
        }
        ActionKind::Spy => {
            let succeeded = battle.survivors(Side::Attacker) > 0;
            if succeeded {
                intel = Some(surviving_inventory(&defender));
            }
            (winner_if(succeeded), Award::default())
        }
        ActionKind::Infiltrate => {
            let planted = plant_infections(&battle, &mut attacker, &mut defender, now, balance);
            (winner_if(planted > 0), Award::default())
        }
    };

    attacker.pools.memory -= prepared.memory_cost;

    attacker.settle();
    defender.settle();
    attacker.ensure_non_negative()?;
    defender.ensure_non_negative()?;

    let war_reference = match (attacker.clan, defender.clan) {
        (Some(attacker_clan), Some(defender_clan)) if war.is_active() => Some(WarReference {
            attacker_clan,
            defender_clan,
            status: war,
        }),
        _ => None,
    };

    let mut attacker_event = event_for(
        Side::Attacker,
        &attacker,
        &defender,
        action,
        winner,
        ledger.side(Side::Attacker),
        &battle,
        war_reference,
        now,
    );
    attacker_event.cycles_delta = award.cycles_stolen;
    attacker_event.points_gained = award.attacker_points;
    attacker_event.clan_points_gained = award.clan_points;
    attacker_event.memory_spent = prepared.memory_cost;
    attacker_event.intel = intel;

    let mut defender_event = event_for(
        Side::Defender,
        &defender,
        &attacker,
        action,
        winner,
        ledger.side(Side::Defender),
        &battle,
        war_reference,
        now,
    );
    defender_event.cycles_delta = -award.cycles_stolen;
    defender_event.points_gained = award.defender_points;

    info!(
        "{} {} -> {}: {:?} won, bandwidth lost {}/{}",
        action,
        attacker.identity,
        defender.identity,
        winner,
        ledger.attacker.bandwidth_lost,
        ledger.defender.bandwidth_lost
    );

    Ok(Resolution {
        attacker,
        defender,
        attacker_event,
        defender_event,
        winner,
        award,
        ledger,
    })
}

fn winner_if(attacker_succeeded: bool) -> Side {
    if attacker_succeeded {
        Side::Attacker
    } else {
        Side::Defender
    }
}

fn surviving_inventory(defender: &AccountState) -> Vec<UnitSnapshot> {
    defender
        .units()
        .filter(|unit| unit.amount > 0)
        .map(OwnedUnit::snapshot)
        .collect()
}

/// Moves surviving infect units from the attacker onto the defender as
/// time-limited stacks. Returns the number of units planted.
fn plant_infections(
    battle: &Battle,
    attacker: &mut AccountState,
    defender: &mut AccountState,
    now: DateTime<Utc>,
    balance: &BalanceConfig,
) -> i64 {
    let expires_at = now + Duration::seconds(balance.infection_ttl_secs);
    let mut planted = 0;

    for participant in battle.participants(Side::Attacker) {
        let surviving = participant.remaining();
        if surviving <= 0 {
            continue;
        }
        let Some(spec) = attacker.unit(participant.at).map(|unit| unit.spec.clone()) else {
            continue;
        };

        attacker.remove_units(participant.at, surviving);

        let id = defender.next_unit_id();
        let usage = surviving * spec.bandwidth;
        let infection = OwnedUnit::new(id, spec, surviving)
            .inactive()
            .expiring_at(expires_at);

        let group = defender.group_mut(UnitCategory::Infect);
        group.usage += usage;
        group.units.push(infection);
        defender.pools.bandwidth_usage += usage;
        planted += surviving;

        debug!("planted {} infections on {} until {}", surviving, defender.identity, expires_at);
    }

    planted
}

#[allow(clippy::too_many_arguments)]
fn event_for(
    side: Side,
    owner: &AccountState,
    counterpart: &AccountState,
    action: ActionKind,
    winner: Side,
    tally: &SideTally,
    battle: &Battle,
    war: Option<WarReference>,
    now: DateTime<Utc>,
) -> Event {
    let result = if winner == side {
        BattleResult::Won
    } else {
        BattleResult::Lost
    };
    let mut event = Event {
        sequence: 0,
        owner: owner.identity,
        counterpart: counterpart.identity,
        owner_clan: owner.clan,
        action,
        role: Role::from(side),
        result,
        bandwidth_lost: 0,
        bandwidth_killed: 0,
        units_lost: 0,
        units_killed: 0,
        yield_lost: 0,
        cycles_delta: 0,
        points_gained: 0,
        clan_points_gained: 0,
        memory_spent: 0,
        war,
        breakdown: battle.participants(side).map(UnitLoss::from).collect(),
        intel: None,
        created_at: now,
    };
    event.apply_tally(tally);
    event
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{ClanId, IdentityId};
    use crate::action::{CombatRequest, Commitment};
    use crate::category::Categories;
    use crate::error::ResourceExhausted;
    use crate::resources::{ResourceKind, ResourcePools};
    use crate::units::{OwnedUnitGroup, UnitId, UnitSpec};

    fn spec(name: &str, category: UnitCategory, effectors: Categories, attack: i64, life: i64) -> UnitSpec {
        UnitSpec {
            name: name.into(),
            category,
            effectors,
            attack,
            life,
            bandwidth: 0,
            memory: 0,
        }
    }

    fn worms() -> AccountState {
        let worm = UnitSpec {
            bandwidth: 2,
            memory: 1,
            ..spec("worm", UnitCategory::Swarm, Categories::FIREWALL, 10, 10)
        };
        let pools = ResourcePools {
            cycles: 500,
            memory: 100,
            bandwidth: 100,
            bandwidth_usage: 40,
            ..Default::default()
        };
        AccountState::new(IdentityId(1), pools).with_group(OwnedUnitGroup::new(
            UnitCategory::Swarm,
            100,
            40,
            vec![OwnedUnit::new(UnitId(1), worm, 20)],
        ))
    }

    fn walls(bandwidth_usage: i64) -> AccountState {
        let wall = UnitSpec {
            bandwidth: 5,
            ..spec("wall", UnitCategory::Firewall, Categories::empty(), 0, 10)
        };
        let pools = ResourcePools {
            cycles: 1_000,
            bandwidth: 100,
            bandwidth_usage,
            ..Default::default()
        };
        AccountState::new(IdentityId(2), pools).with_group(OwnedUnitGroup::new(
            UnitCategory::Firewall,
            100,
            50,
            vec![OwnedUnit::new(UnitId(1), wall, 10)],
        ))
    }

    fn prepare(action: ActionKind, attacker: &AccountState, amount: i64) -> PreparedEngagement {
        CombatRequest::new(
            action,
            attacker.identity,
            IdentityId(2),
            vec![Commitment::new(UnitId(1), amount)],
        )
        .prepare(attacker, Utc::now())
        .unwrap()
    }

    #[test]
    fn winning_attack_moves_cycles_and_points() {
        let balance = BalanceConfig::default();
        let attacker = worms();
        let prepared = prepare(ActionKind::Attack, &attacker, 20);

        // 20 * 10 = 200 on undefended walls: 80 / 10 = 8 walls, 40 bandwidth
        let resolution =
            resolve(&prepared, attacker, walls(50), WarStatus::None, Utc::now(), &balance).unwrap();

        assert_eq!(resolution.winner, Side::Attacker);
        assert_eq!(resolution.ledger.defender.units_lost, 8);
        assert_eq!(resolution.ledger.defender.bandwidth_lost, 40);

        assert_eq!(resolution.attacker.pools.cycles, 600);
        assert_eq!(resolution.defender.pools.cycles, 900);
        assert_eq!(resolution.attacker.pools.attack_points, 1);
        assert_eq!(resolution.attacker.pools.memory, 80);
        assert_eq!(resolution.defender.pools.bandwidth_usage, 10);
        assert_eq!(resolution.defender.groups[0].units[0].amount, 2);

        let [mine, theirs] = resolution.events();
        assert_eq!(mine.result, BattleResult::Won);
        assert_eq!(mine.cycles_delta, 100);
        assert_eq!(mine.bandwidth_killed, 40);
        assert_eq!(mine.memory_spent, 20);
        assert_eq!(theirs.result, BattleResult::Lost);
        assert_eq!(theirs.cycles_delta, -100);
        assert_eq!(theirs.units_lost, 8);
        assert!(mine.war.is_none());

        for event in resolution.events() {
            for line in &event.breakdown {
                assert!(line.lost <= line.amount_before, "{line:?}");
            }
        }
    }

    #[test]
    fn war_adds_clan_points_to_winner() {
        let balance = BalanceConfig::default();
        let attacker = worms().with_clan(ClanId(1));
        let defender = walls(50).with_clan(ClanId(2));
        let prepared = prepare(ActionKind::Attack, &attacker, 20);

        // pct = 40 / 50 * 100 capped at 10 -> 5; hardpoints ~1.03 -> 0.52
        let resolution =
            resolve(&prepared, attacker, defender, WarStatus::OneSided, Utc::now(), &balance).unwrap();

        assert_eq!(resolution.award.clan_points, 5);
        assert_eq!(resolution.attacker.pools.clan_points, 5);
        assert_eq!(
            resolution.attacker_event.war,
            Some(WarReference {
                attacker_clan: ClanId(1),
                defender_clan: ClanId(2),
                status: WarStatus::OneSided,
            })
        );
    }

    #[test]
    fn negative_pool_aborts_resolution() {
        let balance = BalanceConfig::default();
        let attacker = worms();
        let prepared = prepare(ActionKind::Attack, &attacker, 20);

        // Losing 40 bandwidth from a recorded usage of 30 would go negative.
        let err = resolve(&prepared, attacker, walls(30), WarStatus::None, Utc::now(), &balance)
            .unwrap_err();

        assert_eq!(
            err,
            CombatRuleError::Exhausted(ResourceExhausted {
                identity: IdentityId(2),
                resource: ResourceKind::BandwidthUsage,
                value: -10,
            })
        );
    }

    #[test]
    fn expired_stacks_are_committed_away() {
        let balance = BalanceConfig::default();
        let now = Utc::now();
        let leech = UnitSpec {
            bandwidth: 3,
            ..spec("leech", UnitCategory::Infect, Categories::empty(), 0, 5)
        };
        let stale = OwnedUnit::new(UnitId(7), leech, 4)
            .inactive()
            .expiring_at(now - Duration::seconds(1));
        let defender = walls(62).with_group(OwnedUnitGroup::new(
            UnitCategory::Infect,
            0,
            12,
            vec![stale],
        ));
        let attacker = worms();
        let prepared = prepare(ActionKind::Attack, &attacker, 20);

        let resolution =
            resolve(&prepared, attacker, defender, WarStatus::None, now, &balance).unwrap();

        // Same 8 walls as without the leeches; they never entered the fight.
        assert_eq!(resolution.ledger.defender.units_lost, 8);
        assert!(!resolution.defender.has_expired_units(now));
        let infect = resolution.defender.group(UnitCategory::Infect).unwrap();
        assert!(infect.units.is_empty());
        assert_eq!(infect.usage, 0);
        assert_eq!(resolution.defender.pools.bandwidth_usage, 10);
    }

    fn spies(amount: i64) -> AccountState {
        let pools = ResourcePools {
            memory: 10,
            ..Default::default()
        };
        AccountState::new(IdentityId(1), pools).with_group(OwnedUnitGroup::new(
            UnitCategory::Intelligence,
            10,
            0,
            vec![OwnedUnit::new(
                UnitId(1),
                spec("probe", UnitCategory::Intelligence, Categories::ICE, 1, 10),
                amount,
            )],
        ))
    }

    #[test]
    fn spy_reveals_inventory_when_probes_survive() {
        let balance = BalanceConfig::default();
        let attacker = spies(5);
        let prepared = prepare(ActionKind::Spy, &attacker, 5);

        let resolution =
            resolve(&prepared, attacker, walls(50), WarStatus::None, Utc::now(), &balance).unwrap();

        assert_eq!(resolution.winner, Side::Attacker);
        let intel = resolution.attacker_event.intel.as_ref().unwrap();
        assert_eq!(intel.len(), 1);
        assert_eq!(intel[0].name, "wall");
        assert_eq!(intel[0].amount, 10);
        assert_eq!(resolution.award, Award::default());
        assert!(resolution.defender_event.intel.is_none());
    }

    #[test]
    fn spy_fails_against_ice() {
        let balance = BalanceConfig::default();
        let attacker = spies(5);
        let prepared = prepare(ActionKind::Spy, &attacker, 5);
        let defender = AccountState::new(IdentityId(2), ResourcePools::default()).with_group(
            OwnedUnitGroup::new(
                UnitCategory::Ice,
                10,
                0,
                vec![OwnedUnit::new(
                    UnitId(1),
                    spec("ice", UnitCategory::Ice, Categories::INTELLIGENCE, 100, 50),
                    3,
                )],
            ),
        );

        let resolution =
            resolve(&prepared, attacker, defender, WarStatus::None, Utc::now(), &balance).unwrap();

        assert_eq!(resolution.winner, Side::Defender);
        assert!(resolution.attacker_event.intel.is_none());
        assert_eq!(resolution.ledger.attacker.units_lost, 5);
        assert!(resolution.attacker.groups[0].units.is_empty());
    }

    #[test]
    fn infiltration_plants_expiring_infections() {
        let balance = BalanceConfig::default();
        let now = Utc::now();
        let leech = UnitSpec {
            bandwidth: 3,
            ..spec("leech", UnitCategory::Infect, Categories::empty(), 0, 5)
        };
        let attacker = AccountState::new(
            IdentityId(1),
            ResourcePools {
                bandwidth_usage: 12,
                ..Default::default()
            },
        )
        .with_group(OwnedUnitGroup::new(
            UnitCategory::Infect,
            100,
            12,
            vec![OwnedUnit::new(UnitId(1), leech, 4)],
        ));
        let prepared = prepare(ActionKind::Infiltrate, &attacker, 4);

        let resolution =
            resolve(&prepared, attacker, walls(50), WarStatus::None, now, &balance).unwrap();

        assert_eq!(resolution.winner, Side::Attacker);
        assert_eq!(resolution.defender.pools.bandwidth_usage, 62);
        assert_eq!(resolution.attacker.pools.bandwidth_usage, 0);

        let planted = resolution.defender.group(UnitCategory::Infect).unwrap();
        assert_eq!(planted.usage, 12);
        assert_eq!(planted.units.len(), 1);
        assert_eq!(planted.units[0].amount, 4);
        assert_eq!(
            planted.units[0].expires_at,
            Some(now + Duration::seconds(balance.infection_ttl_secs))
        );
        assert!(!planted.units[0].active);
        assert_eq!(planted.units[0].id, UnitId(2));
    }
}
