//! War status between the clans of two engaging identities.

use combat_core::{ClanId, WarStatus};

use crate::repository::{Result, WarDirectory};

/// Looks up both declaration directions concurrently.
///
/// Unaffiliated identities and members of the same clan are never at war.
pub async fn resolve_war_status(
    wars: &dyn WarDirectory,
    attacker_clan: Option<ClanId>,
    defender_clan: Option<ClanId>,
) -> Result<WarStatus> {
    let (Some(attacker_clan), Some(defender_clan)) = (attacker_clan, defender_clan) else {
        return Ok(WarStatus::None);
    };
    if attacker_clan == defender_clan {
        return Ok(WarStatus::None);
    }

    let (forward, backward) = tokio::join!(
        wars.has_declared(attacker_clan, defender_clan),
        wars.has_declared(defender_clan, attacker_clan),
    );
    Ok(WarStatus::from_declarations(forward?, backward?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryWarDirectory;

    #[tokio::test]
    async fn declarations_map_to_status() {
        let wars = InMemoryWarDirectory::new();
        let (a, b) = (ClanId(1), ClanId(2));

        assert_eq!(
            resolve_war_status(&wars, Some(a), Some(b)).await.unwrap(),
            WarStatus::None
        );

        wars.declare(a, b).unwrap();
        assert_eq!(
            resolve_war_status(&wars, Some(a), Some(b)).await.unwrap(),
            WarStatus::OneSided
        );
        assert_eq!(
            resolve_war_status(&wars, Some(b), Some(a)).await.unwrap(),
            WarStatus::OneSided
        );

        wars.declare(b, a).unwrap();
        assert_eq!(
            resolve_war_status(&wars, Some(a), Some(b)).await.unwrap(),
            WarStatus::Mutual
        );
    }

    #[tokio::test]
    async fn missing_or_shared_clan_is_peace() {
        let wars = InMemoryWarDirectory::new();
        wars.declare(ClanId(1), ClanId(1)).unwrap();

        assert_eq!(
            resolve_war_status(&wars, None, Some(ClanId(1))).await.unwrap(),
            WarStatus::None
        );
        assert_eq!(
            resolve_war_status(&wars, Some(ClanId(1)), Some(ClanId(1)))
                .await
                .unwrap(),
            WarStatus::None
        );
    }
}
