// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use pokerbank::application::GameService;
use pokerbank::domain::{Cents, Player};
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(GameService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = GameService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Add a player who took `taken` (one withdrawal per entry) and returned `returned`.
pub async fn seat_player(
    service: &GameService,
    name: &str,
    taken: &[Cents],
    returned: Cents,
) -> Result<Player> {
    let player = service.add_player(name).await?;
    for amount in taken {
        service.add_withdrawal(player.id, *amount, None).await?;
    }
    Ok(service.set_final_amount(player.id, returned).await?)
}

/// Test fixture: a three-player table that balances on both ledgers.
pub struct ThreeHanded {
    pub alice: Player,
    pub bob: Player,
    pub carol: Player,
}

impl ThreeHanded {
    /// Alice +20.00, Bob -30.00, Carol +10.00 at the poker table.
    pub async fn seat(service: &GameService) -> Result<Self> {
        let alice = seat_player(service, "Alice", &[2000], 4000).await?;
        let bob = seat_player(service, "Bob", &[2000, 2000], 1000).await?;
        let carol = seat_player(service, "Carol", &[2000], 3000).await?;
        Ok(Self { alice, bob, carol })
    }

    pub fn ids(&self) -> Vec<pokerbank::domain::PlayerId> {
        vec![self.alice.id, self.bob.id, self.carol.id]
    }
}
