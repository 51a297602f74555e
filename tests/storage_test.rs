use anyhow::Result;
use pokerbank::domain::{FoodExpense, Player, Withdrawal};
use pokerbank::storage::{is_foreign_key_violation, is_unique_violation, Repository};
use tempfile::TempDir;

async fn test_repo() -> Result<(Repository, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let repo = Repository::init(&format!("sqlite:{}?mode=rwc", db_path.display())).await?;
    Ok((repo, temp_dir))
}

#[tokio::test]
async fn test_duplicate_name_is_a_unique_violation() -> Result<()> {
    let (repo, _temp) = test_repo().await?;
    repo.save_player(&Player::new("Alice")).await?;

    let err = repo.save_player(&Player::new("Alice")).await.unwrap_err();
    assert!(is_unique_violation(&err));
    assert!(!is_foreign_key_violation(&err));

    let bob = Player::new("Bob");
    repo.save_player(&bob).await?;
    let err = repo.rename_player(bob.id, "Alice").await.unwrap_err();
    assert!(is_unique_violation(&err));
    Ok(())
}

#[tokio::test]
async fn test_deleting_referenced_player_is_a_foreign_key_violation() -> Result<()> {
    let (repo, _temp) = test_repo().await?;
    let alice = Player::new("Alice");
    let bob = Player::new("Bob");
    repo.save_player(&alice).await?;
    repo.save_player(&bob).await?;
    repo.save_withdrawal(bob.id, &Withdrawal::new(2000, "admin"))
        .await?;
    repo.save_expense(&FoodExpense::new(1000, alice.id, [alice.id, bob.id])?)
        .await?;

    let err = repo.delete_player(bob.id).await.unwrap_err();
    assert!(is_foreign_key_violation(&err));
    assert!(!is_unique_violation(&err));

    // The failed delete rolled back, withdrawals included
    let bob = repo.get_player(bob.id).await?.unwrap();
    assert_eq!(bob.total_withdrawn(), 2000);
    assert_eq!(repo.count_expenses_for_player(bob.id).await?, 1);
    Ok(())
}
