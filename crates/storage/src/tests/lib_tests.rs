use super::*;

async fn memory_storage() -> Storage {
    Storage::new("sqlite::memory:").await.expect("db")
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = memory_storage().await;
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let suffix = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = std::env::temp_dir().join(format!("flashcards_storage_test_{suffix}"));
    let db_path = temp_root.join("nested").join("cards.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );

    std::fs::remove_dir_all(temp_root).expect("cleanup");
}

#[tokio::test]
async fn inserts_trimmed_card_and_reads_it_back() {
    let storage = memory_storage().await;
    let card = storage
        .insert_card(
            NewCard::new("  Ephemeral ", " Lasting for a very short time. ")
                .with_word_type(Some(WordType::Adjective)),
        )
        .await
        .expect("insert");
    assert!(card.id.0 > 0);
    assert_eq!(card.word, "Ephemeral");
    assert_eq!(card.definition, "Lasting for a very short time.");

    let loaded = storage
        .get_card(card.id)
        .await
        .expect("load")
        .expect("card exists");
    assert_eq!(loaded.word, "Ephemeral");
    assert_eq!(loaded.word_type, Some(WordType::Adjective));
    assert_eq!(loaded.word_type_abbreviation(), Some("adj"));
}

#[tokio::test]
async fn rejects_blank_word_or_definition() {
    let storage = memory_storage().await;
    assert!(storage.insert_card(NewCard::new("   ", "meaning")).await.is_err());
    assert!(storage.insert_card(NewCard::new("word", "\n\t")).await.is_err());
    assert_eq!(storage.count_cards().await.expect("count"), 0);
}

#[tokio::test]
async fn lists_cards_by_creation_time_in_both_orders() {
    let storage = memory_storage().await;
    let mut inserted = Vec::new();
    for word in ["first", "second", "third"] {
        inserted.push(
            storage
                .insert_card(NewCard::new(word, format!("{word} definition")))
                .await
                .expect("insert")
                .id,
        );
    }

    let ascending: Vec<CardId> = storage
        .list_cards(SortOrder::Ascending)
        .await
        .expect("list asc")
        .into_iter()
        .map(|card| card.id)
        .collect();
    assert_eq!(ascending, inserted);

    let descending: Vec<CardId> = storage
        .list_cards(SortOrder::Descending)
        .await
        .expect("list desc")
        .into_iter()
        .map(|card| card.id)
        .collect();
    let mut expected = inserted.clone();
    expected.reverse();
    assert_eq!(descending, expected);
}

#[tokio::test]
async fn updates_fields_in_place_and_keeps_creation_time() {
    let storage = memory_storage().await;
    let card = storage
        .insert_card(NewCard::new("quickly", "fast").with_word_type(Some(WordType::Adjective)))
        .await
        .expect("insert");

    let updated = storage
        .update_card(
            card.id,
            CardUpdate {
                definition: Some("  At a fast speed.  ".to_string()),
                word_type: Some(Some(WordType::Adverb)),
                ..CardUpdate::default()
            },
        )
        .await
        .expect("update")
        .expect("card exists");
    assert_eq!(updated.word, "quickly");
    assert_eq!(updated.definition, "At a fast speed.");
    assert_eq!(updated.word_type, Some(WordType::Adverb));
    assert_eq!(updated.created_at, card.created_at);

    let cleared = storage
        .update_card(
            card.id,
            CardUpdate {
                word_type: Some(None),
                ..CardUpdate::default()
            },
        )
        .await
        .expect("clear")
        .expect("card exists");
    assert_eq!(cleared.word_type, None);
}

#[tokio::test]
async fn update_rejects_blanking_a_field_and_leaves_row_untouched() {
    let storage = memory_storage().await;
    let card = storage
        .insert_card(NewCard::new("candid", "Truthful and straightforward"))
        .await
        .expect("insert");

    let result = storage
        .update_card(
            card.id,
            CardUpdate {
                word: Some("   ".to_string()),
                ..CardUpdate::default()
            },
        )
        .await;
    assert!(result.is_err());

    let loaded = storage.get_card(card.id).await.expect("load").expect("card");
    assert_eq!(loaded.word, "candid");
}

#[tokio::test]
async fn update_and_delete_report_missing_cards() {
    let storage = memory_storage().await;
    let missing = CardId(4242);
    assert!(storage
        .update_card(missing, CardUpdate::default())
        .await
        .expect("update")
        .is_none());
    assert!(!storage.delete_card(missing).await.expect("delete"));
}

#[tokio::test]
async fn deletes_cards() {
    let storage = memory_storage().await;
    let card = storage
        .insert_card(NewCard::new("tenacious", "Holding firmly to something"))
        .await
        .expect("insert");
    assert!(storage.delete_card(card.id).await.expect("delete"));
    assert!(storage.get_card(card.id).await.expect("load").is_none());
    assert_eq!(storage.count_cards().await.expect("count"), 0);
}

#[test]
fn sqlite_path_ignores_memory_and_non_sqlite_urls() {
    assert_eq!(sqlite_path("sqlite::memory:"), None);
    assert_eq!(sqlite_path("postgres://db"), None);
    assert_eq!(
        sqlite_path("sqlite://./data/cards.db?mode=rwc"),
        Some(PathBuf::from("./data/cards.db"))
    );
}
