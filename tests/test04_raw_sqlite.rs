#![cfg(feature = "sqlite")]

use tempfile::tempdir;
use tiny_orm::prelude::*;

tiny_orm::model! {
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Note {
        pub id: Uuid,
        #[column = "body_text"]
        pub body: String,
        pub pinned: bool,
        pub meta: JsonMap,
    }
}

#[tokio::test]
async fn raw_exec_and_all() -> Result<(), OrmError> {
    let dir = tempdir()?;
    let handler = SqliteHandler::connect(&DialectConfig::sqlite(dir.path().join("raw.db"))).await?;
    let db: &dyn DialectHandler = &handler;

    db.raw(
        "CREATE TABLE notes (id TEXT PRIMARY KEY, body_text TEXT, pinned INTEGER, meta TEXT)",
        vec![],
    )
    .exec()
    .await?;

    let mut meta = JsonMap::new();
    meta.add("color", "red");
    let mut note = Note {
        body: "first".into(),
        pinned: true,
        meta,
        ..Note::default()
    };
    db.create(&mut note).await?;
    db.create(&mut Note {
        body: "second".into(),
        ..Note::default()
    })
    .await?;

    let insert = db.raw(
        "INSERT INTO notes (id, body_text) VALUES (?, ?)",
        vec![Uuid::new_v4().into(), "third".into()],
    );
    assert!(insert.sql().starts_with("INSERT INTO notes"));
    assert_eq!(insert.args().len(), 2);
    assert_eq!(insert.args()[1], SqlValue::from("third"));
    let inserted = insert.exec().await?;
    assert_eq!(inserted, 1);

    let mut pinned: Vec<Note> = Vec::new();
    db.raw(
        "SELECT id, body_text, pinned, meta FROM notes WHERE pinned = ?",
        vec![true.into()],
    )
    .all(&mut pinned)
    .await?;
    assert_eq!(pinned, vec![note.clone()]);
    assert_eq!(pinned[0].meta.get("color"), Some(&serde_json::json!("red")));

    // Columns missing from the result keep their default.
    let mut bodies: Vec<Note> = Vec::new();
    db.raw_all(
        "SELECT body_text FROM notes ORDER BY body_text",
        &[],
        &mut bodies,
    )
    .await?;
    let texts: Vec<&str> = bodies.iter().map(|n| n.body.as_str()).collect();
    assert_eq!(texts, ["first", "second", "third"]);
    assert!(bodies.iter().all(|n| n.id.is_nil()));

    let mut missing = Note::default();
    let err = db
        .raw("SELECT * FROM notes WHERE body_text = ?", vec!["nope".into()])
        .all(&mut missing)
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let updated = db
        .raw_exec("UPDATE notes SET pinned = 1", &[])
        .await?;
    assert_eq!(updated, 3);
    Ok(())
}

#[tokio::test]
async fn raw_errors_surface_as_driver_errors() -> Result<(), OrmError> {
    let dir = tempdir()?;
    let db = SqliteHandler::connect(&DialectConfig::sqlite(dir.path().join("bad.db"))).await?;

    let err = db.raw_exec("SELEKT 1", &[]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Execution);
    Ok(())
}
